//! Input-shape rules for credentials and personal data.
//!
//! Every rule reports the first violation found; checks run in a fixed order
//! per field so callers always see the same message for the same input.

use thiserror::Error;

/// Characters rejected in every user-supplied field.
pub const FORBIDDEN_CHARACTERS: &[char] = &[
    '!', '@', '#', '$', '%', '^', '&', '*', '(', ')', '-', '+', '=', '{', '}', '[', ']', '|', ';',
    ':', '\'', '"', '<', '>', '?', '/', '\\', '`', ' ', ',', '.',
];

/// Upper length bound shared by all fields.
pub const MAX_FIELD_LENGTH: usize = 32;

/// A validated input field, with its display names and length bounds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Login,
    Password,
    FirstName,
    LastName,
}

impl Field {
    pub fn name_eng(&self) -> &'static str {
        match self {
            Field::Login => "login",
            Field::Password => "password",
            Field::FirstName => "first name",
            Field::LastName => "last name",
        }
    }

    pub fn name_ru(&self) -> &'static str {
        match self {
            Field::Login => "Логин",
            Field::Password => "Пароль",
            Field::FirstName => "Имя",
            Field::LastName => "Фамилия",
        }
    }

    pub fn min_length(&self) -> usize {
        match self {
            Field::Login => 3,
            Field::Password => 12,
            Field::FirstName | Field::LastName => 2,
        }
    }

    pub fn max_length(&self) -> usize {
        MAX_FIELD_LENGTH
    }
}

/// Input-shape violation.
///
/// `Display` yields the English detail; [`ValidationError::message`] yields
/// the user-facing Russian text.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid character in {}", .0.name_eng())]
    InvalidCharacter(Field),

    #[error("Invalid {} length", .0.name_eng())]
    InvalidLength(Field),

    #[error("Invalid language format in {}", .0.name_eng())]
    NotLatin(Field),

    #[error("Invalid language format in {}", .0.name_eng())]
    NotCyrillic(Field),

    #[error("Unacceptable password complexity")]
    WeakPassword,
}

impl ValidationError {
    pub fn message(&self) -> String {
        match self {
            ValidationError::InvalidCharacter(f) => {
                format!("{} содержит недопустимые символы.", f.name_ru())
            }
            ValidationError::InvalidLength(f) => format!(
                "Поле \"{}\" должно иметь длину от {} до {} символов включительно.",
                f.name_ru(),
                f.min_length(),
                f.max_length()
            ),
            ValidationError::NotLatin(f) => format!(
                "{} должен содержать символы только латинского алфавита.",
                f.name_ru()
            ),
            ValidationError::NotCyrillic(f) => format!(
                "Поле \"{}\" должно содержать только символы кириллицы.",
                f.name_ru()
            ),
            ValidationError::WeakPassword => "Слишком простой пароль. \
                 Пароль должен содержать заглавные буквы латинского алфавита, а также цифры."
                .to_string(),
        }
    }
}

fn check_forbidden_characters(value: &str, field: Field) -> Result<(), ValidationError> {
    if value.chars().any(|c| FORBIDDEN_CHARACTERS.contains(&c)) {
        return Err(ValidationError::InvalidCharacter(field));
    }
    Ok(())
}

fn check_length(value: &str, field: Field) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < field.min_length() || len > field.max_length() {
        return Err(ValidationError::InvalidLength(field));
    }
    Ok(())
}

fn check_latin(value: &str, field: Field) -> Result<(), ValidationError> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::NotLatin(field));
    }
    Ok(())
}

fn is_basic_cyrillic(c: char) -> bool {
    matches!(c, 'а'..='я' | 'А'..='Я')
}

fn check_cyrillic(value: &str, field: Field) -> Result<(), ValidationError> {
    if value.is_empty() || !value.chars().all(is_basic_cyrillic) {
        return Err(ValidationError::NotCyrillic(field));
    }
    Ok(())
}

fn check_password_complexity(value: &str) -> Result<(), ValidationError> {
    let lower = value.chars().any(char::is_lowercase);
    let upper = value.chars().any(char::is_uppercase);
    let digit = value.chars().any(|c| c.is_ascii_digit());
    if lower && upper && digit {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword)
    }
}

/// Validate a login chosen at registration.
pub fn validate_login(login: &str) -> Result<(), ValidationError> {
    check_forbidden_characters(login, Field::Login)?;
    check_length(login, Field::Login)?;
    check_latin(login, Field::Login)
}

/// Validate a password chosen at registration.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    check_forbidden_characters(password, Field::Password)?;
    check_length(password, Field::Password)?;
    check_latin(password, Field::Password)?;
    check_password_complexity(password)
}

/// Validate a first or last name and normalise its case
/// (`"НОВОЕимя"` becomes `"Новоеимя"`).
pub fn normalize_personal_name(value: &str, field: Field) -> Result<String, ValidationError> {
    check_length(value, field)?;
    check_forbidden_characters(value, field)?;
    check_cyrillic(value, field)?;

    let mut chars = value.chars();
    let normalized = match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    };
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_credentials() {
        assert!(validate_login("newTestUser").is_ok());
        assert!(validate_password("newTestUser1").is_ok());
    }

    #[test]
    fn login_with_forbidden_character() {
        let err = validate_login("newTestUser*").unwrap_err();
        assert_eq!(err, ValidationError::InvalidCharacter(Field::Login));
        assert_eq!(err.message(), "Логин содержит недопустимые символы.");
        assert_eq!(err.to_string(), "Invalid character in login");
    }

    #[test]
    fn login_too_short() {
        let err = validate_login("TU").unwrap_err();
        assert_eq!(
            err.message(),
            "Поле \"Логин\" должно иметь длину от 3 до 32 символов включительно."
        );
    }

    #[test]
    fn login_in_cyrillic() {
        let err = validate_login("НовыйЛогин").unwrap_err();
        assert_eq!(err, ValidationError::NotLatin(Field::Login));
        assert_eq!(
            err.message(),
            "Логин должен содержать символы только латинского алфавита."
        );
    }

    #[test]
    fn password_without_uppercase_or_digit() {
        let err = validate_password("superpassword").unwrap_err();
        assert_eq!(err, ValidationError::WeakPassword);
        assert_eq!(
            err.message(),
            "Слишком простой пароль. Пароль должен содержать заглавные буквы латинского алфавита, а также цифры."
        );
    }

    #[test]
    fn password_length_uses_its_own_minimum() {
        let err = validate_password("Short1").unwrap_err();
        assert_eq!(err, ValidationError::InvalidLength(Field::Password));
        assert!(err.message().contains("от 12 до 32"));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 16 cyrillic letters are 32 bytes but well within the limit.
        assert!(normalize_personal_name("абвгдежзийклмноп", Field::FirstName).is_ok());
        let err = normalize_personal_name("фамилияфамилияфамилияфамилияфамилия", Field::LastName)
            .unwrap_err();
        assert_eq!(
            err.message(),
            "Поле \"Фамилия\" должно иметь длину от 2 до 32 символов включительно."
        );
    }

    #[test]
    fn personal_name_is_normalised() {
        assert_eq!(
            normalize_personal_name("НОВОЕимя", Field::FirstName).unwrap(),
            "Новоеимя"
        );
        assert_eq!(
            normalize_personal_name("новаяФАМИЛИЯ", Field::LastName).unwrap(),
            "Новаяфамилия"
        );
    }

    #[test]
    fn personal_name_rules() {
        assert_eq!(
            normalize_personal_name("first_name", Field::FirstName)
                .unwrap_err()
                .message(),
            "Поле \"Имя\" должно содержать только символы кириллицы."
        );
        assert_eq!(
            normalize_personal_name("имя!", Field::FirstName)
                .unwrap_err()
                .message(),
            "Имя содержит недопустимые символы."
        );
        assert_eq!(
            normalize_personal_name("фамилия.", Field::LastName)
                .unwrap_err()
                .message(),
            "Фамилия содержит недопустимые символы."
        );
        assert_eq!(
            normalize_personal_name("", Field::FirstName).unwrap_err(),
            ValidationError::InvalidLength(Field::FirstName)
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: any latin alphanumeric login within bounds is accepted.
            #[test]
            fn latin_logins_in_bounds_are_valid(login in "[a-zA-Z0-9]{3,32}") {
                prop_assert!(validate_login(&login).is_ok());
            }

            /// Property: a forbidden character is reported before anything else.
            #[test]
            fn forbidden_character_wins(
                prefix in "[a-z]{0,40}",
                idx in 0..FORBIDDEN_CHARACTERS.len(),
            ) {
                let login = format!("{prefix}{}", FORBIDDEN_CHARACTERS[idx]);
                prop_assert_eq!(
                    validate_login(&login),
                    Err(ValidationError::InvalidCharacter(Field::Login))
                );
            }

            /// Property: normalisation keeps the length and is idempotent.
            #[test]
            fn name_normalisation_is_idempotent(name in "[а-яА-Я]{2,32}") {
                let once = normalize_personal_name(&name, Field::FirstName).unwrap();
                prop_assert_eq!(once.chars().count(), name.chars().count());
                let twice = normalize_personal_name(&once, Field::FirstName).unwrap();
                prop_assert_eq!(once, twice);
            }
        }
    }
}
