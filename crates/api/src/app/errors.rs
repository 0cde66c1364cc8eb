use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use storefront_auth::{PasswordHashError, TokenError};
use storefront_core::ValidationError;
use storefront_infra::StoreError;

/// Profile operation a non-user attempted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProfileAction {
    View,
    Update,
    Delete,
    Exit,
}

/// Every failure an endpoint can report.
///
/// Rendered as `{"error": <english detail>, "message": <russian message>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("User not found")]
    UnknownLogin,

    #[error("User unauthorized. Wrong password")]
    WrongPassword,

    #[error("Login already exists")]
    LoginTaken,

    #[error("Header \"{0}\" is missing")]
    HeaderMissing(&'static str),

    #[error("Session expired")]
    SessionExpired,

    #[error("profile access denied: {0:?}")]
    ProfileAccess(ProfileAction),

    #[error("User not found")]
    AccountMissing,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Forbidden")]
    LiveChannelForbidden,

    #[error("Invalid value")]
    LiveChannelParameters,

    #[error("Server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::UnknownLogin | ApiError::AccountMissing | ApiError::ProductNotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::WrongPassword | ApiError::SessionExpired => StatusCode::UNAUTHORIZED,
            ApiError::LoginTaken => StatusCode::CONFLICT,
            ApiError::HeaderMissing(_) | ApiError::LiveChannelParameters => StatusCode::BAD_REQUEST,
            ApiError::ProfileAccess(ProfileAction::View | ProfileAction::Update)
            | ApiError::LiveChannelForbidden => StatusCode::FORBIDDEN,
            ApiError::ProfileAccess(ProfileAction::Delete | ProfileAction::Exit) => {
                StatusCode::CONFLICT
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// English detail sent in the `error` field.
    pub fn code(&self) -> String {
        match self {
            ApiError::ProfileAccess(ProfileAction::View | ProfileAction::Update) => {
                "Forbidden".to_string()
            }
            ApiError::ProfileAccess(ProfileAction::Delete | ProfileAction::Exit) => {
                "Access conflict".to_string()
            }
            ApiError::Internal(_) => "Server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Russian message shown to the customer.
    pub fn message(&self) -> String {
        match self {
            ApiError::Validation(e) => e.message(),
            ApiError::UnknownLogin => "Пользователя с таким логином не существует.".to_string(),
            ApiError::WrongPassword => "Неверный пароль.".to_string(),
            ApiError::LoginTaken => "Пользователь с таким логином уже существует.".to_string(),
            ApiError::HeaderMissing(header) => format!("Заголовок \"{header}\" отсутствует"),
            ApiError::SessionExpired => {
                "Сессия истекла. Пройдите авторизацию повторно.".to_string()
            }
            ApiError::ProfileAccess(ProfileAction::View) => "Недостаточно прав доступа. \
                 Чтобы получить доступ к профилю сначала пройдите авторизацию."
                .to_string(),
            ApiError::ProfileAccess(ProfileAction::Update) => "Недостаточно прав доступа. \
                 Чтобы получить доступ к изменению профиля пройдите авторизацию."
                .to_string(),
            ApiError::ProfileAccess(ProfileAction::Delete) => "Ошибка доступа. \
                 Для удаления профиля необходимо сначала пройти авторизацию."
                .to_string(),
            ApiError::ProfileAccess(ProfileAction::Exit) => "Ошибка доступа. \
                 Не удалось выйти из аккаунта из-за отсутствия авторизации."
                .to_string(),
            ApiError::AccountMissing => "Пользователь не найден.".to_string(),
            ApiError::ProductNotFound => "Товар не найден.".to_string(),
            ApiError::LiveChannelForbidden => {
                "Заявленная личность не совпадает с текущей сессией.".to_string()
            }
            ApiError::LiveChannelParameters => {
                "Некорректные параметры подключения.".to_string()
            }
            ApiError::Internal(_) => "Внутренняя ошибка сервера".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "request failed");
        }
        json_error(self.status(), self.code(), self.message())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<PasswordHashError> for ApiError {
    fn from(e: PasswordHashError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

pub fn json_error(
    status: StatusCode,
    error: impl Into<String>,
    message: impl Into<String>,
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": error.into(),
            "message": message.into(),
        })),
    )
        .into_response()
}
