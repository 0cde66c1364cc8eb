//! Configuration loading from the process environment.

use std::net::SocketAddr;

use thiserror::Error;

use storefront_auth::SigningAlgorithm;

const DEV_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

/// Runtime settings for the storefront server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub secret_key: String,
    pub jwt_algorithm: SigningAlgorithm,
    pub bind_addr: SocketAddr,
    /// Whether session cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
    /// Postgres URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub cors_origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            secret_key: DEV_SECRET.to_string(),
            jwt_algorithm: SigningAlgorithm::Hs256,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            cookie_secure: true,
            database_url: None,
            cors_origin: "http://127.0.0.1:5500".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (empty values count as unset).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let secret_key = get("SECRET_KEY").unwrap_or_else(|| {
            tracing::warn!("SECRET_KEY not set; using insecure dev default");
            defaults.secret_key.clone()
        });

        let jwt_algorithm = match get("JWT_ALGORITHM") {
            Some(raw) => raw
                .parse::<SigningAlgorithm>()
                .map_err(|e| ConfigError::invalid("JWT_ALGORITHM", e))?,
            None => defaults.jwt_algorithm,
        };

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .map_err(|e| ConfigError::invalid("BIND_ADDR", e.to_string()))?,
            None => defaults.bind_addr,
        };

        let cookie_secure = match get("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ConfigError::invalid("COOKIE_SECURE", format!("expected a boolean, got '{raw}'"))
            })?,
            None => defaults.cookie_secure,
        };
        if !cookie_secure {
            tracing::warn!("COOKIE_SECURE disabled; session cookies will be sent over plain HTTP");
        }

        Ok(Self {
            secret_key,
            jwt_algorithm,
            bind_addr,
            cookie_secure,
            database_url: get("DATABASE_URL"),
            cors_origin: get("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(cfg.cookie_secure);
        assert_eq!(cfg.bind_addr.port(), 8000);
    }

    #[test]
    fn reads_overrides() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("SECRET_KEY", "s3cr3t"),
            ("JWT_ALGORITHM", "hs512"),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("COOKIE_SECURE", "false"),
            ("DATABASE_URL", "postgres://localhost/shop"),
        ]))
        .unwrap();
        assert_eq!(cfg.secret_key, "s3cr3t");
        assert_eq!(cfg.jwt_algorithm, SigningAlgorithm::Hs512);
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert!(!cfg.cookie_secure);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/shop"));
    }

    #[test]
    fn rejects_bad_values() {
        let err = AppConfig::from_lookup(lookup(&[("JWT_ALGORITHM", "RS256")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "JWT_ALGORITHM", .. }));
        assert!(AppConfig::from_lookup(lookup(&[("BIND_ADDR", "nowhere")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("COOKIE_SECURE", "maybe")])).is_err());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert_eq!(cfg.database_url, None);
    }
}
