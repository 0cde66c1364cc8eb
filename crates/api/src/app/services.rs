use storefront_auth::TokenCodec;
use storefront_infra::{AppConfig, PostgresStore, StoreResult, Stores};

use crate::live::LiveHub;
use crate::session::SessionCarrier;

/// Everything request handlers share.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub stores: Stores,
    pub sessions: SessionCarrier,
    pub live: LiveHub,
}

impl AppServices {
    pub fn new(config: &AppConfig, stores: Stores) -> Self {
        let codec = TokenCodec::new(config.secret_key.as_bytes(), config.jwt_algorithm);
        Self {
            stores,
            sessions: SessionCarrier::new(codec, config.cookie_secure),
            live: LiveHub::new(),
        }
    }
}

/// Wire storage from configuration: Postgres when `DATABASE_URL` is set,
/// otherwise the seeded in-memory store.
pub async fn build_services(config: &AppConfig) -> StoreResult<AppServices> {
    let stores = match &config.database_url {
        Some(url) => {
            tracing::info!("using postgres storage");
            Stores::postgres(PostgresStore::connect(url).await?)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory storage");
            Stores::in_memory()
        }
    };
    Ok(AppServices::new(config, stores))
}
