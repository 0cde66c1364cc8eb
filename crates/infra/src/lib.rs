//! Infrastructure layer: configuration and storage adapters.

pub mod config;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use store::{
    CatalogStore, CredentialStore, FeedbackStore, ImageKind, InMemoryStore, NewUser,
    PostgresStore, StoreError, StoreResult, Stores, UserRecord,
};
