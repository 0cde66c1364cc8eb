//! Storage boundary: credentials, feedback and catalog.
//!
//! Handlers depend on these traits only; the backing implementation
//! (in-memory or Postgres) is chosen once at startup.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use storefront_auth::Role;
use storefront_catalog::{
    CustomerLevel, Feedback, Image, Money, NewFeedback, Product, ProductType,
};
use storefront_core::{FeedbackId, ProductId, UserId};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Stored user joined with the level of their bonus card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub login: String,
    pub password_hash: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub total_purchases: Money,
    pub level: CustomerLevel,
}

/// Registration input; the password is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ImageKind {
    MainInfo,
    Promotion,
    Service,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_login(&self, login: &str) -> StoreResult<Option<UserRecord>>;

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<UserRecord>>;

    /// Create a `user`-role account with default personal data and a bonus
    /// card at the lowest level. A taken login is `StoreError::Conflict`.
    async fn create_user(&self, new_user: NewUser) -> StoreResult<UserRecord>;

    async fn update_personal_data(
        &self,
        id: UserId,
        first_name: &str,
        last_name: &str,
    ) -> StoreResult<UserRecord>;

    /// Removes the user together with their bonus card and feedback.
    async fn delete_user(&self, id: UserId) -> StoreResult<()>;

    /// The level directly above `current`, if any.
    async fn next_level(&self, current: &CustomerLevel) -> StoreResult<Option<CustomerLevel>>;
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn create_feedback(&self, new_feedback: NewFeedback) -> StoreResult<Feedback>;

    /// Newest last.
    async fn list_for_product(&self, product_id: ProductId) -> StoreResult<Vec<Feedback>>;

    /// `StoreError::NotFound` unless the feedback belongs to `product_id`.
    async fn set_admin_comment(
        &self,
        product_id: ProductId,
        feedback_id: FeedbackId,
        comment: &str,
    ) -> StoreResult<Feedback>;

    /// `StoreError::NotFound` unless the feedback belongs to `product_id`.
    async fn delete_feedback(&self, product_id: ProductId, feedback_id: FeedbackId) -> StoreResult<()>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every product type with its subtypes, ordered by name.
    async fn product_types(&self) -> StoreResult<Vec<ProductType>>;

    async fn products_in_subtype(
        &self,
        type_name: &str,
        subtype_name: &str,
    ) -> StoreResult<Vec<Product>>;

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    /// Best sellers first; products without sales data sort last.
    async fn top_sellers(&self, limit: usize) -> StoreResult<Vec<Product>>;

    async fn images(&self, kind: ImageKind) -> StoreResult<Vec<Image>>;
}

/// The three store handles shared by request handlers.
#[derive(Clone)]
pub struct Stores {
    pub credentials: Arc<dyn CredentialStore>,
    pub feedback: Arc<dyn FeedbackStore>,
    pub catalog: Arc<dyn CatalogStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self::from_shared(Arc::new(InMemoryStore::seeded()))
    }

    pub fn postgres(store: PostgresStore) -> Self {
        Self::from_shared(Arc::new(store))
    }

    fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: CredentialStore + FeedbackStore + CatalogStore + 'static,
    {
        Self {
            credentials: store.clone(),
            feedback: store.clone(),
            catalog: store,
        }
    }
}

impl core::fmt::Debug for Stores {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
