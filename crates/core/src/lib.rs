//! `storefront-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod validation;

pub use error::DomainError;
pub use id::{FeedbackId, ProductId, UserId};
pub use validation::{Field, ValidationError};
