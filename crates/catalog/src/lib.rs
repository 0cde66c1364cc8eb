//! Catalog domain module.
//!
//! Read models for product types, products and feedback, plus the pricing
//! rules that depend on who is looking (no IO, no HTTP, no storage).

pub mod feedback;
pub mod model;
pub mod money;
pub mod pricing;

pub use feedback::{
    Feedback, FeedbackAuthor, FeedbackFragments, FeedbackView, NewFeedback, escape_html,
    render_fragments,
};
pub use model::{
    Image, Product, ProductCard, ProductSubtype, ProductSubtypeSummary, ProductType,
    ProductTypeSummary,
};
pub use money::Money;
pub use pricing::{
    CustomerLevel, Discount, GUEST_PRODUCT_PAGE_DISCOUNT, LevelProgress, Surface, discount_for,
    level_progress,
};
