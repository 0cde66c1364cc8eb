//! Discount lookup: what percentage a caller gets, on which page.

use serde::{Deserialize, Serialize};

use storefront_auth::{Identity, Role};

use crate::Money;

/// A whole-number percentage in `0..=100`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Discount(u8);

impl Discount {
    pub const NONE: Discount = Discount(0);

    /// Values above 100 are clamped.
    pub const fn new(percent: u8) -> Self {
        if percent > 100 { Self(100) } else { Self(percent) }
    }

    pub const fn percent(&self) -> u8 {
        self.0
    }
}

/// Discount shown to anyone who is not a registered user, on the product page only.
pub const GUEST_PRODUCT_PAGE_DISCOUNT: Discount = Discount::new(3);

/// Bonus card tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerLevel {
    pub name: String,
    pub discount: Discount,
    /// Total purchases needed to reach this level.
    pub lower_threshold: Money,
    pub level_number: i16,
}

/// Where a price is displayed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Surface {
    MainPage,
    CatalogListing,
    ProductPage,
}

/// Discount for `identity` on `surface`.
///
/// `level` is the caller's bonus card level; it is only consulted for
/// registered users.
pub fn discount_for(identity: &Identity, level: Option<&CustomerLevel>, surface: Surface) -> Discount {
    match identity.role() {
        Role::User => level.map(|l| l.discount).unwrap_or(Discount::NONE),
        Role::Guest | Role::Admin => match surface {
            Surface::ProductPage => GUEST_PRODUCT_PAGE_DISCOUNT,
            Surface::MainPage | Surface::CatalogListing => Discount::NONE,
        },
    }
}

/// Position of a user relative to the next bonus card level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelProgress {
    NextLevel { name: String, remaining: Money },
    MaxLevel,
}

pub fn level_progress(total_purchases: Money, next: Option<&CustomerLevel>) -> LevelProgress {
    match next {
        Some(level) => LevelProgress::NextLevel {
            name: level.name.clone(),
            remaining: level.lower_threshold.saturating_sub(total_purchases),
        },
        None => LevelProgress::MaxLevel,
    }
}
