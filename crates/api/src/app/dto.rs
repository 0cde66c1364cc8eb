use serde::{Deserialize, Serialize};

use storefront_auth::{Identity, Role};
use storefront_catalog::{FeedbackView, Image, Money, ProductCard, ProductTypeSummary};
use storefront_core::{ProductId, UserId};

// -------------------------
// Request DTOs
// -------------------------

/// Form body of every registration and authentication endpoint.
///
/// Missing fields deserialize as empty strings so they surface as
/// validation errors rather than extractor rejections.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PersonalDataRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Identity a live-channel client declares when connecting.
#[derive(Debug, Deserialize)]
pub struct LiveChannelParams {
    /// Kept raw so a malformed id surfaces as a catalogued error.
    pub user_id: Option<String>,
    pub user_role: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub id: UserId,
    pub role: Role,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id(),
            role: identity.role(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HeadersResponse {
    #[serde(rename = "User-Agent")]
    pub user_agent: String,
    #[serde(rename = "Accept-Language")]
    pub accept_language: String,
}

#[derive(Debug, Serialize)]
pub struct CatalogDataResponse {
    pub catalog_data: Vec<ProductTypeSummary>,
}

#[derive(Debug, Serialize)]
pub struct MainPageResponse {
    pub user_id: UserId,
    pub user_role: Role,
    pub main_info_images: Vec<Image>,
    pub product_types_subtypes: Vec<ProductTypeSummary>,
    pub promotion_images: Vec<Image>,
    pub top_sellers: Vec<ProductCard>,
    pub service_images: Vec<Image>,
}

#[derive(Debug, Serialize)]
pub struct SubtypeListingResponse {
    pub product_type: String,
    pub product_subtype: String,
    pub products: Vec<ProductCard>,
}

#[derive(Debug, Serialize)]
pub struct ProductPageResponse {
    pub product_id: ProductId,
    pub product_type: String,
    pub product_subtype: String,
    pub product_name: String,
    pub product_description: String,
    pub product_additional_information: String,
    pub product_rating: f64,
    pub product_price: Money,
    pub product_bonus_price: Money,
    pub product_availability: bool,
    pub product_image_link: String,
    pub feedbacks: Vec<FeedbackView>,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct BonusCard {
    pub level: String,
    pub discount_percent: u8,
    pub total_amount_of_purchases: Money,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub bonus_card: BonusCard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_of_purchases_to_next_level: Option<Money>,
    pub bonus_card_max_level_message: bool,
}

#[derive(Debug, Serialize)]
pub struct PersonalDataResponse {
    pub updated_first_name: String,
    pub updated_last_name: String,
}
