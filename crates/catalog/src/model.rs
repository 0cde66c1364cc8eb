use serde::{Deserialize, Serialize};

use storefront_core::ProductId;

use crate::Money;
use crate::pricing::Discount;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSubtype {
    pub name: String,
    pub image_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductType {
    pub name: String,
    pub image_link: String,
    pub subtypes: Vec<ProductSubtype>,
}

impl ProductType {
    pub fn summary(&self) -> ProductTypeSummary {
        ProductTypeSummary {
            name: self.name.clone(),
            product_subtypes: self
                .subtypes
                .iter()
                .map(|s| ProductSubtypeSummary { name: s.name.clone() })
                .collect(),
        }
    }
}

/// Catalog navigation entry: `{name, product_subtypes: [{name}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductTypeSummary {
    pub name: String,
    pub product_subtypes: Vec<ProductSubtypeSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSubtypeSummary {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub description: String,
    pub image_link: String,
    pub quantity_in_stock: Option<i32>,
    pub type_name: String,
    pub subtype_name: String,
    pub additional_information: String,
    pub rating: f64,
    pub number_of_sales: Option<i64>,
}

impl Product {
    pub fn card(&self, discount: Discount) -> ProductCard {
        ProductCard {
            id: self.id,
            name: self.name.clone(),
            price: self.price.discounted(discount),
            image_link: self.image_link.clone(),
            rating: self.rating,
        }
    }
}

/// Listing entry with the price already adjusted for the viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub image_link: String,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub name: String,
    pub image_link: String,
}
