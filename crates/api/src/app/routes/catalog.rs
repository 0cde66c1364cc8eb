use std::sync::Arc;

use axum::{Extension, Json, extract::Path};

use storefront_catalog::{ProductTypeSummary, Surface};
use storefront_infra::ImageKind;

use crate::app::AppServices;
use crate::app::dto::{CatalogDataResponse, MainPageResponse, SubtypeListingResponse};
use crate::app::errors::ApiError;
use crate::app::routes::common::viewer_discount;
use crate::context::IdentityContext;

const TOP_SELLERS: usize = 10;

pub async fn catalog_data(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<CatalogDataResponse>, ApiError> {
    Ok(Json(CatalogDataResponse {
        catalog_data: type_summaries(&services).await?,
    }))
}

pub async fn main_page(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
) -> Result<Json<MainPageResponse>, ApiError> {
    let catalog = &services.stores.catalog;
    let discount = viewer_discount(&services, &ctx, Surface::MainPage).await?;

    let top_sellers = catalog
        .top_sellers(TOP_SELLERS)
        .await?
        .iter()
        .map(|p| p.card(discount))
        .collect();

    Ok(Json(MainPageResponse {
        user_id: ctx.user_id(),
        user_role: ctx.role(),
        main_info_images: catalog.images(ImageKind::MainInfo).await?,
        product_types_subtypes: type_summaries(&services).await?,
        promotion_images: catalog.images(ImageKind::Promotion).await?,
        top_sellers,
        service_images: catalog.images(ImageKind::Service).await?,
    }))
}

pub async fn subtype_listing(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    Path((product_type, product_subtype)): Path<(String, String)>,
) -> Result<Json<SubtypeListingResponse>, ApiError> {
    let discount = viewer_discount(&services, &ctx, Surface::CatalogListing).await?;
    let products = services
        .stores
        .catalog
        .products_in_subtype(&product_type, &product_subtype)
        .await?
        .iter()
        .map(|p| p.card(discount))
        .collect();

    Ok(Json(SubtypeListingResponse {
        product_type,
        product_subtype,
        products,
    }))
}

async fn type_summaries(services: &AppServices) -> Result<Vec<ProductTypeSummary>, ApiError> {
    Ok(services
        .stores
        .catalog
        .product_types()
        .await?
        .iter()
        .map(|t| t.summary())
        .collect())
}
