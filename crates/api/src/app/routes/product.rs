use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, WebSocketUpgrade},
    response::{IntoResponse, Response},
};

use storefront_auth::{Identity, Role, ensure_declared};
use storefront_catalog::Surface;
use storefront_core::{ProductId, UserId};

use crate::app::AppServices;
use crate::app::dto::{LiveChannelParams, ProductPageResponse};
use crate::app::errors::ApiError;
use crate::app::routes::common::viewer_discount;
use crate::context::IdentityContext;
use crate::live;

/// Product page data, or the live feedback channel when the request asks
/// for a WebSocket upgrade.
pub async fn product_page(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    Path(product_id): Path<ProductId>,
    Query(params): Query<LiveChannelParams>,
    upgrade: Option<WebSocketUpgrade>,
) -> Result<Response, ApiError> {
    let product = services
        .stores
        .catalog
        .product(product_id)
        .await?
        .ok_or(ApiError::ProductNotFound)?;

    if let Some(upgrade) = upgrade {
        let identity = declared_identity(&ctx, &params)?;
        return Ok(upgrade
            .on_upgrade(move |socket| live::serve_connection(socket, services, product_id, identity))
            .into_response());
    }

    let discount = viewer_discount(&services, &ctx, Surface::ProductPage).await?;
    let feedbacks = services
        .stores
        .feedback
        .list_for_product(product_id)
        .await?
        .iter()
        .map(|f| f.view())
        .collect();

    Ok(Json(ProductPageResponse {
        product_id: product.id,
        product_type: product.type_name,
        product_subtype: product.subtype_name,
        product_name: product.name,
        product_description: product.description,
        product_additional_information: product.additional_information,
        product_rating: product.rating,
        product_price: product.price,
        product_bonus_price: product.price.discounted(discount),
        product_availability: product.quantity_in_stock.is_some_and(|q| q > 0),
        product_image_link: product.image_link,
        feedbacks,
        role: ctx.role(),
    })
    .into_response())
}

/// The live channel trusts the session, not the query string: the declared
/// identity must be exactly the one the cookie resolved to.
fn declared_identity(ctx: &IdentityContext, params: &LiveChannelParams) -> Result<Identity, ApiError> {
    let (Some(user_id), Some(user_role)) = (params.user_id.as_deref(), params.user_role.as_deref())
    else {
        return Err(ApiError::LiveChannelParameters);
    };
    let user_id: i64 = user_id
        .trim()
        .parse()
        .map_err(|_| ApiError::LiveChannelParameters)?;
    let declared_role: Role = user_role
        .parse()
        .map_err(|_| ApiError::LiveChannelParameters)?;

    let identity = ctx.identity();
    ensure_declared(&identity, UserId::new(user_id), declared_role).map_err(|e| {
        tracing::warn!(reason = %e, "live channel connection refused");
        ApiError::LiveChannelForbidden
    })?;
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(user_id: Option<&str>, user_role: Option<&str>) -> LiveChannelParams {
        LiveChannelParams {
            user_id: user_id.map(str::to_string),
            user_role: user_role.map(str::to_string),
        }
    }

    fn guest() -> IdentityContext {
        IdentityContext::new(Identity::GUEST)
    }

    #[test]
    fn guest_declaring_itself_is_accepted() {
        let identity = declared_identity(&guest(), &params(Some("0"), Some("guest"))).unwrap();
        assert!(identity.is_guest());
    }

    #[test]
    fn unparsable_or_missing_parameters_are_rejected_as_invalid() {
        for p in [
            params(Some("abc"), Some("guest")),
            params(Some("0"), Some("superuser")),
            params(None, Some("guest")),
            params(Some("0"), None),
        ] {
            let err = declared_identity(&guest(), &p).unwrap_err();
            assert!(matches!(err, ApiError::LiveChannelParameters), "{p:?}");
            assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
            assert_eq!(err.code(), "Invalid value");
        }
    }

    #[test]
    fn mismatched_declaration_is_forbidden() {
        let err = declared_identity(&guest(), &params(Some("7"), Some("user"))).unwrap_err();
        assert!(matches!(err, ApiError::LiveChannelForbidden));
    }
}
