use storefront_auth::Role;
use storefront_catalog::{CustomerLevel, Discount, Surface, discount_for};

use crate::app::AppServices;
use crate::app::errors::ApiError;
use crate::context::IdentityContext;

/// Bonus card level of the caller; only registered users have one.
pub async fn viewer_level(
    services: &AppServices,
    ctx: &IdentityContext,
) -> Result<Option<CustomerLevel>, ApiError> {
    if ctx.role() != Role::User {
        return Ok(None);
    }
    let user = services.stores.credentials.find_by_id(ctx.user_id()).await?;
    Ok(user.map(|u| u.level))
}

/// Discount the caller sees on `surface`.
pub async fn viewer_discount(
    services: &AppServices,
    ctx: &IdentityContext,
    surface: Surface,
) -> Result<Discount, ApiError> {
    let level = viewer_level(services, ctx).await?;
    Ok(discount_for(&ctx.identity(), level.as_ref(), surface))
}
