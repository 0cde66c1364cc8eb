use std::sync::Arc;

use axum::{Extension, Json, response::Response};

use storefront_auth::{Role, authorize};
use storefront_catalog::{LevelProgress, level_progress};
use storefront_core::Field;
use storefront_core::validation::normalize_personal_name;
use storefront_infra::StoreError;

use crate::app::AppServices;
use crate::app::dto::{BonusCard, PersonalDataRequest, PersonalDataResponse, ProfileResponse};
use crate::app::errors::{ApiError, ProfileAction};
use crate::context::IdentityContext;

fn require_user(ctx: &IdentityContext, action: ProfileAction) -> Result<(), ApiError> {
    authorize(&ctx.identity(), Role::User).map_err(|_| ApiError::ProfileAccess(action))
}

fn account_error(e: StoreError) -> ApiError {
    match e {
        StoreError::NotFound => ApiError::AccountMissing,
        other => ApiError::from(other),
    }
}

pub async fn view(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
) -> Result<Json<ProfileResponse>, ApiError> {
    require_user(&ctx, ProfileAction::View)?;

    let credentials = &services.stores.credentials;
    let user = credentials
        .find_by_id(ctx.user_id())
        .await?
        .ok_or(ApiError::AccountMissing)?;
    let next = credentials.next_level(&user.level).await?;

    let (amount_of_purchases_to_next_level, bonus_card_max_level_message) =
        match level_progress(user.total_purchases, next.as_ref()) {
            LevelProgress::NextLevel { remaining, .. } => (Some(remaining), false),
            LevelProgress::MaxLevel => (None, true),
        };

    Ok(Json(ProfileResponse {
        first_name: user.first_name,
        last_name: user.last_name,
        phone_number: user.phone_number.unwrap_or_default(),
        email: user.email.unwrap_or_default(),
        bonus_card: BonusCard {
            level: user.level.name,
            discount_percent: user.level.discount.percent(),
            total_amount_of_purchases: user.total_purchases,
        },
        amount_of_purchases_to_next_level,
        bonus_card_max_level_message,
    }))
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
    Json(body): Json<PersonalDataRequest>,
) -> Result<Json<PersonalDataResponse>, ApiError> {
    require_user(&ctx, ProfileAction::Update)?;

    let first_name = normalize_personal_name(&body.first_name, Field::FirstName)?;
    let last_name = normalize_personal_name(&body.last_name, Field::LastName)?;

    let user = services
        .stores
        .credentials
        .update_personal_data(ctx.user_id(), &first_name, &last_name)
        .await
        .map_err(account_error)?;

    tracing::info!(user_id = %user.id, "personal data updated");
    Ok(Json(PersonalDataResponse {
        updated_first_name: user.first_name,
        updated_last_name: user.last_name,
    }))
}

/// Delete the account and end the session.
pub async fn delete(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
) -> Result<Response, ApiError> {
    require_user(&ctx, ProfileAction::Delete)?;

    services
        .stores
        .credentials
        .delete_user(ctx.user_id())
        .await
        .map_err(account_error)?;

    tracing::info!(user_id = %ctx.user_id(), "account deleted");
    Ok(services.sessions.revoke())
}

/// Logout.
pub async fn exit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
) -> Result<Response, ApiError> {
    require_user(&ctx, ProfileAction::Exit)?;

    tracing::info!(user_id = %ctx.user_id(), "user logged out");
    Ok(services.sessions.revoke())
}
