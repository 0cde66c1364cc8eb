//! Registration and authentication in three flavours, plus the identity
//! query.
//!
//! All flows share validation, storage and password handling; they differ
//! only in how the result is carried back to the client.

use std::sync::Arc;

use axum::{
    Extension, Form, Json,
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
};

use storefront_auth::{Identity, hash_password, verify_password};
use storefront_core::validation::{validate_login, validate_password};
use storefront_infra::{NewUser, StoreError, UserRecord};

use crate::app::AppServices;
use crate::app::dto::{CredentialsForm, IdentityResponse};
use crate::app::errors::ApiError;
use crate::context::IdentityContext;
use crate::session::{ACCESS_COOKIE, JWT_COOKIE};

/// How a successful registration or login is handed back.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Flow {
    /// `{id, role}` only.
    Base,
    /// `{id, role}` plus the `access_token` cookie.
    Cookie,
    /// `{id, role}` plus the `jwt_access_token` session cookie.
    Jwt,
}

impl Flow {
    fn cookie_name(self) -> Option<&'static str> {
        match self {
            Flow::Base => None,
            Flow::Cookie => Some(ACCESS_COOKIE),
            Flow::Jwt => Some(JWT_COOKIE),
        }
    }
}

pub async fn registration_base(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let user = register(&services, form).await?;
    respond(&services, Flow::Base, &user)
}

pub async fn authentication_base(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let user = authenticate(&services, form).await?;
    respond(&services, Flow::Base, &user)
}

pub async fn registration_cookie(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let user = register(&services, form).await?;
    respond(&services, Flow::Cookie, &user)
}

pub async fn authentication_cookie(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let user = authenticate(&services, form).await?;
    respond(&services, Flow::Cookie, &user)
}

pub async fn registration_jwt(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let user = register(&services, form).await?;
    respond(&services, Flow::Jwt, &user)
}

pub async fn authentication_jwt(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let user = authenticate(&services, form).await?;
    respond(&services, Flow::Jwt, &user)
}

/// The identity the resolver settled on (guest when no cookie was sent).
pub async fn get_user_data(Extension(ctx): Extension<IdentityContext>) -> Json<IdentityResponse> {
    Json(IdentityResponse::from(ctx.identity()))
}

async fn register(services: &AppServices, form: CredentialsForm) -> Result<UserRecord, ApiError> {
    validate_login(&form.login)?;
    validate_password(&form.password)?;

    let credentials = &services.stores.credentials;
    if credentials.find_by_login(&form.login).await?.is_some() {
        tracing::info!(login = %form.login, "registration rejected: login taken");
        return Err(ApiError::LoginTaken);
    }

    let password = form.password;
    let password_hash = blocking(move || hash_password(&password)).await??;

    let user = credentials
        .create_user(NewUser {
            login: form.login,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::LoginTaken,
            other => ApiError::from(other),
        })?;

    tracing::info!(user_id = %user.id, login = %user.login, "user registered");
    Ok(user)
}

async fn authenticate(
    services: &AppServices,
    form: CredentialsForm,
) -> Result<UserRecord, ApiError> {
    let Some(user) = services.stores.credentials.find_by_login(&form.login).await? else {
        tracing::info!(login = %form.login, "authentication failed: unknown login");
        return Err(ApiError::UnknownLogin);
    };

    let password = form.password;
    let digest = user.password_hash.clone();
    if !blocking(move || verify_password(&password, &digest)).await? {
        tracing::warn!(user_id = %user.id, "authentication failed: wrong password");
        return Err(ApiError::WrongPassword);
    }

    tracing::info!(user_id = %user.id, role = %user.role, "user authenticated");
    Ok(user)
}

fn respond(services: &AppServices, flow: Flow, user: &UserRecord) -> Result<Response, ApiError> {
    let identity =
        Identity::new(user.id, user.role).map_err(|e| ApiError::Internal(e.to_string()))?;
    let mut response = Json(IdentityResponse::from(identity)).into_response();

    if let Some(name) = flow.cookie_name() {
        let cookie = services.sessions.issue(name, identity)?;
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    Ok(response)
}

/// Password hashing is CPU-bound; keep it off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))
}
