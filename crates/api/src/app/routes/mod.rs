use axum::{
    Router,
    routing::{delete, get, patch, post},
};

pub mod auth;
pub mod catalog;
pub mod common;
pub mod product;
pub mod profile;
pub mod system;

/// Endpoints that never look at the session cookie.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/headers", get(system::headers))
        .route("/registration_base", post(auth::registration_base))
        .route("/authentication_base", post(auth::authentication_base))
        .route("/registration_cookie", post(auth::registration_cookie))
        .route("/authentication_cookie", post(auth::authentication_cookie))
        .route("/registration_jwt", post(auth::registration_jwt))
        .route("/authentication_jwt", post(auth::authentication_jwt))
        .route("/catalog/catalog_data", get(catalog::catalog_data))
}

/// Endpoints behind the identity resolver.
pub fn identity_router() -> Router {
    Router::new()
        .route("/", get(catalog::main_page))
        .route("/get_user_data", post(auth::get_user_data))
        .route("/catalog/product/:product_id", get(product::product_page))
        .route(
            "/catalog/:product_type/:product_subtype",
            get(catalog::subtype_listing),
        )
        .route("/user_profile/", get(profile::view))
        .route("/user_profile/update", patch(profile::update))
        .route("/user_profile/delete", delete(profile::delete))
        .route("/user_profile/exit", post(profile::exit))
}
