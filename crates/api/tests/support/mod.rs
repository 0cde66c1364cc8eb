#![allow(dead_code)]

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use reqwest::header::SET_COOKIE;
use serde_json::json;

use storefront_infra::{AppConfig, Stores};

pub const SECRET: &str = "test-secret";

pub struct TestServer {
    pub base_url: String,
    pub ws_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        // Same router as prod, in-memory storage, ephemeral port.
        let config = AppConfig {
            secret_key: SECRET.to_string(),
            cookie_secure: false,
            ..AppConfig::default()
        };
        let services = storefront_api::app::AppServices::new(&config, Stores::in_memory());
        let app = storefront_api::app::build_app(services, &config.cors_origin);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            ws_url: format!("ws://{addr}"),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Sign `{id, role, exp}` directly, bypassing the server.
pub fn mint_token(id: i64, role: &str, expires_in: ChronoDuration) -> String {
    let claims = json!({
        "id": id,
        "role": role,
        "exp": (Utc::now() + expires_in).timestamp(),
    });
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

pub fn decode_claims(token: &str) -> serde_json::Value {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    jsonwebtoken::decode::<serde_json::Value>(
        token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &validation,
    )
    .expect("failed to decode jwt")
    .claims
}

/// Full `Set-Cookie` header for cookie `name`, if the response sets it.
pub fn set_cookie(res: &reqwest::Response, name: &str) -> Option<String> {
    res.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .map(str::to_owned)
}

/// Value of cookie `name` from the response's `Set-Cookie` headers.
pub fn cookie_value(res: &reqwest::Response, name: &str) -> Option<String> {
    let header = set_cookie(res, name)?;
    let pair = header.split(';').next()?;
    pair.split_once('=').map(|(_, v)| v.to_string())
}

pub fn session_cookie(token: &str) -> String {
    format!("jwt_access_token={token}")
}

/// Register through the token flow; returns the `{id, role}` body and the
/// session token.
pub async fn register_jwt(
    client: &reqwest::Client,
    srv: &TestServer,
    login: &str,
    password: &str,
) -> (serde_json::Value, String) {
    let res = client
        .post(srv.url("/registration_jwt"))
        .form(&[("login", login), ("password", password)])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let token = cookie_value(&res, "jwt_access_token").expect("session cookie");
    (res.json().await.unwrap(), token)
}
