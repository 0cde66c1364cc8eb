use axum::{
    Json,
    http::{HeaderMap, StatusCode, header},
};

use crate::app::dto::HeadersResponse;
use crate::app::errors::ApiError;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Echo the client's `User-Agent` and `Accept-Language`.
pub async fn headers(headers: HeaderMap) -> Result<Json<HeadersResponse>, ApiError> {
    let user_agent = required_header(&headers, header::USER_AGENT, "User-Agent")?;
    let accept_language = required_header(&headers, header::ACCEPT_LANGUAGE, "Accept-Language")?;
    Ok(Json(HeadersResponse {
        user_agent,
        accept_language,
    }))
}

fn required_header(
    headers: &HeaderMap,
    name: header::HeaderName,
    display: &'static str,
) -> Result<String, ApiError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .ok_or(ApiError::HeaderMissing(display))
}
