use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::sync::Arc;

use super::{ApiError, ApiResult};
use crate::{
    extractors::AppJson,
    middlewares::auth::JwtService,
    models::user::CreateUserRequest,
    services::{auth_service::AuthService, AppState},
};

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        state.users.clone(),
        JwtService::new(&state.config.signing_key),
        state.config.token_ttl_minutes,
    )
}

/// Decode `Authorization: Basic base64(username:password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let encoded = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?
        .strip_prefix("Basic ")?;
    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (username, password) = credentials.split_once(':')?;
    if username.is_empty() {
        return None;
    }
    Some((username.to_string(), password.to_string()))
}

/// POST /api/user - Register a new user
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    tracing::info!("Registering new user: {}", req.username);

    let profile = auth_service(&state).create_user(req).await?;

    Ok((StatusCode::CREATED, Json(json!({ "user": profile }))))
}

/// POST /api/login - Exchange Basic credentials for a bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let (username, password) = basic_credentials(&headers).ok_or_else(|| {
        ApiError::Unauthorized("Basic auth header is not in correct format".to_string())
    })?;

    let response = auth_service(&state).login(&username, &password).await?;

    Ok(Json(response))
}
