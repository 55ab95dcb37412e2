//! Session endpoints: logout, token validation and the caller's profile.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::{
    credentials::load_identity,
    gate::{authorize, extract_bearer_token, Principal},
    ledger::revoke_session,
    state::AuthState,
    types::{LogoutResponse, ProfileResponse, ValidateTokenResponse},
};
use crate::api::handlers::{error_response, ErrorBody};

#[utoipa::path(
    post,
    path = "/api/protected/logout",
    responses(
        (status = 200, description = "Token revoked", body = LogoutResponse),
        (status = 401, description = "Rejected by the access gate", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    // Best effort: the caller always gets 200 once past the gate.
    if let Some(token) = extract_bearer_token(&headers) {
        auth_state.revocations().revoke(&token).await;
        match revoke_session(&pool, &token).await {
            Ok(true) => info!("Session revoked"),
            Ok(false) => debug!("No live session to revoke"),
            Err(err) => error!("Failed to revoke session: {err:#}"),
        }
    }

    Json(LogoutResponse {
        message: "Logout exitoso".to_string(),
        status: StatusCode::OK.as_u16(),
    })
}

#[utoipa::path(
    get,
    path = "/api/validate-token",
    responses(
        (status = 200, description = "Session exists, is live and not revoked", body = ValidateTokenResponse),
        (status = 401, description = "Rejected by the access gate", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn validate_token(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    match authorize(&auth_state, &pool, &headers).await {
        Ok(principal) => Json(ValidateTokenResponse {
            message: "Token válido".to_string(),
            status: StatusCode::OK.as_u16(),
            expires_at: principal.session_expires_at,
        })
        .into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/protected/profile",
    responses(
        (status = 200, description = "Caller identity", body = ProfileResponse),
        (status = 401, description = "Rejected by the access gate", body = ErrorBody),
        (status = 404, description = "Identity no longer exists", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn profile(
    Extension(principal): Extension<Principal>,
    pool: Extension<PgPool>,
) -> impl IntoResponse {
    match load_identity(&*pool, principal.user_id).await {
        Ok(Some(user)) => Json(ProfileResponse {
            message: "Acceso concedido".to_string(),
            user_id: principal.user_id,
            user,
        })
        .into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Usuario no encontrado", None),
        Err(err) => err.into_response(),
    }
}
