use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    credentials::{find_credentials, load_identity, verify_password},
    error::AuthError,
    ledger::open_session,
    state::AuthState,
    types::{AuthResponse, LoginRequest},
};
use crate::api::handlers::{catalog::storage::fetch_role_permissions, ErrorBody};

#[utoipa::path(
    post,
    path= "/api/login",
    request_body = LoginRequest,
    responses (
        (status = 200, description = "Signed in; the role carries its permissions", body = AuthResponse),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 401, description = "Unknown email or wrong password", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
    tag= "auth",
)]
// axum handler for login
#[instrument(skip_all)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Ok(Json(payload)) => payload,
        Err(err) => return AuthError::Validation(err.body_text()).into_response(),
    };

    match sign_in(&pool, &auth_state, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn sign_in(
    pool: &PgPool,
    auth_state: &AuthState,
    request: LoginRequest,
) -> Result<AuthResponse, AuthError> {
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(AuthError::Validation(
            "Email y contraseña son obligatorios".to_string(),
        ));
    }

    let (user_id, password_hash) = find_credentials(pool, email)
        .await?
        .ok_or(AuthError::UnknownEmail)?;

    verify_password(password_hash, request.password).await?;

    let mut user = load_identity(pool, user_id)
        .await?
        .ok_or(AuthError::UnknownEmail)?;
    let permissions = fetch_role_permissions(pool, user.role_id)
        .await
        .map_err(|err| AuthError::Persistence(err.into()))?;
    user.role.permissions = Some(permissions);

    let issued = auth_state.issuer().issue(user_id)?;
    let expires_at = open_session(
        pool,
        user_id,
        &issued.token,
        auth_state.config().session_ttl_seconds(),
    )
    .await
    .map_err(AuthError::Persistence)?;

    info!(user_id, "Session opened");

    Ok(AuthResponse {
        message: "Inicio de sesión exitoso".to_string(),
        token: issued.token,
        expires_at,
        user,
    })
}
