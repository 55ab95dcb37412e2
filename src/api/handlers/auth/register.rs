use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    credentials::{create_identity, validate_registration},
    error::AuthError,
    ledger::open_session,
    state::AuthState,
    types::{AuthResponse, RegisterRequest},
};
use crate::api::handlers::ErrorBody;

#[utoipa::path(
    post,
    path= "/api/register",
    request_body = RegisterRequest,
    responses (
        (status = 201, description = "Identity created and signed in", body = AuthResponse),
        (status = 400, description = "Invalid input, duplicate email/CURP or unknown gender/role", body = ErrorBody),
        (status = 500, description = "Hashing or persistence failure", body = ErrorBody),
    ),
    tag= "auth",
)]
// axum handler for register
#[instrument(skip_all)]
pub async fn register(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Ok(Json(payload)) => payload,
        Err(err) => return AuthError::Validation(err.body_text()).into_response(),
    };

    match register_identity(&pool, &auth_state, request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn register_identity(
    pool: &PgPool,
    auth_state: &AuthState,
    request: RegisterRequest,
) -> Result<AuthResponse, AuthError> {
    let identity = validate_registration(&request)?;
    let config = auth_state.config();

    // Identity and session commit together; a failed session leaves no user behind.
    let mut tx = pool
        .begin()
        .await
        .context("failed to begin registration")
        .map_err(AuthError::Persistence)?;

    let user = create_identity(&mut tx, &identity, request.password, config.bcrypt_cost()).await?;

    // The token is only honored with a ledger row, so registration opens a session too.
    let issued = auth_state.issuer().issue(user.id)?;
    let expires_at = open_session(&mut *tx, user.id, &issued.token, config.session_ttl_seconds())
        .await
        .map_err(AuthError::Persistence)?;

    tx.commit()
        .await
        .context("failed to commit registration")
        .map_err(AuthError::Persistence)?;

    info!(user_id = user.id, "Identity registered");

    Ok(AuthResponse {
        message: "Usuario registrado exitosamente".to_string(),
        token: issued.token,
        expires_at,
        user,
    })
}
