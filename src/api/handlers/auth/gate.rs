//! Access gate for `/api/protected/*` and the validate-token endpoint.
//!
//! Flow Overview:
//! 1) Read the bearer token from the `Authorization` header.
//! 2) Reject tokens held in the revocation registry.
//! 3) Resolve the session ledger row: missing, revoked or expired rows are rejected.
//! 4) Verify the signature and decode the caller id.
//!
//! The ledger is consulted before the signature so that a revoked token that is
//! still correctly signed can never pass.

use axum::{
    extract::{Extension, Request},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

use super::{
    ledger::{lookup_session, SessionRecord},
    state::AuthState,
};
use crate::api::handlers::error_response;

/// Authenticated caller attached to the request by the gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub session_expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    #[error("missing token")]
    MissingToken,
    #[error("token revoked")]
    TokenRevoked,
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("session store unavailable")]
    StoreUnavailable,
}

impl GateRejection {
    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            Self::StoreUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            Self::MissingToken => "Se requiere el header de autorización",
            Self::TokenRevoked => "Token ha sido invalidado",
            Self::SessionNotFound => "Token inválido o no encontrado",
            Self::SessionExpired => "La sesión ha expirado, por favor inicia sesión nuevamente",
            Self::InvalidSignature => "Token inválido",
            Self::StoreUnavailable => "Error de base de datos",
        }
    }

    /// Stable machine-readable code returned next to the message.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::MissingToken => "MissingToken",
            Self::TokenRevoked => "TokenRevoked",
            Self::SessionNotFound => "SessionNotFound",
            Self::SessionExpired => "SessionExpired",
            Self::InvalidSignature => "InvalidSignature",
            Self::StoreUnavailable => "StoreUnavailable",
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        error_response(self.status(), self.reason(), Some(self.code().to_string()))
    }
}

/// Extract the bearer token from the `Authorization` header.
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Ledger step of the gate: the row must exist, be unrevoked and unexpired.
pub(crate) fn check_session(
    record: Option<&SessionRecord>,
    now: DateTime<Utc>,
) -> Result<&SessionRecord, GateRejection> {
    let record = record.ok_or(GateRejection::SessionNotFound)?;
    if record.is_revoked() {
        return Err(GateRejection::TokenRevoked);
    }
    if record.is_expired(now) {
        return Err(GateRejection::SessionExpired);
    }
    Ok(record)
}

/// Run every gate check for `token`, in order.
///
/// # Errors
/// Returns the first `GateRejection` hit; store failures map to `StoreUnavailable`.
pub async fn authorize_token(
    state: &AuthState,
    pool: &PgPool,
    token: &str,
) -> Result<Principal, GateRejection> {
    if state.revocations().is_revoked(token).await {
        return Err(GateRejection::TokenRevoked);
    }

    let record = lookup_session(pool, token).await.map_err(|err| {
        error!("Failed to lookup session: {err:#}");
        GateRejection::StoreUnavailable
    })?;
    let record = check_session(record.as_ref(), Utc::now())?;

    let claims = state
        .issuer()
        .verify(token)
        .map_err(|_| GateRejection::InvalidSignature)?;

    // A ledger row only ever belongs to the identity the token was minted for.
    if claims.user_id != record.user_id {
        return Err(GateRejection::InvalidSignature);
    }

    Ok(Principal {
        user_id: claims.user_id,
        session_expires_at: record.expires_at,
    })
}

/// # Errors
/// Returns `MissingToken` when no bearer token is present, otherwise see `authorize_token`.
pub async fn authorize(
    state: &AuthState,
    pool: &PgPool,
    headers: &HeaderMap,
) -> Result<Principal, GateRejection> {
    let token = extract_bearer_token(headers).ok_or(GateRejection::MissingToken)?;
    authorize_token(state, pool, &token).await
}

/// Middleware: attach a `Principal` or short-circuit with the rejection.
pub async fn require_session(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    mut request: Request,
    next: Next,
) -> Response {
    match authorize(&state, &pool, request.headers()).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(rejection) => {
            debug!(reason = rejection.code(), "Access gate rejected request");
            rejection.into_response()
        }
    }
}
