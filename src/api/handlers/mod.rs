//! API handlers and shared utilities for Escolar.
//!
//! Handlers are grouped by area: `auth` owns identities, sessions and the access
//! gate, `catalog` owns roles, permissions and their assignments. The JSON error
//! body shared by every area lives here.

pub mod auth;
pub mod catalog;
pub mod health;
pub mod root;
#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error payload returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Build a JSON error response; `details` carries the underlying store error when present.
pub(crate) fn error_response(
    status: StatusCode,
    message: impl Into<String>,
    details: Option<String>,
) -> Response {
    let body = ErrorBody {
        error: message.into(),
        status: status.as_u16(),
        details,
    };
    (status, Json(body)).into_response()
}

/// Lightweight email sanity check used before persisting identities.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@x.com"));
        assert!(!valid_email("a@x"));
        assert!(!valid_email("not an email@x.com"));
    }

    #[tokio::test]
    async fn error_response_omits_empty_details() {
        let response = error_response(StatusCode::NOT_FOUND, "Rol no encontrado", None);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Rol no encontrado");
        assert_eq!(body["status"], 404);
        assert!(body.get("details").is_none());
    }
}
