use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::api::handlers::error_response;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),
    #[error("role name already in use")]
    DuplicateRoleName,
    #[error("role not found")]
    RoleNotFound,
    #[error("permission category not found")]
    CategoryNotFound,
    #[error("permission not found")]
    PermissionNotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for CatalogError {
    /// Database errors are logged and surfaced as `500` with the store message in `details`.
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => error_response(StatusCode::BAD_REQUEST, message, None),
            Self::DuplicateRoleName => error_response(
                StatusCode::BAD_REQUEST,
                "El rol ya existe. Por favor, elija un nombre diferente",
                None,
            ),
            Self::RoleNotFound => error_response(StatusCode::NOT_FOUND, "Rol no encontrado", None),
            Self::CategoryNotFound => error_response(
                StatusCode::NOT_FOUND,
                "Categoría de permiso no encontrada",
                None,
            ),
            Self::PermissionNotFound => {
                error_response(StatusCode::NOT_FOUND, "Permiso no encontrado", None)
            }
            Self::Database(err) => {
                error!("Database error: {err}");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error de base de datos",
                    Some(err.to_string()),
                )
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("{0}")]
    Validation(String),
    #[error("role {0} not found")]
    RoleNotFound(i64),
    #[error("permission {0} not found")]
    PermissionNotFound(i64),
    #[error("role {role_id} does not hold permission {permission_id}")]
    AssignmentNotFound { role_id: i64, permission_id: i64 },
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for AssignmentError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl IntoResponse for AssignmentError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => error_response(StatusCode::BAD_REQUEST, message, None),
            Self::RoleNotFound(_) => error_response(StatusCode::NOT_FOUND, "Rol no encontrado", None),
            Self::PermissionNotFound(id) => error_response(
                StatusCode::NOT_FOUND,
                format!("Permiso con ID {id} no encontrado"),
                None,
            ),
            Self::AssignmentNotFound { .. } => error_response(
                StatusCode::NOT_FOUND,
                "Relación rol-permiso no encontrada",
                None,
            ),
            Self::Database(details) => {
                error!("Assignment database error: {details}");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error de base de datos",
                    Some(details),
                )
            }
        }
    }
}
