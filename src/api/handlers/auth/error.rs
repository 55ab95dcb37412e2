//! Error type shared by the register, login and session handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use super::token::TokenError;
use crate::api::handlers::error_response;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("email already registered")]
    DuplicateEmail,
    #[error("curp already registered")]
    DuplicateCurp,
    #[error("unknown gender")]
    UnknownGender,
    #[error("unknown role")]
    UnknownRole,
    #[error("unknown email")]
    UnknownEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    PasswordHashing(String),
    #[error("{0}")]
    Signing(TokenError),
    #[error("persistence failure: {0:#}")]
    Persistence(anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::DuplicateEmail
            | Self::DuplicateCurp
            | Self::UnknownGender
            | Self::UnknownRole => StatusCode::BAD_REQUEST,
            Self::UnknownEmail | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::PasswordHashing(_) | Self::Signing(_) | Self::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::DuplicateEmail => "Email ya ha sido registrado".to_string(),
            Self::DuplicateCurp => "CURP ya ha sido registrado".to_string(),
            Self::UnknownGender => "Género no encontrado".to_string(),
            Self::UnknownRole => "Rol no encontrado".to_string(),
            Self::UnknownEmail => "El correo electrónico no existe".to_string(),
            Self::InvalidCredentials => "La contraseña es incorrecta".to_string(),
            Self::PasswordHashing(_) => "Error al hashear contraseña".to_string(),
            Self::Signing(_) => "Error generando token".to_string(),
            Self::Persistence(_) => "Error de base de datos".to_string(),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        Self::Signing(err)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = match &self {
            Self::Persistence(err) => {
                error!("Auth persistence error: {err:#}");
                Some(format!("{err:#}"))
            }
            Self::PasswordHashing(err) => {
                error!("Password hashing failed: {err}");
                None
            }
            Self::Signing(err) => {
                error!("Token signing failed: {err}");
                None
            }
            _ => None,
        };
        error_response(status, self.message(), details)
    }
}
