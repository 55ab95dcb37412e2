//! Auth request/response types shared between handlers and `OpenAPI` generation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::handlers::catalog::types::RoleResponse;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido_p")]
    pub last_name_paternal: String,
    #[serde(rename = "apellido_m")]
    pub last_name_maternal: String,
    pub email: String,
    pub curp: String,
    pub password: String,
    /// `YYYY-MM-DD`
    #[serde(rename = "fecha_nac")]
    pub birth_date: String,
    #[serde(rename = "genero_id")]
    pub gender_id: i64,
    #[serde(rename = "rol_id")]
    pub role_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenderResponse {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
}

/// Identity with its gender and role expanded; never carries the password hash.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IdentityResponse {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido_p")]
    pub last_name_paternal: String,
    #[serde(rename = "apellido_m")]
    pub last_name_maternal: String,
    pub email: String,
    pub curp: String,
    #[serde(rename = "fecha_nac")]
    pub birth_date: NaiveDate,
    #[serde(rename = "genero_id")]
    pub gender_id: i64,
    #[serde(rename = "genero")]
    pub gender: GenderResponse,
    #[serde(rename = "rol_id")]
    pub role_id: i64,
    #[serde(rename = "rol")]
    pub role: RoleResponse,
    #[serde(rename = "activo")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    /// Session expiry; the token is not honored past this instant.
    pub expires_at: DateTime<Utc>,
    pub user: IdentityResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
    pub status: u16,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateTokenResponse {
    pub message: String,
    pub status: u16,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub message: String,
    pub user_id: i64,
    pub user: IdentityResponse,
}
