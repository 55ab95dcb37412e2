//! Credential store: identity persistence and bcrypt password hashing.
//!
//! bcrypt at the configured cost takes on the order of a second, so hashing and
//! verification run on the blocking pool.

use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{postgres::PgRow, PgConnection, PgExecutor, PgPool, Row};
use tracing::{error, Instrument};

use super::{
    error::AuthError,
    types::{GenderResponse, IdentityResponse, RegisterRequest},
};
use crate::api::handlers::{catalog::role_label, catalog::types::RoleResponse, valid_email};

const MIN_PASSWORD_LEN: usize = 6;

/// Registration input after validation; the password is kept apart so it is never stored.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub first_name: String,
    pub last_name_paternal: String,
    pub last_name_maternal: String,
    pub email: String,
    pub curp: String,
    pub birth_date: NaiveDate,
    pub gender_id: i64,
    pub role_id: i64,
}

/// Check required fields and formats; store lookups happen in `create_identity`.
pub(crate) fn validate_registration(request: &RegisterRequest) -> Result<NewIdentity, AuthError> {
    let required = [
        ("nombre", request.first_name.trim()),
        ("apellido_p", request.last_name_paternal.trim()),
        ("apellido_m", request.last_name_maternal.trim()),
        ("email", request.email.trim()),
        ("curp", request.curp.trim()),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
        return Err(AuthError::Validation(format!(
            "El campo {field} es obligatorio"
        )));
    }

    let email = request.email.trim();
    if !valid_email(email) {
        return Err(AuthError::Validation("Email inválido".to_string()));
    }

    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "La contraseña debe tener al menos {MIN_PASSWORD_LEN} caracteres"
        )));
    }

    let birth_date = NaiveDate::parse_from_str(request.birth_date.trim(), "%Y-%m-%d")
        .map_err(|_| {
            AuthError::Validation("Formato de fecha inválido. Use YYYY-MM-DD".to_string())
        })?;

    Ok(NewIdentity {
        first_name: request.first_name.trim().to_string(),
        last_name_paternal: request.last_name_paternal.trim().to_string(),
        last_name_maternal: request.last_name_maternal.trim().to_string(),
        email: email.to_string(),
        curp: request.curp.trim().to_string(),
        birth_date,
        gender_id: request.gender_id,
        role_id: request.role_id,
    })
}

pub(crate) fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|err| AuthError::PasswordHashing(err.to_string()))
}

/// Compare `password` against a stored bcrypt hash.
pub(crate) fn check_password(password_hash: &str, password: &str) -> Result<(), AuthError> {
    match bcrypt::verify(password, password_hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::InvalidCredentials),
        Err(err) => {
            error!("Stored password hash is unreadable: {err}");
            Err(AuthError::InvalidCredentials)
        }
    }
}

pub(crate) async fn verify_password(password_hash: String, password: String) -> Result<(), AuthError> {
    tokio::task::spawn_blocking(move || check_password(&password_hash, &password))
        .await
        .map_err(|err| AuthError::PasswordHashing(err.to_string()))?
}

/// Persist a new identity and return it with gender and role expanded.
///
/// Email and CURP are compared exactly; the unique constraints catch concurrent
/// registrations that pass the pre-checks. Runs on the caller's connection so the
/// insert can share a transaction with the session that follows it.
pub(crate) async fn create_identity(
    conn: &mut PgConnection,
    identity: &NewIdentity,
    password: String,
    cost: u32,
) -> Result<IdentityResponse, AuthError> {
    if exists(&mut *conn, "SELECT 1 FROM users WHERE email = $1", &identity.email).await? {
        return Err(AuthError::DuplicateEmail);
    }
    if exists(&mut *conn, "SELECT 1 FROM users WHERE curp = $1", &identity.curp).await? {
        return Err(AuthError::DuplicateCurp);
    }
    if !exists_id(&mut *conn, "SELECT 1 FROM genders WHERE id = $1", identity.gender_id).await? {
        return Err(AuthError::UnknownGender);
    }
    if !exists_id(
        &mut *conn,
        "SELECT 1 FROM roles WHERE id = $1 AND deleted_at IS NULL",
        identity.role_id,
    )
    .await?
    {
        return Err(AuthError::UnknownRole);
    }

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|err| AuthError::PasswordHashing(err.to_string()))??;

    let query = r"
        INSERT INTO users (
            first_name, last_name_paternal, last_name_maternal, email, curp,
            password_hash, birth_date, gender_id, role_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(&identity.first_name)
        .bind(&identity.last_name_paternal)
        .bind(&identity.last_name_maternal)
        .bind(&identity.email)
        .bind(&identity.curp)
        .bind(&password_hash)
        .bind(identity.birth_date)
        .bind(identity.gender_id)
        .bind(identity.role_id)
        .fetch_one(&mut *conn)
        .instrument(span)
        .await
        .map_err(map_insert_error)?;

    let user_id: i64 = row.get("id");
    load_identity(&mut *conn, user_id)
        .await?
        .ok_or_else(|| AuthError::Persistence(anyhow::anyhow!("identity {user_id} vanished")))
}

/// Returns the id and stored hash for `email`, if registered.
pub(crate) async fn find_credentials(
    pool: &PgPool,
    email: &str,
) -> Result<Option<(i64, String)>, AuthError> {
    let query = "SELECT id, password_hash FROM users WHERE email = $1 LIMIT 1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup credentials")
        .map_err(AuthError::Persistence)?;

    Ok(row.map(|row| (row.get("id"), row.get("password_hash"))))
}

pub(crate) async fn load_identity<'e>(
    executor: impl PgExecutor<'e>,
    user_id: i64,
) -> Result<Option<IdentityResponse>, AuthError> {
    // Soft-deleted roles still expand so existing identities keep loading.
    let query = r"
        SELECT u.id, u.first_name, u.last_name_paternal, u.last_name_maternal,
               u.email, u.curp, u.birth_date, u.gender_id, u.role_id, u.active,
               u.created_at, u.updated_at,
               g.name AS gender_name,
               r.name AS role_name, r.description AS role_description, r.icon AS role_icon,
               r.for_students, r.for_staff, r.for_tutors,
               r.created_at AS role_created_at, r.updated_at AS role_updated_at
        FROM users u
        JOIN genders g ON g.id = u.gender_id
        JOIN roles r ON r.id = u.role_id
        WHERE u.id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(executor)
        .instrument(span)
        .await
        .context("failed to load identity")
        .map_err(AuthError::Persistence)?;

    Ok(row.as_ref().map(identity_from_row))
}

fn identity_from_row(row: &PgRow) -> IdentityResponse {
    let for_students: bool = row.get("for_students");
    let for_staff: bool = row.get("for_staff");
    let for_tutors: bool = row.get("for_tutors");
    let role_id: i64 = row.get("role_id");
    let gender_id: i64 = row.get("gender_id");

    IdentityResponse {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name_paternal: row.get("last_name_paternal"),
        last_name_maternal: row.get("last_name_maternal"),
        email: row.get("email"),
        curp: row.get("curp"),
        birth_date: row.get("birth_date"),
        gender_id,
        gender: GenderResponse {
            id: gender_id,
            name: row.get("gender_name"),
        },
        role_id,
        role: RoleResponse {
            id: role_id,
            name: row.get("role_name"),
            description: row.get("role_description"),
            icon: row.get("role_icon"),
            for_students,
            for_staff,
            for_tutors,
            tipo: role_label(for_students, for_staff, for_tutors).to_string(),
            created_at: row.get("role_created_at"),
            updated_at: row.get("role_updated_at"),
            permissions: None,
        },
        active: row.get("active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

async fn exists(
    conn: &mut PgConnection,
    query: &'static str,
    value: &str,
) -> Result<bool, AuthError> {
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(value)
        .fetch_optional(conn)
        .instrument(span)
        .await
        .context("failed to check identity uniqueness")
        .map_err(AuthError::Persistence)?;
    Ok(row.is_some())
}

async fn exists_id(
    conn: &mut PgConnection,
    query: &'static str,
    id: i64,
) -> Result<bool, AuthError> {
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(conn)
        .instrument(span)
        .await
        .context("failed to check referenced record")
        .map_err(AuthError::Persistence)?;
    Ok(row.is_some())
}

fn map_insert_error(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some("users_email_key") => return AuthError::DuplicateEmail,
            Some("users_curp_key") => return AuthError::DuplicateCurp,
            Some("users_gender_id_fkey") => return AuthError::UnknownGender,
            Some("users_role_id_fkey") => return AuthError::UnknownRole,
            _ => {}
        }
    }
    AuthError::Persistence(anyhow::Error::new(err).context("failed to insert identity"))
}
