//! Session ledger: one row per issued token, the authority on whether a token is honored.
//!
//! Rows are keyed by the SHA-256 digest of the token. Expired rows are left in place;
//! expiry is checked on every lookup.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::{PgExecutor, PgPool, Row};
use tracing::Instrument;

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: i64,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// Hash a session token so raw values never touch the database.
pub(crate) fn hash_session_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Insert a session for `token` expiring `ttl_seconds` from now; returns the expiry.
pub(crate) async fn open_session<'e>(
    executor: impl PgExecutor<'e>,
    user_id: i64,
    token: &str,
    ttl_seconds: i64,
) -> Result<DateTime<Utc>> {
    let expires_at = Utc::now() + Duration::seconds(ttl_seconds);
    let query = r"
        INSERT INTO sessions (user_id, token_hash, expires_at)
        VALUES ($1, $2, $3)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(hash_session_token(token))
        .bind(expires_at)
        .execute(executor)
        .instrument(span)
        .await
        .context("failed to open session")?;

    Ok(expires_at)
}

pub(crate) async fn lookup_session(pool: &PgPool, token: &str) -> Result<Option<SessionRecord>> {
    let query = r"
        SELECT id, user_id, expires_at, revoked_at
        FROM sessions
        WHERE token_hash = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(hash_session_token(token))
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session")?;

    Ok(row.map(|row| SessionRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        revoked_at: row.get("revoked_at"),
    }))
}

/// Stamp `revoked_at` on the session for `token`; returns `false` when no live row matched.
pub(crate) async fn revoke_session(pool: &PgPool, token: &str) -> Result<bool> {
    let query = r"
        UPDATE sessions
        SET revoked_at = NOW(), updated_at = NOW()
        WHERE token_hash = $1
          AND revoked_at IS NULL
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(hash_session_token(token))
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to revoke session")?;

    Ok(result.rows_affected() > 0)
}
