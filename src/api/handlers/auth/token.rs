//! Signed bearer tokens (HS256) bound to an identity id.
//!
//! A valid signature is never enough on its own: the access gate also requires a
//! live session row for the exact token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use ulid::Ulid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub exp: i64,
    pub iat: i64,
    /// Unique per issued token so two logins in the same second never collide in the ledger.
    pub jti: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("invalid token")]
    Invalid,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenIssuer {
    has_secret: bool,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("has_secret", &self.has_secret)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            has_secret: !secret.is_empty(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Mint a token for `user_id` expiring `ttl` from `now`.
    ///
    /// # Errors
    /// Returns `TokenError::Signing` when no secret is configured or encoding fails.
    pub fn issue_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        if !self.has_secret {
            return Err(TokenError::Signing("missing signing secret".to_string()));
        }

        let expires_at = now + self.ttl;
        let claims = Claims {
            user_id,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Ulid::new().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| TokenError::Signing(err.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Mint a token for `user_id` expiring `ttl` from now.
    ///
    /// # Errors
    /// Returns `TokenError::Signing` when no secret is configured or encoding fails.
    pub fn issue(&self, user_id: i64) -> Result<IssuedToken, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Check the signature and embedded expiry, returning the claims.
    ///
    /// # Errors
    /// Returns `TokenError::Invalid` for a bad signature, malformed claims or an expired token.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }
}

/// Read the embedded expiry without checking the signature.
///
/// Only used on logout, where the token already passed the access gate.
#[must_use]
pub fn decode_expiry_unverified(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.insecure_disable_signature_validation();

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    DateTime::from_timestamp(data.claims.exp, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(&SecretString::from(secret.to_string()), 7200)
    }

    #[test]
    fn issue_then_verify_returns_identity() {
        let issuer = issuer("test-secret");
        let issued = issuer.issue(42).unwrap();
        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn issue_without_secret_is_a_signing_error() {
        let issuer = issuer("");
        assert!(matches!(issuer.issue(1), Err(TokenError::Signing(_))));
    }

    #[test]
    fn tokens_for_the_same_user_are_distinct() {
        let issuer = issuer("test-secret");
        let now = Utc::now();
        let first = issuer.issue_at(7, now).unwrap();
        let second = issuer.issue_at(7, now).unwrap();
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn verify_rejects_other_secret() {
        let issued = issuer("secret-a").issue(1).unwrap();
        assert!(matches!(
            issuer("secret-b").verify(&issued.token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let issuer = issuer("test-secret");
        let issued = issuer
            .issue_at(1, Utc::now() - Duration::seconds(3 * 7200))
            .unwrap();
        assert!(issuer.verify(&issued.token).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(issuer("test-secret").verify("not.a.token").is_err());
    }

    #[test]
    fn expiry_is_readable_without_the_secret() {
        let issued = issuer("test-secret").issue(9).unwrap();
        assert_eq!(
            decode_expiry_unverified(&issued.token).map(|exp| exp.timestamp()),
            Some(issued.expires_at.timestamp())
        );
        assert_eq!(decode_expiry_unverified("garbage"), None);
    }
}
