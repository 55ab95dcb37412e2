//! Auth configuration and the shared state handed to handlers and the access gate.

use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;

use super::{revocation::RevocationRegistry, token::TokenIssuer};

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 2 * 60 * 60;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 2 * 60 * 60;
const DEFAULT_REVOCATION_SWEEP_SECONDS: u64 = 60 * 60;
const DEFAULT_BCRYPT_COST: u32 = 14;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    jwt_secret: SecretString,
    token_ttl_seconds: i64,
    session_ttl_seconds: i64,
    revocation_sweep_seconds: u64,
    bcrypt_cost: u32,
}

impl AuthConfig {
    #[must_use]
    pub fn new(jwt_secret: SecretString) -> Self {
        Self {
            jwt_secret,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            revocation_sweep_seconds: DEFAULT_REVOCATION_SWEEP_SECONDS,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_revocation_sweep_seconds(mut self, seconds: u64) -> Self {
        self.revocation_sweep_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn revocation_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.revocation_sweep_seconds.max(1))
    }

    #[must_use]
    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }
}

/// Everything the auth handlers and the access gate share for the lifetime of the server.
#[derive(Debug)]
pub struct AuthState {
    config: AuthConfig,
    issuer: TokenIssuer,
    revocations: Arc<RevocationRegistry>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, revocations: Arc<RevocationRegistry>) -> Self {
        let issuer = TokenIssuer::new(config.jwt_secret(), config.token_ttl_seconds());
        Self {
            config,
            issuer,
            revocations,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    #[must_use]
    pub fn revocations(&self) -> &RevocationRegistry {
        &self.revocations
    }

    /// Start the periodic revocation sweep; the caller aborts the handle at shutdown.
    #[must_use]
    pub fn spawn_revocation_sweeper(&self) -> JoinHandle<()> {
        self.revocations
            .clone()
            .spawn_sweeper(self.config.revocation_sweep_interval())
    }
}
