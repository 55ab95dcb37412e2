use crate::api::{self, handlers::auth::AuthConfig};
use anyhow::Result;
use secrecy::SecretString;
use tracing::warn;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub jwt_secret: SecretString,
    pub token_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
    pub revocation_sweep_seconds: u64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the auth configuration is invalid, the database is unreachable or the
/// server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    if args.token_ttl_seconds != args.session_ttl_seconds {
        warn!(
            token_ttl_seconds = args.token_ttl_seconds,
            session_ttl_seconds = args.session_ttl_seconds,
            "token and session lifetimes differ; the session lifetime is the one enforced"
        );
    }

    let auth_config = AuthConfig::new(args.jwt_secret)
        .with_token_ttl_seconds(args.token_ttl_seconds)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_revocation_sweep_seconds(args.revocation_sweep_seconds)
        .with_bcrypt_cost(args.bcrypt_cost);

    api::new(args.port, args.dsn, auth_config, args.cors_origins).await
}
