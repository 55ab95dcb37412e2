//! Command-line argument dispatch.
//!
//! Maps validated CLI arguments to the action to run, currently only the API
//! server with its full configuration.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, ARG_DSN, ARG_PORT};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        jwt_secret: auth_opts.jwt_secret,
        token_ttl_seconds: auth_opts.token_ttl_seconds,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        revocation_sweep_seconds: auth_opts.revocation_sweep_seconds,
        bcrypt_cost: auth_opts.bcrypt_cost,
        cors_origins: auth_opts.cors_origins,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const DSN: &str = "postgres://user@localhost:5432/escolar";

    #[test]
    fn server_action_carries_auth_options() {
        temp_env::with_vars(
            [
                ("ESCOLAR_DSN", Some(DSN)),
                ("ESCOLAR_JWT_SECRET", Some("top-secret")),
                ("ESCOLAR_TOKEN_TTL_SECONDS", Some("3600")),
                ("ESCOLAR_SESSION_TTL_SECONDS", None::<&str>),
                ("ESCOLAR_CORS_ORIGINS", Some("https://a.test, https://b.test,")),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["escolar"]);
                let result = handler(&matches);
                assert!(result.is_ok());
                if let Ok(Action::Server(args)) = result {
                    assert_eq!(args.dsn, DSN);
                    assert_eq!(args.jwt_secret.expose_secret(), "top-secret");
                    assert_eq!(args.token_ttl_seconds, 3600);
                    assert_eq!(args.session_ttl_seconds, 7200);
                    assert_eq!(
                        args.cors_origins,
                        vec!["https://a.test".to_string(), "https://b.test".to_string()]
                    );
                }
            },
        );
    }

    #[test]
    fn blank_jwt_secret_is_rejected() {
        temp_env::with_vars(
            [("ESCOLAR_DSN", Some(DSN)), ("ESCOLAR_JWT_SECRET", Some("   "))],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["escolar"]);
                let result = handler(&matches);
                assert!(result.is_err());
                if let Err(err) = result {
                    assert!(err
                        .to_string()
                        .contains("missing required argument: --jwt-secret"));
                }
            },
        );
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        temp_env::with_vars(
            [
                ("ESCOLAR_DSN", Some(DSN)),
                ("ESCOLAR_JWT_SECRET", Some("secret")),
                ("ESCOLAR_SESSION_TTL_SECONDS", Some("0")),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["escolar"]);
                assert!(handler(&matches).is_err());
            },
        );
    }
}
