use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_TOKEN_TTL_SECONDS: &str = "token-ttl-seconds";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_REVOCATION_SWEEP_SECONDS: &str = "revocation-sweep-seconds";
pub const ARG_BCRYPT_COST: &str = "bcrypt-cost";
pub const ARG_CORS_ORIGINS: &str = "cors-origins";

/// Parsed auth options.
#[derive(Debug)]
pub struct Options {
    pub jwt_secret: SecretString,
    pub token_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
    pub revocation_sweep_seconds: u64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
}

impl Options {
    /// Extract auth options from matches.
    ///
    /// # Errors
    /// Returns an error if the secret is missing or a TTL is not positive.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let jwt_secret = matches
            .get_one::<String>(ARG_JWT_SECRET)
            .map(|secret| secret.trim().to_string())
            .filter(|secret| !secret.is_empty())
            .context("missing required argument: --jwt-secret")?;

        let token_ttl_seconds = positive(matches, ARG_TOKEN_TTL_SECONDS)?;
        let session_ttl_seconds = positive(matches, ARG_SESSION_TTL_SECONDS)?;

        let revocation_sweep_seconds = matches
            .get_one::<u64>(ARG_REVOCATION_SWEEP_SECONDS)
            .copied()
            .unwrap_or(3600)
            .max(1);

        let bcrypt_cost = matches
            .get_one::<u32>(ARG_BCRYPT_COST)
            .copied()
            .unwrap_or(bcrypt::DEFAULT_COST);

        let cors_origins = matches
            .get_one::<String>(ARG_CORS_ORIGINS)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            jwt_secret: SecretString::from(jwt_secret),
            token_ttl_seconds,
            session_ttl_seconds,
            revocation_sweep_seconds,
            bcrypt_cost,
            cors_origins,
        })
    }
}

fn positive(matches: &ArgMatches, name: &str) -> Result<i64> {
    let value = matches.get_one::<i64>(name).copied().unwrap_or(7200);
    if value <= 0 {
        return Err(anyhow!("--{name} must be greater than zero"));
    }
    Ok(value)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Secret used to sign bearer tokens (HS256)")
                .env("ESCOLAR_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_SECONDS)
                .long(ARG_TOKEN_TTL_SECONDS)
                .help("Lifetime embedded in issued tokens, in seconds")
                .env("ESCOLAR_TOKEN_TTL_SECONDS")
                .default_value("7200")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Lifetime of a login session row, in seconds")
                .env("ESCOLAR_SESSION_TTL_SECONDS")
                .default_value("7200")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_REVOCATION_SWEEP_SECONDS)
                .long(ARG_REVOCATION_SWEEP_SECONDS)
                .help("Interval between sweeps of expired revoked tokens, in seconds")
                .env("ESCOLAR_REVOCATION_SWEEP_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_BCRYPT_COST)
                .long(ARG_BCRYPT_COST)
                .help("bcrypt work factor used for new password hashes")
                .env("ESCOLAR_BCRYPT_COST")
                .default_value("14")
                .value_parser(clap::value_parser!(u32).range(4..=31)),
        )
        .arg(
            Arg::new(ARG_CORS_ORIGINS)
                .long(ARG_CORS_ORIGINS)
                .help("Comma separated list of allowed CORS origins")
                .env("ESCOLAR_CORS_ORIGINS")
                .default_value("http://localhost:8081,http://localhost:3000"),
        )
}
