//! Identities, sessions and the access gate.
//!
//! Flow Overview:
//! 1) `register` validates input, stores a bcrypt-hashed identity and signs the caller in.
//! 2) `login` verifies the password, mints a signed token and opens a session row.
//! 3) Every `/api/protected/*` request passes `gate::require_session`, which checks the
//!    revocation registry, then the session ledger, then the signature.
//! 4) `logout` revokes the token in memory and stamps the session row, so the
//!    revocation holds on every instance sharing the database.

pub mod credentials;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod login;
pub mod register;
pub mod revocation;
pub mod session;
pub mod state;
pub mod token;
pub mod types;

pub use revocation::RevocationRegistry;
pub use state::{AuthConfig, AuthState};

#[cfg(test)]
mod tests;
