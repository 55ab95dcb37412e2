//! # Escolar (School Records Administration API)
//!
//! `escolar` is the backend used to administer a school's records. This crate
//! holds its authentication core and the role/permission catalog that the
//! rest of the administration surface authorizes against.
//!
//! ## Authentication
//!
//! Passwords are stored as bcrypt hashes. A successful login mints an HS256
//! signed bearer token and opens a row in the session ledger. The ledger, not
//! the signature, decides whether a token is honored: every protected request
//! goes through the access gate, which checks, in order, the in-memory
//! revocation registry, the session row (presence, revocation stamp, expiry)
//! and finally the token signature.
//!
//! ## Authorization
//!
//! Roles hold permissions through the `role_permissions` relation. Permissions
//! belong to exactly one category and are displayed grouped by it. Bulk
//! assignment runs in a single transaction: unassign first, then assign, and
//! any unknown permission in the assign set rolls the whole request back.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
