//! In-memory set of logged-out tokens, keyed by the raw token and holding its expiry.
//!
//! Writers (`revoke`, `sweep`) take the exclusive lock, `is_revoked` the shared one.
//! The session ledger carries the durable revocation, so this set only needs to
//! live as long as the process.

use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::RwLock, task::JoinHandle};
use tracing::debug;

use super::token::decode_expiry_unverified;

#[derive(Debug, Default)]
pub struct RevocationRegistry {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl RevocationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `token` until its embedded expiry.
    ///
    /// Tokens whose expiry cannot be decoded are skipped and `false` is returned;
    /// the session ledger still rejects them.
    pub async fn revoke(&self, token: &str) -> bool {
        let Some(expires_at) = decode_expiry_unverified(token) else {
            debug!("Skipping revocation of an undecodable token");
            return false;
        };
        self.revoke_until(token, expires_at).await;
        true
    }

    pub async fn revoke_until(&self, token: &str, expires_at: DateTime<Utc>) {
        self.entries
            .write()
            .await
            .insert(token.to_string(), expires_at);
    }

    pub async fn is_revoked(&self, token: &str) -> bool {
        self.entries.read().await.contains_key(token)
    }

    /// Drop every entry whose expiry is before `now`; returns how many were removed.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at >= now);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Sweep on a fixed interval until the returned handle is aborted.
    #[must_use]
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = self.sweep(Utc::now()).await;
                if removed > 0 {
                    debug!(removed, "Swept expired revocation entries");
                }
            }
        })
    }
}
