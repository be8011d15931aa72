// src/auth/allowlist.rs
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

/// Hosts trusted in addition to the in-cluster API server.
///
/// Clones share the same set. Entries are compared by exact string equality
/// and are never removed.
#[derive(Debug, Clone, Default)]
pub struct HostAllowlist {
    hosts: Arc<RwLock<HashSet<String>>>,
}

impl HostAllowlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hosts<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowlist = Self::new();
        for host in hosts {
            allowlist.add(host);
        }
        allowlist
    }

    /// Returns true when the host was not already present.
    pub fn add(&self, host: impl Into<String>) -> bool {
        let host = host.into();
        // A panic elsewhere cannot leave a HashSet half-inserted, so a poisoned
        // lock still guards a consistent set.
        let inserted = self
            .hosts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(host.clone());
        if inserted {
            info!(host = %host, "added host to allowlist");
        }
        inserted
    }

    pub fn contains(&self, host: &str) -> bool {
        self.hosts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(host)
    }

    /// Sorted snapshot of the current entries.
    pub fn hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = self
            .hosts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        hosts.sort();
        hosts
    }

    pub fn len(&self) -> usize {
        self.hosts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
