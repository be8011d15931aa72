// src/auth/host.rs
use tracing::{debug, warn};

use super::{ClusterEndpointResolver, HostAllowlist};
use crate::error::AuthError;

/// Closed trust policy for API server hosts: allowlisted, or exactly the
/// in-cluster API server. Anything else is refused.
#[derive(Debug, Clone, Default)]
pub struct HostValidator {
    allowlist: HostAllowlist,
    resolver: ClusterEndpointResolver,
}

impl HostValidator {
    pub fn new(allowlist: HostAllowlist, resolver: ClusterEndpointResolver) -> Self {
        Self { allowlist, resolver }
    }

    pub fn allowlist(&self) -> &HostAllowlist {
        &self.allowlist
    }

    pub fn resolver(&self) -> &ClusterEndpointResolver {
        &self.resolver
    }

    pub fn check_k8s_host(&self, host: &str) -> Result<(), AuthError> {
        if self.allowlist.contains(host) {
            debug!(host = %host, "host is allowlisted");
            return Ok(());
        }

        let canonical = self.resolver.canonical_host();
        if canonical.is_empty() {
            warn!(host = %host, "rejecting host: not allowlisted and no in-cluster API server configured");
            return Err(AuthError::untrusted(format!(
                "{} is not allowlisted and no in-cluster API server is configured",
                host
            )));
        }

        if host == canonical {
            debug!(host = %host, "host matches in-cluster API server");
            return Ok(());
        }

        warn!(host = %host, "rejecting host: does not match in-cluster API server");
        Err(AuthError::untrusted(format!(
            "{} is neither allowlisted nor the in-cluster API server",
            host
        )))
    }
}
