// src/auth/gateway.rs
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use super::{AccessProbe, ClusterEndpointResolver, HostAllowlist, HostValidator, KubeAccessProbe, ProbeSettings};
use crate::error::AuthError;
use crate::kubeconfig::resolve_active_context;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// A credential that proved live access to `namespace`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Accepted {
    #[schema(example = "ns-alice")]
    pub namespace: String,
    #[schema(example = "https://kubernetes.default.svc:6443")]
    pub host: String,
    /// Name of the kubeconfig user entry, never its credentials.
    #[schema(example = "ns-alice")]
    pub user: String,
}

/// Decides whether a tenant kubeconfig may act for a namespace.
///
/// Each call parses the document, validates its server against the
/// allowlist and the in-cluster API server, then asks the API server,
/// with the document's own credentials, whether the namespace is
/// accessible. Nothing is cached between calls.
#[derive(Clone)]
pub struct AuthenticationGateway {
    validator: HostValidator,
    probe: Arc<dyn AccessProbe>,
    probe_timeout: Duration,
}

impl AuthenticationGateway {
    pub fn new(
        allowlist: HostAllowlist,
        resolver: ClusterEndpointResolver,
        settings: ProbeSettings,
        probe_timeout: Duration,
    ) -> Self {
        Self::with_probe(
            HostValidator::new(allowlist, resolver),
            KubeAccessProbe::new(settings),
            probe_timeout,
        )
    }

    pub fn with_probe(
        validator: HostValidator,
        probe: impl AccessProbe + 'static,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            validator,
            probe: Arc::new(probe),
            probe_timeout,
        }
    }

    pub fn validator(&self) -> &HostValidator {
        &self.validator
    }

    pub fn allowlist(&self) -> &HostAllowlist {
        self.validator.allowlist()
    }

    pub fn add_allowlist_host(&self, host: impl Into<String>) -> bool {
        self.validator.allowlist().add(host)
    }

    pub fn is_allowlisted(&self, host: &str) -> bool {
        self.validator.allowlist().contains(host)
    }

    pub fn canonical_host(&self) -> String {
        self.validator.resolver().canonical_host()
    }

    #[instrument(skip_all, fields(namespace = %namespace))]
    pub async fn authenticate(&self, namespace: &str, document: &str) -> Result<Accepted, AuthError> {
        if namespace.is_empty() {
            warn!("rejecting request without namespace");
            return Err(AuthError::EmptyNamespace);
        }

        let active = resolve_active_context(document).map_err(|e| {
            warn!(error = %e, "rejecting unparsable kubeconfig");
            e
        })?;

        // Gates every outbound connection below.
        self.validator.check_k8s_host(&active.server)?;

        match tokio::time::timeout(
            self.probe_timeout,
            self.probe.check_access(document, &active, namespace),
        )
        .await
        {
            Ok(Ok(())) => {
                info!(host = %active.server, user = %active.user, "kubeconfig accepted");
                Ok(Accepted {
                    namespace: namespace.to_string(),
                    host: active.server,
                    user: active.user,
                })
            }
            Ok(Err(e)) => {
                warn!(host = %active.server, user = %active.user, error = %e, "kubeconfig denied");
                Err(e)
            }
            Err(_) => {
                warn!(host = %active.server, user = %active.user, "namespace access check timed out");
                Err(AuthError::not_authorized(format!(
                    "namespace access check timed out after {}s",
                    self.probe_timeout.as_secs_f64()
                )))
            }
        }
    }
}

impl fmt::Debug for AuthenticationGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationGateway")
            .field("validator", &self.validator)
            .field("probe_timeout", &self.probe_timeout)
            .finish_non_exhaustive()
    }
}
