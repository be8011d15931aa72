// src/kubeconfig/client.rs
//
// Builds a transient API client from a tenant-supplied kubeconfig. Callers
// must have validated the active context's server before calling in here.
use std::time::Duration;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;
use url::Url;

use super::ActiveContext;
use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            read: Duration::from_secs(10),
        }
    }
}

/// Client that speaks only with the document's own credentials, pinned to the
/// context that was validated.
pub async fn scoped_client(
    document: &str,
    active: &ActiveContext,
    timeouts: ClientTimeouts,
) -> Result<Client, AuthError> {
    if !active.credential_sources.is_inline_only() {
        return Err(AuthError::malformed(format!(
            "user {} relies on {}, only inline credentials are accepted",
            active.user,
            active.credential_sources.describe()
        )));
    }

    let kubeconfig = Kubeconfig::from_yaml(document)
        .map_err(|e| AuthError::client(format!("failed to load kubeconfig: {}", e)))?;
    let options = KubeConfigOptions {
        context: Some(active.context.clone()),
        cluster: None,
        user: None,
    };
    let mut config = Config::from_custom_kubeconfig(kubeconfig, &options)
        .await
        .map_err(|e| AuthError::client(format!("failed to build client config: {}", e)))?;

    let resolved = (
        config.cluster_url.host().map(str::to_string),
        config.cluster_url.port_u16().or_else(|| default_port(config.cluster_url.scheme_str())),
    );
    if !same_endpoint(&active.server, &resolved) {
        return Err(AuthError::client(format!(
            "client resolved {} instead of validated server {}",
            config.cluster_url, active.server
        )));
    }

    config.proxy_url = None;
    config.connect_timeout = Some(timeouts.connect);
    config.read_timeout = Some(timeouts.read);
    debug!(context = %active.context, server = %active.server, "building scoped client");

    Client::try_from(config)
        .map_err(|e| AuthError::client(format!("failed to create client: {}", e)))
}

fn default_port(scheme: Option<&str>) -> Option<u16> {
    match scheme {
        Some("https") => Some(443),
        Some("http") => Some(80),
        _ => None,
    }
}

fn same_endpoint(server: &str, resolved: &(Option<String>, Option<u16>)) -> bool {
    let Ok(expected) = Url::parse(server) else {
        return false;
    };
    let host = expected.host_str().map(|h| h.trim_start_matches('[').trim_end_matches(']'));
    let resolved_host = resolved.0.as_deref().map(|h| h.trim_start_matches('[').trim_end_matches(']'));
    host.is_some() && host == resolved_host && expected.port_or_known_default() == resolved.1
}
