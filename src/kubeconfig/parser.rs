// src/kubeconfig/parser.rs
use url::Url;

use super::types::{KubeConfig, NamedCluster, NamedContext, NamedUser};
use crate::error::AuthError;

/// The context selected by `current-context`, with its references resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveContext {
    pub context: String,
    pub cluster: String,
    pub server: String,
    pub user: String,
    pub namespace: Option<String>,
    pub credential_sources: CredentialSources,
}

/// Credential sources in the active cluster/user that would make the process
/// run commands, read local files or route through a third-party proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSources {
    pub exec_plugin: bool,
    pub auth_provider: bool,
    pub proxy_url: bool,
    pub local_files: Vec<&'static str>,
}

impl CredentialSources {
    pub fn is_inline_only(&self) -> bool {
        !self.exec_plugin && !self.auth_provider && !self.proxy_url && self.local_files.is_empty()
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.exec_plugin {
            parts.push("exec plugin".to_string());
        }
        if self.auth_provider {
            parts.push("auth-provider".to_string());
        }
        if self.proxy_url {
            parts.push("proxy-url".to_string());
        }
        parts.extend(self.local_files.iter().map(|f| format!("{} file reference", f)));
        parts.join(", ")
    }
}

pub fn parse(document: &str) -> Result<KubeConfig, AuthError> {
    serde_yaml::from_str(document)
        .map_err(|e| AuthError::malformed(format!("not a kubeconfig document: {}", e)))
}

pub fn resolve_active_context(document: &str) -> Result<ActiveContext, AuthError> {
    parse(document)?.active_context()
}

/// Server URL of the cluster referenced by the active context, exactly as written.
pub fn extract_host(document: &str) -> Result<String, AuthError> {
    resolve_active_context(document).map(|active| active.server)
}

/// Name of the user entry bound to the active context.
pub fn extract_user_identity(document: &str) -> Result<String, AuthError> {
    resolve_active_context(document).map(|active| active.user)
}

impl KubeConfig {
    pub fn active_context(&self) -> Result<ActiveContext, AuthError> {
        let current = self
            .current_context
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AuthError::malformed("current-context is not set"))?;

        let context = find_unique(&self.contexts, current, "context", |c: &NamedContext| &c.name)?;
        let cluster_ref = &context.context.cluster;
        let user_ref = &context.context.user;
        if cluster_ref.is_empty() {
            return Err(AuthError::malformed(format!("context {} has no cluster", current)));
        }
        if user_ref.is_empty() {
            return Err(AuthError::malformed(format!("context {} has no user", current)));
        }

        let cluster = find_unique(&self.clusters, cluster_ref, "cluster", |c: &NamedCluster| &c.name)?;
        let user = find_unique(&self.users, user_ref, "user", |u: &NamedUser| &u.name)?;

        let server = &cluster.cluster.server;
        validate_server(cluster_ref, server)?;

        let mut sources = CredentialSources {
            proxy_url: cluster.cluster.proxy_url.as_deref().is_some_and(|p| !p.is_empty()),
            ..Default::default()
        };
        if cluster.cluster.certificate_authority.is_some() {
            sources.local_files.push("certificate-authority");
        }
        if let Some(auth) = &user.user {
            sources.exec_plugin = auth.exec.is_some();
            sources.auth_provider = auth.auth_provider.is_some();
            if auth.client_certificate.is_some() {
                sources.local_files.push("client-certificate");
            }
            if auth.client_key.is_some() {
                sources.local_files.push("client-key");
            }
            if auth.token_file.is_some() {
                sources.local_files.push("tokenFile");
            }
        }

        Ok(ActiveContext {
            context: current.to_string(),
            cluster: cluster_ref.clone(),
            server: server.clone(),
            user: user_ref.clone(),
            namespace: context.context.namespace.clone().filter(|ns| !ns.is_empty()),
            credential_sources: sources,
        })
    }
}

fn find_unique<'a, T>(
    entries: &'a [T],
    name: &str,
    kind: &str,
    name_of: impl Fn(&T) -> &String,
) -> Result<&'a T, AuthError> {
    let mut matches = entries.iter().filter(|entry| name_of(*entry) == name);
    let found = matches
        .next()
        .ok_or_else(|| AuthError::malformed(format!("{} {} not found", kind, name)))?;
    if matches.next().is_some() {
        return Err(AuthError::malformed(format!("{} {} is defined more than once", kind, name)));
    }
    Ok(found)
}

// Only checks shape. The string itself is returned untouched since `Url`
// normalizes (e.g. adds a trailing slash) and host checks are exact.
fn validate_server(cluster: &str, server: &str) -> Result<(), AuthError> {
    if server.is_empty() {
        return Err(AuthError::malformed(format!("cluster {} has no server", cluster)));
    }
    let url = Url::parse(server).map_err(|e| {
        AuthError::malformed(format!("cluster {} server is not a valid URL: {}", cluster, e))
    })?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(AuthError::malformed(format!(
            "cluster {} server has no host component",
            cluster
        ))),
    }
}
