// src/kubeconfig/mod.rs
mod client;
mod parser;
mod types;

pub use client::{scoped_client, ClientTimeouts};
pub use parser::{
    extract_host, extract_user_identity, parse, resolve_active_context, ActiveContext,
    CredentialSources,
};
pub use types::KubeConfig;

#[cfg(test)]
pub(crate) mod fixtures {
    /// Single-context kubeconfig with inline token credentials.
    pub fn kubeconfig(context: &str, cluster: &str, server: &str, user: &str) -> String {
        format!(
            r#"apiVersion: v1
kind: Config
preferences: {{}}
clusters:
- name: {cluster}
  cluster:
    server: {server}
contexts:
- name: {context}
  context:
    cluster: {cluster}
    user: {user}
current-context: {context}
users:
- name: {user}
  user:
    token: fake-token
"#
        )
    }
}
