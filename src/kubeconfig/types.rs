// src/kubeconfig/types.rs
//
// Only names, references and the presence of credential sources are read.
// Secret material in `users` is skipped by serde and never held here.
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
pub struct KubeConfig {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub clusters: Vec<NamedCluster>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub users: Vec<NamedUser>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context", default)]
    pub current_context: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterConfig,
}

#[derive(Debug, Deserialize)]
pub struct ClusterConfig {
    #[serde(default)]
    pub server: String,
    #[serde(rename = "certificate-authority", default)]
    pub certificate_authority: Option<String>,
    #[serde(rename = "proxy-url", default)]
    pub proxy_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NamedUser {
    pub name: String,
    #[serde(default)]
    pub user: Option<UserConfig>,
}

/// Marks which credential sources a user entry relies on, without reading them.
#[derive(Debug, Default, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub exec: Option<IgnoredAny>,
    #[serde(rename = "auth-provider", default)]
    pub auth_provider: Option<IgnoredAny>,
    #[serde(rename = "client-certificate", default)]
    pub client_certificate: Option<IgnoredAny>,
    #[serde(rename = "client-key", default)]
    pub client_key: Option<IgnoredAny>,
    #[serde(rename = "tokenFile", default)]
    pub token_file: Option<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextConfig,
}

#[derive(Debug, Deserialize)]
pub struct ContextConfig {
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
