// src/auth/endpoint.rs
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const SERVICE_HOST_ENV: &str = "KUBERNETES_SERVICE_HOST";
pub const SERVICE_PORT_ENV: &str = "KUBERNETES_SERVICE_PORT";

/// Source of ambient settings. Read on every lookup, never cached.
pub trait Environment: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Derives the platform's own API server URL from the environment.
#[derive(Clone)]
pub struct ClusterEndpointResolver {
    env: Arc<dyn Environment>,
}

impl ClusterEndpointResolver {
    pub fn new(env: impl Environment + 'static) -> Self {
        Self { env: Arc::new(env) }
    }

    pub fn from_process_env() -> Self {
        Self::new(ProcessEnv)
    }

    /// `https://{host}:{port}`, or empty when either setting is missing or empty.
    pub fn canonical_host(&self) -> String {
        let host = self.env.var(SERVICE_HOST_ENV).unwrap_or_default();
        let port = self.env.var(SERVICE_PORT_ENV).unwrap_or_default();
        if host.is_empty() || port.is_empty() {
            return String::new();
        }
        format!("https://{}:{}", host, port)
    }
}

impl Default for ClusterEndpointResolver {
    fn default() -> Self {
        Self::from_process_env()
    }
}

impl fmt::Debug for ClusterEndpointResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterEndpointResolver")
            .field("canonical_host", &self.canonical_host())
            .finish()
    }
}

pub fn canonical_host_from_environment() -> String {
    ClusterEndpointResolver::from_process_env().canonical_host()
}

#[cfg(test)]
pub(crate) fn service_env(host: &str, port: &str) -> HashMap<String, String> {
    HashMap::from([
        (SERVICE_HOST_ENV.to_string(), host.to_string()),
        (SERVICE_PORT_ENV.to_string(), port.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::RwLock;

    #[test]
    fn builds_https_url_from_host_and_port() {
        let resolver = ClusterEndpointResolver::new(service_env("kubernetes.default.svc", "6443"));
        assert_eq!(resolver.canonical_host(), "https://kubernetes.default.svc:6443");
    }

    #[test]
    fn empty_when_either_setting_is_missing() {
        let cases = [
            service_env("", ""),
            service_env("kubernetes.default.svc", ""),
            service_env("", "6443"),
            HashMap::new(),
            HashMap::from([(SERVICE_HOST_ENV.to_string(), "10.0.0.1".to_string())]),
        ];
        for env in cases {
            assert_eq!(ClusterEndpointResolver::new(env).canonical_host(), "");
        }
    }

    struct MutableEnv(RwLock<HashMap<String, String>>);

    impl Environment for Arc<MutableEnv> {
        fn var(&self, key: &str) -> Option<String> {
            self.0.read().unwrap().get(key).cloned()
        }
    }

    #[test]
    fn environment_changes_are_seen_without_restart() {
        let env = Arc::new(MutableEnv(RwLock::new(HashMap::new())));
        let resolver = ClusterEndpointResolver::new(env.clone());
        assert_eq!(resolver.canonical_host(), "");

        *env.0.write().unwrap() = service_env("10.96.0.1", "443");
        assert_eq!(resolver.canonical_host(), "https://10.96.0.1:443");

        env.0.write().unwrap().remove(SERVICE_PORT_ENV);
        assert_eq!(resolver.canonical_host(), "");
    }

    // The only test that touches the real process environment, and it only reads.
    #[test]
    fn process_env_resolver_matches_free_function() {
        assert_eq!(
            ClusterEndpointResolver::from_process_env().canonical_host(),
            canonical_host_from_environment()
        );
    }
}
