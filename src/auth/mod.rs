// src/auth/mod.rs
mod allowlist;
mod endpoint;
mod gateway;
mod host;
mod probe;

pub use allowlist::HostAllowlist;
pub use endpoint::{
    canonical_host_from_environment, ClusterEndpointResolver, Environment, ProcessEnv,
    SERVICE_HOST_ENV, SERVICE_PORT_ENV,
};
pub use gateway::{Accepted, AuthenticationGateway, DEFAULT_PROBE_TIMEOUT};
pub use host::HostValidator;
pub use probe::{AccessProbe, KubeAccessProbe, ProbeFuture, ProbeSettings};

#[cfg(test)]
pub(crate) use endpoint::service_env;
#[cfg(test)]
pub(crate) use gateway::tests as testing;
