//! Gateway that decides whether a tenant-supplied kubeconfig may act for a
//! namespace of this cluster.
//!
//! A kubeconfig is accepted only when its active cluster points at the
//! in-cluster API server (or an allowlisted host) and its own credentials
//! can read the requested namespace.
pub mod auth;
pub mod config;
pub mod error;
pub mod kubeconfig;
pub mod utils;
pub mod web;

pub use auth::{
    canonical_host_from_environment, Accepted, AuthenticationGateway, ClusterEndpointResolver,
    HostAllowlist, HostValidator,
};
pub use error::{AuthError, ConfigError, ErrorKind};
pub use kubeconfig::{extract_host, extract_user_identity};
