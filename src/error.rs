// src/error.rs
use serde::Serialize;
use std::io;
use thiserror::Error;
use utoipa::ToSchema;

/// Coarse category of an authentication failure, used for HTTP status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum ErrorKind {
    EmptyNamespace,
    MalformedCredential,
    UntrustedHost,
    NotAuthorized,
    ClientError,
}

/// Reasons an `authenticate` call is denied. Every variant is terminal for the call.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("namespace must not be empty")]
    EmptyNamespace,

    #[error("malformed kubeconfig: {0}")]
    MalformedCredential(String),

    #[error("untrusted kubernetes host: {0}")]
    UntrustedHost(String),

    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("kubernetes client error: {0}")]
    ClientError(String),
}

impl AuthError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedCredential(msg.into())
    }

    pub fn untrusted(msg: impl Into<String>) -> Self {
        Self::UntrustedHost(msg.into())
    }

    pub fn not_authorized(msg: impl Into<String>) -> Self {
        Self::NotAuthorized(msg.into())
    }

    pub fn client(msg: impl Into<String>) -> Self {
        Self::ClientError(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyNamespace => ErrorKind::EmptyNamespace,
            Self::MalformedCredential(_) => ErrorKind::MalformedCredential,
            Self::UntrustedHost(_) => ErrorKind::UntrustedHost,
            Self::NotAuthorized(_) => ErrorKind::NotAuthorized,
            Self::ClientError(_) => ErrorKind::ClientError,
        }
    }
}

impl From<AuthError> for io::Error {
    fn from(error: AuthError) -> Self {
        let kind = match error.kind() {
            ErrorKind::EmptyNamespace | ErrorKind::MalformedCredential => io::ErrorKind::InvalidInput,
            ErrorKind::UntrustedHost | ErrorKind::NotAuthorized => io::ErrorKind::PermissionDenied,
            ErrorKind::ClientError => io::ErrorKind::Other,
        };
        io::Error::new(kind, error.to_string())
    }
}

/// Failures loading or validating the gateway configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for io::Error {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Io { source, path } => {
                io::Error::new(source.kind(), format!("Config file {}: {}", path, source))
            }
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(AuthError::EmptyNamespace.kind(), ErrorKind::EmptyNamespace);
        assert_eq!(AuthError::malformed("x").kind(), ErrorKind::MalformedCredential);
        assert_eq!(AuthError::untrusted("x").kind(), ErrorKind::UntrustedHost);
        assert_eq!(AuthError::not_authorized("x").kind(), ErrorKind::NotAuthorized);
        assert_eq!(AuthError::client("x").kind(), ErrorKind::ClientError);
    }

    #[test]
    fn denials_become_permission_denied_io_errors() {
        let err: io::Error = AuthError::untrusted("https://evil.example:6443").into();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(err.to_string().contains("evil.example"));

        let err: io::Error = AuthError::EmptyNamespace.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn config_io_error_keeps_its_kind() {
        let err: io::Error = ConfigError::Io {
            path: "missing.json".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        }
        .into();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("missing.json"));
    }
}
