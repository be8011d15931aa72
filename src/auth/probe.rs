// src/auth/probe.rs
use std::future::Future;
use std::pin::Pin;

use k8s_openapi::api::authorization::v1::{
    ResourceAttributes, SelfSubjectAccessReview, SelfSubjectAccessReviewSpec,
};
use kube::api::{Api, PostParams};
use tracing::debug;

use crate::error::AuthError;
use crate::kubeconfig::{scoped_client, ActiveContext, ClientTimeouts};

pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = Result<(), AuthError>> + Send + 'a>>;

/// Live check that a credential grants access to a namespace.
///
/// Only ever called after the document's server has passed host validation.
pub trait AccessProbe: Send + Sync {
    fn check_access<'a>(
        &'a self,
        document: &'a str,
        active: &'a ActiveContext,
        namespace: &'a str,
    ) -> ProbeFuture<'a>;
}

/// Resource access the probe asks the API server about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub verb: String,
    pub resource: String,
    pub group: String,
    pub timeouts: ClientTimeouts,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            verb: "get".to_string(),
            resource: "pods".to_string(),
            group: String::new(),
            timeouts: ClientTimeouts::default(),
        }
    }
}

/// Submits a `SelfSubjectAccessReview` using the presented credentials.
#[derive(Debug, Clone, Default)]
pub struct KubeAccessProbe {
    settings: ProbeSettings,
}

impl KubeAccessProbe {
    pub fn new(settings: ProbeSettings) -> Self {
        Self { settings }
    }

    fn review_for(&self, namespace: &str) -> SelfSubjectAccessReview {
        SelfSubjectAccessReview {
            spec: SelfSubjectAccessReviewSpec {
                resource_attributes: Some(ResourceAttributes {
                    namespace: Some(namespace.to_string()),
                    verb: Some(self.settings.verb.clone()),
                    resource: Some(self.settings.resource.clone()),
                    group: Some(self.settings.group.clone()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn review(
        &self,
        document: &str,
        active: &ActiveContext,
        namespace: &str,
    ) -> Result<(), AuthError> {
        let client = scoped_client(document, active, self.settings.timeouts).await?;
        let reviews: Api<SelfSubjectAccessReview> = Api::all(client);

        debug!(
            namespace = %namespace,
            verb = %self.settings.verb,
            resource = %self.settings.resource,
            "submitting self subject access review"
        );
        let response = reviews
            .create(&PostParams::default(), &self.review_for(namespace))
            .await
            .map_err(|e| AuthError::not_authorized(format!("access review failed: {}", e)))?;

        match response.status {
            Some(status) if status.allowed => Ok(()),
            Some(status) => Err(AuthError::not_authorized(status.reason.unwrap_or_else(|| {
                format!(
                    "{} {} is not allowed in namespace {}",
                    self.settings.verb, self.settings.resource, namespace
                )
            }))),
            None => Err(AuthError::not_authorized("access review returned no status")),
        }
    }
}

impl AccessProbe for KubeAccessProbe {
    fn check_access<'a>(
        &'a self,
        document: &'a str,
        active: &'a ActiveContext,
        namespace: &'a str,
    ) -> ProbeFuture<'a> {
        Box::pin(self.review(document, active, namespace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticationGateway, ClusterEndpointResolver, HostAllowlist};
    use crate::error::ErrorKind;
    use crate::kubeconfig::fixtures;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const REVIEWS_PATH: &str = "/apis/authorization.k8s.io/v1/selfsubjectaccessreviews";

    /// Fake API server answering every access review with `reply`.
    /// Returns its base URL and the review bodies it received.
    async fn fake_api_server(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<Value>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let recorder = received.clone();
        let app = Router::new().route(
            REVIEWS_PATH,
            post(move |Json(review): Json<Value>| {
                recorder.lock().unwrap().push(review);
                let reply = reply.clone();
                async move { (status, Json(reply)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), received)
    }

    fn review_reply(status: Option<Value>) -> Value {
        let mut reply = json!({
            "apiVersion": "authorization.k8s.io/v1",
            "kind": "SelfSubjectAccessReview",
            "metadata": {},
            "spec": {},
        });
        if let Some(status) = status {
            reply["status"] = status;
        }
        reply
    }

    async fn authenticate_against(server: &str) -> Result<crate::auth::Accepted, AuthError> {
        let gateway = AuthenticationGateway::new(
            HostAllowlist::with_hosts([server]),
            ClusterEndpointResolver::new(HashMap::<String, String>::new()),
            ProbeSettings::default(),
            Duration::from_secs(5),
        );
        let doc = fixtures::kubeconfig("ctx", "c", server, "u");
        gateway.authenticate("ns-alice", &doc).await
    }

    #[tokio::test]
    async fn allowed_review_accepts_credential() {
        let (server, received) =
            fake_api_server(StatusCode::CREATED, review_reply(Some(json!({"allowed": true})))).await;

        let accepted = authenticate_against(&server).await.unwrap();
        assert_eq!(accepted.host, server);
        assert_eq!(accepted.user, "u");
        assert_eq!(accepted.namespace, "ns-alice");

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        let attrs = &received[0]["spec"]["resourceAttributes"];
        assert_eq!(attrs["namespace"], "ns-alice");
        assert_eq!(attrs["verb"], "get");
        assert_eq!(attrs["resource"], "pods");
    }

    #[tokio::test]
    async fn denied_review_is_not_authorized() {
        let (server, _) = fake_api_server(
            StatusCode::CREATED,
            review_reply(Some(json!({"allowed": false, "reason": "denied by rbac"}))),
        )
        .await;

        let err = authenticate_against(&server).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
        assert!(err.to_string().contains("denied by rbac"));
    }

    #[tokio::test]
    async fn denied_review_without_reason_names_the_access() {
        let (server, _) =
            fake_api_server(StatusCode::CREATED, review_reply(Some(json!({"allowed": false})))).await;

        let err = authenticate_against(&server).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
        assert!(err.to_string().contains("get pods is not allowed in namespace ns-alice"));
    }

    #[tokio::test]
    async fn review_without_status_is_not_authorized() {
        let (server, _) = fake_api_server(StatusCode::CREATED, review_reply(None)).await;

        let err = authenticate_against(&server).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
        assert!(err.to_string().contains("no status"));
    }

    #[tokio::test]
    async fn upstream_rejection_is_not_authorized() {
        let (server, _) = fake_api_server(
            StatusCode::UNAUTHORIZED,
            json!({
                "kind": "Status",
                "apiVersion": "v1",
                "metadata": {},
                "status": "Failure",
                "message": "Unauthorized",
                "reason": "Unauthorized",
                "code": 401,
            }),
        )
        .await;

        let err = authenticate_against(&server).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
    }

    #[tokio::test]
    async fn unreachable_server_is_not_authorized() {
        let err = authenticate_against("http://127.0.0.1:1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
    }

    #[test]
    fn review_targets_namespace_with_configured_attributes() {
        let probe = KubeAccessProbe::new(ProbeSettings {
            verb: "list".to_string(),
            resource: "deployments".to_string(),
            group: "apps".to_string(),
            ..Default::default()
        });
        let review = probe.review_for("ns-alice");
        let attrs = review.spec.resource_attributes.unwrap();
        assert_eq!(attrs.namespace.as_deref(), Some("ns-alice"));
        assert_eq!(attrs.verb.as_deref(), Some("list"));
        assert_eq!(attrs.resource.as_deref(), Some("deployments"));
        assert_eq!(attrs.group.as_deref(), Some("apps"));
        assert!(review.spec.non_resource_attributes.is_none());
    }

    #[test]
    fn defaults_probe_pod_reads() {
        let settings = ProbeSettings::default();
        assert_eq!(settings.verb, "get");
        assert_eq!(settings.resource, "pods");
        assert_eq!(settings.group, "");
    }
}
