use axum::{
    debug_handler,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{io, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{Accepted, AuthenticationGateway},
    error::{AuthError, ErrorKind},
    kubeconfig,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        authenticate_handler,
        inspect_handler,
        list_allowlist_handler,
        add_allowlist_handler,
        canonical_host_handler
    ),
    components(schemas(
        AuthenticateRequest,
        AuthenticateResponse,
        Accepted,
        InspectRequest,
        InspectResponse,
        KubeconfigSummary,
        AllowlistRequest,
        AllowlistResponse,
        CanonicalHostResponse,
        ErrorResponse,
        ErrorKind
    ))
)]
struct ApiDoc;

#[derive(Deserialize, ToSchema)]
pub struct AuthenticateRequest {
    #[schema(example = "ns-alice")]
    pub namespace: String,
    /// Kubeconfig document, YAML or JSON.
    pub kubeconfig: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthenticateResponse {
    data: Accepted,
}

#[derive(Deserialize, ToSchema)]
pub struct InspectRequest {
    pub kubeconfig: String,
}

#[derive(Serialize, ToSchema)]
pub struct KubeconfigSummary {
    #[schema(example = "https://kubernetes.default.svc:6443")]
    host: String,
    #[schema(example = "ns-alice")]
    user: String,
    context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct InspectResponse {
    data: KubeconfigSummary,
}

#[derive(Deserialize, ToSchema)]
pub struct AllowlistRequest {
    #[schema(example = "internal-metrics")]
    pub host: String,
}

#[derive(Serialize, ToSchema)]
pub struct AllowlistResponse {
    data: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CanonicalHostResponse {
    /// Empty when the in-cluster API server settings are absent.
    data: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
}

pub struct WebServerState {
    pub gateway: AuthenticationGateway,
    pub port: u16,
    /// Whether POST /api/allowlist may extend trust at runtime.
    pub allow_runtime_additions: bool,
}

impl WebServerState {
    pub fn new(gateway: AuthenticationGateway, port: Option<u16>) -> Self {
        Self {
            gateway,
            port: port.unwrap_or(3000),
            allow_runtime_additions: false,
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], Json(body)).into_response()
}

fn auth_error_response(error: &AuthError) -> Response {
    let status = match error.kind() {
        ErrorKind::EmptyNamespace | ErrorKind::MalformedCredential => StatusCode::BAD_REQUEST,
        ErrorKind::UntrustedHost | ErrorKind::NotAuthorized => StatusCode::FORBIDDEN,
        ErrorKind::ClientError => StatusCode::BAD_GATEWAY,
    };
    json_response(
        status,
        ErrorResponse {
            error: error.to_string(),
            kind: Some(error.kind()),
        },
    )
}

// Handler for /api/authenticate
#[utoipa::path(
    post,
    path = "/api/authenticate",
    request_body = AuthenticateRequest,
    responses(
        (status = 200, description = "Kubeconfig has live access to the namespace", body = AuthenticateResponse),
        (status = 400, description = "Missing namespace or malformed kubeconfig", body = ErrorResponse),
        (status = 403, description = "Untrusted API server or no namespace access", body = ErrorResponse),
        (status = 502, description = "Could not build a client for the kubeconfig", body = ErrorResponse)
    )
)]
#[debug_handler]
async fn authenticate_handler(
    State(state): State<Arc<WebServerState>>,
    Json(request): Json<AuthenticateRequest>,
) -> Response {
    match state
        .gateway
        .authenticate(&request.namespace, &request.kubeconfig)
        .await
    {
        Ok(accepted) => json_response(StatusCode::OK, AuthenticateResponse { data: accepted }),
        Err(e) => auth_error_response(&e),
    }
}

// Handler for /api/kubeconfig/inspect
#[utoipa::path(
    post,
    path = "/api/kubeconfig/inspect",
    request_body = InspectRequest,
    responses(
        (status = 200, description = "Active context of the kubeconfig", body = InspectResponse),
        (status = 400, description = "Malformed kubeconfig", body = ErrorResponse)
    )
)]
async fn inspect_handler(Json(request): Json<InspectRequest>) -> Response {
    match kubeconfig::resolve_active_context(&request.kubeconfig) {
        Ok(active) => json_response(
            StatusCode::OK,
            InspectResponse {
                data: KubeconfigSummary {
                    host: active.server,
                    user: active.user,
                    context: active.context,
                    namespace: active.namespace,
                },
            },
        ),
        Err(e) => auth_error_response(&e),
    }
}

// Handler for GET /api/allowlist
#[utoipa::path(
    get,
    path = "/api/allowlist",
    responses(
        (status = 200, description = "Allowlisted hosts", body = AllowlistResponse)
    )
)]
async fn list_allowlist_handler(State(state): State<Arc<WebServerState>>) -> Response {
    json_response(
        StatusCode::OK,
        AllowlistResponse {
            data: state.gateway.allowlist().hosts(),
        },
    )
}

// Handler for POST /api/allowlist
#[utoipa::path(
    post,
    path = "/api/allowlist",
    request_body = AllowlistRequest,
    responses(
        (status = 201, description = "Host added", body = AllowlistResponse),
        (status = 200, description = "Host was already allowlisted", body = AllowlistResponse),
        (status = 400, description = "Empty host", body = ErrorResponse),
        (status = 403, description = "Runtime additions are disabled", body = ErrorResponse)
    )
)]
async fn add_allowlist_handler(
    State(state): State<Arc<WebServerState>>,
    Json(request): Json<AllowlistRequest>,
) -> Response {
    if !state.allow_runtime_additions {
        warn!(host = %request.host, "refusing runtime allowlist addition");
        return json_response(
            StatusCode::FORBIDDEN,
            ErrorResponse {
                error: "runtime allowlist additions are disabled".to_string(),
                kind: None,
            },
        );
    }
    if request.host.is_empty() {
        return json_response(
            StatusCode::BAD_REQUEST,
            ErrorResponse {
                error: "host must not be empty".to_string(),
                kind: None,
            },
        );
    }

    let status = if state.gateway.add_allowlist_host(request.host) {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    json_response(
        status,
        AllowlistResponse {
            data: state.gateway.allowlist().hosts(),
        },
    )
}

// Handler for /api/canonical-host
#[utoipa::path(
    get,
    path = "/api/canonical-host",
    responses(
        (status = 200, description = "In-cluster API server URL", body = CanonicalHostResponse)
    )
)]
async fn canonical_host_handler(State(state): State<Arc<WebServerState>>) -> Response {
    json_response(
        StatusCode::OK,
        CanonicalHostResponse {
            data: state.gateway.canonical_host(),
        },
    )
}

async fn health_check() -> &'static str {
    "OK"
}

pub fn router(state: Arc<WebServerState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/authenticate", axum::routing::post(authenticate_handler))
        .route("/api/kubeconfig/inspect", axum::routing::post(inspect_handler))
        .route(
            "/api/allowlist",
            get(list_allowlist_handler).post(add_allowlist_handler),
        )
        .route("/api/canonical-host", get(canonical_host_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .with_state(state)
}

pub async fn start_web_server(
    state: Arc<WebServerState>,
    shutdown: tokio::sync::oneshot::Receiver<()>,
) -> io::Result<()> {
    let addr = format!("0.0.0.0:{}", state.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        error!("Failed to bind to address {}: {}", addr, e);
        e
    })?;
    info!("Web server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            shutdown.await.ok();
        })
        .await
        .map_err(|e| {
            error!("Server error: {}", e);
            e
        })
}
