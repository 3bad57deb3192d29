//! HTTP transport implementation.
//!
//! Serves the tool catalogue as plain HTTP:
//!
//! - `POST /tools/{operation}`: tool calls, parameters from query and body
//! - `/api/v1/...`: REST aliases translated into the same tool calls
//! - `POST /query`: generic `{tool, params}` dispatch over an allow-list
//! - `GET /health` and `GET /`
//!
//! Gated routes pass the credential check first, then the rate limit.
//! Compression and CORS wrap the whole router.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{ConnectInfo, FromRequest, Path, Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use http::{HeaderValue, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::compression::{CompressionLayer, predicate::SizeAbove};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use super::config::{CorsConfig, HttpConfig};
use super::{TransportError, TransportResult};
use crate::core::GatewayServer;
use crate::core::security::{AuthRejection, CallerRateLimiter, RateLimited, verify_basic_auth};
use crate::domains::tools::{ToolArgs, ToolCall, ToolError, ToolName, ToolResult};

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    server: Arc<GatewayServer>,
    limiter: CallerRateLimiter,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the complete router, gate included.
    pub fn router(&self, server: GatewayServer) -> Router {
        let limiter = CallerRateLimiter::new(server.config().security.rate_limit);
        let state = AppState {
            server: Arc::new(server),
            limiter,
        };

        let gated = Router::new()
            .route("/tools", get(list_tools))
            .route("/tools/{operation}", post(call_tool))
            .route("/query", post(query))
            .merge(rest_aliases())
            .route_layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn_with_state(state.clone(), require_auth))
                    .layer(middleware::from_fn_with_state(state.clone(), rate_limit)),
            );

        let health = Router::new()
            .route("/health", get(health_check))
            .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

        let mut app = Router::new()
            .route("/", get(root_handler))
            .merge(gated)
            .merge(health)
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        if self.config.compression.enabled {
            app = app.layer(
                CompressionLayer::new().compress_when(SizeAbove::new(self.config.compression.min_size)),
            );
        }

        if self.config.cors.enabled {
            app = app.layer(cors_layer(&self.config.cors));
        }

        app
    }

    /// Run the HTTP transport.
    pub async fn run(self, server: GatewayServer) -> TransportResult<()> {
        let addr = self.address();
        let auth_status = if server.config().security.auth.enabled {
            "enabled"
        } else {
            "disabled"
        };
        let rate_limit = server.config().security.rate_limit;
        let app = self.router(server);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!(
            "Ready - listening on {} (auth {}, rate limit {})",
            addr, auth_status, rate_limit
        );
        info!("  → Tools:   POST /tools/{{operation}}");
        info!("  → REST:    /api/v1/...");
        info!("  → Query:   POST /query");
        info!("  → Health:  GET /health");

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("Could not install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allows_any() {
        return layer.allow_origin(Any);
    }

    let origins = config
        .origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect::<Vec<_>>();
    layer.allow_origin(AllowOrigin::list(origins))
}

// ============================================================================
// Error responses
// ============================================================================

fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": message.into() }))).into_response()
}

impl IntoResponse for ToolError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        detail(status, self.to_string())
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let mut response = detail(StatusCode::UNAUTHORIZED, self.to_string());
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
        response
    }
}

impl IntoResponse for RateLimited {
    fn into_response(self) -> Response {
        let mut response = detail(StatusCode::TOO_MANY_REQUESTS, self.to_string());
        response.headers_mut().insert(
            header::RETRY_AFTER,
            HeaderValue::from_str(&self.retry_after.to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("60")),
        );
        response
    }
}

// ============================================================================
// Gate
// ============================================================================

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match verify_basic_auth(&state.server.config().security.auth, authorization) {
        Ok(()) => next.run(request).await,
        Err(rejection) => {
            warn!("Rejected {} {}: {}", request.method(), request.uri().path(), rejection);
            rejection.into_response()
        }
    }
}

async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let caller = caller_address(&request);
    match state.limiter.check(caller) {
        Ok(()) => next.run(request).await,
        Err(limited) => {
            warn!("Rate limit exceeded for {}", caller);
            limited.into_response()
        }
    }
}

/// The connection's peer address; loopback when the server was not started
/// with connect info (tests).
fn caller_address(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

// ============================================================================
// Parameter extraction
// ============================================================================

/// Tool parameters from the query string merged with the request body.
///
/// The body may be JSON (an object) or a urlencoded form; body values win
/// over query values with the same name.
pub struct ToolParams(pub ToolArgs);

impl<S> FromRequest<S> for ToolParams
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut args = match req.uri().query() {
            Some(query) => form_args(query.as_bytes()).map_err(IntoResponse::into_response)?,
            None => ToolArgs::new(),
        };

        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| detail(rejection.status(), rejection.body_text()))?;

        if !body.is_empty() {
            let from_body = if is_form {
                form_args(&body)
            } else {
                serde_json::from_slice::<Value>(&body)
                    .map_err(|e| ToolError::invalid(format!("request body is not valid JSON: {e}")))
                    .and_then(ToolArgs::from_value)
            };
            args.merge(from_body.map_err(IntoResponse::into_response)?);
        }

        Ok(Self(args))
    }
}

fn form_args(raw: &[u8]) -> ToolResult<ToolArgs> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(raw)
        .map(ToolArgs::from_pairs)
        .map_err(|e| ToolError::invalid(format!("malformed form parameters: {e}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// Root handler - service metadata.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.server.config();
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "description": "OpenProject gateway",
        "openproject_url": state.server.backend().base_url(),
        "transport": "HTTP",
        "authentication": config.security.auth.enabled,
        "rate_limit": config.security.rate_limit.to_string(),
        "endpoints": {
            "tools": "/tools",
            "tool_call": "/tools/{operation}",
            "rest": "/api/v1",
            "query": "/query",
            "health": "/health"
        }
    }))
}

/// Health check endpoint, reporting backend connectivity.
async fn health_check(State(state): State<AppState>) -> Response {
    let timestamp = chrono::Utc::now().to_rfc3339();

    match state.server.backend().test_connection().await {
        Ok(probe) => {
            let connected = probe.get("success").and_then(Value::as_bool).unwrap_or(false);
            Json(json!({
                "status": "healthy",
                "openproject": if connected { "connected" } else { "disconnected" },
                "timestamp": timestamp
            }))
            .into_response()
        }
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                    "timestamp": timestamp
                })),
            )
                .into_response()
        }
    }
}

async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "tools": state.server.list_tools() }))
}

async fn call_tool(
    State(state): State<AppState>,
    Path(operation): Path<String>,
    ToolParams(args): ToolParams,
) -> ToolResult<Json<Value>> {
    debug!("POST /tools/{} with {} parameter(s)", operation, args.len());
    state.server.call_tool(&operation, &args).await.map(Json)
}

async fn query(State(state): State<AppState>, body: Bytes) -> ToolResult<Json<Value>> {
    let call: ToolCall = if body.is_empty() {
        ToolCall::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ToolError::invalid(format!("request body is not a tool call: {e}")))?
    };
    state.server.query(call).await.map(Json)
}

// ============================================================================
// REST aliases
// ============================================================================

async fn collection(state: AppState, tool: ToolName, mut args: ToolArgs) -> ToolResult<Json<Value>> {
    args.rename("active", "active_only");
    state.server.call(tool, &args).await.map(Json)
}

async fn member(
    state: AppState,
    tool: ToolName,
    id_param: &'static str,
    id: String,
    mut args: ToolArgs,
) -> ToolResult<Json<Value>> {
    args.insert(id_param, id);
    state.server.call(tool, &args).await.map(Json)
}

fn rest_aliases() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/projects",
            get(|State(s): State<AppState>, ToolParams(a): ToolParams| {
                collection(s, ToolName::ListProjects, a)
            })
            .post(|State(s): State<AppState>, ToolParams(a): ToolParams| {
                collection(s, ToolName::CreateProject, a)
            }),
        )
        .route(
            "/api/v1/projects/{id}",
            get(
                |State(s): State<AppState>, Path(id): Path<String>, ToolParams(a): ToolParams| {
                    member(s, ToolName::GetProject, "project_id", id, a)
                },
            )
            .put(
                |State(s): State<AppState>, Path(id): Path<String>, ToolParams(a): ToolParams| {
                    member(s, ToolName::UpdateProject, "project_id", id, a)
                },
            )
            .delete(
                |State(s): State<AppState>, Path(id): Path<String>, ToolParams(a): ToolParams| {
                    member(s, ToolName::DeleteProject, "project_id", id, a)
                },
            ),
        )
        .route(
            "/api/v1/users",
            get(|State(s): State<AppState>, ToolParams(a): ToolParams| {
                collection(s, ToolName::ListUsers, a)
            }),
        )
        .route(
            "/api/v1/users/{id}",
            get(
                |State(s): State<AppState>, Path(id): Path<String>, ToolParams(a): ToolParams| {
                    member(s, ToolName::GetUser, "user_id", id, a)
                },
            ),
        )
        .route(
            "/api/v1/workpackages",
            get(|State(s): State<AppState>, ToolParams(a): ToolParams| {
                collection(s, ToolName::ListWorkPackages, a)
            })
            .post(|State(s): State<AppState>, ToolParams(a): ToolParams| {
                collection(s, ToolName::CreateWorkPackage, a)
            }),
        )
        .route(
            "/api/v1/workpackages/{id}",
            get(
                |State(s): State<AppState>, Path(id): Path<String>, ToolParams(a): ToolParams| {
                    member(s, ToolName::GetWorkPackage, "work_package_id", id, a)
                },
            )
            .put(
                |State(s): State<AppState>, Path(id): Path<String>, ToolParams(a): ToolParams| {
                    member(s, ToolName::UpdateWorkPackage, "work_package_id", id, a)
                },
            )
            .delete(
                |State(s): State<AppState>, Path(id): Path<String>, ToolParams(a): ToolParams| {
                    member(s, ToolName::DeleteWorkPackage, "work_package_id", id, a)
                },
            ),
        )
        .route(
            "/api/v1/roles",
            get(|State(s): State<AppState>, ToolParams(a): ToolParams| {
                collection(s, ToolName::ListRoles, a)
            }),
        )
        .route(
            "/api/v1/memberships",
            get(|State(s): State<AppState>, ToolParams(a): ToolParams| {
                collection(s, ToolName::ListMemberships, a)
            }),
        )
        .route(
            "/api/v1/time-entries",
            get(|State(s): State<AppState>, ToolParams(a): ToolParams| {
                collection(s, ToolName::ListTimeEntries, a)
            }),
        )
}
