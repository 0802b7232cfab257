// crates/chitfund-rpc/src/server.rs
//
// RPC server setup: FundRpcServer and RpcConfig.
//
// A single tonic service accepts JSON-encoded requests with a method field,
// resolves the caller's session against the method's access rule,
// dispatches to the appropriate handler, and returns a JSON envelope
// carrying an HTTP-equivalent status code.
//
// This avoids the need for proto codegen while still using tonic's server
// infrastructure for transport and middleware.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use tonic::transport::Server;
use tonic::Status;

use chitfund_core::auth::Session;
use chitfund_core::error::ChitError;
use chitfund_core::traits::UserStore;
use chitfund_engine::registry::{DrawMode, FundRegistry};

use crate::handlers;
use crate::middleware::{self, Access};
use crate::session::SessionManager;

// ---------------------------------------------------------------------------
// RpcConfig
// ---------------------------------------------------------------------------

/// Configuration for the RPC server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50051,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC Envelope
// ---------------------------------------------------------------------------

/// A JSON-RPC-style request envelope.
/// The client sends a method name and a JSON params payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// The RPC method to invoke (e.g., "draw/single", "funds/list").
    pub method: String,
    /// JSON-encoded parameters for the method. Omitted means `{}`.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A JSON-RPC-style response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Whether the request succeeded.
    pub success: bool,
    /// The result data (if success).
    pub result: Option<serde_json::Value>,
    /// Error message (if not success).
    pub error: Option<String>,
    /// HTTP-equivalent status: 200 on success, otherwise the error's code.
    pub code: u16,
}

impl JsonRpcResponse {
    fn ok(value: serde_json::Value) -> Self {
        Self {
            success: true,
            result: Some(value),
            error: None,
            code: 200,
        }
    }

    fn from_error(err: &ChitError) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(err.to_string()),
            code: err.status_code(),
        }
    }
}

/// A dispatched response plus any cookie the transport should set.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub response: JsonRpcResponse,
    pub set_cookie: Option<String>,
}

// ---------------------------------------------------------------------------
// FundRpcServer
// ---------------------------------------------------------------------------

/// The RPC server for the chit fund service.
///
/// Holds Arc references to the registry, user store, and session table,
/// and exposes a tonic-based server with JSON-RPC dispatching.
#[derive(Clone)]
pub struct FundRpcServer {
    config: RpcConfig,
    service: FundServiceImpl,
}

impl std::fmt::Debug for FundRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FundRpcServer")
            .field("config", &self.config)
            .field("sessions", &self.service.sessions)
            .finish()
    }
}

impl FundRpcServer {
    pub fn new(
        config: RpcConfig,
        registry: Arc<FundRegistry>,
        users: Arc<dyn UserStore>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            config,
            service: FundServiceImpl {
                registry,
                users,
                sessions,
            },
        }
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Dispatch a request in-process, as the transport would after reading
    /// the body and extracting the session token.
    pub async fn call(&self, request: JsonRpcRequest, token: Option<&str>) -> DispatchOutcome {
        self.service.dispatch(request, token).await
    }

    /// Serve until the process is terminated.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Serve until `signal` resolves, then drain in-flight requests and return.
    pub async fn start_with_shutdown<F>(&self, signal: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        tracing::info!("Chit fund RPC server starting on {}", addr);

        Server::builder()
            .accept_http1(true)
            .add_service(tonic::service::interceptor::InterceptedService::new(
                FundJsonRpcServer::new(self.service.clone()),
                middleware::logging_interceptor,
            ))
            .serve_with_shutdown(addr, signal)
            .await?;

        tracing::info!("Chit fund RPC server stopped");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Service implementation
// ---------------------------------------------------------------------------

/// Shared state plus the method dispatcher.
#[derive(Clone)]
struct FundServiceImpl {
    registry: Arc<FundRegistry>,
    users: Arc<dyn UserStore>,
    sessions: Arc<SessionManager>,
}

fn caller(session: &Option<Session>) -> Result<&Session, ChitError> {
    session
        .as_ref()
        .ok_or_else(|| ChitError::Unauthorized("Not authenticated".to_string()))
}

impl FundServiceImpl {
    /// Dispatch a request, log its outcome, and wrap it in the envelope.
    async fn dispatch(&self, request: JsonRpcRequest, token: Option<&str>) -> DispatchOutcome {
        let started = Instant::now();
        let method = request.method.clone();
        let mut set_cookie = None;

        let response = match self.route(request, token, &mut set_cookie).await {
            Ok(value) => JsonRpcResponse::ok(value),
            Err(err) => JsonRpcResponse::from_error(&err),
        };

        middleware::log_outcome(&method, response.code, started.elapsed());
        DispatchOutcome {
            response,
            set_cookie,
        }
    }

    /// Check access for the method, then call its handler.
    async fn route(
        &self,
        request: JsonRpcRequest,
        token: Option<&str>,
        set_cookie: &mut Option<String>,
    ) -> Result<serde_json::Value, ChitError> {
        let access = middleware::access_for(&request.method)
            .ok_or_else(|| ChitError::NotFound(format!("Unknown method: {}", request.method)))?;

        let session = match access {
            Access::Public => None,
            Access::Requires(capability) => {
                let session = self.sessions.resolve(token).await?;
                session.require(capability)?;
                Some(session)
            }
        };

        let registry = self.registry.as_ref();
        let users = self.users.as_ref();
        let sessions = self.sessions.as_ref();
        let params = request.params;

        match request.method.as_str() {
            // Auth
            "auth/login" => {
                let value = dispatch_handler(params, |r| {
                    handlers::auth::handle_login(users, sessions, r)
                })
                .await?;
                if let Some(t) = value.get("token").and_then(|t| t.as_str()) {
                    *set_cookie = Some(middleware::session_cookie(t, sessions.ttl_seconds()));
                }
                Ok(value)
            }
            "auth/bootstrap" => {
                dispatch_handler(params, |r| {
                    handlers::auth::handle_bootstrap(users, sessions, r)
                })
                .await
            }
            "auth/session" => {
                dispatch_handler(params, |r| {
                    handlers::auth::handle_session(sessions, token, r)
                })
                .await
            }
            "auth/logout" => {
                *set_cookie = Some(middleware::clear_session_cookie());
                dispatch_handler(params, |r| {
                    handlers::auth::handle_logout(sessions, token, r)
                })
                .await
            }

            // Members
            "members/list" => {
                dispatch_handler(params, |r| {
                    handlers::members::handle_list_members(registry, r)
                })
                .await
            }
            "members/get" => {
                dispatch_handler(params, |r| {
                    handlers::members::handle_get_member(registry, r)
                })
                .await
            }
            "members/create" => {
                dispatch_handler(params, |r| {
                    handlers::members::handle_create_member(registry, r)
                })
                .await
            }
            "members/import" => {
                dispatch_handler(params, |r| {
                    handlers::members::handle_import_members(registry, r)
                })
                .await
            }

            // Funds
            "funds/list" => {
                dispatch_handler(params, |r| handlers::funds::handle_list_funds(registry, r))
                    .await
            }
            "funds/get" => {
                dispatch_handler(params, |r| handlers::funds::handle_get_fund(registry, r)).await
            }
            "funds/members" => {
                dispatch_handler(params, |r| {
                    handlers::funds::handle_fund_members(registry, r)
                })
                .await
            }
            "funds/schedule" => {
                dispatch_handler(params, |r| {
                    handlers::funds::handle_fund_schedule(registry, r)
                })
                .await
            }
            "funds/create" => {
                dispatch_handler(params, |r| handlers::funds::handle_create_fund(registry, r))
                    .await
            }
            "funds/add_members" => {
                dispatch_handler(params, |r| handlers::funds::handle_add_members(registry, r))
                    .await
            }
            "funds/remove_member" => {
                dispatch_handler(params, |r| {
                    handlers::funds::handle_remove_member(registry, r)
                })
                .await
            }
            "funds/delete" => {
                dispatch_handler(params, |r| handlers::funds::handle_delete_fund(registry, r))
                    .await
            }

            // Draws
            "draw/single" => {
                dispatch_handler(params, |r| {
                    handlers::draw::handle_draw(registry, DrawMode::Single, r)
                })
                .await
            }
            "draw/three" => {
                dispatch_handler(params, |r| {
                    handlers::draw::handle_draw(registry, DrawMode::Three, r)
                })
                .await
            }

            // Search / Ledger
            "search/member" => {
                dispatch_handler(params, |r| {
                    handlers::search::handle_search_member(registry, r)
                })
                .await
            }
            "ledger/list" => {
                dispatch_handler(params, |r| handlers::search::handle_ledger(registry, r)).await
            }

            // Users
            "users/list" => {
                dispatch_handler(params, |r| handlers::users::handle_list_users(users, r)).await
            }
            "users/create" => {
                let caller = caller(&session)?;
                dispatch_handler(params, |r| {
                    handlers::users::handle_create_user(users, sessions, caller, r)
                })
                .await
            }
            "users/delete" => {
                let caller = caller(&session)?;
                dispatch_handler(params, |r| {
                    handlers::users::handle_delete_user(users, sessions, caller, r)
                })
                .await
            }

            // Admin
            "admin/counts" => {
                dispatch_handler(params, |r| handlers::admin::handle_counts(registry, r)).await
            }
            "admin/purge" => {
                let caller = caller(&session)?;
                dispatch_handler(params, |r| {
                    handlers::admin::handle_purge(registry, caller, r)
                })
                .await
            }

            _ => Err(ChitError::NotFound(format!(
                "Unknown method: {}",
                request.method
            ))),
        }
    }
}

/// Generic dispatch helper: deserialize params into a request type,
/// call the handler, and serialize the result to JSON.
async fn dispatch_handler<Req, Resp, F, Fut>(
    params: serde_json::Value,
    handler: F,
) -> Result<serde_json::Value, ChitError>
where
    Req: serde::de::DeserializeOwned,
    Resp: serde::Serialize,
    F: FnOnce(Req) -> Fut,
    Fut: Future<Output = Result<Resp, ChitError>>,
{
    let params = if params.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        params
    };
    let request: Req = serde_json::from_value(params)
        .map_err(|e| ChitError::Validation(format!("Invalid params: {}", e)))?;
    let response = handler(request).await?;
    Ok(serde_json::to_value(response)?)
}

// ---------------------------------------------------------------------------
// Tonic Service Wiring
// ---------------------------------------------------------------------------
// A single service with one method: `Call`.
// The request and response bodies are JSON (JsonRpcRequest/JsonRpcResponse).

/// The tonic service wrapper. Accepts a JSON body, extracts the session
/// token from the headers, and dispatches.
#[derive(Clone)]
pub struct FundJsonRpcServer {
    inner: FundServiceImpl,
}

impl std::fmt::Debug for FundJsonRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FundJsonRpcServer").finish()
    }
}

impl FundJsonRpcServer {
    fn new(inner: FundServiceImpl) -> Self {
        Self { inner }
    }
}

impl tonic::server::NamedService for FundJsonRpcServer {
    const NAME: &'static str = "chitfund.rpc.FundService";
}

impl<B> tower_service::Service<http::Request<B>> for FundJsonRpcServer
where
    B: HttpBody + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
    B::Data: Send,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            let token = middleware::extract_token(req.headers());

            let body_bytes = match collect_body(req.into_body()).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::error!("Failed to read request body: {}", e);
                    let err = ChitError::Validation(format!("Failed to read request body: {}", e));
                    return Ok(build_response(&JsonRpcResponse::from_error(&err), None));
                }
            };

            let rpc_request: JsonRpcRequest = match serde_json::from_slice(&body_bytes) {
                Ok(r) => r,
                Err(e) => {
                    let err = ChitError::Validation(format!("Invalid JSON-RPC request: {}", e));
                    return Ok(build_response(&JsonRpcResponse::from_error(&err), None));
                }
            };

            let outcome = inner.dispatch(rpc_request, token.as_deref()).await;
            Ok(build_response(&outcome.response, outcome.set_cookie.as_deref()))
        })
    }
}

/// Collect the body of an HTTP request into bytes.
async fn collect_body<B>(body: B) -> Result<Vec<u8>, String>
where
    B: HttpBody + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    B::Data: Send,
{
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    loop {
        match std::future::poll_fn(|cx| HttpBody::poll_frame(body.as_mut(), cx)).await {
            Some(Ok(frame)) => {
                if let Ok(data) = frame.into_data() {
                    use bytes::Buf;
                    collected.extend_from_slice(data.chunk());
                }
            }
            Some(Err(e)) => return Err(e.into().to_string()),
            None => break,
        }
    }

    Ok(collected)
}

/// Build an HTTP response carrying the JSON envelope and an optional cookie.
fn build_response(
    envelope: &JsonRpcResponse,
    set_cookie: Option<&str>,
) -> http::Response<tonic::body::BoxBody> {
    let json = serde_json::to_vec(envelope).unwrap_or_default();
    let body = tonic::body::BoxBody::new(
        http_body_util::Full::new(bytes::Bytes::from(json))
            .map_err(|e| Status::internal(format!("body error: {}", e))),
    );

    let mut response = http::Response::new(body);
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    if let Some(cookie) = set_cookie.and_then(|c| http::HeaderValue::from_str(c).ok()) {
        response.headers_mut().insert(http::header::SET_COOKIE, cookie);
    }
    response
}
