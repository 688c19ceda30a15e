//! SBI HTTP Server
//!
//! hyper based server for SBI communication. One listener serves HTTP/1.1
//! and HTTP/2 (prior knowledge) connections.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};

use crate::error::{SbiError, SbiResult};
use crate::message::{ProblemDetails, SbiRequest, SbiResponse};

/// Server configuration
#[derive(Debug, Clone)]
pub struct SbiServerConfig {
    /// Bind address
    pub addr: SocketAddr,
}

impl Default for SbiServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 7777)),
        }
    }
}

impl SbiServerConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Create configuration with host and port
    pub fn with_host_port(host: impl AsRef<str>, port: u16) -> SbiResult<Self> {
        let host = host.as_ref();
        let addr: SocketAddr = if host.contains(':') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        }
        .parse()
        .map_err(|e| SbiError::InvalidUri(format!("invalid address {host}:{port}: {e}")))?;
        Ok(Self::new(addr))
    }
}

/// Request handler trait
pub trait SbiRequestHandler: Send + Sync + 'static {
    fn handle(&self, request: SbiRequest) -> Pin<Box<dyn Future<Output = SbiResponse> + Send>>;
}

/// Function-based request handler
impl<F, Fut> SbiRequestHandler for F
where
    F: Fn(SbiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SbiResponse> + Send + 'static,
{
    fn handle(&self, request: SbiRequest) -> Pin<Box<dyn Future<Output = SbiResponse> + Send>> {
        Box::pin(self(request))
    }
}

/// Hyper service wrapper
struct SbiService<H: SbiRequestHandler> {
    handler: Arc<H>,
}

impl<H: SbiRequestHandler> Clone for SbiService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
        }
    }
}

impl<H: SbiRequestHandler> Service<Request<Incoming>> for SbiService<H> {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let handler = self.handler.clone();

        Box::pin(async move {
            let sbi_response = match convert_request(req).await {
                Ok(sbi_request) => handler.handle(sbi_request).await,
                Err(rejected) => rejected,
            };
            Ok(convert_response(sbi_response))
        })
    }
}

/// Buffer a hyper request into an [`SbiRequest`].
///
/// A body that is not UTF-8 text is answered with 400 without reaching the
/// handler.
async fn convert_request(req: Request<Incoming>) -> Result<SbiRequest, SbiResponse> {
    let (parts, body) = req.into_parts();

    // Keep the origin form target whether the client sent it (HTTP/1.1)
    // or an absolute URI (HTTP/2)
    let target = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());
    let mut request = SbiRequest::new(parts.method.as_str(), target);

    request.http.headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    request.http.params = parts
        .uri
        .query()
        .into_iter()
        .flat_map(|query| query.split('&'))
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    match body.collect().await {
        Ok(collected) => {
            request.http.content = body_text(collected.to_bytes()).map_err(|e| {
                log::warn!(
                    "Rejecting {} {}: body is not UTF-8 ({e})",
                    request.header.method,
                    request.header.uri
                );
                send_bad_request("Request body is not valid UTF-8", Some("INVALID_MSG_FORMAT"))
            })?;
        }
        Err(e) => log::warn!(
            "Failed to read request body for {} {}: {e}",
            request.header.method,
            request.header.uri
        ),
    }

    Ok(request)
}

/// Body as text; an empty body is no content
fn body_text(bytes: Bytes) -> Result<Option<String>, std::string::FromUtf8Error> {
    if bytes.is_empty() {
        return Ok(None);
    }
    String::from_utf8(bytes.to_vec()).map(Some)
}

/// Turn an [`SbiResponse`] into a hyper response
fn convert_response(sbi_response: SbiResponse) -> Response<Full<Bytes>> {
    let SbiResponse { status, http } = sbi_response;
    let builder = http
        .headers
        .iter()
        .fold(Response::builder().status(status), |builder, (name, value)| {
            builder.header(name.as_str(), value.as_str())
        });

    builder
        .body(Full::new(Bytes::from(http.content.unwrap_or_default())))
        .unwrap_or_else(|e| {
            log::error!("Cannot build response with status {status}: {e}");
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
}

enum ServerState {
    Stopped,
    Running(oneshot::Sender<()>),
}

/// SBI Server
pub struct SbiServer {
    config: SbiServerConfig,
    state: Arc<Mutex<ServerState>>,
}

impl SbiServer {
    pub fn new(config: SbiServerConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(ServerState::Stopped)),
        }
    }

    pub fn config(&self) -> &SbiServerConfig {
        &self.config
    }

    /// Bind the listener and start serving with `handler`.
    ///
    /// Returns the bound address, which differs from the configured one when
    /// port 0 is requested.
    pub async fn start<H: SbiRequestHandler>(&self, handler: H) -> SbiResult<SocketAddr> {
        let mut state = self.state.lock().await;

        if matches!(*state, ServerState::Running(_)) {
            return Err(SbiError::ServerError("Server already running".to_string()));
        }

        let listener = TcpListener::bind(self.config.addr)
            .await
            .map_err(|e| SbiError::ServerError(format!("Failed to bind {}: {e}", self.config.addr)))?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        *state = ServerState::Running(shutdown_tx);
        drop(state);

        let handler = Arc::new(handler);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, peer)) => {
                                let io = TokioIo::new(stream);
                                let service = SbiService {
                                    handler: handler.clone(),
                                };

                                tokio::spawn(async move {
                                    if let Err(e) = auto::Builder::new(TokioExecutor::new())
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        log::debug!("Connection from {peer} closed: {e}");
                                    }
                                });
                            }
                            Err(e) => {
                                log::warn!("Accept error: {e}");
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }
        });

        Ok(local_addr)
    }

    pub async fn stop(&self) -> SbiResult<()> {
        let mut state = self.state.lock().await;

        if let ServerState::Running(shutdown_tx) = std::mem::replace(&mut *state, ServerState::Stopped) {
            let _ = shutdown_tx.send(());
        }

        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        let state = self.state.lock().await;
        matches!(*state, ServerState::Running(_))
    }
}

/// Build a ProblemDetails error response
pub fn send_error(status: u16, title: &str, detail: &str, cause: Option<&str>) -> SbiResponse {
    let problem = ProblemDetails::with_status(status as i32)
        .with_title(title)
        .with_detail(detail);

    let problem = if let Some(c) = cause {
        problem.with_cause(c)
    } else {
        problem
    };

    SbiResponse::with_status(status)
        .with_json_body(&problem)
        .unwrap_or_else(|_| SbiResponse::with_status(status))
}

/// Send a 400 Bad Request error response
pub fn send_bad_request(detail: &str, cause: Option<&str>) -> SbiResponse {
    send_error(400, "Bad Request", detail, cause)
}

/// Send a 404 Not Found error response
pub fn send_not_found(detail: &str, cause: Option<&str>) -> SbiResponse {
    send_error(404, "Not Found", detail, cause)
}

/// Send a 405 Method Not Allowed error response
pub fn send_method_not_allowed(method: &str, resource: &str) -> SbiResponse {
    send_error(
        405,
        "Method Not Allowed",
        &format!("Method {method} not allowed for resource {resource}"),
        Some("METHOD_NOT_ALLOWED"),
    )
}

/// Send a 501 Not Implemented error response
pub fn send_not_implemented(detail: &str) -> SbiResponse {
    send_error(501, "Not Implemented", detail, Some("NOT_IMPLEMENTED"))
}
