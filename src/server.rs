//! HTTP server and transport translation.
//!
//! Owns the listening socket, serves each connection with hyper, and turns
//! dispatch results into HTTP responses: render errors become `500`, unknown
//! routes `404` (or `405` when another method serves the path).

use crate::dispatcher::{Dispatcher, RenderResult};
use crate::error::{MockError, Result};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{self, HeaderName, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl ServerConfig {
    /// Create a new server configuration.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// A bound mock server.
pub struct MockServer {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
}

impl MockServer {
    /// Bind the listener. The dispatcher is read-only from here on.
    pub async fn bind(config: &ServerConfig, dispatcher: Dispatcher) -> Result<Self> {
        let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
        Ok(Self {
            listener,
            dispatcher: Arc::new(dispatcher),
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve connections until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!(
            addr = %addr,
            endpoints = self.dispatcher.len(),
            "Mock server listening"
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    let (stream, remote_addr) = match result {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };

                    let io = TokioIo::new(stream);
                    let dispatcher = Arc::clone(&self.dispatcher);

                    tokio::spawn(async move {
                        let service = service_fn(move |req| {
                            let dispatcher = Arc::clone(&dispatcher);
                            async move { handle(req, dispatcher).await }
                        });

                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            if !e.is_incomplete_message() {
                                warn!(
                                    remote = %remote_addr,
                                    error = %e,
                                    "HTTP connection error"
                                );
                            }
                        }
                    });
                }
                _ = &mut shutdown => {
                    info!("Mock server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Serve one HTTP request.
pub async fn handle(
    req: Request<Incoming>,
    dispatcher: Arc<Dispatcher>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let uri = req.uri();
    Ok(respond(
        &dispatcher,
        req.method().as_str(),
        uri.path(),
        uri.query(),
    ))
}

/// Dispatch a request and translate the outcome into an HTTP response.
pub fn respond(
    dispatcher: &Dispatcher,
    method: &str,
    path: &str,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    debug!(method = %method, path = %path, "Handling request");

    match dispatcher.dispatch(method, path, query) {
        Ok(result) => render_response(result),
        Err(MockError::RouteNotFound { .. }) => {
            let allowed = dispatcher.allowed_methods(path);
            if allowed.is_empty() {
                warn!(method = %method, path = %path, "No matching endpoint found");
                not_found()
            } else {
                let allowed: Vec<&str> = allowed.iter().map(|m| m.as_str()).collect();
                warn!(method = %method, path = %path, allowed = ?allowed, "Method not allowed");
                method_not_allowed(&allowed)
            }
        }
        Err(MockError::TemplateDecode { template, source }) => {
            error!(
                method = %method,
                path = %path,
                template = %template,
                error = %source,
                "Failed to render response template"
            );
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "template_error",
                &format!("Rendered template is not valid JSON: {}", source),
            )
        }
        Err(e) => {
            error!(method = %method, path = %path, error = %e, "Request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", &e.to_string())
        }
    }
}

fn render_response(result: RenderResult) -> Response<Full<Bytes>> {
    let body = match serde_json::to_vec(&result.body) {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "Failed to serialize response body");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                &e.to_string(),
            );
        }
    };

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() =
        StatusCode::from_u16(result.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in &result.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid response header"),
        }
    }

    response
}

fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response<Full<Bytes>> {
    json_response(
        status,
        &serde_json::json!({
            "error": code,
            "message": message,
        }),
    )
}

/// Build a 404 Not Found response.
fn not_found() -> Response<Full<Bytes>> {
    error_response(
        StatusCode::NOT_FOUND,
        "not_found",
        "No matching endpoint found",
    )
}

/// Build a 405 Method Not Allowed response.
fn method_not_allowed(allowed: &[&str]) -> Response<Full<Bytes>> {
    let allow = allowed.join(", ");
    let mut response = error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "method_not_allowed",
        &format!("Method not allowed. Allowed: {}", allow),
    );
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}
