//! Request logging middleware: one line when a request starts, one when it ends.

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error;
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::time::Instant;
use tracing::{info, warn};

/// Paths whose query string carries one-time credentials.
const SENSITIVE_QUERY_PATHS: [&str; 1] = ["/api/auth/google/callback"];

/// Query string as logged: OAuth codes and states are replaced.
fn redact_query(path: &str, query: &str) -> String {
    if !query.is_empty() && SENSITIVE_QUERY_PATHS.contains(&path) {
        "[redacted]".to_string()
    } else {
        query.to_string()
    }
}

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

/// Request logger middleware service.
pub struct RequestLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let query = redact_query(req.path(), req.query_string());
        let remote_addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        let user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        // Only record whether credentials were sent, never the token itself
        let auth = match req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some(v) if v.starts_with("Bearer ") => "bearer",
            Some(_) => "other",
            None => "none",
        };

        // Log request start
        info!(
            target: "api",
            method = %method,
            path = %path,
            query = %query,
            remote_addr = %remote_addr,
            user_agent = %user_agent,
            auth = auth,
            "→ Request started"
        );

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let status = res.status().as_u16();
            let duration_ms = start.elapsed().as_millis() as u64;

            match outcome(res.status()) {
                "ok" => info!(target: "api", %method, %path, status, duration_ms, "← Request completed"),
                kind => warn!(target: "api", %method, %path, status, duration_ms, kind, "← Request failed"),
            }

            Ok(res)
        })
    }
}

/// Classify a response status for the completion log line.
fn outcome(status: StatusCode) -> &'static str {
    if status.is_success() || status.is_redirection() {
        "ok"
    } else if status.is_client_error() {
        "client_error"
    } else {
        "server_error"
    }
}
