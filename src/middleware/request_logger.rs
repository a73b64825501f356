//! Request logging middleware.
//!
//! Logs one line when a request arrives and one when it completes. Secrets are
//! never logged: account keys are cut to a short prefix and session tokens
//! are reported only by where they were presented.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::{ACCOUNT_KEY_HEADER, LEGACY_TOKEN_HEADER};

/// Characters of an account key that may appear in logs.
const KEY_PREFIX_LEN: usize = 8;

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
        let remote_addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        let account_key = account_key_prefix(req.headers());
        let token = token_source(req.headers());

        info!(
            target: "api",
            method = %method,
            path = %path,
            remote_addr = %remote_addr,
            account_key = %account_key,
            token = token,
            "→ Request started"
        );

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let status = res.status().as_u16();
            let duration_ms = start.elapsed().as_millis();

            if res.status().is_server_error() {
                error!(target: "api", method = %method, path = %path, status, duration_ms, "← Server error");
            } else if res.status().is_client_error() {
                warn!(target: "api", method = %method, path = %path, status, duration_ms, "← Client error");
            } else {
                info!(target: "api", method = %method, path = %path, status, duration_ms, "← Request completed");
            }

            Ok(res)
        })
    }
}

/// Loggable form of the `Account-Key` header.
fn account_key_prefix(headers: &HeaderMap) -> String {
    match headers.get(ACCOUNT_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        Some(k) if k.len() > KEY_PREFIX_LEN && k.is_char_boundary(KEY_PREFIX_LEN) => {
            format!("{}...", &k[..KEY_PREFIX_LEN])
        }
        Some(_) => "invalid".to_string(),
        None => "none".to_string(),
    }
}

/// Where a session token was presented, if anywhere.
fn token_source(headers: &HeaderMap) -> &'static str {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer ") || v.starts_with("bearer "));

    if bearer {
        "bearer"
    } else if headers.contains_key(LEGACY_TOKEN_HEADER) {
        "x-token"
    } else {
        "none"
    }
}
