//! Actix-web extractor for bearer token authentication.
//!
//! # Security
//! - Every failure (missing header, wrong scheme, malformed, expired or
//!   forged token) produces the same 401 body
//! - The token value is never logged

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use std::future::{Ready, ready};
use uuid::Uuid;

use super::{INVALID_TOKEN_MSG, TokenIssuer};
use crate::error::ErrorResponse;

/// Extract the token from an `Authorization: Bearer <token>` header.
fn extract_bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication error for extractors.
#[derive(Debug)]
pub struct AuthError {
    message: String,
}

impl AuthError {
    pub(crate) fn invalid_token() -> Self {
        Self {
            message: INVALID_TOKEN_MSG.to_string(),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::UNAUTHORIZED).json(ErrorResponse {
            error: "UNAUTHORIZED".to_string(),
            message: self.message.clone(),
            details: None,
        })
    }
}

/// Extractor that requires a valid bearer token.
///
/// Use this in handlers that require authentication:
/// ```ignore
/// async fn protected_handler(auth: BearerAuth) -> impl Responder {
///     // auth.user_id identifies the caller
/// }
/// ```
///
/// Only the signature and expiry are checked here; handlers that need the
/// user record load it themselves.
pub struct BearerAuth {
    pub user_id: Uuid,
}

impl FromRequest for BearerAuth {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let issuer = match req.app_data::<web::Data<TokenIssuer>>() {
            Some(issuer) => issuer,
            None => {
                tracing::error!("TokenIssuer missing from app data");
                return ready(Err(AuthError {
                    message: "Internal configuration error".to_string(),
                }));
            }
        };

        let result = match extract_bearer_token(req) {
            Some(token) => issuer.verify(token).map(|user_id| BearerAuth { user_id }),
            None => Err(AuthError::invalid_token()),
        };

        ready(result)
    }
}
