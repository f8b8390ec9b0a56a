//! Account API handlers: signup, login, current user and profile.

use actix_web::{HttpResponse, get, post, put, web};
use tracing::info;

use crate::auth::{self, BearerAuth, TokenIssuer};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::user::{
    AuthResponse, ContestLevelRequest, CurrentUserResponse, LoginRequest, SignupRequest,
};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Trimmed, non-empty field value.
fn field(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Run password hashing off the async workers.
async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
}

/// Register a new password account.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Missing field, weak password or duplicate account", body = crate::error::ErrorResponse),
    )
)]
#[post("/auth/signup")]
pub async fn signup(
    pool: web::Data<DbPool>,
    issuer: web::Data<TokenIssuer>,
    body: web::Json<SignupRequest>,
) -> AppResult<HttpResponse> {
    let (Some(username), Some(email), Some(password)) =
        (field(&body.username), field(&body.email), body.password.as_deref())
    else {
        return Err(AppError::InvalidInput("All fields are required".to_string()));
    };
    if password.is_empty() {
        return Err(AppError::InvalidInput("All fields are required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::InvalidInput(
            "Please provide a valid email address".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let password = password.to_string();
    let password_hash = blocking(move || auth::hash_password(&password)).await?;

    let user =
        crate::db::users::create_password_user(pool.connection(), username, email, &password_hash)
            .await?;
    info!(user_id = %user.id, "Account created");

    let token = issuer.issue(user.id)?;
    Ok(HttpResponse::Created().json(AuthResponse {
        success: true,
        token,
        user: user.into(),
    }))
}

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Missing field", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid email or password", body = crate::error::ErrorResponse),
    )
)]
#[post("/auth/login")]
pub async fn login(
    pool: web::Data<DbPool>,
    issuer: web::Data<TokenIssuer>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let (Some(email), Some(password)) = (field(&body.email), body.password.as_deref()) else {
        return Err(AppError::InvalidInput(
            "Email and password are required".to_string(),
        ));
    };
    if password.is_empty() {
        return Err(AppError::InvalidInput(
            "Email and password are required".to_string(),
        ));
    }

    let user = crate::db::users::find_by_email(pool.connection(), email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    // OAuth-only accounts have no password to check against
    let Some(stored_hash) = user.password_hash.clone() else {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let password = password.to_string();
    let matches = blocking(move || Ok(auth::verify_password(&password, &stored_hash))).await?;
    if !matches {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = issuer.issue(user.id)?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        success: true,
        token,
        user: user.into(),
    }))
}

/// Get the user identified by the bearer token.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = CurrentUserResponse),
        (status = 401, description = "Missing, invalid or expired token", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
#[get("/auth/me")]
pub async fn me(auth: BearerAuth, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let user = crate::db::users::find_by_id(pool.connection(), auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    Ok(HttpResponse::Ok().json(CurrentUserResponse {
        success: true,
        user: user.into(),
    }))
}

/// Store the caller's preferred contest level.
#[utoipa::path(
    put,
    path = "/api/auth/contest-level",
    tag = "Auth",
    request_body = ContestLevelRequest,
    responses(
        (status = 200, description = "Updated user", body = CurrentUserResponse),
        (status = 400, description = "Missing level", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid token", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
#[put("/auth/contest-level")]
pub async fn update_contest_level(
    auth: BearerAuth,
    pool: web::Data<DbPool>,
    body: web::Json<ContestLevelRequest>,
) -> AppResult<HttpResponse> {
    let level = field(&body.level)
        .ok_or_else(|| AppError::InvalidInput("Level is required".to_string()))?;

    let user = crate::db::users::update_contest_level(pool.connection(), auth.user_id, level)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    Ok(HttpResponse::Ok().json(CurrentUserResponse {
        success: true,
        user: user.into(),
    }))
}

/// Configure account routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(signup)
        .service(login)
        .service(me)
        .service(update_contest_level);
}
