//! Google OAuth routes.
//!
//! Endpoints:
//! 1. GET /auth/google — Redirect to Google (with CSRF `state` cookie)
//! 2. GET /auth/google/callback — Verify state, exchange code, fetch userinfo,
//!    resolve the local account and redirect to the client with a bearer token

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse, get, web};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::auth::TokenIssuer;
use crate::config::{Config, GoogleOAuthSettings};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::user::GoogleUserInfo;

/// OAuth CSRF state cookie. Holds the random `state` sent to Google,
/// verified on callback to prevent login CSRF.
const OAUTH_STATE_COOKIE: &str = "cm_oauth_state";
const DEFAULT_CALLBACK_PATH: &str = "/api/auth/google/callback";
const SCOPES: &str = "openid email profile";
/// HTTP connect timeout for Google API calls.
const HTTP_CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
/// HTTP total timeout for Google API calls.
const HTTP_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Configure OAuth routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(google_login).service(google_callback);
}

/// Build an HTTP client with timeouts.
fn build_http_client() -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .timeout(HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client for OAuth: {}", e)))
}

/// Generate a cryptographically random string.
fn generate_random_hex() -> String {
    let random_bytes: [u8; 32] = rand::random();
    hex::encode(random_bytes)
}

fn state_cookie(value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(OAUTH_STATE_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie
}

/// Client credentials, or 400 when OAuth is not configured.
fn credentials(oauth: &GoogleOAuthSettings) -> AppResult<(&str, &SecretString)> {
    match (oauth.enabled, &oauth.client_id, &oauth.client_secret) {
        (true, Some(id), Some(secret)) => Ok((id.as_str(), secret)),
        _ => Err(AppError::InvalidInput(
            "Google OAuth is not configured".to_string(),
        )),
    }
}

fn redirect_uri(oauth: &GoogleOAuthSettings) -> &str {
    oauth.callback_url.as_deref().unwrap_or(DEFAULT_CALLBACK_PATH)
}

/// Build the provider authorization URL.
pub fn authorize_url(oauth: &GoogleOAuthSettings, client_id: &str, state: &str) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
        oauth.authorize_url,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri(oauth)),
        urlencoding::encode(SCOPES),
        urlencoding::encode(state),
    )
}

/// Constant-time comparison of the callback state with the cookie value.
fn state_matches(provided: &str, expected: &str) -> bool {
    !provided.is_empty() && bool::from(provided.as_bytes().ct_eq(expected.as_bytes()))
}

// ============================================================================
// Endpoints
// ============================================================================

/// Redirect to the Google consent page.
///
/// GET /api/auth/google
#[get("/auth/google")]
pub async fn google_login(config: web::Data<Config>) -> AppResult<HttpResponse> {
    let oauth = &config.google_oauth;
    let (client_id, _) = credentials(oauth)?;

    let state = generate_random_hex();
    let location = authorize_url(oauth, client_id, &state);

    Ok(HttpResponse::Found()
        .cookie(state_cookie(state, config.environment.is_production()))
        .append_header(("Location", location))
        .finish())
}

/// Handle the Google OAuth callback.
///
/// GET /api/auth/google/callback?code=...&state=...
#[get("/auth/google/callback")]
pub async fn google_callback(
    req: HttpRequest,
    query: web::Query<CallbackQuery>,
    config: web::Data<Config>,
    pool: web::Data<DbPool>,
    issuer: web::Data<TokenIssuer>,
) -> AppResult<HttpResponse> {
    let oauth = &config.google_oauth;
    let (client_id, client_secret) = credentials(oauth)?;

    if let Some(ref err) = query.error {
        warn!("OAuth: Google returned error: {}", err);
        return Err(AppError::Unauthorized(
            "Google authentication failed".to_string(),
        ));
    }

    // --- CSRF state verification ---
    let expected_state = req
        .cookie(OAUTH_STATE_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| {
            warn!("OAuth callback: missing state cookie");
            AppError::Unauthorized("OAuth state verification failed".to_string())
        })?;

    if !state_matches(query.state.as_deref().unwrap_or(""), &expected_state) {
        warn!("OAuth callback: state mismatch");
        return Err(AppError::Unauthorized(
            "OAuth state verification failed".to_string(),
        ));
    }

    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing authorization code".to_string()))?;

    // --- Exchange code for access token ---
    let http_client = build_http_client()?;
    let form = format!(
        "code={}&client_id={}&client_secret={}&redirect_uri={}&grant_type=authorization_code",
        urlencoding::encode(code),
        urlencoding::encode(client_id),
        urlencoding::encode(client_secret.expose_secret()),
        urlencoding::encode(redirect_uri(oauth)),
    );
    let token_response: TokenResponse = http_client
        .post(&oauth.token_url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header("Accept", "application/json")
        .body(form)
        .send()
        .await
        .map_err(|e| {
            warn!("OAuth: failed to exchange code: {}", e);
            AppError::Unauthorized("Google authentication failed".to_string())
        })?
        .json()
        .await
        .map_err(|e| {
            warn!("OAuth: failed to parse token response: {}", e);
            AppError::Unauthorized("Google authentication failed".to_string())
        })?;

    if let Some(ref err) = token_response.error {
        warn!("OAuth: token endpoint returned error: {}", err);
        return Err(AppError::Unauthorized(
            "Google authentication failed".to_string(),
        ));
    }

    let access_token: SecretString = token_response
        .access_token
        .map(SecretString::from)
        .ok_or_else(|| {
            warn!("OAuth: no access_token in response");
            AppError::Unauthorized("Google authentication failed".to_string())
        })?;

    // --- Fetch user info ---
    let user_info: GoogleUserInfo = http_client
        .get(&oauth.userinfo_url)
        .header(
            "Authorization",
            format!("Bearer {}", access_token.expose_secret()),
        )
        .send()
        .await
        .map_err(|e| {
            warn!("OAuth: failed to fetch user info: {}", e);
            AppError::Unauthorized("Google authentication failed".to_string())
        })?
        .json()
        .await
        .map_err(|e| {
            warn!("OAuth: failed to parse user info: {}", e);
            AppError::Unauthorized("Google authentication failed".to_string())
        })?;

    // --- Resolve local account ---
    let user =
        crate::db::users::upsert_from_google(pool.connection(), &user_info, oauth.link_by_email)
            .await?;

    info!("Google OAuth login: user='{}' (id={})", user.username, user.id);

    let token = issuer.issue(user.id)?;
    let location = format!(
        "{}/auth/callback?token={}",
        config.client_url.trim_end_matches('/'),
        urlencoding::encode(&token)
    );

    Ok(HttpResponse::Found()
        .cookie(state_cookie(String::new(), config.environment.is_production()))
        .append_header(("Location", location))
        .finish())
}

// ============================================================================
// Types
// ============================================================================

#[derive(serde::Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}
