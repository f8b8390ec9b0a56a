//! Authentication: password hashing and bearer token issuing/verification.

mod extractor;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthSettings;
use crate::error::{AppError, AppResult};

pub use extractor::{AuthError, BearerAuth};

/// Message returned for every bearer token failure.
pub const INVALID_TOKEN_MSG: &str = "Invalid token";

/// Bearer token claims. The user id is the only identity claim.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub iat: usize,
    pub exp: usize,
}

/// Issues and verifies HS256 bearer tokens.
///
/// The signing secret stays wrapped in `SecretString`; `Debug` output is redacted.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: SecretString,
    ttl_secs: u64,
}

impl TokenIssuer {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            secret: settings.jwt_secret.clone(),
            ttl_secs: settings.token_ttl_secs,
        }
    }

    /// Issue a signed, time-limited token for the given user.
    pub fn issue(&self, user_id: Uuid) -> AppResult<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::seconds(self.ttl_secs as i64);
        self.sign(&TokenClaims {
            user_id: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        })
    }

    fn sign(&self, claims: &TokenClaims) -> AppResult<String> {
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        encode(&Header::default(), claims, &key)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify a token and return the user id it carries.
    ///
    /// Expired, forged and malformed tokens are deliberately indistinguishable
    /// to the caller; the cause only reaches the debug log.
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        let data = decode::<TokenClaims>(token, &key, &validation).map_err(|e| {
            tracing::debug!("Bearer token rejected: {}", e);
            AuthError::invalid_token()
        })?;

        Uuid::parse_str(&data.claims.user_id).map_err(|_| AuthError::invalid_token())
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenIssuer([REDACTED], ttl={}s)", self.ttl_secs)
    }
}

/// Hash a password with argon2id and a random salt (PHC string format).
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored PHC hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}
