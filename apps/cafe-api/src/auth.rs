//! JWT authentication module.
//!
//! Two independent issuers: customers sign in with email and get a user
//! token; back-office staff sign in with a username and get an admin token.
//! Each issuer has its own secret, so neither kind of token verifies
//! against the other.
//!
//! Handlers ask for a principal by taking [`AuthUser`] or [`AuthAdmin`] as
//! an argument; the extractor rejects the request with 401 before the
//! handler runs.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use cafe_core::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

pub const NO_TOKEN: &str = "Not authorized, no token";
pub const USER_TOKEN_FAILED: &str = "Not authorized, token failed";
pub const ADMIN_TOKEN_FAILED: &str = "Not authorized, admin token failed";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    User,
    Admin,
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id or admin id)
    pub sub: String,

    /// Customer role; user tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Admin username; admin tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    pub kind: TokenKind,
}

/// Signs and verifies one kind of token.
#[derive(Clone)]
pub struct TokenIssuer {
    kind: TokenKind,
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("kind", &self.kind)
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(kind: TokenKind, secret: &str, lifetime_secs: i64) -> Self {
        TokenIssuer {
            kind,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    /// Token for a customer.
    pub fn issue_user(&self, user_id: i64, role: Role) -> Result<String, ApiError> {
        self.issue(user_id, Some(role), None)
    }

    /// Token for a back-office account.
    pub fn issue_admin(&self, admin_id: i64, username: &str) -> Result<String, ApiError> {
        self.issue(admin_id, None, Some(username.to_string()))
    }

    fn issue(
        &self,
        subject: i64,
        role: Option<Role>,
        username: Option<String>,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: subject.to_string(),
            role,
            username,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            kind: self.kind,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Verifies signature, expiry and kind.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let claims = decode::<Claims>(token, &self.decoding, &Validation::default())?.claims;

        if claims.kind != self.kind {
            return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
        }
        Ok(claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn bearer_from_parts(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
}

// =============================================================================
// Extractors
// =============================================================================

/// An authenticated customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

impl AuthUser {
    /// Owners see their own records; admin-role users see everything.
    pub fn can_access(&self, owner_id: Option<i64>) -> bool {
        self.role == Role::Admin || owner_id == Some(self.id)
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let token = bearer_from_parts(parts)
            .ok_or_else(|| ApiError::Unauthorized(NO_TOKEN.to_string()))?;

        let claims = state.user_tokens.verify(token).map_err(|e| {
            warn!(error = %e, uri = %parts.uri, "User token rejected");
            ApiError::Unauthorized(USER_TOKEN_FAILED.to_string())
        })?;

        let id = claims
            .sub
            .parse()
            .map_err(|_| ApiError::Unauthorized(USER_TOKEN_FAILED.to_string()))?;

        let user = AuthUser {
            id,
            role: claims.role.unwrap_or_default(),
        };
        debug!(user_id = user.id, "User authenticated");

        parts.extensions.insert(user);
        Ok(user)
    }
}

/// An authenticated back-office account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthAdmin {
    pub id: i64,
    pub username: String,
}

impl FromRequestParts<Arc<AppState>> for AuthAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_from_parts(parts)
            .ok_or_else(|| ApiError::Unauthorized(NO_TOKEN.to_string()))?;

        let claims = state.admin_tokens.verify(token).map_err(|e| {
            warn!(error = %e, uri = %parts.uri, "Admin token rejected");
            ApiError::Unauthorized(ADMIN_TOKEN_FAILED.to_string())
        })?;

        let id = claims
            .sub
            .parse()
            .map_err(|_| ApiError::Unauthorized(ADMIN_TOKEN_FAILED.to_string()))?;

        Ok(AuthAdmin {
            id,
            username: claims.username.unwrap_or_default(),
        })
    }
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password for storage (argon2id, PHC string).
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against its stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
