//! Password hashing, access-token issuance, and the authenticated-user
//! extractor.
//!
//! Passwords are stored as Argon2id PHC strings. Access tokens are HS256
//! JWTs whose `sub` claim carries the user id; expiry comes from
//! `auth.token_expire_minutes` in the configuration.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::types::UserRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id the token was issued for.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

/// Constant-time verification against a stored PHC string. A malformed
/// stored hash is an internal error, not a failed login.
pub fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("stored password hash is malformed: {}", e)))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(anyhow::anyhow!("password verification failed: {}", e))),
    }
}

pub fn create_access_token(user_id: &str, cfg: &AuthConfig) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::minutes(cfg.token_expire_minutes)).timestamp(),
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(cfg.secret_key.as_bytes()))?;
    Ok(token)
}

pub fn verify_token(token: &str, cfg: &AuthConfig) -> AppResult<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.secret_key.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// The authenticated caller, loaded fresh from the database on every
/// request so a deleted account is rejected immediately.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub email: String,
    pub created_at: String,
    pub is_active: bool,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_val = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header_val
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Expected a Bearer token".to_string()))?;

        let claims = verify_token(token, &state.config.auth)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Could not validate credentials".to_string()))?;

        let row: Option<UserRow> = sqlx::query_as(
            "SELECT user_id, email, password_hash, created_at, is_active FROM users WHERE user_id = ?1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&state.db)
        .await?;

        let user = row
            .map(|u| CurrentUser {
                user_id,
                email: u.email,
                created_at: u.created_at,
                is_active: u.is_active,
            })
            .ok_or_else(|| AppError::Unauthorized("Could not validate credentials".to_string()))?;

        Ok(user)
    }
}

/// Case-insensitive-ish email shape check: one '@', something on both
/// sides, a dot in the domain. Enough to catch typos without pulling in
/// a validator crate.
pub fn validate_email(email: &str) -> AppResult<()> {
    let ok = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if ok {
        Ok(())
    } else {
        Err(AppError::ValidationError {
            field: "email".to_string(),
            message: "not a valid email address".to_string(),
        })
    }
}

/// Loads a user row by email, for login and duplicate-registration checks.
pub async fn get_user_by_email(db: &sqlx::SqlitePool, email: &str) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT user_id, email, password_hash, created_at, is_active FROM users WHERE email = ?1",
    )
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(row)
}
