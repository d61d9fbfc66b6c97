// Bearer token issuance and verification. Login returns an access/refresh
// pair; the refresh endpoint exchanges a refresh token for a new access
// token. HS256 over the configured secret.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::models::User;

pub const ACCESS: &str = "access";
pub const REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub is_staff: bool,
    pub token_type: String,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    pub fn user_id(&self) -> AppResult<i64> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthorized("malformed token subject".to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

pub fn issue_pair(user: &User, cfg: &AuthConfig) -> AppResult<TokenPair> {
    Ok(TokenPair {
        refresh: issue(user, REFRESH, cfg.refresh_ttl_secs, cfg)?,
        access: issue(user, ACCESS, cfg.access_ttl_secs, cfg)?,
    })
}

pub fn issue(user: &User, token_type: &str, ttl_secs: u64, cfg: &AuthConfig) -> AppResult<String> {
    let now = Utc::now().timestamp() as u64;
    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        is_staff: user.is_staff,
        token_type: token_type.to_string(),
        iat: now,
        exp: now + ttl_secs,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.token_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token encoding failed: {}", e)))
}

pub fn verify(token: &str, expected_type: &str, cfg: &AuthConfig) -> AppResult<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.token_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))?;

    if data.claims.token_type != expected_type {
        return Err(AppError::Unauthorized(format!(
            "expected {} token",
            expected_type
        )));
    }
    Ok(data.claims)
}
