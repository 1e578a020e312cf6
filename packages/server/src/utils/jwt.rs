use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub uid: i32,   // User ID
    pub iat: usize, // Issued at
    pub exp: usize, // Expiration timestamp
}

/// Sign a new session token for a user, valid for `ttl`.
pub fn sign(user_id: i32, secret: &str, ttl: Duration) -> Result<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(ttl)
        .ok_or_else(|| anyhow::anyhow!("token expiry out of range"))?;

    let claims = Claims {
        uid: user_id,
        iat: now.timestamp().max(0) as usize,
        exp: expiration.timestamp().max(0) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a session token.
///
/// Expired tokens map to `TokenExpired`; every other failure (bad signature,
/// malformed token, wrong algorithm) maps to `TokenInvalid`.
pub fn verify(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::TokenInvalid,
    })
}
