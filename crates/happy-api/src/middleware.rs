use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use happy_types::api::Claims;
use happy_types::models::{User, UserId};

use crate::AppState;
use crate::error::ApiError;

/// The logged-in user, handed to every journal call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub username: String,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("session lifetime runs past the representable clock range")]
    ExpiryOverflow,

    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

pub fn issue_token(secret: &str, user: &User, ttl: Duration) -> Result<String, TokenError> {
    let expires_at = Utc::now()
        .checked_add_signed(ttl)
        .ok_or(TokenError::ExpiryOverflow)?;

    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        exp: expires_at.timestamp().max(0) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn verify_token(secret: &str, token: &str) -> Result<Session, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims.into())
}

/// Extract and validate the bearer token, then attach the [`Session`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(ApiError::unauthorized)?;

    let session = verify_token(&state.jwt_secret, token).map_err(|_| ApiError::unauthorized())?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
