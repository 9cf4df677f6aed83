use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use rand_core::OsRng;
use tracing::{debug, error, info, warn};

use happy_db::Database;
use happy_types::api::{LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse};
use happy_types::models::{User, UserId};

use crate::AppState;
use crate::error::{ApiError, AuthError, run_blocking};
use crate::middleware::{Session, issue_token};

/// Password hashing and verification over the credential store.
#[derive(Clone)]
pub struct AuthService {
    db: Arc<Database>,
    /// Verified against when the username is unknown.
    dummy_hash: Option<String>,
}

impl AuthService {
    pub fn new(db: Arc<Database>) -> Self {
        let dummy_hash = hash_password("happy-journal-dummy")
            .inspect_err(|e| warn!("Failed to prepare dummy password hash: {}", e))
            .ok();

        Self { db, dummy_hash }
    }

    /// Hashes first, then lets the store's UNIQUE constraint decide, so a
    /// taken username costs the same as a fresh one.
    pub fn register(&self, username: &str, password: &str) -> Result<UserId, AuthError> {
        let password_hash = hash_password(password)?;

        let id = self.db.create_user(username, &password_hash)?;

        info!("Registered user '{}' as {}", username, id);
        Ok(UserId(id))
    }

    /// Unknown usernames and wrong passwords are indistinguishable to the
    /// caller, in both result and argon2 work done.
    pub fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let Some(row) = self.db.find_user(username)? else {
            if let Some(dummy) = &self.dummy_hash {
                let _ = verify_password(password, dummy);
            }
            debug!("Login rejected: unknown user '{}'", username);
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &row.password) {
            debug!("Login rejected: wrong password for '{}'", username);
            return Err(AuthError::InvalidCredentials);
        }

        Ok(User {
            id: UserId(row.id),
            username: row.username,
        })
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .to_string();

    Ok(hash)
}

/// A stored value that is not an argon2 PHC string never verifies.
fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password is not an argon2 hash: {}", e);
            false
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = state.auth.clone();
    let user_id = run_blocking(move || auth.register(&req.username, &req.password)).await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let auth = state.auth.clone();
    let user = run_blocking(move || auth.login(&req.username, &req.password)).await?;

    let token = issue_token(&state.jwt_secret, &user, state.session_ttl).map_err(|e| {
        error!("Failed to issue token for {}: {}", user.id, e);
        ApiError::internal()
    })?;

    info!("User '{}' logged in", user.username);

    Ok(Json(LoginResponse {
        user_id: user.id,
        username: user.username,
        token,
    }))
}

/// GET /me — identity for the welcome banner.
pub async fn me(Extension(session): Extension<Session>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: session.user_id,
        username: session.username,
    })
}
