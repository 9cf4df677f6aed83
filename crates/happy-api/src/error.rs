use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use happy_db::StoreError;
use happy_types::api::ErrorResponse;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username already exists. Please choose a different one.")]
    UsernameTaken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername => Self::UsernameTaken,
            other => Self::Storage(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Please enter a note for your happy moment.")]
    EmptyNote,


    #[error("You haven't added any happy moments yet. Start by adding one!")]
    NoMoments,

    #[error("moment {id} has unreadable created_at '{raw}'")]
    CorruptTimestamp { id: i64, raw: String },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Error returned by every HTTP handler, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Please login or sign up to continue.")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    fn storage(err: StoreError) -> Self {
        match err {
            // Token signed for an account this database does not know.
            StoreError::UnknownUser(_) => Self::unauthorized(),
            other => {
                error!("Storage error: {}", other);
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::UsernameTaken => Self::new(StatusCode::CONFLICT, message),
            AuthError::InvalidCredentials => Self::new(StatusCode::UNAUTHORIZED, message),
            AuthError::Hashing(e) => {
                error!("Password hashing error: {}", e);
                Self::internal()
            }
            AuthError::Storage(e) => Self::storage(e),
        }
    }
}

impl From<JournalError> for ApiError {
    fn from(err: JournalError) -> Self {
        let message = err.to_string();
        match err {
            JournalError::EmptyNote => Self::bad_request(message),
            JournalError::NoMoments => Self::new(StatusCode::NOT_FOUND, message),
            JournalError::CorruptTimestamp { .. } => {
                error!("Storage error: {}", message);
                Self::internal()
            }
            JournalError::Storage(e) => Self::storage(e),
        }
    }
}

/// Run blocking store or hashing work off the async runtime.
pub(crate) async fn run_blocking<F, T, E>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal()
        })?
        .map_err(Into::into)
}
