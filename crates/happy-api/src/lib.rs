pub mod auth;
pub mod error;
pub mod journal;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use chrono::Duration;
use happy_db::Database;

use crate::auth::AuthService;
use crate::journal::JournalService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub auth: AuthService,
    pub journal: JournalService,
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub max_body_bytes: usize,
}

impl AppStateInner {
    /// Wire both services onto the same storage handle.
    pub fn new(
        db: Arc<Database>,
        jwt_secret: String,
        session_ttl: Duration,
        max_body_bytes: usize,
    ) -> AppState {
        Arc::new(Self {
            auth: AuthService::new(db.clone()),
            journal: JournalService::new(db),
            jwt_secret,
            session_ttl,
            max_body_bytes,
        })
    }
}
