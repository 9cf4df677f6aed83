//! Database row types. These map directly to SQLite rows and stay
//! independent of the happy-types API models.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
}

pub struct MomentRow {
    pub id: i64,
    pub user_id: i64,
    pub note: String,
    pub image: Option<Vec<u8>>,
    pub created_at: String,
}
