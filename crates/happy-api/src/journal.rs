use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;
use tracing::info;

use happy_db::Database;
use happy_db::models::MomentRow;
use happy_types::api::{MomentResponse, SaveMomentRequest, SaveMomentResponse};
use happy_types::models::{HappyMoment, ImageFormat, MomentId, UserId};

use crate::AppState;
use crate::error::{ApiError, JournalError, run_blocking};
use crate::middleware::Session;

#[derive(Clone)]
pub struct JournalService {
    db: Arc<Database>,
}

impl JournalService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a moment stamped with the current time. Image bytes are kept
    /// exactly as given.
    pub fn save_moment(
        &self,
        user_id: UserId,
        note: &str,
        image: Option<Vec<u8>>,
    ) -> Result<HappyMoment, JournalError> {
        if note.trim().is_empty() {
            return Err(JournalError::EmptyNote);
        }

        // Stored with microsecond precision
        let created_at = Utc::now().trunc_subsecs(6);
        let id = self
            .db
            .insert_moment(user_id.0, note, image.as_deref(), created_at)?;

        info!(
            "Saved moment {} for user {} (image: {})",
            id,
            user_id,
            image.as_ref().map_or(0, Vec::len)
        );

        Ok(HappyMoment {
            id: MomentId(id),
            user_id,
            note: note.to_string(),
            image,
            created_at,
        })
    }

    pub fn random_moment(&self, user_id: UserId) -> Result<HappyMoment, JournalError> {
        self.random_moment_with(user_id, &mut rand::rng())
    }

    /// Uniform pick over every moment the user owns.
    pub fn random_moment_with<R: Rng>(
        &self,
        user_id: UserId,
        rng: &mut R,
    ) -> Result<HappyMoment, JournalError> {
        let mut rows = self.db.list_moments_by_user(user_id.0)?;
        if rows.is_empty() {
            return Err(JournalError::NoMoments);
        }

        let idx = rng.random_range(0..rows.len());
        into_moment(rows.swap_remove(idx))
    }
}

fn into_moment(row: MomentRow) -> Result<HappyMoment, JournalError> {
    let created_at = DateTime::parse_from_rfc3339(&row.created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| JournalError::CorruptTimestamp {
            id: row.id,
            raw: row.created_at.clone(),
        })?;

    Ok(HappyMoment {
        id: MomentId(row.id),
        user_id: UserId(row.user_id),
        note: row.note,
        image: row.image,
        created_at,
    })
}

/// POST /moments
pub async fn save_moment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<SaveMomentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let image = req
        .image
        .as_deref()
        .map(|encoded| B64.decode(encoded))
        .transpose()
        .map_err(|_| ApiError::bad_request("Image is not valid base64."))?;

    // The upload form only offers PNG and JPEG files.
    if let Some(bytes) = image.as_deref() {
        if !bytes.is_empty() && ImageFormat::sniff(bytes).is_none() {
            return Err(ApiError::bad_request("Only PNG and JPEG images are supported."));
        }
    }

    let journal = state.journal.clone();
    let note = req.note;
    let moment =
        run_blocking(move || journal.save_moment(session.user_id, &note, image)).await?;

    Ok((
        StatusCode::CREATED,
        Json(SaveMomentResponse {
            id: moment.id,
            created_at: moment.created_at,
        }),
    ))
}

/// GET /moments/random
pub async fn random_moment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<MomentResponse>, ApiError> {
    let journal = state.journal.clone();
    let moment = run_blocking(move || journal.random_moment(session.user_id)).await?;

    let image_type = moment
        .image
        .as_deref()
        .and_then(ImageFormat::sniff)
        .map(|format| format.mime_type().to_string());

    Ok(Json(MomentResponse {
        id: moment.id,
        note: moment.note,
        image: moment.image.as_deref().map(|bytes| B64.encode(bytes)),
        image_type,
        created_at: moment.created_at,
    }))
}
