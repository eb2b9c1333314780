//! Journal entry routes: balance check, create, edit, and lifecycle.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use ledgerline_core::ledger::{BalanceCheck, EntryHeader, JournalEntry, LineInput};
use ledgerline_shared::types::JournalEntryId;
use serde::Deserialize;

use crate::{ActorId, ApiError, AppState};

/// Creates the journal entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/journal-entries/validate", post(validate_balance))
        .route("/journal-entries", post(create_entry))
        .route(
            "/journal-entries/{id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/journal-entries/{id}/submit", post(submit_entry))
        .route("/journal-entries/{id}/approve", post(approve_entry))
        .route("/journal-entries/{id}/void", post(void_entry))
}

/// Request body for a balance check.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    /// Candidate lines.
    pub lines: Vec<LineInput>,
}

/// Request body for creating or replacing an entry.
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    /// Date, description, period, and tagging.
    #[serde(flatten)]
    pub header: EntryHeader,
    /// Lines in input order.
    pub lines: Vec<LineInput>,
}

/// Request body for voiding an entry.
#[derive(Debug, Deserialize)]
pub struct VoidRequest {
    /// Why the entry is voided.
    #[serde(default)]
    pub reason: String,
}

/// POST `/journal-entries/validate` - Check lines without writing anything.
async fn validate_balance(
    State(state): State<AppState>,
    Json(payload): Json<ValidateRequest>,
) -> Result<Json<BalanceCheck>, ApiError> {
    Ok(Json(state.journal.validate_balance(&payload.lines).await?))
}

/// POST `/journal-entries` - Create a draft entry.
async fn create_entry(
    State(state): State<AppState>,
    actor: ActorId,
    Json(payload): Json<EntryRequest>,
) -> Result<(StatusCode, Json<JournalEntry>), ApiError> {
    let entry = state
        .journal
        .create(payload.header, &payload.lines, actor.user_id())
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET `/journal-entries/{id}` - Load an entry with its lines.
async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<JournalEntryId>,
) -> Result<Json<JournalEntry>, ApiError> {
    Ok(Json(state.journal.get(id).await?))
}

/// PUT `/journal-entries/{id}` - Replace header and lines of an editable entry.
async fn update_entry(
    State(state): State<AppState>,
    actor: ActorId,
    Path(id): Path<JournalEntryId>,
    Json(payload): Json<EntryRequest>,
) -> Result<Json<JournalEntry>, ApiError> {
    let entry = state
        .journal
        .update(id, payload.header, &payload.lines, actor.user_id())
        .await?;
    Ok(Json(entry))
}

/// POST `/journal-entries/{id}/submit` - Send a draft for approval.
async fn submit_entry(
    State(state): State<AppState>,
    actor: ActorId,
    Path(id): Path<JournalEntryId>,
) -> Result<Json<JournalEntry>, ApiError> {
    Ok(Json(state.journal.submit(id, actor.user_id()).await?))
}

/// POST `/journal-entries/{id}/approve` - Approve a draft or pending entry.
async fn approve_entry(
    State(state): State<AppState>,
    actor: ActorId,
    Path(id): Path<JournalEntryId>,
) -> Result<Json<JournalEntry>, ApiError> {
    Ok(Json(state.journal.approve(id, actor.user_id()).await?))
}

/// POST `/journal-entries/{id}/void` - Void a draft or pending entry.
async fn void_entry(
    State(state): State<AppState>,
    actor: ActorId,
    Path(id): Path<JournalEntryId>,
    Json(payload): Json<VoidRequest>,
) -> Result<Json<JournalEntry>, ApiError> {
    let entry = state
        .journal
        .void(id, actor.user_id(), &payload.reason)
        .await?;
    Ok(Json(entry))
}

/// DELETE `/journal-entries/{id}` - Remove a draft or pending entry.
async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<JournalEntryId>,
) -> Result<StatusCode, ApiError> {
    state.journal.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
