//! Period close and reopen routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use ledgerline_core::period::{MonthlyPeriod, Readiness, ReopenOutcome, ReopenRequest};
use ledgerline_shared::types::{AccountId, MonthlyPeriodId};
use serde::Deserialize;

use crate::{ActorId, ApiError, AppState};

/// Creates the period routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/periods/{id}/close", post(close_period))
        .route("/periods/{source}/reopen-readiness", get(reopen_readiness))
        .route("/periods/{source}/reopen", post(reopen_period))
}

/// Query string for the readiness check.
#[derive(Debug, Deserialize)]
pub struct ReadinessQuery {
    /// Period that would receive the opening entry.
    pub target: MonthlyPeriodId,
}

/// Request body for a period transition.
#[derive(Debug, Deserialize)]
pub struct ReopenBody {
    /// Open, empty period receiving the opening entry.
    pub target_period_id: MonthlyPeriodId,
    /// Date of the opening entry; defaults to the target's first day.
    #[serde(default)]
    pub opening_date: Option<NaiveDate>,
    /// Notes stored on the opening entry.
    #[serde(default)]
    pub notes: Option<String>,
    /// Equity account receiving the source period's result.
    #[serde(default)]
    pub retained_earnings_account: Option<AccountId>,
}

/// POST `/periods/{id}/close` - Close a period once all its entries are finished.
async fn close_period(
    State(state): State<AppState>,
    actor: ActorId,
    Path(id): Path<MonthlyPeriodId>,
) -> Result<Json<MonthlyPeriod>, ApiError> {
    Ok(Json(state.periods.close_period(id, actor.user_id()).await?))
}

/// GET `/periods/{source}/reopen-readiness?target=` - Report reopening preconditions.
async fn reopen_readiness(
    State(state): State<AppState>,
    Path(source): Path<MonthlyPeriodId>,
    Query(query): Query<ReadinessQuery>,
) -> Result<Json<Readiness>, ApiError> {
    let readiness = state
        .periods
        .verify_ready_for_reopening(source, query.target)
        .await?;
    Ok(Json(readiness))
}

/// POST `/periods/{source}/reopen` - Carry closing balances into the target period.
async fn reopen_period(
    State(state): State<AppState>,
    actor: ActorId,
    Path(source): Path<MonthlyPeriodId>,
    Json(body): Json<ReopenBody>,
) -> Result<(StatusCode, Json<ReopenOutcome>), ApiError> {
    let opening_date = match body.opening_date {
        Some(date) => date,
        None => state.periods.get(body.target_period_id).await?.start_date,
    };

    let outcome = state
        .periods
        .reopen_period(ReopenRequest {
            source_period_id: source,
            target_period_id: body.target_period_id,
            actor: actor.user_id(),
            opening_date,
            notes: body.notes,
            retained_earnings_account: body.retained_earnings_account,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
