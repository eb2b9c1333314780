//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes for journal entries and period transitions
//! - The `X-Actor-Id` extractor
//! - Mapping of ledger errors to JSON error responses

pub mod error;
pub mod extractors;
pub mod routes;

use axum::Router;
use ledgerline_core::journal::JournalService;
use ledgerline_core::period::PeriodService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use extractors::ActorId;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Journal entry lifecycle operations.
    pub journal: JournalService,
    /// Period close and reopen operations.
    pub periods: PeriodService,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
