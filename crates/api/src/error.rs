//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ledgerline_core::ledger::LedgerError;
use ledgerline_shared::ErrorCategory;
use serde_json::json;
use tracing::{error, warn};

/// A ledger error on its way to the client.
///
/// The status comes from the error's category; the body is
/// `{"error": <ERROR_CODE>, "message": <text>}`.
#[derive(Debug)]
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let category = self.0.category();
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if matches!(category, ErrorCategory::Store | ErrorCategory::InternalInvariant) {
            error!(error = %self.0, code = self.0.error_code(), "Request failed");
        } else if self.0.is_retryable() {
            warn!(error = %self.0, code = self.0.error_code(), "Request lost a race");
        }

        let message = match category {
            ErrorCategory::Store => "A storage error occurred".to_string(),
            _ => self.0.to_string(),
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message,
            })),
        )
            .into_response()
    }
}
