//! Request extractors.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use ledgerline_shared::types::UserId;
use serde_json::json;

/// Header naming the user performing the request.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// The acting user, read from the `X-Actor-Id` header.
///
/// Identity is established upstream; the header is trusted as-is.
///
/// ```ignore
/// async fn handler(actor: ActorId) -> impl IntoResponse {
///     let user_id = actor.user_id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ActorId(pub UserId);

impl ActorId {
    /// Returns the user ID.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.0
    }
}

impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(ACTOR_HEADER) else {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "MISSING_ACTOR",
                    "message": "X-Actor-Id header is required"
                })),
            ));
        };

        raw.to_str()
            .ok()
            .and_then(|value| value.trim().parse::<UserId>().ok())
            .map(ActorId)
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "INVALID_ACTOR",
                        "message": "X-Actor-Id header must be a UUID"
                    })),
                )
            })
    }
}
