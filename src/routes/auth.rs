use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Auth Router Module
///
/// The token issuance gateway. The frontend posts the signed-in user's
/// payload here right after authentication and stores the returned bearer
/// token for subsequent protected calls.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        // POST /jwt
        // Signs an arbitrary claims payload (typically `{email}`) into a
        // bearer token with a fixed one-day expiry.
        .route("/jwt", post(handlers::issue_jwt))
}
