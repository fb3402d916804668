use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Blog Store Router Module
///
/// CRUD over the `blogs` collection. Reads are public; creation and update
/// require a token; deletion is public for parity with the published API
/// (flagged in DESIGN.md).
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        // POST /blogs — insert a new record (token required, empty body 400).
        // GET /blogs  — list all records, newest identifier first (public).
        .route("/blogs", post(handlers::create_blog).get(handlers::list_blogs))
        // GET /blogs/fixed
        // The three newest records, same ordering as the full listing.
        .route("/blogs/fixed", get(handlers::recent_blogs))
        // GET /blogs/{id}    — fetch one record (pre-fill-before-update read).
        // DELETE /blogs/{id} — remove one record (public, parity).
        .route(
            "/blogs/{id}",
            get(handlers::get_blog).delete(handlers::delete_blog),
        )
        // PUT /blogs/update/{id}
        // Replace the whitelisted content fields; unknown id upserts a
        // partial record (token required).
        .route("/blogs/update/{id}", put(handlers::update_blog))
        // GET /blogDetails/{id}
        // Duplicate of GET /blogs/{id} kept for the detail view, identical
        // semantics.
        .route("/blogDetails/{id}", get(handlers::get_blog))
}
