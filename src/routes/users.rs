use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// User Directory Router Module
///
/// CRUD over the `users` collection, keyed by email, plus the admin
/// promotion and admin-check operations.
///
/// Access Control:
/// The tiers are uneven by design, mirroring the published API — see
/// DESIGN.md for the parity decision. Upsert and single-record reads are
/// public; listing requires a token AND the "Admin" role; promotion and
/// deletion require only a token.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        // GET /users
        // Lists every user record. Admin-gated: the requester's stored role
        // must be exactly "Admin".
        .route("/users", get(handlers::list_users))
        // PUT /users/{email}    — upsert the record for that email (public).
        // GET /users/{email}    — fetch the record, or null (public).
        // DELETE /users/{email} — remove a record; the path segment is a
        //                         record identifier for this verb, not an
        //                         email (token required).
        .route(
            "/users/{email}",
            put(handlers::upsert_user)
                .get(handlers::get_user)
                .delete(handlers::delete_user),
        )
        // PATCH /users/admin/{email} — promote the record with that id to
        //                              "Admin"; the segment is an identifier
        //                              for this verb (token required, no
        //                              admin check — published behavior).
        // GET /users/admin/{email}   — report whether that email is an
        //                              admin; callers may only query their
        //                              own email (token required).
        .route(
            "/users/admin/{email}",
            get(handlers::check_admin).patch(handlers::promote_user),
        )
}
