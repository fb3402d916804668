/// Router Module Index
///
/// Organizes the application's routing logic into per-resource modules that
/// are merged in `create_router`. Authentication is enforced per handler via
/// the `AuthClaims` extractor rather than per module: several resources mix
/// public and protected verbs on the same path, so the gate lives on the
/// handler signature where it cannot be bypassed.

/// Token issuance (`POST /jwt`).
pub mod auth;

/// User directory routes (upsert, listing, admin promotion/check, delete).
pub mod users;

/// Blog store routes (create, listings, detail, update, delete).
pub mod blogs;
