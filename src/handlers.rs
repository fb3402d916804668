use crate::{
    AppState,
    auth::{AuthClaims, issue_token},
    errors::ApiError,
    models::{
        AdminStatus, Blog, DeleteOutcome, InsertOutcome, TokenResponse, UpdateBlogRequest,
        UpdateOutcome, User,
    },
};
use axum::{
    Json,
    extract::{Path, State},
};
use mongodb::bson::{Document, oid::ObjectId};
use serde_json::Value;

/// Number of records returned by the fixed "recent blogs" listing.
const RECENT_BLOG_LIMIT: i64 = 3;

/// Parses a path parameter as a record identifier, rejecting malformed input
/// with a 400 instead of letting it reach the driver.
fn parse_object_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::bad_request(format!("invalid id: {raw}")))
}

// --- Token Service ---

/// issue_jwt
///
/// [Public Route] Signs the posted JSON object into a bearer token with a
/// fixed expiry. No validation is performed on the payload shape beyond it
/// being an object; whatever the client sends becomes the claims.
#[utoipa::path(
    post,
    path = "/jwt",
    request_body = Object,
    responses((status = 200, description = "Signed token", body = TokenResponse))
)]
pub async fn issue_jwt(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = issue_token(payload, &state.config.jwt_secret, state.config.token_ttl_secs)?;
    Ok(Json(TokenResponse { token }))
}

// --- User Directory ---

/// upsert_user
///
/// [Public Route] Replaces/creates the record matching the email in the path
/// with the posted fields. Deliberately unauthenticated for parity with the
/// published API (the frontend calls it right after sign-in).
#[utoipa::path(
    put,
    path = "/users/{email}",
    params(("email" = String, Path, description = "Business key of the user record")),
    request_body = Object,
    responses((status = 200, description = "Upsert counters", body = UpdateOutcome))
)]
pub async fn upsert_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(payload): Json<Document>,
) -> Result<Json<UpdateOutcome>, ApiError> {
    let result = state.repo.upsert_user(&email, payload).await?;
    Ok(Json(result))
}

/// list_users
///
/// [Admin Route] Returns every user record. The caller must present a valid
/// token AND the record matching the claimed email must carry the "Admin"
/// role; absent claims fail closed with a 403.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 401, description = "Missing/invalid token"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_users(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    let email = claims.email.as_deref().ok_or(ApiError::Forbidden)?;
    let requester = state.repo.get_user(email).await?;
    if !requester.map(|u| u.is_admin()).unwrap_or(false) {
        return Err(ApiError::Forbidden);
    }

    let users = state.repo.list_users().await?;
    Ok(Json(users))
}

/// get_user
///
/// [Public Route] Returns the single record matching the email, or `null`
/// when absent (no 404, reference behavior).
#[utoipa::path(
    get,
    path = "/users/{email}",
    params(("email" = String, Path, description = "Business key of the user record")),
    responses((status = 200, description = "User or null", body = User))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Option<User>>, ApiError> {
    let user = state.repo.get_user(&email).await?;
    Ok(Json(user))
}

/// promote_user
///
/// [Authenticated Route] Sets `role: "Admin"` on the record with the given
/// identifier. Any authenticated caller may promote any user; there is no
/// admin check here, preserved from the published API (see DESIGN.md).
#[utoipa::path(
    patch,
    path = "/users/admin/{id}",
    params(("id" = String, Path, description = "Record identifier (hex)")),
    responses(
        (status = 200, description = "Update counters", body = UpdateOutcome),
        (status = 400, description = "Malformed identifier")
    )
)]
pub async fn promote_user(
    _claims: AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UpdateOutcome>, ApiError> {
    let oid = parse_object_id(&id)?;
    let result = state.repo.promote_user(oid).await?;
    Ok(Json(result))
}

/// check_admin
///
/// [Authenticated Route] Reports whether the queried email belongs to an
/// admin. A caller asking about an email other than their own gets
/// `{admin: false}` immediately — the lookup is skipped entirely, and exactly
/// one response is sent.
#[utoipa::path(
    get,
    path = "/users/admin/{email}",
    params(("email" = String, Path, description = "Email to check")),
    responses((status = 200, description = "Admin flag", body = AdminStatus))
)]
pub async fn check_admin(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<AdminStatus>, ApiError> {
    // Identity check: callers may only query their own admin status.
    if claims.email.as_deref() != Some(email.as_str()) {
        return Ok(Json(AdminStatus { admin: false }));
    }

    let user = state.repo.get_user(&email).await?;
    let admin = user.map(|u| u.is_admin()).unwrap_or(false);
    Ok(Json(AdminStatus { admin }))
}

/// delete_user
///
/// [Authenticated Route] Removes the record with the given identifier.
/// Deleting an unknown identifier reports `deletedCount: 0`, not an error.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = String, Path, description = "Record identifier (hex)")),
    responses(
        (status = 200, description = "Delete counters", body = DeleteOutcome),
        (status = 400, description = "Malformed identifier")
    )
)]
pub async fn delete_user(
    _claims: AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    let oid = parse_object_id(&id)?;
    let result = state.repo.delete_user(oid).await?;
    Ok(Json(result))
}

// --- Blog Store ---

/// create_blog
///
/// [Authenticated Route] Inserts the posted document as a new blog record.
/// An empty payload is rejected with a 400 before touching the store.
#[utoipa::path(
    post,
    path = "/blogs",
    request_body = Object,
    responses(
        (status = 200, description = "Inserted identifier", body = InsertOutcome),
        (status = 400, description = "Empty payload")
    )
)]
pub async fn create_blog(
    _claims: AuthClaims,
    State(state): State<AppState>,
    Json(payload): Json<Document>,
) -> Result<Json<InsertOutcome>, ApiError> {
    if payload.is_empty() {
        return Err(ApiError::bad_request("Data not found, Not Valid Request."));
    }
    let result = state.repo.insert_blog(payload).await?;
    Ok(Json(result))
}

/// list_blogs
///
/// [Public Route] Returns all blog records, most recently created first
/// (identifier descending).
#[utoipa::path(
    get,
    path = "/blogs",
    responses((status = 200, description = "All blogs, newest first", body = [Blog]))
)]
pub async fn list_blogs(State(state): State<AppState>) -> Result<Json<Vec<Blog>>, ApiError> {
    let blogs = state.repo.list_blogs().await?;
    Ok(Json(blogs))
}

/// recent_blogs
///
/// [Public Route] Same ordering as the full listing, limited to the first
/// three records (homepage teaser).
#[utoipa::path(
    get,
    path = "/blogs/fixed",
    responses((status = 200, description = "Three newest blogs", body = [Blog]))
)]
pub async fn recent_blogs(State(state): State<AppState>) -> Result<Json<Vec<Blog>>, ApiError> {
    let blogs = state.repo.recent_blogs(RECENT_BLOG_LIMIT).await?;
    Ok(Json(blogs))
}

/// get_blog
///
/// [Public Route] Returns one record by identifier, or `null` when absent.
/// Served at both `/blogDetails/{id}` and `/blogs/{id}`: the detail view and
/// the pre-fill-before-update read share identical semantics.
#[utoipa::path(
    get,
    path = "/blogDetails/{id}",
    params(("id" = String, Path, description = "Record identifier (hex)")),
    responses(
        (status = 200, description = "Blog or null", body = Blog),
        (status = 400, description = "Malformed identifier")
    )
)]
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Blog>>, ApiError> {
    let oid = parse_object_id(&id)?;
    let blog = state.repo.get_blog(oid).await?;
    Ok(Json(blog))
}

/// delete_blog
///
/// [Public Route] Removes a blog record by identifier. Left unauthenticated
/// for parity with the published API (see DESIGN.md for the policy note).
#[utoipa::path(
    delete,
    path = "/blogs/{id}",
    params(("id" = String, Path, description = "Record identifier (hex)")),
    responses(
        (status = 200, description = "Delete counters", body = DeleteOutcome),
        (status = 400, description = "Malformed identifier")
    )
)]
pub async fn delete_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    let oid = parse_object_id(&id)?;
    let result = state.repo.delete_blog(oid).await?;
    Ok(Json(result))
}

/// update_blog
///
/// [Authenticated Route] Replaces exactly the whitelisted content fields on
/// the matching record. An unknown identifier upserts a partial record
/// rather than failing; the counters in the response tell the two cases
/// apart (`matchedCount: 0` + `upsertedId`).
#[utoipa::path(
    put,
    path = "/blogs/update/{id}",
    params(("id" = String, Path, description = "Record identifier (hex)")),
    request_body = UpdateBlogRequest,
    responses(
        (status = 200, description = "Update counters", body = UpdateOutcome),
        (status = 400, description = "Malformed identifier")
    )
)]
pub async fn update_blog(
    _claims: AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBlogRequest>,
) -> Result<Json<UpdateOutcome>, ApiError> {
    let oid = parse_object_id(&id)?;
    let result = state.repo.update_blog(oid, payload).await?;
    Ok(Json(result))
}
