use mongodb::bson::{Bson, Document, oid::ObjectId};
use mongodb::results::{DeleteResult, InsertOneResult, UpdateResult};
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Collections) ---

/// Serializes a record identifier as the plain hex string the wire format
/// uses (clients read `_id` directly to build detail/promote/delete URLs,
/// so it must not render as the extended-JSON `{"$oid": ...}` form).
fn serialize_id_as_hex<S>(id: &Option<ObjectId>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match id {
        Some(oid) => serializer.serialize_str(&oid.to_hex()),
        None => serializer.serialize_none(),
    }
}

/// User
///
/// A record in the `users` collection. The email is the business key used for
/// lookups and upserts; `role` is the RBAC field and is only ever unset or
/// the literal `"Admin"`. Clients may attach arbitrary additional profile
/// fields, which are kept verbatim in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct User {
    #[serde(
        rename = "_id",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_id_as_hex"
    )]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Any extra fields the client supplied at upsert time.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Document,
}

impl User {
    /// Whether this record carries the administrator role.
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("Admin")
    }
}

/// Blog
///
/// A record in the `blogs` collection. Field names follow the published wire
/// format (`blogTitle`, `blogCategory`, ...). All content fields are optional
/// because an update-upsert on a missing id creates a record holding only the
/// whitelisted fields that were supplied.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct Blog {
    #[serde(
        rename = "_id",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_id_as_hex"
    )]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    #[serde(rename = "blogTitle", skip_serializing_if = "Option::is_none")]
    pub blog_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "blogCategory", skip_serializing_if = "Option::is_none")]
    pub blog_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Any extra fields the client supplied at creation time.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Document,
}

/// --- Request Payloads (Input Schemas) ---

/// UpdateBlogRequest
///
/// Partial update payload for `PUT /blogs/update/{id}`. Exactly these five
/// fields are replaced on the matching record; anything else the client
/// submits is silently dropped. Fields left out stay untouched.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateBlogRequest {
    #[serde(rename = "blogTitle", skip_serializing_if = "Option::is_none")]
    pub blog_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(rename = "blogCategory", skip_serializing_if = "Option::is_none")]
    pub blog_category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// --- Response Schemas (Output) ---

/// TokenResponse
///
/// Output of `POST /jwt`: the signed bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct TokenResponse {
    pub token: String,
}

/// AdminStatus
///
/// Output of the admin check (`GET /users/admin/{email}`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct AdminStatus {
    pub admin: bool,
}

// --- Write Outcomes (Raw Store Result Passthrough) ---
//
// Successful writes return the driver's result counters unmodified, in the
// camelCase shape the original API published. Consumers read these fields
// (e.g. `upsertedId` to navigate to a freshly created record), so the shape
// is part of the external contract.

/// Renders a driver-generated identifier as a plain hex string.
fn bson_id_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

/// UpdateOutcome
///
/// Counters for update/upsert operations (`matchedCount`, `modifiedCount`,
/// `upsertedCount`, `upsertedId`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upserted_id: Option<String>,
}

impl From<UpdateResult> for UpdateOutcome {
    fn from(res: UpdateResult) -> Self {
        let upserted_id = res.upserted_id.as_ref().map(bson_id_string);
        Self {
            acknowledged: true,
            matched_count: res.matched_count,
            modified_count: res.modified_count,
            upserted_count: upserted_id.is_some() as u64,
            upserted_id,
        }
    }
}

/// DeleteOutcome
///
/// Counter for delete operations. A delete that matched nothing reports
/// `deletedCount: 0` rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl From<DeleteResult> for DeleteOutcome {
    fn from(res: DeleteResult) -> Self {
        Self {
            acknowledged: true,
            deleted_count: res.deleted_count,
        }
    }
}

/// InsertOutcome
///
/// Identifier of a freshly inserted record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl From<InsertOneResult> for InsertOutcome {
    fn from(res: InsertOneResult) -> Self {
        Self {
            acknowledged: true,
            inserted_id: bson_id_string(&res.inserted_id),
        }
    }
}
