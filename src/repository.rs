use crate::errors::ApiError;
use crate::models::{Blog, DeleteOutcome, InsertOutcome, UpdateBlogRequest, UpdateOutcome, User};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    Client, Collection,
    bson::{Document, doc, oid::ObjectId, to_document},
    options::{FindOptions, UpdateOptions},
};
use std::sync::Arc;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations over the two
/// document collections. Handlers interact with the data layer through this
/// trait without knowing the concrete implementation (MongoDB, in-memory, etc.),
/// which is also what makes the handler suite testable without a live store.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's asynchronous task
/// boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- User Directory ---

    /// Replaces/creates the record matching `email` with the supplied fields.
    async fn upsert_user(&self, email: &str, payload: Document) -> Result<UpdateOutcome, ApiError>;
    /// Every user record (admin listing).
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
    /// The single record matching `email`, if any.
    async fn get_user(&self, email: &str) -> Result<Option<User>, ApiError>;
    /// Sets `role: "Admin"` on the record with the given identifier.
    async fn promote_user(&self, id: ObjectId) -> Result<UpdateOutcome, ApiError>;
    async fn delete_user(&self, id: ObjectId) -> Result<DeleteOutcome, ApiError>;

    // --- Blog Store ---

    async fn insert_blog(&self, payload: Document) -> Result<InsertOutcome, ApiError>;
    /// All blog records, newest identifier first.
    async fn list_blogs(&self) -> Result<Vec<Blog>, ApiError>;
    /// Same ordering as `list_blogs`, limited to the first `limit` records.
    async fn recent_blogs(&self, limit: i64) -> Result<Vec<Blog>, ApiError>;
    async fn get_blog(&self, id: ObjectId) -> Result<Option<Blog>, ApiError>;
    async fn delete_blog(&self, id: ObjectId) -> Result<DeleteOutcome, ApiError>;
    /// Replaces the whitelisted content fields on the matching record.
    /// An unknown identifier upserts a partial record instead of failing.
    async fn update_blog(
        &self,
        id: ObjectId,
        req: UpdateBlogRequest,
    ) -> Result<UpdateOutcome, ApiError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// MongoRepository
///
/// The concrete implementation of the `Repository` trait, backed by the two
/// MongoDB collections. The collections hold the one long-lived client
/// session established at startup; dropping the repository releases it.
pub struct MongoRepository {
    users: Collection<User>,
    blogs: Collection<Blog>,
}

impl MongoRepository {
    /// Creates a new repository over the `users` and `blogs` collections of
    /// the configured database.
    pub fn new(client: &Client, db_name: &str) -> Self {
        let db = client.database(db_name);
        Self {
            users: db.collection("users"),
            blogs: db.collection("blogs"),
        }
    }
}

#[async_trait]
impl Repository for MongoRepository {
    /// upsert_user
    ///
    /// `$set`s the payload on the record matching `email`, creating it when
    /// absent. Uniqueness per email is a consequence of this upsert shape,
    /// not of a collection constraint.
    async fn upsert_user(&self, email: &str, payload: Document) -> Result<UpdateOutcome, ApiError> {
        let options = UpdateOptions::builder().upsert(true).build();
        let result = self
            .users
            .update_one(doc! { "email": email }, doc! { "$set": payload }, options)
            .await?;
        Ok(result.into())
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let cursor = self.users.find(doc! {}, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_user(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self.users.find_one(doc! { "email": email }, None).await?)
    }

    async fn promote_user(&self, id: ObjectId) -> Result<UpdateOutcome, ApiError> {
        let result = self
            .users
            .update_one(doc! { "_id": id }, doc! { "$set": { "role": "Admin" } }, None)
            .await?;
        Ok(result.into())
    }

    async fn delete_user(&self, id: ObjectId) -> Result<DeleteOutcome, ApiError> {
        let result = self.users.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.into())
    }

    /// insert_blog
    ///
    /// Inserts the client payload as-is; the driver generates the `_id`.
    async fn insert_blog(&self, payload: Document) -> Result<InsertOutcome, ApiError> {
        let result = self
            .blogs
            .clone_with_type::<Document>()
            .insert_one(payload, None)
            .await?;
        Ok(result.into())
    }

    async fn list_blogs(&self) -> Result<Vec<Blog>, ApiError> {
        let options = FindOptions::builder().sort(doc! { "_id": -1 }).build();
        let cursor = self.blogs.find(doc! {}, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn recent_blogs(&self, limit: i64) -> Result<Vec<Blog>, ApiError> {
        let options = FindOptions::builder()
            .sort(doc! { "_id": -1 })
            .limit(limit)
            .build();
        let cursor = self.blogs.find(doc! {}, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_blog(&self, id: ObjectId) -> Result<Option<Blog>, ApiError> {
        Ok(self.blogs.find_one(doc! { "_id": id }, None).await?)
    }

    async fn delete_blog(&self, id: ObjectId) -> Result<DeleteOutcome, ApiError> {
        let result = self.blogs.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.into())
    }

    /// update_blog
    ///
    /// `$set`s exactly the whitelisted fields carried by the request. With
    /// `upsert: true`, an update against an unknown identifier creates a
    /// record holding only those fields (the published API behavior).
    async fn update_blog(
        &self,
        id: ObjectId,
        req: UpdateBlogRequest,
    ) -> Result<UpdateOutcome, ApiError> {
        let fields = to_document(&req)?;
        // The server rejects `$set: {}`; a body with no updatable fields is
        // reported as a zero-count no-op instead of surfacing a 500.
        if fields.is_empty() {
            return Ok(UpdateOutcome {
                acknowledged: true,
                ..UpdateOutcome::default()
            });
        }
        let options = UpdateOptions::builder().upsert(true).build();
        let result = self
            .blogs
            .update_one(doc! { "_id": id }, doc! { "$set": fields }, options)
            .await?;
        Ok(result.into())
    }
}
