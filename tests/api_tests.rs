use async_trait::async_trait;
use mongodb::bson::{Document, doc, from_document, oid::ObjectId};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use visafast_backend::{
    AppState,
    config::AppConfig,
    create_router,
    errors::ApiError,
    models::{Blog, DeleteOutcome, InsertOutcome, UpdateBlogRequest, UpdateOutcome, User},
    repository::{Repository, RepositoryState},
};

// --- IN-MEMORY REPOSITORY ---

// Implements the full store contract over two in-process vectors so the
// whole route table can be exercised end-to-end without a running MongoDB.
// Semantics mirror the driver: upsert-by-email, `$set` field merging,
// identifier-descending listings, zero-count deletes for unknown ids.
#[derive(Default)]
struct MemoryRepository {
    users: Mutex<Vec<Document>>,
    blogs: Mutex<Vec<Document>>,
}

fn doc_id(d: &Document) -> ObjectId {
    d.get_object_id("_id").expect("record without _id")
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn upsert_user(&self, email: &str, payload: Document) -> Result<UpdateOutcome, ApiError> {
        let mut users = self.users.lock().unwrap();
        if let Some(existing) = users.iter_mut().find(|d| d.get_str("email") == Ok(email)) {
            for (k, v) in payload {
                existing.insert(k, v);
            }
            Ok(UpdateOutcome {
                acknowledged: true,
                matched_count: 1,
                modified_count: 1,
                upserted_count: 0,
                upserted_id: None,
            })
        } else {
            let id = ObjectId::new();
            let mut record = doc! { "_id": id, "email": email };
            for (k, v) in payload {
                record.insert(k, v);
            }
            users.push(record);
            Ok(UpdateOutcome {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
                upserted_count: 1,
                upserted_id: Some(id.to_hex()),
            })
        }
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let users = self.users.lock().unwrap();
        users
            .iter()
            .map(|d| from_document(d.clone()).map_err(ApiError::from))
            .collect()
    }

    async fn get_user(&self, email: &str) -> Result<Option<User>, ApiError> {
        let users = self.users.lock().unwrap();
        users
            .iter()
            .find(|d| d.get_str("email") == Ok(email))
            .map(|d| from_document(d.clone()).map_err(ApiError::from))
            .transpose()
    }

    async fn promote_user(&self, id: ObjectId) -> Result<UpdateOutcome, ApiError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|d| doc_id(d) == id) {
            Some(record) => {
                record.insert("role", "Admin");
                Ok(UpdateOutcome {
                    acknowledged: true,
                    matched_count: 1,
                    modified_count: 1,
                    upserted_count: 0,
                    upserted_id: None,
                })
            }
            None => Ok(UpdateOutcome {
                acknowledged: true,
                ..UpdateOutcome::default()
            }),
        }
    }

    async fn delete_user(&self, id: ObjectId) -> Result<DeleteOutcome, ApiError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|d| doc_id(d) != id);
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: (before - users.len()) as u64,
        })
    }

    async fn insert_blog(&self, mut payload: Document) -> Result<InsertOutcome, ApiError> {
        let id = ObjectId::new();
        payload.insert("_id", id);
        self.blogs.lock().unwrap().push(payload);
        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: id.to_hex(),
        })
    }

    async fn list_blogs(&self) -> Result<Vec<Blog>, ApiError> {
        let blogs = self.blogs.lock().unwrap();
        let mut sorted: Vec<Document> = blogs.clone();
        sorted.sort_by(|a, b| doc_id(b).cmp(&doc_id(a)));
        sorted
            .into_iter()
            .map(|d| from_document(d).map_err(ApiError::from))
            .collect()
    }

    async fn recent_blogs(&self, limit: i64) -> Result<Vec<Blog>, ApiError> {
        let mut all = self.list_blogs().await?;
        all.truncate(limit as usize);
        Ok(all)
    }

    async fn get_blog(&self, id: ObjectId) -> Result<Option<Blog>, ApiError> {
        let blogs = self.blogs.lock().unwrap();
        blogs
            .iter()
            .find(|d| doc_id(d) == id)
            .map(|d| from_document(d.clone()).map_err(ApiError::from))
            .transpose()
    }

    async fn delete_blog(&self, id: ObjectId) -> Result<DeleteOutcome, ApiError> {
        let mut blogs = self.blogs.lock().unwrap();
        let before = blogs.len();
        blogs.retain(|d| doc_id(d) != id);
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: (before - blogs.len()) as u64,
        })
    }

    async fn update_blog(
        &self,
        id: ObjectId,
        req: UpdateBlogRequest,
    ) -> Result<UpdateOutcome, ApiError> {
        let fields = mongodb::bson::to_document(&req)?;
        // Matches the store-backed repository: an empty `$set` never reaches
        // the driver and is reported as a zero-count no-op.
        if fields.is_empty() {
            return Ok(UpdateOutcome {
                acknowledged: true,
                ..UpdateOutcome::default()
            });
        }
        let mut blogs = self.blogs.lock().unwrap();
        match blogs.iter_mut().find(|d| doc_id(d) == id) {
            Some(record) => {
                for (k, v) in fields {
                    record.insert(k, v);
                }
                Ok(UpdateOutcome {
                    acknowledged: true,
                    matched_count: 1,
                    modified_count: 1,
                    upserted_count: 0,
                    upserted_id: None,
                })
            }
            None => {
                let mut record = doc! { "_id": id };
                for (k, v) in fields {
                    record.insert(k, v);
                }
                blogs.push(record);
                Ok(UpdateOutcome {
                    acknowledged: true,
                    matched_count: 0,
                    modified_count: 0,
                    upserted_count: 1,
                    upserted_id: Some(id.to_hex()),
                })
            }
        }
    }
}

// --- TEST APP SCAFFOLDING ---

struct TestApp {
    address: String,
    client: reqwest::Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Issues a bearer token for `email` through the real endpoint.
    async fn token_for(&self, email: &str) -> String {
        let response = self
            .client
            .post(self.url("/jwt"))
            .json(&json!({ "email": email }))
            .send()
            .await
            .expect("jwt request failed");
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().expect("token missing").to_string()
    }

    /// Seeds a user record and returns a token for it.
    async fn seed_user(&self, email: &str, payload: Value) -> String {
        let response = self
            .client
            .put(self.url(&format!("/users/{}", email)))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        self.token_for(email).await
    }
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::default()) as RepositoryState;
    let config = AppConfig::default();

    let state = AppState { repo, config };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

// --- Tests ---

#[tokio::test]
async fn test_liveness_banner() {
    let app = spawn_app().await;
    let response = app.client.get(app.url("/")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "Visa Fast Server is running..");
}

#[tokio::test]
async fn test_admin_listing_gates() {
    let app = spawn_app().await;

    // No token: rejected before the handler.
    let response = app.client.get(app.url("/users")).send().await.unwrap();
    assert_eq!(response.status(), 401);

    // Valid token, but the stored record has no Admin role.
    let user_token = app.seed_user("plain@example.com", json!({ "name": "Plain" })).await;
    let response = app
        .client
        .get(app.url("/users"))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], json!(true));

    // Admin role: full listing.
    let admin_token = app
        .seed_user("admin@example.com", json!({ "role": "Admin" }))
        .await;
    let response = app
        .client
        .get(app.url("/users"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let users: Vec<Value> = response.json().await.unwrap();
    assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn test_upsert_same_email_keeps_one_record() {
    let app = spawn_app().await;

    let first = app
        .client
        .put(app.url("/users/dup@example.com"))
        .json(&json!({ "name": "First" }))
        .send()
        .await
        .unwrap();
    let first: Value = first.json().await.unwrap();
    assert_eq!(first["upsertedCount"], json!(1));

    let second = app
        .client
        .put(app.url("/users/dup@example.com"))
        .json(&json!({ "name": "Second", "country": "BD" }))
        .send()
        .await
        .unwrap();
    let second: Value = second.json().await.unwrap();
    assert_eq!(second["matchedCount"], json!(1));
    assert!(second["upsertedId"].is_null());

    // The single stored record reflects the second payload.
    let response = app
        .client
        .get(app.url("/users/dup@example.com"))
        .send()
        .await
        .unwrap();
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["name"], json!("Second"));
    assert_eq!(user["country"], json!("BD"));

    let admin_token = app
        .seed_user("admin@example.com", json!({ "role": "Admin" }))
        .await;
    let listing: Vec<Value> = app
        .client
        .get(app.url("/users"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let matching = listing
        .iter()
        .filter(|u| u["email"] == json!("dup@example.com"))
        .count();
    assert_eq!(matching, 1);
}

#[tokio::test]
async fn test_unknown_user_reads_back_null() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(app.url("/users/ghost@example.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body.is_null());
}

#[tokio::test]
async fn test_blog_listing_order_and_fixed_limit() {
    let app = spawn_app().await;
    let token = app.token_for("author@example.com").await;

    for i in 1..=5 {
        let response = app
            .client
            .post(app.url("/blogs"))
            .bearer_auth(&token)
            .json(&json!({ "blogTitle": format!("Post {i}"), "blogCategory": "News" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let all: Vec<Value> = app
        .client
        .get(app.url("/blogs"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 5);
    // Most recently created first.
    assert_eq!(all[0]["blogTitle"], json!("Post 5"));
    assert_eq!(all[4]["blogTitle"], json!("Post 1"));

    let fixed: Vec<Value> = app
        .client
        .get(app.url("/blogs/fixed"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fixed.len(), 3);
    // The fixed listing is exactly the head of the full listing.
    assert_eq!(fixed.as_slice(), &all[..3]);
}

#[tokio::test]
async fn test_blog_lifecycle() {
    let app = spawn_app().await;
    let token = app.token_for("author@example.com").await;

    // Create.
    let created: Value = app
        .client
        .post(app.url("/blogs"))
        .bearer_auth(&token)
        .json(&json!({ "blogTitle": "Original", "description": "first draft" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["insertedId"].as_str().unwrap().to_string();

    // Detail read, both route spellings.
    for path in [format!("/blogDetails/{id}"), format!("/blogs/{id}")] {
        let blog: Value = app
            .client
            .get(app.url(&path))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(blog["blogTitle"], json!("Original"));
    }

    // Update replaces the whitelisted fields.
    let updated: Value = app
        .client
        .put(app.url(&format!("/blogs/update/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "blogTitle": "Revised", "date": "2024-03-01" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["matchedCount"], json!(1));

    let blog: Value = app
        .client
        .get(app.url(&format!("/blogDetails/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(blog["blogTitle"], json!("Revised"));
    assert_eq!(blog["date"], json!("2024-03-01"));
    // Fields outside the update payload survive.
    assert_eq!(blog["description"], json!("first draft"));

    // Delete, then delete again: the second pass reports zero.
    let deleted: Value = app
        .client
        .delete(app.url(&format!("/blogs/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deleted["deletedCount"], json!(1));

    let deleted_again: Value = app
        .client
        .delete(app.url(&format!("/blogs/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deleted_again["deletedCount"], json!(0));
}

#[tokio::test]
async fn test_update_unknown_blog_upserts_partial_record() {
    let app = spawn_app().await;
    let token = app.token_for("author@example.com").await;
    let id = ObjectId::new().to_hex();

    let outcome: Value = app
        .client
        .put(app.url(&format!("/blogs/update/{id}")))
        .bearer_auth(&token)
        // `tags` is outside the whitelist and must be dropped.
        .json(&json!({ "blogTitle": "Ghost post", "description": "appears", "tags": ["x"] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(outcome["matchedCount"], json!(0));
    assert_eq!(outcome["upsertedId"], json!(id));

    let blog: Value = app
        .client
        .get(app.url(&format!("/blogDetails/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(blog["blogTitle"], json!("Ghost post"));
    assert_eq!(blog["description"], json!("appears"));
    assert!(blog.get("tags").is_none() || blog["tags"].is_null());
}

#[tokio::test]
async fn test_create_blog_requires_token_and_payload() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/blogs"))
        .json(&json!({ "blogTitle": "No token" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let token = app.token_for("author@example.com").await;
    let response = app
        .client
        .post(app.url("/blogs"))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], json!(true));
}

#[tokio::test]
async fn test_check_admin_identity_rules() {
    let app = spawn_app().await;
    let admin_token = app
        .seed_user("admin@example.com", json!({ "role": "Admin" }))
        .await;
    let user_token = app.seed_user("user@example.com", json!({})).await;

    // Asking about someone else's email: flatly false.
    let body: Value = app
        .client
        .get(app.url("/users/admin/admin@example.com"))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["admin"], json!(false));

    // Own email, no role.
    let body: Value = app
        .client
        .get(app.url("/users/admin/user@example.com"))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["admin"], json!(false));

    // Own email, Admin role.
    let body: Value = app
        .client
        .get(app.url("/users/admin/admin@example.com"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["admin"], json!(true));
}

#[tokio::test]
async fn test_promote_and_delete_user_flow() {
    let app = spawn_app().await;
    let token = app.seed_user("member@example.com", json!({ "name": "Member" })).await;

    // Resolve the generated identifier from the public read.
    let user: Value = app
        .client
        .get(app.url("/users/member@example.com"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = user["_id"].as_str().expect("id missing").to_string();

    // Malformed identifier: 400, not a crash.
    let response = app
        .client
        .patch(app.url("/users/admin/not-an-id"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Promotion by any authenticated caller (published behavior).
    let outcome: Value = app
        .client
        .patch(app.url(&format!("/users/admin/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(outcome["modifiedCount"], json!(1));

    let user: Value = app
        .client
        .get(app.url("/users/member@example.com"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(user["role"], json!("Admin"));

    // Delete requires a token.
    let response = app
        .client
        .delete(app.url(&format!("/users/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let outcome: Value = app
        .client
        .delete(app.url(&format!("/users/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(outcome["deletedCount"], json!(1));

    let user: Value = app
        .client
        .get(app.url("/users/member@example.com"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(user.is_null());
}

#[tokio::test]
async fn test_record_ids_serialize_as_plain_hex() {
    let app = spawn_app().await;
    let token = app.seed_user("writer@example.com", json!({ "name": "Writer" })).await;

    // User reads publish `_id` as the raw hex string, not `{"$oid": ...}`.
    let user: Value = app
        .client
        .get(app.url("/users/writer@example.com"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let user_id = user["_id"].as_str().expect("user _id should be a string");
    assert_eq!(user_id.len(), 24);
    assert!(user_id.chars().all(|c| c.is_ascii_hexdigit()));

    // Blog reads publish the same shape, matching `insertedId`.
    let created: Value = app
        .client
        .post(app.url("/blogs"))
        .bearer_auth(&token)
        .json(&json!({ "blogTitle": "Shape check" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["insertedId"].as_str().unwrap();

    let blog: Value = app
        .client
        .get(app.url(&format!("/blogDetails/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(blog["_id"].as_str(), Some(id));
}

#[tokio::test]
async fn test_update_blog_with_no_fields_is_noop() {
    let app = spawn_app().await;
    let token = app.token_for("author@example.com").await;

    let created: Value = app
        .client
        .post(app.url("/blogs"))
        .bearer_auth(&token)
        .json(&json!({ "blogTitle": "Untouched", "description": "stays" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["insertedId"].as_str().unwrap().to_string();

    // A body carrying none of the whitelisted fields succeeds with zero
    // counts instead of erroring on an empty `$set`.
    let outcome = app
        .client
        .put(app.url(&format!("/blogs/update/{id}")))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(outcome.status(), 200);
    let outcome: Value = outcome.json().await.unwrap();
    assert_eq!(outcome["matchedCount"], json!(0));
    assert_eq!(outcome["modifiedCount"], json!(0));
    assert!(outcome["upsertedId"].is_null());

    // The record is untouched.
    let blog: Value = app
        .client
        .get(app.url(&format!("/blogDetails/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(blog["blogTitle"], json!("Untouched"));
    assert_eq!(blog["description"], json!("stays"));

    // Nor does an empty body against an unknown id create a ghost record.
    let ghost = ObjectId::new().to_hex();
    let outcome: Value = app
        .client
        .put(app.url(&format!("/blogs/update/{ghost}")))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(outcome["upsertedId"], json!(null));

    let missing: Value = app
        .client
        .get(app.url(&format!("/blogDetails/{ghost}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(missing.is_null());
}

#[tokio::test]
async fn test_update_blog_requires_token() {
    let app = spawn_app().await;
    let id = ObjectId::new().to_hex();

    let response = app
        .client
        .put(app.url(&format!("/blogs/update/{id}")))
        .json(&json!({ "blogTitle": "Anonymous edit" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_error_body_shape() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/users")).send().await.unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], json!(true));
    assert!(body["message"].is_string());
}
