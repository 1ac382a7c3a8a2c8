use async_trait::async_trait;
use bson::doc;
use chrono::{Datelike, Utc};
use futures::future::try_join_all;
use futures::TryStreamExt;
use mongodb::Database;

use crate::error::AppError;
use crate::export::transform::transform_document;

/// Collection whose export must not carry credential sub-fields.
const SENSITIVE_COLLECTION: &str = "users";

/// Trait for blob storage operations (S3-compatible).
///
/// Abstracted as a trait so tests can use a recording fake without a real
/// S3 instance.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Upload content to the given key.
    async fn put_object(&self, key: &str, content: Vec<u8>) -> Result<(), AppError>;
}

/// S3 implementation of StorageClient.
pub struct S3StorageClient {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3StorageClient {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl StorageClient for S3StorageClient {
    async fn put_object(&self, key: &str, content: Vec<u8>) -> Result<(), AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(content.into())
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to put object '{}': {}", key, e)))?;

        Ok(())
    }
}

/// Which collections a snapshot run covers.
#[derive(Debug, Clone)]
pub enum SnapshotScope {
    All,
    /// Explicit allow-list; everything else is excluded.
    Collections(Vec<String>),
}

impl SnapshotScope {
    /// An empty allow-list degrades to a full export rather than a silent
    /// no-op.
    pub fn from_allow_list(allow_list: Vec<String>) -> Self {
        if allow_list.is_empty() {
            SnapshotScope::All
        } else {
            SnapshotScope::Collections(allow_list)
        }
    }

    fn includes(&self, name: &str) -> bool {
        match self {
            SnapshotScope::All => true,
            SnapshotScope::Collections(names) => names.iter().any(|n| n == name),
        }
    }
}

/// Date-partitioned object key, UTC, month and day unpadded to match the
/// layout downstream consumers already read.
pub fn snapshot_key(now: chrono::DateTime<Utc>, collection: &str) -> String {
    format!(
        "{}-{}-{}/{}.json",
        now.year(),
        now.month(),
        now.day(),
        collection
    )
}

/// Exports every in-scope collection as one JSON object per collection.
pub struct SnapshotExporter<'a> {
    db: &'a Database,
    storage: &'a dyn StorageClient,
}

impl<'a> SnapshotExporter<'a> {
    pub fn new(db: &'a Database, storage: &'a dyn StorageClient) -> Self {
        Self { db, storage }
    }

    /// Run the export. Per-collection tasks run concurrently and are all
    /// joined; a single failed fetch or upload aborts the whole job with
    /// no partial-success tolerance.
    pub async fn export(&self, scope: SnapshotScope) -> Result<(), AppError> {
        let collections = self
            .db
            .list_collection_names()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let now = Utc::now();
        let tasks = collections
            .into_iter()
            .filter(|name| scope.includes(name))
            .map(|name| self.export_collection(name, now));

        try_join_all(tasks).await?;
        Ok(())
    }

    async fn export_collection(
        &self,
        name: String,
        now: chrono::DateTime<Utc>,
    ) -> Result<(), AppError> {
        let collection = self.db.collection::<bson::Document>(&name);

        let mut find = collection.find(doc! {});
        if name == SENSITIVE_COLLECTION {
            find = find.projection(doc! { "password": 0 });
        }

        let documents: Vec<bson::Document> = find
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let transformed: Vec<serde_json::Value> =
            documents.iter().map(transform_document).collect();
        let body = serde_json::to_vec(&transformed)
            .map_err(|e| AppError::Internal(format!("Failed to serialize '{}': {}", name, e)))?;

        let key = snapshot_key(now, &name);
        self.storage.put_object(&key, body).await?;

        tracing::info!(collection = %name, key = %key, documents = transformed.len(), "Exported collection");
        Ok(())
    }
}
