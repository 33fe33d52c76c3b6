//! MongoDB playground: a direct CRUD/aggregation pass-through against a
//! user-chosen database.
//!
//! Every call is independently applied; there are no transaction semantics.
//! Driver failures surface as `Operation` errors carrying the engine's own
//! message. The trait exists so the HTTP surface can be tested with an
//! in-memory fake instead of a live deployment.

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Database, IndexModel};
use serde::Serialize;
use serde_json::Value;

use crate::client::mongo::drain_cursor;
use crate::error::{MeterError, MeterResult};

#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_collections(&self) -> MeterResult<Vec<String>>;
    async fn create_collection(&self, name: &str) -> MeterResult<()>;
    async fn drop_collection(&self, name: &str) -> MeterResult<()>;
    /// Inserts one document and returns its id.
    async fn insert_one(&self, collection: &str, document: Value) -> MeterResult<Value>;
    async fn find(&self, collection: &str, filter: Value) -> MeterResult<Vec<Value>>;
    async fn update_many(
        &self,
        collection: &str,
        filter: Value,
        update: Value,
    ) -> MeterResult<UpdateOutcome>;
    /// Returns the number of deleted documents.
    async fn delete_many(&self, collection: &str, filter: Value) -> MeterResult<u64>;
    async fn aggregate(&self, collection: &str, pipeline: Vec<Value>) -> MeterResult<Vec<Value>>;
    /// Creates an ascending single-field index and returns its name.
    async fn create_index(&self, collection: &str, field: &str) -> MeterResult<String>;
    async fn drop_index(&self, collection: &str, name: &str) -> MeterResult<()>;
}

pub struct MongoPlayground {
    db: Database,
}

impl MongoPlayground {
    pub fn new(client: &Client, database: &str) -> Self {
        MongoPlayground {
            db: client.database(database),
        }
    }
}

fn to_document(value: &Value) -> MeterResult<Document> {
    mongodb::bson::to_document(value)
        .map_err(|e| MeterError::Parse(format!("not a valid document: {}", e)))
}

fn op_err(e: impl std::fmt::Display) -> MeterError {
    MeterError::Operation(e.to_string())
}

#[async_trait]
impl DocumentStore for MongoPlayground {
    async fn list_collections(&self) -> MeterResult<Vec<String>> {
        let mut names = self.db.list_collection_names().await.map_err(op_err)?;
        names.sort();
        Ok(names)
    }

    async fn create_collection(&self, name: &str) -> MeterResult<()> {
        self.db.create_collection(name).await.map_err(op_err)
    }

    async fn drop_collection(&self, name: &str) -> MeterResult<()> {
        self.db
            .collection::<Document>(name)
            .drop()
            .await
            .map_err(op_err)
    }

    async fn insert_one(&self, collection: &str, document: Value) -> MeterResult<Value> {
        let document = to_document(&document)?;
        let result = self
            .db
            .collection::<Document>(collection)
            .insert_one(document)
            .await
            .map_err(op_err)?;
        Ok(result.inserted_id.into_relaxed_extjson())
    }

    async fn find(&self, collection: &str, filter: Value) -> MeterResult<Vec<Value>> {
        let filter = to_document(&filter)?;
        let cursor = self
            .db
            .collection::<Document>(collection)
            .find(filter)
            .await
            .map_err(op_err)?;
        drain_cursor(cursor).await
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Value,
        update: Value,
    ) -> MeterResult<UpdateOutcome> {
        let filter = to_document(&filter)?;
        let update = to_document(&update)?;
        let result = self
            .db
            .collection::<Document>(collection)
            .update_many(filter, update)
            .await
            .map_err(op_err)?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_many(&self, collection: &str, filter: Value) -> MeterResult<u64> {
        let filter = to_document(&filter)?;
        let result = self
            .db
            .collection::<Document>(collection)
            .delete_many(filter)
            .await
            .map_err(op_err)?;
        Ok(result.deleted_count)
    }

    async fn aggregate(&self, collection: &str, pipeline: Vec<Value>) -> MeterResult<Vec<Value>> {
        let stages: Vec<Document> = pipeline
            .iter()
            .map(to_document)
            .collect::<MeterResult<_>>()?;
        let cursor = self
            .db
            .collection::<Document>(collection)
            .aggregate(stages)
            .await
            .map_err(op_err)?
            .with_type::<Document>();
        drain_cursor(cursor).await
    }

    async fn create_index(&self, collection: &str, field: &str) -> MeterResult<String> {
        let model = IndexModel::builder().keys(doc! { field: 1 }).build();
        let result = self
            .db
            .collection::<Document>(collection)
            .create_index(model)
            .await
            .map_err(op_err)?;
        Ok(result.index_name)
    }

    async fn drop_index(&self, collection: &str, name: &str) -> MeterResult<()> {
        self.db
            .collection::<Document>(collection)
            .drop_index(name)
            .await
            .map_err(op_err)
    }
}
