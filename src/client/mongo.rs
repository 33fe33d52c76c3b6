//! MongoDB query client.
//!
//! Query text is either a JSON filter document (a `find`) or a JSON array of
//! stage documents (an aggregation pipeline). The variant a benchmark targets
//! is decided by which database the client is bound to: the raw and indexed
//! databases are content-duplicates differing only in declared indexes.

use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Cursor, Database};
use serde_json::Value;

use crate::catalog::QueryText;
use crate::client::QueryClient;
use crate::error::{MeterError, MeterResult};

/// Opens the shared MongoDB client and verifies the deployment is reachable.
pub async fn connect(uri: &str) -> MeterResult<Client> {
    let options = ClientOptions::parse(uri)
        .await
        .map_err(|e| MeterError::Connection(e.to_string()))?;
    let client =
        Client::with_options(options).map_err(|e| MeterError::Connection(e.to_string()))?;
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| MeterError::Connection(e.to_string()))?;
    tracing::info!("connected to MongoDB");
    Ok(client)
}

pub struct MongoQueryClient {
    db: Database,
}

impl MongoQueryClient {
    pub fn new(client: &Client, database: &str) -> Self {
        MongoQueryClient {
            db: client.database(database),
        }
    }
}

#[derive(Debug)]
enum MongoOp {
    Find(Document),
    Aggregate(Vec<Document>),
}

fn parse_query(text: &str) -> MeterResult<MongoOp> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(MongoOp::Find(Document::new()));
    }
    if trimmed.starts_with('[') {
        let stages: Vec<Document> = serde_json::from_str(trimmed)
            .map_err(|e| MeterError::Parse(format!("invalid aggregation pipeline: {}", e)))?;
        Ok(MongoOp::Aggregate(stages))
    } else {
        let filter: Document = serde_json::from_str(trimmed)
            .map_err(|e| MeterError::Parse(format!("invalid filter document: {}", e)))?;
        Ok(MongoOp::Find(filter))
    }
}

/// Drains a cursor completely so timings cover full materialization.
pub(crate) async fn drain_cursor(mut cursor: Cursor<Document>) -> MeterResult<Vec<Value>> {
    let mut rows = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| MeterError::Query(e.to_string()))?
    {
        let document = cursor
            .deserialize_current()
            .map_err(|e| MeterError::Query(e.to_string()))?;
        rows.push(Bson::Document(document).into_relaxed_extjson());
    }
    Ok(rows)
}

#[async_trait]
impl QueryClient for MongoQueryClient {
    async fn execute(&self, query: &QueryText) -> MeterResult<Vec<Value>> {
        let collection = query.collection.as_deref().ok_or_else(|| {
            MeterError::Query("MongoDB query requires a target collection".to_string())
        })?;
        let coll = self.db.collection::<Document>(collection);

        let cursor = match parse_query(&query.text)? {
            MongoOp::Find(filter) => coll
                .find(filter)
                .await
                .map_err(|e| MeterError::Query(e.to_string()))?,
            MongoOp::Aggregate(stages) => coll
                .aggregate(stages)
                .await
                .map_err(|e| MeterError::Query(e.to_string()))?
                .with_type::<Document>(),
        };

        drain_cursor(cursor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_text_is_match_all_find() {
        match parse_query("  ").unwrap() {
            MongoOp::Find(filter) => assert!(filter.is_empty()),
            MongoOp::Aggregate(_) => panic!("expected find"),
        }
    }

    #[test]
    fn test_parse_filter_document() {
        match parse_query(r#"{"id_cabang": "CB01"}"#).unwrap() {
            MongoOp::Find(filter) => {
                assert_eq!(filter.get_str("id_cabang").unwrap(), "CB01");
            }
            MongoOp::Aggregate(_) => panic!("expected find"),
        }
    }

    #[test]
    fn test_parse_pipeline() {
        let text = r#"[{"$group": {"_id": "$id_cabang", "staff": {"$sum": 1}}}]"#;
        match parse_query(text).unwrap() {
            MongoOp::Aggregate(stages) => {
                assert_eq!(stages.len(), 1);
                assert!(stages[0].contains_key("$group"));
            }
            MongoOp::Find(_) => panic!("expected aggregate"),
        }
    }

    #[test]
    fn test_parse_numbers_survive() {
        match parse_query(r#"{"qty": {"$gt": 5}}"#).unwrap() {
            MongoOp::Find(filter) => {
                let qty = filter.get_document("qty").unwrap();
                assert_eq!(qty.get_i64("$gt").unwrap(), 5);
            }
            MongoOp::Aggregate(_) => panic!("expected find"),
        }
    }

    #[test]
    fn test_parse_garbage_is_parse_error() {
        let err = parse_query("{'single: quotes'").unwrap_err();
        assert!(matches!(err, MeterError::Parse(_)));

        let err = parse_query("[{]").unwrap_err();
        assert!(matches!(err, MeterError::Parse(_)));
    }
}
