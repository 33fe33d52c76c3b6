//! HTTP API tests.
//!
//! The router is exercised with injected fakes implementing the same
//! `QueryClient`/`DocumentStore` contracts as the real drivers, so no live
//! Cassandra or MongoDB deployment is needed.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tower::ServiceExt;

use dbmeter::catalog::QueryText;
use dbmeter::playground::{DocumentStore, UpdateOutcome};
use dbmeter::{AppState, MeterError, MeterResult, QueryClient, ResultStore};

// ==================== Fakes ====================

struct FakeQueryClient {
    rows: Vec<Value>,
    fail: bool,
}

impl FakeQueryClient {
    fn with_rows(rows: Vec<Value>) -> Arc<Self> {
        Arc::new(FakeQueryClient { rows, fail: false })
    }

    fn failing() -> Arc<Self> {
        Arc::new(FakeQueryClient {
            rows: vec![],
            fail: true,
        })
    }
}

#[async_trait]
impl QueryClient for FakeQueryClient {
    async fn execute(&self, _query: &QueryText) -> MeterResult<Vec<Value>> {
        if self.fail {
            return Err(MeterError::Query("simulated engine failure".to_string()));
        }
        Ok(self.rows.clone())
    }
}

#[derive(Default)]
struct FakeDocumentStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

fn matches_filter(doc: &Value, filter: &Value) -> bool {
    match filter.as_object() {
        Some(map) => map.iter().all(|(k, v)| doc.get(k) == Some(v)),
        None => false,
    }
}

#[async_trait]
impl DocumentStore for FakeDocumentStore {
    async fn list_collections(&self) -> MeterResult<Vec<String>> {
        let mut names: Vec<String> = self.collections.read().unwrap().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_collection(&self, name: &str) -> MeterResult<()> {
        let mut collections = self.collections.write().unwrap();
        if collections.contains_key(name) {
            return Err(MeterError::Operation(format!(
                "collection '{}' already exists",
                name
            )));
        }
        collections.insert(name.to_string(), vec![]);
        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> MeterResult<()> {
        self.collections.write().unwrap().remove(name);
        Ok(())
    }

    async fn insert_one(&self, collection: &str, document: Value) -> MeterResult<Value> {
        if !document.is_object() {
            return Err(MeterError::Parse("not a valid document".to_string()));
        }
        let mut collections = self.collections.write().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();
        let id = document
            .get("_id")
            .cloned()
            .unwrap_or_else(|| json!(format!("doc{}", docs.len())));
        docs.push(document);
        Ok(id)
    }

    async fn find(&self, collection: &str, filter: Value) -> MeterResult<Vec<Value>> {
        let collections = self.collections.read().unwrap();
        let docs = collections.get(collection).cloned().unwrap_or_default();
        let match_all = filter.as_object().map_or(true, |m| m.is_empty());
        Ok(docs
            .into_iter()
            .filter(|d| match_all || matches_filter(d, &filter))
            .collect())
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Value,
        update: Value,
    ) -> MeterResult<UpdateOutcome> {
        let mut collections = self.collections.write().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();
        let set = update.get("$set").and_then(Value::as_object).cloned();
        let mut matched: u64 = 0;
        for doc in docs.iter_mut().filter(|d| matches_filter(d, &filter)) {
            matched += 1;
            if let (Some(obj), Some(set)) = (doc.as_object_mut(), set.as_ref()) {
                for (k, v) in set {
                    obj.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(UpdateOutcome {
            matched,
            modified: matched,
        })
    }

    async fn delete_many(&self, collection: &str, filter: Value) -> MeterResult<u64> {
        let mut collections = self.collections.write().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();
        let before = docs.len();
        docs.retain(|d| !matches_filter(d, &filter));
        Ok((before - docs.len()) as u64)
    }

    async fn aggregate(&self, collection: &str, _pipeline: Vec<Value>) -> MeterResult<Vec<Value>> {
        let collections = self.collections.read().unwrap();
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn create_index(&self, _collection: &str, field: &str) -> MeterResult<String> {
        Ok(format!("{}_1", field))
    }

    async fn drop_index(&self, _collection: &str, _name: &str) -> MeterResult<()> {
        Ok(())
    }
}

// ==================== Helpers ====================

fn transaction_rows() -> Vec<Value> {
    vec![
        json!({"id_karyawan": "KR001", "total_transaksi": "10000"}),
        json!({"id_karyawan": "KR001", "total_transaksi": "5000"}),
        json!({"id_karyawan": "KR002", "total_transaksi": "7000"}),
    ]
}

fn employee_docs() -> Vec<Value> {
    vec![
        json!({"_id": "KR001", "nama": "Yaffa"}),
        json!({"_id": "KR002", "nama": "Aqiela"}),
    ]
}

fn make_state(
    cassandra: Arc<FakeQueryClient>,
    mongo: Arc<FakeQueryClient>,
    store: ResultStore,
) -> AppState {
    AppState {
        cassandra,
        mongo_raw: mongo.clone(),
        mongo_indexed: mongo,
        playground: Arc::new(FakeDocumentStore::default()),
        store,
    }
}

fn default_router() -> Router {
    dbmeter::create_router(make_state(
        FakeQueryClient::with_rows(transaction_rows()),
        FakeQueryClient::with_rows(employee_docs()),
        ResultStore::new(),
    ))
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

// ==================== Benchmark API ====================

#[tokio::test]
async fn test_run_catalog_benchmark() {
    let router = default_router();
    let (status, body) = send(
        &router,
        Method::POST,
        "/_api/benchmark/run",
        Some(json!({
            "database": "cassandra",
            "variant": "raw",
            "scenario": "branch_filter",
            "params": {"branch_id": "CB01"}
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["row_count"], 3);
    assert_eq!(body["result"]["rows"].as_array().unwrap().len(), 3);
    assert_eq!(body["empty"], false);
    assert!(body["result"]["elapsed_secs"].as_f64().unwrap() >= 0.0);
    assert_eq!(body["result"]["scenario"], "branch_filter");

    // The run landed in the result store
    let (status, body) = send(&router, Method::GET, "/_api/results", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = send(
        &router,
        Method::GET,
        "/_api/results/cassandra/raw/branch_filter",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["row_count"], 3);
}

#[tokio::test]
async fn test_rerun_overwrites_store_entry() {
    let router = default_router();
    let request = json!({
        "database": "cassandra",
        "variant": "raw",
        "scenario": "top_employees",
    });
    send(
        &router,
        Method::POST,
        "/_api/benchmark/run",
        Some(request.clone()),
    )
    .await;
    send(&router, Method::POST, "/_api/benchmark/run", Some(request)).await;

    let (_, body) = send(&router, Method::GET, "/_api/results", None).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_unknown_scenario_combination() {
    let router = default_router();
    let (status, body) = send(
        &router,
        Method::POST,
        "/_api/benchmark/run",
        Some(json!({
            "database": "mongodb",
            "variant": "raw",
            "scenario": "daily_counts",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("daily_counts"));
}

#[tokio::test]
async fn test_missing_param_is_rejected() {
    let router = default_router();
    let (status, body) = send(
        &router,
        Method::POST,
        "/_api/benchmark/run",
        Some(json!({
            "database": "cassandra",
            "variant": "indexed",
            "scenario": "branch_filter",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("branch_id"));
}

#[tokio::test]
async fn test_custom_benchmark_recorded_under_label() {
    let router = default_router();
    let (status, _) = send(
        &router,
        Method::POST,
        "/_api/benchmark/custom",
        Some(json!({
            "database": "cassandra",
            "variant": "indexed",
            "label": "count-cb02",
            "text": "SELECT COUNT(*) FROM indexed_transaksi_harian WHERE id_cabang = 'CB02'",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &router,
        Method::GET,
        "/_api/results/cassandra/indexed/custom:count-cb02",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scenario"], "custom:count-cb02");
}

#[tokio::test]
async fn test_custom_benchmark_requires_label() {
    let router = default_router();
    let (status, _) = send(
        &router,
        Method::POST,
        "/_api/benchmark/custom",
        Some(json!({
            "database": "mongodb",
            "variant": "raw",
            "label": "  ",
            "text": "{}",
            "collection": "karyawan",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_result_is_flagged_not_failed() {
    let router = dbmeter::create_router(make_state(
        FakeQueryClient::with_rows(vec![]),
        FakeQueryClient::with_rows(vec![]),
        ResultStore::new(),
    ));
    let (status, body) = send(
        &router,
        Method::POST,
        "/_api/benchmark/run",
        Some(json!({
            "database": "cassandra",
            "variant": "raw",
            "scenario": "branch_filter",
            "params": {"branch_id": "CB99"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["empty"], true);
    assert_eq!(body["result"]["row_count"], 0);
}

#[tokio::test]
async fn test_failed_run_preserves_previous_entry() {
    let store = ResultStore::new();

    let healthy = dbmeter::create_router(make_state(
        FakeQueryClient::with_rows(transaction_rows()),
        FakeQueryClient::with_rows(employee_docs()),
        store.clone(),
    ));
    let request = json!({
        "database": "cassandra",
        "variant": "raw",
        "scenario": "top_employees",
    });
    let (status, _) = send(
        &healthy,
        Method::POST,
        "/_api/benchmark/run",
        Some(request.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Second run fails against the same store
    let broken = dbmeter::create_router(make_state(
        FakeQueryClient::failing(),
        FakeQueryClient::with_rows(employee_docs()),
        store.clone(),
    ));
    let (status, body) = send(&broken, Method::POST, "/_api/benchmark/run", Some(request)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("simulated"));

    // The earlier successful result survives
    let (status, body) = send(
        &broken,
        Method::GET,
        "/_api/results/cassandra/raw/top_employees",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["row_count"], 3);
}

#[tokio::test]
async fn test_clear_results() {
    let router = default_router();
    send(
        &router,
        Method::POST,
        "/_api/benchmark/run",
        Some(json!({
            "database": "cassandra",
            "variant": "raw",
            "scenario": "top_employees",
        })),
    )
    .await;
    send(
        &router,
        Method::POST,
        "/_api/benchmark/run",
        Some(json!({
            "database": "cassandra",
            "variant": "indexed",
            "scenario": "top_employees",
        })),
    )
    .await;

    let (status, _) = send(
        &router,
        Method::DELETE,
        "/_api/results/cassandra/raw/top_employees",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Clearing it again is a 404
    let (status, _) = send(
        &router,
        Method::DELETE,
        "/_api/results/cassandra/raw/top_employees",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&router, Method::DELETE, "/_api/results", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = send(&router, Method::GET, "/_api/results", None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_result_key_with_bad_database_name() {
    let router = default_router();
    let (status, _) = send(
        &router,
        Method::GET,
        "/_api/results/postgres/raw/branch_filter",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ==================== Combined Analytics ====================

#[tokio::test]
async fn test_analytics_ranking() {
    let router = default_router();
    let (status, body) = send(&router, Method::GET, "/_api/analytics/ranking", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let ranking = body["ranking"].as_array().unwrap();
    assert_eq!(ranking[0]["employee_name"], "Yaffa");
    assert_eq!(ranking[0]["total_sales"], 15000.0);
    assert_eq!(ranking[0]["transaction_count"], 2);
    assert_eq!(ranking[1]["employee_name"], "Aqiela");
    assert_eq!(ranking[1]["total_sales"], 7000.0);
}

#[tokio::test]
async fn test_analytics_surfaces_source_failure() {
    let router = dbmeter::create_router(make_state(
        FakeQueryClient::failing(),
        FakeQueryClient::with_rows(employee_docs()),
        ResultStore::new(),
    ));
    let (status, _) = send(&router, Method::GET, "/_api/analytics/ranking", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ==================== Playground ====================

#[tokio::test]
async fn test_playground_insert_then_find() {
    let router = default_router();

    let (status, _) = send(
        &router,
        Method::POST,
        "/_api/playground/collection",
        Some(json!({"name": "karyawan"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &router,
        Method::POST,
        "/_api/playground/document/karyawan",
        Some(json!({"document": {"_id": "KR009", "nama": "Sari", "id_cabang": "CB01"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inserted_id"], "KR009");

    let (status, body) = send(
        &router,
        Method::POST,
        "/_api/playground/find/karyawan",
        Some(json!({"filter": {"nama": "Sari"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["documents"][0]["_id"], "KR009");
    assert_eq!(body["empty"], false);

    let (status, body) = send(&router, Method::GET, "/_api/playground/collections", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["collections"], json!(["karyawan"]));
}

#[tokio::test]
async fn test_playground_find_empty_is_informational() {
    let router = default_router();
    let (status, body) = send(
        &router,
        Method::POST,
        "/_api/playground/find/karyawan",
        Some(json!({"filter": {"nama": "Nobody"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["empty"], true);
}

#[tokio::test]
async fn test_playground_update_and_delete() {
    let router = default_router();
    for nama in ["Sari", "Rudi"] {
        send(
            &router,
            Method::POST,
            "/_api/playground/document/staff",
            Some(json!({"document": {"nama": nama, "id_cabang": "CB01"}})),
        )
        .await;
    }

    let (status, body) = send(
        &router,
        Method::PUT,
        "/_api/playground/documents/staff",
        Some(json!({
            "filter": {"id_cabang": "CB01"},
            "update": {"$set": {"id_cabang": "CB02"}}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modified"], 2);

    let (status, body) = send(
        &router,
        Method::DELETE,
        "/_api/playground/documents/staff",
        Some(json!({"filter": {"id_cabang": "CB02"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);
}

#[tokio::test]
async fn test_playground_duplicate_collection_is_operation_error() {
    let router = default_router();
    send(
        &router,
        Method::POST,
        "/_api/playground/collection",
        Some(json!({"name": "cabang"})),
    )
    .await;
    let (status, body) = send(
        &router,
        Method::POST,
        "/_api/playground/collection",
        Some(json!({"name": "cabang"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_playground_index_lifecycle() {
    let router = default_router();
    let (status, body) = send(
        &router,
        Method::POST,
        "/_api/playground/index/karyawan",
        Some(json!({"field": "id_cabang"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "id_cabang_1");

    let (status, _) = send(
        &router,
        Method::DELETE,
        "/_api/playground/index/karyawan/id_cabang_1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_service_info_and_catalog() {
    let router = default_router();
    let (status, body) = send(&router, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "dbmeter");

    let (status, body) = send(&router, Method::GET, "/_api/catalog", None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 14);
    assert!(entries.iter().any(|e| {
        e["database"] == "cassandra" && e["variant"] == "indexed" && e["scenario"] == "branch_filter"
    }));
}
