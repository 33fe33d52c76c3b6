use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::bench::{run_benchmark, BenchmarkResult};
use crate::catalog::{self, DatabaseKind, QueryText, Scenario, Variant};
use crate::client::SharedClient;
use crate::error::MeterError;
use crate::playground::DocumentStore;
use crate::store::{BenchKey, ResultStore};
use crate::{analytics, VERSION};

#[derive(Clone)]
pub struct AppState {
    pub cassandra: SharedClient,
    pub mongo_raw: SharedClient,
    pub mongo_indexed: SharedClient,
    pub playground: Arc<dyn DocumentStore>,
    pub store: ResultStore,
}

impl AppState {
    /// Cassandra variants share one session (the variant picks the table in
    /// the CQL); MongoDB variants are separate database bindings.
    fn client_for(&self, database: DatabaseKind, variant: Variant) -> &SharedClient {
        match (database, variant) {
            (DatabaseKind::Cassandra, _) => &self.cassandra,
            (DatabaseKind::MongoDb, Variant::Raw) => &self.mongo_raw,
            (DatabaseKind::MongoDb, Variant::Indexed) => &self.mongo_indexed,
        }
    }
}

// ==================== Request Types ====================

#[derive(Debug, Deserialize)]
pub struct RunBenchmarkRequest {
    pub database: DatabaseKind,
    pub variant: Variant,
    pub scenario: Scenario,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct CustomBenchmarkRequest {
    pub database: DatabaseKind,
    pub variant: Variant,
    /// Identifies the store entry; results are kept under `custom:<label>`.
    pub label: String,
    pub text: String,
    #[serde(default)]
    pub collection: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct InsertDocumentRequest {
    pub document: Value,
}

#[derive(Debug, Deserialize)]
pub struct FindRequest {
    #[serde(default)]
    pub filter: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub filter: Value,
    pub update: Value,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub filter: Value,
}

#[derive(Debug, Deserialize)]
pub struct AggregateRequest {
    pub pipeline: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct CreateIndexRequest {
    pub field: String,
}

// ==================== Service ====================

pub async fn service_info() -> Json<Value> {
    Json(serde_json::json!({
        "service": "dbmeter",
        "version": VERSION,
        "pages": ["catalog", "benchmark", "results", "analytics", "playground"],
    }))
}

pub async fn get_catalog() -> Json<Value> {
    Json(serde_json::json!({ "entries": catalog::CATALOG }))
}

// ==================== Benchmark Handlers ====================

fn benchmark_response(result: BenchmarkResult) -> Json<Value> {
    // Zero rows is not an error, just worth flagging to the dashboard
    let empty = result.row_count == 0;
    Json(serde_json::json!({ "result": result, "empty": empty }))
}

pub async fn run_catalog_benchmark(
    State(state): State<AppState>,
    Json(req): Json<RunBenchmarkRequest>,
) -> Result<Json<Value>, MeterError> {
    let template = catalog::lookup(req.database, req.variant, req.scenario).ok_or_else(|| {
        MeterError::UnknownScenario(format!("{}/{}/{}", req.database, req.variant, req.scenario))
    })?;
    let query = catalog::render(template, &req.params)?;

    let client = state.client_for(req.database, req.variant);
    let result = run_benchmark(
        client.as_ref(),
        req.database,
        req.variant,
        req.scenario.id(),
        &query,
    )
    .await?;

    state.store.record(result.clone());
    Ok(benchmark_response(result))
}

pub async fn run_custom_benchmark(
    State(state): State<AppState>,
    Json(req): Json<CustomBenchmarkRequest>,
) -> Result<Json<Value>, MeterError> {
    if req.label.trim().is_empty() {
        return Err(MeterError::MissingParam("label".to_string()));
    }
    // Deliberate pass-through: the engine is the only validator of custom text
    let query = QueryText {
        text: req.text,
        collection: req.collection,
    };
    let scenario = format!("custom:{}", req.label.trim());

    let client = state.client_for(req.database, req.variant);
    let result =
        run_benchmark(client.as_ref(), req.database, req.variant, scenario, &query).await?;

    state.store.record(result.clone());
    Ok(benchmark_response(result))
}

// ==================== Result Store Handlers ====================

fn parse_key(database: &str, variant: &str, scenario: &str) -> Result<BenchKey, MeterError> {
    Ok(BenchKey::new(
        database.parse::<DatabaseKind>()?,
        variant.parse::<Variant>()?,
        scenario,
    ))
}

pub async fn list_results(State(state): State<AppState>) -> Json<Value> {
    let results = state.store.all();
    Json(serde_json::json!({ "count": results.len(), "results": results }))
}

pub async fn get_result(
    State(state): State<AppState>,
    Path((database, variant, scenario)): Path<(String, String, String)>,
) -> Result<Json<BenchmarkResult>, MeterError> {
    let key = parse_key(&database, &variant, &scenario)?;
    state
        .store
        .get(&key)
        .map(Json)
        .ok_or_else(|| MeterError::ResultNotFound(key.to_string()))
}

pub async fn delete_result(
    State(state): State<AppState>,
    Path((database, variant, scenario)): Path<(String, String, String)>,
) -> Result<StatusCode, MeterError> {
    let key = parse_key(&database, &variant, &scenario)?;
    if state.store.clear(&key) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(MeterError::ResultNotFound(key.to_string()))
    }
}

pub async fn clear_results(State(state): State<AppState>) -> StatusCode {
    state.store.clear_all();
    StatusCode::NO_CONTENT
}

// ==================== Combined Analytics ====================

pub async fn analytics_ranking(State(state): State<AppState>) -> Result<Json<Value>, MeterError> {
    let ranking =
        analytics::fetch_ranking(state.cassandra.as_ref(), state.mongo_raw.as_ref()).await?;
    Ok(Json(
        serde_json::json!({ "count": ranking.len(), "ranking": ranking }),
    ))
}

// ==================== Playground Handlers ====================

pub async fn list_collections(State(state): State<AppState>) -> Result<Json<Value>, MeterError> {
    let collections = state.playground.list_collections().await?;
    Ok(Json(serde_json::json!({ "collections": collections })))
}

pub async fn create_collection(
    State(state): State<AppState>,
    Json(req): Json<CreateCollectionRequest>,
) -> Result<Json<Value>, MeterError> {
    state.playground.create_collection(&req.name).await?;
    Ok(Json(
        serde_json::json!({ "name": req.name, "status": "created" }),
    ))
}

pub async fn drop_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, MeterError> {
    state.playground.drop_collection(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn insert_document(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(req): Json<InsertDocumentRequest>,
) -> Result<Json<Value>, MeterError> {
    let inserted_id = state.playground.insert_one(&collection, req.document).await?;
    Ok(Json(
        serde_json::json!({ "inserted_id": inserted_id, "status": "inserted" }),
    ))
}

pub async fn find_documents(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(req): Json<FindRequest>,
) -> Result<Json<Value>, MeterError> {
    let filter = req.filter.unwrap_or_else(|| serde_json::json!({}));
    let documents = state.playground.find(&collection, filter).await?;
    Ok(Json(serde_json::json!({
        "count": documents.len(),
        "empty": documents.is_empty(),
        "documents": documents,
    })))
}

pub async fn update_documents(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<Value>, MeterError> {
    let outcome = state
        .playground
        .update_many(&collection, req.filter, req.update)
        .await?;
    Ok(Json(serde_json::json!({
        "matched": outcome.matched,
        "modified": outcome.modified,
    })))
}

pub async fn delete_documents(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<Value>, MeterError> {
    let deleted = state.playground.delete_many(&collection, req.filter).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

pub async fn aggregate_documents(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(req): Json<AggregateRequest>,
) -> Result<Json<Value>, MeterError> {
    let documents = state.playground.aggregate(&collection, req.pipeline).await?;
    Ok(Json(serde_json::json!({
        "count": documents.len(),
        "documents": documents,
    })))
}

pub async fn create_index(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(req): Json<CreateIndexRequest>,
) -> Result<Json<Value>, MeterError> {
    let name = state.playground.create_index(&collection, &req.field).await?;
    Ok(Json(
        serde_json::json!({ "name": name, "status": "created" }),
    ))
}

pub async fn drop_index(
    State(state): State<AppState>,
    Path((collection, name)): Path<(String, String)>,
) -> Result<StatusCode, MeterError> {
    state.playground.drop_index(&collection, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}
