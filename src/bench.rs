//! Benchmark runner.
//!
//! Records wall-clock time around a single `execute` call. The client
//! contract guarantees the returned rows are fully materialized, so the
//! elapsed time covers the complete fetch and never a partial cursor read.
//! No timeout is enforced; a hung query blocks the interaction that issued
//! it, which is acceptable for course-scale local data.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::catalog::{DatabaseKind, QueryText, Variant};
use crate::client::QueryClient;
use crate::error::MeterResult;

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkResult {
    pub database: DatabaseKind,
    pub variant: Variant,
    /// Catalog scenario id, or `custom:<label>` for ad-hoc queries.
    pub scenario: String,
    pub query_text: String,
    pub elapsed_secs: f64,
    pub row_count: usize,
    pub rows: Vec<Value>,
    pub ran_at: DateTime<Utc>,
}

pub async fn run_benchmark(
    client: &dyn QueryClient,
    database: DatabaseKind,
    variant: Variant,
    scenario: impl Into<String>,
    query: &QueryText,
) -> MeterResult<BenchmarkResult> {
    let scenario = scenario.into();
    let start = Instant::now();
    let rows = client.execute(query).await?;
    let elapsed_secs = start.elapsed().as_secs_f64();

    let result = BenchmarkResult {
        database,
        variant,
        scenario: scenario.clone(),
        query_text: query.text.clone(),
        elapsed_secs,
        row_count: rows.len(),
        rows,
        ran_at: Utc::now(),
    };
    tracing::debug!(
        %database,
        %variant,
        %scenario,
        elapsed_secs,
        rows = result.row_count,
        "benchmark run complete"
    );
    Ok(result)
}
