//! Database clients.
//!
//! Both engines sit behind the [`QueryClient`] trait so the benchmark runner,
//! the combined-analytics joiner and the HTTP handlers can be exercised with
//! injected fakes instead of live databases. Implementations materialize the
//! full result set before returning; a lazy cursor would understate the cost
//! the benchmark is trying to measure.

mod cassandra;
pub(crate) mod mongo;

pub use cassandra::CassandraClient;
pub use mongo::{connect as connect_mongo, MongoQueryClient};

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::catalog::QueryText;
use crate::error::MeterResult;

/// A connection to one database, held for the process lifetime. No retries,
/// no reconnection: a failure surfaces immediately to the caller.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Executes the query and returns the fully materialized rows as JSON
    /// objects keyed by column/field name.
    async fn execute(&self, query: &QueryText) -> MeterResult<Vec<Value>>;
}

pub type SharedClient = Arc<dyn QueryClient>;
