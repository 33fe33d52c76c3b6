//! Result store: session-scoped retention of the latest benchmark result per
//! (database, variant, scenario) key.
//!
//! Last-write-wins per key, held in process memory for the life of the
//! service. A failed run never reaches the store, so the previous successful
//! entry for that key survives. Cleared only by explicit request or restart.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::bench::BenchmarkResult;
use crate::catalog::{DatabaseKind, Variant};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BenchKey {
    pub database: DatabaseKind,
    pub variant: Variant,
    pub scenario: String,
}

impl BenchKey {
    pub fn new(database: DatabaseKind, variant: Variant, scenario: impl Into<String>) -> Self {
        BenchKey {
            database,
            variant,
            scenario: scenario.into(),
        }
    }
}

impl fmt::Display for BenchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.database, self.variant, self.scenario)
    }
}

#[derive(Clone, Default)]
pub struct ResultStore {
    results: Arc<RwLock<HashMap<BenchKey, BenchmarkResult>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a result, overwriting any previous entry for the same key.
    pub fn record(&self, result: BenchmarkResult) {
        let key = BenchKey::new(result.database, result.variant, result.scenario.clone());
        let mut results = self.results.write().unwrap();
        results.insert(key, result);
    }

    pub fn get(&self, key: &BenchKey) -> Option<BenchmarkResult> {
        let results = self.results.read().unwrap();
        results.get(key).cloned()
    }

    /// Snapshot of every retained result, for comparison rendering.
    pub fn all(&self) -> Vec<BenchmarkResult> {
        let results = self.results.read().unwrap();
        let mut all: Vec<BenchmarkResult> = results.values().cloned().collect();
        all.sort_by(|a, b| {
            (a.database, a.variant, &a.scenario).cmp(&(b.database, b.variant, &b.scenario))
        });
        all
    }

    /// Clears one entry. Returns whether it existed.
    pub fn clear(&self, key: &BenchKey) -> bool {
        let mut results = self.results.write().unwrap();
        results.remove(key).is_some()
    }

    pub fn clear_all(&self) {
        let mut results = self.results.write().unwrap();
        results.clear();
    }

    pub fn len(&self) -> usize {
        let results = self.results.read().unwrap();
        results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
