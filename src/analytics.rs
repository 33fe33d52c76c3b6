//! Combined analytics: joins Cassandra transactions with MongoDB employees in
//! application memory and ranks employees by total sales.
//!
//! The join is an inner join on employee id. Ids present in only one source
//! are dropped from the ranking; they are counted and logged because an
//! unmatched id almost always means incomplete test-data seeding, which is
//! worth surfacing even though the tool keeps going.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::catalog::QueryText;
use crate::client::QueryClient;
use crate::error::MeterResult;

pub const TRANSACTIONS_QUERY: &str =
    "SELECT id_karyawan, total_transaksi FROM transaksi_harian";
pub const EMPLOYEES_COLLECTION: &str = "karyawan";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRank {
    pub employee_id: String,
    pub employee_name: String,
    pub total_sales: f64,
    pub transaction_count: u64,
}

/// Accepts both JSON numbers and numeric strings, since Cassandra decimal
/// columns arrive as strings.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn string_field<'a>(row: &'a Value, field: &str) -> Option<&'a str> {
    row.get(field).and_then(Value::as_str)
}

/// Groups transactions by employee id, joins against the employee documents
/// and returns the ranking, sorted descending by total sales. Ties keep the
/// order employees first appeared in the transaction rows (stable sort over
/// first-seen grouping order).
pub fn build_ranking(transactions: &[Value], employees: &[Value]) -> Vec<SalesRank> {
    // First-seen order so tie-breaking is deterministic
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, (f64, u64)> = HashMap::new();
    let mut skipped_rows = 0usize;

    for row in transactions {
        let Some(employee_id) = string_field(row, "id_karyawan") else {
            skipped_rows += 1;
            continue;
        };
        let amount = row
            .get("total_transaksi")
            .and_then(numeric)
            .unwrap_or_default();
        let entry = totals.entry(employee_id.to_string()).or_insert_with(|| {
            order.push(employee_id.to_string());
            (0.0, 0)
        });
        entry.0 += amount;
        entry.1 += 1;
    }

    let names: HashMap<&str, &str> = employees
        .iter()
        .filter_map(|doc| {
            Some((string_field(doc, "_id")?, string_field(doc, "nama")?))
        })
        .collect();

    let mut unmatched = 0usize;
    let mut ranking: Vec<SalesRank> = order
        .into_iter()
        .filter_map(|employee_id| {
            let Some(name) = names.get(employee_id.as_str()) else {
                unmatched += 1;
                return None;
            };
            let (total_sales, transaction_count) = totals[&employee_id];
            Some(SalesRank {
                employee_id,
                employee_name: (*name).to_string(),
                total_sales,
                transaction_count,
            })
        })
        .collect();

    if skipped_rows > 0 || unmatched > 0 {
        tracing::debug!(
            skipped_rows,
            unmatched_employees = unmatched,
            "dropped unjoinable analytics input"
        );
    }

    ranking.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));
    ranking
}

/// Fetches both sides independently, then joins in memory.
pub async fn fetch_ranking(
    cassandra: &dyn QueryClient,
    mongo: &dyn QueryClient,
) -> MeterResult<Vec<SalesRank>> {
    let transactions = cassandra.execute(&QueryText::cql(TRANSACTIONS_QUERY)).await?;
    let employees = mongo
        .execute(&QueryText::mongo(EMPLOYEES_COLLECTION, "{}"))
        .await?;
    Ok(build_ranking(&transactions, &employees))
}
