//! Cassandra client over the native CQL protocol.
//!
//! Executes CQL verbatim and converts rows into JSON objects keyed by column
//! name, so results from both engines share one representation downstream.

use async_trait::async_trait;
use chrono::NaiveDate;
use scylla::frame::response::result::CqlValue;
use scylla::{Session, SessionBuilder};
use serde_json::{Map, Value};

use crate::catalog::QueryText;
use crate::client::QueryClient;
use crate::error::{MeterError, MeterResult};

pub struct CassandraClient {
    session: Session,
}

impl CassandraClient {
    /// Connects to the contact point and binds the keyspace. Unreachable host
    /// or bad keyspace is fatal at startup; no reconnection afterwards.
    pub async fn connect(node: &str, keyspace: &str) -> MeterResult<Self> {
        let session = SessionBuilder::new()
            .known_node(node)
            .build()
            .await
            .map_err(|e| MeterError::Connection(e.to_string()))?;
        session
            .use_keyspace(keyspace, false)
            .await
            .map_err(|e| MeterError::Connection(e.to_string()))?;
        tracing::info!(node, keyspace, "connected to Cassandra");
        Ok(CassandraClient { session })
    }
}

#[async_trait]
impl QueryClient for CassandraClient {
    async fn execute(&self, query: &QueryText) -> MeterResult<Vec<Value>> {
        let result = self
            .session
            .query(query.text.clone(), ())
            .await
            .map_err(|e| MeterError::Query(e.to_string()))?;

        let names: Vec<String> = result.col_specs.iter().map(|c| c.name.clone()).collect();
        let rows = result.rows.unwrap_or_default();

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut object = Map::with_capacity(names.len());
                for (name, column) in names.iter().zip(row.columns) {
                    let value = column
                        .as_ref()
                        .map(cql_value_to_json)
                        .unwrap_or(Value::Null);
                    object.insert(name.clone(), value);
                }
                Value::Object(object)
            })
            .collect())
    }
}

fn float_to_json(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// CQL `date` is an unsigned day count with the epoch at 2^31.
fn cql_date_to_json(days: u32) -> Value {
    let offset = days as i64 - (1 << 31);
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(offset)))
        .map(|date| Value::String(date.to_string()))
        .unwrap_or_else(|| Value::from(offset))
}

fn cql_value_to_json(value: &CqlValue) -> Value {
    match value {
        CqlValue::Ascii(s) | CqlValue::Text(s) => Value::String(s.clone()),
        CqlValue::Boolean(b) => Value::Bool(*b),
        CqlValue::TinyInt(v) => Value::from(*v),
        CqlValue::SmallInt(v) => Value::from(*v),
        CqlValue::Int(v) => Value::from(*v),
        CqlValue::BigInt(v) => Value::from(*v),
        CqlValue::Counter(c) => Value::from(c.0),
        CqlValue::Float(v) => float_to_json(*v as f64),
        CqlValue::Double(v) => float_to_json(*v),
        // Decimals stay strings; consumers parse them when they need numbers
        CqlValue::Decimal(d) => {
            Value::String(bigdecimal::BigDecimal::from(d.clone()).to_string())
        }
        CqlValue::Varint(v) => Value::String(
            bigdecimal::num_bigint::BigInt::from_signed_bytes_be(v.as_signed_bytes_be_slice())
                .to_string(),
        ),
        CqlValue::Uuid(u) => Value::String(u.to_string()),
        CqlValue::Timeuuid(u) => Value::String(u.to_string()),
        CqlValue::Inet(addr) => Value::String(addr.to_string()),
        CqlValue::Date(date) => cql_date_to_json(date.0),
        // Milliseconds since the Unix epoch
        CqlValue::Timestamp(ts) => chrono::DateTime::from_timestamp_millis(ts.0)
            .map(|t| Value::String(t.to_rfc3339()))
            .unwrap_or_else(|| Value::from(ts.0)),
        // Nanoseconds since midnight
        CqlValue::Time(t) => Value::from(t.0),
        CqlValue::Blob(bytes) => Value::String(
            bytes
                .iter()
                .fold(String::from("0x"), |mut acc, b| {
                    acc.push_str(&format!("{:02x}", b));
                    acc
                }),
        ),
        CqlValue::List(items) | CqlValue::Set(items) => {
            Value::Array(items.iter().map(cql_value_to_json).collect())
        }
        CqlValue::Tuple(items) => Value::Array(
            items
                .iter()
                .map(|v| v.as_ref().map(cql_value_to_json).unwrap_or(Value::Null))
                .collect(),
        ),
        CqlValue::Map(entries) => {
            let mut object = Map::with_capacity(entries.len());
            for (key, val) in entries {
                let key = match cql_value_to_json(key) {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                object.insert(key, cql_value_to_json(val));
            }
            Value::Object(object)
        }
        CqlValue::Empty => Value::Null,
        other => Value::String(format!("{:?}", other)),
    }
}
