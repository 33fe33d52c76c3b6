//! Query catalog: the fixed set of named query templates per database and
//! access-pattern variant.
//!
//! Cassandra templates are raw CQL; the non-indexed variants target
//! `transaksi_harian` with `ALLOW FILTERING`, the indexed variants target
//! `indexed_transaksi_harian` (secondary index on `id_cabang`). MongoDB
//! templates are JSON filter documents or aggregation pipelines; the raw and
//! indexed variants share the template text because the variant selects which
//! database the client is bound to.
//!
//! Custom query text bypasses the catalog entirely and is passed through
//! verbatim to the client. The engine is the only validator.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MeterError, MeterResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    Cassandra,
    #[serde(rename = "mongodb")]
    MongoDb,
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseKind::Cassandra => write!(f, "cassandra"),
            DatabaseKind::MongoDb => write!(f, "mongodb"),
        }
    }
}

impl FromStr for DatabaseKind {
    type Err = MeterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cassandra" => Ok(DatabaseKind::Cassandra),
            "mongodb" => Ok(DatabaseKind::MongoDb),
            other => Err(MeterError::Parse(format!("unknown database '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Raw,
    Indexed,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Raw => write!(f, "raw"),
            Variant::Indexed => write!(f, "indexed"),
        }
    }
}

impl FromStr for Variant {
    type Err = MeterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(Variant::Raw),
            "indexed" => Ok(Variant::Indexed),
            other => Err(MeterError::Parse(format!("unknown variant '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    PointLookup,
    BranchFilter,
    TopEmployees,
    DailyCounts,
}

impl Scenario {
    pub fn id(&self) -> &'static str {
        match self {
            Scenario::PointLookup => "point_lookup",
            Scenario::BranchFilter => "branch_filter",
            Scenario::TopEmployees => "top_employees",
            Scenario::DailyCounts => "daily_counts",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A query ready for execution: the text plus, for MongoDB, the target
/// collection. Cassandra clients ignore `collection` (the table is named in
/// the CQL itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryText {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

impl QueryText {
    pub fn cql(text: impl Into<String>) -> Self {
        QueryText {
            text: text.into(),
            collection: None,
        }
    }

    pub fn mongo(collection: impl Into<String>, text: impl Into<String>) -> Self {
        QueryText {
            text: text.into(),
            collection: Some(collection.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryTemplate {
    pub database: DatabaseKind,
    pub variant: Variant,
    pub scenario: Scenario,
    pub text: &'static str,
    pub params: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<&'static str>,
}

/// The fixed catalog. Not every (database, scenario) pair exists: Cassandra
/// has no per-branch staffing data and the MongoDB collections carry no
/// dates, so each engine gets the scenarios its data can answer.
pub const CATALOG: &[QueryTemplate] = &[
    // Cassandra, non-indexed
    QueryTemplate {
        database: DatabaseKind::Cassandra,
        variant: Variant::Raw,
        scenario: Scenario::PointLookup,
        text: "SELECT * FROM transaksi_harian WHERE id_transaksi = '{transaction_id}' ALLOW FILTERING",
        params: &["transaction_id"],
        collection: None,
    },
    QueryTemplate {
        database: DatabaseKind::Cassandra,
        variant: Variant::Raw,
        scenario: Scenario::BranchFilter,
        text: "SELECT * FROM transaksi_harian WHERE id_cabang = '{branch_id}' ALLOW FILTERING",
        params: &["branch_id"],
        collection: None,
    },
    QueryTemplate {
        database: DatabaseKind::Cassandra,
        variant: Variant::Raw,
        scenario: Scenario::TopEmployees,
        text: "SELECT id_karyawan, total_transaksi FROM transaksi_harian",
        params: &[],
        collection: None,
    },
    QueryTemplate {
        database: DatabaseKind::Cassandra,
        variant: Variant::Raw,
        scenario: Scenario::DailyCounts,
        text: "SELECT COUNT(*) FROM transaksi_harian WHERE tanggal = '{date}' ALLOW FILTERING",
        params: &["date"],
        collection: None,
    },
    // Cassandra, indexed
    QueryTemplate {
        database: DatabaseKind::Cassandra,
        variant: Variant::Indexed,
        scenario: Scenario::PointLookup,
        text: "SELECT * FROM indexed_transaksi_harian WHERE id_transaksi = '{transaction_id}' ALLOW FILTERING",
        params: &["transaction_id"],
        collection: None,
    },
    QueryTemplate {
        database: DatabaseKind::Cassandra,
        variant: Variant::Indexed,
        scenario: Scenario::BranchFilter,
        text: "SELECT * FROM indexed_transaksi_harian WHERE id_cabang = '{branch_id}'",
        params: &["branch_id"],
        collection: None,
    },
    QueryTemplate {
        database: DatabaseKind::Cassandra,
        variant: Variant::Indexed,
        scenario: Scenario::TopEmployees,
        text: "SELECT id_karyawan, total_transaksi FROM indexed_transaksi_harian",
        params: &[],
        collection: None,
    },
    QueryTemplate {
        database: DatabaseKind::Cassandra,
        variant: Variant::Indexed,
        scenario: Scenario::DailyCounts,
        text: "SELECT COUNT(*) FROM indexed_transaksi_harian WHERE tanggal = '{date}' ALLOW FILTERING",
        params: &["date"],
        collection: None,
    },
    // MongoDB, non-indexed
    QueryTemplate {
        database: DatabaseKind::MongoDb,
        variant: Variant::Raw,
        scenario: Scenario::PointLookup,
        text: r#"{"_id": "{employee_id}"}"#,
        params: &["employee_id"],
        collection: Some("karyawan"),
    },
    QueryTemplate {
        database: DatabaseKind::MongoDb,
        variant: Variant::Raw,
        scenario: Scenario::BranchFilter,
        text: r#"{"id_cabang": "{branch_id}"}"#,
        params: &["branch_id"],
        collection: Some("karyawan"),
    },
    QueryTemplate {
        database: DatabaseKind::MongoDb,
        variant: Variant::Raw,
        scenario: Scenario::TopEmployees,
        text: r#"[{"$group": {"_id": "$id_cabang", "staff": {"$sum": 1}}}, {"$sort": {"staff": -1}}]"#,
        params: &[],
        collection: Some("karyawan"),
    },
    // MongoDB, indexed (same text, executed against the indexed database)
    QueryTemplate {
        database: DatabaseKind::MongoDb,
        variant: Variant::Indexed,
        scenario: Scenario::PointLookup,
        text: r#"{"_id": "{employee_id}"}"#,
        params: &["employee_id"],
        collection: Some("karyawan"),
    },
    QueryTemplate {
        database: DatabaseKind::MongoDb,
        variant: Variant::Indexed,
        scenario: Scenario::BranchFilter,
        text: r#"{"id_cabang": "{branch_id}"}"#,
        params: &["branch_id"],
        collection: Some("karyawan"),
    },
    QueryTemplate {
        database: DatabaseKind::MongoDb,
        variant: Variant::Indexed,
        scenario: Scenario::TopEmployees,
        text: r#"[{"$group": {"_id": "$id_cabang", "staff": {"$sum": 1}}}, {"$sort": {"staff": -1}}]"#,
        params: &[],
        collection: Some("karyawan"),
    },
];

pub fn lookup(
    database: DatabaseKind,
    variant: Variant,
    scenario: Scenario,
) -> Option<&'static QueryTemplate> {
    CATALOG
        .iter()
        .find(|t| t.database == database && t.variant == variant && t.scenario == scenario)
}

/// Substitutes `{name}` placeholders with the supplied parameter values.
/// Every parameter the template names must be present.
pub fn render(
    template: &QueryTemplate,
    params: &HashMap<String, String>,
) -> MeterResult<QueryText> {
    let mut text = template.text.to_string();
    for name in template.params {
        let value = params
            .get(*name)
            .ok_or_else(|| MeterError::MissingParam((*name).to_string()))?;
        text = text.replace(&format!("{{{}}}", name), value);
    }
    Ok(QueryText {
        text,
        collection: template.collection.map(String::from),
    })
}
