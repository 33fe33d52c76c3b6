//! Seeds the synthetic grocery dataset into both databases.
//!
//! Creates the raw and indexed Cassandra tables (identical schema, the
//! indexed one carries a secondary index on `id_cabang`) and loads the same
//! generated rows into both, so indexing can never change query results,
//! only timing. Then seeds the `cabang`/`karyawan` collections into the raw
//! and indexed MongoDB databases, declaring indexes only in the latter.
//!
//! Run with: cargo run --bin seed

use anyhow::Context;
use chrono::NaiveDate;
use dbmeter::config::Config;
use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, IndexModel};
use rand::seq::SliceRandom;
use rand::Rng;
use scylla::{Session, SessionBuilder};
use uuid::Uuid;

const NUM_ROWS: usize = 2000;
const UNIQUE_TXN_COUNT: usize = 300;
const START_DATE: (i32, u32, u32) = (2025, 5, 1);

const BRANCHES: [&str; 2] = ["CB01", "CB02"];
const EMPLOYEES: [&str; 4] = ["KR001", "KR002", "KR003", "KR004"];

const ITEMS: [(&str, i64); 10] = [
    ("Beras", 10000),
    ("Gula", 8000),
    ("Minyak Goreng", 12000),
    ("Telur", 2000),
    ("Roti", 5000),
    ("Susu", 7000),
    ("Teh", 3000),
    ("Garam", 2500),
    ("Gula Pasir", 8500),
    ("Kopi", 15000),
];

struct TxnRow {
    id: Uuid,
    txn_id: String,
    branch: &'static str,
    employee: &'static str,
    date: NaiveDate,
    item: &'static str,
    qty: i32,
    price: i64,
    total: i64,
}

fn generate_rows() -> Vec<TxnRow> {
    let mut rng = rand::thread_rng();
    let start = NaiveDate::from_ymd_opt(START_DATE.0, START_DATE.1, START_DATE.2)
        .expect("valid start date");

    // Unique transaction ids, each pinned to one (branch, employee) pair
    let txn_map: Vec<(String, &'static str, &'static str)> = (1..=UNIQUE_TXN_COUNT)
        .map(|i| {
            let branch = *BRANCHES.choose(&mut rng).expect("non-empty");
            let employee = *EMPLOYEES.choose(&mut rng).expect("non-empty");
            (format!("{}-{}-{:010}", branch, employee, i), branch, employee)
        })
        .collect();

    let mut make_row = |txn: &(String, &'static str, &'static str)| {
        let (item, price) = *ITEMS.choose(&mut rng).expect("non-empty");
        let qty = rng.gen_range(1..=10);
        TxnRow {
            id: Uuid::new_v4(),
            txn_id: txn.0.clone(),
            branch: txn.1,
            employee: txn.2,
            date: start + chrono::Duration::days(rng.gen_range(0..30)),
            item,
            qty,
            price,
            total: qty as i64 * price,
        }
    };

    // At least one row per transaction, then fill up to NUM_ROWS
    let mut rows: Vec<TxnRow> = txn_map.iter().map(&mut make_row).collect();
    while rows.len() < NUM_ROWS {
        let txn = txn_map.choose(&mut rand::thread_rng()).expect("non-empty");
        rows.push(make_row(txn));
    }
    rows
}

fn insert_cql(table: &str, row: &TxnRow) -> String {
    format!(
        "INSERT INTO {} (id_transaksi_harian, id_transaksi, id_cabang, id_karyawan, \
         tanggal, nama_barang, qty, harga_barang, total_transaksi) \
         VALUES ({}, '{}', '{}', '{}', '{}', '{}', {}, {}, {})",
        table,
        row.id,
        row.txn_id,
        row.branch,
        row.employee,
        row.date,
        row.item,
        row.qty,
        row.price,
        row.total
    )
}

async fn seed_cassandra(config: &Config) -> anyhow::Result<()> {
    let session: Session = SessionBuilder::new()
        .known_node(config.cassandra_node())
        .build()
        .await
        .context("connecting to Cassandra")?;

    let keyspace = &config.cassandra_keyspace;
    session
        .query(
            format!(
                "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = \
                 {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
                keyspace
            ),
            (),
        )
        .await?;
    session.use_keyspace(keyspace, false).await?;

    let schema = "(id_transaksi_harian uuid PRIMARY KEY, id_transaksi text, \
                  id_cabang text, id_karyawan text, tanggal date, nama_barang text, \
                  qty int, harga_barang decimal, total_transaksi decimal)";
    for table in ["transaksi_harian", "indexed_transaksi_harian"] {
        session
            .query(format!("CREATE TABLE IF NOT EXISTS {} {}", table, schema), ())
            .await?;
        session.query(format!("TRUNCATE {}", table), ()).await?;
    }
    session
        .query(
            "CREATE INDEX IF NOT EXISTS idx_cabang ON indexed_transaksi_harian (id_cabang)"
                .to_string(),
            (),
        )
        .await?;

    let rows = generate_rows();
    for row in &rows {
        // Same row content in both tables, including the generated uuid
        session.query(insert_cql("transaksi_harian", row), ()).await?;
        session
            .query(insert_cql("indexed_transaksi_harian", row), ())
            .await?;
    }
    println!(
        "Cassandra: {} rows into transaksi_harian and indexed_transaksi_harian ({})",
        rows.len(),
        keyspace
    );
    Ok(())
}

fn branch_docs() -> Vec<Document> {
    vec![
        doc! {
            "_id": "CB01",
            "nama_cabang": "Cabang A",
            "lokasi": "Jambi - Sungai Sipin",
            "contact": "021-1234567",
        },
        doc! {
            "_id": "CB02",
            "nama_cabang": "Cabang B",
            "lokasi": "Jakarta Timur - Duren Sawit",
            "contact": "022-7654321",
        },
    ]
}

fn employee_docs() -> Vec<Document> {
    vec![
        doc! { "_id": "KR001", "nama": "Yaffa", "role": "kasir", "id_cabang": "CB01" },
        doc! { "_id": "KR002", "nama": "Aqiela", "role": "kasir", "id_cabang": "CB01" },
        doc! { "_id": "KR003", "nama": "Dimitri", "role": "manajer", "id_cabang": "CB02" },
        doc! { "_id": "KR004", "nama": "Cinta", "role": "kasir", "id_cabang": "CB02" },
    ]
}

async fn seed_mongo(config: &Config) -> anyhow::Result<()> {
    let options = ClientOptions::parse(&config.mongo_uri)
        .await
        .context("parsing MongoDB connection string")?;
    let client = Client::with_options(options)?;

    for (name, indexed) in [
        (config.mongo_database.as_str(), false),
        (config.mongo_indexed_database.as_str(), true),
    ] {
        let db = client.database(name);
        let cabang = db.collection::<Document>("cabang");
        let karyawan = db.collection::<Document>("karyawan");

        cabang.drop().await?;
        karyawan.drop().await?;
        cabang.insert_many(branch_docs()).await?;
        karyawan.insert_many(employee_docs()).await?;

        if indexed {
            cabang
                .create_index(IndexModel::builder().keys(doc! { "lokasi": 1 }).build())
                .await?;
            karyawan
                .create_index(IndexModel::builder().keys(doc! { "id_cabang": 1 }).build())
                .await?;
        }
        println!(
            "MongoDB: seeded cabang and karyawan in '{}'{}",
            name,
            if indexed { " (with indexes)" } else { "" }
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    seed_cassandra(&config).await?;
    seed_mongo(&config).await?;

    println!("Seeding complete");
    Ok(())
}
