pub mod analytics;
pub mod bench;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod playground;
pub mod server;
pub mod store;

pub use bench::{run_benchmark, BenchmarkResult};
pub use catalog::{DatabaseKind, QueryText, Scenario, Variant};
pub use client::QueryClient;
pub use error::{MeterError, MeterResult};
pub use server::{create_router, AppState};
pub use store::{BenchKey, ResultStore};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
