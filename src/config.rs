//! Environment configuration.
//!
//! Connection details come from environment variables, normally loaded from a
//! local `.env` file at startup (see `main.rs`). The MongoDB connection string
//! is required; everything else has a default suitable for a local setup.

use std::env;

use crate::error::{MeterError, MeterResult};

pub const DEFAULT_CASSANDRA_HOST: &str = "127.0.0.1";
pub const DEFAULT_CASSANDRA_PORT: u16 = 9042;
pub const DEFAULT_KEYSPACE: &str = "groceries";
pub const DEFAULT_MONGO_DATABASE: &str = "groceries";
pub const DEFAULT_MONGO_INDEXED_DATABASE: &str = "indexed_groceries";

#[derive(Debug, Clone)]
pub struct Config {
    /// MongoDB connection string (local or Atlas-hosted).
    pub mongo_uri: String,
    pub mongo_database: String,
    pub mongo_indexed_database: String,
    pub cassandra_host: String,
    pub cassandra_port: u16,
    pub cassandra_keyspace: String,
}

impl Config {
    /// Reads configuration from the process environment. A missing
    /// `CONNECTION_STRING` is a fatal startup error.
    pub fn from_env() -> MeterResult<Self> {
        let mongo_uri = env::var("CONNECTION_STRING")
            .map_err(|_| MeterError::MissingConfig("CONNECTION_STRING".to_string()))?;

        let cassandra_port = match env::var("CASSANDRA_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| MeterError::Parse(format!("invalid CASSANDRA_PORT '{}'", raw)))?,
            Err(_) => DEFAULT_CASSANDRA_PORT,
        };

        Ok(Config {
            mongo_uri,
            mongo_database: env::var("MONGO_DATABASE")
                .unwrap_or_else(|_| DEFAULT_MONGO_DATABASE.to_string()),
            mongo_indexed_database: env::var("MONGO_INDEXED_DATABASE")
                .unwrap_or_else(|_| DEFAULT_MONGO_INDEXED_DATABASE.to_string()),
            cassandra_host: env::var("CASSANDRA_HOST")
                .unwrap_or_else(|_| DEFAULT_CASSANDRA_HOST.to_string()),
            cassandra_port,
            cassandra_keyspace: env::var("CASSANDRA_KEYSPACE")
                .unwrap_or_else(|_| DEFAULT_KEYSPACE.to_string()),
        })
    }

    /// Contact point in `host:port` form, as the CQL driver expects.
    pub fn cassandra_node(&self) -> String {
        format!("{}:{}", self.cassandra_host, self.cassandra_port)
    }
}
