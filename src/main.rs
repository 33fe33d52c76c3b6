use clap::Parser;
use dbmeter::client::{connect_mongo, CassandraClient, MongoQueryClient};
use dbmeter::config::Config;
use dbmeter::playground::MongoPlayground;
use dbmeter::store::ResultStore;
use dbmeter::{create_router, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "dbmeter")]
#[command(about = "Execution-time monitor for Cassandra and MongoDB queries", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8501)]
    port: u16,

    /// MongoDB database the playground operates on
    #[arg(long)]
    playground_database: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbmeter=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Connection details come from .env / the environment; a missing
    // CONNECTION_STRING is fatal here, before anything is served.
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // Connections are opened once and held for the process lifetime.
    let cassandra =
        CassandraClient::connect(&config.cassandra_node(), &config.cassandra_keyspace).await?;
    let mongo_client = connect_mongo(&config.mongo_uri).await?;

    let playground_db = args
        .playground_database
        .unwrap_or_else(|| config.mongo_database.clone());
    tracing::info!(
        keyspace = %config.cassandra_keyspace,
        mongo_raw = %config.mongo_database,
        mongo_indexed = %config.mongo_indexed_database,
        playground = %playground_db,
        "clients ready"
    );

    let state = AppState {
        cassandra: Arc::new(cassandra),
        mongo_raw: Arc::new(MongoQueryClient::new(&mongo_client, &config.mongo_database)),
        mongo_indexed: Arc::new(MongoQueryClient::new(
            &mongo_client,
            &config.mongo_indexed_database,
        )),
        playground: Arc::new(MongoPlayground::new(&mongo_client, &playground_db)),
        store: ResultStore::new(),
    };
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
