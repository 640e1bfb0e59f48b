use quire_api::server::{self, ServerState};
use quire_common::snowflake::NodeId;
use quire_core::{FeedSettings, Services};
use quire_db::{DbClient, DbError, EntityStore, MemoryStore};
use serde::Deserialize;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Error setting up the database: {0}")]
    Database(#[from] DbError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
    /// Without a database everything is kept in memory.
    database_url: Option<String>,
    #[serde(default = "default_database_max_connections")]
    database_max_connections: u32,
    #[serde(default)]
    worker_id: NodeId,
    #[serde(default)]
    process_id: NodeId,
}

fn default_database_max_connections() -> u32 {
    5
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "quire_api=debug,\
                quire_core=debug,\
                quire_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<(Env, FeedSettings), InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    let env = envy::from_env()?;
    let settings = envy::from_env()?;
    Ok((env, settings))
}

async fn open_store(env: &Env) -> Result<Arc<dyn EntityStore>, InitError> {
    let Some(database_url) = &env.database_url else {
        warn!("DATABASE_URL is not set, data will not outlive this process");
        return Ok(Arc::new(MemoryStore::new(env.worker_id, env.process_id)));
    };

    let pool = DbClient::connect(database_url, env.database_max_connections).await?;
    let db_client = DbClient::new(pool, env.worker_id, env.process_id);
    db_client.run_migrations().await?;
    info!("Connected to PostgreSQL");

    Ok(Arc::new(db_client))
}

fn shutdown_on_ctrl_c() -> CancellationToken {
    let shutdown = CancellationToken::new();

    let token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received ctrl-c, shutting down");
                token.cancel();
            }
            Err(err) => error!("Could not listen for ctrl-c: {err}"),
        }
    });

    shutdown
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let (env, settings) = get_env()?;
    debug!(?settings, "Feed settings loaded");

    let store = open_store(&env).await?;
    let services = Arc::new(Services::new(store, settings));

    let tracing_layer = TraceLayer::new_for_http();
    let app = server::app(ServerState::new(services)).layer(tracing_layer);

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!("Listening on {server_address}");

    let shutdown = shutdown_on_ctrl_c();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
