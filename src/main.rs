use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_api_rust::config::AppConfig;
use todo_api_rust::{app, AppState};

#[derive(Parser)]
#[command(name = "todo-api")]
#[command(about = "Todo list and user account web service")]
#[command(version)]
struct Args {
    #[arg(long, help = "Interface to bind (overrides HOST)")]
    host: Option<String>,

    #[arg(long, short, help = "Port to listen on (overrides TODO_API_PORT / PORT)")]
    port: Option<u16>,

    #[arg(long, help = "SQLite URL for the write-through mirror (overrides DATABASE_URL)")]
    database_url: Option<String>,

    #[arg(long, help = "Start with an empty store instead of the seed todos")]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_api_rust=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config: AppConfig = todo_api_rust::config::config().clone();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(url) = args.database_url {
        config.database.url = Some(url);
    }
    if args.no_seed {
        config.todos.seed_on_start = false;
    }
    tracing::info!("Starting Todo API in {:?} mode", config.environment);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::initialize(config).await?;
    let database = state.database.clone();
    let mirror_writer = state.take_mirror_writer();

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Todo API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(writer) = mirror_writer {
        if tokio::time::timeout(Duration::from_secs(5), writer).await.is_err() {
            tracing::warn!("Mirror writer did not drain within 5s; pending changes dropped");
        }
    }

    if let Some(db) = database {
        db.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
