//! Gadget bot - Entry point.

use anyhow::Context;
use clap::{Parser, Subcommand};
use gadget_bot::{
    api::{create_router, AppState},
    config::{Config, LogFormat},
    plugins::{register_all, PluginContext},
    AppResult,
};
use gadget_core::{Dispatcher, Registry};
use slack_client::{SlackClient, SlackEventDecoder, SlackSignatureVerifier};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use user_store::{FileStore, MemoryStore, UserStore, GLOBAL_ADMINS};

#[derive(Parser)]
#[command(name = "gadget-bot")]
#[command(about = "Slack bot with pattern routing and group permissions", long_about = None)]
struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(long, global = true, env = "GADGET_ENV_FILE")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server (default)
    Serve,
    /// Print the version
    Version,
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Serve => serve(cli.env_file.as_deref()).await,
    }
}

async fn serve(env_file: Option<&Path>) -> AppResult<()> {
    // Load configuration
    let config = Config::load(env_file).context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.log.level, config.log.format);

    info!("Starting gadget bot v{}", env!("CARGO_PKG_VERSION"));

    // Initialize storage and seed the global admins
    let store = open_store(config.store.path.as_deref()).await?;

    let admins = config.admins.global_ids();
    if admins.is_empty() {
        warn!("No global admins configured; admin-only routes are unreachable");
    }
    store.replace_members(GLOBAL_ADMINS, &admins).await?;
    info!(count = admins.len(), "Seeded global admins");

    // Register plugin routes
    let slack = Arc::new(SlackClient::new(
        config.slack.bot_token.clone(),
        config.slack.api_url.as_str(),
    )?);

    let mut registry = Registry::new();
    register_all(&mut registry, &PluginContext::new(slack, store.clone()))?;

    // Create dispatcher and router
    let verifier = SlackSignatureVerifier::new(
        config.slack.signing_secret.clone(),
        config.slack.timestamp_tolerance,
    );
    let dispatcher = Dispatcher::new(
        Arc::new(registry),
        store,
        Arc::new(verifier),
        Arc::new(SlackEventDecoder::new()),
    );
    let app = create_router(AppState::new(dispatcher));

    // Bind to address
    let addr = SocketAddr::new(
        config.server.listen_addr.parse().unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {}: {}", addr, e);
        e
    })?;

    info!("Listening on {}", addr);

    // Run server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down...");
    Ok(())
}

async fn open_store(path: Option<&Path>) -> AppResult<Arc<dyn UserStore>> {
    match path {
        Some(path) => {
            let store = FileStore::open(path).await?;
            info!(path = %path.display(), "Opened user store");
            Ok(Arc::new(store))
        }
        None => {
            info!("Store path not set, using in-memory storage");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}
