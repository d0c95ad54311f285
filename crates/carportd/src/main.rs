use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

use carportd::Engine;
use carportd::LogLevel;
use carportd::api;
use carportd::config::Config;

/// Home automation daemon for connected vehicles
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "carportd.toml")]
    config: PathBuf,

    /// Override the log level from the configuration file
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)?;

    // Initialize tracing/logging with per-module overrides from the config
    let level = args.log_level.unwrap_or(config.logging.level);
    let mut targets = Targets::new().with_default(LevelFilter::from(level));
    for (module, level) in &config.logging.overrides {
        targets = targets.with_target(module.clone(), LevelFilter::from(*level));
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(targets)
        .init();

    tracing::info!("carportd starting");
    tracing::info!("Loaded config from: {}", args.config.display());

    // Build the engine and let every registered integration initialize itself
    let mut engine = Engine::new();
    engine.register_integrations_from_config(&config)?;
    let engine = Arc::new(engine);

    // Run the engine event loop in the background
    let engine_task = {
        let engine = engine.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.run().await {
                tracing::error!("Engine error: {}", e);
            }
        })
    };

    // Serve the HTTP API unless disabled
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let api_task = if config.api.enabled {
        let listen = config.api.listen.clone();
        let port = config.api.port;
        let engine = engine.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = api::serve(listen, port, engine, shutdown_rx).await {
                tracing::error!("HTTP API server error: {}", e);
            }
        }))
    } else {
        tracing::info!("HTTP API disabled in config");
        None
    };

    tracing::info!("carportd started, press Ctrl+C to exit");

    // Wait for Ctrl+C
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received shutdown signal");
        }
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    // Stop the API first so no new commands arrive mid-shutdown
    if let Some(handle) = api_task {
        let _ = shutdown_tx.send(());
        if let Err(e) = handle.await {
            tracing::error!("HTTP API task error: {}", e);
        }
    }

    engine_task.abort();

    tracing::info!("carportd shutdown complete");

    Ok(())
}
