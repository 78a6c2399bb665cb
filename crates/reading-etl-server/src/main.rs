//! Reading ETL - Main entry point

use anyhow::{Context, Result};
use clap::Parser;
use reading_etl_common::logging::{init_logging, LogConfig, LogLevel};
use std::{net::SocketAddr, process, sync::Arc};
use tokio::signal;
use tracing::info;

use reading_etl_server::{
    api::{self, AppState},
    app::{self, Stores},
    cli::{Cli, Commands},
    config::Config,
    sync::SyncScheduler,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Also reads .env, so it must run before LOG_* is looked at
    let config = Config::load().context("Failed to load configuration")?;

    // Environment variables take precedence over the defaults set here
    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Info })
        .log_file_prefix("reading-etl")
        .filter_directives("tower_http=info,sqlx=warn,mongodb=warn")
        .build()
        .merge_env()?;

    let log_guard = init_logging(&log_config)?;

    let succeeded = match cli.command() {
        Commands::Serve => serve(config).await.map(|()| true),
        Commands::Sync { batch_size } => {
            let batch_size = (*batch_size).and_then(|n| usize::try_from(n).ok());
            sync_once(config, batch_size).await
        },
    }?;

    // process::exit skips destructors, so flush file logs first
    drop(log_guard);
    if !succeeded {
        process::exit(1);
    }

    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting reading ETL server");

    let stores = Stores::connect(&config).await?;
    let sync = Arc::new(app::sync_service(&config, &stores, None));

    let scheduler_handle = config.sync.interval().map(|interval| {
        info!(interval_secs = interval.as_secs(), "Interval sync enabled");
        SyncScheduler::new(sync.clone(), interval).start()
    });

    let state = AppState {
        db: stores.db.clone(),
        sync,
    };
    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid HOST/PORT")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = scheduler_handle {
        handle.abort();
    }

    info!("Server shut down gracefully");

    Ok(())
}

/// Run one cycle, print the outcome, and report whether it succeeded
async fn sync_once(config: Config, batch_size: Option<usize>) -> Result<bool> {
    let stores = Stores::connect(&config).await?;
    let service = app::sync_service(&config, &stores, batch_size);

    info!(batch_size = service.batch_size(), "Running one sync cycle");
    let outcome = service.trigger().await;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(outcome.is_success())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
