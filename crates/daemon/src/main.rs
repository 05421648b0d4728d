use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use brain_waves_fft_plugin::BandPowerEngine;
use clap::Parser;
use eeg_daemon::{
    build_source, load_config,
    server::{self, AppState},
    Broadcaster, Diagnostics, SourceKind, SubscriberRegistry,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "eeg_daemon", about = "Streams EEG samples and live band powers over WebSocket")]
struct Args {
    /// JSON configuration file; defaults are used when omitted
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// Use mock EEG data
    #[arg(long, conflicts_with = "replay")]
    mock: bool,

    /// Replay a CSV recording instead of a live source
    #[arg(long, value_name = "CSV")]
    replay: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "eeg_daemon=info,eeg_sensor=info,brain_waves_fft_plugin=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("EEG Daemon starting...");
    let args = Args::parse();

    // --- Configuration ---
    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.mock {
        config.source.kind = SourceKind::Mock;
    }
    if let Some(path) = args.replay {
        config.source.kind = SourceKind::Replay;
        config.source.path = Some(path);
    }
    config.validate().context("Invalid configuration")?;

    // --- Centralized State ---
    let source = build_source(&config).context("Failed to create sample source")?;
    let engine = BandPowerEngine::new(config.engine.clone()).context("Failed to build band-power engine")?;
    tracing::info!("Band-power engine using high-pass '{}'", engine.filter_name());

    let subscribers = Arc::new(SubscriberRegistry::new(config.broadcaster.subscriber_queue));
    let diagnostics = Arc::new(Diagnostics::new(config.engine.channels.clone(), engine.latest()));
    let shutdown = CancellationToken::new();

    // --- Broadcaster ---
    let broadcaster = Broadcaster::new(
        source,
        engine,
        subscribers.clone(),
        diagnostics.clone(),
        &config.broadcaster,
    );
    let broadcaster_handle = tokio::spawn(broadcaster.run(shutdown.clone()));

    // --- Server ---
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    let state = AppState {
        subscribers,
        diagnostics,
        sample_rate: config.engine.sample_rate,
        window_samples: config.engine.window_samples,
    };
    let server_handle = tokio::spawn(server::run(listener, state, shutdown.clone()));

    // --- Graceful Shutdown ---
    tokio::signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received. Stopping services...");
    shutdown.cancel();

    broadcaster_handle.await.context("Broadcaster task failed")?;
    server_handle.await.context("Server task failed")??;
    tracing::info!("EEG Daemon stopped gracefully.");

    Ok(())
}
