//! Trade Mirror - Main Entry Point
//!
//! Reads trade intents as JSON lines on stdin and mirrors them onto every
//! exchange enabled in the configuration file.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use trade_mirror::common::channels::create_intent_channel;
use trade_mirror::config::{load_config, AppSettings, FileConfigSource};
use trade_mirror::{
    BinanceAdapter, BybitAdapter, HttpTransport, IntentMessage, IntentRouter, LogNotifier,
    MetadataCache,
};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file, re-read for every intent
    #[arg(short, long, default_value = "config.toml", env = "BRIDGE_CONFIG")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Forward stdin lines to the router until EOF
async fn read_intents(sender: mpsc::Sender<IntentMessage>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<IntentMessage>(line) {
            Ok(message) => {
                debug!(action = %message.action, symbol = %message.data.symbol, "Intent received");
                if sender.send(message).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("Ignoring malformed intent: {}", e),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    // Settings are read once; exchanges and sizing are re-read per intent
    let loaded = load_config(Some(&args.config));
    let settings = loaded
        .as_ref()
        .map(|c| c.settings.clone())
        .unwrap_or_else(|_| AppSettings::default());

    // Initialize logging
    let level = parse_level(args.log_level.as_deref().unwrap_or(&settings.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting trade mirror");
    info!("Configuration file: {}", args.config);
    if let Err(e) = &loaded {
        warn!("Using default settings: {}", e);
    }

    let transport = HttpTransport::with_timeout(settings.request_timeout())?
        .with_recv_window(settings.recv_window_ms);
    let cache = Arc::new(MetadataCache::new());

    let router = IntentRouter::new(
        Arc::new(FileConfigSource::new(&args.config)),
        Arc::new(LogNotifier),
    )
    .with_dedup_window(settings.dedup_window())
    .with_adapter(Arc::new(
        BinanceAdapter::new(transport.clone(), Arc::clone(&cache)).with_edit_delay(settings.edit_delay()),
    ))
    .with_adapter(Arc::new(
        BybitAdapter::new(transport, cache).with_edit_delay(settings.edit_delay()),
    ));

    let (intent_tx, intent_rx) = create_intent_channel();
    let router_task = tokio::spawn(Arc::new(router).run(intent_rx));

    info!("Application initialized successfully, reading intents from stdin");

    tokio::select! {
        result = read_intents(intent_tx) => {
            result?;
            info!("Input closed");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, cleaning up...");
        }
    }

    // The sender is dropped at this point, so the router drains and stops
    router_task.await?;

    Ok(())
}
