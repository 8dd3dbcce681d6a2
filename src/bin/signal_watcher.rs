use smi_signal_bot::{
    notify, CandleStore, Config, FeedClient, FeedSettings, GateioRestClient, HealthReporter,
    IndicatorEngine, Metrics, QuoteCache, SignalEngine,
};
use smi_signal_bot::utils::init_from_config;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn, error};

/// Stream Gate.io futures candles and alert on SMI zone signals
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to $CONFIG_FILE or config/default.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    init_from_config(&config.logging).context("initializing logger")?;

    info!("SMI signal watcher starting ({})", config.general.environment);
    info!("Instruments: {:?}", config.general.instruments);

    let metrics = Arc::new(Metrics::new().context("registering metrics")?);
    let store = Arc::new(CandleStore::with_capacity(config.exchange.history_limit));
    let quotes = Arc::new(QuoteCache::new());
    let rest = GateioRestClient::new(config.exchange.api_endpoint.clone(), config.exchange.history_limit)?;
    let sink = notify::from_config(&config.notify, Arc::clone(&metrics))?;

    let (feed, handle) = FeedClient::new(
        FeedSettings {
            ws_url: config.exchange.ws_endpoint.clone(),
            default_interval: config.general.default_interval.clone(),
            ping_interval: config.exchange.ping_interval(),
            reconnect_delay: config.exchange.reconnect_delay(),
        },
        config.general.instruments.clone(),
        Arc::clone(&store),
        quotes,
        rest,
        Arc::clone(&metrics),
    );

    // History first so the signal engine has bars on its first tick
    handle.load_all_history().await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = Vec::new();
    tasks.push(tokio::spawn(feed.run(shutdown_rx.clone())));

    let watched = config.signal_instruments();
    if config.signals.enabled && !watched.is_empty() {
        let engine = SignalEngine::new(
            &config.signals,
            watched.clone(),
            handle.clone(),
            IndicatorEngine::new(Arc::clone(&store)),
            Arc::clone(&sink),
            Arc::clone(&metrics),
        );
        tasks.push(tokio::spawn(engine.run(shutdown_rx.clone())));
    } else {
        warn!("Signal detection disabled");
    }

    if config.health.enabled {
        let reporter = HealthReporter::new(
            &config.health,
            config.signals.alert_utc_offset_hours,
            watched,
            handle.clone(),
            Arc::clone(&sink),
        );
        tasks.push(tokio::spawn(reporter.run(shutdown_rx.clone())));
    }

    info!("System ready. Press Ctrl+C to stop");
    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("Shutting down...");
    let _ = shutdown_tx.send(true);

    for task in tasks {
        if let Err(e) = task.await {
            error!("Task ended abnormally: {}", e);
        }
    }

    if config.metrics.enabled {
        info!("Final metrics:\n{}", metrics.render());
    }
    info!("Shutdown complete");
    Ok(())
}
