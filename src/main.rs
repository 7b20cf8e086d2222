use pagewatch::{
    ChangeMonitor, ChromePageClient, FileSnapshotStore, MonitorTiming, TelegramNotifier,
    WatchConfig,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = match WatchConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    let notifier = match TelegramNotifier::new(config.bot_token.clone(), config.chat_id.clone()) {
        Ok(notifier) => notifier,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };
    let store = FileSnapshotStore::new(&config.snapshot_file);
    let page = ChromePageClient::new(config.clone());

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received; shutting down");
            signal_token.cancel();
        }
    });

    info!(
        "Watching {} (selector {:?})",
        config.target_url, config.selector
    );

    let mut monitor = ChangeMonitor::new(page, notifier, store, MonitorTiming::default());
    if let Err(e) = monitor.run(shutdown).await {
        error!("Monitor stopped with error: {}", e);
        std::process::exit(1);
    }
}
