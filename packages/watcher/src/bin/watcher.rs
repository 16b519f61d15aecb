//! Game server activity watcher.
//!
//! Polls the master server on a fixed interval, tracks player activity on
//! servers running the tracked mod and publishes a status board and arrival
//! alerts. Outbound messages are written to stdout as JSON lines, one per
//! delivery, for a chat adapter to pick up.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin arena-watch -- --fixture packages/watcher/fixtures/servers.json \
//!     --destinations packages/watcher/fixtures/destinations.json
//! cargo run --bin arena-watch -- --fixture packages/watcher/fixtures/servers.json --dump
//! ```

use std::{collections::BTreeSet, path::PathBuf, sync::Arc};

use arena_watch::{
    config::{PresentationConfig, WatcherConfig},
    domain::{ChannelId, DestinationRepository, DestinationSink, QueryClient},
    infrastructure::{
        ChannelDestinationSink, FixtureQueryClient, InMemoryDestinationRepository,
        MaxMindGeoLocator, StaticGeoLocator, WatchPresenceUpdater, geo::default_search_paths,
    },
    ui::{ArrivalNotifier, PollScheduler, StatusBoardPresenter, StatusRenderer, shutdown_signal},
    usecase::{CycleOutcome, PollCycleUseCase, ScanDirectoryUseCase, TrackActivityUseCase},
};
use arena_watch_shared::{logger::setup_logger, time::SystemClock};
use clap::Parser;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

#[derive(Parser, Debug)]
#[command(name = "arena-watch")]
#[command(about = "Watches game servers and publishes player activity", long_about = None)]
struct Args {
    /// Configuration file (JSON). Defaults are used when omitted
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Server fixture file (JSON) answering master and server queries
    #[arg(short = 'f', long)]
    fixture: PathBuf,

    /// Destination list file (JSON)
    #[arg(short = 'd', long)]
    destinations: Option<PathBuf>,

    /// Presentation settings file (JSON), reloaded on SIGHUP
    #[arg(short = 'p', long)]
    presentation: Option<PathBuf>,

    /// Override the poll interval in seconds
    #[arg(short = 'i', long)]
    interval_secs: Option<u64>,

    /// Run a single cycle, print its result and exit
    #[arg(long, conflicts_with = "dump")]
    once: bool,

    /// Scan once, print the relevant servers and exit
    #[arg(long)]
    dump: bool,

    /// Default log level when RUST_LOG is not set
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_PKG_NAME"), env!("CARGO_BIN_NAME"), &args.log_level);

    // Initialize dependencies in order:
    // 1. Configuration
    // 2. Query client, repository, sink, presence
    // 3. Presentation
    // 4. UseCases
    // 5. Scheduler

    // 1. Configuration
    let mut config = match &args.config {
        Some(path) => WatcherConfig::from_file(path)?,
        None => WatcherConfig::default(),
    };
    if let Some(secs) = args.interval_secs {
        config.poll_interval_secs = secs;
    }
    if let Some(path) = &args.presentation {
        config.presentation = PresentationConfig::from_file(path)?;
    }
    config.validate()?;

    // 2. Collaborators
    let client: Arc<dyn QueryClient> = Arc::new(FixtureQueryClient::from_json_file(&args.fixture)?);
    let repository = Arc::new(match &args.destinations {
        Some(path) => InMemoryDestinationRepository::from_json_file(path)?,
        None => InMemoryDestinationRepository::new(Vec::new()),
    });
    let sink = Arc::new(ChannelDestinationSink::new());
    let writers = register_stdout_channels(repository.as_ref(), sink.as_ref()).await?;
    let (presence, presence_rx) = WatchPresenceUpdater::new();
    tokio::spawn(log_presence(presence_rx));

    // 3. Presentation
    let database = match &config.geoip_database {
        Some(path) => MaxMindGeoLocator::open(path),
        None => MaxMindGeoLocator::discover(&default_search_paths()),
    };
    let geo = StaticGeoLocator::new(config.geoip.clone()).with_fallback(Arc::new(database));
    let renderer = StatusRenderer::new(
        config.presentation.clone(),
        config.degraded_threshold,
        config.hide_empty_servers,
        Arc::new(geo),
        Arc::new(SystemClock),
    );
    let presenter = Arc::new(StatusBoardPresenter::new(
        renderer,
        repository.clone(),
        sink.clone(),
    ));
    let notifier = Arc::new(ArrivalNotifier::new(
        repository.clone(),
        sink.clone(),
        config.presentation.alert_text.clone(),
        config.presentation.alert_delete_after_secs,
    ));

    // 4. UseCases
    let scan = ScanDirectoryUseCase::new(client, config.relevance_filter(), config.scan_settings()?);
    let cycle = PollCycleUseCase::new(
        scan,
        TrackActivityUseCase::new(),
        repository.clone(),
        presenter.clone(),
        Arc::new(presence),
        notifier,
        config.status_label.clone(),
    );

    // 5. Scheduler
    let scheduler = PollScheduler::new(cycle, config.poll_interval())?;

    if args.dump {
        let outcome = scheduler.scan_once().await;
        println!("{}", serde_json::to_string_pretty(&outcome.relevant_servers)?);
        return Ok(());
    }

    if args.once {
        let outcome = scheduler.run_once().await?;

        // sender をすべて落として、stdout タスクが書き終えるのを待つ
        drop(scheduler);
        drop(presenter);
        drop(sink);
        for writer in writers {
            writer.await?;
        }

        match outcome {
            CycleOutcome::NoConsumers => {
                tracing::warn!("No destinations configured, nothing to do");
            }
            CycleOutcome::Completed(report) => {
                println!("{}", serde_json::to_string_pretty(&report.result)?);
            }
        }
        return Ok(());
    }

    scheduler.start().await;
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    wait_for_shutdown(presenter.as_ref(), args.presentation.as_ref()).await;

    scheduler.stop().await;
    let activity = scheduler.activity().await;
    tracing::info!(
        "Watcher shutdown complete ({} active servers, {} consecutive master failures)",
        activity.active_addresses().len(),
        activity.consecutive_master_failures()
    );

    Ok(())
}

/// 配信先のチャンネルごとに stdout へ書き出すタスクを登録する
async fn register_stdout_channels(
    repository: &InMemoryDestinationRepository,
    sink: &ChannelDestinationSink,
) -> Result<Vec<JoinHandle<()>>, Box<dyn std::error::Error>> {
    let mut channels: BTreeSet<ChannelId> = BTreeSet::new();
    for destination in repository.all_destinations().await? {
        channels.insert(destination.status_channel);
        channels.extend(destination.operator_channel);
    }

    let mut writers = Vec::with_capacity(channels.len());
    for channel in channels {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        sink.register_channel(channel, tx).await;
        writers.push(tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                println!("{{\"channel\":{},\"message\":{}}}", channel, message);
            }
        }));
    }

    Ok(writers)
}

async fn log_presence(mut receiver: watch::Receiver<String>) {
    while receiver.changed().await.is_ok() {
        let status = receiver.borrow_and_update().clone();
        tracing::info!("Status: {}", status);
    }
}

/// 終了シグナルを待つ。Unix では SIGHUP で表示設定を読み直す。
#[cfg(unix)]
async fn wait_for_shutdown(presenter: &StatusBoardPresenter, presentation: Option<&PathBuf>) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            tracing::error!("Failed to install SIGHUP handler: {}", e);
            shutdown_signal().await;
            return;
        }
    };

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = hangup.recv() => {
                let Some(path) = presentation else {
                    tracing::warn!("SIGHUP received but no presentation file was given");
                    continue;
                };
                if let Err(e) = presenter.reload_presentation_from_file(path).await {
                    tracing::error!("Could not reload presentation settings: {}", e);
                }
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_presenter: &StatusBoardPresenter, _presentation: Option<&PathBuf>) {
    shutdown_signal().await;
}
