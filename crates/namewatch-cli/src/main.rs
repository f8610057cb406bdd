// # namewatch - Player Name Watcher
//
// Interactive terminal front-end. The binary is a thin integration layer:
//
// 1. Reading configuration from environment variables
// 2. Initializing tracing and the runtime
// 3. Wiring the HTTP lookup client, cache, watchlist and poller
// 4. Running the line-oriented command loop until EOF, `quit` or a signal
//
// All lookup, fallback and watching logic lives in namewatch-core.
//
// ## Configuration
//
// - `NAMEWATCH_DATA_DIR`: Directory for cache.json and watchlist.json
//   (default: `<config dir>/namewatch`)
// - `NAMEWATCH_HISTORY_URL`: Name history service base URL
// - `NAMEWATCH_AVAILABILITY_URL`: Availability service base URL
// - `NAMEWATCH_BEDROCK_URL`: Gamertag → XUID service base URL
// - `NAMEWATCH_POLL_INTERVAL_SECS`: Seconds between watchlist sweeps (10-3600)
// - `NAMEWATCH_CACHE_TTL_SECS`: Cache freshness window in seconds
// - `NAMEWATCH_COOLDOWN_MS`: Minimum time between two remote commands
// - `NAMEWATCH_LOG_LEVEL`: trace, debug, info, warn, error (default: warn)
//
// ## Example
//
// ```bash
// export NAMEWATCH_DATA_DIR=$HOME/.namewatch
// export NAMEWATCH_POLL_INTERVAL_SECS=120
//
// namewatch
// ```

mod commands;
mod render;
mod sink;

use anyhow::{Context, Result};
use namewatch_core::{
    AvailabilityPoller, Clock, CommandFacade, LookupClient, NameWatchConfig, NotificationSink,
    PollerEvent, ResultCache, SystemClock, WatchlistStore, WorkerPool,
};
use namewatch_http::HttpLookupClient;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use commands::Command;
use sink::TerminalSink;

/// Session key for the single local terminal
const LOCAL_SESSION: &str = "local";

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum NameWatchExitCode {
    /// Clean shutdown (EOF, quit or signal)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<NameWatchExitCode> for ExitCode {
    fn from(code: NameWatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    data_dir: Option<PathBuf>,
    history_url: Option<String>,
    availability_url: Option<String>,
    bedrock_url: Option<String>,
    poll_interval_secs: Option<u64>,
    cache_ttl_secs: Option<u64>,
    cooldown_ms: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str| -> Result<Option<u64>> {
            lookup(key)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .with_context(|| format!("{} must be a whole number. Got: {}", key, raw))
                })
                .transpose()
        };

        Ok(Self {
            data_dir: lookup("NAMEWATCH_DATA_DIR").map(PathBuf::from),
            history_url: lookup("NAMEWATCH_HISTORY_URL"),
            availability_url: lookup("NAMEWATCH_AVAILABILITY_URL"),
            bedrock_url: lookup("NAMEWATCH_BEDROCK_URL"),
            poll_interval_secs: number("NAMEWATCH_POLL_INTERVAL_SECS")?,
            cache_ttl_secs: number("NAMEWATCH_CACHE_TTL_SECS")?,
            cooldown_ms: number("NAMEWATCH_COOLDOWN_MS")?,
            log_level: lookup("NAMEWATCH_LOG_LEVEL").unwrap_or_else(|| "warn".to_string()),
        })
    }

    /// Validate the values the core config does not check itself
    fn validate(&self) -> Result<()> {
        if let Some(interval) = self.poll_interval_secs
            && !(10..=3600).contains(&interval)
        {
            anyhow::bail!(
                "NAMEWATCH_POLL_INTERVAL_SECS must be between 10 and 3600 seconds. Got: {}",
                interval
            );
        }

        if let Some(ref dir) = self.data_dir
            && dir.as_os_str().is_empty()
        {
            anyhow::bail!("NAMEWATCH_DATA_DIR cannot be empty");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "NAMEWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "error" => Level::ERROR,
            _ => Level::WARN,
        }
    }

    /// Build and validate the core configuration
    fn to_core(&self) -> Result<NameWatchConfig> {
        let data_dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::config_dir()
                .context("Could not determine a config directory. Set NAMEWATCH_DATA_DIR")?
                .join("namewatch"),
        };

        let mut config = NameWatchConfig::new(data_dir);
        if let Some(url) = &self.history_url {
            config.endpoints.history_url = url.clone();
        }
        if let Some(url) = &self.availability_url {
            config.endpoints.availability_url = url.clone();
        }
        if let Some(url) = &self.bedrock_url {
            config.endpoints.bedrock_url = url.clone();
        }
        if let Some(interval) = self.poll_interval_secs {
            config.poller.interval_secs = interval;
        }
        if let Some(ttl) = self.cache_ttl_secs {
            config.cache.ttl_secs = ttl;
        }
        if let Some(cooldown) = self.cooldown_ms {
            config.commands.cooldown_ms = cooldown;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return NameWatchExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return NameWatchExitCode::ConfigError.into();
    }

    let core_config = match config.to_core() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return NameWatchExitCode::ConfigError.into();
        }
    };

    // Logs go to stderr so they stay apart from command output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return NameWatchExitCode::ConfigError.into();
    }

    info!("Starting namewatch");
    info!("Data directory: {}", core_config.data_dir.display());

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return NameWatchExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run(core_config).await {
            error!("namewatch error: {:#}", e);
            eprintln!("Error: {:#}", e);
            NameWatchExitCode::RuntimeError
        } else {
            NameWatchExitCode::CleanShutdown
        }
    });

    result.into()
}

/// How the command loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopExit {
    EndOfInput,
    Quit,
    Signal(&'static str),
}

/// Wire the services and run the interactive session
async fn run(config: NameWatchConfig) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let lookup: Arc<dyn LookupClient> = Arc::new(
        HttpLookupClient::new(config.endpoints.clone(), &config.lookup)
            .context("Failed to build the HTTP lookup client")?,
    );

    let cache = Arc::new(
        ResultCache::load(config.cache_path(), Arc::clone(&clock), config.cache.ttl()).await,
    );
    let watchlist = Arc::new(WatchlistStore::load(config.watchlist_path()).await);
    let terminal = Arc::new(TerminalSink::new());
    let sink: Arc<dyn NotificationSink> = terminal.clone();

    let (poller, events) = AvailabilityPoller::new(
        Arc::clone(&lookup),
        Arc::clone(&watchlist),
        sink,
        &config.poller,
    )?;
    let event_task = tokio::spawn(drain_events(events));
    poller.start().await;

    let facade = Arc::new(CommandFacade::new(
        lookup,
        cache,
        watchlist,
        clock,
        &config.lookup,
        &config.commands,
    ));
    let pool = WorkerPool::new(config.commands.max_concurrent);

    println!("{}", render::help());
    let exit = command_loop(&facade, &pool).await;
    info!("Command loop ended: {:?}", exit);

    // Shutdown order: no more notifications, no more sweeps, then commands
    terminal.detach();
    poller.stop().await;

    let grace = match exit {
        LoopExit::Signal(_) => Duration::ZERO,
        LoopExit::EndOfInput | LoopExit::Quit => config.lookup.on_demand_timeouts().total(),
    };
    pool.shutdown(grace).await;

    // Dropping the poller closes the event channel
    drop(poller);
    if let Err(e) = event_task.await {
        warn!("Event task ended abnormally: {}", e);
    }

    info!("namewatch stopped");
    Ok(())
}

/// Read commands from stdin until EOF, `quit` or a shutdown signal
async fn command_loop(facade: &Arc<CommandFacade>, pool: &WorkerPool) -> LoopExit {
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            received = &mut shutdown => {
                return match received {
                    Ok(name) => LoopExit::Signal(name),
                    Err(e) => {
                        warn!("Signal handling failed: {}", e);
                        LoopExit::Signal("unknown")
                    }
                };
            }
            line = lines.next() => line,
        };

        let line = match line {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                warn!("Failed to read input: {}", e);
                return LoopExit::EndOfInput;
            }
            None => return LoopExit::EndOfInput,
        };

        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(usage) => {
                println!("{}", render::line(&usage));
                continue;
            }
        };

        if command == Command::Quit {
            return LoopExit::Quit;
        }

        if !command.is_remote() {
            println!("{}", commands::execute(facade, LOCAL_SESSION, command).await);
            continue;
        }

        debug!("Submitting {:?}", command);
        let facade = Arc::clone(facade);
        let submitted = pool
            .submit(async move {
                let output = commands::execute(&facade, LOCAL_SESSION, command).await;
                println!("{}", output);
            })
            .await;

        if let Err(e) = submitted {
            println!("{}", render::error(&e));
            return LoopExit::EndOfInput;
        }
    }
}

/// Log poller events until the poller is dropped
async fn drain_events(mut events: mpsc::Receiver<PollerEvent>) {
    while let Some(event) = events.recv().await {
        match &event {
            PollerEvent::CheckFailed { name, error } => {
                debug!("Availability check for {} failed: {}", name, error);
            }
            PollerEvent::BecameAvailable { name } => info!("{} became available", name),
            other => debug!("Poller event: {:?}", other),
        }
    }
    debug!("Poller event channel closed");
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (CTRL-C only)
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
