//! Availability poller
//!
//! The AvailabilityPoller is responsible for:
//! - Periodically checking every watched name against the availability service
//! - Comparing each observation with the last known state
//! - Notifying once when a name goes from taken to available
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐     names      ┌─────────────────────┐
//! │ WatchlistStore │───────────────▶│ AvailabilityPoller  │
//! └────────────────┘                └─────────────────────┘
//!         ▲                                   │
//!         │ record_observation                │
//!         │         ┌─────────────────────────┼──────────────────────┐
//!         │         │                         │                      │
//!         │         ▼                         ▼                      ▼
//!         │  ┌──────────────┐       ┌──────────────────┐     ┌─────────────┐
//!         └──│ LookupClient │       │ NotificationSink │     │   Events    │
//!            │ (check)      │       │ (notify)         │     │  (monitor)  │
//!            └──────────────┘       └──────────────────┘     └─────────────┘
//! ```
//!
//! ## Sweep Flow
//!
//! 1. Empty watchlist: skip, no remote calls
//! 2. For each name (sorted order): one availability lookup
//! 3. 404/204 is available, 200 is taken, anything else is unknown
//! 4. Unknown: leave the name's state alone
//! 5. Available after an observed taken: notify
//! 6. Record the observation, pause, next name
//!
//! ## States
//!
//! `Stopped` → [`start`](AvailabilityPoller::start) → `Running` →
//! [`stop`](AvailabilityPoller::stop) → `Stopped`. Starting a running poller
//! replaces the running task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PollerConfig;
use crate::error::Result;
use crate::traits::{LookupClient, LookupTimeouts, NotificationSink};
use crate::watchlist::{Observation, WatchlistStore};

/// Events emitted by the AvailabilityPoller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerEvent {
    /// Poller task started
    Started,

    /// Sweep skipped because the watchlist is empty
    SweepSkipped,

    /// A name was checked and its state recorded
    NameChecked {
        name: String,
        available: bool,
        previous: Option<bool>,
    },

    /// A lookup failed; the name's state was left unchanged
    CheckFailed { name: String, error: String },

    /// A name went from taken to available
    BecameAvailable { name: String },

    /// A sweep visited every name
    SweepCompleted { checked: usize, unknown: usize },

    /// A sweep was cancelled part-way
    SweepInterrupted { remaining: usize },

    /// Poller task stopped
    Stopped { reason: String },
}

/// Lifecycle state of the poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Stopped,
    Running,
}

/// What one sweep did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Watchlist was empty; nothing was looked up
    pub skipped: bool,
    /// Names whose observation was recorded
    pub checked: usize,
    /// Names whose lookup failed
    pub unknown: usize,
    /// Names that triggered a became-available notification
    pub notified: Vec<String>,
    /// Sweep was cancelled before visiting every name
    pub interrupted: bool,
}

/// Shared sweep logic, owned jointly by the poller and its running task
struct Sweeper {
    lookup: Arc<dyn LookupClient>,
    watchlist: Arc<WatchlistStore>,
    sink: Arc<dyn NotificationSink>,
    timeouts: LookupTimeouts,
    rate_limit_delay: Duration,
    event_tx: mpsc::Sender<PollerEvent>,
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodic watchlist availability poller
///
/// ## Lifecycle
///
/// 1. Create with [`AvailabilityPoller::new()`]
/// 2. Start the schedule with [`AvailabilityPoller::start()`]
/// 3. Stop with [`AvailabilityPoller::stop()`] before exit
///
/// ## Threading
///
/// All sweeps run on one dedicated task, which is the only writer of the
/// watchlist's last-known availability.
pub struct AvailabilityPoller {
    sweeper: Arc<Sweeper>,

    /// Period between sweeps
    interval: Duration,

    /// Delay before the first sweep
    initial_delay: Duration,

    /// Currently running task, if any
    task: Mutex<Option<RunningTask>>,
}

impl AvailabilityPoller {
    /// Create a new poller
    ///
    /// # Parameters
    ///
    /// - `lookup`: Availability lookup client
    /// - `watchlist`: Watchlist to sweep
    /// - `sink`: Where became-available notifications go
    /// - `config`: Poller settings
    ///
    /// # Returns
    ///
    /// A tuple of (poller, event_receiver) where event_receiver yields poller events
    pub fn new(
        lookup: Arc<dyn LookupClient>,
        watchlist: Arc<WatchlistStore>,
        sink: Arc<dyn NotificationSink>,
        config: &PollerConfig,
    ) -> Result<(Self, mpsc::Receiver<PollerEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let poller = Self {
            sweeper: Arc::new(Sweeper {
                lookup,
                watchlist,
                sink,
                timeouts: config.timeouts(),
                rate_limit_delay: config.rate_limit_delay(),
                event_tx: tx,
            }),
            interval: config.interval(),
            initial_delay: config.initial_delay(),
            task: Mutex::new(None),
        };

        Ok((poller, rx))
    }

    /// Start the periodic schedule
    ///
    /// Any previously running task is cancelled and awaited first, so at most
    /// one poller task exists at a time.
    pub async fn start(&self) {
        let mut task = self.task.lock().await;

        if let Some(previous) = task.take() {
            debug!("Replacing running poller task");
            previous.cancel.cancel();
            if let Err(e) = previous.handle.await {
                warn!("Previous poller task ended abnormally: {}", e);
            }
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_schedule(
            Arc::clone(&self.sweeper),
            self.initial_delay,
            self.interval,
            cancel.clone(),
        ));

        info!(
            "Availability poller started (first sweep in {:?}, then every {:?})",
            self.initial_delay, self.interval
        );
        *task = Some(RunningTask { cancel, handle });
    }

    /// Stop the periodic schedule
    ///
    /// Cancels any in-flight sweep (between or during lookups) and waits for
    /// the task to exit. Returns `false` if the poller was not running.
    pub async fn stop(&self) -> bool {
        let Some(running) = self.task.lock().await.take() else {
            return false;
        };

        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            warn!("Poller task ended abnormally: {}", e);
        }

        info!("Availability poller stopped");
        true
    }

    /// Current lifecycle state
    pub async fn state(&self) -> PollerState {
        match self.task.lock().await.as_ref() {
            Some(running) if !running.handle.is_finished() => PollerState::Running,
            _ => PollerState::Stopped,
        }
    }

    /// Run one sweep now, outside the schedule
    ///
    /// Useful for an explicit "check now" and for tests; it cannot be
    /// interrupted by [`stop`](Self::stop).
    pub async fn sweep(&self) -> SweepReport {
        self.sweeper.sweep(&CancellationToken::new()).await
    }
}

impl Drop for AvailabilityPoller {
    fn drop(&mut self) {
        if let Some(running) = self.task.get_mut().take() {
            running.cancel.cancel();
        }
    }
}

/// Body of the poller task: initial delay, then one sweep per period
async fn run_schedule(
    sweeper: Arc<Sweeper>,
    initial_delay: Duration,
    interval: Duration,
    cancel: CancellationToken,
) {
    sweeper.emit_event(PollerEvent::Started);

    let mut ticker = tokio::time::interval_at(Instant::now() + initial_delay, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("Poller cancellation received");
                break;
            }

            _ = ticker.tick() => {
                let report = sweeper.sweep(&cancel).await;
                debug!("Sweep finished: {:?}", report);
            }
        }
    }

    sweeper.emit_event(PollerEvent::Stopped {
        reason: "Cancelled".to_string(),
    });
}

impl Sweeper {
    /// One pass over every watched name
    async fn sweep(&self, cancel: &CancellationToken) -> SweepReport {
        let names = self.watchlist.list().await;
        if names.is_empty() {
            debug!("Watchlist empty, skipping sweep");
            self.emit_event(PollerEvent::SweepSkipped);
            return SweepReport {
                skipped: true,
                ..SweepReport::default()
            };
        }

        let total = names.len();
        let mut report = SweepReport::default();

        for (index, name) in names.iter().enumerate() {
            let lookup = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.lookup.availability(name, self.timeouts) => Some(result),
            };

            let Some(result) = lookup else {
                return self.interrupted(report, total - index);
            };

            match result {
                Ok(outcome) => self.observe(name, outcome.is_available(), &mut report).await,
                Err(e) => {
                    // Unknown: no transition, no state write
                    debug!("Availability check for {} failed: {}", name, e);
                    report.unknown += 1;
                    self.emit_event(PollerEvent::CheckFailed {
                        name: name.clone(),
                        error: e.to_string(),
                    });
                }
            }

            // Rate limiting between checks
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return self.interrupted(report, total - index - 1);
                }
                _ = tokio::time::sleep(self.rate_limit_delay) => {}
            }
        }

        self.emit_event(PollerEvent::SweepCompleted {
            checked: report.checked,
            unknown: report.unknown,
        });
        report
    }

    /// Record an observation and fire the edge-triggered notification
    async fn observe(&self, name: &str, available: bool, report: &mut SweepReport) {
        let previous = match self.watchlist.record_observation(name, available).await {
            Observation::Recorded { previous } => previous,
            Observation::NotWatched => {
                debug!("{} was unwatched during the sweep, dropping observation", name);
                return;
            }
        };

        report.checked += 1;
        self.emit_event(PollerEvent::NameChecked {
            name: name.to_string(),
            available,
            previous,
        });

        // Only taken → available fires; a first observation never does
        if available && previous == Some(false) {
            info!("Watched name {} is now available", name);
            self.sink.name_available(name);
            report.notified.push(name.to_string());
            self.emit_event(PollerEvent::BecameAvailable {
                name: name.to_string(),
            });
        }
    }

    fn interrupted(&self, mut report: SweepReport, remaining: usize) -> SweepReport {
        debug!("Sweep interrupted with {} names left", remaining);
        report.interrupted = true;
        self.emit_event(PollerEvent::SweepInterrupted { remaining });
        report
    }

    /// Emit a poller event
    fn emit_event(&self, event: PollerEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Poller event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::trace!("Poller event receiver dropped");
            }
        }
    }
}
