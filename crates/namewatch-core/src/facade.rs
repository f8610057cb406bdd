//! Command facade
//!
//! Turns user commands into calls on the lookup client, the result cache and
//! the watchlist, and returns a typed report for every outcome. Rendering is
//! left to the front-end.
//!
//! ## History Resolution
//!
//! 1. Live lookup; a success is written to the cache
//! 2. Lookup unreachable or rejected: any cached entry, however old
//! 3. Nothing cached: an explicit failure report
//!
//! ## Cooldown
//!
//! The three remote commands share one cooldown per session. While cooling
//! down, a history check is still answered from a fresh cache entry.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{CachedEntry, ResultCache, duration_ms};
use crate::config::{CommandConfig, LookupConfig};
use crate::error::{Error, Result};
use crate::names::{validate_gamertag, validate_name};
use crate::traits::{AvailabilityLookup, Clock, HistoryLookup, LookupClient, LookupTimeouts};
use crate::watchlist::WatchlistStore;

/// Why a stale cache entry was served instead of a live answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The history service could not be reached
    Unreachable,
    /// The history service answered with a failure
    Rejected { message: String },
    /// Anything else went wrong during the lookup
    Error { message: String },
}

impl FallbackReason {
    fn from_error(error: &Error) -> Self {
        if error.is_transport() {
            Self::Unreachable
        } else {
            Self::Error {
                message: error.to_string(),
            }
        }
    }

    /// Message shown when no cached entry can stand in
    fn failure_message(&self) -> String {
        match self {
            Self::Unreachable => "Could not connect to API".to_string(),
            Self::Rejected { message } | Self::Error { message } => message.clone(),
        }
    }
}

/// Outcome of a name-history command
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryReport {
    /// Fresh answer from the history service
    Live { profile: Value },

    /// Served from a fresh cache entry because the session is cooling down
    Cached { profile: Value, age_ms: i64 },

    /// Live lookup failed; served from a cache entry of any age
    Stale {
        profile: Value,
        age_ms: i64,
        reason: FallbackReason,
    },

    /// Service answered successfully but had no profile
    NotFound,

    /// Live lookup failed and nothing was cached
    Failed { message: String },

    /// Session must wait before the next remote command
    CoolingDown { remaining: Duration },
}

/// Outcome of a name-availability command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityReport {
    /// Name can be claimed
    Available,

    /// Name is held by an account
    Taken { current_owner: Option<String> },

    /// Service answered with a status that means neither
    Unknown { status: u16 },

    /// Service could not be asked
    Failed { message: String },

    /// Session must wait before the next remote command
    CoolingDown { remaining: Duration },
}

/// Name history of a cross-platform account
#[derive(Debug, Clone, PartialEq)]
pub enum BedrockHistory {
    /// History service knows the derived account; carries its profile
    Tracked(Value),
    /// History service has no record of the derived account, or did not answer
    NotTracked,
    /// History service answered with a document that could not be read
    Unavailable,
    /// XUID is not numeric, so no account UUID can be derived
    NotDerivable,
}

/// A resolved cross-platform account
#[derive(Debug, Clone, PartialEq)]
pub struct BedrockProfile {
    pub gamertag: String,
    pub xuid: String,
    pub floodgate_uuid: Option<String>,
    pub history: BedrockHistory,
}

/// Outcome of a cross-platform lookup command
#[derive(Debug, Clone, PartialEq)]
pub enum BedrockReport {
    /// Gamertag resolved to an XUID
    Found(BedrockProfile),

    /// Gamertag unknown, or the resolver was unreachable
    NotFound { gamertag: String },

    /// Session must wait before the next remote command
    CoolingDown { remaining: Duration },
}

/// Derive the proxy account UUID for a numeric XUID
///
/// The high 16 bits go to the fourth group and the low 48 bits to the last.
pub fn floodgate_uuid(xuid: &str) -> Option<String> {
    let xuid: i64 = xuid.trim().parse().ok()?;
    Some(format!(
        "00000000-0000-0000-{:04x}-{:012x}",
        (xuid >> 48) & 0xffff,
        xuid & 0xffff_ffff_ffff
    ))
}

/// Per-session timestamps of the last accepted remote command
struct Cooldowns {
    window_ms: i64,
    last_use: Mutex<HashMap<String, i64>>,
}

impl Cooldowns {
    fn new(window: Duration) -> Self {
        Self {
            window_ms: duration_ms(window),
            last_use: Mutex::new(HashMap::new()),
        }
    }

    fn remaining_at(&self, last: Option<i64>, now_ms: i64) -> Option<Duration> {
        let remaining = self.window_ms.saturating_sub(now_ms.saturating_sub(last?));
        (remaining > 0).then(|| Duration::from_millis(remaining as u64))
    }

    async fn remaining(&self, session: &str, now_ms: i64) -> Option<Duration> {
        let last = self.last_use.lock().await.get(session).copied();
        self.remaining_at(last, now_ms)
    }

    /// Start a new window unless one is still running
    async fn try_acquire(&self, session: &str, now_ms: i64) -> std::result::Result<(), Duration> {
        let mut last_use = self.last_use.lock().await;
        if let Some(remaining) = self.remaining_at(last_use.get(session).copied(), now_ms) {
            return Err(remaining);
        }
        last_use.insert(session.to_string(), now_ms);
        Ok(())
    }
}

/// Entry point for every user command
pub struct CommandFacade {
    lookup: Arc<dyn LookupClient>,
    cache: Arc<ResultCache>,
    watchlist: Arc<WatchlistStore>,
    clock: Arc<dyn Clock>,
    on_demand_timeouts: LookupTimeouts,
    bedrock_timeouts: LookupTimeouts,
    cooldowns: Cooldowns,
}

impl CommandFacade {
    /// Create a facade over shared services
    pub fn new(
        lookup: Arc<dyn LookupClient>,
        cache: Arc<ResultCache>,
        watchlist: Arc<WatchlistStore>,
        clock: Arc<dyn Clock>,
        lookup_config: &LookupConfig,
        commands: &CommandConfig,
    ) -> Self {
        Self {
            lookup,
            cache,
            watchlist,
            clock,
            on_demand_timeouts: lookup_config.on_demand_timeouts(),
            bedrock_timeouts: lookup_config.bedrock_timeouts(),
            cooldowns: Cooldowns::new(Duration::from_millis(commands.cooldown_ms)),
        }
    }

    /// Look up the name history of `name`
    ///
    /// Returns `Err` only for invalid input; every lookup outcome is a report.
    pub async fn check_history(&self, session: &str, name: &str) -> Result<HistoryReport> {
        validate_name(name)?;

        let now = self.clock.now_ms();
        if let Err(remaining) = self.cooldowns.try_acquire(session, now).await {
            if let Some(CachedEntry {
                payload: Some(profile),
                captured_at_ms,
                ..
            }) = self.cache.get_fresh(name).await
            {
                debug!("Session {} cooling down, serving {} from cache", session, name);
                return Ok(HistoryReport::Cached {
                    profile,
                    age_ms: now.saturating_sub(captured_at_ms),
                });
            }
            return Ok(HistoryReport::CoolingDown { remaining });
        }

        let reason = match self.lookup.name_history(name, self.on_demand_timeouts).await {
            Ok(HistoryLookup::Found(profile)) => {
                let identifier = profile
                    .get("uuid")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                self.cache
                    .put(name, identifier, Some(profile.clone()), false)
                    .await;
                return Ok(HistoryReport::Live { profile });
            }
            Ok(HistoryLookup::Empty) => return Ok(HistoryReport::NotFound),
            Ok(HistoryLookup::NotFound) => FallbackReason::Rejected {
                message: "Player not found".to_string(),
            },
            Ok(HistoryLookup::Rejected { message }) => FallbackReason::Rejected { message },
            Err(e) => {
                warn!("History lookup for {} failed: {}", name, e);
                FallbackReason::from_error(&e)
            }
        };

        Ok(self.stale_fallback(name, reason).await)
    }

    async fn stale_fallback(&self, name: &str, reason: FallbackReason) -> HistoryReport {
        match self.cache.get_any(name).await {
            Some(CachedEntry {
                payload: Some(profile),
                captured_at_ms,
                ..
            }) => {
                info!("Serving stale cache entry for {} ({:?})", name, reason);
                HistoryReport::Stale {
                    profile,
                    age_ms: self.clock.now_ms().saturating_sub(captured_at_ms),
                    reason,
                }
            }
            _ => HistoryReport::Failed {
                message: reason.failure_message(),
            },
        }
    }

    /// Check whether `name` can be claimed right now
    pub async fn check_availability(&self, session: &str, name: &str) -> Result<AvailabilityReport> {
        validate_name(name)?;

        let now = self.clock.now_ms();
        if let Err(remaining) = self.cooldowns.try_acquire(session, now).await {
            return Ok(AvailabilityReport::CoolingDown { remaining });
        }

        let report = match self.lookup.availability(name, self.on_demand_timeouts).await {
            Ok(AvailabilityLookup::Available) => AvailabilityReport::Available,
            Ok(AvailabilityLookup::Taken { current_owner }) => {
                AvailabilityReport::Taken { current_owner }
            }
            Err(Error::UnexpectedStatus { status, .. }) => AvailabilityReport::Unknown { status },
            Err(e) => {
                warn!("Availability lookup for {} failed: {}", name, e);
                AvailabilityReport::Failed {
                    message: e.to_string(),
                }
            }
        };

        Ok(report)
    }

    /// Resolve a cross-platform gamertag and fetch the derived account's history
    pub async fn check_bedrock(&self, session: &str, gamertag: &str) -> Result<BedrockReport> {
        validate_gamertag(gamertag)?;
        let gamertag = gamertag.trim();

        let now = self.clock.now_ms();
        if let Err(remaining) = self.cooldowns.try_acquire(session, now).await {
            return Ok(BedrockReport::CoolingDown { remaining });
        }

        let xuid = match self.lookup.resolve_xuid(gamertag, self.bedrock_timeouts).await {
            Ok(Some(xuid)) => xuid,
            Ok(None) => {
                return Ok(BedrockReport::NotFound {
                    gamertag: gamertag.to_string(),
                });
            }
            Err(e) => {
                debug!("XUID lookup for {} failed: {}", gamertag, e);
                return Ok(BedrockReport::NotFound {
                    gamertag: gamertag.to_string(),
                });
            }
        };

        let floodgate_uuid = floodgate_uuid(&xuid);
        let history = match &floodgate_uuid {
            Some(uuid) => self.bedrock_history(uuid).await,
            None => BedrockHistory::NotDerivable,
        };

        Ok(BedrockReport::Found(BedrockProfile {
            gamertag: gamertag.to_string(),
            xuid,
            floodgate_uuid,
            history,
        }))
    }

    async fn bedrock_history(&self, uuid: &str) -> BedrockHistory {
        match self.lookup.name_history(uuid, self.on_demand_timeouts).await {
            Ok(HistoryLookup::Found(profile)) => BedrockHistory::Tracked(profile),
            Ok(_) => BedrockHistory::NotTracked,
            Err(e @ Error::Lookup { .. }) => {
                debug!("History for {} could not be read: {}", uuid, e);
                BedrockHistory::Unavailable
            }
            Err(e) => {
                debug!("History lookup for {} failed: {}", uuid, e);
                BedrockHistory::NotTracked
            }
        }
    }

    /// Time left before `session` may run another remote command
    pub async fn cooldown(&self, session: &str) -> Option<Duration> {
        self.cooldowns.remaining(session, self.clock.now_ms()).await
    }

    /// Add `name` to the watchlist; `false` if already watched
    pub async fn watch(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        Ok(self.watchlist.add(name).await)
    }

    /// Remove `name` from the watchlist; `false` if it was not watched
    pub async fn unwatch(&self, name: &str) -> bool {
        self.watchlist.remove(name).await
    }

    /// Watched names with their last observed availability
    pub async fn watchlist(&self) -> Vec<(String, Option<bool>)> {
        let names: BTreeSet<String> = self.watchlist.list().await;
        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let last_known = self.watchlist.last_known(&name).await;
            entries.push((name, last_known));
        }
        entries
    }

    /// Empty the watchlist; returns how many names were removed
    pub async fn clear_watchlist(&self) -> usize {
        let count = self.watchlist.len().await;
        self.watchlist.clear().await;
        count
    }

    /// Number of cached lookup results, fresh or stale
    pub async fn cache_size(&self) -> usize {
        self.cache.len().await
    }

    /// Drop every cached result; returns how many were removed
    pub async fn clear_cache(&self) -> usize {
        let count = self.cache.len().await;
        self.cache.clear().await;
        count
    }
}
