//! Test doubles and common utilities for contract tests
//!
//! This module provides scripted lookup clients and recording sinks so the
//! poller and the facade can be driven without any network.

#![allow(dead_code)]

use async_trait::async_trait;
use namewatch_core::error::{Error, Result};
use namewatch_core::traits::{
    AvailabilityLookup, HistoryLookup, LookupClient, LookupTimeouts, ManualClock, NotificationSink,
};
use namewatch_core::{CommandConfig, LookupConfig, PollerConfig, ResultCache, WatchlistStore};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted availability answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Taken,
    /// Transport failure
    Unreachable,
    /// Upstream answered with this status
    Status(u16),
}

/// One scripted history answer
#[derive(Debug, Clone)]
pub enum History {
    Found(serde_json::Value),
    Empty,
    NotFound,
    Rejected(&'static str),
    Unreachable,
    Malformed,
}

/// A LookupClient whose answers are scripted per name
///
/// Each name has a queue of answers; the last answer repeats once the queue
/// is drained. Names without a script are taken / not found.
#[derive(Default)]
pub struct ScriptedLookupClient {
    availability: Mutex<HashMap<String, VecDeque<Availability>>>,
    history: Mutex<HashMap<String, VecDeque<History>>>,
    xuids: Mutex<HashMap<String, Result<Option<String>>>>,
    availability_calls: AtomicUsize,
    history_calls: AtomicUsize,
    xuid_calls: AtomicUsize,
    checked: Mutex<Vec<String>>,
    /// Delay applied to every availability call
    pub availability_delay: Mutex<Duration>,
}

impl ScriptedLookupClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the availability answers for `name`
    pub fn script_availability(&self, name: &str, answers: &[Availability]) {
        self.availability
            .lock()
            .unwrap()
            .insert(name.to_lowercase(), answers.iter().copied().collect());
    }

    /// Script the history answers for `name`
    pub fn script_history(&self, name: &str, answers: Vec<History>) {
        self.history
            .lock()
            .unwrap()
            .insert(name.to_lowercase(), answers.into_iter().collect());
    }

    /// Script the XUID answer for `gamertag`
    pub fn script_xuid(&self, gamertag: &str, answer: Result<Option<String>>) {
        self.xuids
            .lock()
            .unwrap()
            .insert(gamertag.to_string(), answer);
    }

    /// Slow down every availability call
    pub fn set_availability_delay(&self, delay: Duration) {
        *self.availability_delay.lock().unwrap() = delay;
    }

    pub fn availability_calls(&self) -> usize {
        self.availability_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn xuid_calls(&self) -> usize {
        self.xuid_calls.load(Ordering::SeqCst)
    }

    /// Names passed to availability(), in call order
    pub fn checked_names(&self) -> Vec<String> {
        self.checked.lock().unwrap().clone()
    }

    fn next<T: Clone>(queues: &Mutex<HashMap<String, VecDeque<T>>>, name: &str) -> Option<T> {
        let mut queues = queues.lock().unwrap();
        let queue = queues.get_mut(&name.to_lowercase())?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl LookupClient for ScriptedLookupClient {
    async fn name_history(&self, name: &str, _timeouts: LookupTimeouts) -> Result<HistoryLookup> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);

        match Self::next(&self.history, name).unwrap_or(History::NotFound) {
            History::Found(profile) => Ok(HistoryLookup::Found(profile)),
            History::Empty => Ok(HistoryLookup::Empty),
            History::NotFound => Ok(HistoryLookup::NotFound),
            History::Rejected(message) => Ok(HistoryLookup::Rejected {
                message: message.to_string(),
            }),
            History::Unreachable => Err(Error::transport("connection refused")),
            History::Malformed => Err(Error::lookup("history", "malformed response")),
        }
    }

    async fn availability(
        &self,
        name: &str,
        _timeouts: LookupTimeouts,
    ) -> Result<AvailabilityLookup> {
        self.availability_calls.fetch_add(1, Ordering::SeqCst);
        self.checked.lock().unwrap().push(name.to_string());

        let delay = *self.availability_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match Self::next(&self.availability, name).unwrap_or(Availability::Taken) {
            Availability::Available => Ok(AvailabilityLookup::Available),
            Availability::Taken => Ok(AvailabilityLookup::Taken {
                current_owner: Some(name.to_string()),
            }),
            Availability::Unreachable => Err(Error::transport("timed out")),
            Availability::Status(status) => Err(Error::unexpected_status("availability", status)),
        }
    }

    async fn resolve_xuid(
        &self,
        gamertag: &str,
        _timeouts: LookupTimeouts,
    ) -> Result<Option<String>> {
        self.xuid_calls.fetch_add(1, Ordering::SeqCst);

        match self.xuids.lock().unwrap().get(gamertag) {
            Some(Ok(xuid)) => Ok(xuid.clone()),
            Some(Err(e)) => Err(Error::transport(e.to_string())),
            None => Ok(None),
        }
    }

    fn client_name(&self) -> &'static str {
        "scripted"
    }
}

/// A NotificationSink that records every notification
#[derive(Default)]
pub struct RecordingSink {
    notified: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notified(&self) -> Vec<String> {
        self.notified.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn name_available(&self, name: &str) {
        self.notified.lock().unwrap().push(name.to_string());
    }
}

/// Poller settings with no pauses, for sweep-level tests
pub fn fast_poller_config() -> PollerConfig {
    PollerConfig {
        rate_limit_delay_ms: 0,
        ..PollerConfig::default()
    }
}

/// Watchlist stored under `dir`, pre-filled with `names`
pub async fn watchlist_with(dir: &Path, names: &[&str]) -> Arc<WatchlistStore> {
    let store = WatchlistStore::load(dir.join("watchlist.json")).await;
    for name in names {
        store.add(name).await;
    }
    Arc::new(store)
}

/// Cache stored under `dir` driven by `clock`
pub async fn cache_in(dir: &Path, clock: &ManualClock) -> Arc<ResultCache> {
    Arc::new(
        ResultCache::load(
            dir.join("cache.json"),
            Arc::new(clock.clone()),
            Duration::from_secs(30 * 60),
        )
        .await,
    )
}

/// Default lookup and command settings
pub fn command_settings() -> (LookupConfig, CommandConfig) {
    (LookupConfig::default(), CommandConfig::default())
}
