//! Watchlist store
//!
//! The set of case-folded names the user wants monitored, plus the last
//! availability the poller observed for each of them.
//!
//! Only the name set is persisted; last-known availability is rebuilt by the
//! poller after a restart. The availability map never holds a name that is
//! not in the set: [`remove`](WatchlistStore::remove) and
//! [`clear`](WatchlistStore::clear) drop both, and an observation for a name
//! that was unwatched mid-sweep is discarded.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::names::case_fold;
use crate::state::SnapshotFile;

/// Result of recording a poller observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// State written; carries the state it replaced
    Recorded {
        /// Availability seen on the previous successful check, if any
        previous: Option<bool>,
    },

    /// The name is no longer watched; nothing was written
    NotWatched,
}

#[derive(Debug, Default)]
struct WatchState {
    names: BTreeSet<String>,
    last_known: HashMap<String, bool>,
}

/// Persisted set of watched names
pub struct WatchlistStore {
    snapshot: SnapshotFile,
    state: RwLock<WatchState>,
    flush_lock: Mutex<()>,
}

impl WatchlistStore {
    /// Load the watchlist from `path`
    ///
    /// A missing or malformed snapshot yields an empty watchlist.
    pub async fn load<P: AsRef<Path>>(path: P) -> Self {
        let snapshot = SnapshotFile::new(path);
        let loaded: BTreeSet<String> = snapshot.load_or_default().await;
        let names: BTreeSet<String> = loaded.iter().map(|name| case_fold(name)).collect();

        info!("Loaded watchlist from {}: {} names", snapshot.path().display(), names.len());

        Self {
            snapshot,
            state: RwLock::new(WatchState {
                names,
                last_known: HashMap::new(),
            }),
            flush_lock: Mutex::new(()),
        }
    }

    /// Start watching `name`
    ///
    /// Returns `false` if the case-folded name is already watched.
    pub async fn add(&self, name: &str) -> bool {
        let inserted = self.state.write().await.names.insert(case_fold(name));
        if !inserted {
            return false;
        }

        debug!("Watching {}", name);
        self.flush().await;
        true
    }

    /// Stop watching `name`
    ///
    /// Returns `false` if the name was not watched. Also forgets the name's
    /// last-known availability.
    pub async fn remove(&self, name: &str) -> bool {
        let key = case_fold(name);
        let removed = {
            let mut state = self.state.write().await;
            let removed = state.names.remove(&key);
            if removed {
                state.last_known.remove(&key);
            }
            removed
        };

        if !removed {
            return false;
        }

        debug!("Stopped watching {}", name);
        self.flush().await;
        true
    }

    /// Snapshot copy of the watched names, case-folded and sorted
    pub async fn list(&self) -> BTreeSet<String> {
        self.state.read().await.names.clone()
    }

    /// Whether `name` is watched
    pub async fn is_watching(&self, name: &str) -> bool {
        self.state.read().await.names.contains(&case_fold(name))
    }

    /// Number of watched names
    pub async fn len(&self) -> usize {
        self.state.read().await.names.len()
    }

    /// Whether no names are watched
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.names.is_empty()
    }

    /// Stop watching everything
    pub async fn clear(&self) {
        {
            let mut state = self.state.write().await;
            state.names.clear();
            state.last_known.clear();
        }

        debug!("Watchlist cleared");
        self.flush().await;
    }

    /// Availability observed on the last successful check of `name`
    pub async fn last_known(&self, name: &str) -> Option<bool> {
        self.state.read().await.last_known.get(&case_fold(name)).copied()
    }

    /// Record an observed availability for `name`
    ///
    /// Reads the previous state and writes the new one under a single lock.
    /// Called only by the poller.
    pub async fn record_observation(&self, name: &str, available: bool) -> Observation {
        let key = case_fold(name);
        let mut state = self.state.write().await;

        if !state.names.contains(&key) {
            return Observation::NotWatched;
        }

        let previous = state.last_known.insert(key, available);
        Observation::Recorded { previous }
    }

    /// Rewrite the snapshot from the current name set, logging failures
    async fn flush(&self) {
        let _guard = self.flush_lock.lock().await;
        let document = self.state.read().await.names.clone();

        if let Err(e) = self.snapshot.write(&document).await {
            warn!("Failed to save watchlist: {}", e);
        }
    }
}

impl std::fmt::Debug for WatchlistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchlistStore")
            .field("path", &self.snapshot.path())
            .finish()
    }
}
