//! Result cache
//!
//! Keeps the most recent successful history lookup per case-folded name.
//!
//! ## Read Modes
//!
//! - [`ResultCache::get_fresh`]: only entries inside the freshness window
//! - [`ResultCache::get_any`]: any entry, regardless of age. Used only as a
//!   degraded-mode fallback when a live lookup cannot be completed.
//!
//! ## Persistence
//!
//! Every [`put`](ResultCache::put) and [`clear`](ResultCache::clear) rewrites
//! the whole snapshot before returning. Write failures are logged and
//! swallowed; the in-memory update always stands.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::names::case_fold;
use crate::state::SnapshotFile;
use crate::traits::Clock;

/// A cached lookup result
///
/// Serialized field names match the snapshot format on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEntry {
    /// Name as the user typed it
    #[serde(rename = "name")]
    pub queried_name: String,

    /// Account identifier resolved by the lookup, if any
    #[serde(rename = "uuid", default)]
    pub resolved_identifier: Option<String>,

    /// Last successful response document
    #[serde(rename = "data", default)]
    pub payload: Option<serde_json::Value>,

    /// Advisory availability flag; not authoritative
    #[serde(default)]
    pub available: bool,

    /// Capture time in epoch milliseconds
    #[serde(rename = "timestamp")]
    pub captured_at_ms: i64,
}

impl CachedEntry {
    /// Whether the entry is older than `ttl` at `now_ms`
    pub fn is_expired(&self, now_ms: i64, ttl: Duration) -> bool {
        self.age_ms(now_ms) > duration_ms(ttl)
    }

    /// Age of the entry at `now_ms`
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.captured_at_ms)
    }
}

/// Whole milliseconds of `duration`, clamped to `i64::MAX`
pub(crate) fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Keyed store of the most recent lookup result per name
pub struct ResultCache {
    snapshot: SnapshotFile,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: RwLock<BTreeMap<String, CachedEntry>>,
    /// Serializes snapshot writes so the last writer persists the latest map
    flush_lock: Mutex<()>,
}

impl ResultCache {
    /// Load the cache from `path`
    ///
    /// A missing or malformed snapshot yields an empty cache.
    pub async fn load<P: AsRef<Path>>(path: P, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        let snapshot = SnapshotFile::new(path);
        let loaded: BTreeMap<String, CachedEntry> = snapshot.load_or_default().await;

        let entries: BTreeMap<String, CachedEntry> = loaded
            .into_iter()
            .map(|(key, entry)| (case_fold(&key), entry))
            .collect();

        debug!("Loaded cache from {}: {} entries", snapshot.path().display(), entries.len());

        Self {
            snapshot,
            clock,
            ttl,
            entries: RwLock::new(entries),
            flush_lock: Mutex::new(()),
        }
    }

    /// Freshness window
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current time according to the cache's clock
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Insert or replace the entry for `name`, stamped with the current time
    pub async fn put(
        &self,
        name: &str,
        resolved_identifier: Option<String>,
        payload: Option<serde_json::Value>,
        available: bool,
    ) {
        let entry = CachedEntry {
            queried_name: name.to_string(),
            resolved_identifier,
            payload,
            available,
            captured_at_ms: self.clock.now_ms(),
        };

        self.entries.write().await.insert(case_fold(name), entry);
        debug!("Cached lookup result for {}", name);

        self.flush().await;
    }

    /// Entry for `name` if present and inside the freshness window
    pub async fn get_fresh(&self, name: &str) -> Option<CachedEntry> {
        let now = self.clock.now_ms();
        self.entries
            .read()
            .await
            .get(&case_fold(name))
            .filter(|entry| !entry.is_expired(now, self.ttl))
            .cloned()
    }

    /// Entry for `name` regardless of age
    pub async fn get_any(&self, name: &str) -> Option<CachedEntry> {
        self.entries.read().await.get(&case_fold(name)).cloned()
    }

    /// Whether any entry (fresh or stale) exists for `name`
    pub async fn contains(&self, name: &str) -> bool {
        self.entries.read().await.contains_key(&case_fold(name))
    }

    /// Number of entries, fresh or stale
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop every entry and persist the empty cache
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        debug!("Cache cleared");

        self.flush().await;
    }

    /// Rewrite the snapshot from the current map, logging failures
    async fn flush(&self) {
        let _guard = self.flush_lock.lock().await;
        let document = self.entries.read().await.clone();

        if let Err(e) = self.snapshot.write(&document).await {
            warn!("Failed to save cache: {}", e);
        }
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("path", &self.snapshot.path())
            .field("ttl", &self.ttl)
            .finish()
    }
}
