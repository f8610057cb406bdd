//! Contract Test: Snapshot Persistence
//!
//! This test verifies that the cache and the watchlist survive a restart
//! and that damaged snapshots never stop the program.
//!
//! Constraints verified:
//! - Watchlist reloads case-folded
//! - Last-known availability does not survive a restart
//! - Cleared cache stays cleared after reload
//! - Malformed snapshots load as empty

mod common;

use common::*;
use namewatch_core::traits::ManualClock;
use namewatch_core::{AvailabilityPoller, ResultCache, WatchlistStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

#[tokio::test]
async fn watchlist_survives_restart_without_last_known() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("watchlist.json");

    {
        let watchlist = Arc::new(WatchlistStore::load(&path).await);
        watchlist.add("Steve").await;
        watchlist.add("Alex").await;

        let (poller, _events) = AvailabilityPoller::new(
            Arc::new(ScriptedLookupClient::new()),
            watchlist.clone(),
            Arc::new(RecordingSink::new()),
            &fast_poller_config(),
        )
        .unwrap();
        poller.sweep().await;
        assert_eq!(watchlist.last_known("steve").await, Some(false));
    }

    let reloaded = WatchlistStore::load(&path).await;
    let names: Vec<String> = reloaded.list().await.into_iter().collect();
    assert_eq!(names, vec!["alex".to_string(), "steve".to_string()]);
    assert_eq!(reloaded.last_known("steve").await, None);
}

#[tokio::test]
async fn cleared_cache_stays_cleared() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    let clock = ManualClock::new(0);

    let cache = ResultCache::load(&path, Arc::new(clock.clone()), Duration::from_secs(1800)).await;
    cache.put("Steve", None, Some(json!({"username": "Steve"})), false).await;
    cache.clear().await;
    assert!(cache.get_any("Steve").await.is_none());

    let reloaded =
        ResultCache::load(&path, Arc::new(clock.clone()), Duration::from_secs(1800)).await;
    assert!(reloaded.get_any("Steve").await.is_none());
}

#[tokio::test]
async fn malformed_snapshots_load_empty() {
    let dir = tempdir().unwrap();
    tokio::fs::write(dir.path().join("watchlist.json"), b"{\"oops\": ")
        .await
        .unwrap();
    tokio::fs::write(dir.path().join("cache.json"), b"[1, 2, 3]")
        .await
        .unwrap();

    let watchlist = WatchlistStore::load(dir.path().join("watchlist.json")).await;
    let cache = cache_in(dir.path(), &ManualClock::new(0)).await;

    assert!(watchlist.is_empty().await);
    assert!(cache.is_empty().await);

    // And they are usable afterwards
    assert!(watchlist.add("Steve").await);
    assert!(WatchlistStore::load(dir.path().join("watchlist.json")).await.is_watching("steve").await);
}
