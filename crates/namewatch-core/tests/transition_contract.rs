//! Contract Test: Availability Transitions
//!
//! This test verifies that the poller notifies exactly once per
//! taken → available transition and never otherwise.
//!
//! Constraints verified:
//! - Edge-trigger only: a first observation never notifies
//! - Unknown outcomes write no state and fire nothing
//! - Per-name failures never abort a sweep
//! - An empty watchlist makes no remote calls
//!
//! If this test fails, someone has made notifications level-triggered or let
//! a failed lookup overwrite the last known state.

mod common;

use common::*;
use namewatch_core::AvailabilityPoller;
use namewatch_core::poller::PollerEvent;
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn taken_taken_available_available_notifies_once() {
    let dir = tempdir().unwrap();
    let lookup = Arc::new(ScriptedLookupClient::new());
    lookup.script_availability(
        "Steve",
        &[
            Availability::Taken,
            Availability::Taken,
            Availability::Available,
            Availability::Available,
        ],
    );
    let sink = Arc::new(RecordingSink::new());
    let watchlist = watchlist_with(dir.path(), &["Steve"]).await;

    let (poller, _events) =
        AvailabilityPoller::new(lookup.clone(), watchlist, sink.clone(), &fast_poller_config())
            .unwrap();

    let mut notified_on = Vec::new();
    for sweep in 1..=4 {
        let report = poller.sweep().await;
        if !report.notified.is_empty() {
            notified_on.push(sweep);
        }
    }

    assert_eq!(notified_on, vec![3], "only the 2nd→3rd transition notifies");
    assert_eq!(sink.notified(), vec!["steve".to_string()]);
    assert_eq!(lookup.availability_calls(), 4);
}

#[tokio::test]
async fn first_observation_available_notifies_nothing() {
    let dir = tempdir().unwrap();
    let lookup = Arc::new(ScriptedLookupClient::new());
    lookup.script_availability("alex", &[Availability::Available]);
    let sink = Arc::new(RecordingSink::new());
    let watchlist = watchlist_with(dir.path(), &["Alex"]).await;

    let (poller, _events) = AvailabilityPoller::new(
        lookup,
        watchlist.clone(),
        sink.clone(),
        &fast_poller_config(),
    )
    .unwrap();

    poller.sweep().await;
    poller.sweep().await;

    assert!(sink.notified().is_empty());
    assert_eq!(watchlist.last_known("alex").await, Some(true));
}

#[tokio::test]
async fn failed_lookup_leaves_state_and_sweep_continues() {
    let dir = tempdir().unwrap();
    let lookup = Arc::new(ScriptedLookupClient::new());
    lookup.script_availability("alex", &[Availability::Taken, Availability::Unreachable]);
    lookup.script_availability("steve", &[Availability::Taken, Availability::Available]);
    let sink = Arc::new(RecordingSink::new());
    let watchlist = watchlist_with(dir.path(), &["Alex", "Steve"]).await;

    let (poller, _events) = AvailabilityPoller::new(
        lookup.clone(),
        watchlist.clone(),
        sink.clone(),
        &fast_poller_config(),
    )
    .unwrap();

    poller.sweep().await;
    let report = poller.sweep().await;

    // alex failed first in sorted order, steve was still checked
    assert_eq!(report.unknown, 1);
    assert_eq!(report.checked, 1);
    assert_eq!(lookup.availability_calls(), 4);
    assert_eq!(watchlist.last_known("alex").await, Some(false));
    assert_eq!(sink.notified(), vec!["steve".to_string()]);
}

#[tokio::test]
async fn unexpected_status_is_unknown_not_a_transition() {
    let dir = tempdir().unwrap();
    let lookup = Arc::new(ScriptedLookupClient::new());
    lookup.script_availability(
        "steve",
        &[
            Availability::Taken,
            Availability::Status(503),
            Availability::Available,
        ],
    );
    let sink = Arc::new(RecordingSink::new());
    let watchlist = watchlist_with(dir.path(), &["steve"]).await;

    let (poller, _events) = AvailabilityPoller::new(
        lookup,
        watchlist.clone(),
        sink.clone(),
        &fast_poller_config(),
    )
    .unwrap();

    poller.sweep().await;
    poller.sweep().await;
    assert_eq!(watchlist.last_known("steve").await, Some(false));
    assert!(sink.notified().is_empty());

    // taken → (unknown) → available still counts as a transition
    poller.sweep().await;
    assert_eq!(sink.notified(), vec!["steve".to_string()]);
}

#[tokio::test]
async fn empty_watchlist_makes_no_calls() {
    let dir = tempdir().unwrap();
    let lookup = Arc::new(ScriptedLookupClient::new());
    let watchlist = watchlist_with(dir.path(), &[]).await;

    let (poller, mut events) = AvailabilityPoller::new(
        lookup.clone(),
        watchlist,
        Arc::new(RecordingSink::new()),
        &fast_poller_config(),
    )
    .unwrap();

    let report = poller.sweep().await;

    assert!(report.skipped);
    assert_eq!(lookup.availability_calls(), 0);
    assert_eq!(events.try_recv().unwrap(), PollerEvent::SweepSkipped);
}

#[tokio::test]
async fn sweep_visits_names_in_sorted_order() {
    let dir = tempdir().unwrap();
    let lookup = Arc::new(ScriptedLookupClient::new());
    let watchlist = watchlist_with(dir.path(), &["Zed", "alex", "Mira"]).await;

    let (poller, _events) = AvailabilityPoller::new(
        lookup.clone(),
        watchlist,
        Arc::new(RecordingSink::new()),
        &fast_poller_config(),
    )
    .unwrap();

    poller.sweep().await;

    assert_eq!(lookup.checked_names(), vec!["alex", "mira", "zed"]);
}

#[tokio::test]
async fn unwatch_then_rewatch_starts_without_history() {
    let dir = tempdir().unwrap();
    let lookup = Arc::new(ScriptedLookupClient::new());
    lookup.script_availability("steve", &[Availability::Taken, Availability::Available]);
    let sink = Arc::new(RecordingSink::new());
    let watchlist = watchlist_with(dir.path(), &["steve"]).await;

    let (poller, _events) = AvailabilityPoller::new(
        lookup,
        watchlist.clone(),
        sink.clone(),
        &fast_poller_config(),
    )
    .unwrap();

    poller.sweep().await;
    watchlist.remove("Steve").await;
    watchlist.add("Steve").await;
    poller.sweep().await;

    // Previous "taken" was forgotten with the unwatch
    assert!(sink.notified().is_empty());
}

#[tokio::test]
async fn events_describe_the_sweep() {
    let dir = tempdir().unwrap();
    let lookup = Arc::new(ScriptedLookupClient::new());
    lookup.script_availability("steve", &[Availability::Taken, Availability::Available]);
    let watchlist = watchlist_with(dir.path(), &["steve"]).await;

    let (poller, mut events) = AvailabilityPoller::new(
        lookup,
        watchlist,
        Arc::new(RecordingSink::new()),
        &fast_poller_config(),
    )
    .unwrap();

    poller.sweep().await;
    poller.sweep().await;

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }

    assert_eq!(
        received,
        vec![
            PollerEvent::NameChecked {
                name: "steve".to_string(),
                available: false,
                previous: None,
            },
            PollerEvent::SweepCompleted { checked: 1, unknown: 0 },
            PollerEvent::NameChecked {
                name: "steve".to_string(),
                available: true,
                previous: Some(false),
            },
            PollerEvent::BecameAvailable {
                name: "steve".to_string(),
            },
            PollerEvent::SweepCompleted { checked: 1, unknown: 0 },
        ]
    );
}
