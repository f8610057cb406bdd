// # namewatch-core
//
// Core library for the namewatch player-name watcher.
//
// ## Architecture Overview
//
// This library provides the core functionality for name lookups and watching:
// - **LookupClient**: Trait for the remote identity-lookup services
// - **NotificationSink**: Trait for delivering became-available notifications
// - **ResultCache**: Most recent lookup result per name, with stale fallback
// - **WatchlistStore**: Persisted set of watched names plus last-known availability
// - **AvailabilityPoller**: Periodic sweep that detects taken → available
// - **CommandFacade**: User commands in, typed reports out
// - **WorkerPool**: Bounded executor for command invocations
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from the HTTP client and the terminal
// 2. **Constructor Injection**: Paths, clock, lookup client and sink are passed in, no globals
// 3. **Never Fatal**: Persistence and lookup failures degrade, they do not abort
// 4. **Library-First**: All core functionality can be used as a library

pub mod traits;
pub mod cache;
pub mod watchlist;
pub mod poller;
pub mod facade;
pub mod workers;
pub mod config;
pub mod error;
pub mod names;
pub mod state;

// Re-export core types for convenience
pub use traits::{Clock, LookupClient, NotificationSink, SystemClock};
pub use cache::{CachedEntry, ResultCache};
pub use watchlist::WatchlistStore;
pub use poller::{AvailabilityPoller, PollerEvent, PollerState};
pub use facade::CommandFacade;
pub use workers::WorkerPool;
pub use config::{CacheConfig, CommandConfig, EndpointConfig, LookupConfig, NameWatchConfig, PollerConfig};
pub use error::{Error, Result};
