//! Core traits for namewatch
//!
//! This module defines the seams where remote services and the host session
//! plug into the core.
//!
//! - [`LookupClient`]: Query the identity-lookup services
//! - [`NotificationSink`]: Deliver became-available notifications
//! - [`Clock`]: Wall-clock source for timestamps and cooldowns

pub mod clock;
pub mod lookup_client;
pub mod notification_sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use lookup_client::{AvailabilityLookup, HistoryLookup, LookupClient, LookupTimeouts};
pub use notification_sink::{NotificationSink, NullSink};
