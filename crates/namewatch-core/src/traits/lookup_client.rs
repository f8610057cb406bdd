// # Lookup Client Trait
//
// Defines the interface for querying the remote identity-lookup services.
//
// ## Implementations
//
// - HTTP: `namewatch-http` crate
// - Tests: scripted doubles in `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use namewatch_core::LookupClient;
// use namewatch_core::traits::AvailabilityLookup;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let client = /* LookupClient implementation */;
//
//     match client.availability("Steve", timeouts).await? {
//         AvailabilityLookup::Available => println!("free"),
//         AvailabilityLookup::Taken { .. } => println!("taken"),
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::time::Duration;

/// Connect and read timeouts applied to a single lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTimeouts {
    /// Time allowed to establish the connection
    pub connect: Duration,
    /// Time allowed to receive the response once connected
    pub read: Duration,
}

impl LookupTimeouts {
    /// Build timeouts from whole seconds
    pub fn from_secs(connect: u64, read: u64) -> Self {
        Self {
            connect: Duration::from_secs(connect),
            read: Duration::from_secs(read),
        }
    }

    /// Upper bound for the whole request
    pub fn total(&self) -> Duration {
        self.connect + self.read
    }
}

/// Outcome of a name-history lookup
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryLookup {
    /// Upstream returned a profile document (the `data` object)
    Found(serde_json::Value),

    /// Upstream reported success but carried no `data` object
    Empty,

    /// Upstream answered not-found (HTTP 404 or 204)
    NotFound,

    /// Upstream answered with an explicit failure payload
    Rejected {
        /// Message from the failure payload
        message: String,
    },
}

/// Outcome of an availability lookup
///
/// Transport failures and unexpected statuses are returned as errors; callers
/// treat those as "unknown".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityLookup {
    /// Upstream signalled not-found (HTTP 404 or 204)
    Available,

    /// Upstream returned an account for the name
    Taken {
        /// Current holder of the name, when the response carries it
        current_owner: Option<String>,
    },
}

impl AvailabilityLookup {
    /// Whether the name can be claimed
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Trait for identity-lookup clients
///
/// Each method performs exactly one remote call. Implementations must not
/// retry, cache, or spawn tasks: retries do not exist in this system, caching
/// belongs to [`crate::cache::ResultCache`] and scheduling to
/// [`crate::poller::AvailabilityPoller`].
///
/// # Thread Safety
///
/// Implementations must be safe to call concurrently from command tasks and
/// the poller task.
#[async_trait]
pub trait LookupClient: Send + Sync {
    /// Fetch the name history document for a name (or account UUID)
    ///
    /// # Returns
    ///
    /// - `Ok(HistoryLookup)`: Upstream answered with a recognised shape
    /// - `Err(Error::Transport)`: No answer (timeout, refused, DNS)
    /// - `Err(Error::UnexpectedStatus)`: Answer with an unrecognised status
    async fn name_history(
        &self,
        name: &str,
        timeouts: LookupTimeouts,
    ) -> Result<HistoryLookup, crate::Error>;

    /// Check whether a name is currently claimable
    ///
    /// # Returns
    ///
    /// - `Ok(Available)`: HTTP 404 or 204
    /// - `Ok(Taken)`: HTTP 200
    /// - `Err(Error)`: Anything else, to be treated as unknown
    async fn availability(
        &self,
        name: &str,
        timeouts: LookupTimeouts,
    ) -> Result<AvailabilityLookup, crate::Error>;

    /// Resolve a cross-platform gamertag to its XUID
    ///
    /// # Returns
    ///
    /// - `Ok(Some(xuid))`: Account found
    /// - `Ok(None)`: Account not found
    /// - `Err(Error)`: Service unreachable or unexpected answer
    async fn resolve_xuid(
        &self,
        gamertag: &str,
        timeouts: LookupTimeouts,
    ) -> Result<Option<String>, crate::Error>;

    /// Short name used in logs
    fn client_name(&self) -> &'static str;
}
