//! Configuration types for namewatch
//!
//! This module defines all configuration structures used throughout the crate.

use crate::traits::LookupTimeouts;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main namewatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameWatchConfig {
    /// Directory holding the cache and watchlist snapshots
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Remote endpoint configuration
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Lookup client settings
    #[serde(default)]
    pub lookup: LookupConfig,

    /// Result cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Watchlist and poller settings
    #[serde(default)]
    pub poller: PollerConfig,

    /// Command facade settings
    #[serde(default)]
    pub commands: CommandConfig,
}

impl NameWatchConfig {
    /// Create a configuration with defaults rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            endpoints: EndpointConfig::default(),
            lookup: LookupConfig::default(),
            cache: CacheConfig::default(),
            poller: PollerConfig::default(),
            commands: CommandConfig::default(),
        }
    }

    /// Path of the cache snapshot
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(&self.cache.file_name)
    }

    /// Path of the watchlist snapshot
    pub fn watchlist_path(&self) -> PathBuf {
        self.data_dir.join(&self.poller.watchlist_file_name)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(crate::Error::config("Data directory cannot be empty"));
        }

        self.endpoints.validate()?;
        self.lookup.validate()?;
        self.cache.validate()?;
        self.poller.validate()?;
        self.commands.validate()?;

        Ok(())
    }
}

impl Default for NameWatchConfig {
    fn default() -> Self {
        Self::new(default_data_dir())
    }
}

/// Base URLs of the identity-lookup services
///
/// The looked-up name is appended to each base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Name history service
    #[serde(default = "default_history_url")]
    pub history_url: String,

    /// Name availability service
    #[serde(default = "default_availability_url")]
    pub availability_url: String,

    /// Cross-platform gamertag → XUID service
    #[serde(default = "default_bedrock_url")]
    pub bedrock_url: String,
}

impl EndpointConfig {
    /// Validate the endpoint URLs
    pub fn validate(&self) -> Result<(), crate::Error> {
        for (label, url) in [
            ("history", &self.history_url),
            ("availability", &self.availability_url),
            ("bedrock", &self.bedrock_url),
        ] {
            if url.is_empty() {
                return Err(crate::Error::config(format!(
                    "The {} endpoint URL cannot be empty",
                    label
                )));
            }
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(crate::Error::config(format!(
                    "The {} endpoint must use HTTP or HTTPS. Got: {}",
                    label, url
                )));
            }
        }
        Ok(())
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            history_url: default_history_url(),
            availability_url: default_availability_url(),
            bedrock_url: default_bedrock_url(),
        }
    }
}

/// Lookup client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Fixed User-Agent header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Connect timeout for user-triggered lookups (in seconds)
    #[serde(default = "default_on_demand_timeout_secs")]
    pub on_demand_connect_secs: u64,

    /// Read timeout for user-triggered lookups (in seconds)
    #[serde(default = "default_on_demand_timeout_secs")]
    pub on_demand_read_secs: u64,

    /// Connect timeout for the XUID lookup (in seconds)
    #[serde(default = "default_short_timeout_secs")]
    pub bedrock_connect_secs: u64,

    /// Read timeout for the XUID lookup (in seconds)
    #[serde(default = "default_short_timeout_secs")]
    pub bedrock_read_secs: u64,
}

impl LookupConfig {
    /// Timeouts for history and availability commands
    pub fn on_demand_timeouts(&self) -> LookupTimeouts {
        LookupTimeouts::from_secs(self.on_demand_connect_secs, self.on_demand_read_secs)
    }

    /// Timeouts for the XUID lookup
    pub fn bedrock_timeouts(&self) -> LookupTimeouts {
        LookupTimeouts::from_secs(self.bedrock_connect_secs, self.bedrock_read_secs)
    }

    /// Validate the lookup settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.user_agent.trim().is_empty() {
            return Err(crate::Error::config("User-Agent cannot be empty"));
        }
        if self.on_demand_connect_secs == 0
            || self.on_demand_read_secs == 0
            || self.bedrock_connect_secs == 0
            || self.bedrock_read_secs == 0
        {
            return Err(crate::Error::config("Lookup timeouts must be > 0"));
        }
        Ok(())
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            on_demand_connect_secs: default_on_demand_timeout_secs(),
            on_demand_read_secs: default_on_demand_timeout_secs(),
            bedrock_connect_secs: default_short_timeout_secs(),
            bedrock_read_secs: default_short_timeout_secs(),
        }
    }
}

/// Result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Snapshot file name inside the data directory
    #[serde(default = "default_cache_file_name")]
    pub file_name: String,

    /// Freshness window (in seconds)
    ///
    /// Entries older than this are only served as a fallback when a live
    /// lookup fails.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    /// Freshness window as a duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Validate the cache settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.file_name.is_empty() {
            return Err(crate::Error::config("Cache file name cannot be empty"));
        }
        if self.ttl_secs == 0 {
            return Err(crate::Error::config("Cache TTL must be > 0"));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            file_name: default_cache_file_name(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Watchlist and availability poller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Watchlist snapshot file name inside the data directory
    #[serde(default = "default_watchlist_file_name")]
    pub watchlist_file_name: String,

    /// Period between sweeps (in seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,

    /// Delay before the first sweep (in seconds)
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,

    /// Pause between two names inside a sweep (in milliseconds)
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,

    /// Connect timeout for poller lookups (in seconds)
    #[serde(default = "default_short_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Read timeout for poller lookups (in seconds)
    #[serde(default = "default_short_timeout_secs")]
    pub read_timeout_secs: u64,

    /// Capacity of the poller event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl PollerConfig {
    /// Period between sweeps
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Delay before the first sweep
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    /// Pause between two names
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    /// Timeouts for a single poller lookup
    pub fn timeouts(&self) -> LookupTimeouts {
        LookupTimeouts::from_secs(self.connect_timeout_secs, self.read_timeout_secs)
    }

    /// Validate the poller settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.watchlist_file_name.is_empty() {
            return Err(crate::Error::config("Watchlist file name cannot be empty"));
        }
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.connect_timeout_secs == 0 || self.read_timeout_secs == 0 {
            return Err(crate::Error::config("Poller timeouts must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            watchlist_file_name: default_watchlist_file_name(),
            interval_secs: default_poll_interval_secs(),
            initial_delay_secs: default_initial_delay_secs(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            connect_timeout_secs: default_short_timeout_secs(),
            read_timeout_secs: default_short_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Command facade settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Minimum time between two remote commands from one session (in milliseconds)
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Maximum number of commands executing at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl CommandConfig {
    /// Validate the command settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_concurrent == 0 {
            return Err(crate::Error::config("Max concurrent commands must be > 0"));
        }
        Ok(())
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("namewatch")
}

fn default_history_url() -> String {
    "https://api.crafty.gg/api/v2/players/".to_string()
}

fn default_availability_url() -> String {
    "https://api.ashcon.app/mojang/v2/user/".to_string()
}

fn default_bedrock_url() -> String {
    "https://api.geysermc.org/v2/xbox/xuid/".to_string()
}

fn default_user_agent() -> String {
    format!("namewatch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_on_demand_timeout_secs() -> u64 {
    10
}

fn default_short_timeout_secs() -> u64 {
    5
}

fn default_cache_file_name() -> String {
    "cache.json".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    30 * 60
}

fn default_watchlist_file_name() -> String {
    "watchlist.json".to_string()
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_initial_delay_secs() -> u64 {
    10
}

fn default_rate_limit_delay_ms() -> u64 {
    1000
}

fn default_event_channel_capacity() -> usize {
    100
}

fn default_cooldown_ms() -> u64 {
    3000
}

fn default_max_concurrent() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = NameWatchConfig::new("/tmp/namewatch");
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.ttl(), Duration::from_secs(1800));
        assert_eq!(config.poller.interval(), Duration::from_secs(60));
        assert_eq!(config.poller.initial_delay(), Duration::from_secs(10));
        assert_eq!(config.poller.rate_limit_delay(), Duration::from_secs(1));
        assert_eq!(config.poller.timeouts(), LookupTimeouts::from_secs(5, 5));
        assert_eq!(config.lookup.on_demand_timeouts(), LookupTimeouts::from_secs(10, 10));
    }

    #[test]
    fn test_snapshot_paths() {
        let config = NameWatchConfig::new("/data");
        assert_eq!(config.cache_path(), PathBuf::from("/data/cache.json"));
        assert_eq!(config.watchlist_path(), PathBuf::from("/data/watchlist.json"));
    }

    #[test]
    fn test_rejects_bad_endpoint_scheme() {
        let mut config = NameWatchConfig::default();
        config.endpoints.availability_url = "ftp://example.com/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut config = NameWatchConfig::default();
        config.poller.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: NameWatchConfig =
            serde_json::from_str(r#"{"data_dir": "/srv/nw", "cache": {"ttl_secs": 60}}"#).unwrap();
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.file_name, "cache.json");
        assert_eq!(config.poller.interval_secs, 60);
        assert_eq!(config.commands.cooldown_ms, 3000);
    }
}
