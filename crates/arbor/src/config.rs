use serde::Deserialize;

use std::time::Duration;

/// Engine configuration.
///
/// Deserializable from any serde format; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum rows fetched for one has-many tail batch. The cap applies to
    /// the batch as a whole, so parents later in the order may receive
    /// fewer children than they own once it is reached.
    pub has_many_limit: u64,

    /// Upper bound applied to request limits. A request limit of `0` means
    /// "no limit" unless this is set.
    pub max_limit: Option<u64>,

    /// Locale used for localized fields when the request names none
    pub default_locale: Option<String>,

    pub alias_cache: CacheConfig,
}

/// Alias plan cache settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,

    /// Time to live of an entry, in seconds
    pub ttl_secs: u64,

    /// Soft budget for the estimated size of all entries
    pub max_bytes: usize,

    /// Interval of the expired-entry sweep, in seconds
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Effective `LIMIT` for a request limit.
    pub fn clamp_limit(&self, limit: u64) -> Option<u64> {
        match (limit, self.max_limit) {
            (0, max) => max,
            (limit, Some(max)) => Some(limit.min(max)),
            (limit, None) => Some(limit),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            has_many_limit: 1000,
            max_limit: None,
            default_locale: None,
            alias_cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
            max_bytes: 4 * 1024 * 1024,
            sweep_interval_secs: 60,
        }
    }
}
