//! # Settings
//!
//! Plain value object carried by every command as a snapshot and by the
//! per-scope components (request log, context) to decide what is enabled.
//! Constructed via [`SettingsBuilder`]; all fields have conservative
//! defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Behavior toggles and tuning for one scope's resilience components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Whether commands may fall back on failure (consumed by the external
    /// command implementation, passed through by this crate).
    pub fallback_enabled: bool,
    /// Whether same-cache-key requests collapse into one execution.
    pub request_cache_enabled: bool,
    /// Whether the per-scope request log serves async observers.
    pub log_request_statistics: bool,
    /// Safety-net delay before the request log drains to observers on its own.
    pub log_request_statistics_timeout: Duration,
    /// Whether completed commands are published to the statistics stream.
    pub log_global_statistics: bool,
    /// Rolling window over which downstream statistics are aggregated
    /// (pass-through; the aggregation itself lives outside this crate).
    pub rolling_time_window_interval: Duration,
    /// Whether real circuit breakers gate dependencies; when false the
    /// always-allow stub is handed out instead.
    pub circuit_breaker_enabled: bool,
    /// Consecutive failures before a breaker opens.
    pub circuit_breaker_failure_threshold: u64,
    /// How long an open breaker sleeps before permitting a single probe.
    pub circuit_breaker_sleep_window: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
            request_cache_enabled: true,
            log_request_statistics: false,
            log_request_statistics_timeout: Duration::from_secs(5),
            log_global_statistics: true,
            rolling_time_window_interval: Duration::from_secs(10),
            circuit_breaker_enabled: false,
            circuit_breaker_failure_threshold: 5,
            circuit_breaker_sleep_window: Duration::from_secs(5),
        }
    }
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }
}

/// Fluent builder over [`Settings`] defaults.
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
        }
    }

    pub fn with_fallback_enabled(mut self, enabled: bool) -> Self {
        self.settings.fallback_enabled = enabled;
        self
    }

    pub fn with_request_cache_enabled(mut self, enabled: bool) -> Self {
        self.settings.request_cache_enabled = enabled;
        self
    }

    pub fn with_log_request_statistics(mut self, enabled: bool) -> Self {
        self.settings.log_request_statistics = enabled;
        self
    }

    pub fn with_log_request_statistics_timeout(mut self, timeout: Duration) -> Self {
        self.settings.log_request_statistics_timeout = timeout;
        self
    }

    pub fn with_log_global_statistics(mut self, enabled: bool) -> Self {
        self.settings.log_global_statistics = enabled;
        self
    }

    pub fn with_rolling_time_window_interval(mut self, interval: Duration) -> Self {
        self.settings.rolling_time_window_interval = interval;
        self
    }

    pub fn with_circuit_breaker_enabled(mut self, enabled: bool) -> Self {
        self.settings.circuit_breaker_enabled = enabled;
        self
    }

    pub fn with_circuit_breaker_failure_threshold(mut self, threshold: u64) -> Self {
        self.settings.circuit_breaker_failure_threshold = threshold;
        self
    }

    pub fn with_circuit_breaker_sleep_window(mut self, window: Duration) -> Self {
        self.settings.circuit_breaker_sleep_window = window;
        self
    }

    pub fn build(self) -> Settings {
        self.settings
    }
}
