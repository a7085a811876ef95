//! Process-wide registry of per-dependency circuit breakers.

use crate::circuit::breaker::DefaultCircuitBreaker;
use crate::config::Settings;
use dashmap::DashMap;
use std::sync::Arc;

/// One breaker per dependency name, created lazily on first use and shared by
/// reference. Lives for the process lifetime, outliving any scope.
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    settings: Settings,
    breakers: DashMap<String, Arc<DefaultCircuitBreaker>>,
}

impl CircuitBreakerRegistry {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            breakers: DashMap::new(),
        }
    }

    /// Shared breaker for `dependency`, created on first use with the
    /// registry's thresholds.
    pub fn breaker(&self, dependency: &str) -> Arc<DefaultCircuitBreaker> {
        self.breakers
            .entry(dependency.to_string())
            .or_insert_with(|| {
                Arc::new(DefaultCircuitBreaker::new(
                    dependency,
                    self.settings.circuit_breaker_failure_threshold,
                    self.settings.circuit_breaker_sleep_window,
                ))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
