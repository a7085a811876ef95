//! # Context
//!
//! Top-level object owning the process-wide pieces: settings, the
//! per-dependency circuit breaker registry, and the statistics publisher.
//! Scoped components (collapsing cache, request log) are created per unit of
//! work by the host; the context is what they and the dependency owners share
//! by reference.

use crate::circuit::{CircuitBreaker, CircuitBreakerRegistry, StubCircuitBreaker};
use crate::config::Settings;
use crate::events::{CommandEvent, StatisticsPublisher};
use std::sync::Arc;

pub struct FaultlineContext {
    settings: Settings,
    breakers: CircuitBreakerRegistry,
    statistics: StatisticsPublisher,
    stub: Arc<StubCircuitBreaker>,
}

impl FaultlineContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            breakers: CircuitBreakerRegistry::new(settings.clone()),
            statistics: StatisticsPublisher::default(),
            stub: Arc::new(StubCircuitBreaker),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn statistics(&self) -> &StatisticsPublisher {
        &self.statistics
    }

    pub fn circuit_breakers_enabled(&self) -> bool {
        self.settings.circuit_breaker_enabled
    }

    /// Shared breaker for `dependency`; the always-allow stub when circuit
    /// breaking is disabled, so callers never branch on the setting.
    pub fn breaker(&self, dependency: &str) -> Arc<dyn CircuitBreaker> {
        if self.settings.circuit_breaker_enabled {
            self.breakers.breaker(dependency)
        } else {
            Arc::clone(&self.stub) as Arc<dyn CircuitBreaker>
        }
    }

    /// Publish a completed-command event when global statistics are enabled.
    pub fn publish_command_event(&self, event: CommandEvent) {
        if self.settings.log_global_statistics {
            self.statistics.publish(event);
        }
    }
}

impl Default for FaultlineContext {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
