//! # Circuit breaking
//!
//! Per-dependency gate consulted before issuing a real call: protect a
//! failing dependency from sustained call volume, then probe for recovery
//! with a single test call instead of reopening the floodgate.
//!
//! The gate never raises errors; every outcome is a boolean permission.
//! Breaker state outlives any scope: one [`DefaultCircuitBreaker`] per
//! dependency, held in a [`CircuitBreakerRegistry`] and shared by `Arc`
//! rather than through a global singleton.

pub mod breaker;
pub mod registry;

pub use breaker::{CircuitBreaker, CircuitState, DefaultCircuitBreaker, StubCircuitBreaker};
pub use registry::CircuitBreakerRegistry;
