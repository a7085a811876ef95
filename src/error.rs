use thiserror::Error;

/// Errors surfaced by the resilience layer.
///
/// Variants carry owned strings and the enum is `Clone` so that a single
/// failure can be fanned out identically to every waiter of a collapsed
/// group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaultlineError {
    /// Programming-contract violation: surfaced synchronously to the caller,
    /// never retried, never recovered internally.
    #[error("Usage error: {0}")]
    Usage(String),

    /// The representative command's operation failed. Captured once per group
    /// and broadcast to every deferred result bound to it.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The owning scope was discarded before the outcome was produced.
    #[error("Scope discarded before the result was produced")]
    ScopeDiscarded,
}

pub type Result<T> = std::result::Result<T, FaultlineError>;
