//! # Command boundary
//!
//! The unit of work this crate wraps is external: retry, fallback, and
//! transport all live inside the command implementation. The core only needs
//! two things from it: metadata ([`CommandMeta`]) for caching decisions and
//! statistics pass-through, and an asynchronous operation ([`Command::run`])
//! it will invoke at most once per representative selection.

use crate::config::Settings;
use crate::error::Result;
use async_trait::async_trait;

/// Metadata every command exposes regardless of its result type.
///
/// Object-safe on purpose: the request log and the statistics stream hold
/// commands of heterogeneous result types behind `Arc<dyn CommandMeta>`.
pub trait CommandMeta: Send + Sync {
    /// Identity key for downstream statistics (per-dependency health view).
    fn command_key(&self) -> &str;

    /// Optional grouping key for downstream statistics.
    fn command_group_key(&self) -> Option<&str> {
        None
    }

    /// Cache key; absence means the command is not cacheable.
    fn cache_key(&self) -> Option<String> {
        None
    }

    /// The settings snapshot this command was built with.
    fn settings(&self) -> &Settings;
}

/// A unit of work producing a `T` asynchronously.
///
/// `run` must be safely invocable exactly once per representative selection;
/// the collapsing cache guarantees it never invokes a group's representative
/// more than once. Implementations map their own failures into
/// [`FaultlineError::ExecutionFailed`](crate::FaultlineError::ExecutionFailed)
/// so one outcome can fan out to every waiter.
#[async_trait]
pub trait Command<T>: CommandMeta
where
    T: Clone + Send + Sync + 'static,
{
    async fn run(&self) -> Result<T>;
}
