//! # Statistics events
//!
//! Outbound stream of per-execution events for an external dashboard
//! consumer. Publish/subscribe lives here and only here; the request log is
//! populated by direct calls, never through this stream.

pub mod publisher;

pub use publisher::{CommandEvent, CommandOutcome, StatisticsPublisher};
