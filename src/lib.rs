#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Faultline
//!
//! Client-side resilience layer executed around calls to downstream
//! dependencies. Within one bounded unit of work (a *scope*, e.g. one inbound
//! request) it avoids redundant concurrent work and avoids hammering a
//! failing dependency, while giving observers visibility into what executed.
//!
//! ## Components
//!
//! - [`RequestCollapsingCache`]: deduplicates concurrent identical requests
//!   into one execution and fans the single outcome out to every waiter.
//! - [`CircuitBreaker`]: per-dependency failure gate with an explicit
//!   Closed/Open state machine and a single recovery probe; the always-allow
//!   [`StubCircuitBreaker`] is the default when breaking is disabled.
//! - [`RequestLog`]: bounded, per-scope record of executed commands with
//!   asynchronous multi-observer snapshots and scheduled draining.
//! - [`FaultlineContext`]: owns the process-wide pieces: settings, the
//!   per-dependency breaker registry, and the statistics stream.
//!
//! The unit of work itself is external: implement [`Command`] over whatever
//! transport, retry, and fallback policy the dependency needs, and let this
//! crate collapse, gate, and record it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use faultline::{
//!     Command, CommandMeta, RequestCollapsingCache, RequestLog, Result, Settings,
//! };
//! use std::sync::Arc;
//!
//! struct GetUser {
//!     settings: Settings,
//! }
//!
//! impl CommandMeta for GetUser {
//!     fn command_key(&self) -> &str {
//!         "get-user"
//!     }
//!
//!     fn cache_key(&self) -> Option<String> {
//!         Some("user:42".into())
//!     }
//!
//!     fn settings(&self) -> &Settings {
//!         &self.settings
//!     }
//! }
//!
//! #[async_trait]
//! impl Command<String> for GetUser {
//!     async fn run(&self) -> Result<String> {
//!         // Real transport lives here.
//!         Ok("user 42".to_string())
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let settings = Settings::builder().with_log_request_statistics(true).build();
//! let mut cache: RequestCollapsingCache<String> = RequestCollapsingCache::new();
//! let log = RequestLog::new(settings.clone());
//!
//! let command = Arc::new(GetUser { settings });
//! let request = cache.create_request(command.clone());
//! request.register(&mut cache);
//! let _user = request.resolve(&mut cache)?.wait().await?;
//!
//! log.add_executed_command(command);
//! log.mark_web_request_end();
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod circuit;
pub mod command;
pub mod config;
pub mod context;
pub mod deferred;
pub mod error;
pub mod events;
pub mod request_log;

pub use cache::{CollapsedRequest, RequestCollapsingCache};
pub use circuit::{
    CircuitBreaker, CircuitBreakerRegistry, CircuitState, DefaultCircuitBreaker,
    StubCircuitBreaker,
};
pub use command::{Command, CommandMeta};
pub use config::{Settings, SettingsBuilder};
pub use context::FaultlineContext;
pub use deferred::{Deferred, ResultCell};
pub use error::{FaultlineError, Result};
pub use events::{CommandEvent, CommandOutcome, StatisticsPublisher};
pub use request_log::{LogEntry, RequestLog, MAX_STORAGE};
