//! # Request log
//!
//! Bounded, per-scope record of executed commands. Producers append without
//! ever blocking or failing; appends beyond capacity are dropped with a
//! warning, because bounding memory matters more than completeness under
//! abnormal command volume. Any number of observers can subscribe for an
//! asynchronous snapshot, delivered when the scope signals completion via
//! [`RequestLog::mark_web_request_end`] or when the safety-net timer armed at
//! construction fires, whichever comes first.

use crate::command::CommandMeta;
use crate::config::Settings;
use crate::deferred::{Deferred, ResultCell};
use crate::error::{FaultlineError, Result};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// An executed command reference, immutable once appended.
pub type LogEntry = Arc<dyn CommandMeta>;

/// Maximum number of entries retained per scope.
pub const MAX_STORAGE: usize = 1000;

/// Per-scope log of executed commands with async snapshot observers.
pub struct RequestLog {
    settings: Settings,
    executed_commands: Mutex<Vec<LogEntry>>,
    observers: Mutex<Vec<Arc<ResultCell<Vec<LogEntry>>>>>,
}

impl RequestLog {
    /// Create the log for one scope. When statistics logging is enabled a
    /// one-shot drain timer is armed for scopes that never signal completion;
    /// it holds only a weak reference, so discarding the scope cancels it.
    ///
    /// Must be called from within a tokio runtime when statistics logging is
    /// enabled.
    pub fn new(settings: Settings) -> Arc<Self> {
        let log = Arc::new(Self {
            executed_commands: Mutex::new(Vec::new()),
            observers: Mutex::new(Vec::new()),
            settings,
        });

        if log.settings.log_request_statistics {
            let weak: Weak<RequestLog> = Arc::downgrade(&log);
            let timeout = log.settings.log_request_statistics_timeout;
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                if let Some(log) = weak.upgrade() {
                    debug!("Request log drain timer fired");
                    log.drain();
                }
            });
        }

        log
    }

    /// Append an executed command. Never blocks and never errors the
    /// producer; at capacity the entry is dropped with a warning.
    pub fn add_executed_command(&self, command: LogEntry) {
        let mut entries = self.executed_commands.lock();
        if entries.len() >= MAX_STORAGE {
            warn!(
                command_key = command.command_key(),
                limit = MAX_STORAGE,
                "Request log full, dropping executed command"
            );
            return;
        }
        entries.push(command);
    }

    /// Point-in-time view of all retained entries.
    pub fn get_executed_commands(&self) -> Vec<LogEntry> {
        self.executed_commands.lock().clone()
    }

    /// Register an observer for the next drain and return its deferred
    /// snapshot. Fails with a usage error when the scope's settings disable
    /// statistics logging, so useless subscriptions are rejected up front.
    pub fn executed_commands(&self) -> Result<Deferred<Vec<LogEntry>>> {
        if !self.settings.log_request_statistics {
            return Err(FaultlineError::Usage(
                "cannot observe the request log; enable log_request_statistics in settings".into(),
            ));
        }
        let cell = Arc::new(ResultCell::new());
        let deferred = cell.subscribe();
        self.observers.lock().push(cell);
        Ok(deferred)
    }

    /// Explicit drain trigger, called once when the owning scope finishes.
    pub fn mark_web_request_end(&self) {
        debug!("Web request ends, draining request log");
        self.drain();
    }

    /// Resolve every currently registered observer with the same snapshot,
    /// exactly once each. Entries are not cleared; observers registered after
    /// this drain wait for the next trigger.
    fn drain(&self) {
        let observers = std::mem::take(&mut *self.observers.lock());
        if observers.is_empty() {
            return;
        }
        let snapshot = self.get_executed_commands();
        debug!(
            observer_count = observers.len(),
            entry_count = snapshot.len(),
            "Draining request log to observers"
        );
        for observer in observers {
            observer.complete(Ok(snapshot.clone()));
        }
    }
}
