//! Circuit breaker state machine: Closed (all calls allowed) and Open (calls
//! denied except a single probe once the sleep window elapses).

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Current operational mode of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    /// Normal operation, all calls allowed.
    Closed = 0,
    /// Failing fast, calls denied except the single probe.
    Open = 1,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            _ => CircuitState::Open,
        }
    }
}

/// Permission gate consulted before issuing a real call against a dependency.
///
/// Implementations never raise; they only grant or deny. Safe for concurrent
/// use from any number of callers.
pub trait CircuitBreaker: Send + Sync {
    /// Whether a call may go through right now. While Open this claims the
    /// single probe slot when the sleep window has elapsed, so at most one
    /// caller receives `true` per outstanding probe.
    fn allow_request(&self) -> bool;

    /// Current mode only; never mutates state.
    fn is_open(&self) -> bool;

    /// True exactly when Open, the sleep window has elapsed, and no probe is
    /// outstanding; claims the probe slot atomically.
    fn allow_single_test(&self) -> bool;

    /// Report a successful allowed call. Closes the circuit if the call was
    /// the probe; while Closed it is a harmless accounting reset.
    fn mark_success(&self);

    /// Report a failed allowed call. Opens the circuit once the configured
    /// number of consecutive failures is reached; a failed probe restarts the
    /// sleep window.
    fn mark_failure(&self);
}

/// No-op breaker: always allow, never open. The default collaborator when
/// circuit breaking is disabled, so callers need no branching logic.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubCircuitBreaker;

impl CircuitBreaker for StubCircuitBreaker {
    fn allow_request(&self) -> bool {
        true
    }

    fn is_open(&self) -> bool {
        false
    }

    fn allow_single_test(&self) -> bool {
        true
    }

    fn mark_success(&self) {}

    fn mark_failure(&self) {}
}

/// Per-dependency breaker with atomic state management.
#[derive(Debug)]
pub struct DefaultCircuitBreaker {
    /// Dependency name, for logging and statistics.
    name: String,
    failure_threshold: u64,
    sleep_window: Duration,
    state: AtomicU8,
    consecutive_failures: AtomicU64,
    /// Probe slot; at most one caller holds it while Open.
    probe_outstanding: AtomicBool,
    opened_at: Mutex<Option<Instant>>,
}

impl DefaultCircuitBreaker {
    pub fn new(name: impl Into<String>, failure_threshold: u64, sleep_window: Duration) -> Self {
        let name = name.into();
        info!(
            dependency = %name,
            failure_threshold,
            sleep_window_ms = sleep_window.as_millis() as u64,
            "Circuit breaker initialized"
        );
        Self {
            name,
            failure_threshold,
            sleep_window,
            state: AtomicU8::new(CircuitState::Closed as u8),
            consecutive_failures: AtomicU64::new(0),
            probe_outstanding: AtomicBool::new(false),
            opened_at: Mutex::new(None),
        }
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn sleep_window_elapsed(&self) -> bool {
        match *self.opened_at.lock() {
            Some(opened) => opened.elapsed() >= self.sleep_window,
            None => {
                // Open without a timestamp should not happen; fail open-handed
                // rather than deny forever.
                warn!(dependency = %self.name, "Circuit open but no open timestamp recorded");
                true
            }
        }
    }

    fn transition_to_open(&self) {
        if self
            .state
            .compare_exchange(
                CircuitState::Closed as u8,
                CircuitState::Open as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }
        *self.opened_at.lock() = Some(Instant::now());
        self.probe_outstanding.store(false, Ordering::Release);
        warn!(
            dependency = %self.name,
            consecutive_failures = self.consecutive_failures.load(Ordering::Acquire),
            failure_threshold = self.failure_threshold,
            sleep_window_ms = self.sleep_window.as_millis() as u64,
            "🔴 Circuit breaker opened"
        );
    }

    fn transition_to_closed(&self) {
        self.state
            .store(CircuitState::Closed as u8, Ordering::Release);
        self.consecutive_failures.store(0, Ordering::Release);
        self.probe_outstanding.store(false, Ordering::Release);
        *self.opened_at.lock() = None;
        info!(dependency = %self.name, "🟢 Circuit breaker closed");
    }
}

impl CircuitBreaker for DefaultCircuitBreaker {
    fn allow_request(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => self.allow_single_test(),
        }
    }

    fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    fn allow_single_test(&self) -> bool {
        if self.state() != CircuitState::Open || !self.sleep_window_elapsed() {
            return false;
        }
        // Claim the probe slot; only one caller wins.
        let claimed = self
            .probe_outstanding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            debug!(dependency = %self.name, "Probe permitted through open circuit");
        }
        claimed
    }

    fn mark_success(&self) {
        match self.state() {
            CircuitState::Open => {
                if self.probe_outstanding.load(Ordering::Acquire) {
                    info!(dependency = %self.name, "Probe succeeded, closing circuit");
                    self.transition_to_closed();
                }
            }
            CircuitState::Closed => {
                self.consecutive_failures.store(0, Ordering::Release);
            }
        }
    }

    fn mark_failure(&self) {
        match self.state() {
            CircuitState::Closed => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
                debug!(
                    dependency = %self.name,
                    consecutive_failures = failures,
                    failure_threshold = self.failure_threshold,
                    "Failure recorded"
                );
                if failures >= self.failure_threshold {
                    self.transition_to_open();
                }
            }
            CircuitState::Open => {
                if self
                    .probe_outstanding
                    .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    // Failed probe: restart the sleep window.
                    *self.opened_at.lock() = Some(Instant::now());
                    warn!(dependency = %self.name, "Probe failed, circuit stays open");
                }
            }
        }
    }
}
