//! # Deferred results
//!
//! One write-once broadcast primitive serves both fan-out consumers in this
//! crate: the collapsing cache (one outcome, many request ids) and the
//! request log (one snapshot, many observers). A [`ResultCell`] is filled
//! exactly once; every [`Deferred`] subscribed to it resolves with a clone of
//! that single outcome, whether the subscription happened before or after the
//! fill.

use crate::error::{FaultlineError, Result};
use parking_lot::Mutex;
use tokio::sync::oneshot;

enum CellState<T> {
    Pending(Vec<oneshot::Sender<Result<T>>>),
    Complete(Result<T>),
}

/// Write-once slot that broadcasts its outcome to every subscriber.
pub struct ResultCell<T> {
    inner: Mutex<CellState<T>>,
}

impl<T: Clone> ResultCell<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CellState::Pending(Vec::new())),
        }
    }

    /// Register a waiter. Subscriptions after completion observe the stored
    /// outcome immediately.
    pub fn subscribe(&self) -> Deferred<T> {
        let (tx, rx) = oneshot::channel();
        let mut inner = self.inner.lock();
        match &mut *inner {
            CellState::Pending(waiters) => waiters.push(tx),
            CellState::Complete(outcome) => {
                let _ = tx.send(outcome.clone());
            }
        }
        Deferred { rx }
    }

    /// Fill the cell and resolve every registered waiter with the same
    /// outcome, exactly once each. The state flip to completed happens under
    /// the lock, so no subscriber ever observes a half-updated cell; a second
    /// call is a no-op.
    pub fn complete(&self, outcome: Result<T>) {
        let drained = {
            let mut inner = self.inner.lock();
            match &mut *inner {
                CellState::Complete(_) => return,
                CellState::Pending(waiters) => {
                    let drained = std::mem::take(waiters);
                    *inner = CellState::Complete(outcome.clone());
                    drained
                }
            }
        };
        for waiter in drained {
            let _ = waiter.send(outcome.clone());
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(&*self.inner.lock(), CellState::Complete(_))
    }
}

impl<T: Clone> Default for ResultCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Awaitable handle onto one [`ResultCell`] outcome.
///
/// Waiting never blocks a thread; the handle suspends until the cell fills.
pub struct Deferred<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> Deferred<T> {
    /// Await the outcome. Fails with [`FaultlineError::ScopeDiscarded`] if the
    /// cell was dropped before anything filled it.
    pub async fn wait(self) -> Result<T> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(FaultlineError::ScopeDiscarded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_before_completion_all_resolve() {
        let cell = ResultCell::new();
        let first = cell.subscribe();
        let second = cell.subscribe();

        cell.complete(Ok(42u32));

        assert_eq!(first.wait().await, Ok(42));
        assert_eq!(second.wait().await, Ok(42));
        assert!(cell.is_complete());
    }

    #[tokio::test]
    async fn subscriber_after_completion_sees_stored_outcome() {
        let cell = ResultCell::new();
        cell.complete(Ok("cached".to_string()));

        let late = cell.subscribe();
        assert_eq!(late.wait().await, Ok("cached".to_string()));
    }

    #[tokio::test]
    async fn second_complete_is_a_no_op() {
        let cell = ResultCell::new();
        cell.complete(Ok(1u8));
        cell.complete(Ok(2u8));

        assert_eq!(cell.subscribe().wait().await, Ok(1));
    }

    #[tokio::test]
    async fn failure_broadcasts_identically() {
        let cell: ResultCell<u32> = ResultCell::new();
        let first = cell.subscribe();
        let second = cell.subscribe();

        cell.complete(Err(FaultlineError::ExecutionFailed("boom".into())));

        let expected = Err(FaultlineError::ExecutionFailed("boom".into()));
        assert_eq!(first.wait().await, expected);
        assert_eq!(second.wait().await, expected);
    }

    #[tokio::test]
    async fn dropped_cell_yields_scope_discarded() {
        let cell: ResultCell<u32> = ResultCell::new();
        let waiter = cell.subscribe();
        drop(cell);

        assert_eq!(waiter.wait().await, Err(FaultlineError::ScopeDiscarded));
    }
}
