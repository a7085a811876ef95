//! # Request collapsing cache
//!
//! Collapses N concurrent, logically-identical invocations sharing a cache
//! key into one real execution and delivers the single outcome to all N
//! callers. One cache instance belongs to one scope (e.g. one inbound
//! request) and is discarded with it; groups are never evicted individually.
//!
//! The mutation methods (`register`, `resolve`) take `&mut self` and are
//! meant for a single logical owner per scope. The completion fan-out runs on
//! a spawned task and is safe against that owner: it goes through the group's
//! [`ResultCell`], whose fill is atomic with respect to the group being
//! marked completed.

use crate::command::{Command, CommandMeta};
use crate::deferred::{Deferred, ResultCell};
use crate::error::{FaultlineError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Per-scope collapsing cache over commands producing `T`.
pub struct RequestCollapsingCache<T> {
    groups: HashMap<String, CacheGroup<T>>,
    request_ids_to_group_keys: HashMap<Uuid, String>,
}

impl<T> Default for RequestCollapsingCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RequestCollapsingCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            groups: HashMap::new(),
            request_ids_to_group_keys: HashMap::new(),
        }
    }

    /// Register `request_id` against the group for the command's cache key.
    ///
    /// Commands that are not collapsible (no cache key, or request caching
    /// disabled in their settings) bypass collapsing: they are tracked under
    /// a private group keyed by the request id, so each one executes
    /// independently when resolved.
    ///
    /// A registration arriving after its group has started execution joins
    /// the in-flight fan-out and will observe the group's single outcome.
    pub fn register(&mut self, request_id: Uuid, command: Arc<dyn Command<T>>) -> &mut Self {
        let group_key = collapse_key(command.as_ref())
            .unwrap_or_else(|| format!("uncollapsed:{request_id}"));

        self.request_ids_to_group_keys
            .insert(request_id, group_key.clone());

        let group = self
            .groups
            .entry(group_key.clone())
            .or_insert_with(|| CacheGroup::new(group_key));
        group.member_ids.push(request_id);
        group.pending.push(command);

        if group.execution.is_some() {
            debug!(
                %request_id,
                group_key = %group.group_key,
                "Late registration joins in-flight group"
            );
        }

        self
    }

    /// Return the deferred result bound to `request_id`, triggering the
    /// group's single execution if it has not started yet. Never blocks;
    /// waiting happens on the returned handle.
    pub fn resolve(&mut self, request_id: Uuid) -> Result<Deferred<T>> {
        let group_key = self
            .request_ids_to_group_keys
            .get(&request_id)
            .ok_or_else(|| unregistered(request_id))?;
        let group = self
            .groups
            .get_mut(group_key)
            .ok_or_else(|| unregistered(request_id))?;

        if group.execution.is_none() {
            group.start()?;
        }

        Ok(group.outcome.subscribe())
    }

    /// Bind a command to a fresh request id for register-then-resolve use.
    pub fn create_request(&self, command: Arc<dyn Command<T>>) -> CollapsedRequest<T> {
        CollapsedRequest::new(command)
    }

    /// Number of distinct groups currently held (collapsed and private).
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Whether the group owning `request_id` has completed its execution.
    pub fn is_completed(&self, request_id: Uuid) -> bool {
        self.request_ids_to_group_keys
            .get(&request_id)
            .and_then(|key| self.groups.get(key))
            .map(|group| group.outcome.is_complete())
            .unwrap_or(false)
    }
}

/// Cacheable means both: a cache key is present and the command's settings
/// enable request caching.
fn collapse_key(command: &dyn CommandMeta) -> Option<String> {
    if command.settings().request_cache_enabled {
        command.cache_key()
    } else {
        None
    }
}

fn unregistered(request_id: Uuid) -> FaultlineError {
    FaultlineError::Usage(format!(
        "request {request_id} was never registered; call register before resolve"
    ))
}

/// Pending and executing state for all requests sharing one cache key.
struct CacheGroup<T> {
    group_key: String,
    member_ids: Vec<Uuid>,
    pending: Vec<Arc<dyn Command<T>>>,
    outcome: Arc<ResultCell<T>>,
    execution: Option<JoinHandle<()>>,
}

impl<T> CacheGroup<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new(group_key: String) -> Self {
        Self {
            group_key,
            member_ids: Vec::new(),
            pending: Vec::new(),
            outcome: Arc::new(ResultCell::new()),
            execution: None,
        }
    }

    /// Pick a representative and run it exactly once on a spawned task. Any
    /// command in `pending` is an acceptable representative; all of them are
    /// assumed to produce equivalent results for this key.
    fn start(&mut self) -> Result<()> {
        let representative = self.pending.first().cloned().ok_or_else(|| {
            FaultlineError::Usage(format!(
                "group {} has no registered commands to execute",
                self.group_key
            ))
        })?;

        debug!(
            group_key = %self.group_key,
            collapsed_requests = self.member_ids.len(),
            "Starting group execution"
        );

        let outcome = Arc::clone(&self.outcome);
        let group_key = self.group_key.clone();
        let started = Instant::now();
        self.execution = Some(tokio::spawn(async move {
            let result = representative.run().await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => debug!(group_key = %group_key, elapsed_ms, "Group execution succeeded"),
                Err(error) => {
                    warn!(group_key = %group_key, elapsed_ms, %error, "Group execution failed")
                }
            }
            outcome.complete(result);
        }));

        Ok(())
    }
}

/// A command bound to a fresh request id, tied to the cache that created it.
pub struct CollapsedRequest<T> {
    request_id: Uuid,
    command: Arc<dyn Command<T>>,
}

impl<T> CollapsedRequest<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new(command: Arc<dyn Command<T>>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            command,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn command(&self) -> &Arc<dyn Command<T>> {
        &self.command
    }

    pub fn register(&self, cache: &mut RequestCollapsingCache<T>) {
        cache.register(self.request_id, Arc::clone(&self.command));
    }

    pub fn resolve(&self, cache: &mut RequestCollapsingCache<T>) -> Result<Deferred<T>> {
        cache.resolve(self.request_id)
    }
}
