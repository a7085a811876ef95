use crate::command::CommandMeta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;

/// How a completed command finished, for per-dependency health statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOutcome {
    Success,
    Failure,
    /// Resolved from a collapsed group without its own execution.
    ResponseFromCache,
}

/// Per-execution record handed to the statistics consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEvent {
    pub command_key: String,
    pub command_group_key: Option<String>,
    pub outcome: CommandOutcome,
    pub duration_ms: u64,
    pub occurred_at: DateTime<Utc>,
}

impl CommandEvent {
    pub fn new(command: &dyn CommandMeta, outcome: CommandOutcome, duration: Duration) -> Self {
        Self {
            command_key: command.command_key().to_string(),
            command_group_key: command.command_group_key().map(str::to_string),
            outcome,
            duration_ms: duration.as_millis() as u64,
            occurred_at: Utc::now(),
        }
    }

    /// Payload shape pushed to the dashboard transport.
    pub fn dashboard_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "ResilienceCommand",
            "name": self.command_key,
            "group": self.command_group_key.clone().unwrap_or_default(),
            "currentTime": self.occurred_at.timestamp_millis(),
            "outcome": self.outcome,
            "latencyExecute_mean": self.duration_ms,
        })
    }
}

/// Broadcast fan-out of [`CommandEvent`] to any number of subscribers.
///
/// Publishing with zero subscribers succeeds; the dashboard transport is
/// external and may attach or detach at any time.
#[derive(Debug, Clone)]
pub struct StatisticsPublisher {
    sender: broadcast::Sender<CommandEvent>,
}

impl StatisticsPublisher {
    /// Create a publisher with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: CommandEvent) {
        // A send error only means nobody is listening right now.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CommandEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StatisticsPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}
