//! Shared test command used by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use faultline::{Command, CommandMeta, FaultlineError, Result, Settings};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scriptable command: fixed outcome, optional artificial latency, and a run
/// counter for asserting how many real executions happened.
pub struct TestCommand {
    key: String,
    cache_key: Option<String>,
    settings: Settings,
    outcome: std::result::Result<String, String>,
    delay: Duration,
    run_count: AtomicUsize,
}

impl TestCommand {
    pub fn succeeding(key: &str, cache_key: Option<&str>, value: &str) -> Arc<Self> {
        Arc::new(Self {
            key: key.to_string(),
            cache_key: cache_key.map(str::to_string),
            settings: Settings::default(),
            outcome: Ok(value.to_string()),
            delay: Duration::ZERO,
            run_count: AtomicUsize::new(0),
        })
    }

    pub fn failing(key: &str, cache_key: Option<&str>, message: &str) -> Arc<Self> {
        Arc::new(Self {
            key: key.to_string(),
            cache_key: cache_key.map(str::to_string),
            settings: Settings::default(),
            outcome: Err(message.to_string()),
            delay: Duration::ZERO,
            run_count: AtomicUsize::new(0),
        })
    }

    pub fn with_settings(self: Arc<Self>, settings: Settings) -> Arc<Self> {
        let this = Arc::try_unwrap(self).unwrap_or_else(|_| panic!("command already shared"));
        Arc::new(Self { settings, ..this })
    }

    pub fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        let this = Arc::try_unwrap(self).unwrap_or_else(|_| panic!("command already shared"));
        Arc::new(Self { delay, ..this })
    }

    pub fn run_count(&self) -> usize {
        self.run_count.load(Ordering::SeqCst)
    }
}

impl CommandMeta for TestCommand {
    fn command_key(&self) -> &str {
        &self.key
    }

    fn cache_key(&self) -> Option<String> {
        self.cache_key.clone()
    }

    fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[async_trait]
impl Command<String> for TestCommand {
    async fn run(&self) -> Result<String> {
        self.run_count.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome
            .clone()
            .map_err(FaultlineError::ExecutionFailed)
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .try_init();
}
