//! Scripted in-memory transport for timer-driven unit tests.

use super::{FetchError, FetchResult, Transport};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted response.
#[derive(Debug, Clone)]
pub(crate) struct Step {
    pub delay: Duration,
    pub outcome: Result<Value, FetchError>,
}

#[derive(Debug, Default)]
struct Counters {
    calls: u32,
    in_flight: u32,
    max_in_flight: u32,
}

/// Replays scripted responses keyed by URL path.
///
/// The last step of a script repeats once the others are consumed.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    counters: Mutex<HashMap<String, Counters>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, path: &str, delay: Duration, outcome: Result<Value, FetchError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Step { delay, outcome });
    }

    pub fn push_ok(&self, path: &str, value: Value) {
        self.push(path, Duration::ZERO, Ok(value));
    }

    pub fn push_err(&self, path: &str, error: FetchError) {
        self.push(path, Duration::ZERO, Err(error));
    }

    pub fn calls(&self, path: &str) -> u32 {
        self.counters
            .lock()
            .unwrap()
            .get(path)
            .map_or(0, |c| c.calls)
    }

    pub fn max_in_flight(&self, path: &str) -> u32 {
        self.counters
            .lock()
            .unwrap()
            .get(path)
            .map_or(0, |c| c.max_in_flight)
    }

    fn next_step(&self, path: &str) -> Step {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Step {
                delay: Duration::ZERO,
                outcome: Err(FetchError::Unreachable(format!("no script for {path}"))),
            },
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, url: &Url, _timeout: Duration) -> FetchResult<Value> {
        let path = url.path().to_string();
        let step = self.next_step(&path);

        {
            let mut counters = self.counters.lock().unwrap();
            let entry = counters.entry(path.clone()).or_default();
            entry.calls += 1;
            entry.in_flight += 1;
            entry.max_in_flight = entry.max_in_flight.max(entry.in_flight);
        }

        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }

        if let Some(entry) = self.counters.lock().unwrap().get_mut(&path) {
            entry.in_flight -= 1;
        }

        FetchResult::from_outcome(step.outcome)
    }
}
