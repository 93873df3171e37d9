//! Per-source polling loop.
//!
//! A [`Poller`] drives one [`Source`] on its cadence. It owns the source's
//! [`SourceState`], keeps at most one fetch in flight, and publishes every
//! transition through a [`StatePublisher`].

mod state;


pub use state::*;

use crate::source::{Payload, Source, SourceError};
use crate::transport::{FetchError, FetchResult, Transport};
use reqwest::Url;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Receives every state transition of a poller.
pub trait StatePublisher: Send + Sync {
    fn publish(&self, source_id: &str, state: SourceState<Payload>);
}

type InFlight = Option<(u64, JoinHandle<FetchResult<Payload>>)>;

/// Background loop that fetches one source on a fixed cadence.
pub struct Poller {
    source: Arc<Source>,
    url: Url,
    transport: Arc<dyn Transport>,
    publisher: Arc<dyn StatePublisher>,
}

impl Poller {
    /// Create a poller; fails if the source URL cannot be resolved.
    pub fn new(
        source: Source,
        base_url: &str,
        transport: Arc<dyn Transport>,
        publisher: Arc<dyn StatePublisher>,
    ) -> Result<Self, SourceError> {
        let url = source.url(base_url)?;
        Ok(Self {
            source: Arc::new(source),
            url,
            transport,
            publisher,
        })
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Start the polling task.
    ///
    /// The first fetch is issued immediately. The task runs until
    /// `cancel_token` is cancelled.
    pub fn start(self, cancel_token: CancellationToken) -> PollerHandle {
        let source_id = self.source.id.clone();
        let join = tokio::spawn(self.run(cancel_token.clone()));
        PollerHandle {
            source_id,
            cancel_token,
            join,
        }
    }

    async fn run(self, cancel_token: CancellationToken) {
        let source_id = self.source.id.as_str();
        let mut state = SourceState::new();
        let mut ticker = tokio::time::interval(self.source.cadence.period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: InFlight = None;
        let mut satisfied = false;

        tracing::info!(
            source_id,
            url = %self.url,
            cadence = %self.source.cadence,
            "Poller started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    break;
                }
                (seq, joined) = settle(&mut in_flight) => {
                    if cancel_token.is_cancelled() {
                        tracing::debug!(source_id, seq, "Discarding result after stop");
                        break;
                    }

                    let result = joined.unwrap_or_else(|e| {
                        FetchResult::failure(FetchError::Unreachable(format!("fetch task failed: {e}")))
                    });
                    let succeeded = result.is_success();

                    if !state.apply(seq, result) {
                        tracing::debug!(source_id, seq, "Discarded out-of-order result");
                    }
                    self.publisher.publish(source_id, state.clone());

                    if succeeded && self.source.cadence.is_once() {
                        tracing::debug!(source_id, "Fetch-once source satisfied, timer parked");
                        satisfied = true;
                    }
                }
                _ = ticker.tick(), if !satisfied => {
                    if in_flight.is_some() {
                        tracing::debug!(source_id, "Fetch still in flight, skipping tick");
                        crate::metrics::record_skipped_tick(source_id);
                        continue;
                    }

                    let seq = state.begin_fetch();
                    self.publisher.publish(source_id, state.clone());
                    in_flight = Some((seq, self.spawn_fetch()));
                }
            }
        }

        tracing::info!(source_id, "Poller stopped");
    }

    /// Run one fetch in its own task so that stopping the poller lets the
    /// request finish without waiting on it.
    fn spawn_fetch(&self) -> JoinHandle<FetchResult<Payload>> {
        let source = Arc::clone(&self.source);
        let transport = Arc::clone(&self.transport);
        let url = self.url.clone();
        tokio::spawn(async move { fetch_source(transport.as_ref(), &source, &url).await })
    }
}

/// Await the in-flight fetch, or never resolve when there is none.
async fn settle(slot: &mut InFlight) -> (u64, Result<FetchResult<Payload>, JoinError>) {
    match slot {
        Some((seq, handle)) => {
            let seq = *seq;
            let joined = handle.await;
            *slot = None;
            (seq, joined)
        }
        None => std::future::pending().await,
    }
}

/// Fetch a source once and decode its payload.
pub async fn fetch_source(
    transport: &dyn Transport,
    source: &Source,
    url: &Url,
) -> FetchResult<Payload> {
    let start = Instant::now();
    let result = transport
        .fetch(url, source.timeout)
        .await
        .and_then(|value| source.kind.decode(value));
    let elapsed = start.elapsed();

    crate::metrics::record_fetch(&source.id, &result, elapsed);

    match &result {
        FetchResult::Success { .. } => {
            tracing::debug!(
                source_id = %source.id,
                latency_ms = elapsed.as_millis() as u64,
                "Fetch succeeded"
            );
        }
        FetchResult::Failure { kind, message, .. } => {
            tracing::warn!(
                source_id = %source.id,
                url = %url,
                error_kind = kind.as_str(),
                error = %message,
                "Fetch failed"
            );
        }
    }

    result
}

/// Handle to a running poller.
pub struct PollerHandle {
    source_id: String,
    cancel_token: CancellationToken,
    join: JoinHandle<()>,
}

impl PollerHandle {
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Cancel the timer and wait for the loop to exit.
    ///
    /// An in-flight request keeps running in its own task; its result is
    /// dropped.
    pub async fn stop(self) {
        self.cancel_token.cancel();
        if let Err(e) = self.join.await {
            tracing::warn!(source_id = %self.source_id, error = %e, "Poller task ended abnormally");
        }
    }
}
