//! Poller registry and snapshot aggregation.
//!
//! The [`Orchestrator`] owns one [`Poller`] per registered [`Source`]. Every
//! poller publishes its state transitions into a shared hub, which is the
//! single point where per-source states are merged into a [`Snapshot`] and
//! handed to the [`Store`].
//!
//! # Example
//!
//! ```no_run
//! use oiwatch::orchestrator::Orchestrator;
//! use oiwatch::source::{Source, SourceKind};
//! use oiwatch::transport::HttpTransport;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(HttpTransport::new()?);
//! let orchestrator = Orchestrator::new("http://localhost:5000", transport);
//!
//! orchestrator.register(Source::new("current_price", SourceKind::CurrentPrice))?;
//! orchestrator.start_all()?;
//!
//! let snapshot = orchestrator.current_snapshot();
//! println!("{}", snapshot.overall_status);
//!
//! orchestrator.stop_all().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod snapshot;


pub use error::*;
pub use snapshot::*;

use crate::poller::{Poller, PollerHandle, SourceState, StatePublisher};
use crate::source::{Payload, Source};
use crate::store::Store;
use crate::transport::Transport;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

/// Starts, stops and aggregates the pollers of all sources.
///
/// Store subscribers are called while the hub's slot lock is held. From a
/// subscriber, only read the snapshot it is handed or
/// [`current_snapshot`](Self::current_snapshot); calling `register` there
/// deadlocks.
pub struct Orchestrator {
    base_url: String,
    transport: Arc<dyn Transport>,
    hub: Arc<Hub>,
    control: Mutex<Control>,
    cancel_token: CancellationToken,
}

#[derive(Default)]
struct Control {
    /// Registration order
    sources: Vec<Source>,
    pollers: HashMap<String, PollerHandle>,
    running: bool,
    stopped: bool,
}

impl Orchestrator {
    /// Create an orchestrator publishing into a fresh [`Store`].
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self::with_store(base_url, transport, Arc::new(Store::new()))
    }

    /// Create an orchestrator publishing into an existing store.
    pub fn with_store(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        store: Arc<Store>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            hub: Arc::new(Hub::new(store)),
            control: Mutex::new(Control::default()),
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn store(&self) -> Arc<Store> {
        Arc::clone(&self.hub.store)
    }

    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.hub.store.get()
    }

    /// Registered source ids in registration order.
    pub fn source_ids(&self) -> Vec<String> {
        self.control().sources.iter().map(|s| s.id.clone()).collect()
    }

    pub fn is_running(&self) -> bool {
        let control = self.control();
        control.running && !control.stopped
    }

    /// Register a source.
    ///
    /// Publishes a snapshot listing the new source as loading. If the
    /// orchestrator is already running, the source's poller starts at once.
    ///
    /// # Errors
    ///
    /// Returns `OrchestratorError::DuplicateSource` if the id is taken,
    /// `OrchestratorError::Stopped` after [`stop_all`](Self::stop_all), and
    /// `OrchestratorError::Source` if the source URL cannot be resolved or
    /// its period or timeout is zero.
    pub fn register(&self, source: Source) -> Result<(), OrchestratorError> {
        let mut control = self.control();

        if control.stopped {
            return Err(OrchestratorError::Stopped);
        }
        if control.sources.iter().any(|s| s.id == source.id) {
            return Err(OrchestratorError::DuplicateSource(source.id));
        }

        source.check_durations()?;
        let url = source.url(&self.base_url)?;
        tracing::info!(
            source_id = %source.id,
            kind = %source.kind,
            url = %url,
            cadence = %source.cadence,
            "Registered source"
        );

        self.hub.add_slot(&source.id);
        control.sources.push(source.clone());

        if control.running {
            let handle = self.spawn_poller(source)?;
            control.pollers.insert(handle.source_id().to_string(), handle);
        }

        Ok(())
    }

    /// Start a poller for every registered source not yet running.
    ///
    /// Must be called from within a tokio runtime. Returns the number of
    /// pollers started.
    pub fn start_all(&self) -> Result<usize, OrchestratorError> {
        let mut control = self.control();

        if control.stopped {
            return Err(OrchestratorError::Stopped);
        }

        let pending: Vec<Source> = control
            .sources
            .iter()
            .filter(|s| !control.pollers.contains_key(&s.id))
            .cloned()
            .collect();

        let mut started = 0;
        for source in pending {
            let handle = self.spawn_poller(source)?;
            control.pollers.insert(handle.source_id().to_string(), handle);
            started += 1;
        }
        control.running = true;

        if started > 0 {
            tracing::info!(pollers = started, "Started pollers");
        }

        Ok(started)
    }

    /// Stop every poller. Idempotent.
    ///
    /// No snapshot is published once this starts; it returns after every
    /// poller loop has exited.
    pub async fn stop_all(&self) {
        let handles: Vec<PollerHandle> = {
            let mut control = self.control();
            if control.stopped {
                return;
            }
            control.stopped = true;
            control.running = false;
            control.pollers.drain().map(|(_, handle)| handle).collect()
        };

        self.hub.close();
        self.cancel_token.cancel();

        let count = handles.len();
        futures::future::join_all(handles.into_iter().map(PollerHandle::stop)).await;

        tracing::info!(pollers = count, "All pollers stopped");
    }

    fn spawn_poller(&self, source: Source) -> Result<PollerHandle, OrchestratorError> {
        let publisher: Arc<dyn StatePublisher> = self.hub.clone();
        let poller = Poller::new(
            source,
            &self.base_url,
            Arc::clone(&self.transport),
            publisher,
        )?;
        Ok(poller.start(self.cancel_token.child_token()))
    }

    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Serialization point between poller publications and the store.
struct Hub {
    slots: Mutex<Slots>,
    store: Arc<Store>,
}

struct Slots {
    states: BTreeMap<String, SourceState<Payload>>,
    version: u64,
    status: OverallStatus,
    closed: bool,
}

impl Hub {
    fn new(store: Arc<Store>) -> Self {
        let current = store.get();
        Self {
            slots: Mutex::new(Slots {
                states: BTreeMap::new(),
                version: current.version,
                status: current.overall_status,
                closed: false,
            }),
            store,
        }
    }

    fn add_slot(&self, source_id: &str) {
        let mut slots = self.slots();
        if slots.closed {
            return;
        }
        slots
            .states
            .insert(source_id.to_string(), SourceState::new());
        self.republish(&mut slots);
    }

    /// Stop all further publication.
    fn close(&self) {
        self.slots().closed = true;
    }

    fn republish(&self, slots: &mut Slots) {
        slots.version += 1;
        let snapshot = Snapshot::new(slots.version, slots.states.clone());

        if snapshot.overall_status != slots.status {
            tracing::info!(
                old_status = %slots.status,
                new_status = %snapshot.overall_status,
                version = snapshot.version,
                "Overall status changed"
            );
            slots.status = snapshot.overall_status;
        }

        self.store.publish(snapshot);
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StatePublisher for Hub {
    fn publish(&self, source_id: &str, state: SourceState<Payload>) {
        let mut slots = self.slots();
        if slots.closed {
            return;
        }

        match slots.states.get(source_id) {
            Some(current) if current.revision >= state.revision => {
                tracing::debug!(
                    source_id,
                    current = current.revision,
                    received = state.revision,
                    "Ignoring stale source state"
                );
                return;
            }
            Some(_) => {}
            None => {
                tracing::warn!(source_id, "State published for unregistered source");
                return;
            }
        }

        slots.states.insert(source_id.to_string(), state);
        self.republish(&mut slots);
    }
}
