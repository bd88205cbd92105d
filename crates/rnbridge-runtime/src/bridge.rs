//! Bridge Facade
//!
//! `Bridge` is the single entry point application code talks to. Until the
//! transport announces readiness every call is queued; `open` then flushes the
//! queues exactly once, in the order handlers, listeners, requests, events,
//! and from then on every call is forwarded to the backend directly.
//!
//! ## Concurrency
//!
//! Queues and gate share one mutex. The flush never holds it while calling the
//! backend: it takes one entry under the lock, releases it, delivers, and
//! repeats. Threads other than the flusher block until the flush completes, so
//! a direct call can never overtake a queued one. The flusher itself may call
//! back into the bridge from a transport callback; such calls are queued and
//! delivered by the running flush.
//!
//! ## Blocking during the flush
//!
//! The wait above is the only place a bridge call blocks, and it lasts only as
//! long as the flush. Two consequences for callers:
//!
//! - A backend method invoked by the flush must not synchronously wait for
//!   another thread that itself calls the bridge. That thread is parked until
//!   the flush finishes, and the flush is parked on it: a deadlock. The same
//!   wait after readiness is harmless.
//! - Async tasks that call the bridge while the flush runs park their tokio
//!   worker thread for that window. Keep flushes short, or call the bridge
//!   from `spawn_blocking` when the transport may still be coming up.

use core::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use rnbridge_core::{
    BridgeConfig, BridgeError, BridgeEvent, BridgeRequest, BridgeResult, EventListenerRef,
    Identifier, RequestHandlerRef, ResponseListenerRef, TransportBackend, TransportBackendRef,
};
use tracing::{debug, error, info, warn};

use crate::gate::{Admission, GateState, ReadinessGate};
use crate::queue::{
    HandlerRegistration, ListenerRegistration, PendingRequest, PendingSummary, QueueState,
    QueuedEntry,
};

// ----------------------------------------------------------------------------
// Flush Report
// ----------------------------------------------------------------------------

/// Number of entries delivered by the flush, per phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub handlers: usize,
    pub listeners: usize,
    pub requests: usize,
    pub events: usize,
}

impl FlushReport {
    pub fn total(&self) -> usize {
        self.handlers + self.listeners + self.requests + self.events
    }

    fn record(&mut self, entry: &QueuedEntry) {
        match entry {
            QueuedEntry::Handler(_) => self.handlers += 1,
            QueuedEntry::Listener(_) => self.listeners += 1,
            QueuedEntry::Request(_) => self.requests += 1,
            QueuedEntry::Event(_) => self.events += 1,
        }
    }
}

// ----------------------------------------------------------------------------
// Shared State
// ----------------------------------------------------------------------------

struct BridgeState {
    gate: ReadinessGate,
    queues: QueueState,
    threshold_warned: bool,
}

struct Shared {
    state: Mutex<BridgeState>,
    flushed: Condvar,
    config: BridgeConfig,
}

enum Route<'a> {
    Queue {
        state: MutexGuard<'a, BridgeState>,
        /// Backend to consult when the flushing thread looks up something
        /// that has already been delivered
        fallback: Option<TransportBackendRef>,
    },
    Forward(TransportBackendRef),
}

// ----------------------------------------------------------------------------
// Bridge
// ----------------------------------------------------------------------------

/// Readiness-gated facade over a transport backend
///
/// Cloning is cheap; clones share the same queues and gate.
#[derive(Clone)]
pub struct Bridge {
    shared: Arc<Shared>,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(BridgeState {
                    gate: ReadinessGate::new(),
                    queues: QueueState::new(),
                    threshold_warned: false,
                }),
                flushed: Condvar::new(),
                config,
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    /// True once the flush has completed
    pub fn is_ready(&self) -> bool {
        self.lock_state().gate.is_open()
    }

    pub fn gate_state(&self) -> GateState {
        self.lock_state().gate.state()
    }

    /// Snapshot of what is still waiting for the transport
    pub fn pending(&self) -> PendingSummary {
        self.lock_state().queues.summary()
    }

    // ------------------------------------------------------------------------
    // Outgoing Messages
    // ------------------------------------------------------------------------

    /// Emit an event, queuing it until the transport is ready
    pub fn emit_event(&self, event: BridgeEvent) {
        match self.route() {
            Route::Queue { mut state, .. } => {
                if self.shared.config.log_queued_operations {
                    debug!("Queuing {} until the transport is ready", event);
                }
                state.queues.push_event(event);
                self.check_queue_threshold(&mut state);
            }
            Route::Forward(backend) => backend.send_event(event),
        }
    }

    /// Send a request whose outcome is reported to `listener`
    ///
    /// A listener is mandatory: without one the outcome could never be
    /// observed, so the call is rejected before anything is queued or sent.
    pub fn send_request(
        &self,
        request: BridgeRequest,
        listener: Option<ResponseListenerRef>,
    ) -> BridgeResult<()> {
        validate_name(&request.name, "request")?;
        let listener =
            listener.ok_or_else(|| BridgeError::missing_response_listener(&request.name))?;

        match self.route() {
            Route::Queue { mut state, .. } => {
                if self.shared.config.log_queued_operations {
                    debug!("Queuing {} until the transport is ready", request);
                }
                let request_id = request.id;
                if state
                    .queues
                    .push_request(PendingRequest { request, listener })
                    .is_some()
                {
                    warn!(
                        "Request {} was already queued; its response listener has been replaced",
                        request_id
                    );
                }
                self.check_queue_threshold(&mut state);
            }
            Route::Forward(backend) => backend.send_request(request, listener),
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Registrations
    // ------------------------------------------------------------------------

    /// Register a handler for requests named `name`
    ///
    /// The identifier is allocated immediately, whether or not the transport
    /// is ready. While queued, a later registration for the same name replaces
    /// this one.
    pub fn register_request_handler(
        &self,
        name: &str,
        handler: RequestHandlerRef,
    ) -> BridgeResult<Identifier> {
        validate_name(name, "request handler")?;
        let id = Identifier::new();

        match self.route() {
            Route::Queue { mut state, .. } => {
                if self.shared.config.log_queued_operations {
                    debug!("Queuing request handler {} for '{}'", id, name);
                }
                let registration = HandlerRegistration {
                    id,
                    name: name.to_string(),
                    handler,
                };
                if let Some(displaced) = state.queues.push_handler(registration) {
                    warn!(
                        "Request handler {} for '{}' replaced by {} before the transport was ready",
                        displaced.id, name, id
                    );
                }
                self.check_queue_threshold(&mut state);
            }
            Route::Forward(backend) => backend.register_request_handler(name, handler, id),
        }
        Ok(id)
    }

    /// Add a listener for events named `name`
    pub fn add_event_listener(
        &self,
        name: &str,
        listener: EventListenerRef,
    ) -> BridgeResult<Identifier> {
        validate_name(name, "event")?;
        let id = Identifier::new();

        match self.route() {
            Route::Queue { mut state, .. } => {
                if self.shared.config.log_queued_operations {
                    debug!("Queuing event listener {} for '{}'", id, name);
                }
                state.queues.push_listener(ListenerRegistration {
                    id,
                    name: name.to_string(),
                    listener,
                });
                self.check_queue_threshold(&mut state);
            }
            Route::Forward(backend) => backend.add_event_listener(name, listener, id),
        }
        Ok(id)
    }

    /// Remove an event listener, returning it if it was queued or registered
    pub fn remove_event_listener(&self, id: Identifier) -> Option<EventListenerRef> {
        match self.route() {
            Route::Queue {
                mut state,
                fallback,
            } => {
                if let Some(listener) = state.queues.remove_listener(id) {
                    debug!("Removed queued event listener {}", id);
                    return Some(listener);
                }
                drop(state);
                fallback.and_then(|backend| backend.remove_event_listener(id))
            }
            Route::Forward(backend) => backend.remove_event_listener(id),
        }
    }

    /// Unregister a request handler, returning it if it was queued or registered
    pub fn unregister_request_handler(&self, id: Identifier) -> Option<RequestHandlerRef> {
        match self.route() {
            Route::Queue {
                mut state,
                fallback,
            } => {
                if let Some(handler) = state.queues.remove_handler(id) {
                    debug!("Removed queued request handler {}", id);
                    return Some(handler);
                }
                drop(state);
                fallback.and_then(|backend| backend.unregister_request_handler(id))
            }
            Route::Forward(backend) => backend.unregister_request_handler(id),
        }
    }

    /// Whether a request handler is registered (or queued) under `id`
    pub fn is_registered(&self, id: Identifier) -> bool {
        match self.route() {
            Route::Queue { state, fallback } => {
                if state.queues.contains_handler(id) {
                    return true;
                }
                drop(state);
                fallback.is_some_and(|backend| backend.is_registered(id))
            }
            Route::Forward(backend) => backend.is_registered(id),
        }
    }

    // ------------------------------------------------------------------------
    // Readiness
    // ------------------------------------------------------------------------

    /// Install the backend and flush everything queued so far
    ///
    /// Only the first call has any effect; later calls return `AlreadyReady`
    /// and leave the bridge untouched. When this returns `Ok`, every entry
    /// accepted before it, including ones queued by transport callbacks during
    /// the flush, has been delivered.
    pub fn open(&self, backend: TransportBackendRef) -> BridgeResult<FlushReport> {
        let caller = thread::current().id();
        {
            let mut state = self.lock_state();
            while matches!(state.gate.admit(caller), Admission::Wait) {
                state = self.wait_for_flush(state);
            }
            if let Err(err) = state.gate.begin_flush(caller, backend.clone()) {
                warn!("Ignoring duplicate readiness signal; the bridge is already ready");
                return Err(err);
            }
            info!(
                "Transport ready, flushing {} queued bridge operations",
                state.queues.len()
            );
        }

        let mut guard = FlushGuard {
            bridge: self,
            completed: false,
        };
        let mut report = FlushReport::default();
        loop {
            let entry = {
                let mut state = self.lock_state();
                match state.queues.pop_next() {
                    Some(entry) => entry,
                    None => {
                        state.gate.finish_flush();
                        state.threshold_warned = false;
                        break;
                    }
                }
            };
            report.record(&entry);
            deliver(entry, backend.as_ref());
        }
        guard.completed = true;
        drop(guard);

        info!(
            "Bridge ready: delivered {} handlers, {} listeners, {} requests, {} events",
            report.handlers, report.listeners, report.requests, report.events
        );
        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn lock_state(&self) -> MutexGuard<'_, BridgeState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_for_flush<'a>(&'a self, state: MutexGuard<'a, BridgeState>) -> MutexGuard<'a, BridgeState> {
        self.shared
            .flushed
            .wait(state)
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn route(&self) -> Route<'_> {
        let caller = thread::current().id();
        let mut state = self.lock_state();
        loop {
            match state.gate.admit(caller) {
                Admission::Queue => {
                    return Route::Queue {
                        state,
                        fallback: None,
                    }
                }
                Admission::QueueDuringFlush(backend) => {
                    return Route::Queue {
                        state,
                        fallback: Some(backend),
                    }
                }
                Admission::Forward(backend) => return Route::Forward(backend),
                Admission::Wait => state = self.wait_for_flush(state),
            }
        }
    }

    /// Warn once each time the queues grow past the configured threshold
    fn check_queue_threshold(&self, state: &mut BridgeState) {
        let pending = state.queues.len();
        let threshold = self.shared.config.queue_warning_threshold;
        if pending > threshold {
            if !state.threshold_warned {
                warn!(
                    "{} bridge operations queued waiting for the transport (threshold {})",
                    pending, threshold
                );
                state.threshold_warned = true;
            }
        } else {
            state.threshold_warned = false;
        }
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("Bridge")
            .field("gate", &state.gate)
            .field("queues", &state.queues)
            .finish()
    }
}

fn validate_name(name: &str, kind: &'static str) -> BridgeResult<()> {
    if name.is_empty() {
        return Err(BridgeError::InvalidName { kind });
    }
    Ok(())
}

fn deliver(entry: QueuedEntry, backend: &dyn TransportBackend) {
    match entry {
        QueuedEntry::Handler(reg) => backend.register_request_handler(&reg.name, reg.handler, reg.id),
        QueuedEntry::Listener(reg) => backend.add_event_listener(&reg.name, reg.listener, reg.id),
        QueuedEntry::Request(pending) => backend.send_request(pending.request, pending.listener),
        QueuedEntry::Event(event) => backend.send_event(event),
    }
}

/// Completes the gate and wakes waiters even if a backend call panics mid-flush
struct FlushGuard<'a> {
    bridge: &'a Bridge,
    completed: bool,
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.bridge.lock_state();
        if !self.completed {
            let discarded = state.queues.clear();
            error!(
                "Transport panicked during the bridge flush; {} undelivered entries discarded",
                discarded.total()
            );
            state.gate.finish_flush();
        }
        drop(state);
        self.bridge.shared.flushed.notify_all();
    }
}
