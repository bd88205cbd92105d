//! Readiness Gate
//!
//! Tracks whether the transport is ready and decides how each bridge call is
//! routed. The gate moves `NotReady -> Flushing -> Ready` exactly once and
//! never moves back.
//!
//! While the flush is running only the flushing thread may still queue work:
//! transport callbacks that call back into the bridge land behind the entries
//! being flushed and are delivered by the same flush. Every other thread waits
//! until the gate reaches `Ready` and then forwards directly, so nothing it
//! does can overtake a queued entry.

use core::fmt;
use std::thread::ThreadId;

use rnbridge_core::{BridgeError, BridgeResult, TransportBackendRef};

/// Lifecycle of the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    NotReady,
    Flushing { flusher: ThreadId },
    Ready,
}

/// How a call is routed, decided under the bridge lock
pub enum Admission {
    /// Transport not ready: queue the call
    Queue,
    /// Re-entrant call from the flushing thread: queue it behind the flush,
    /// falling back to the backend for lookups of already delivered entries
    QueueDuringFlush(TransportBackendRef),
    /// Another thread is flushing: wait for `Ready`
    Wait,
    /// Forward directly to the backend
    Forward(TransportBackendRef),
}

impl fmt::Debug for Admission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Admission::Queue => "Queue",
            Admission::QueueDuringFlush(_) => "QueueDuringFlush",
            Admission::Wait => "Wait",
            Admission::Forward(_) => "Forward",
        };
        f.write_str(label)
    }
}

pub struct ReadinessGate {
    state: GateState,
    backend: Option<TransportBackendRef>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self {
            state: GateState::NotReady,
            backend: None,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// True once the flush has completed
    pub fn is_open(&self) -> bool {
        self.state == GateState::Ready
    }

    pub fn admit(&self, caller: ThreadId) -> Admission {
        match (self.state, &self.backend) {
            (GateState::NotReady, _) => Admission::Queue,
            (GateState::Flushing { flusher }, Some(backend)) if flusher == caller => {
                Admission::QueueDuringFlush(backend.clone())
            }
            (GateState::Flushing { .. }, _) => Admission::Wait,
            (GateState::Ready, Some(backend)) => Admission::Forward(backend.clone()),
            // Ready always carries a backend; queueing keeps the call rather than losing it
            (GateState::Ready, None) => Admission::Queue,
        }
    }

    /// Start the flush on `flusher`, installing the backend
    ///
    /// Fails with `AlreadyReady` unless the gate is still `NotReady`.
    pub fn begin_flush(&mut self, flusher: ThreadId, backend: TransportBackendRef) -> BridgeResult<()> {
        if self.state != GateState::NotReady {
            return Err(BridgeError::AlreadyReady);
        }
        self.state = GateState::Flushing { flusher };
        self.backend = Some(backend);
        Ok(())
    }

    /// Mark the flush complete
    pub fn finish_flush(&mut self) {
        self.state = GateState::Ready;
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReadinessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessGate")
            .field("state", &self.state)
            .field("has_backend", &self.backend.is_some())
            .finish()
    }
}
