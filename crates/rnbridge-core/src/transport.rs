//! Transport Backend Contract
//!
//! Defines the interface the bridge forwards to once the transport is ready,
//! and the one-shot channel the transport uses to announce readiness.
//!
//! ## Readiness
//!
//! The transport finishes its own initialization asynchronously. When it is
//! able to accept calls it fires the `ReadyNotifier`, handing over the backend
//! handle. The notifier is consumed by `notify`, so a transport cannot signal
//! readiness twice through it; the bridge still guards its gate against a
//! second `open` from any other source.

use core::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::{
    listener::{EventListenerRef, RequestHandlerRef, ResponseListenerRef},
    message::{BridgeEvent, BridgeRequest},
    types::Identifier,
    BridgeError, Result as BridgeResult,
};

// ----------------------------------------------------------------------------
// Transport Backend Trait
// ----------------------------------------------------------------------------

/// Messaging transport serviced by the bridge once it is ready
///
/// Calls are synchronous and infallible from the bridge's point of view:
/// timeouts and delivery errors belong to the transport and are reported,
/// if at all, through response listeners. Implementations should not block
/// on work that needs the bridge, but they may call back into the bridge
/// from within these methods.
pub trait TransportBackend: Send + Sync {
    /// Emit an event to the listeners on the far side
    fn send_event(&self, event: BridgeEvent);

    /// Send a request and report its outcome to `listener`
    fn send_request(&self, request: BridgeRequest, listener: ResponseListenerRef);

    /// Register `handler` for requests named `name` under a bridge-issued identifier
    fn register_request_handler(&self, name: &str, handler: RequestHandlerRef, id: Identifier);

    /// Register `listener` for events named `name` under a bridge-issued identifier
    fn add_event_listener(&self, name: &str, listener: EventListenerRef, id: Identifier);

    /// Remove a listener, returning it if it was registered
    fn remove_event_listener(&self, id: Identifier) -> Option<EventListenerRef>;

    /// Remove a request handler, returning it if it was registered
    fn unregister_request_handler(&self, id: Identifier) -> Option<RequestHandlerRef>;

    /// Whether a request handler is registered under `id`
    fn is_registered(&self, id: Identifier) -> bool;
}

pub type TransportBackendRef = Arc<dyn TransportBackend>;

// ----------------------------------------------------------------------------
// Readiness Channel
// ----------------------------------------------------------------------------

/// Create the one-shot readiness channel
///
/// The notifier goes to the transport, the signal to whoever wires the bridge.
pub fn ready_channel() -> (ReadyNotifier, ReadySignal) {
    let (sender, receiver) = oneshot::channel();
    (ReadyNotifier { sender }, ReadySignal { receiver })
}

/// Transport side of the readiness channel
pub struct ReadyNotifier {
    sender: oneshot::Sender<TransportBackendRef>,
}

impl ReadyNotifier {
    /// Announce that the transport is ready, handing over the backend
    pub fn notify(self, backend: TransportBackendRef) -> BridgeResult<()> {
        self.sender
            .send(backend)
            .map_err(|_| BridgeError::channel_error("Ready signal receiver was dropped"))
    }

    /// Whether the receiving side has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl fmt::Debug for ReadyNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyNotifier")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

/// Bridge side of the readiness channel
pub struct ReadySignal {
    receiver: oneshot::Receiver<TransportBackendRef>,
}

impl ReadySignal {
    /// Wait for the transport to become ready
    ///
    /// Returns `None` if the notifier was dropped without firing.
    pub async fn wait(self) -> Option<TransportBackendRef> {
        self.receiver.await.ok()
    }

    /// Take the backend if readiness was already announced
    pub fn try_ready(&mut self) -> Option<TransportBackendRef> {
        self.receiver.try_recv().ok()
    }
}

impl fmt::Debug for ReadySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadySignal").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullBackend;

    impl TransportBackend for NullBackend {
        fn send_event(&self, _event: BridgeEvent) {}
        fn send_request(&self, _request: BridgeRequest, _listener: ResponseListenerRef) {}
        fn register_request_handler(&self, _: &str, _: RequestHandlerRef, _: Identifier) {}
        fn add_event_listener(&self, _: &str, _: EventListenerRef, _: Identifier) {}
        fn remove_event_listener(&self, _id: Identifier) -> Option<EventListenerRef> {
            None
        }
        fn unregister_request_handler(&self, _id: Identifier) -> Option<RequestHandlerRef> {
            None
        }
        fn is_registered(&self, _id: Identifier) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_ready_signal_delivers_backend() {
        let (notifier, signal) = ready_channel();
        let backend: TransportBackendRef = Arc::new(NullBackend);

        let task = tokio::spawn(async move { signal.wait().await });
        notifier.notify(backend.clone()).unwrap();

        let delivered = task.await.unwrap().expect("backend should be delivered");
        assert!(Arc::ptr_eq(&delivered, &backend));
    }

    #[tokio::test]
    async fn test_dropped_notifier_yields_none() {
        let (notifier, signal) = ready_channel();
        drop(notifier);
        assert!(signal.wait().await.is_none());
    }

    #[test]
    fn test_notify_without_receiver_fails() {
        let (notifier, signal) = ready_channel();
        drop(signal);
        assert!(notifier.is_closed());
        let err = notifier.notify(Arc::new(NullBackend)).unwrap_err();
        assert!(matches!(err, BridgeError::Channel { .. }));
    }

    #[test]
    fn test_try_ready() {
        let (notifier, mut signal) = ready_channel();
        assert!(signal.try_ready().is_none());
        notifier.notify(Arc::new(NullBackend)).unwrap();
        assert!(signal.try_ready().is_some());
    }
}
