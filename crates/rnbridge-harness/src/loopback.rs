//! Loopback transport backend
//!
//! `LoopbackBackend` services the bridge in-process: events go to the
//! listeners registered for their name, requests go to the handler registered
//! for their name. Every call is recorded so tests can assert on delivery
//! order. Callbacks run without the backend lock held, so they may call back
//! into the bridge or the backend.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rnbridge_core::{
    BridgeEvent, BridgeRequest, EventListenerRef, FailureMessage, Identifier, RequestHandlerRef,
    ResponseListenerRef, TransportBackend,
};
use tracing::{debug, trace};

/// Failure code reported for requests nobody handles
pub const NO_HANDLER_CODE: &str = "ENOHANDLER";

/// One call made on the backend, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    SendEvent { name: String },
    SendRequest { name: String },
    RegisterHandler { name: String, id: Identifier },
    AddListener { name: String, id: Identifier },
    RemoveListener { id: Identifier, found: bool },
    UnregisterHandler { id: Identifier, found: bool },
}

impl BackendCall {
    /// Message or registration name, for calls that carry one
    pub fn name(&self) -> Option<&str> {
        match self {
            BackendCall::SendEvent { name }
            | BackendCall::SendRequest { name }
            | BackendCall::RegisterHandler { name, .. }
            | BackendCall::AddListener { name, .. } => Some(name),
            BackendCall::RemoveListener { .. } | BackendCall::UnregisterHandler { .. } => None,
        }
    }
}

#[derive(Default)]
struct LoopbackState {
    handlers: HashMap<Identifier, (String, RequestHandlerRef)>,
    handler_by_name: HashMap<String, Identifier>,
    listeners: Vec<(Identifier, String, EventListenerRef)>,
    calls: Vec<BackendCall>,
}

/// In-process transport that loops events and requests back to local callbacks
#[derive(Default)]
pub struct LoopbackBackend {
    state: Mutex<LoopbackState>,
}

impl LoopbackBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LoopbackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Calls carrying `name`
    pub fn calls_named(&self, name: &str) -> Vec<BackendCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.name() == Some(name))
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn handler_count(&self) -> usize {
        self.lock().handlers.len()
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.lock()
            .listeners
            .iter()
            .filter(|(_, listener_name, _)| listener_name == name)
            .count()
    }
}

impl TransportBackend for LoopbackBackend {
    fn send_event(&self, event: BridgeEvent) {
        let listeners: Vec<EventListenerRef> = {
            let mut state = self.lock();
            state.calls.push(BackendCall::SendEvent {
                name: event.name.clone(),
            });
            state
                .listeners
                .iter()
                .filter(|(_, name, _)| *name == event.name)
                .map(|(_, _, listener)| listener.clone())
                .collect()
        };

        trace!("Loopback delivering {} to {} listeners", event, listeners.len());
        for listener in listeners {
            listener.on_event(&event);
        }
    }

    fn send_request(&self, request: BridgeRequest, listener: ResponseListenerRef) {
        let handler = {
            let mut state = self.lock();
            state.calls.push(BackendCall::SendRequest {
                name: request.name.clone(),
            });
            state
                .handler_by_name
                .get(&request.name)
                .and_then(|id| state.handlers.get(id))
                .map(|(_, handler)| handler.clone())
        };

        match handler {
            Some(handler) => handler.on_request(request, listener),
            None => {
                debug!("Loopback has no handler for {}", request);
                listener.on_failure(FailureMessage::new(
                    NO_HANDLER_CODE,
                    format!("No handler registered for '{}'", request.name),
                ));
            }
        }
    }

    fn register_request_handler(&self, name: &str, handler: RequestHandlerRef, id: Identifier) {
        let mut state = self.lock();
        state.calls.push(BackendCall::RegisterHandler {
            name: name.to_string(),
            id,
        });
        // One handler per request name
        if let Some(previous) = state.handler_by_name.insert(name.to_string(), id) {
            state.handlers.remove(&previous);
            debug!("Loopback handler {} for '{}' replaced by {}", previous, name, id);
        }
        state.handlers.insert(id, (name.to_string(), handler));
    }

    fn add_event_listener(&self, name: &str, listener: EventListenerRef, id: Identifier) {
        let mut state = self.lock();
        state.calls.push(BackendCall::AddListener {
            name: name.to_string(),
            id,
        });
        state.listeners.push((id, name.to_string(), listener));
    }

    fn remove_event_listener(&self, id: Identifier) -> Option<EventListenerRef> {
        let mut state = self.lock();
        let removed = state
            .listeners
            .iter()
            .position(|(listener_id, _, _)| *listener_id == id)
            .map(|position| state.listeners.remove(position).2);
        state.calls.push(BackendCall::RemoveListener {
            id,
            found: removed.is_some(),
        });
        removed
    }

    fn unregister_request_handler(&self, id: Identifier) -> Option<RequestHandlerRef> {
        let mut state = self.lock();
        let removed = state.handlers.remove(&id);
        if let Some((name, _)) = &removed {
            if state.handler_by_name.get(name) == Some(&id) {
                state.handler_by_name.remove(name);
            }
        }
        state.calls.push(BackendCall::UnregisterHandler {
            id,
            found: removed.is_some(),
        });
        removed.map(|(_, handler)| handler)
    }

    fn is_registered(&self, id: Identifier) -> bool {
        self.lock().handlers.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorders::{EchoHandler, RecordingListener, RecordingResponder};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_events_reach_matching_listeners() {
        let backend = LoopbackBackend::new();
        let nav = RecordingListener::new();
        let other = RecordingListener::new();
        backend.add_event_listener("nav", nav.clone(), Identifier::new());
        backend.add_event_listener("other", other.clone(), Identifier::new());

        backend.send_event(BridgeEvent::new("nav"));
        assert_eq!(nav.count(), 1);
        assert_eq!(other.count(), 0);
        assert_eq!(backend.calls_named("nav").len(), 2);
    }

    #[test]
    fn test_request_without_handler_fails() {
        let backend = LoopbackBackend::new();
        let responder = RecordingResponder::new();
        backend.send_request(BridgeRequest::new("navigate"), responder.clone());

        let failures = responder.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].code, NO_HANDLER_CODE);
    }

    #[test]
    fn test_request_routed_to_handler() {
        let backend = LoopbackBackend::new();
        let id = Identifier::new();
        backend.register_request_handler("echo", Arc::new(EchoHandler), id);
        assert!(backend.is_registered(id));

        let responder = RecordingResponder::new();
        backend.send_request(
            BridgeRequest::new("echo").with_data(json!({"x": 1})),
            responder.clone(),
        );
        assert_eq!(responder.successes()[0].data, Some(json!({"x": 1})));
    }

    #[test]
    fn test_second_handler_replaces_first() {
        let backend = LoopbackBackend::new();
        let (first, second) = (Identifier::new(), Identifier::new());
        backend.register_request_handler("echo", Arc::new(EchoHandler), first);
        backend.register_request_handler("echo", Arc::new(EchoHandler), second);

        assert!(!backend.is_registered(first));
        assert!(backend.is_registered(second));
        assert_eq!(backend.handler_count(), 1);
    }

    #[test]
    fn test_removal_is_recorded() {
        let backend = LoopbackBackend::new();
        let id = Identifier::new();
        backend.add_event_listener("nav", RecordingListener::new(), id);

        assert!(backend.remove_event_listener(id).is_some());
        assert!(backend.remove_event_listener(id).is_none());
        assert!(backend.unregister_request_handler(id).is_none());
        assert_eq!(backend.listener_count("nav"), 0);

        let calls = backend.calls();
        assert_eq!(calls[1], BackendCall::RemoveListener { id, found: true });
        assert_eq!(calls[2], BackendCall::RemoveListener { id, found: false });
        assert_eq!(calls[3], BackendCall::UnregisterHandler { id, found: false });

        backend.clear_calls();
        assert!(backend.calls().is_empty());
    }
}
