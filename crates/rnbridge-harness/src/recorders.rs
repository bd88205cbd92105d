//! Recording callbacks
//!
//! Listener, responder and handler implementations that remember what they
//! saw, for asserting on bridge delivery.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rnbridge_core::{
    BridgeEvent, BridgeRequest, BridgeResponse, EventListener, FailureMessage, RequestHandler,
    ResponseListener, ResponseListenerRef,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ----------------------------------------------------------------------------
// Event Listener
// ----------------------------------------------------------------------------

/// Event listener that records every event it receives
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<BridgeEvent>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<BridgeEvent> {
        lock(&self.events).clone()
    }

    pub fn names(&self) -> Vec<String> {
        lock(&self.events).iter().map(|e| e.name.clone()).collect()
    }

    pub fn count(&self) -> usize {
        lock(&self.events).len()
    }
}

impl EventListener for RecordingListener {
    fn on_event(&self, event: &BridgeEvent) {
        lock(&self.events).push(event.clone());
    }
}

// ----------------------------------------------------------------------------
// Response Listener
// ----------------------------------------------------------------------------

/// Response listener that records every outcome it receives
#[derive(Debug, Default)]
pub struct RecordingResponder {
    outcomes: Mutex<Vec<Result<BridgeResponse, FailureMessage>>>,
}

impl RecordingResponder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn outcomes(&self) -> Vec<Result<BridgeResponse, FailureMessage>> {
        lock(&self.outcomes).clone()
    }

    pub fn successes(&self) -> Vec<BridgeResponse> {
        lock(&self.outcomes)
            .iter()
            .filter_map(|outcome| outcome.as_ref().ok().cloned())
            .collect()
    }

    pub fn failures(&self) -> Vec<FailureMessage> {
        lock(&self.outcomes)
            .iter()
            .filter_map(|outcome| outcome.as_ref().err().cloned())
            .collect()
    }

    pub fn count(&self) -> usize {
        lock(&self.outcomes).len()
    }
}

impl ResponseListener for RecordingResponder {
    fn on_success(&self, response: BridgeResponse) {
        lock(&self.outcomes).push(Ok(response));
    }

    fn on_failure(&self, failure: FailureMessage) {
        lock(&self.outcomes).push(Err(failure));
    }
}

// ----------------------------------------------------------------------------
// Request Handlers
// ----------------------------------------------------------------------------

/// Handler that answers every request with its own payload
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

impl RequestHandler for EchoHandler {
    fn on_request(&self, request: BridgeRequest, responder: ResponseListenerRef) {
        let data = request.data.clone();
        responder.on_success(request.respond(data));
    }
}

/// Handler that fails every request with a fixed failure
#[derive(Debug, Clone)]
pub struct FailingHandler {
    failure: FailureMessage,
}

impl FailingHandler {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            failure: FailureMessage::new(code, message),
        }
    }
}

impl RequestHandler for FailingHandler {
    fn on_request(&self, _request: BridgeRequest, responder: ResponseListenerRef) {
        responder.on_failure(self.failure.clone());
    }
}
