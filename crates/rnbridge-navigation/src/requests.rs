//! Navigation requests
//!
//! Typed senders for the navigation requests and a typed handler adapter for
//! servicing `navigate`.

use std::sync::Arc;

use rnbridge_core::{
    BridgeError, BridgeRequest, BridgeResult, FailureMessage, Identifier, RequestHandlerRef,
    ResponseListenerRef,
};
use rnbridge_runtime::Bridge;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{BridgeRecord, NavRoute};

pub const REQUEST_NAVIGATE: &str = "navigation.request.navigate";
pub const REQUEST_UPDATE: &str = "navigation.request.update";
pub const REQUEST_BACK: &str = "navigation.request.back";
pub const REQUEST_FINISH: &str = "navigation.request.finish";

/// Failure code a typed handler answers with when the request payload is unusable
pub const INVALID_PAYLOAD_CODE: &str = "EINVALIDPAYLOAD";

/// Typed access to navigation requests through a bridge
#[derive(Debug, Clone)]
pub struct NavigationRequests {
    bridge: Bridge,
}

impl NavigationRequests {
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    /// Ask the host to navigate to `route`
    pub fn navigate(&self, route: &NavRoute, listener: ResponseListenerRef) -> BridgeResult<()> {
        self.send(REQUEST_NAVIGATE, Some(route.to_value()?), listener)
    }

    /// Update the currently displayed route, e.g. its navigation bar
    pub fn update(&self, route: &NavRoute, listener: ResponseListenerRef) -> BridgeResult<()> {
        self.send(REQUEST_UPDATE, Some(route.to_value()?), listener)
    }

    /// Navigate back to `route`
    pub fn back(&self, route: &NavRoute, listener: ResponseListenerRef) -> BridgeResult<()> {
        self.send(REQUEST_BACK, Some(route.to_value()?), listener)
    }

    /// Finish the current flow, optionally handing a JSON string back to the host
    pub fn finish(&self, final_payload: Option<&str>, listener: ResponseListenerRef) -> BridgeResult<()> {
        let data = final_payload.map(|payload| Value::String(payload.to_string()));
        self.send(REQUEST_FINISH, data, listener)
    }

    /// Service `navigate` requests with a typed handler
    ///
    /// Requests whose payload is not a valid `NavRoute` are answered with an
    /// `EINVALIDPAYLOAD` failure without invoking `handler`.
    pub fn register_navigate_handler<F>(&self, handler: F) -> BridgeResult<Identifier>
    where
        F: Fn(NavRoute) -> Result<(), FailureMessage> + Send + Sync + 'static,
    {
        let adapter = move |request: BridgeRequest, responder: ResponseListenerRef| {
            let route = match request.data.clone() {
                Some(value) => NavRoute::from_value(value),
                None => Err(BridgeError::missing_field(NavRoute::RECORD, "path")),
            };

            match route {
                Ok(route) => match handler(route) {
                    Ok(()) => responder.on_success(request.respond(None)),
                    Err(failure) => responder.on_failure(failure),
                },
                Err(err) => {
                    warn!(request = %request, error = %err, "Rejecting navigate request");
                    responder.on_failure(FailureMessage::new(INVALID_PAYLOAD_CODE, err.to_string()));
                }
            }
        };
        self.bridge
            .register_request_handler(REQUEST_NAVIGATE, Arc::new(adapter))
    }

    pub fn unregister_navigate_handler(&self, id: Identifier) -> Option<RequestHandlerRef> {
        self.bridge.unregister_request_handler(id)
    }

    fn send(&self, name: &str, data: Option<Value>, listener: ResponseListenerRef) -> BridgeResult<()> {
        let mut request = BridgeRequest::new(name);
        request.data = data;
        debug!("Sending navigation {}", request);
        self.bridge.send_request(request, Some(listener))
    }
}
