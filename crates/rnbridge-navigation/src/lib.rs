//! rnbridge Navigation API
//!
//! Navigation records and typed event/request helpers layered on the bridge
//! facade. Everything here goes through `Bridge`, so navigation calls made
//! before the transport is ready are queued like any other call.

pub mod events;
pub mod model;
pub mod requests;

pub use events::{NavigationEvents, EVENT_NAV_EVENT, EVENT_ON_NAV_BUTTON_CLICK};
pub use model::{
    BridgeRecord, NavEventData, NavRoute, NavigationBar, NavigationBarButton,
    NavigationBarLeftButton,
};
pub use requests::{
    NavigationRequests, INVALID_PAYLOAD_CODE, REQUEST_BACK, REQUEST_FINISH, REQUEST_NAVIGATE,
    REQUEST_UPDATE,
};

use rnbridge_runtime::Bridge;

/// Navigation events and requests sharing one bridge
#[derive(Debug, Clone)]
pub struct NavigationApi {
    events: NavigationEvents,
    requests: NavigationRequests,
}

impl NavigationApi {
    pub fn new(bridge: Bridge) -> Self {
        Self {
            events: NavigationEvents::new(bridge.clone()),
            requests: NavigationRequests::new(bridge),
        }
    }

    pub fn events(&self) -> &NavigationEvents {
        &self.events
    }

    pub fn requests(&self) -> &NavigationRequests {
        &self.requests
    }
}
