//! Navigation events
//!
//! Typed emitters and listeners for the two navigation events: `navEvent`,
//! carrying `NavEventData`, and `onNavButtonClick`, carrying the id of the
//! clicked button.

use std::sync::Arc;

use rnbridge_core::{BridgeError, BridgeEvent, BridgeResult, EventListenerRef, Identifier};
use rnbridge_runtime::Bridge;
use serde_json::Value;
use tracing::warn;

use crate::model::{BridgeRecord, NavEventData};

pub const EVENT_NAV_EVENT: &str = "navigation.event.navEvent";
pub const EVENT_ON_NAV_BUTTON_CLICK: &str = "navigation.event.onNavButtonClick";

/// Typed access to navigation events through a bridge
#[derive(Debug, Clone)]
pub struct NavigationEvents {
    bridge: Bridge,
}

impl NavigationEvents {
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    /// Listen for `navEvent`; events with a malformed payload are logged and skipped
    pub fn add_nav_event_listener<F>(&self, listener: F) -> BridgeResult<Identifier>
    where
        F: Fn(NavEventData) + Send + Sync + 'static,
    {
        let adapter = move |event: &BridgeEvent| {
            let decoded = match &event.data {
                Some(value) => NavEventData::from_value(value.clone()),
                None => Err(BridgeError::missing_field(NavEventData::RECORD, "eventType")),
            };
            match decoded {
                Ok(data) => listener(data),
                Err(err) => warn!(event = %event, error = %err, "Skipping navEvent with malformed payload"),
            }
        };
        self.bridge
            .add_event_listener(EVENT_NAV_EVENT, Arc::new(adapter))
    }

    /// Listen for `onNavButtonClick`, receiving the clicked button id
    pub fn add_on_nav_button_click_listener<F>(&self, listener: F) -> BridgeResult<Identifier>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let adapter = move |event: &BridgeEvent| match event.decode_payload::<String>() {
            Ok(Some(button_id)) => listener(button_id),
            Ok(None) => warn!(event = %event, "Skipping onNavButtonClick without a button id"),
            Err(err) => warn!(event = %event, error = %err, "Skipping onNavButtonClick with malformed payload"),
        };
        self.bridge
            .add_event_listener(EVENT_ON_NAV_BUTTON_CLICK, Arc::new(adapter))
    }

    pub fn remove_nav_event_listener(&self, id: Identifier) -> Option<EventListenerRef> {
        self.bridge.remove_event_listener(id)
    }

    pub fn remove_on_nav_button_click_listener(&self, id: Identifier) -> Option<EventListenerRef> {
        self.bridge.remove_event_listener(id)
    }

    pub fn emit_nav_event(&self, data: &NavEventData) -> BridgeResult<()> {
        let event = BridgeEvent::new(EVENT_NAV_EVENT).with_data(data.to_value()?);
        self.bridge.emit_event(event);
        Ok(())
    }

    pub fn emit_on_nav_button_click(&self, button_id: &str) {
        let event =
            BridgeEvent::new(EVENT_ON_NAV_BUTTON_CLICK).with_data(Value::String(button_id.to_string()));
        self.bridge.emit_event(event);
    }
}
