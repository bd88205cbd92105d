//! Bridge message payloads
//!
//! Requests, events and responses carry a name and an optional JSON payload.
//! Typed records are converted to and from the payload with serde; the bridge
//! itself never inspects payload contents.

use core::fmt;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::Result;

fn encode<T: Serialize>(payload: &T) -> Result<Value> {
    Ok(serde_json::to_value(payload)?)
}

fn decode<T: DeserializeOwned>(data: &Option<Value>) -> Result<Option<T>> {
    match data {
        Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        None => Ok(None),
    }
}

// ----------------------------------------------------------------------------
// Bridge Request
// ----------------------------------------------------------------------------

/// A request sent across the bridge, answered through a response listener
///
/// The request `id` is its identity: while the bridge is not ready, pending
/// requests are keyed by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRequest {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl BridgeRequest {
    /// Create a request without payload
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            data: None,
        }
    }

    /// Attach a raw JSON payload
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach a typed payload
    pub fn with_payload<T: Serialize>(self, payload: &T) -> Result<Self> {
        Ok(self.with_data(encode(payload)?))
    }

    /// Decode the payload into a typed record, if present
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        decode(&self.data)
    }

    /// Build the success response for this request
    pub fn respond(&self, data: Option<Value>) -> BridgeResponse {
        BridgeResponse {
            request_id: self.id,
            name: self.name.clone(),
            data,
        }
    }
}

impl fmt::Display for BridgeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request(name={}, id={})", self.name, self.id)
    }
}

// ----------------------------------------------------------------------------
// Bridge Event
// ----------------------------------------------------------------------------

/// A fire-and-forget event delivered to every listener registered for its name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeEvent {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl BridgeEvent {
    /// Create an event without payload
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            data: None,
        }
    }

    /// Attach a raw JSON payload
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach a typed payload
    pub fn with_payload<T: Serialize>(self, payload: &T) -> Result<Self> {
        Ok(self.with_data(encode(payload)?))
    }

    /// Decode the payload into a typed record, if present
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        decode(&self.data)
    }
}

impl fmt::Display for BridgeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event(name={}, id={})", self.name, self.id)
    }
}

// ----------------------------------------------------------------------------
// Responses
// ----------------------------------------------------------------------------

/// Successful answer to a `BridgeRequest`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeResponse {
    pub request_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl BridgeResponse {
    /// Decode the payload into a typed record, if present
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        decode(&self.data)
    }
}

/// Failure answer to a `BridgeRequest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureMessage {
    pub code: String,
    pub message: String,
}

impl FailureMessage {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FailureMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Route {
        path: String,
    }

    #[test]
    fn test_request_payload() {
        let request = BridgeRequest::new("navigate")
            .with_payload(&Route {
                path: "/home".to_string(),
            })
            .unwrap();

        assert_eq!(request.data, Some(json!({"path": "/home"})));
        let route: Option<Route> = request.decode_payload().unwrap();
        assert_eq!(route.unwrap().path, "/home");

        let response = request.respond(None);
        assert_eq!(response.request_id, request.id);
        assert_eq!(response.name, "navigate");
    }

    #[test]
    fn test_decode_mismatched_payload() {
        let event = BridgeEvent::new("nav").with_data(json!({"other": 1}));
        assert!(event.decode_payload::<Route>().is_err());
        assert!(BridgeEvent::new("nav")
            .decode_payload::<Route>()
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_absent_data_is_omitted() {
        let event = BridgeEvent::new("nav");
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["name"], "nav");
    }

    #[test]
    fn test_requests_have_distinct_ids() {
        assert_ne!(BridgeRequest::new("a").id, BridgeRequest::new("a").id);
    }
}
