//! Navigation records
//!
//! Payload records exchanged by the navigation API. Optional fields are
//! omitted from the JSON form when absent; required fields are checked on
//! decode and reported as `BridgeError::MissingField`.

use core::fmt;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use rnbridge_core::{BridgeError, BridgeResult};

// ----------------------------------------------------------------------------
// Record Trait
// ----------------------------------------------------------------------------

/// A record that travels across the bridge as a JSON payload
pub trait BridgeRecord: Serialize + DeserializeOwned {
    /// Record name used in error messages
    const RECORD: &'static str;
    /// Fields that must be present (and non-null) on decode
    const REQUIRED: &'static [&'static str];

    fn to_value(&self) -> BridgeResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn from_value(value: Value) -> BridgeResult<Self> {
        check_required::<Self>(&value)?;
        Ok(serde_json::from_value(value)?)
    }
}

fn check_required<T: BridgeRecord>(value: &Value) -> BridgeResult<()> {
    let Some(object) = value.as_object() else {
        return Err(BridgeError::Payload(serde::de::Error::custom(format!(
            "{} must be a JSON object",
            T::RECORD
        ))));
    };

    for &field in T::REQUIRED {
        if object.get(field).map_or(true, Value::is_null) {
            return Err(BridgeError::missing_field(T::RECORD, field));
        }
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Display Helpers
// ----------------------------------------------------------------------------

struct Quoted<'a>(Option<&'a str>);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(s) => write!(f, "\"{}\"", s),
            None => f.write_str("null"),
        }
    }
}

struct Nullable<'a, T>(Option<&'a T>);

impl<T: fmt::Display> fmt::Display for Nullable<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => value.fmt(f),
            None => f.write_str("null"),
        }
    }
}

struct List<'a, T>(Option<&'a [T]>);

impl<T: fmt::Display> fmt::Display for List<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(items) = self.0 else {
            return f.write_str("null");
        };
        f.write_str("[")?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            item.fmt(f)?;
        }
        f.write_str("]")
    }
}

// ----------------------------------------------------------------------------
// Navigation Bar Buttons
// ----------------------------------------------------------------------------

/// A right-side navigation bar button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationBarButton {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ada_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

impl NavigationBarButton {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            icon: None,
            title: None,
            ada_label: None,
            disabled: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_ada_label(mut self, label: impl Into<String>) -> Self {
        self.ada_label = Some(label.into());
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }
}

impl BridgeRecord for NavigationBarButton {
    const RECORD: &'static str = "NavigationBarButton";
    const REQUIRED: &'static [&'static str] = &["id"];
}

impl fmt::Display for NavigationBarButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{id:{},icon:{},title:{},adaLabel:{},disabled:{}}}",
            Quoted(Some(self.id.as_str())),
            Quoted(self.icon.as_deref()),
            Quoted(self.title.as_deref()),
            Quoted(self.ada_label.as_deref()),
            Nullable(self.disabled.as_ref()),
        )
    }
}

/// The left (back) navigation bar button; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationBarLeftButton {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ada_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

impl NavigationBarLeftButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_ada_label(mut self, label: impl Into<String>) -> Self {
        self.ada_label = Some(label.into());
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }
}

impl BridgeRecord for NavigationBarLeftButton {
    const RECORD: &'static str = "NavigationBarLeftButton";
    const REQUIRED: &'static [&'static str] = &[];
}

impl fmt::Display for NavigationBarLeftButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{id:{},icon:{},title:{},adaLabel:{},disabled:{}}}",
            Quoted(self.id.as_deref()),
            Quoted(self.icon.as_deref()),
            Quoted(self.title.as_deref()),
            Quoted(self.ada_label.as_deref()),
            Nullable(self.disabled.as_ref()),
        )
    }
}

// ----------------------------------------------------------------------------
// Navigation Bar
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationBar {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<NavigationBarButton>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_button: Option<NavigationBarLeftButton>,
}

impl NavigationBar {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            hide: None,
            buttons: None,
            left_button: None,
        }
    }

    pub fn with_hide(mut self, hide: bool) -> Self {
        self.hide = Some(hide);
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<NavigationBarButton>) -> Self {
        self.buttons = Some(buttons);
        self
    }

    pub fn with_left_button(mut self, button: NavigationBarLeftButton) -> Self {
        self.left_button = Some(button);
        self
    }
}

impl BridgeRecord for NavigationBar {
    const RECORD: &'static str = "NavigationBar";
    const REQUIRED: &'static [&'static str] = &["title"];

    fn from_value(value: Value) -> BridgeResult<Self> {
        check_required::<Self>(&value)?;
        // Nested buttons carry their own required fields
        if let Some(Value::Array(buttons)) = value.get("buttons") {
            for button in buttons {
                check_required::<NavigationBarButton>(button)?;
            }
        }
        Ok(serde_json::from_value(value)?)
    }
}

impl fmt::Display for NavigationBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{title:{},hide:{},buttons:{},leftButton:{}}}",
            Quoted(Some(self.title.as_str())),
            Nullable(self.hide.as_ref()),
            List(self.buttons.as_deref()),
            Nullable(self.left_button.as_ref()),
        )
    }
}

// ----------------------------------------------------------------------------
// Navigation Route
// ----------------------------------------------------------------------------

/// Where to navigate, and how to present the destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavRoute {
    /// Destination path
    pub path: String,
    /// Opaque JSON string handed to the destination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_bar: Option<NavigationBar>,
    /// Present the destination over the current screen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<bool>,
    /// Reload the destination if it is already showing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<bool>,
    /// Replace the current screen instead of pushing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace: Option<bool>,
}

impl NavRoute {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            json_payload: None,
            navigation_bar: None,
            overlay: None,
            refresh: None,
            replace: None,
        }
    }

    pub fn with_json_payload(mut self, payload: impl Into<String>) -> Self {
        self.json_payload = Some(payload.into());
        self
    }

    pub fn with_navigation_bar(mut self, bar: NavigationBar) -> Self {
        self.navigation_bar = Some(bar);
        self
    }

    pub fn with_overlay(mut self, overlay: bool) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = Some(refresh);
        self
    }

    pub fn with_replace(mut self, replace: bool) -> Self {
        self.replace = Some(replace);
        self
    }
}

impl BridgeRecord for NavRoute {
    const RECORD: &'static str = "NavRoute";
    const REQUIRED: &'static [&'static str] = &["path"];

    fn from_value(value: Value) -> BridgeResult<Self> {
        check_required::<Self>(&value)?;
        if let Some(bar) = value.get("navigationBar").filter(|bar| !bar.is_null()) {
            NavigationBar::from_value(bar.clone())?;
        }
        Ok(serde_json::from_value(value)?)
    }
}

impl fmt::Display for NavRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{path:{},jsonPayload:{},navigationBar:{},overlay:{},refresh:{},replace:{}}}",
            Quoted(Some(self.path.as_str())),
            Quoted(self.json_payload.as_deref()),
            Nullable(self.navigation_bar.as_ref()),
            Nullable(self.overlay.as_ref()),
            Nullable(self.refresh.as_ref()),
            Nullable(self.replace.as_ref()),
        )
    }
}

// ----------------------------------------------------------------------------
// Navigation Event Data
// ----------------------------------------------------------------------------

/// Payload of a navigation event raised by a screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavEventData {
    pub event_type: String,
    pub view_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_payload: Option<String>,
}

impl NavEventData {
    pub fn new(event_type: impl Into<String>, view_id: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            view_id: view_id.into(),
            json_payload: None,
        }
    }

    pub fn with_json_payload(mut self, payload: impl Into<String>) -> Self {
        self.json_payload = Some(payload.into());
        self
    }
}

impl BridgeRecord for NavEventData {
    const RECORD: &'static str = "NavEventData";
    const REQUIRED: &'static [&'static str] = &["eventType", "viewId"];
}

impl fmt::Display for NavEventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{eventType:{},viewId:{},jsonPayload:{}}}",
            Quoted(Some(self.event_type.as_str())),
            Quoted(Some(self.view_id.as_str())),
            Quoted(self.json_payload.as_deref()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_omits_absent_fields() {
        let route = NavRoute::new("/home").with_overlay(true);
        let value = route.to_value().unwrap();
        assert_eq!(value, json!({"path": "/home", "overlay": true}));
        assert_eq!(NavRoute::from_value(value).unwrap(), route);
    }

    #[test]
    fn test_route_requires_path() {
        let err = NavRoute::from_value(json!({"overlay": true})).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::MissingField {
                record: "NavRoute",
                field: "path"
            }
        ));
        assert!(NavRoute::from_value(json!({"path": null})).is_err());
        assert!(NavRoute::from_value(json!("just a string")).is_err());
    }

    #[test]
    fn test_nested_required_fields() {
        let err = NavRoute::from_value(json!({
            "path": "/cart",
            "navigationBar": {"hide": true}
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::MissingField {
                record: "NavigationBar",
                ..
            }
        ));

        let err = NavigationBar::from_value(json!({
            "title": "Cart",
            "buttons": [{"icon": "x"}]
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::MissingField {
                record: "NavigationBarButton",
                field: "id"
            }
        ));
    }

    #[test]
    fn test_route_display() {
        let route = NavRoute::new("/home")
            .with_json_payload("{}")
            .with_navigation_bar(
                NavigationBar::new("Home")
                    .with_buttons(vec![NavigationBarButton::new("search").with_disabled(false)]),
            );
        assert_eq!(
            route.to_string(),
            "{path:\"/home\",jsonPayload:\"{}\",navigationBar:{title:\"Home\",hide:null,\
             buttons:[{id:\"search\",icon:null,title:null,adaLabel:null,disabled:false}],\
             leftButton:null},overlay:null,refresh:null,replace:null}"
        );
    }

    #[test]
    fn test_left_button_all_optional() {
        let button = NavigationBarLeftButton::from_value(json!({})).unwrap();
        assert_eq!(button, NavigationBarLeftButton::new());
        let button = NavigationBarLeftButton::new().with_title("Back").with_ada_label("Go back");
        assert_eq!(
            button.to_value().unwrap(),
            json!({"title": "Back", "adaLabel": "Go back"})
        );
    }

    #[test]
    fn test_nav_event_data() {
        let data = NavEventData::new("BUTTON_CLICK", "view-1").with_json_payload("{\"a\":1}");
        let value = data.to_value().unwrap();
        assert_eq!(value["eventType"], "BUTTON_CLICK");
        assert_eq!(NavEventData::from_value(value).unwrap(), data);

        let err = NavEventData::from_value(json!({"eventType": "X"})).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::MissingField {
                field: "viewId",
                ..
            }
        ));
        assert_eq!(
            NavEventData::new("X", "v").to_string(),
            "{eventType:\"X\",viewId:\"v\",jsonPayload:null}"
        );
    }
}
