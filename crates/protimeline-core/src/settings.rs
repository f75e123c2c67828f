//! Visual settings and their host round trip
//!
//! The host persists formatting options as a JSON object keyed by object
//! name (`{"showLegend": {"show": false}}`). Settings are parsed from that
//! object on every update and enumerated back so the host's property pane
//! can display and edit them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::SettingsError;

/// Object name of the legend toggle
pub const SHOW_LEGEND: &str = "showLegend";

/// Legend toggle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowLegend {
    #[serde(default = "default_true")]
    pub show: bool,
}

impl Default for ShowLegend {
    fn default() -> Self {
        Self { show: true }
    }
}

fn default_true() -> bool {
    true
}

/// All settings recognized by the visual
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSettings {
    #[serde(rename = "showLegend", default)]
    pub show_legend: ShowLegend,
}

/// One enumerated settings object, as handed back to the host
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInstance {
    pub object_name: String,
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl TimelineSettings {
    /// Parse the host objects JSON. Unknown objects and properties are ignored.
    pub fn from_objects(objects: &serde_json::Value) -> Result<Self, SettingsError> {
        if objects.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(objects.clone())?)
    }

    /// Parse the host objects, keeping defaults when they are absent or malformed
    pub fn from_objects_or_default(objects: Option<&serde_json::Value>) -> Self {
        match objects.map(Self::from_objects) {
            None => Self::default(),
            Some(Ok(settings)) => settings,
            Some(Err(err)) => {
                warn!(error = %err, "ignoring malformed visual settings");
                Self::default()
            }
        }
    }

    /// Enumerate the settings object named `object_name` for the property pane
    pub fn enumerate_object_instances(&self, object_name: &str) -> Vec<ObjectInstance> {
        match object_name {
            SHOW_LEGEND => {
                let mut properties = BTreeMap::new();
                properties.insert("show".to_string(), self.show_legend.show.into());
                vec![ObjectInstance {
                    object_name: SHOW_LEGEND.to_string(),
                    properties,
                }]
            }
            _ => Vec::new(),
        }
    }
}
