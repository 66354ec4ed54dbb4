//! Matter cluster vocabulary used by the light bridge.
//!
//! Holds the cluster names, attribute names, enums and outbound command
//! builders for the OnOff, LevelControl and ColorControl clusters. Commands
//! are plain data; the transport that invokes them lives elsewhere.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod color_control;
pub mod level_control;
pub mod on_off;

pub use color_control::{ColorModeEnum, EnhancedColorModeEnum, FeatureMap};

/// Options bitmap sent with LevelControl and ColorControl commands.
///
/// `executeIfOff` lets color changes land while the light is off so that
/// turning it on afterwards shows the requested color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsBitmap {
    pub execute_if_off: bool,
}

impl OptionsBitmap {
    pub const EXECUTE_IF_OFF: Self = Self {
        execute_if_off: true,
    };
}

/// A command invocation on one cluster of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCommand {
    pub cluster_name: String,
    pub command_name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl ClusterCommand {
    pub fn new(cluster_name: &str, command_name: &str) -> Self {
        Self {
            cluster_name: cluster_name.to_string(),
            command_name: command_name.to_string(),
            args: Map::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.args.insert(name.to_string(), value.into());
        self
    }

    /// Add the standard `optionsMask`/`optionsOverride` pair.
    pub fn with_options(self, options: OptionsBitmap) -> Self {
        let value = serde_json::to_value(options).unwrap_or(Value::Null);
        self.arg("optionsMask", value.clone())
            .arg("optionsOverride", value)
    }

    /// Integer argument, if present.
    pub fn arg_u64(&self, name: &str) -> Option<u64> {
        self.args.get(name).and_then(Value::as_u64)
    }
}
