//! Stack domain types: handles, update summaries, and output sets.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::error::ConfigError;

/// Output key the declared echo-server program exports its published port under.
pub const DEFAULT_PORT_OUTPUT: &str = "containerPort";

/// A named deployment unit bound to the directory holding its declared resources.
///
/// Equality is by name and directory: selecting the same stack twice yields
/// equal handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackHandle {
    /// Logical stack name, e.g. `"test"`.
    pub name: String,
    /// Directory containing `Pulumi.yaml`.
    pub work_dir: PathBuf,
}

/// Per-operation resource change counts reported by the engine.
///
/// Keys absent from the engine's report read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResourceChanges {
    pub create: u32,
    pub update: u32,
    pub delete: u32,
    pub same: u32,
    pub replace: u32,
}

/// Summary of the most recent engine update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    /// Operation kind, e.g. `"update"` or `"refresh"`.
    #[serde(default)]
    pub kind: String,
    /// Operation result, e.g. `"succeeded"`.
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub resource_changes: ResourceChanges,
}

/// Values exported by a stack after a successful apply. Read-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputSet(BTreeMap<String, Value>);

impl OutputSet {
    #[must_use]
    pub fn new(values: BTreeMap<String, Value>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Extract the externally reachable port exported under `key`.
    ///
    /// Absent and falsy values (`null`, `false`, `0`, `""`) are a missing
    /// output. Numbers and numeric strings in `1..=65535` are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingOutput`] or [`ConfigError::InvalidPort`].
    pub fn required_port(&self, key: &str) -> Result<u16, ConfigError> {
        let value = self
            .get(key)
            .filter(|v| is_truthy(v))
            .ok_or_else(|| ConfigError::MissingOutput(key.to_string()))?;

        let parsed = match value {
            Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            Value::String(s) => s.trim().parse::<u16>().ok(),
            _ => None,
        };
        parsed.filter(|p| *p != 0).ok_or_else(|| ConfigError::InvalidPort {
            key: key.to_string(),
            value: display_value(value),
        })
    }
}

/// Render an output value for humans: strings without quotes, everything else as JSON.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// JSON truthiness: `null`, `false`, `0` and `""` are falsy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
