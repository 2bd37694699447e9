//! Result records as emitted by nuclei with `-jsonl`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Deserialize any JSON scalar as an optional string.
///
/// Null or missing becomes `None`, strings pass through, and any other value
/// keeps its JSON text so a type mismatch from the tool never rejects a line.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Deserialize `info` only when it is an object.
fn lenient_info<'de, D>(deserializer: D) -> Result<Option<FindingInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// One finding reported by the scanner.
///
/// Every field may be absent in the tool output. Keys not modelled here are
/// kept in `extra` so no information is lost between the runner and the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResultRecord {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(
        default,
        rename = "template-id",
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub template_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_info", skip_serializing_if = "Option::is_none")]
    pub info: Option<FindingInfo>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The nested `info` object of a finding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindingInfo {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScanResultRecord {
    /// Parse one line of JSONL output.
    ///
    /// The line must hold a JSON object; arrays and scalars are rejected.
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(line)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom(format!(
                "expected a JSON object, found {}",
                json_kind(&value)
            )));
        }
        serde_json::from_value(value)
    }

    pub fn name(&self) -> Option<&str> {
        self.info.as_ref().and_then(|info| info.name.as_deref())
    }

    pub fn severity(&self) -> Option<&str> {
        self.info.as_ref().and_then(|info| info.severity.as_deref())
    }

    pub fn description(&self) -> Option<&str> {
        self.info.as_ref().and_then(|info| info.description.as_deref())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
