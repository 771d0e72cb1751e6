use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::{Map, Value};

/// Standard object metadata. Only the fields this tool reads are typed;
/// everything else is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A declared template parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// Generator directive (e.g. "expression"); empty when the value is explicit
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generate: String,
    /// Input pattern for the generator
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

/// A parameterized bundle of resources as served by the template store.
///
/// `objects` are kept as raw JSON so the processor receives exactly what the
/// store returned. `RawValue` does not survive `#[serde(flatten)]`, so every
/// top-level field is spelled out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_template_kind")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub labels: IndexMap<String, String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub objects: Vec<Box<RawValue>>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_template_kind() -> String {
    "Template".to_string()
}

impl Template {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_template_kind(),
            metadata: ObjectMeta {
                name: name.to_string(),
                namespace: namespace.to_string(),
                extra: Map::new(),
            },
            message: None,
            labels: IndexMap::new(),
            parameters: Vec::new(),
            objects: Vec::new(),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Replaces the parameter with the same name, or appends it if absent.
    pub fn set_parameter(&mut self, parameter: Parameter) {
        match self.parameters.iter_mut().find(|p| p.name == parameter.name) {
            Some(existing) => *existing = parameter,
            None => self.parameters.push(parameter),
        }
    }
}

/// Raw bytes of one object produced by template expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    pub raw: Vec<u8>,
}

impl RawObject {
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }
}

impl From<&RawValue> for RawObject {
    fn from(value: &RawValue) -> Self {
        Self {
            raw: value.get().as_bytes().to_vec(),
        }
    }
}

/// One entry of an expanded template.
///
/// Only `Raw` entries can be mapped into resources; anything else the
/// processor hands back is reported as unconvertible.
#[derive(Debug, Clone)]
pub enum ExpandedObject {
    Raw(RawObject),
    Other(Value),
}

impl ExpandedObject {
    #[cfg(test)]
    pub fn raw(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Raw(RawObject { raw: bytes.into() })
    }

    /// Classifies a processor response entry. JSON objects keep their exact bytes.
    pub fn from_raw_value(value: &RawValue) -> Self {
        match serde_json::from_str::<Value>(value.get()) {
            Ok(Value::Object(_)) | Err(_) => Self::Raw(RawObject::from(value)),
            Ok(other) => Self::Other(other),
        }
    }
}

/// API group a resource kind is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceGroup {
    /// Base orchestration API (`/api/v1`)
    Core,
    /// Platform API group (`/oapi/v1`)
    Origin,
}

impl ResourceGroup {
    pub fn api_prefix(self) -> &'static str {
        match self {
            Self::Core => "api/v1/",
            Self::Origin => "oapi/v1/",
        }
    }
}
