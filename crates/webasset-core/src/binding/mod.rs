//! Generic discovery bindings.
//!
//! A binding ties a resource query to a binding type and a set of parameter
//! values. Asset mappings are persisted as bindings of a dedicated type so
//! the generic discovery search can find them.

pub mod discovery;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::expr::Record;

pub use discovery::{ConfigDiscovery, Discovery};

/// Lifecycle state of a binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BindingState {
    #[default]
    Enabled,
    Disabled,
    TypeNotFound,
    Invalid,
}

impl BindingState {
    pub fn as_str(self) -> &'static str {
        match self {
            BindingState::Enabled => "enabled",
            BindingState::Disabled => "disabled",
            BindingState::TypeNotFound => "type-not-found",
            BindingState::Invalid => "invalid",
        }
    }
}

impl fmt::Display for BindingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A binding stored in the discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingDescriptor {
    pub uuid: Uuid,

    /// Resource query (a glob over repository paths)
    pub query: String,

    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub state: BindingState,

    #[serde(default, rename = "parameters")]
    pub parameter_values: BTreeMap<String, String>,
}

impl BindingDescriptor {
    pub const UUID: &'static str = "uuid";
    pub const QUERY: &'static str = "query";
    pub const TYPE_NAME: &'static str = "typeName";
    pub const PARAMETER_VALUES: &'static str = "parameterValues";
    pub const STATE: &'static str = "state";

    /// Create an enabled binding with a fresh UUID.
    pub fn new(query: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            query: query.into(),
            type_name: type_name.into(),
            state: BindingState::Enabled,
            parameter_values: BTreeMap::new(),
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_state(mut self, state: BindingState) -> Self {
        self.state = state;
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameter_values.insert(name.into(), value.into());
        self
    }

    pub fn parameter_value(&self, name: &str) -> Option<&str> {
        self.parameter_values.get(name).map(String::as_str)
    }
}

impl Record for BindingDescriptor {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            Self::UUID => Some(Value::String(self.uuid.to_string())),
            Self::QUERY => Some(Value::String(self.query.clone())),
            Self::TYPE_NAME => Some(Value::String(self.type_name.clone())),
            Self::STATE => Some(Value::String(self.state.as_str().to_string())),
            Self::PARAMETER_VALUES => Some(Value::Object(
                self.parameter_values
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;

    #[test]
    fn binding_exposes_fields_to_expressions() {
        let binding = BindingDescriptor::new("/app/public{,/**}", "test/type")
            .with_parameter("target", "local");

        assert!(Expr::same(BindingDescriptor::STATE, "enabled").evaluate(&binding));
        assert!(Expr::same(BindingDescriptor::TYPE_NAME, "test/type").evaluate(&binding));
        assert!(Expr::ends_with(BindingDescriptor::QUERY, "{,/**}").evaluate(&binding));
        assert!(
            Expr::key_same(BindingDescriptor::PARAMETER_VALUES, "target", "local")
                .evaluate(&binding)
        );
        assert!(
            Expr::same(BindingDescriptor::UUID, binding.uuid.to_string()).evaluate(&binding)
        );
    }

    #[test]
    fn disabled_binding_reports_its_state() {
        let binding =
            BindingDescriptor::new("/a", "test/type").with_state(BindingState::Disabled);
        assert!(!Expr::same(BindingDescriptor::STATE, "enabled").evaluate(&binding));
        assert_eq!(binding.state.to_string(), "disabled");
    }
}
