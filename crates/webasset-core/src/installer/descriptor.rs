//! Installer descriptors and their parameters.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::AssetError;
use crate::expr::Record;
use crate::fs::LinkMode;

/// A parameter accepted by an installer and set per install target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallerParameter {
    pub name: String,
    pub required: bool,
    pub default_value: Option<String>,
    pub description: Option<String>,
}

impl InstallerParameter {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            default_value: None,
            description: None,
        }
    }

    pub fn optional(name: impl Into<String>, default_value: Option<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            default_value,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Describes an installer: its name, how it materializes resources, and the
/// parameters targets may set for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallerDescriptor {
    pub name: String,
    pub strategy: LinkMode,
    pub description: Option<String>,
    pub parameters: BTreeMap<String, InstallerParameter>,
}

impl InstallerDescriptor {
    pub const NAME: &'static str = "name";
    pub const STRATEGY: &'static str = "strategy";
    pub const DESCRIPTION: &'static str = "description";

    pub fn new(name: impl Into<String>, strategy: LinkMode) -> Result<Self, AssetError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(AssetError::InvalidInstaller(format!(
                "invalid installer name '{}'",
                name
            )));
        }
        Ok(Self {
            name,
            strategy,
            description: None,
            parameters: BTreeMap::new(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parameter(mut self, parameter: InstallerParameter) -> Self {
        self.parameters.insert(parameter.name.clone(), parameter);
        self
    }

    /// Check target parameter values against the declared parameters.
    ///
    /// Every value must name a declared parameter and every required
    /// parameter must have a value.
    pub fn validate_parameter_values(
        &self,
        values: &BTreeMap<String, String>,
    ) -> Result<(), AssetError> {
        if let Some(unknown) = values.keys().find(|k| !self.parameters.contains_key(*k)) {
            return Err(AssetError::NoSuchParameter {
                installer: self.name.clone(),
                parameter: unknown.clone(),
            });
        }
        if let Some(missing) = self
            .parameters
            .values()
            .find(|p| p.required && !values.contains_key(&p.name))
        {
            return Err(AssetError::MissingParameter {
                installer: self.name.clone(),
                parameter: missing.name.clone(),
            });
        }
        Ok(())
    }
}

impl Record for InstallerDescriptor {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            Self::NAME => Some(Value::String(self.name.clone())),
            Self::STRATEGY => Some(Value::String(self.strategy.as_str().to_string())),
            Self::DESCRIPTION => self.description.clone().map(Value::String),
            _ => None,
        }
    }
}

/// Names of installers and targets: ASCII alphanumerics, `-`, `_` and `.`.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rsync() -> InstallerDescriptor {
        InstallerDescriptor::new("rsync", LinkMode::Copy)
            .unwrap()
            .with_parameter(InstallerParameter::required("host"))
            .with_parameter(InstallerParameter::optional("user", Some("www".into())))
    }

    #[test]
    fn accepts_complete_parameter_values() {
        let mut values = BTreeMap::new();
        values.insert("host".to_string(), "example.com".to_string());
        assert!(rsync().validate_parameter_values(&values).is_ok());
    }

    #[test]
    fn rejects_unknown_parameter() {
        let mut values = BTreeMap::new();
        values.insert("host".to_string(), "example.com".to_string());
        values.insert("port".to_string(), "22".to_string());
        let err = rsync().validate_parameter_values(&values).unwrap_err();
        assert!(matches!(err, AssetError::NoSuchParameter { ref parameter, .. } if parameter == "port"));
    }

    #[test]
    fn rejects_missing_required_parameter() {
        let err = rsync()
            .validate_parameter_values(&BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, AssetError::MissingParameter { ref parameter, .. } if parameter == "host"));
    }

    #[test]
    fn names_are_restricted() {
        assert!(is_valid_name("local-web_1.0"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("with space"));
        assert!(!is_valid_name("a/b"));
    }
}
