//! Install targets: named destinations where assets are published.

pub mod manager;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::AssetError;
use crate::expr::Record;
use crate::installer::descriptor::is_valid_name;

pub use manager::{ConfigTargetManager, InstallTargetManager};

/// Reserved target name that resolves to the configured default target.
pub const DEFAULT_TARGET: &str = "default";

/// URL format used when a target does not declare one. `%s` is replaced by
/// the web path of the asset.
pub const DEFAULT_URL_FORMAT: &str = "/%s";

/// A named destination for installed assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallTarget {
    pub name: String,
    pub installer_name: String,
    /// Directory assets are installed into; relative paths resolve against
    /// the project root
    pub location: String,
    pub url_format: String,
    pub parameter_values: BTreeMap<String, String>,
}

impl InstallTarget {
    pub const NAME: &'static str = "name";
    pub const INSTALLER_NAME: &'static str = "installerName";
    pub const LOCATION: &'static str = "location";
    pub const URL_FORMAT: &'static str = "urlFormat";
    pub const PARAMETER_VALUES: &'static str = "parameterValues";

    pub fn new(
        name: impl Into<String>,
        installer_name: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Self, AssetError> {
        let target = Self {
            name: name.into(),
            installer_name: installer_name.into(),
            location: location.into(),
            url_format: DEFAULT_URL_FORMAT.to_string(),
            parameter_values: BTreeMap::new(),
        };
        target.validate()?;
        Ok(target)
    }

    pub fn with_url_format(mut self, url_format: impl Into<String>) -> Self {
        self.url_format = url_format.into();
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameter_values.insert(name.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), AssetError> {
        if self.name == DEFAULT_TARGET {
            return Err(AssetError::InvalidTarget(format!(
                "'{}' is reserved for the default target",
                DEFAULT_TARGET
            )));
        }
        if !is_valid_name(&self.name) {
            return Err(AssetError::InvalidTarget(format!(
                "invalid target name '{}'",
                self.name
            )));
        }
        if self.installer_name.is_empty() {
            return Err(AssetError::InvalidTarget(format!(
                "target '{}' has no installer",
                self.name
            )));
        }
        if self.location.is_empty() {
            return Err(AssetError::InvalidTarget(format!(
                "target '{}' has no location",
                self.name
            )));
        }
        Ok(())
    }

    /// Format the public URL of an asset installed at `web_path`.
    pub fn url_for(&self, web_path: &str) -> String {
        self.url_format
            .replace("%s", web_path.trim_start_matches('/'))
    }
}

impl Record for InstallTarget {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            Self::NAME => Some(Value::String(self.name.clone())),
            Self::INSTALLER_NAME => Some(Value::String(self.installer_name.clone())),
            Self::LOCATION => Some(Value::String(self.location.clone())),
            Self::URL_FORMAT => Some(Value::String(self.url_format.clone())),
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

    #[test]
    fn reserved_default_name_is_rejected() {
        let err = InstallTarget::new(DEFAULT_TARGET, "copy", "public").unwrap_err();
        assert!(matches!(err, AssetError::InvalidTarget(_)));
    }

    #[test]
    fn empty_location_is_rejected() {
        assert!(InstallTarget::new("local", "copy", "").is_err());
    }

    #[test]
    fn url_for_strips_leading_slash() {
        let target = InstallTarget::new("cdn", "copy", "dist")
            .unwrap()
            .with_url_format("https://cdn.example.com/%s");
        assert_eq!(
            target.url_for("/css/style.css"),
            "https://cdn.example.com/css/style.css"
        );

        let local = InstallTarget::new("local", "symlink", "public").unwrap();
        assert_eq!(local.url_for("/css/style.css"), "/css/style.css");
    }
}
