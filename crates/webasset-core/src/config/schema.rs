//! Configuration schema for webasset.toml
//!
//! ```toml
//! default_target = "local"
//!
//! [installers.rsync]
//! strategy = "copy"
//! description = "Copies assets onto a mounted remote share"
//!
//! [installers.rsync.parameters.host]
//! required = true
//!
//! [targets.local]
//! installer = "symlink"
//! location = "public"
//! url_format = "/%s"
//!
//! [[bindings]]
//! uuid = "2b4d6a4c-62d4-4f3e-9d9c-0a5c1f3c8b1e"
//! query = "/app/public{,/**}"
//! type = "webasset/asset-mapping"
//!
//! [bindings.parameters]
//! target = "local"
//! path = "/"
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::binding::BindingDescriptor;
use crate::fs::LinkMode;
use crate::installer::descriptor::{InstallerDescriptor, InstallerParameter};
use crate::installer::manager::is_builtin_installer;
use crate::target::{DEFAULT_URL_FORMAT, InstallTarget};

/// Root configuration structure for webasset.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AssetConfig {
    /// Target used by mappings that refer to the `default` target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_target: Option<String>,

    /// User-defined installers (the built-in `copy` and `symlink` are implicit)
    #[serde(default)]
    pub installers: BTreeMap<String, InstallerEntry>,

    /// Install targets
    #[serde(default)]
    pub targets: BTreeMap<String, TargetEntry>,

    /// Discovery bindings, including asset mappings
    #[serde(default)]
    pub bindings: Vec<BindingDescriptor>,
}

/// Install target entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEntry {
    /// Name of the installer used for this target
    pub installer: String,

    /// Install directory, relative to the project root unless absolute
    pub location: String,

    /// Public URL format; `%s` is replaced by the asset's web path
    #[serde(default = "default_url_format")]
    pub url_format: String,

    /// Values for the installer's parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

fn default_url_format() -> String {
    DEFAULT_URL_FORMAT.to_string()
}

impl TargetEntry {
    pub fn into_target(self, name: &str) -> InstallTarget {
        InstallTarget {
            name: name.to_string(),
            installer_name: self.installer,
            location: self.location,
            url_format: self.url_format,
            parameter_values: self.parameters,
        }
    }
}

impl From<&InstallTarget> for TargetEntry {
    fn from(target: &InstallTarget) -> Self {
        Self {
            installer: target.installer_name.clone(),
            location: target.location.clone(),
            url_format: target.url_format.clone(),
            parameters: target.parameter_values.clone(),
        }
    }
}

/// Installer entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerEntry {
    /// How resources are materialized: copy or symlink
    pub strategy: LinkMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParameterEntry>,
}

/// Installer parameter entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ParameterEntry {
    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl InstallerEntry {
    pub fn into_descriptor(self, name: &str) -> InstallerDescriptor {
        InstallerDescriptor {
            name: name.to_string(),
            strategy: self.strategy,
            description: self.description,
            parameters: self
                .parameters
                .into_iter()
                .map(|(param_name, entry)| {
                    let parameter = InstallerParameter {
                        name: param_name.clone(),
                        required: entry.required,
                        default_value: entry.default,
                        description: entry.description,
                    };
                    (param_name, parameter)
                })
                .collect(),
        }
    }
}

impl From<&InstallerDescriptor> for InstallerEntry {
    fn from(descriptor: &InstallerDescriptor) -> Self {
        Self {
            strategy: descriptor.strategy,
            description: descriptor.description.clone(),
            parameters: descriptor
                .parameters
                .iter()
                .map(|(name, parameter)| {
                    let entry = ParameterEntry {
                        required: parameter.required,
                        default: parameter.default_value.clone(),
                        description: parameter.description.clone(),
                    };
                    (name.clone(), entry)
                })
                .collect(),
        }
    }
}

impl AssetConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate cross references between installers, targets and bindings
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, entry) in &self.installers {
            if is_builtin_installer(name) {
                anyhow::bail!("Installer '{}' is built in and cannot be redefined", name);
            }
            InstallerDescriptor::new(name.as_str(), entry.strategy)
                .with_context(|| format!("Invalid installer configuration: '{}'", name))?;
        }

        for (name, entry) in &self.targets {
            let target = entry.clone().into_target(name);
            target
                .validate()
                .with_context(|| format!("Invalid target configuration: '{}'", name))?;
            if !is_builtin_installer(&entry.installer)
                && !self.installers.contains_key(&entry.installer)
            {
                anyhow::bail!(
                    "Target '{}' refers to unknown installer '{}'",
                    name,
                    entry.installer
                );
            }
        }

        if let Some(default) = &self.default_target
            && !self.targets.contains_key(default)
        {
            anyhow::bail!("Default target '{}' is not a configured target", default);
        }

        let mut seen = HashSet::new();
        for binding in &self.bindings {
            if !seen.insert(binding.uuid) {
                anyhow::bail!("Duplicate binding UUID: {}", binding.uuid);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_entry_roundtrips_through_install_target() {
        let entry = TargetEntry {
            installer: "symlink".to_string(),
            location: "public".to_string(),
            url_format: "/static/%s".to_string(),
            parameters: BTreeMap::new(),
        };
        let target = entry.clone().into_target("local");
        assert_eq!(target.name, "local");
        assert_eq!(TargetEntry::from(&target), entry);
    }

    #[test]
    fn installer_entry_roundtrips_through_descriptor() {
        let mut parameters = BTreeMap::new();
        parameters.insert(
            "host".to_string(),
            ParameterEntry {
                required: true,
                ..Default::default()
            },
        );
        let entry = InstallerEntry {
            strategy: LinkMode::Copy,
            description: Some("Remote copy".to_string()),
            parameters,
        };
        let descriptor = entry.clone().into_descriptor("rsync");
        assert!(descriptor.parameters["host"].required);
        assert_eq!(InstallerEntry::from(&descriptor), entry);
    }

    #[test]
    fn validate_rejects_redefined_builtin() {
        let mut config = AssetConfig::new();
        config.installers.insert(
            "copy".to_string(),
            InstallerEntry {
                strategy: LinkMode::Copy,
                description: None,
                parameters: BTreeMap::new(),
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_default_target() {
        let config = AssetConfig {
            default_target: Some("missing".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
