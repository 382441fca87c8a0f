//! Installer registry.

use tracing::debug;

use crate::config::{ConfigStore, InstallerEntry};
use crate::error::AssetError;
use crate::expr::Expr;
use crate::fs::LinkMode;

use super::descriptor::InstallerDescriptor;

pub const COPY_INSTALLER: &str = "copy";
pub const SYMLINK_INSTALLER: &str = "symlink";

/// Manages the installers used to install resources on install targets.
pub trait InstallerManager {
    /// Add an installer descriptor, replacing a user-defined installer of the
    /// same name. Built-in installers cannot be replaced.
    fn add_installer_descriptor(&self, descriptor: InstallerDescriptor) -> anyhow::Result<()>;

    /// Remove the installer with the given name. Does nothing if it does not exist.
    fn remove_installer_descriptor(&self, name: &str) -> anyhow::Result<()>;

    /// Remove all user-defined installers matching `expr`.
    fn remove_installer_descriptors(&self, expr: &Expr) -> anyhow::Result<usize>;

    /// Remove all user-defined installers.
    fn clear_installer_descriptors(&self) -> anyhow::Result<()>;

    fn get_installer_descriptor(&self, name: &str) -> anyhow::Result<InstallerDescriptor>;

    /// All installers, built-in ones first.
    fn get_installer_descriptors(&self) -> anyhow::Result<Vec<InstallerDescriptor>>;

    fn find_installer_descriptors(&self, expr: &Expr) -> anyhow::Result<Vec<InstallerDescriptor>>;

    fn has_installer_descriptor(&self, name: &str) -> anyhow::Result<bool>;

    /// Whether any installer matches `expr` (or any installer exists at all).
    fn has_installer_descriptors(&self, expr: Option<&Expr>) -> anyhow::Result<bool>;
}

pub fn is_builtin_installer(name: &str) -> bool {
    name == COPY_INSTALLER || name == SYMLINK_INSTALLER
}

/// The installers that are always available.
pub fn builtin_installers() -> Vec<InstallerDescriptor> {
    vec![
        InstallerDescriptor {
            name: COPY_INSTALLER.to_string(),
            strategy: LinkMode::Copy,
            description: Some("Copies assets to the target directory".to_string()),
            parameters: Default::default(),
        },
        InstallerDescriptor {
            name: SYMLINK_INSTALLER.to_string(),
            strategy: LinkMode::Symlink,
            description: Some("Creates asset symlinks in the target directory".to_string()),
            parameters: Default::default(),
        },
    ]
}

/// Installer manager backed by the `[installers]` table of the project config.
#[derive(Debug, Clone)]
pub struct ConfigInstallerManager {
    store: ConfigStore,
}

impl ConfigInstallerManager {
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }

    fn user_installers(&self) -> anyhow::Result<Vec<InstallerDescriptor>> {
        let config = self.store.load()?;
        Ok(config
            .installers
            .into_iter()
            .map(|(name, entry)| entry.into_descriptor(&name))
            .collect())
    }
}

impl InstallerManager for ConfigInstallerManager {
    fn add_installer_descriptor(&self, descriptor: InstallerDescriptor) -> anyhow::Result<()> {
        if is_builtin_installer(&descriptor.name) {
            return Err(AssetError::BuiltinInstaller(descriptor.name).into());
        }
        debug!(installer = %descriptor.name, strategy = %descriptor.strategy, "adding installer");
        self.store.update(|config| {
            config
                .installers
                .insert(descriptor.name.clone(), InstallerEntry::from(&descriptor));
            Ok(())
        })
    }

    fn remove_installer_descriptor(&self, name: &str) -> anyhow::Result<()> {
        if is_builtin_installer(name) {
            return Err(AssetError::BuiltinInstaller(name.to_string()).into());
        }
        let mut config = self.store.load()?;
        if config.installers.remove(name).is_some() {
            ensure_unused(&config, name)?;
            debug!(installer = name, "removing installer");
            self.store.save(&config)?;
        }
        Ok(())
    }

    fn remove_installer_descriptors(&self, expr: &Expr) -> anyhow::Result<usize> {
        let matching: Vec<String> = self
            .user_installers()?
            .into_iter()
            .filter(|descriptor| expr.evaluate(descriptor))
            .map(|descriptor| descriptor.name)
            .collect();
        if matching.is_empty() {
            return Ok(0);
        }
        self.store.update(|config| {
            for name in &matching {
                config.installers.remove(name);
                ensure_unused(config, name)?;
            }
            Ok(matching.len())
        })
    }

    fn clear_installer_descriptors(&self) -> anyhow::Result<()> {
        self.store.update(|config| {
            let names: Vec<String> = config.installers.keys().cloned().collect();
            config.installers.clear();
            for name in &names {
                ensure_unused(config, name)?;
            }
            Ok(())
        })
    }

    fn get_installer_descriptor(&self, name: &str) -> anyhow::Result<InstallerDescriptor> {
        if let Some(builtin) = builtin_installers().into_iter().find(|d| d.name == name) {
            return Ok(builtin);
        }
        let config = self.store.load()?;
        config
            .installers
            .get(name)
            .cloned()
            .map(|entry| entry.into_descriptor(name))
            .ok_or_else(|| AssetError::NoSuchInstaller(name.to_string()).into())
    }

    fn get_installer_descriptors(&self) -> anyhow::Result<Vec<InstallerDescriptor>> {
        let mut all = builtin_installers();
        all.extend(self.user_installers()?);
        Ok(all)
    }

    fn find_installer_descriptors(&self, expr: &Expr) -> anyhow::Result<Vec<InstallerDescriptor>> {
        Ok(self
            .get_installer_descriptors()?
            .into_iter()
            .filter(|descriptor| expr.evaluate(descriptor))
            .collect())
    }

    fn has_installer_descriptor(&self, name: &str) -> anyhow::Result<bool> {
        if is_builtin_installer(name) {
            return Ok(true);
        }
        Ok(self.store.load()?.installers.contains_key(name))
    }

    fn has_installer_descriptors(&self, expr: Option<&Expr>) -> anyhow::Result<bool> {
        match expr {
            Some(expr) => Ok(!self.find_installer_descriptors(expr)?.is_empty()),
            // Built-in installers always exist
            None => Ok(true),
        }
    }
}

fn ensure_unused(config: &crate::config::AssetConfig, installer: &str) -> anyhow::Result<()> {
    if let Some((target, _)) = config
        .targets
        .iter()
        .find(|(_, entry)| entry.installer == installer)
    {
        anyhow::bail!(
            "Installer '{}' is still used by target '{}'",
            installer,
            target
        );
    }
    Ok(())
}
