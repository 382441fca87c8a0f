//! Install target registry.

use tracing::debug;

use crate::config::{AssetConfig, ConfigStore, TargetEntry};
use crate::error::AssetError;
use crate::expr::Expr;
use crate::installer::{ConfigInstallerManager, InstallerManager};

use super::{DEFAULT_TARGET, InstallTarget};

/// Manages install targets.
pub trait InstallTargetManager {
    /// Add a target, replacing an existing target of the same name.
    ///
    /// The target's installer must exist and its parameter values must match
    /// the installer's parameters. The first target becomes the default.
    fn add_target(&self, target: InstallTarget) -> anyhow::Result<()>;

    /// Remove the target with the given name. Does nothing if it does not exist.
    fn remove_target(&self, name: &str) -> anyhow::Result<()>;

    fn remove_targets(&self, expr: &Expr) -> anyhow::Result<usize>;

    fn clear_targets(&self) -> anyhow::Result<()>;

    /// Return the named target; `default` resolves to the default target.
    fn get_target(&self, name: &str) -> anyhow::Result<InstallTarget>;

    fn get_targets(&self) -> anyhow::Result<Vec<InstallTarget>>;

    fn find_targets(&self, expr: &Expr) -> anyhow::Result<Vec<InstallTarget>>;

    /// Whether the named target exists; `default` exists iff a default is set.
    fn has_target(&self, name: &str) -> anyhow::Result<bool>;

    fn has_targets(&self, expr: Option<&Expr>) -> anyhow::Result<bool>;

    fn set_default_target(&self, name: &str) -> anyhow::Result<()>;

    fn get_default_target(&self) -> anyhow::Result<InstallTarget>;
}

/// Target manager backed by the `[targets]` table of the project config.
#[derive(Debug, Clone)]
pub struct ConfigTargetManager<I = ConfigInstallerManager> {
    store: ConfigStore,
    installers: I,
}

impl<I: InstallerManager> ConfigTargetManager<I> {
    pub fn new(store: ConfigStore, installers: I) -> Self {
        Self { store, installers }
    }

    fn targets_of(config: AssetConfig) -> Vec<InstallTarget> {
        config
            .targets
            .into_iter()
            .map(|(name, entry)| entry.into_target(&name))
            .collect()
    }
}

/// Keep `default_target` pointing at an existing target after removals.
fn repair_default(config: &mut AssetConfig) {
    let dangling = config
        .default_target
        .as_ref()
        .is_some_and(|name| !config.targets.contains_key(name));
    if dangling || config.default_target.is_none() {
        config.default_target = config.targets.keys().next().cloned();
    }
}

impl<I: InstallerManager> InstallTargetManager for ConfigTargetManager<I> {
    fn add_target(&self, target: InstallTarget) -> anyhow::Result<()> {
        target.validate()?;
        let installer = self
            .installers
            .get_installer_descriptor(&target.installer_name)?;
        installer.validate_parameter_values(&target.parameter_values)?;

        debug!(target = %target.name, installer = %target.installer_name, "adding install target");
        self.store.update(|config| {
            config
                .targets
                .insert(target.name.clone(), TargetEntry::from(&target));
            if config.default_target.is_none() {
                config.default_target = Some(target.name.clone());
            }
            Ok(())
        })
    }

    fn remove_target(&self, name: &str) -> anyhow::Result<()> {
        let mut config = self.store.load()?;
        if config.targets.remove(name).is_some() {
            repair_default(&mut config);
            debug!(target = name, "removing install target");
            self.store.save(&config)?;
        }
        Ok(())
    }

    fn remove_targets(&self, expr: &Expr) -> anyhow::Result<usize> {
        let mut config = self.store.load()?;
        let matching: Vec<String> = Self::targets_of(config.clone())
            .into_iter()
            .filter(|target| expr.evaluate(target))
            .map(|target| target.name)
            .collect();
        if matching.is_empty() {
            return Ok(0);
        }
        for name in &matching {
            config.targets.remove(name);
        }
        repair_default(&mut config);
        self.store.save(&config)?;
        Ok(matching.len())
    }

    fn clear_targets(&self) -> anyhow::Result<()> {
        self.store.update(|config| {
            config.targets.clear();
            config.default_target = None;
            Ok(())
        })
    }

    fn get_target(&self, name: &str) -> anyhow::Result<InstallTarget> {
        if name == DEFAULT_TARGET {
            return self.get_default_target();
        }
        let config = self.store.load()?;
        config
            .targets
            .get(name)
            .cloned()
            .map(|entry| entry.into_target(name))
            .ok_or_else(|| AssetError::NoSuchTarget(name.to_string()).into())
    }

    fn get_targets(&self) -> anyhow::Result<Vec<InstallTarget>> {
        Ok(Self::targets_of(self.store.load()?))
    }

    fn find_targets(&self, expr: &Expr) -> anyhow::Result<Vec<InstallTarget>> {
        Ok(self
            .get_targets()?
            .into_iter()
            .filter(|target| expr.evaluate(target))
            .collect())
    }

    fn has_target(&self, name: &str) -> anyhow::Result<bool> {
        let config = self.store.load()?;
        if name == DEFAULT_TARGET {
            return Ok(config.default_target.is_some());
        }
        Ok(config.targets.contains_key(name))
    }

    fn has_targets(&self, expr: Option<&Expr>) -> anyhow::Result<bool> {
        match expr {
            Some(expr) => Ok(!self.find_targets(expr)?.is_empty()),
            None => Ok(!self.store.load()?.targets.is_empty()),
        }
    }

    fn set_default_target(&self, name: &str) -> anyhow::Result<()> {
        self.store.update(|config| {
            if !config.targets.contains_key(name) {
                return Err(AssetError::NoSuchTarget(name.to_string()).into());
            }
            config.default_target = Some(name.to_string());
            Ok(())
        })
    }

    fn get_default_target(&self) -> anyhow::Result<InstallTarget> {
        let config = self.store.load()?;
        let name = config
            .default_target
            .clone()
            .ok_or(AssetError::NoDefaultTarget)?;
        config
            .targets
            .get(&name)
            .cloned()
            .map(|entry| entry.into_target(&name))
            .ok_or_else(|| AssetError::NoSuchTarget(name).into())
    }
}
