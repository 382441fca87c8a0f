//! Project context for wiring up the managers.

use std::path::{Path, PathBuf};

use crate::asset::DiscoveryAssetManager;
use crate::binding::ConfigDiscovery;
use crate::config::{ConfigStore, find_project_root};
use crate::installer::ConfigInstallerManager;
use crate::target::ConfigTargetManager;

/// Asset manager used by frontends.
pub type ProjectAssetManager = DiscoveryAssetManager<ConfigDiscovery, ConfigTargetManager>;

/// Shared state of one project.
///
/// Frontends create this once and ask it for the managers they need. All
/// managers read and write the same project config file.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    project_root: PathBuf,
}

impl ProjectContext {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    /// Create a context for the project containing the current directory.
    ///
    /// Falls back to the current directory when no config file is found in
    /// any ancestor.
    pub fn with_defaults() -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()?;
        let project_root = find_project_root(&cwd).unwrap_or(cwd);
        Ok(Self::new(project_root))
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::from_project_root(self.project_root.clone())
    }

    pub fn installer_manager(&self) -> ConfigInstallerManager {
        ConfigInstallerManager::new(self.config_store())
    }

    pub fn target_manager(&self) -> ConfigTargetManager {
        ConfigTargetManager::new(self.config_store(), self.installer_manager())
    }

    pub fn discovery(&self) -> ConfigDiscovery {
        ConfigDiscovery::new(self.config_store())
    }

    pub fn asset_manager(&self) -> ProjectAssetManager {
        DiscoveryAssetManager::new(self.discovery(), self.target_manager())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE_NAME;

    #[test]
    fn managers_share_the_project_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let context = ProjectContext::new(temp.path());

        assert_eq!(context.project_root(), temp.path());
        assert_eq!(
            context.config_store().config_path(),
            temp.path().join(CONFIG_FILE_NAME)
        );
    }
}
