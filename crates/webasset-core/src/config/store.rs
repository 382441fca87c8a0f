//! Config store for loading and saving webasset.toml.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{AssetConfig, parser, paths::config_path_for_root};

/// Reads and writes the project config file.
///
/// Missing files load as an empty config.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
    project_root: PathBuf,
}

impl ConfigStore {
    pub fn from_project_root(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let config_path = config_path_for_root(&project_root);
        Self {
            config_path,
            project_root,
        }
    }

    pub fn from_paths(config_path: PathBuf, project_root: PathBuf) -> Self {
        Self {
            config_path,
            project_root,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn load(&self) -> anyhow::Result<AssetConfig> {
        match self.config_path.try_exists() {
            Ok(true) => parser::parse_config(&self.config_path),
            Ok(false) => Ok(AssetConfig::new()),
            Err(err) => Err(anyhow::Error::new(err).context(format!(
                "Failed to access config file: {}",
                self.config_path.display()
            ))),
        }
    }

    /// Validate and write `config`.
    ///
    /// The file is written to a sibling temp file first and renamed into
    /// place, so readers never observe a partially written config.
    pub fn save(&self, config: &AssetConfig) -> anyhow::Result<()> {
        config
            .validate()
            .context("Refusing to save invalid configuration")?;
        let content = parser::to_toml(config).context("Failed to serialize config to TOML")?;

        let dir = self.config_path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let tmp = self.config_path.with_extension("toml.tmp");
        fs::write(&tmp, content)
            .with_context(|| format!("Failed to write config file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.config_path).with_context(|| {
            format!(
                "Failed to move config into place: {}",
                self.config_path.display()
            )
        })
    }

    /// Load the config, apply `f`, and save the result if `f` succeeds.
    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut AssetConfig) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let mut config = self.load()?;
        let result = f(&mut config)?;
        self.save(&config)?;
        Ok(result)
    }
}
