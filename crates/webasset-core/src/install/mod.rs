//! Installing asset mappings onto their install targets.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::asset::{AssetManager, AssetMapping, target_filter};
use crate::error::AssetError;
use crate::fs::LinkMode;
use crate::installer::{InstallerDescriptor, InstallerManager, installer_for};
use crate::target::{InstallTarget, InstallTargetManager};

/// Everything needed to install one asset mapping.
#[derive(Debug, Clone)]
pub struct AssetInstallation {
    pub mapping: AssetMapping,
    pub target: InstallTarget,
    pub installer: InstallerDescriptor,
    /// Repository resources matched by the mapping's glob, sorted
    pub resources: Vec<PathBuf>,
    pub project_root: PathBuf,
}

impl AssetInstallation {
    /// Directory the target installs into.
    pub fn target_root(&self) -> PathBuf {
        let location = Path::new(&self.target.location);
        if location.is_absolute() {
            location.to_path_buf()
        } else {
            self.project_root.join(location)
        }
    }

    /// Where `resource` lands inside the target.
    ///
    /// A plain glob maps its resource onto the web path itself; a pattern
    /// places every match under the web path by its file name. Resources
    /// mapped onto the root web path also keep their file name.
    pub fn destination_for(&self, resource: &Path) -> PathBuf {
        let mut destination = self.target_root();
        let web_path = self.mapping.web_path.trim_start_matches('/');
        if !web_path.is_empty() {
            destination.push(web_path);
        }
        if self.mapping.is_pattern() || web_path.is_empty() {
            if let Some(name) = resource.file_name() {
                destination.push(name);
            }
        }
        destination
    }
}

/// Result of installing a single resource.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInstallOutcome {
    pub uuid: Uuid,
    pub resource: PathBuf,
    pub destination: PathBuf,
    pub target: String,
    pub mode: LinkMode,
    pub changed: bool,
}

/// Installs asset mappings using the registered targets and installers.
pub struct AssetInstallationManager<'a> {
    project_root: PathBuf,
    targets: &'a dyn InstallTargetManager,
    installers: &'a dyn InstallerManager,
}

impl<'a> AssetInstallationManager<'a> {
    pub fn new(
        project_root: impl Into<PathBuf>,
        targets: &'a dyn InstallTargetManager,
        installers: &'a dyn InstallerManager,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            targets,
            installers,
        }
    }

    /// Resolve the target, installer and resources of `mapping`.
    ///
    /// Any failure is reported as [`AssetError::NotInstallable`].
    pub fn prepare_installation(&self, mapping: &AssetMapping) -> anyhow::Result<AssetInstallation> {
        let not_installable = |reason: String| AssetError::NotInstallable {
            uuid: mapping.uuid,
            reason,
        };

        let target = self
            .targets
            .get_target(&mapping.target_name)
            .map_err(|err| not_installable(err.to_string()))?;
        let installer = self
            .installers
            .get_installer_descriptor(&target.installer_name)
            .map_err(|err| not_installable(err.to_string()))?;
        installer
            .validate_parameter_values(&target.parameter_values)
            .map_err(|err| not_installable(err.to_string()))?;

        let resources = self
            .resolve_resources(mapping)
            .map_err(|err| not_installable(err.to_string()))?;
        if resources.is_empty() {
            return Err(not_installable(format!("no resources match '{}'", mapping.glob)).into());
        }

        Ok(AssetInstallation {
            mapping: mapping.clone(),
            target,
            installer,
            resources,
            project_root: self.project_root.clone(),
        })
    }

    /// Install one resource of a prepared installation.
    pub fn install_resource(
        &self,
        installation: &AssetInstallation,
        resource: &Path,
    ) -> anyhow::Result<ResourceInstallOutcome> {
        let destination = installation.destination_for(resource);
        let installer = installer_for(installation.installer.strategy);
        let report = installer.install_resource(resource, &destination)?;

        debug!(
            resource = %resource.display(),
            destination = %destination.display(),
            mode = %report.mode,
            changed = report.changed,
            "installed resource"
        );

        Ok(ResourceInstallOutcome {
            uuid: installation.mapping.uuid,
            resource: resource.to_path_buf(),
            destination,
            target: installation.target.name.clone(),
            mode: report.mode,
            changed: report.changed,
        })
    }

    /// Prepare and install every given mapping, stopping at the first failure.
    pub fn install_mappings(
        &self,
        mappings: &[AssetMapping],
    ) -> anyhow::Result<Vec<ResourceInstallOutcome>> {
        let mut outcomes = Vec::new();
        for mapping in mappings {
            let installation = self.prepare_installation(mapping)?;
            info!(
                uuid = %mapping.uuid,
                target = %installation.target.name,
                resources = installation.resources.len(),
                "installing asset mapping"
            );
            for resource in &installation.resources {
                outcomes.push(self.install_resource(&installation, resource)?);
            }
        }
        Ok(outcomes)
    }

    /// Install all mappings of `assets`, optionally only those for one target.
    pub fn install_all(
        &self,
        assets: &dyn AssetManager,
        target: Option<&str>,
    ) -> anyhow::Result<Vec<ResourceInstallOutcome>> {
        let mappings = match target {
            Some(name) => assets.find_asset_mappings(&target_filter(self.targets, name)?)?,
            None => assets.get_asset_mappings()?,
        };
        self.install_mappings(&mappings)
    }

    fn resolve_resources(&self, mapping: &AssetMapping) -> anyhow::Result<Vec<PathBuf>> {
        let relative = mapping.glob.trim_start_matches('/');

        if !mapping.is_pattern() {
            let path = self.project_root.join(relative);
            if !path.exists() {
                anyhow::bail!("resource '{}' does not exist", mapping.glob);
            }
            return Ok(vec![path]);
        }

        let root = self.project_root.to_string_lossy();
        let pattern = format!(
            "{}/{}",
            glob::Pattern::escape(root.trim_end_matches('/')),
            relative
        );
        let mut resources = Vec::new();
        for entry in glob::glob(&pattern)? {
            resources.push(entry?);
        }
        resources.sort();
        Ok(resources)
    }
}
