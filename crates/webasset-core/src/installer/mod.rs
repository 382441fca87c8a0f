//! Installers: strategies that materialize repository resources inside an
//! install target, and the registry of installer descriptors.

pub mod copy;
pub mod descriptor;
pub mod manager;

use std::path::Path;

use serde::Serialize;

use crate::fs::LinkMode;

pub use copy::{CopyInstaller, SymlinkInstaller};
pub use descriptor::{InstallerDescriptor, InstallerParameter};
pub use manager::{
    COPY_INSTALLER, ConfigInstallerManager, InstallerManager, SYMLINK_INSTALLER,
    builtin_installers, is_builtin_installer,
};

/// Outcome of installing a single resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// How the resource ended up materialized
    pub mode: LinkMode,
    /// Whether the destination was modified
    pub changed: bool,
}

/// Materializes one repository file or directory at a destination path.
pub trait ResourceInstaller: std::fmt::Debug {
    fn install_resource(&self, resource: &Path, destination: &Path)
    -> anyhow::Result<InstallReport>;
}

/// Create the installer implementing `strategy`.
pub fn installer_for(strategy: LinkMode) -> Box<dyn ResourceInstaller> {
    match strategy {
        LinkMode::Copy => Box::new(CopyInstaller::new(false)),
        LinkMode::Symlink => Box::new(SymlinkInstaller::new()),
    }
}
