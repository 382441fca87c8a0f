//! Copy and symlink installers.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::fs::{LinkMode, hash_path};

use super::{InstallReport, ResourceInstaller};

/// Installs resources by copying them, or by symlinking them when
/// `symlinks` is set.
///
/// Symlink installs fall back to copying on platforms without symlink
/// support. Existing destinations are replaced through a temp path and a
/// rename, so a failed install leaves the previous destination in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyInstaller {
    symlinks: bool,
}

impl CopyInstaller {
    pub fn new(symlinks: bool) -> Self {
        Self { symlinks }
    }

    pub fn uses_symlinks(&self) -> bool {
        self.symlinks
    }
}

impl ResourceInstaller for CopyInstaller {
    fn install_resource(
        &self,
        resource: &Path,
        destination: &Path,
    ) -> anyhow::Result<InstallReport> {
        ensure_resource(resource)?;
        ensure_parent_dir(destination)?;

        if !self.symlinks {
            return deliver_copy(resource, destination);
        }

        match deliver_symlink(resource, destination) {
            Ok(report) => Ok(report),
            Err(err) if is_unsupported_error(&err) => {
                warn!(
                    resource = %resource.display(),
                    "symlinks are not supported here, copying instead"
                );
                deliver_copy(resource, destination)
            }
            Err(err) => Err(err),
        }
    }
}

/// A [`CopyInstaller`] that always symlinks.
#[derive(Debug, Clone, Copy)]
pub struct SymlinkInstaller(CopyInstaller);

impl SymlinkInstaller {
    pub fn new() -> Self {
        Self(CopyInstaller::new(true))
    }
}

impl Default for SymlinkInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceInstaller for SymlinkInstaller {
    fn install_resource(
        &self,
        resource: &Path,
        destination: &Path,
    ) -> anyhow::Result<InstallReport> {
        self.0.install_resource(resource, destination)
    }
}

fn ensure_resource(resource: &Path) -> anyhow::Result<()> {
    let meta = fs::metadata(resource)
        .with_context(|| format!("Failed to stat resource: {}", resource.display()))?;
    if !meta.is_dir() && !meta.is_file() {
        anyhow::bail!(
            "Resource is neither a file nor a directory: {}",
            resource.display()
        );
    }
    Ok(())
}

fn ensure_parent_dir(destination: &Path) -> anyhow::Result<()> {
    let parent = destination.parent().ok_or_else(|| {
        anyhow::anyhow!("Destination path has no parent: {}", destination.display())
    })?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create destination parent: {}", parent.display()))?;
    Ok(())
}

fn deliver_copy(resource: &Path, destination: &Path) -> anyhow::Result<InstallReport> {
    if is_identical_copy(resource, destination) {
        debug!(destination = %destination.display(), "copy is up to date");
        return Ok(InstallReport {
            mode: LinkMode::Copy,
            changed: false,
        });
    }

    let tmp = unique_temp_path(destination)?;
    let result = if resource.is_dir() {
        fs::create_dir_all(&tmp)
            .with_context(|| format!("Failed to create temp directory: {}", tmp.display()))
            .and_then(|()| copy_tree(resource, &tmp))
    } else {
        fs::copy(resource, &tmp)
            .map(|_| ())
            .with_context(|| {
                format!(
                    "Failed to copy file from {} to {}",
                    resource.display(),
                    tmp.display()
                )
            })
    };

    if let Err(err) = result {
        let _ = remove_path(&tmp);
        return Err(err);
    }

    replace_with_tmp(destination, &tmp)?;
    debug!(resource = %resource.display(), destination = %destination.display(), "copied");
    Ok(InstallReport {
        mode: LinkMode::Copy,
        changed: true,
    })
}

fn deliver_symlink(resource: &Path, destination: &Path) -> anyhow::Result<InstallReport> {
    // Relative link text would resolve against the link's own directory
    let resource = &std::path::absolute(resource).with_context(|| {
        format!("Failed to resolve resource path: {}", resource.display())
    })?;

    if let Ok(target) = fs::read_link(destination)
        && target.as_path() == resource
    {
        return Ok(InstallReport {
            mode: LinkMode::Symlink,
            changed: false,
        });
    }

    let tmp = unique_temp_path(destination)?;

    if let Err(err) = create_symlink(resource, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(anyhow::Error::new(err).context("Failed to create symlink"));
    }

    replace_with_tmp(destination, &tmp)?;
    debug!(resource = %resource.display(), destination = %destination.display(), "symlinked");
    Ok(InstallReport {
        mode: LinkMode::Symlink,
        changed: true,
    })
}

/// An existing, non-symlink destination whose content hash equals the resource's.
fn is_identical_copy(resource: &Path, destination: &Path) -> bool {
    let Ok(meta) = fs::symlink_metadata(destination) else {
        return false;
    };
    if meta.file_type().is_symlink() || meta.is_dir() != resource.is_dir() {
        return false;
    }
    match (hash_path(resource), hash_path(destination)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Move the staged `tmp_path` over `destination`, removing what was there.
fn replace_with_tmp(destination: &Path, tmp_path: &Path) -> anyhow::Result<()> {
    match remove_path(destination) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(anyhow::Error::new(err).context(format!(
                "Failed to remove existing destination: {}",
                destination.display()
            )));
        }
    }
    fs::rename(tmp_path, destination).with_context(|| {
        format!(
            "Failed to move {} into place at {}",
            tmp_path.display(),
            destination.display()
        )
    })
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// A fresh hidden sibling of `destination` to stage the new content in.
fn unique_temp_path(destination: &Path) -> anyhow::Result<PathBuf> {
    let (Some(parent), Some(base)) = (destination.parent(), destination.file_name()) else {
        anyhow::bail!("Invalid install destination: {}", destination.display());
    };
    Ok(parent.join(format!(
        ".{}.{}.tmp",
        base.to_string_lossy(),
        Uuid::new_v4().simple()
    )))
}

/// Copy the contents of directory `src` into the existing directory `dst`.
fn copy_tree(src: &Path, dst: &Path) -> anyhow::Result<()> {
    let mut pending = vec![(src.to_path_buf(), dst.to_path_buf())];
    while let Some((from_dir, to_dir)) = pending.pop() {
        let entries = fs::read_dir(&from_dir)
            .with_context(|| format!("Failed to read dir: {}", from_dir.display()))?;
        for entry in entries {
            let entry = entry?;
            let from = entry.path();
            let to = to_dir.join(entry.file_name());
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                fs::create_dir(&to)
                    .with_context(|| format!("Failed to create directory: {}", to.display()))?;
                pending.push((from, to));
            } else if file_type.is_file() {
                fs::copy(&from, &to).with_context(|| {
                    format!("Failed to copy {} to {}", from.display(), to.display())
                })?;
            } else {
                anyhow::bail!("Cannot copy {}: not a file or directory", from.display());
            }
        }
    }
    Ok(())
}

fn is_unsupported_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|ioe| ioe.kind() == std::io::ErrorKind::Unsupported)
    })
}

#[cfg(unix)]
fn create_symlink(resource: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(resource, link)
}

#[cfg(windows)]
fn create_symlink(resource: &Path, link: &Path) -> std::io::Result<()> {
    if resource.is_dir() {
        std::os::windows::fs::symlink_dir(resource, link)
    } else {
        std::os::windows::fs::symlink_file(resource, link)
    }
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_resource: &Path, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "Symlinks are not supported on this platform",
    ))
}
