//! Deterministic content hashing for installed assets.
//!
//! Used by the copy installer to detect that a destination already holds an
//! identical copy of a resource.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// Compute a deterministic hash of a file or a directory tree.
///
/// A file hashes as `0x00 || content`. A directory hashes every entry below
/// it sorted by relative path: `path || 0xFF` for directories and
/// `path || 0x00 || content` for files. Symlinks inside a directory are
/// rejected. Output is the blake3 hex digest.
pub fn hash_path(path: &Path) -> anyhow::Result<String> {
    let meta =
        fs::metadata(path).with_context(|| format!("Failed to stat: {}", path.display()))?;
    let mut hasher = blake3::Hasher::new();

    if !meta.is_dir() {
        hasher.update(&[0x00]);
        hasher.update(&read(path)?);
        return Ok(hasher.finalize().to_hex().to_string());
    }

    let mut entries = Vec::new();
    walk(path, String::new(), &mut entries)?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    for (relative, entry) in entries {
        hasher.update(relative.as_bytes());
        match entry {
            TreeEntry::Dir => {
                hasher.update(&[0xFF]);
            }
            TreeEntry::File(file) => {
                hasher.update(&[0x00]);
                hasher.update(&read(&file)?);
            }
        }
    }
    Ok(hasher.finalize().to_hex().to_string())
}

enum TreeEntry {
    Dir,
    File(PathBuf),
}

fn walk(dir: &Path, prefix: String, out: &mut Vec<(String, TreeEntry)>) -> anyhow::Result<()> {
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry =
            entry.with_context(|| format!("Failed to read directory entry: {}", dir.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to stat: {}", entry.path().display()))?;
        let relative = format!("{}{}", prefix, entry.file_name().to_string_lossy());

        if file_type.is_dir() {
            walk(&entry.path(), format!("{relative}/"), out)?;
            out.push((relative, TreeEntry::Dir));
        } else if file_type.is_file() {
            out.push((relative, TreeEntry::File(entry.path())));
        } else {
            anyhow::bail!(
                "Cannot hash {}: only files and directories are supported",
                entry.path().display()
            );
        }
    }
    Ok(())
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
}
