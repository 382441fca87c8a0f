//! Public URLs for repository resources.

use glob::{MatchOptions, Pattern};
use tracing::debug;

use crate::asset::{AssetManager, AssetMapping};
use crate::error::AssetError;
use crate::target::InstallTargetManager;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Generates the URL under which a repository resource is served.
pub struct AssetUrlGenerator<'a> {
    assets: &'a dyn AssetManager,
    targets: &'a dyn InstallTargetManager,
}

impl<'a> AssetUrlGenerator<'a> {
    pub fn new(assets: &'a dyn AssetManager, targets: &'a dyn InstallTargetManager) -> Self {
        Self { assets, targets }
    }

    /// Return the URL of the resource at `repository_path`.
    ///
    /// When several mappings cover the path, the one with the longest glob
    /// wins.
    pub fn generate_url(&self, repository_path: &str) -> anyhow::Result<String> {
        let cannot = |reason: String| AssetError::CannotGenerateUrl {
            path: repository_path.to_string(),
            reason,
        };

        if !repository_path.starts_with('/') {
            return Err(cannot("path must be an absolute repository path".to_string()).into());
        }

        let (mapping, web_path) = self
            .assets
            .get_asset_mappings()?
            .into_iter()
            .filter_map(|mapping| {
                let web_path = web_path_of(&mapping, repository_path)?;
                Some((mapping, web_path))
            })
            .max_by_key(|(mapping, _)| mapping.glob.len())
            .ok_or_else(|| cannot("no asset mapping covers it".to_string()))?;

        let target = self
            .targets
            .get_target(&mapping.target_name)
            .map_err(|err| cannot(err.to_string()))?;

        debug!(
            path = repository_path,
            uuid = %mapping.uuid,
            target = %target.name,
            web_path = %web_path,
            "generating asset url"
        );
        Ok(target.url_for(&web_path))
    }
}

/// Web path of `path` under `mapping`, if the mapping covers it.
fn web_path_of(mapping: &AssetMapping, path: &str) -> Option<String> {
    if mapping.is_pattern() {
        let pattern = Pattern::new(&mapping.glob).ok()?;
        // The path itself or one of its ancestors must match the pattern
        let mut prefix = path;
        loop {
            if pattern.matches_with(prefix, MATCH_OPTIONS) {
                let name = prefix.rsplit('/').next().unwrap_or_default();
                let rest = &path[prefix.len()..];
                return Some(join_web_path(&mapping.web_path, &format!("{name}{rest}")));
            }
            prefix = &prefix[..prefix.rfind('/')?];
            if prefix.is_empty() {
                return None;
            }
        }
    }

    let glob = mapping.glob.trim_end_matches('/');
    if path == glob {
        return Some(mapping.web_path.clone());
    }
    let rest = path.strip_prefix(glob)?.strip_prefix('/')?;
    Some(join_web_path(&mapping.web_path, rest))
}

fn join_web_path(web_path: &str, rest: &str) -> String {
    format!("{}/{}", web_path.trim_end_matches('/'), rest)
}
