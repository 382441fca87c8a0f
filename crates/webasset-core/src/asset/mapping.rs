//! Asset mappings and their conversion to discovery bindings.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::binding::{BindingDescriptor, BindingState};
use crate::error::AssetError;
use crate::expr::Record;

use super::{BINDING_TYPE, PATH_PARAMETER, QUERY_SUFFIX, TARGET_PARAMETER};

/// Maps a repository glob to a web path on an install target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMapping {
    pub uuid: Uuid,
    pub glob: String,
    pub target_name: String,
    pub web_path: String,
}

impl AssetMapping {
    pub const UUID: &'static str = "uuid";
    pub const GLOB: &'static str = "glob";
    pub const TARGET_NAME: &'static str = "targetName";
    pub const WEB_PATH: &'static str = "webPath";

    /// Create a mapping with a fresh UUID.
    ///
    /// The glob must be an absolute repository path; the web path is
    /// normalized to start with `/`.
    pub fn new(
        glob: impl Into<String>,
        target_name: impl Into<String>,
        web_path: impl Into<String>,
    ) -> Result<Self, AssetError> {
        Self::with_uuid(Uuid::new_v4(), glob, target_name, web_path)
    }

    pub fn with_uuid(
        uuid: Uuid,
        glob: impl Into<String>,
        target_name: impl Into<String>,
        web_path: impl Into<String>,
    ) -> Result<Self, AssetError> {
        let glob = glob.into();
        let target_name = target_name.into();
        let web_path = web_path.into();

        if !glob.starts_with('/') {
            return Err(AssetError::InvalidMapping(format!(
                "glob '{}' must be an absolute repository path",
                glob
            )));
        }
        if has_parent_segment(&glob) {
            return Err(AssetError::InvalidMapping(format!(
                "glob '{}' must not contain '..' segments",
                glob
            )));
        }
        if has_parent_segment(&web_path) {
            return Err(AssetError::InvalidMapping(format!(
                "web path '{}' must not contain '..' segments",
                web_path
            )));
        }
        if target_name.is_empty() {
            return Err(AssetError::InvalidMapping(
                "target name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            uuid,
            glob,
            target_name,
            web_path: normalize_web_path(&web_path),
        })
    }

    /// The discovery binding that stores this mapping.
    pub fn to_binding(&self) -> BindingDescriptor {
        BindingDescriptor::new(format!("{}{}", self.glob, QUERY_SUFFIX), BINDING_TYPE)
            .with_uuid(self.uuid)
            .with_parameter(TARGET_PARAMETER, self.target_name.clone())
            .with_parameter(PATH_PARAMETER, self.web_path.clone())
    }

    /// Rebuild a mapping from an enabled asset binding.
    pub fn from_binding(binding: &BindingDescriptor) -> Result<Self, AssetError> {
        let invalid = |reason: &str| {
            AssetError::InvalidMapping(format!("binding {}: {}", binding.uuid, reason))
        };

        if binding.type_name != BINDING_TYPE {
            return Err(invalid("not an asset mapping binding"));
        }
        if binding.state != BindingState::Enabled {
            return Err(invalid("binding is not enabled"));
        }
        let glob = binding
            .query
            .strip_suffix(QUERY_SUFFIX)
            .ok_or_else(|| invalid("query lacks the asset suffix"))?;
        let target = binding
            .parameter_value(TARGET_PARAMETER)
            .ok_or_else(|| invalid("missing target parameter"))?;
        let path = binding
            .parameter_value(PATH_PARAMETER)
            .ok_or_else(|| invalid("missing path parameter"))?;

        Self::with_uuid(binding.uuid, glob, target, path)
    }

    /// Whether the glob contains wildcard characters.
    pub fn is_pattern(&self) -> bool {
        self.glob.contains(['*', '?', '['])
    }
}

impl Record for AssetMapping {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            Self::UUID => Some(Value::String(self.uuid.to_string())),
            Self::GLOB => Some(Value::String(self.glob.clone())),
            Self::TARGET_NAME => Some(Value::String(self.target_name.clone())),
            Self::WEB_PATH => Some(Value::String(self.web_path.clone())),
            _ => None,
        }
    }
}

fn has_parent_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}

fn normalize_web_path(web_path: &str) -> String {
    let trimmed = web_path.trim_matches('/');
    format!("/{}", trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_path_is_normalized() {
        let mapping = AssetMapping::new("/app/public", "local", "css/").unwrap();
        assert_eq!(mapping.web_path, "/css");

        let root = AssetMapping::new("/app/public", "local", "").unwrap();
        assert_eq!(root.web_path, "/");
    }

    #[test]
    fn relative_glob_is_rejected() {
        let err = AssetMapping::new("app/public", "local", "/").unwrap_err();
        assert!(matches!(err, AssetError::InvalidMapping(_)));
    }

    #[test]
    fn parent_segments_are_rejected() {
        for (glob, web_path) in [
            ("/res/../secrets", "/"),
            ("/..", "/"),
            ("/res/public", "/../../etc"),
            ("/res/public", "css/.."),
        ] {
            let err = AssetMapping::new(glob, "local", web_path).unwrap_err();
            assert!(matches!(err, AssetError::InvalidMapping(_)), "{glob} {web_path}");
        }

        // Dots inside a name are fine
        assert!(AssetMapping::new("/res/..hidden/a..b.js", "local", "/v1..2").is_ok());
    }

    #[test]
    fn binding_roundtrip() {
        let mapping = AssetMapping::new("/app/public/*.css", "cdn", "/css").unwrap();
        let binding = mapping.to_binding();

        assert_eq!(binding.query, "/app/public/*.css{,/**}");
        assert_eq!(binding.type_name, BINDING_TYPE);
        assert_eq!(binding.parameter_value(TARGET_PARAMETER), Some("cdn"));
        assert_eq!(AssetMapping::from_binding(&binding).unwrap(), mapping);
    }

    #[test]
    fn foreign_binding_is_rejected() {
        let binding = BindingDescriptor::new("/x{,/**}", "other/type");
        assert!(AssetMapping::from_binding(&binding).is_err());
    }

    #[test]
    fn detects_patterns() {
        assert!(
            AssetMapping::new("/app/*.css", "local", "/")
                .unwrap()
                .is_pattern()
        );
        assert!(
            !AssetMapping::new("/app/public", "local", "/")
                .unwrap()
                .is_pattern()
        );
    }
}
