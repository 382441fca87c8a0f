//! Reading and writing `webasset.toml`.

use super::schema::AssetConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse webasset.toml with detailed error messages
pub fn parse_config(path: &Path) -> Result<AssetConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse webasset.toml content from string
pub fn parse_config_str(content: &str) -> Result<AssetConfig> {
    let config: AssetConfig =
        toml::from_str(content).map_err(|e| describe_toml_error(e, content))?;

    config.validate()?;

    Ok(config)
}

/// Point at the offending line and column of a TOML error.
fn describe_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let Some(span) = error.span() else {
        return anyhow::anyhow!("Invalid TOML: {}", error.message());
    };

    let offset = span.start.min(content.len());
    let line_start = content[..offset].rfind('\n').map_or(0, |newline| newline + 1);
    let line_no = content[..line_start].matches('\n').count() + 1;
    let column = content[line_start..offset].chars().count() + 1;
    let line = content[line_start..].lines().next().unwrap_or_default();

    anyhow::anyhow!(
        "Invalid TOML at line {line_no}, column {column}: {}\n{line_no:>5} | {line}\n      | {:>column$}",
        error.message(),
        "^"
    )
}

/// Serialize a configuration to TOML string
pub fn to_toml(config: &AssetConfig) -> Result<String> {
    toml::to_string_pretty(config).with_context(|| "Failed to serialize configuration to TOML")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingDescriptor;
    use crate::config::schema::TargetEntry;
    use std::collections::BTreeMap;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
default_target = "local"

[installers.rsync]
strategy = "copy"

[installers.rsync.parameters.host]
required = true

[targets.local]
installer = "symlink"
location = "public"

[targets.remote]
installer = "rsync"
location = "/mnt/remote"
url_format = "https://cdn.example.com/%s"
parameters = { host = "cdn.example.com" }

[[bindings]]
uuid = "2b4d6a4c-62d4-4f3e-9d9c-0a5c1f3c8b1e"
query = "/app/public{,/**}"
type = "webasset/asset-mapping"

[bindings.parameters]
target = "local"
path = "/"
"#;

        let config = parse_config_str(toml).unwrap();
        assert_eq!(config.default_target.as_deref(), Some("local"));
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets["local"].url_format, "/%s");
        assert!(config.installers["rsync"].parameters["host"].required);
        assert_eq!(config.bindings.len(), 1);
        assert_eq!(config.bindings[0].parameter_value("target"), Some("local"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config_str("").unwrap();
        assert!(config.targets.is_empty());
        assert!(config.bindings.is_empty());
    }

    #[test]
    fn test_parse_invalid_toml_points_at_line() {
        let toml = "default_target = \"local\"\n[targets.local\ninstaller = \"copy\"\n";
        let err = parse_config_str(toml).unwrap_err().to_string();
        assert!(err.starts_with("Invalid TOML at line 2"), "{err}");
        assert!(err.contains("    2 | [targets.local"), "{err}");
        assert!(err.contains('^'), "{err}");
    }

    #[test]
    fn test_unknown_installer_is_rejected() {
        let toml = r#"
[targets.local]
installer = "ftp"
location = "public"
"#;
        let err = parse_config_str(toml).unwrap_err().to_string();
        assert!(err.contains("unknown installer"));
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let mut original = AssetConfig::new();
        original.targets.insert(
            "local".to_string(),
            TargetEntry {
                installer: "copy".to_string(),
                location: "public".to_string(),
                url_format: "/%s".to_string(),
                parameters: BTreeMap::new(),
            },
        );
        original.default_target = Some("local".to_string());
        original.bindings.push(
            BindingDescriptor::new("/app/public{,/**}", "webasset/asset-mapping")
                .with_parameter("target", "local")
                .with_parameter("path", "/"),
        );

        let serialized = to_toml(&original).unwrap();
        let parsed = parse_config_str(&serialized).unwrap();

        assert_eq!(parsed.targets, original.targets);
        assert_eq!(parsed.bindings, original.bindings);
        assert_eq!(parsed.default_target, original.default_target);
    }
}
