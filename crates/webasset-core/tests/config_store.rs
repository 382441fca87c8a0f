use std::fs;

use tempfile::TempDir;

use webasset_core::config::{AssetConfig, CONFIG_FILE_NAME, ConfigStore, TargetEntry};
use webasset_core::fs::LinkMode;
use webasset_core::installer::{ConfigInstallerManager, InstallerDescriptor, InstallerManager};

#[test]
fn load_missing_returns_empty_config() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_project_root(temp.path());

    let config = store.load().unwrap();

    assert!(config.targets.is_empty());
    assert!(config.installers.is_empty());
    assert!(config.bindings.is_empty());
    assert!(!temp.path().join(CONFIG_FILE_NAME).exists());
}

#[test]
fn save_then_load_roundtrip() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_project_root(temp.path());

    let mut config = AssetConfig::new();
    config.targets.insert(
        "local".to_string(),
        TargetEntry {
            installer: "symlink".to_string(),
            location: "public".to_string(),
            url_format: "/assets/%s".to_string(),
            parameters: Default::default(),
        },
    );
    config.default_target = Some("local".to_string());
    store.save(&config).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.default_target.as_deref(), Some("local"));
    assert_eq!(loaded.targets["local"].url_format, "/assets/%s");
    assert!(!temp.path().join("webasset.toml.tmp").exists());
}

#[test]
fn save_rejects_invalid_config() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_project_root(temp.path());

    let config = AssetConfig {
        default_target: Some("missing".to_string()),
        ..Default::default()
    };

    assert!(store.save(&config).is_err());
    assert!(!store.config_path().exists());
}

#[test]
fn load_reports_toml_errors_with_line() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(CONFIG_FILE_NAME),
        "default_target = \"local\"\n[targets.local\n",
    )
    .unwrap();

    let err = ConfigStore::from_project_root(temp.path())
        .load()
        .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("line"), "{message}");
}

#[test]
fn failed_update_leaves_file_untouched() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_project_root(temp.path());
    let installers = ConfigInstallerManager::new(store.clone());
    installers
        .add_installer_descriptor(InstallerDescriptor::new("rsync", LinkMode::Copy).unwrap())
        .unwrap();
    let before = fs::read_to_string(store.config_path()).unwrap();

    let result: anyhow::Result<()> = store.update(|config| {
        config.installers.clear();
        anyhow::bail!("abort")
    });

    assert!(result.is_err());
    assert_eq!(fs::read_to_string(store.config_path()).unwrap(), before);
}
