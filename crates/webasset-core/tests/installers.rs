use std::fs;
use std::path::Path;

use webasset_core::fs::LinkMode;
use webasset_core::installer::{CopyInstaller, ResourceInstaller, SymlinkInstaller};

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create_dir_all should succeed in test temp dirs");
    }
    fs::write(path, content).expect("write should succeed in test temp dirs");
}

fn make_bundle(root: &Path) -> std::path::PathBuf {
    let bundle = root.join("res").join("bundle");
    write_file(&bundle.join("app.js"), "app();\n");
    write_file(&bundle.join("css").join("site.css"), "body {}\n");
    bundle
}

#[test]
fn copy_materializes_directory_tree() {
    let tmp = tempfile::tempdir().expect("tempdir should succeed");
    let bundle = make_bundle(tmp.path());
    let dst = tmp.path().join("public").join("bundle");

    let report = CopyInstaller::new(false)
        .install_resource(&bundle, &dst)
        .expect("copy should succeed");

    assert_eq!(report.mode, LinkMode::Copy);
    assert!(report.changed);
    assert_eq!(fs::read_to_string(dst.join("app.js")).unwrap(), "app();\n");
    assert!(dst.join("css").join("site.css").is_file());
}

#[test]
fn unchanged_copy_is_a_noop_and_changes_are_picked_up() {
    let tmp = tempfile::tempdir().expect("tempdir should succeed");
    let bundle = make_bundle(tmp.path());
    let dst = tmp.path().join("public").join("bundle");
    let installer = CopyInstaller::new(false);

    installer.install_resource(&bundle, &dst).unwrap();
    let again = installer.install_resource(&bundle, &dst).unwrap();
    assert!(!again.changed);

    write_file(&bundle.join("app.js"), "app(2);\n");
    fs::remove_file(bundle.join("css").join("site.css")).unwrap();
    let updated = installer.install_resource(&bundle, &dst).unwrap();
    assert!(updated.changed);
    assert_eq!(fs::read_to_string(dst.join("app.js")).unwrap(), "app(2);\n");
    assert!(!dst.join("css").join("site.css").exists());
}

#[test]
fn copy_replaces_existing_file() {
    let tmp = tempfile::tempdir().expect("tempdir should succeed");
    let src = tmp.path().join("logo.svg");
    write_file(&src, "<svg/>");
    let dst = tmp.path().join("public").join("logo.svg");
    write_file(&dst, "stale");

    let report = CopyInstaller::new(false).install_resource(&src, &dst).unwrap();

    assert!(report.changed);
    assert_eq!(fs::read_to_string(&dst).unwrap(), "<svg/>");
}

#[test]
fn missing_resource_fails() {
    let tmp = tempfile::tempdir().expect("tempdir should succeed");
    let err = CopyInstaller::new(false)
        .install_resource(&tmp.path().join("missing"), &tmp.path().join("dst"))
        .unwrap_err();
    assert!(err.to_string().contains("Failed to stat resource"));
}

#[cfg(unix)]
#[test]
fn symlink_points_at_resource_and_is_idempotent() {
    let tmp = tempfile::tempdir().expect("tempdir should succeed");
    let bundle = make_bundle(tmp.path());
    let dst = tmp.path().join("public").join("bundle");
    let installer = SymlinkInstaller::new();

    let report = installer.install_resource(&bundle, &dst).unwrap();
    assert_eq!(report.mode, LinkMode::Symlink);
    assert!(report.changed);
    assert_eq!(fs::read_link(&dst).unwrap(), bundle);
    assert!(dst.join("app.js").is_file());

    let again = installer.install_resource(&bundle, &dst).unwrap();
    assert!(!again.changed);
}

#[cfg(unix)]
#[test]
fn symlink_replaces_previous_copy() {
    let tmp = tempfile::tempdir().expect("tempdir should succeed");
    let bundle = make_bundle(tmp.path());
    let dst = tmp.path().join("public").join("bundle");

    CopyInstaller::new(false).install_resource(&bundle, &dst).unwrap();
    assert!(!fs::symlink_metadata(&dst).unwrap().file_type().is_symlink());

    SymlinkInstaller::new().install_resource(&bundle, &dst).unwrap();
    assert!(fs::symlink_metadata(&dst).unwrap().file_type().is_symlink());
}

#[cfg(unix)]
#[test]
fn copy_replaces_previous_symlink() {
    let tmp = tempfile::tempdir().expect("tempdir should succeed");
    let bundle = make_bundle(tmp.path());
    let dst = tmp.path().join("public").join("bundle");

    SymlinkInstaller::new().install_resource(&bundle, &dst).unwrap();
    let report = CopyInstaller::new(false).install_resource(&bundle, &dst).unwrap();

    assert!(report.changed);
    assert!(!fs::symlink_metadata(&dst).unwrap().file_type().is_symlink());
    // The resource itself survives replacing the link
    assert!(bundle.join("app.js").is_file());
}
