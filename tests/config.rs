use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use assert_matches::assert_matches;

use graph_dataset_manager::config::{Config, ConfigLoader};
use graph_dataset_manager::error::GdmError;

#[test]
fn explicit_file_overrides_defaults() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("gdm.json");
    fs::write(
        &path,
        r#"{ "datasets_dir": "/data/graphs", "bench_dir": "build/bin", "check_disk_space": false, "http_timeout_secs": 5, "panel_width": 60 }"#,
    )
    .unwrap();

    let settings = ConfigLoader::resolve(Some(&path)).unwrap();

    assert_eq!(settings.datasets_dir, PathBuf::from("/data/graphs"));
    assert_eq!(settings.bench_dir, PathBuf::from("build/bin"));
    assert!(!settings.check_disk_space);
    assert_eq!(settings.connect_timeout, Duration::from_secs(5));
    assert_eq!(settings.panel_width, Some(60));
}

#[test]
fn partial_file_keeps_other_defaults() {
    let settings = ConfigLoader::resolve_config(Config {
        bench_dir: Some(PathBuf::from("gunrock/build/bin")),
        ..Config::default()
    });
    assert_eq!(settings.datasets_dir, PathBuf::from("."));
    assert_eq!(settings.bench_dir, PathBuf::from("gunrock/build/bin"));
    assert!(settings.check_disk_space);
    assert_eq!(settings.panel_width, None);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    assert_matches!(
        ConfigLoader::resolve(Some(&path)),
        Err(GdmError::ConfigRead(p)) if p == path
    );
}

#[test]
fn unknown_keys_are_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("gdm.json");
    fs::write(&path, r#"{ "dataset_dir": "typo" }"#).unwrap();
    assert_matches!(
        ConfigLoader::resolve(Some(&path)),
        Err(GdmError::ConfigParse(_))
    );
}
