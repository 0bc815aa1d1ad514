use std::fs;
use std::path::Path;

use graph_dataset_manager::cleaner::{CleanMode, clean_dataset};

fn populate(root: &Path) {
    fs::create_dir_all(root.join("nested")).unwrap();
    for name in [
        "info.yaml",
        "fetch.py",
        "graph.mtx",
        "graph.bin",
        "graph.zip",
        "nested/extra.tar.gz",
        "nested/notes.yml",
        "nested/edges.txt",
    ] {
        fs::write(root.join(name), b"x").unwrap();
    }
}

fn remaining(root: &Path) -> Vec<String> {
    let (files, errors) = graph_dataset_manager::fs_util::walk_files(root);
    assert!(errors.is_empty());
    files
        .iter()
        .map(|path| {
            path.strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn default_mode_keeps_manifests_and_scripts() {
    let temp = tempfile::tempdir().unwrap();
    populate(temp.path());

    let report = clean_dataset(temp.path(), CleanMode::Default);

    assert!(report.errors.is_empty());
    assert_eq!(report.removed.len(), 5);
    assert_eq!(
        remaining(temp.path()),
        vec!["fetch.py", "info.yaml", "nested/notes.yml"]
    );
}

#[test]
fn installation_mode_only_removes_archives() {
    let temp = tempfile::tempdir().unwrap();
    populate(temp.path());

    let report = clean_dataset(temp.path(), CleanMode::InstallationOnly);

    assert_eq!(report.removed.len(), 2);
    assert_eq!(
        remaining(temp.path()),
        vec![
            "fetch.py",
            "graph.bin",
            "graph.mtx",
            "info.yaml",
            "nested/edges.txt",
            "nested/notes.yml",
        ]
    );
}

#[test]
fn missing_root_is_reported_not_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let report = clean_dataset(&temp.path().join("absent"), CleanMode::Default);
    assert!(report.removed.is_empty());
    assert!(!report.errors.is_empty());
}
