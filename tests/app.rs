use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use assert_matches::assert_matches;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use graph_dataset_manager::app::App;
use graph_dataset_manager::catalog::Catalog;
use graph_dataset_manager::cleaner::CleanMode;
use graph_dataset_manager::config::Settings;
use graph_dataset_manager::domain::{Filter, OrderBy};
use graph_dataset_manager::error::GdmError;
use graph_dataset_manager::fetch::{ArchiveClient, Download};
use graph_dataset_manager::output::QuietProgress;

/// Serves a small zip for every URL except those containing `broken`.
#[derive(Default)]
struct MockClient;

impl ArchiveClient for MockClient {
    fn open(&self, url: &str) -> Result<Download, GdmError> {
        if url.contains("broken") {
            return Err(GdmError::Http("connection reset".to_string()));
        }
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("nested/graph.mtx", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"%%MatrixMarket\n").unwrap();
        let body = writer.finish().unwrap().into_inner();
        Ok(Download {
            total: None,
            body: Box::new(Cursor::new(body)),
        })
    }
}

fn write_manifest(root: &Path, name: &str, url: &str, edges: u64) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("info.yaml"),
        format!(
            "name: {name}\nurl: {url}\nmetadata:\n  author: a\n  date: '2020-01-01'\n  description: d\n  tags: []\nstructure:\n  nodes: 10\n  edges: {edges}\n  directed: true\n  weighted: false\n  labeled: false\n  optional: {{}}\n"
        ),
    )
    .unwrap();
}

fn app(root: &Path) -> App<MockClient> {
    let catalog = Catalog::load(root).unwrap();
    let settings = Settings {
        check_disk_space: false,
        ..Settings::default()
    };
    App::new(catalog, MockClient::default(), settings)
}

#[test]
fn download_failure_does_not_stop_other_datasets() {
    let temp = tempfile::tempdir().unwrap();
    write_manifest(temp.path(), "alpha", "https://example.org/broken.zip", 5);
    write_manifest(temp.path(), "beta", "https://example.org/beta.zip", 5);
    let app = app(temp.path());

    let result = app.download(true, &[], &QuietProgress).unwrap();

    assert_eq!(result.items.len(), 2);
    assert_eq!(result.failures(), 1);
    assert!(result.items[0].error.as_deref().unwrap().contains("connection reset"));
    assert!(temp.path().join("beta/graph.mtx").is_file());
    assert!(temp.path().join("beta/info.yaml").is_file());
}

#[test]
fn unknown_dataset_fails_before_any_download() {
    let temp = tempfile::tempdir().unwrap();
    write_manifest(temp.path(), "alpha", "https://example.org/alpha.zip", 5);
    let app = app(temp.path());

    let names = vec!["alpha".to_string(), "missing".to_string()];
    let err = app.download(false, &names, &QuietProgress).unwrap_err();

    assert_matches!(err, GdmError::DatasetNotFound(_));
    assert!(!temp.path().join("alpha/graph.mtx").exists());
}

#[test]
fn download_then_clean_round() {
    let temp = tempfile::tempdir().unwrap();
    write_manifest(temp.path(), "beta", "https://example.org/beta.zip", 5);
    let app = app(temp.path());

    app.download(false, &["beta".to_string()], &QuietProgress)
        .unwrap();
    assert!(temp.path().join("beta/graph.mtx").is_file());

    let result = app
        .clean(false, &["beta".to_string()], CleanMode::Default, &QuietProgress)
        .unwrap();
    assert_eq!(result.items[0].removed, 1);
    assert!(!temp.path().join("beta/graph.mtx").exists());
    assert!(temp.path().join("beta/info.yaml").is_file());
}

#[test]
fn list_reports_filtered_entries() {
    let temp = tempfile::tempdir().unwrap();
    write_manifest(temp.path(), "small", "u", 10);
    write_manifest(temp.path(), "large", "u", 5000);
    let app = app(temp.path());

    let filter: Filter = "edges>1000".parse().unwrap();
    let result = app.list(OrderBy::Name, false, &[filter]);

    assert_eq!(result.datasets.len(), 1);
    assert_eq!(result.datasets[0].name, "large");
    assert_eq!(result.datasets[0].edges, 5000);
}

#[test]
fn info_returns_manifest() {
    let temp = tempfile::tempdir().unwrap();
    write_manifest(temp.path(), "alpha", "https://example.org/alpha.zip", 5);
    let app = app(temp.path());

    assert_eq!(app.info("alpha").unwrap().structure.edges, 5);
    assert_matches!(app.info("beta"), Err(GdmError::DatasetNotFound(_)));
}
