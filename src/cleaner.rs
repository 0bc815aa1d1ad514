use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error};

use crate::fetch::TEMP_PREFIX;
use crate::fs_util::{has_suffix, walk_files};

/// Manifests and helper scripts survive a default clean.
pub const RETAINED_SUFFIXES: &[&str] = &[".yaml", ".yml", ".py"];

/// Leftovers of an interrupted or failed installation.
pub const ARCHIVE_SUFFIXES: &[&str] = &[".zip", ".tar.gz", ".tgz", ".tar", ".gz"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleanMode {
    #[default]
    Default,
    InstallationOnly,
}

impl CleanMode {
    pub fn should_remove(self, path: &Path) -> bool {
        match self {
            CleanMode::Default => !RETAINED_SUFFIXES
                .iter()
                .any(|suffix| has_suffix(path, suffix)),
            CleanMode::InstallationOnly => {
                ARCHIVE_SUFFIXES
                    .iter()
                    .any(|suffix| has_suffix(path, suffix))
                    || is_temp_download(path)
            }
        }
    }
}

fn is_temp_download(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(TEMP_PREFIX))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
    pub errors: Vec<String>,
}

/// Deletes files below `root` according to `mode`. Failures are logged and
/// collected; the walk always runs to the end.
pub fn clean_dataset(root: &Path, mode: CleanMode) -> CleanReport {
    let mut report = CleanReport::default();
    let (files, walk_errors) = walk_files(root);
    for err in walk_errors {
        error!(root = %root.display(), "{err}");
        report.errors.push(err.to_string());
    }

    for path in files {
        if !mode.should_remove(&path) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed");
                report.removed.push(path);
            }
            Err(err) => {
                error!(path = %path.display(), "failed to remove: {err}");
                report.errors.push(format!("{}: {err}", path.display()));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retained_and_archive_suffixes() {
        assert!(!CleanMode::Default.should_remove(Path::new("g/info.yaml")));
        assert!(!CleanMode::Default.should_remove(Path::new("g/fetch.py")));
        assert!(CleanMode::Default.should_remove(Path::new("g/graph.mtx")));

        assert!(CleanMode::InstallationOnly.should_remove(Path::new("g/graph.tar.gz")));
        assert!(CleanMode::InstallationOnly.should_remove(Path::new("g/GRAPH.ZIP")));
        assert!(CleanMode::InstallationOnly.should_remove(Path::new("g/.gdm-download-x1y2")));
        assert!(!CleanMode::InstallationOnly.should_remove(Path::new("g/graph.mtx")));
        assert!(!CleanMode::InstallationOnly.should_remove(Path::new("g/info.yaml")));
    }
}
