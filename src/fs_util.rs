use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use zip::ZipArchive;

use crate::error::GdmError;

fn archive_error(path: &Path, err: impl ToString) -> GdmError {
    GdmError::Archive {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn write_flat(
    target_dir: &Path,
    file_name: OsString,
    reader: &mut impl io::Read,
) -> Result<PathBuf, GdmError> {
    let out_path = target_dir.join(file_name);
    let mut outfile =
        fs::File::create(&out_path).map_err(|err| GdmError::Filesystem(err.to_string()))?;
    io::copy(reader, &mut outfile).map_err(|err| GdmError::Filesystem(err.to_string()))?;
    Ok(out_path)
}

/// Extracts every file entry of a zip archive directly into `target_dir`,
/// dropping the directory part of its name.
pub fn extract_zip_flat(zip_path: &Path, target_dir: &Path) -> Result<Vec<PathBuf>, GdmError> {
    let file = fs::File::open(zip_path)
        .map_err(|err| GdmError::Filesystem(format!("open zip {}: {err}", zip_path.display())))?;
    let mut archive = ZipArchive::new(file).map_err(|err| archive_error(zip_path, err))?;
    fs::create_dir_all(target_dir).map_err(|err| GdmError::Filesystem(err.to_string()))?;

    let mut written = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| archive_error(zip_path, err))?;
        if entry.is_dir() {
            continue;
        }
        let Some(file_name) = entry
            .enclosed_name()
            .and_then(|path| path.file_name().map(|name| name.to_os_string()))
        else {
            continue;
        };
        written.push(write_flat(target_dir, file_name, &mut entry)?);
    }
    Ok(written)
}

/// Same flattening as [`extract_zip_flat`] for a gzip-compressed tarball.
pub fn extract_tar_gz_flat(
    tar_path: &Path,
    target_dir: &Path,
) -> Result<Vec<PathBuf>, GdmError> {
    let file = fs::File::open(tar_path)
        .map_err(|err| GdmError::Filesystem(format!("open tar {}: {err}", tar_path.display())))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    fs::create_dir_all(target_dir).map_err(|err| GdmError::Filesystem(err.to_string()))?;

    let mut written = Vec::new();
    let entries = archive
        .entries()
        .map_err(|err| archive_error(tar_path, err))?;
    for entry in entries {
        let mut entry = entry.map_err(|err| archive_error(tar_path, err))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let file_name = entry
            .path()
            .map_err(|err| archive_error(tar_path, err))?
            .file_name()
            .map(|name| name.to_os_string());
        let Some(file_name) = file_name else {
            continue;
        };
        written.push(write_flat(target_dir, file_name, &mut entry)?);
    }
    Ok(written)
}

/// Every regular file below `root`. Unreadable directories are reported
/// alongside the files instead of aborting the walk.
pub fn walk_files(root: &Path) -> (Vec<PathBuf>, Vec<GdmError>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                errors.push(GdmError::Filesystem(format!("{}: {err}", dir.display())));
                continue;
            }
        };
        for entry in entries {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_dir() {
                        stack.push(path);
                    } else {
                        files.push(path);
                    }
                }
                Err(err) => {
                    errors.push(GdmError::Filesystem(format!("{}: {err}", dir.display())));
                }
            }
        }
    }
    files.sort();
    (files, errors)
}

/// `true` when the file name ends with `suffix`, ignoring ASCII case.
pub fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| {
            name.len()
                .checked_sub(suffix.len())
                .and_then(|start| name.get(start..))
        })
        .map(|tail| tail.eq_ignore_ascii_case(suffix))
        .unwrap_or(false)
}
