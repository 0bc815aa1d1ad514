use std::fs;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use sysinfo::Disks;
use tracing::{debug, info};

use crate::app::{ProgressEvent, ProgressSink};
use crate::drive;
use crate::error::GdmError;
use crate::fs_util;

const MAGIC_LEN: usize = 262;
const CHUNK_SIZE: usize = 64 * 1024;
pub const TEMP_PREFIX: &str = ".gdm-download-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGz => "tar.gz",
        }
    }

    /// Classifies by magic bytes, never by URL or file name.
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(b"PK") {
            Some(ArchiveFormat::Zip)
        } else if header.starts_with(&[0x1f, 0x8b, 0x08]) {
            Some(ArchiveFormat::TarGz)
        } else {
            None
        }
    }
}

pub fn sniff_format(path: &Path) -> Result<ArchiveFormat, GdmError> {
    let mut file = fs::File::open(path).map_err(|err| GdmError::Filesystem(err.to_string()))?;
    sniff_reader(&mut file, path)
}

fn sniff_reader(reader: &mut impl Read, path: &Path) -> Result<ArchiveFormat, GdmError> {
    let mut header = Vec::with_capacity(MAGIC_LEN);
    reader
        .take(MAGIC_LEN as u64)
        .read_to_end(&mut header)
        .map_err(|err| GdmError::Filesystem(err.to_string()))?;
    ArchiveFormat::sniff(&header).ok_or_else(|| GdmError::UnsupportedArchive(path.to_path_buf()))
}

/// An opened remote resource.
pub struct Download {
    pub total: Option<u64>,
    pub body: Box<dyn Read>,
}

pub trait ArchiveClient {
    fn open(&self, url: &str) -> Result<Download, GdmError>;
}

#[derive(Clone)]
pub struct HttpArchiveClient {
    client: Client,
}

impl HttpArchiveClient {
    pub fn new(connect_timeout: Duration) -> Result<Self, GdmError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("gdm/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| GdmError::Http(err.to_string()))?,
        );
        // Dataset archives can take far longer than any sane total timeout.
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(connect_timeout)
            .timeout(None::<Duration>)
            .cookie_store(true)
            .build()
            .map_err(|err| GdmError::Http(err.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpArchiveClient {
    fn get(&self, url: &str) -> Result<Response, GdmError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| GdmError::Http(err.to_string()))?;
        if !response.status().is_success() {
            return Err(GdmError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().starts_with("text/html"))
        .unwrap_or(false)
}

impl ArchiveClient for HttpArchiveClient {
    /// Drive share links are rewritten to their download endpoint, and a
    /// Drive confirmation page is followed once.
    fn open(&self, url: &str) -> Result<Download, GdmError> {
        let target = drive::direct_url(url);
        if target != url {
            debug!(url, target = %target, "resolved drive link");
        }
        let mut response = self.get(&target)?;

        if is_html(&response) && drive::is_drive_url(response.url().as_str()) {
            let page_url = response.url().to_string();
            let html = response
                .text()
                .map_err(|err| GdmError::Http(err.to_string()))?;
            match drive::confirmation_url(&html, &page_url) {
                Some(next) => {
                    debug!(next = %next, "following drive confirmation page");
                    response = self.get(&next)?;
                }
                None => {
                    let body = html.into_bytes();
                    return Ok(Download {
                        total: Some(body.len() as u64),
                        body: Box::new(io::Cursor::new(body)),
                    });
                }
            }
        }

        Ok(Download {
            total: response.content_length().filter(|len| *len > 0),
            body: Box::new(response),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub check_disk_space: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            check_disk_space: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
    pub format: ArchiveFormat,
    pub bytes: u64,
    pub files: Vec<PathBuf>,
}

/// Downloads `url` into `dir`, extracts it flattened and removes the archive.
///
/// The body lands in a uniquely named temporary file first; it is only
/// renamed to `{name}.{ext}` once its magic bytes identify a supported
/// archive, so a rejected download leaves nothing behind.
pub fn fetch_dataset<C: ArchiveClient + ?Sized>(
    client: &C,
    name: &str,
    url: &str,
    dir: &Path,
    options: FetchOptions,
    sink: &dyn ProgressSink,
) -> Result<FetchOutcome, GdmError> {
    fs::create_dir_all(dir).map_err(|err| GdmError::Filesystem(err.to_string()))?;

    sink.event(ProgressEvent::Message(format!("downloading {name}")));
    info!(name, url, "downloading dataset");
    let download = client.open(url)?;

    if options.check_disk_space {
        if let Some(required) = download.total {
            ensure_disk_space(dir, required)?;
        }
    }

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dir)
        .map_err(|err| GdmError::Filesystem(err.to_string()))?;
    let bytes = copy_with_progress(download.body, temp.as_file_mut(), download.total, sink)?;
    debug!(name, bytes, "download complete");

    let temp_path = temp.path().to_path_buf();
    let file = temp.as_file_mut();
    file.flush()
        .and_then(|_| file.seek(SeekFrom::Start(0)).map(|_| ()))
        .map_err(|err| GdmError::Filesystem(err.to_string()))?;
    let format = sniff_reader(file, &temp_path)?;

    let archive_path = dir.join(format!("{name}.{}", format.extension()));
    temp.persist(&archive_path)
        .map_err(|err| GdmError::Filesystem(err.to_string()))?;

    sink.event(ProgressEvent::Message(format!("extracting {name}")));
    let files = match format {
        ArchiveFormat::Zip => fs_util::extract_zip_flat(&archive_path, dir)?,
        ArchiveFormat::TarGz => fs_util::extract_tar_gz_flat(&archive_path, dir)?,
    };
    fs::remove_file(&archive_path).map_err(|err| GdmError::Filesystem(err.to_string()))?;
    info!(name, files = files.len(), "dataset extracted");

    Ok(FetchOutcome {
        format,
        bytes,
        files,
    })
}

fn copy_with_progress(
    mut body: Box<dyn Read>,
    out: &mut fs::File,
    total: Option<u64>,
    sink: &dyn ProgressSink,
) -> Result<u64, GdmError> {
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut downloaded = 0u64;
    sink.event(ProgressEvent::Transfer { downloaded, total });
    loop {
        let read = match body.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(GdmError::Http(err.to_string())),
        };
        out.write_all(&buffer[..read])
            .map_err(|err| GdmError::Filesystem(err.to_string()))?;
        downloaded += read as u64;
        sink.event(ProgressEvent::Transfer { downloaded, total });
    }
    sink.event(ProgressEvent::TransferDone);
    Ok(downloaded)
}

pub fn ensure_disk_space(dir: &Path, required: u64) -> Result<(), GdmError> {
    let Some(available) = available_space(dir) else {
        debug!(dir = %dir.display(), "free space unknown, skipping check");
        return Ok(());
    };
    if available < required {
        return Err(GdmError::InsufficientDiskSpace {
            path: dir.to_path_buf(),
            required,
            available,
        });
    }
    Ok(())
}

/// Free bytes on the volume holding `dir`, from the deepest matching mount.
pub fn available_space(dir: &Path) -> Option<u64> {
    let dir = fs::canonicalize(dir).ok()?;
    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter(|disk| dir.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())
        .map(|disk| disk.available_space())
}
