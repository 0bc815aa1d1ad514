use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GdmError {
    #[error("invalid graph specification: {0}")]
    #[diagnostic(help("expected path.(mtx|bin) with an optional [source:orientation] suffix"))]
    InvalidGraphSpec(String),

    #[error("invalid filter expression: {0}")]
    #[diagnostic(help("expected field<op>value with op one of = != < > <= >="))]
    InvalidFilter(String),

    #[error("invalid manifest {path}: {message}")]
    InvalidManifest { path: PathBuf, message: String },

    #[error("dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("download failed: {0}")]
    Http(String),

    #[error("server returned status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("unsupported archive format: {0}")]
    UnsupportedArchive(PathBuf),

    #[error("failed to extract archive {path}: {message}")]
    Archive { path: PathBuf, message: String },

    #[error("not enough disk space in {path}: {required} bytes required, {available} available")]
    InsufficientDiskSpace {
        path: PathBuf,
        required: u64,
        available: u64,
    },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to start {program}: {message}")]
    Spawn { program: PathBuf, message: String },

    #[error("converter exited with status {status:?}\n{output}")]
    Conversion { status: Option<i32>, output: String },

    #[error("benchmark exited with status {status:?}\n{output}")]
    BenchmarkFailed { status: Option<i32>, output: String },

    #[error("csv error: {0}")]
    Csv(String),

    #[error("plot error: {0}")]
    Plot(String),

    #[error("unsupported plot format: {0}")]
    UnsupportedPlotFormat(PathBuf),
}
