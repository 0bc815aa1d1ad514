//! Graph dataset manager and benchmark harness.
//!
//! Datasets live in subdirectories of a root folder, each described by an
//! `info.yaml` manifest. The library lists, downloads, cleans and converts
//! them, and drives an external BFS/SSSP binary to collect timings.

pub mod app;
pub mod bench;
pub mod catalog;
pub mod cleaner;
pub mod config;
pub mod converter;
pub mod domain;
pub mod drive;
pub mod error;
pub mod fetch;
pub mod fs_util;
pub mod manifest;
pub mod output;
pub mod plot;
pub mod printer;
pub mod process;
pub mod report;
