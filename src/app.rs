use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::cleaner::{self, CleanMode};
use crate::config::Settings;
use crate::converter::{self, Conversion, ConvertOptions};
use crate::domain::{Filter, OrderBy};
use crate::error::GdmError;
use crate::fetch::{self, ArchiveClient, FetchOptions, FetchOutcome};
use crate::manifest::Manifest;
use crate::process::{CommandRunner, Confirm};

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Message(String),
    Transfer { downloaded: u64, total: Option<u64> },
    TransferDone,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    pub name: String,
    pub date: String,
    pub nodes: u64,
    pub edges: u64,
    pub folder: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub datasets: Vec<ListEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<FetchOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadResult {
    pub items: Vec<DownloadItem>,
}

impl DownloadResult {
    pub fn failures(&self) -> usize {
        self.items.iter().filter(|item| item.error.is_some()).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanItem {
    pub name: String,
    pub removed: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanResult {
    pub mode: CleanMode,
    pub items: Vec<CleanItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertItem {
    pub name: String,
    pub conversion: Conversion,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertResult {
    pub items: Vec<ConvertItem>,
}

/// Dataset commands over one catalog.
pub struct App<C: ArchiveClient> {
    catalog: Catalog,
    client: C,
    settings: Settings,
}

impl<C: ArchiveClient> App<C> {
    pub fn new(catalog: Catalog, client: C, settings: Settings) -> Self {
        Self {
            catalog,
            client,
            settings,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn list(&self, order_by: OrderBy, desc: bool, filters: &[Filter]) -> ListResult {
        let datasets = self
            .catalog
            .list(order_by, desc, filters)
            .into_iter()
            .map(|manifest| ListEntry {
                name: manifest.name.clone(),
                date: manifest.metadata.date.clone(),
                nodes: manifest.structure.nodes,
                edges: manifest.structure.edges,
                folder: manifest.folder.clone(),
            })
            .collect();
        ListResult { datasets }
    }

    pub fn info(&self, name: &str) -> Result<&Manifest, GdmError> {
        self.catalog.get(name)
    }

    /// Fetches each selected dataset. A failure is logged and recorded for
    /// that dataset only; the remaining ones are still attempted.
    pub fn download(
        &self,
        all: bool,
        names: &[String],
        sink: &dyn ProgressSink,
    ) -> Result<DownloadResult, GdmError> {
        let selected = self.catalog.select(all, names)?;
        let options = FetchOptions {
            check_disk_space: self.settings.check_disk_space,
        };

        let mut items = Vec::with_capacity(selected.len());
        for manifest in selected {
            let result = fetch::fetch_dataset(
                &self.client,
                &manifest.name,
                &manifest.url,
                &manifest.folder,
                options,
                sink,
            );
            let item = match result {
                Ok(outcome) => DownloadItem {
                    name: manifest.name.clone(),
                    outcome: Some(outcome),
                    error: None,
                },
                Err(err) => {
                    error!(name = %manifest.name, "{err}");
                    DownloadItem {
                        name: manifest.name.clone(),
                        outcome: None,
                        error: Some(err.to_string()),
                    }
                }
            };
            items.push(item);
        }
        Ok(DownloadResult { items })
    }

    pub fn clean(
        &self,
        all: bool,
        names: &[String],
        mode: CleanMode,
        sink: &dyn ProgressSink,
    ) -> Result<CleanResult, GdmError> {
        let selected = self.catalog.select(all, names)?;
        let items = selected
            .into_iter()
            .map(|manifest| {
                sink.event(ProgressEvent::Message(format!("cleaning {}", manifest.name)));
                let report = cleaner::clean_dataset(&manifest.folder, mode);
                info!(name = %manifest.name, removed = report.removed.len(), "cleaned");
                CleanItem {
                    name: manifest.name.clone(),
                    removed: report.removed.len(),
                    errors: report.errors,
                }
            })
            .collect();
        Ok(CleanResult { mode, items })
    }

    /// Converts the selected datasets; the first converter failure aborts.
    pub fn convert(
        &self,
        runner: &dyn CommandRunner,
        confirm: &dyn Confirm,
        converter_path: &Path,
        all: bool,
        names: &[String],
        options: ConvertOptions,
    ) -> Result<ConvertResult, GdmError> {
        let selected = self.catalog.select(all, names)?;

        let mut items = Vec::with_capacity(selected.len());
        for manifest in selected {
            let conversion = converter::convert_dataset(
                runner,
                confirm,
                converter_path,
                &manifest.folder,
                options,
            )?;
            if let Conversion::Declined { .. } = conversion {
                warn!(name = %manifest.name, "conversion skipped");
            }
            items.push(ConvertItem {
                name: manifest.name.clone(),
                conversion,
            });
        }
        Ok(ConvertResult { items })
    }
}
