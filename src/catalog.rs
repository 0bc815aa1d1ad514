use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::{Filter, OrderBy};
use crate::error::GdmError;
use crate::manifest::{MANIFEST_FILE, Manifest};

/// Dataset manifests found under a root directory, keyed by declared name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    root: PathBuf,
    manifests: HashMap<String, Manifest>,
}

impl Catalog {
    pub fn load(root: &Path) -> Result<Self, GdmError> {
        let root = fs::canonicalize(root)
            .map_err(|err| GdmError::Filesystem(format!("{}: {err}", root.display())))?;
        let entries = fs::read_dir(&root)
            .map_err(|err| GdmError::Filesystem(format!("{}: {err}", root.display())))?;

        let mut manifests = HashMap::new();
        for entry in entries {
            let entry = entry.map_err(|err| GdmError::Filesystem(err.to_string()))?;
            let dir = entry.path();
            if !dir.is_dir() || is_ignored(&dir) {
                continue;
            }
            let manifest_path = dir.join(MANIFEST_FILE);
            if !manifest_path.is_file() {
                continue;
            }
            let mut manifest = Manifest::load(&manifest_path)?;
            manifest.folder = dir;
            debug!(name = %manifest.name, folder = %manifest.folder.display(), "loaded manifest");
            if let Some(previous) = manifests.insert(manifest.name.clone(), manifest) {
                warn!(
                    name = %previous.name,
                    folder = %previous.folder.display(),
                    "duplicate dataset name, keeping the last one read"
                );
            }
        }

        Ok(Self { root, manifests })
    }

    pub fn from_manifests(root: PathBuf, manifests: impl IntoIterator<Item = Manifest>) -> Self {
        Self {
            root,
            manifests: manifests
                .into_iter()
                .map(|manifest| (manifest.name.clone(), manifest))
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    pub fn get(&self, name: &str) -> Result<&Manifest, GdmError> {
        self.manifests
            .get(name)
            .ok_or_else(|| GdmError::DatasetNotFound(name.to_string()))
    }

    /// All names sorted alphabetically.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.manifests.keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolves either every dataset or the requested ones. Unknown names
    /// fail before any dataset is returned.
    pub fn select(&self, all: bool, names: &[String]) -> Result<Vec<&Manifest>, GdmError> {
        if all {
            return Ok(self.sorted(OrderBy::Name, false));
        }
        names.iter().map(|name| self.get(name)).collect()
    }

    pub fn sorted(&self, order_by: OrderBy, desc: bool) -> Vec<&Manifest> {
        let mut items: Vec<&Manifest> = self.manifests.values().collect();
        // Deterministic base order before the stable sort.
        items.sort_by(|a, b| a.name.cmp(&b.name));
        sort_manifests(&mut items, order_by, desc);
        items
    }

    pub fn list(&self, order_by: OrderBy, desc: bool, filters: &[Filter]) -> Vec<&Manifest> {
        filter_manifests(self.sorted(order_by, desc), filters)
    }
}

/// Stable sort; `desc` flips the comparison so ties keep their order.
pub fn sort_manifests(items: &mut [&Manifest], order_by: OrderBy, desc: bool) {
    if desc {
        items.sort_by(|a, b| b.compare_by(a, order_by));
    } else {
        items.sort_by(|a, b| a.compare_by(b, order_by));
    }
}

pub fn filter_manifests<'a>(items: Vec<&'a Manifest>, filters: &[Filter]) -> Vec<&'a Manifest> {
    filters.iter().fold(items, |items, filter| {
        items
            .into_iter()
            .filter(|manifest| manifest.matches(filter))
            .collect()
    })
}

fn is_ignored(dir: &Path) -> bool {
    dir.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.') || name.starts_with('_'))
        .unwrap_or(true)
}
