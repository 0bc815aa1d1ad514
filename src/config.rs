use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::GdmError;

pub const CONFIG_FILE: &str = "gdm.json";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub datasets_dir: Option<PathBuf>,
    #[serde(default)]
    pub bench_dir: Option<PathBuf>,
    #[serde(default)]
    pub check_disk_space: Option<bool>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default)]
    pub panel_width: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub datasets_dir: PathBuf,
    pub bench_dir: PathBuf,
    pub check_disk_space: bool,
    pub connect_timeout: Duration,
    pub panel_width: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        ConfigLoader::resolve_config(Config::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Explicit path first (must exist), then `./gdm.json`, then the user
    /// config directory. No file at all yields the defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Settings, GdmError> {
        let config_path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };

        let Some(config_path) = config_path else {
            return Ok(Settings::default());
        };

        let content =
            fs::read_to_string(&config_path).map_err(|_| GdmError::ConfigRead(config_path.clone()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|err| GdmError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> Settings {
        Settings {
            datasets_dir: config.datasets_dir.unwrap_or_else(|| PathBuf::from(".")),
            bench_dir: config.bench_dir.unwrap_or_else(|| PathBuf::from(".")),
            check_disk_space: config.check_disk_space.unwrap_or(true),
            connect_timeout: Duration::from_secs(config.http_timeout_secs.unwrap_or(30)),
            panel_width: config.panel_width,
        }
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }
        ProjectDirs::from("", "", "gdm")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
            .filter(|path| path.is_file())
    }
}
