pub mod pager;

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

pub use pager::{normalize_attribute, PagerConfig, PagerOptions, UrlParams};

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub max_results: Option<usize>,
    pub entries: Option<usize>,
    #[serde(alias = "visible")]
    pub total_visible_numbers: Option<usize>,
    pub by_date: Option<String>,
    pub label: Option<String>,
    pub query: Option<String>,
    pub check_for_updates: Option<bool>,
    #[serde(alias = "enable_interactive_ellipsis")]
    pub interactive_ellipsis: Option<bool>,
    pub number_class: Option<String>,
    pub dots_class: Option<String>,
    pub active_class: Option<String>,
    pub cache: Option<String>,
    pub no_cache: Option<bool>,
    pub format: Option<String>,
    pub timeout: Option<u64>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".numeric-pager").join("config.yml"))
}

pub fn default_cache_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".numeric-pager").join("cache.json"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_yaml::from_str::<ConfigFile>(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}
