use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "mandex";
const CONFIG_FILE: &str = "config.json";

/// Directory name of the search index inside the app data directory
pub const INDEX_DIR_NAME: &str = "index";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Number of parallel fetch workers while indexing.
    /// If 0, uses four workers per CPU core (fetching is mostly I/O)
    #[serde(default = "default_fetch_workers")]
    pub fetch_workers: usize,

    /// Documents per index commit
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Capacity of the queue between fetch workers and the committer
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Report indexing progress every N processed pages
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,

    /// Extra man directories searched after the defaults and $MANPATH
    #[serde(default)]
    pub man_paths: Vec<PathBuf>,

    /// Override for the index location
    #[serde(default)]
    pub index_dir: Option<PathBuf>,

    /// Number of formatted pages kept in memory by the browser
    #[serde(default = "default_page_cache_size")]
    pub page_cache_size: usize,
}

fn default_fetch_workers() -> usize {
    0 // 0 means 4x CPU count
}

fn default_batch_size() -> usize {
    100
}

fn default_queue_capacity() -> usize {
    100
}

fn default_progress_every() -> usize {
    100
}

fn default_page_cache_size() -> usize {
    32
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fetch_workers: default_fetch_workers(),
            batch_size: default_batch_size(),
            queue_capacity: default_queue_capacity(),
            progress_every: default_progress_every(),
            man_paths: Vec::new(),
            index_dir: None,
            page_cache_size: default_page_cache_size(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: AppConfig =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Get the effective worker count (resolves 0 to 4x CPU count)
    pub fn effective_fetch_workers(&self) -> usize {
        if self.fetch_workers == 0 {
            num_cpus() * 4
        } else {
            self.fetch_workers
        }
    }

    /// Resolve the index directory (configured override or the fixed default)
    pub fn index_path(&self) -> Result<PathBuf> {
        match &self.index_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(get_app_data_dir()?.join(INDEX_DIR_NAME)),
        }
    }
}

/// Get the number of CPUs available
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory holding the config, log and index
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Application Support"))
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}
