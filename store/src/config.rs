//! Configuration for the rosterhub store
//!
//! Handles data directory configuration with the following precedence:
//! 1. An explicit directory (e.g. the CLI's `--data-dir`)
//! 2. ROSTERHUB_DATA_DIR environment variable
//! 3. ~/.config/rosterhub/data (production default)
//! 4. ./data (fallback for development)

use std::ffi::OsString;
use std::path::PathBuf;

const DATA_DIR_ENV: &str = "ROSTERHUB_DATA_DIR";
const DEFAULT_CONFIG_DIR: &str = ".config/rosterhub/data";
const DEV_DATA_DIR: &str = "./data";

/// Data directory from the process environment. Empty variables count as unset.
pub fn get_data_dir() -> PathBuf {
    data_dir_from(std::env::var_os(DATA_DIR_ENV), std::env::var_os("HOME"))
}

fn data_dir_from(override_dir: Option<OsString>, home: Option<OsString>) -> PathBuf {
    match (override_dir, home) {
        (Some(dir), _) if !dir.is_empty() => PathBuf::from(dir),
        (_, Some(home)) if !home.is_empty() => PathBuf::from(home).join(DEFAULT_CONFIG_DIR),
        _ => PathBuf::from(DEV_DATA_DIR),
    }
}

/// Settings needed to open a [`Storage`](crate::Storage).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolve the data directory from the environment.
    pub fn from_env() -> Self {
        Self::new(get_data_dir())
    }

    /// Use `dir` if given, otherwise fall back to [`from_env`](Self::from_env).
    pub fn resolve(dir: Option<PathBuf>) -> Self {
        dir.map(Self::new).unwrap_or_else(Self::from_env)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
