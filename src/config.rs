//! Configuration management.
//!
//! Settings come from `config.toml` in the data directory, with
//! `NEWSVAULT_*` environment variables taking precedence. Everything has
//! a default so `newsvault init && newsvault serve` works out of the box.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default server bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:3030";

/// Runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub bind: String,
}

/// On-disk config file shape. All fields optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    bind: Option<String>,
}

impl Settings {
    /// Path to the SQLite database.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("newsvault.db")
    }

    /// Create the data directory and database file.
    pub fn init(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

/// Resolve settings from an optional CLI override, environment, config
/// file, and defaults, in that order.
pub fn load_settings(data_dir_override: Option<&Path>) -> anyhow::Result<Settings> {
    let data_dir = match data_dir_override {
        Some(dir) => dir.to_path_buf(),
        None => match std::env::var_os("NEWSVAULT_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir(),
        },
    };

    let file = read_config_file(&data_dir.join("config.toml"));

    let bind = std::env::var("NEWSVAULT_BIND")
        .ok()
        .or(file.bind)
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    Ok(Settings { data_dir, bind })
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newsvault")
}

fn read_config_file(path: &Path) -> ConfigFile {
    let Ok(raw) = fs::read_to_string(path) else {
        return ConfigFile::default();
    };
    match toml::from_str(&raw) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            ConfigFile::default()
        }
    }
}
