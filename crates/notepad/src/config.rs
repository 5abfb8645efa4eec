//! Persisted editor settings.
//!
//! Settings live in a small INI file with a single `[Settings]` section,
//! read and written with `configparser`. Anything that goes wrong while
//! reading or writing it is logged and the defaults are kept, so a broken
//! config never stops the editor.

use configparser::ini::Ini;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::try_exists;

pub const CONFIG_FILE_NAME: &str = "notepad_config.ini";
pub const SETTINGS_SECTION: &str = "Settings";
pub const AUTOSAVE_KEY: &str = "autosave";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Malformed(String),

    #[error("invalid boolean for '{key}': {value}")]
    InvalidBool { key: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    pub autosave: bool,
}

impl Settings {
    /// Load settings, falling back to defaults on any error.
    pub async fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path).await {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let exists = try_exists(path).await.map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if !exists {
            log::info!("Config file does not exist, using defaults: {}", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let settings = Self::from_ini(&parse_ini(&content)?)?;
        log::info!("Successfully loaded config from: {}", path.display());
        Ok(settings)
    }

    /// Write settings back, keeping any other sections already in the file.
    pub async fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let mut ini = match tokio::fs::read_to_string(path).await {
            Ok(content) => parse_ini(&content).unwrap_or_else(|e| {
                log::warn!("Overwriting unreadable config {}: {}", path.display(), e);
                Ini::new()
            }),
            Err(_) => Ini::new(),
        };
        ini.set(SETTINGS_SECTION, AUTOSAVE_KEY, Some(self.autosave.to_string()));

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| ConfigError::Write {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        tokio::fs::write(path, ini.writes())
            .await
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!("Successfully saved config to: {}", path.display());
        Ok(())
    }

    /// Read the `[Settings]` section. Lookups are case-insensitive and the
    /// usual configparser boolean spellings are accepted.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        match ini.getboolcoerce(SETTINGS_SECTION, AUTOSAVE_KEY) {
            Ok(Some(autosave)) => settings.autosave = autosave,
            Ok(None) => log::warn!(
                "Config has no [{}] {} entry, using default",
                SETTINGS_SECTION,
                AUTOSAVE_KEY
            ),
            Err(_) => {
                return Err(ConfigError::InvalidBool {
                    key: AUTOSAVE_KEY.to_string(),
                    value: ini.get(SETTINGS_SECTION, AUTOSAVE_KEY).unwrap_or_default(),
                })
            }
        }
        Ok(settings)
    }

    /// Resolve where the config file lives.
    ///
    /// `NOTEPAD_CONFIG_PATH` names the file directly, `NOTEPAD_CONFIG_DIR`
    /// names its directory, otherwise the platform config directory is used.
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("NOTEPAD_CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }

        if let Ok(dir) = std::env::var("NOTEPAD_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join(CONFIG_FILE_NAME));
        }

        ProjectDirs::from("com", "notepad", "notepad")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

pub fn parse_ini(text: &str) -> Result<Ini, ConfigError> {
    let mut ini = Ini::new();
    ini.read(text.to_string()).map_err(ConfigError::Malformed)?;
    Ok(ini)
}
