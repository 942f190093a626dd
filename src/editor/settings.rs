//! Settings persistence
//!
//! The editor remembers one thing between runs: the last file that was
//! opened. It is stored as JSON so the file stays easy to edit by hand.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::{Error, Result};

/// Overrides the settings directory
pub const HOME_ENV_VAR: &str = "OMLED_HOME";
const SETTINGS_FILE: &str = "settings.json";

/// Persisted settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_file: Option<PathBuf>,
}

/// Reads and writes [`Settings`] at a fixed path
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$OMLED_HOME/settings.json`, else `$HOME/.omled/settings.json`, else
    /// under the temporary directory.
    pub fn default_location() -> Self {
        let dir = env::var_os(HOME_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".omled")))
            .unwrap_or_else(|| env::temp_dir().join("omled"));
        Self::new(dir.join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as default settings
    pub fn load(&self) -> Result<Settings> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(source) => Err(Error::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let text = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, text).map_err(|source| Error::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn last_file(&self) -> Result<Option<PathBuf>> {
        Ok(self.load()?.last_file)
    }

    pub fn remember_file(&self, path: &Path) -> Result<()> {
        let mut settings = self.load().unwrap_or_else(|e| {
            log::warn!("discarding unreadable settings: {}", e);
            Settings::default()
        });
        settings.last_file = Some(path.to_path_buf());
        self.save(&settings)
    }
}
