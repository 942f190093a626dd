//! Locating the OML interpreter executable
#![allow(dead_code)]

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::utils::{Error, Result};

/// Environment variable consulted when no explicit path is configured
pub const DEFAULT_ENV_VAR: &str = "OML_INTERPRETER";

#[cfg(windows)]
const EXECUTABLE_NAMES: &[&str] = &["OML.exe", "oml.exe"];
#[cfg(not(windows))]
const EXECUTABLE_NAMES: &[&str] = &["OML", "oml"];

/// An interpreter ready to be launched
///
/// When the interpreter was extracted from an image, the temporary
/// file lives as long as this value.
#[derive(Debug)]
pub struct Executable {
    path: PathBuf,
    _extracted: Option<TempPath>,
}

impl Executable {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Where to look for the interpreter, in order: explicit path, environment
/// variable, interpreter image, `PATH`.
#[derive(Debug, Clone)]
pub struct InterpreterLocator {
    explicit: Option<PathBuf>,
    env_var: Option<String>,
    /// Copied out before it can run; may not be executable where it lives
    image: Option<PathBuf>,
    search_path: bool,
}

impl InterpreterLocator {
    pub fn new() -> Self {
        Self {
            explicit: None,
            env_var: Some(DEFAULT_ENV_VAR.to_string()),
            image: None,
            search_path: true,
        }
    }

    /// Always use this executable
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    pub fn with_env_var(mut self, name: Option<String>) -> Self {
        self.env_var = name;
        self
    }

    /// Interpreter image read from disk and extracted before each launch
    pub fn with_image_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.image = Some(path.into());
        self
    }

    pub fn with_path_search(mut self, enabled: bool) -> Self {
        self.search_path = enabled;
        self
    }

    pub fn locate(&self) -> Result<Executable> {
        if let Some(path) = &self.explicit {
            return existing(path);
        }

        if let Some(var) = &self.env_var {
            if let Some(value) = env::var_os(var).filter(|v| !v.is_empty()) {
                log::debug!("interpreter from ${}", var);
                return existing(Path::new(&value));
            }
        }

        if let Some(path) = &self.image {
            let bytes = fs::read(path).map_err(Error::Extraction)?;
            log::debug!("interpreter image {} ({} bytes)", path.display(), bytes.len());
            return extract(&bytes);
        }

        if self.search_path {
            if let Some(path) = search_path() {
                return Ok(Executable {
                    path,
                    _extracted: None,
                });
            }
        }

        Err(Error::InterpreterNotFound(EXECUTABLE_NAMES.join(" / ")))
    }
}

impl Default for InterpreterLocator {
    fn default() -> Self {
        Self::new()
    }
}

fn existing(path: &Path) -> Result<Executable> {
    if path.is_file() {
        Ok(Executable {
            path: path.to_path_buf(),
            _extracted: None,
        })
    } else {
        Err(Error::InterpreterNotFound(path.display().to_string()))
    }
}

fn search_path() -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .flat_map(|dir| EXECUTABLE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

/// Write an interpreter image to an executable temporary file
fn extract(image: &[u8]) -> Result<Executable> {
    let suffix = if cfg!(windows) { ".exe" } else { "" };
    let mut file = tempfile::Builder::new()
        .prefix("oml_exec")
        .suffix(suffix)
        .tempfile()
        .map_err(Error::Extraction)?;
    file.write_all(image).map_err(Error::Extraction)?;
    file.flush().map_err(Error::Extraction)?;

    // Close the handle before anyone executes the file
    let path = file.into_temp_path();
    make_executable(&path)?;
    log::info!("extracted interpreter to {}", path.display());

    Ok(Executable {
        path: path.to_path_buf(),
        _extracted: Some(path),
    })
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path).map_err(Error::Extraction)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).map_err(Error::Extraction)
}

#[cfg(not(unix))]
fn make_executable(path: &Path) -> Result<()> {
    fs::metadata(path).map(|_| ()).map_err(Error::Extraction)
}
