//! `omled.toml` configuration
//!
//! ```toml
//! [interpreter]
//! path = "/opt/oml/bin/OML"
//! env_var = "OML_INTERPRETER"
//! image = "/opt/oml/share/OML.bin"
//! search_path = true
//!
//! [highlight]
//! multiline_strings = false
//!
//! [keywords]
//! reserved = ["dokud"]
//! types = []
//! functions = ["nacti"]
//! ```
//!
//! Every table and key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::bridge::interpreter::DEFAULT_ENV_VAR;
use crate::bridge::InterpreterLocator;
use crate::syntax::{HighlightOptions, KeywordTable, TokenKind};
use crate::utils::{Error, Result};

/// Looked up in the working directory when no `--config` is given
pub const CONFIG_FILE_NAME: &str = "omled.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub interpreter: InterpreterConfig,
    pub highlight: HighlightConfig,
    pub keywords: KeywordConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterpreterConfig {
    pub path: Option<PathBuf>,
    /// Empty string disables the lookup
    pub env_var: String,
    /// Interpreter copied to an executable temporary file before each run
    pub image: Option<PathBuf>,
    pub search_path: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            path: None,
            env_var: DEFAULT_ENV_VAR.to_string(),
            image: None,
            search_path: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HighlightConfig {
    pub multiline_strings: bool,
}

/// Words added on top of the built-in OML vocabulary
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeywordConfig {
    pub reserved: Vec<String>,
    pub types: Vec<String>,
    pub functions: Vec<String>,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded config from {}", path.display());
        Self::parse(&text)
    }

    /// An explicit path must exist; otherwise `omled.toml` in the working
    /// directory is used if present, else the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.is_file() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn locator(&self) -> InterpreterLocator {
        let env_var = Some(self.interpreter.env_var.clone()).filter(|v| !v.is_empty());
        let mut locator = InterpreterLocator::new()
            .with_env_var(env_var)
            .with_path_search(self.interpreter.search_path);
        if let Some(path) = &self.interpreter.path {
            locator = locator.with_path(path);
        }
        if let Some(image) = &self.interpreter.image {
            locator = locator.with_image_file(image);
        }
        locator
    }

    pub fn keyword_table(&self) -> KeywordTable {
        let mut table = KeywordTable::oml();
        table.extend(&self.keywords.reserved, TokenKind::ReservedWord);
        table.extend(&self.keywords.types, TokenKind::DataType);
        table.extend(&self.keywords.functions, TokenKind::Function);
        table
    }

    pub fn highlight_options(&self) -> HighlightOptions {
        HighlightOptions {
            multiline_strings: self.highlight.multiline_strings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.interpreter.env_var, "OML_INTERPRETER");
        assert!(config.interpreter.search_path);
        assert!(!config.highlight.multiline_strings);
        assert_eq!(config.keyword_table().len(), 14);
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
            [interpreter]
            path = "/opt/oml/OML"
            env_var = ""

            [highlight]
            multiline_strings = true

            [keywords]
            reserved = ["dokud"]
            functions = ["nacti"]
            "#,
        )
        .unwrap();

        assert_eq!(config.interpreter.path.as_deref(), Some(Path::new("/opt/oml/OML")));
        assert!(config.highlight_options().multiline_strings);

        let table = config.keyword_table();
        assert_eq!(table.classify("dokud"), TokenKind::ReservedWord);
        assert_eq!(table.classify("nacti"), TokenKind::Function);
        assert_eq!(table.classify("funk"), TokenKind::ReservedWord);
    }

    #[test]
    fn test_interpreter_image_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("OML.bin");
        fs::write(&image, b"OML image").unwrap();

        let config = Config::parse(&format!(
            "[interpreter]\nimage = {:?}\nenv_var = \"\"\nsearch_path = false\n",
            image.display().to_string()
        ))
        .unwrap();
        assert_eq!(config.interpreter.image.as_deref(), Some(image.as_path()));

        let executable = config.locator().locate().unwrap();
        assert_ne!(executable.path(), image.as_path());
        assert_eq!(fs::read(executable.path()).unwrap(), b"OML image");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(executable.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn test_explicit_path_beats_image() {
        let interpreter = tempfile::NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.interpreter.path = Some(interpreter.path().to_path_buf());
        config.interpreter.image = Some(PathBuf::from("/no/such/image"));

        let executable = config.locator().locate().unwrap();
        assert_eq!(executable.path(), interpreter.path());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = Config::parse("[interpreter]\npaht = \"x\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_explicit_config() {
        let err = Config::discover(Some(Path::new("/no/such/omled.toml"))).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
