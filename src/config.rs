//! Configuration loaded from `sqlsheet.toml`.
//!
//! ```toml
//! placeholder = "sqlite"
//! docstring = "Undocumented."
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{SheetError, SheetResult};
use crate::query::DEFAULT_DOCSTRING;
use crate::transpiler::Placeholder;

/// Project-local config file name.
pub const CONFIG_FILE: &str = "sqlsheet.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Placeholder dialect for rendered SQL.
    pub placeholder: Placeholder,
    /// Docstring for definitions without doc lines.
    pub docstring: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            placeholder: Placeholder::default(),
            docstring: DEFAULT_DOCSTRING.to_string(),
        }
    }
}

impl SheetConfig {
    /// Parse config from a TOML string.
    pub fn from_toml(content: &str) -> SheetResult<Self> {
        toml::from_str(content).map_err(|e| SheetError::Config(e.to_string()))
    }

    /// Load from `path`, or from the first discovered file, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> SheetResult<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };

        match path {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                let content = fs::read_to_string(&path)?;
                Self::from_toml(&content)
            }
            None => Ok(Self::default()),
        }
    }

    /// `./sqlsheet.toml`, then `<config dir>/sqlsheet/config.toml`.
    pub fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("sqlsheet").join("config.toml"))
            .filter(|path| path.is_file())
    }
}
