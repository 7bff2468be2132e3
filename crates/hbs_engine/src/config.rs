//! Engine configuration

use crate::{Error, Result};
use hbs_script::RuntimeLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable consulted when neither `source` nor `path` is set.
pub const SOURCE_PATH_ENV: &str = "HANDLEBARS_JS_PATH";

/// Engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Defer creating the script runtime until the first call.
    pub lazy: bool,
    /// Handlebars.js file to load.
    pub path: Option<PathBuf>,
    /// Handlebars.js source text; takes precedence over `path`.
    pub source: Option<String>,
    #[serde(flatten)]
    pub limits: RuntimeLimits,
}

impl EngineConfig {
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn memory_limit(mut self, bytes: usize) -> Self {
        self.limits.memory_limit = Some(bytes);
        self
    }

    pub fn max_stack_size(mut self, bytes: usize) -> Self {
        self.limits.max_stack_size = Some(bytes);
        self
    }

    /// Resolves the library source as `(origin, text)`.
    ///
    /// Order: inline `source`, `path`, then [`SOURCE_PATH_ENV`].
    pub(crate) fn library_source(&self) -> Result<(String, String)> {
        if let Some(source) = &self.source {
            return Ok(("<inline handlebars>".to_string(), source.clone()));
        }
        if let Some(path) = &self.path {
            return read_source(path);
        }
        match std::env::var_os(SOURCE_PATH_ENV) {
            Some(path) => read_source(Path::new(&path)),
            None => Err(Error::MissingSource),
        }
    }
}

fn read_source(path: &Path) -> Result<(String, String)> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::ReadSource {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((path.display().to_string(), text))
}
