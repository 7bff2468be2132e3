use hbs_script::ScriptError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the engine.
///
/// Script-side exceptions (including unresolved helpers and partials) arrive
/// as [`Error::Script`] carrying the exception message.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no Handlebars source configured; set `source`, `path` or HANDLEBARS_JS_PATH")]
    MissingSource,

    #[error("failed to read Handlebars source from {}: {source}", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("engine initialization failed: {0}")]
    Init(#[source] ScriptError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("script function '{name}' outlived its engine")]
    Released { name: String },

    #[error("{operation} returned an unexpected value: {value}")]
    UnexpectedValue {
        operation: &'static str,
        value: serde_json::Value,
    },

    #[error("failed to encode call arguments: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("no entropy for generated names: {0}")]
    Entropy(String),

    /// Raised by Rust helpers and hooks.
    #[error("{0}")]
    Helper(String),
}

impl Error {
    pub fn helper(message: impl Into<String>) -> Self {
        Error::Helper(message.into())
    }

    /// Message of the script exception behind this error, if any.
    pub fn script_message(&self) -> Option<&str> {
        match self {
            Error::Script(ScriptError::Runtime { message }) => Some(message),
            _ => None,
        }
    }
}

impl From<Error> for ScriptError {
    fn from(err: Error) -> Self {
        match err {
            Error::Script(inner) => inner,
            other => ScriptError::host(other.to_string()),
        }
    }
}
