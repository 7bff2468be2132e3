use rquickjs::CaughtError;
use thiserror::Error;

/// Errors raised by the script runtime handle.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("quickjs: {0}")]
    Js(#[from] rquickjs::Error),

    #[error("failed to load {origin}: {message}")]
    Load { origin: String, message: String },

    /// A script-side exception, carrying the exception message.
    #[error("{message}")]
    Runtime { message: String },

    #[error("script runtime is already running; nested calls must use the callback scope")]
    Reentrant,

    #[error("global '{name}' is not a function")]
    NotAFunction { name: String },

    #[error("cannot marshal value: {message}")]
    Marshal { message: String },

    /// Failure reported by a Rust callable attached to the runtime.
    #[error("{message}")]
    Host { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScriptError {
    pub fn host(message: impl Into<String>) -> Self {
        ScriptError::Host {
            message: message.into(),
        }
    }

    pub(crate) fn from_caught(caught: CaughtError<'_>) -> Self {
        match caught {
            CaughtError::Error(err) => ScriptError::Js(err),
            CaughtError::Exception(exception) => ScriptError::Runtime {
                message: exception
                    .message()
                    .unwrap_or_else(|| "uncaught exception".to_string()),
            },
            CaughtError::Value(value) => ScriptError::Runtime {
                message: crate::marshal::display(&value),
            },
        }
    }
}
