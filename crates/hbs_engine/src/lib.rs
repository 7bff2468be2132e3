//! Handlebars engine
//!
//! Runs the Handlebars.js library inside an embedded QuickJS runtime and
//! exposes its API to Rust:
//! - Compilation (`compile`, `precompile`, `template`) returning
//!   [`FunctionProxy`] renderers
//! - Helper and partial registration, with Rust or JavaScript helpers
//! - Hooks for missing helpers and missing partials
//!
//! ```ignore
//! use hbs_engine::{Engine, EngineConfig};
//! use serde_json::json;
//!
//! let engine = Engine::new(EngineConfig::default().path("handlebars.js"))?;
//! let renderer = engine.compile("Hello, {{name}}!")?;
//! assert_eq!(renderer.render(&json!({ "name": "Zach" }))?, "Hello, Zach!");
//! ```

pub mod config;
mod dispatch;
pub mod engine;
pub mod error;
pub mod function;
pub mod hooks;
pub mod registry;

pub use config::{EngineConfig, SOURCE_PATH_ENV};
pub use engine::Engine;
pub use error::{Error, Result};
pub use function::{FunctionProxy, Renderer};
pub use hooks::HelperMissing;
pub use registry::{Block, Helper, HelperScope};

pub use hbs_script::{Scope, ScriptError, FUNCTION_MARKER};
pub use serde_json::{json, Value};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
