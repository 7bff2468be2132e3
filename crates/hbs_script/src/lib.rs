//! Script runtime handle
//!
//! JavaScript execution via QuickJS, shaped for driving a script library from
//! Rust code.
//!
//! ## Architecture
//!
//! - **Runtime:** one [`ScriptRuntime`] owns one isolated QuickJS context.
//!   Every entry is sequential; nested calls from Rust callbacks go through a
//!   [`Scope`] instead of re-entering the runtime.
//! - **Marshalling:** only JSON-shaped values cross the boundary
//!   ([`serde_json::Value`]). Functions flowing back to Rust become the
//!   [`FUNCTION_MARKER`] string.
//! - **Globals:** callables are attached, invoked and captured by global name,
//!   so Rust never holds raw JS heap references.

pub mod error;
pub mod marshal;
pub mod runtime;
pub mod scope;

pub use error::ScriptError;
pub use marshal::FUNCTION_MARKER;
pub use runtime::{RuntimeLimits, ScriptRuntime};
pub use scope::{host_fn, Capture, HostFn, Scope};

pub use rquickjs;

/// `tracing` target shared by the bridge crates.
pub const LOG_TARGET: &str = "handlebars";
