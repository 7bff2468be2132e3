//! Helper and partial registration
//!
//! Rust helpers are attached under a private global slot and registered
//! through the adapter shim, which prepends the render context (`this`) as
//! the first argument and replaces function-valued options with
//! [`FUNCTION_MARKER`](hbs_script::FUNCTION_MARKER). JavaScript helpers are
//! registered from source and keep `this` as the context.

use crate::dispatch::Arg;
use crate::{Engine, Result};
use hbs_script::{host_fn, HostFn, Scope, LOG_TARGET};
use serde_json::{Map, Value};

/// A helper implementation.
#[derive(Clone)]
pub enum Helper {
    /// Rust callable: `(scope, [context, ...params, options]) -> value`.
    Host(HostFn),
    /// JavaScript function source, e.g. `function (a, options) { ... }`.
    Script(String),
}

impl Helper {
    pub fn host<F>(function: F) -> Self
    where
        F: Fn(&Scope<'_, '_>, &[Value]) -> Result<Value> + 'static,
    {
        Helper::Host(host_fn(move |scope, args| Ok(function(scope, args)?)))
    }

    pub fn script(source: impl Into<String>) -> Self {
        Helper::Script(source.into())
    }
}

impl std::fmt::Debug for Helper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Helper::Host(_) => f.write_str("Helper::Host(..)"),
            Helper::Script(source) => f.debug_tuple("Helper::Script").field(source).finish(),
        }
    }
}

/// Block bodies a Rust block helper can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    /// `options.fn`
    Main,
    /// `options.inverse`, the `{{else}}` branch
    Inverse,
}

impl Block {
    fn key(self) -> &'static str {
        match self {
            Block::Main => "fn",
            Block::Inverse => "inverse",
        }
    }
}

/// Rendering support for Rust helpers.
pub trait HelperScope {
    /// Renders a block body of the innermost running Rust helper.
    fn block(&self, block: Block, context: &Value) -> Result<String>;
}

impl HelperScope for Scope<'_, '_> {
    fn block(&self, block: Block, context: &Value) -> Result<String> {
        match self.invoke("renderHelperBlock", &[Value::from(block.key()), context.clone()])? {
            Value::String(output) => Ok(output),
            Value::Null => Ok(String::new()),
            other => Ok(other.to_string()),
        }
    }
}

/// Private global holding the Rust callable for helper `name`.
pub(crate) fn helper_slot(name: &str) -> String {
    format!("__hbsHelper:{name}")
}

impl Engine {
    // ========================================================================
    // Helpers
    // ========================================================================

    /// Registers a helper available to every template of this engine.
    ///
    /// The last registration under a name wins.
    pub fn register_helper(&self, name: &str, helper: Helper) -> Result<()> {
        match helper {
            Helper::Host(callable) => {
                let slot = helper_slot(name);
                let runtime = self.runtime()?;
                tracing::debug!(target: LOG_TARGET, "attaching {slot}");
                runtime.attach(&slot, callable)?;
                self.call_direct(
                    "registerHostHelper",
                    &[Value::from(name), Value::from(slot)],
                )?;
            }
            Helper::Script(source) => {
                self.call_eval(
                    "registerScriptHelper",
                    &[Arg::literal(name), Arg::Source(source)],
                )?;
            }
        }
        Ok(())
    }

    pub fn register_helpers<I, S>(&self, helpers: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, Helper)>,
        S: AsRef<str>,
    {
        for (name, helper) in helpers {
            self.register_helper(name.as_ref(), helper)?;
        }
        Ok(())
    }

    pub fn unregister_helper(&self, name: &str) -> Result<()> {
        self.call_direct("unregisterHelper", &[Value::from(name)])?;
        self.release_helper_slot(name);
        Ok(())
    }

    fn release_helper_slot(&self, name: &str) {
        let Ok(runtime) = self.runtime() else {
            return;
        };
        if let Err(err) = runtime.release(&helper_slot(name)) {
            tracing::debug!(target: LOG_TARGET, "failed to release helper slot for {name}: {err}");
        }
    }

    // ========================================================================
    // Partials
    // ========================================================================

    pub fn register_partial(&self, name: &str, partial: &str) -> Result<()> {
        self.register_partials([(name, partial)])
    }

    /// Registers several partials with one call into the library.
    pub fn register_partials<I, K, V>(&self, partials: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let table: Map<String, Value> = partials
            .into_iter()
            .map(|(name, partial)| (name.into(), Value::String(partial.into())))
            .collect();
        self.call_direct("registerPartial", &[Value::Object(table)])?;
        Ok(())
    }

    pub fn unregister_partial(&self, name: &str) -> Result<()> {
        self.call_direct("unregisterPartial", &[Value::from(name)])?;
        Ok(())
    }
}
