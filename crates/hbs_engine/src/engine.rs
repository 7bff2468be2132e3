//! The engine facade

use crate::dispatch::{Arg, Captured};
use crate::{EngineConfig, Error, FunctionProxy, Result};
use hbs_script::{host_fn, Scope, ScriptRuntime, LOG_TARGET};
use once_cell::unsync::OnceCell;
use serde_json::Value;
use std::rc::Rc;

/// Adapter shim loaded after the Handlebars library.
const ADAPTER_SOURCE: &str = include_str!("../js/adapter.js");

/// One Handlebars environment backed by its own script runtime.
///
/// The runtime is created on first use (or in [`Engine::new`] unless
/// [`EngineConfig::lazy`] is set) and lives as long as the engine.
///
/// Engines are single threaded. Separate engines share nothing and can run
/// on separate threads. Rust helpers must not call back into their engine;
/// they get a [`Scope`] for nested calls.
pub struct Engine {
    config: EngineConfig,
    runtime: OnceCell<Rc<ScriptRuntime>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let engine = Self {
            config,
            runtime: OnceCell::new(),
        };
        if !engine.config.lazy {
            engine.init()?;
        }
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.runtime.get().is_some()
    }

    /// Creates the runtime and loads the library. Idempotent.
    pub fn init(&self) -> Result<()> {
        self.runtime().map(|_| ())
    }

    pub(crate) fn runtime(&self) -> Result<&Rc<ScriptRuntime>> {
        self.runtime.get_or_try_init(|| self.boot())
    }

    fn boot(&self) -> Result<Rc<ScriptRuntime>> {
        tracing::debug!(target: LOG_TARGET, "initializing");

        let (origin, source) = self.config.library_source()?;
        let runtime = ScriptRuntime::with_limits(self.config.limits).map_err(Error::Init)?;
        runtime.load(&origin, &source).map_err(Error::Init)?;
        runtime
            .load("adapter.js", ADAPTER_SOURCE)
            .map_err(Error::Init)?;

        tracing::debug!(target: LOG_TARGET, "initialized");
        Ok(Rc::new(runtime))
    }

    // ========================================================================
    // Compilation
    // ========================================================================

    /// Compiles a template into a renderer.
    pub fn compile(&self, template: &str) -> Result<FunctionProxy> {
        self.compile_call("compile", &[Arg::literal(template)])
    }

    /// Compiles a template with Handlebars compile options.
    pub fn compile_with(&self, template: &str, options: &Value) -> Result<FunctionProxy> {
        self.compile_call(
            "compile",
            &[Arg::literal(template), Arg::Literal(options.clone())],
        )
    }

    /// Precompiles a template into a template spec string.
    pub fn precompile(&self, template: &str) -> Result<String> {
        self.precompile_call(&[Arg::literal(template)])
    }

    pub fn precompile_with(&self, template: &str, options: &Value) -> Result<String> {
        self.precompile_call(&[Arg::literal(template), Arg::Literal(options.clone())])
    }

    /// Sets up a renderer from a spec produced by [`Engine::precompile`].
    pub fn template(&self, spec: &str) -> Result<FunctionProxy> {
        self.compile_call("template", &[Arg::literal(spec)])
    }

    fn compile_call(&self, function: &'static str, args: &[Arg]) -> Result<FunctionProxy> {
        match self.call_capture(function, args)? {
            Captured::Function(proxy) => Ok(proxy),
            Captured::Value(value) => Err(Error::UnexpectedValue {
                operation: function,
                value,
            }),
        }
    }

    fn precompile_call(&self, args: &[Arg]) -> Result<String> {
        match self.call_capture("precompile", args)? {
            Captured::Value(Value::String(spec)) => Ok(spec),
            Captured::Value(value) => Err(Error::UnexpectedValue {
                operation: "precompile",
                value,
            }),
            Captured::Function(proxy) => Err(Error::UnexpectedValue {
                operation: "precompile",
                value: Value::String(proxy.name().to_string()),
            }),
        }
    }

    // ========================================================================
    // Miscellaneous
    // ========================================================================

    /// Version of the loaded Handlebars library.
    pub fn version(&self) -> Result<String> {
        match self.evaluate("VERSION")? {
            Value::String(version) => Ok(version),
            value => Err(Error::UnexpectedValue {
                operation: "version",
                value,
            }),
        }
    }

    /// Evaluates JavaScript in the engine's context.
    pub fn evaluate(&self, code: &str) -> Result<Value> {
        let runtime = self.runtime()?;
        tracing::debug!(target: LOG_TARGET, "evaluating {code}");
        Ok(runtime.evaluate(code)?)
    }

    /// Exposes a Rust function to JavaScript as the global `name`, for use
    /// from JavaScript helpers.
    pub fn attach<F>(&self, name: &str, function: F) -> Result<()>
    where
        F: Fn(&Scope<'_, '_>, &[Value]) -> Result<Value> + 'static,
    {
        let runtime = self.runtime()?;
        tracing::debug!(target: LOG_TARGET, "attaching {name}");
        let callable = host_fn(move |scope, args| Ok(function(scope, args)?));
        Ok(runtime.attach(name, callable)?)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
