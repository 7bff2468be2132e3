//! Script runtime management
//!
//! Provides one isolated JavaScript context and the primitive operations the
//! bridge is built on: load, evaluate, attach, invoke, capture and release.

use crate::scope::{install_console, Capture, HostFn, Scope};
use crate::{ScriptError, LOG_TARGET};
use rquickjs::{Context, Runtime};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::cell::{Cell, RefCell};
use std::path::Path;

/// Resource limits applied to the QuickJS runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeLimits {
    /// Heap limit in bytes.
    pub memory_limit: Option<usize>,
    /// Native stack limit in bytes.
    pub max_stack_size: Option<usize>,
}

/// Script execution context
///
/// All entry points are sequential: entering while a call is already running
/// (for instance from inside an attached callable) fails with
/// [`ScriptError::Reentrant`]. Attached callables get a [`Scope`] for nested
/// work instead.
pub struct ScriptRuntime {
    #[allow(dead_code)] // Kept alive for context lifetime
    runtime: Runtime,
    context: Context,
    busy: Cell<bool>,
    /// Releases requested while busy, applied on the next entry.
    deferred: RefCell<Vec<String>>,
}

impl ScriptRuntime {
    pub fn new() -> Result<Self, ScriptError> {
        Self::with_limits(RuntimeLimits::default())
    }

    pub fn with_limits(limits: RuntimeLimits) -> Result<Self, ScriptError> {
        let runtime = Runtime::new()?;
        if let Some(limit) = limits.memory_limit {
            runtime.set_memory_limit(limit);
        }
        if let Some(limit) = limits.max_stack_size {
            runtime.set_max_stack_size(limit);
        }
        let context = Context::full(&runtime)?;
        context.with(|ctx| install_console(&ctx))?;

        Ok(Self {
            runtime,
            context,
            busy: Cell::new(false),
            deferred: RefCell::new(Vec::new()),
        })
    }

    /// Evaluates a whole script into the global scope.
    pub fn load(&self, origin: &str, source: &str) -> Result<(), ScriptError> {
        tracing::debug!(target: LOG_TARGET, "loading {origin}");
        self.enter(|scope| {
            scope.run(source).map_err(|err| ScriptError::Load {
                origin: origin.to_string(),
                message: err.to_string(),
            })
        })
    }

    pub fn load_file(&self, path: &Path) -> Result<(), ScriptError> {
        let source = std::fs::read_to_string(path)?;
        self.load(&path.display().to_string(), &source)
    }

    pub fn evaluate(&self, source: &str) -> Result<JsonValue, ScriptError> {
        self.enter(|scope| scope.evaluate(source))
    }

    pub fn invoke(&self, name: &str, args: &[JsonValue]) -> Result<JsonValue, ScriptError> {
        self.enter(|scope| scope.invoke(name, args))
    }

    pub fn attach(&self, name: &str, callable: HostFn) -> Result<(), ScriptError> {
        self.enter(|scope| scope.attach(name, callable))
    }

    pub fn capture(&self, name: &str, expression: &str) -> Result<Capture, ScriptError> {
        self.enter(|scope| scope.capture(name, expression))
    }

    /// Deletes the global `name`.
    ///
    /// While the runtime is busy the release is queued and applied on the
    /// next entry, so it is safe to call from `Drop` at any time.
    pub fn release(&self, name: &str) -> Result<(), ScriptError> {
        if self.busy.get() {
            self.deferred.borrow_mut().push(name.to_string());
            return Ok(());
        }
        self.enter(|scope| scope.release(name))
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// Runs `f` against the context.
    pub fn enter<R>(
        &self,
        f: impl FnOnce(&Scope<'_, '_>) -> Result<R, ScriptError>,
    ) -> Result<R, ScriptError> {
        if self.busy.replace(true) {
            return Err(ScriptError::Reentrant);
        }
        let _busy = BusyGuard(&self.busy);

        self.context.with(|ctx| {
            let scope = Scope::new(&ctx);
            self.flush_deferred(&scope);
            f(&scope)
        })
    }

    fn flush_deferred(&self, scope: &Scope<'_, '_>) {
        let names: Vec<String> = self.deferred.borrow_mut().drain(..).collect();
        for name in names {
            if let Err(err) = scope.release(&name) {
                tracing::debug!(target: LOG_TARGET, "deferred release of {name} failed: {err}");
            }
        }
    }
}

struct BusyGuard<'a>(&'a Cell<bool>);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
