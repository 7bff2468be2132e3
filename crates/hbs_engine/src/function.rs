//! Proxies for script-side functions

use crate::{Error, Result};
use hbs_script::{ScriptRuntime, LOG_TARGET};
use serde_json::Value;
use std::rc::{Rc, Weak};

/// A compiled template; call it with a render context.
pub type Renderer = FunctionProxy;

/// Handle to a function stored in the script context under a generated
/// global name.
///
/// The proxy owns that binding: dropping it deletes the global. It holds the
/// runtime weakly, so a proxy that outlives its [`Engine`](crate::Engine)
/// fails with [`Error::Released`] instead of keeping the runtime alive.
#[derive(Debug)]
pub struct FunctionProxy {
    name: String,
    runtime: Weak<ScriptRuntime>,
}

impl FunctionProxy {
    pub(crate) fn new(runtime: &Rc<ScriptRuntime>, name: String) -> Self {
        Self {
            name,
            runtime: Rc::downgrade(runtime),
        }
    }

    /// Global name of the captured function.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        let runtime = self.runtime.upgrade().ok_or_else(|| Error::Released {
            name: self.name.clone(),
        })?;
        Ok(runtime.invoke(&self.name, args)?)
    }

    /// Renders with `context` and no runtime options.
    pub fn render(&self, context: &Value) -> Result<String> {
        let output = self.call(std::slice::from_ref(context))?;
        into_output(output)
    }

    /// Renders with `context` and runtime options such as `data`, `helpers`
    /// or `partials`.
    pub fn render_with(&self, context: &Value, options: &Value) -> Result<String> {
        let output = self.call(&[context.clone(), options.clone()])?;
        into_output(output)
    }
}

fn into_output(value: Value) -> Result<String> {
    match value {
        Value::String(output) => Ok(output),
        other => Err(Error::UnexpectedValue {
            operation: "render",
            value: other,
        }),
    }
}

impl Drop for FunctionProxy {
    fn drop(&mut self) {
        // Failures here are swallowed: the runtime may already be gone.
        let Some(runtime) = self.runtime.upgrade() else {
            tracing::debug!(target: LOG_TARGET, "runtime gone before releasing {}", self.name);
            return;
        };
        if let Err(err) = runtime.release(&self.name) {
            tracing::debug!(target: LOG_TARGET, "failed to release {}: {err}", self.name);
        }
    }
}
