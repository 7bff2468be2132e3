//! Operations against a live context
//!
//! A [`Scope`] is what code running *inside* the runtime sees: the top-level
//! [`ScriptRuntime`](crate::ScriptRuntime) entry points hand one to their
//! closure, and attached Rust callables receive one for the context that
//! called them. Using the scope instead of the runtime keeps nested calls on
//! the same stack.

use crate::{marshal, ScriptError, LOG_TARGET};
use rquickjs::function::{Args, Rest};
use rquickjs::{CatchResultExt, Ctx, Exception, Function, Value};
use serde_json::Value as JsonValue;
use std::rc::Rc;

/// Rust callable attachable under a global name.
///
/// Receives the calling scope and the marshalled arguments.
pub type HostFn = Rc<dyn Fn(&Scope<'_, '_>, &[JsonValue]) -> Result<JsonValue, ScriptError>>;

/// Wraps a closure as a [`HostFn`].
pub fn host_fn<F>(f: F) -> HostFn
where
    F: Fn(&Scope<'_, '_>, &[JsonValue]) -> Result<JsonValue, ScriptError> + 'static,
{
    Rc::new(f)
}

/// Result of assigning an expression to a global.
#[derive(Debug, Clone, PartialEq)]
pub enum Capture {
    /// The global now holds a function and stays bound.
    Function,
    /// A plain value; the global was released again.
    Value(JsonValue),
}

pub struct Scope<'a, 'js> {
    ctx: &'a Ctx<'js>,
}

impl<'a, 'js> Scope<'a, 'js> {
    pub(crate) fn new(ctx: &'a Ctx<'js>) -> Self {
        Self { ctx }
    }

    /// Evaluates source text and marshals the completion value.
    pub fn evaluate(&self, source: &str) -> Result<JsonValue, ScriptError> {
        let value = self.eval_raw(source)?;
        marshal::from_js(&value)
    }

    /// Calls the global function `name` with marshalled arguments.
    pub fn invoke(&self, name: &str, args: &[JsonValue]) -> Result<JsonValue, ScriptError> {
        let target: Value = self.ctx.globals().get(name)?;
        let Some(function) = target.as_function() else {
            return Err(ScriptError::NotAFunction {
                name: name.to_string(),
            });
        };

        let mut call_args = Args::new(self.ctx.clone(), args.len());
        for arg in args {
            call_args.push_arg(marshal::to_js(self.ctx, arg)?)?;
        }

        let result = function
            .call_arg::<Value>(call_args)
            .catch(self.ctx)
            .map_err(ScriptError::from_caught)?;
        marshal::from_js(&result)
    }

    /// Assigns the value of `expression` to `globalThis[name]`.
    ///
    /// Only function results keep the binding; anything else is unbound
    /// immediately and returned as a value.
    pub fn capture(&self, name: &str, expression: &str) -> Result<Capture, ScriptError> {
        let key = serde_json::to_string(name).map_err(|err| ScriptError::Marshal {
            message: err.to_string(),
        })?;
        let value = self.eval_raw(&format!("globalThis[{key}] = {expression}"))?;

        if value.is_function() {
            return Ok(Capture::Function);
        }

        self.release(name)?;
        Ok(Capture::Value(marshal::from_js(&value)?))
    }

    /// Exposes `callable` as the global function `name`, replacing any
    /// previous binding.
    pub fn attach(&self, name: &str, callable: HostFn) -> Result<(), ScriptError> {
        let function = host_function(self.ctx, callable)?;
        self.ctx.globals().set(name, function)?;
        Ok(())
    }

    /// Deletes the global `name`. Missing globals are not an error.
    pub fn release(&self, name: &str) -> Result<(), ScriptError> {
        self.ctx.globals().remove(name)?;
        Ok(())
    }

    pub fn is_defined(&self, name: &str) -> Result<bool, ScriptError> {
        Ok(self.ctx.globals().contains_key(name)?)
    }

    pub(crate) fn run(&self, source: &str) -> Result<(), ScriptError> {
        self.eval_raw(source).map(|_| ())
    }

    fn eval_raw(&self, source: &str) -> Result<Value<'js>, ScriptError> {
        tracing::trace!(target: LOG_TARGET, "eval: {source}");
        self.ctx
            .eval::<Value, _>(source)
            .catch(self.ctx)
            .map_err(ScriptError::from_caught)
    }
}

fn host_function<'js>(ctx: &Ctx<'js>, callable: HostFn) -> rquickjs::Result<Function<'js>> {
    Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, args: Rest<Value<'js>>| -> rquickjs::Result<Value<'js>> {
            let args = args
                .0
                .iter()
                .map(marshal::from_js)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| Exception::throw_message(&ctx, &err.to_string()))?;

            let scope = Scope::new(&ctx);
            match callable(&scope, &args) {
                Ok(value) => marshal::to_js(&ctx, &value),
                Err(err) => Err(Exception::throw_message(&ctx, &err.to_string())),
            }
        },
    )
}

/// Installs `console.log`/`warn`/`error`, forwarded to `tracing`.
pub(crate) fn install_console<'js>(ctx: &Ctx<'js>) -> rquickjs::Result<()> {
    let console = rquickjs::Object::new(ctx.clone())?;
    console.set(
        "log",
        Function::new(ctx.clone(), |args: Rest<Value<'js>>| {
            tracing::debug!(target: LOG_TARGET, "{}", console_line(&args.0));
        })?,
    )?;
    console.set(
        "warn",
        Function::new(ctx.clone(), |args: Rest<Value<'js>>| {
            tracing::warn!(target: LOG_TARGET, "{}", console_line(&args.0));
        })?,
    )?;
    console.set(
        "error",
        Function::new(ctx.clone(), |args: Rest<Value<'js>>| {
            tracing::error!(target: LOG_TARGET, "{}", console_line(&args.0));
        })?,
    )?;
    ctx.globals().set("console", console)?;
    Ok(())
}

fn console_line(args: &[Value<'_>]) -> String {
    args.iter()
        .map(marshal::display)
        .collect::<Vec<_>>()
        .join(" ")
}
