//! Call dispatch
//!
//! Three ways to reach the script side:
//! - **direct**: invoke an existing global with JSON arguments,
//! - **eval**: generate `name(arg, ...)` source and evaluate it, for calls
//!   that need an argument emitted as bare source,
//! - **capture**: like eval, but the result is assigned to a fresh global so
//!   a function result can be called again later through a [`FunctionProxy`].

use crate::{Engine, Error, FunctionProxy, Result};
use hbs_script::{Capture, LOG_TARGET};
use serde_json::Value;

/// Argument of a generated call expression.
#[derive(Debug, Clone)]
pub(crate) enum Arg {
    /// Encoded as a JSON literal.
    Literal(Value),
    /// Emitted unquoted: an identifier or a function literal.
    Source(String),
}

impl Arg {
    pub(crate) fn literal(value: impl Into<Value>) -> Self {
        Arg::Literal(value.into())
    }

    fn encode(&self) -> Result<String> {
        match self {
            Arg::Literal(value) => Ok(serde_json::to_string(value)?),
            Arg::Source(source) => Ok(source.clone()),
        }
    }
}

/// Outcome of a capture-mode call.
#[derive(Debug)]
pub(crate) enum Captured {
    Function(FunctionProxy),
    Value(Value),
}

pub(crate) fn call_expression(function: &str, args: &[Arg]) -> Result<String> {
    let args = args
        .iter()
        .map(Arg::encode)
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("{function}({})", args.join(", ")))
}

const NAME_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const NAME_SUFFIX_LEN: usize = 16;

/// Fresh global name for a captured result: `v` + 16 random alphanumerics.
pub(crate) fn capture_name() -> Result<String> {
    let mut bytes = [0u8; NAME_SUFFIX_LEN];
    getrandom::fill(&mut bytes).map_err(|err| Error::Entropy(err.to_string()))?;

    let mut name = String::with_capacity(NAME_SUFFIX_LEN + 1);
    name.push('v');
    for byte in bytes {
        name.push(NAME_ALPHABET[byte as usize % NAME_ALPHABET.len()] as char);
    }
    Ok(name)
}

impl Engine {
    pub(crate) fn call_direct(&self, function: &str, args: &[Value]) -> Result<Value> {
        let runtime = self.runtime()?;
        tracing::debug!(target: LOG_TARGET, "calling {function} with args {args:?}");
        Ok(runtime.invoke(function, args)?)
    }

    pub(crate) fn call_eval(&self, function: &str, args: &[Arg]) -> Result<Value> {
        let code = call_expression(function, args)?;
        self.evaluate(&code)
    }

    pub(crate) fn call_capture(&self, function: &str, args: &[Arg]) -> Result<Captured> {
        let runtime = self.runtime()?;
        let code = call_expression(function, args)?;
        let name = capture_name()?;
        tracing::debug!(target: LOG_TARGET, "evaluating {name} = {code}");

        match runtime.capture(&name, &code)? {
            Capture::Function => Ok(Captured::Function(FunctionProxy::new(runtime, name))),
            Capture::Value(value) => Ok(Captured::Value(value)),
        }
    }
}
