//! Hooks for missing helpers and partials

use crate::{Engine, Helper, Result};
use hbs_script::{host_fn, Scope, LOG_TARGET};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Global slot the adapter consults when a partial is not registered.
pub(crate) const PARTIAL_MISSING_SLOT: &str = "__hbsPartialMissing";

/// Which missing-helper hook to install.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HelperMissing {
    /// Mustaches such as `{{name arg}}` that resolve to nothing.
    #[default]
    Basic,
    /// Block statements such as `{{#name}}…{{/name}}` that resolve to no helper.
    Block,
}

impl HelperMissing {
    /// Reserved helper name the library looks up for this hook.
    pub fn helper_name(self) -> &'static str {
        match self {
            HelperMissing::Basic => "helperMissing",
            HelperMissing::Block => "blockHelperMissing",
        }
    }
}

impl Engine {
    /// Installs the hook called for unresolved helpers, replacing any
    /// previous hook of the same kind.
    ///
    /// The hook is called like a Rust helper; `options.name` holds the name
    /// that failed to resolve.
    pub fn register_helper_missing<F>(&self, kind: HelperMissing, hook: F) -> Result<()>
    where
        F: Fn(&Scope<'_, '_>, &[Value]) -> Result<Value> + 'static,
    {
        self.register_helper(kind.helper_name(), Helper::host(hook))
    }

    /// Removes the hook; misses fall back to the library's default behavior.
    pub fn unregister_helper_missing(&self, kind: HelperMissing) -> Result<()> {
        self.unregister_helper(kind.helper_name())
    }

    /// Installs the hook called with the name of an unregistered partial.
    ///
    /// A returned source is registered under that name before use, so the
    /// hook runs at most once per name. `None` or an empty string leaves the
    /// partial unresolved.
    ///
    /// Not part of the Handlebars API.
    pub fn register_partial_missing<F>(&self, hook: F) -> Result<()>
    where
        F: Fn(&Scope<'_, '_>, &str) -> Result<Option<String>> + 'static,
    {
        let runtime = self.runtime()?;
        tracing::debug!(target: LOG_TARGET, "attaching {PARTIAL_MISSING_SLOT}");
        let callable = host_fn(move |scope, args| {
            let name = args.first().and_then(Value::as_str).unwrap_or_default();
            Ok(match hook(scope, name)? {
                Some(partial) if !partial.is_empty() => Value::String(partial),
                _ => Value::Null,
            })
        });
        Ok(runtime.attach(PARTIAL_MISSING_SLOT, callable)?)
    }

    pub fn unregister_partial_missing(&self) -> Result<()> {
        self.evaluate(&format!("delete globalThis.{PARTIAL_MISSING_SLOT}"))?;
        Ok(())
    }
}
