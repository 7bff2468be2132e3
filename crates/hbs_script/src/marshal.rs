//! Conversion between JavaScript values and `serde_json::Value`
//!
//! The marshalling boundary only carries JSON shapes. Functions have no data
//! representation, so they come back as [`FUNCTION_MARKER`].

use crate::ScriptError;
use rquickjs::{Array, Ctx, Object, Value};
use serde_json::{Map, Number, Value as JsonValue};

/// Placeholder for function values crossing back into Rust.
pub const FUNCTION_MARKER: &str = "[function]";

/// Nesting limit; also stops cyclic objects.
const MAX_DEPTH: usize = 128;

/// Converts a script value into a JSON value.
///
/// `undefined` becomes `null`, integral floats become integers, non-finite
/// floats become `null`. Symbols and other exotic values map to `null`.
pub fn from_js(value: &Value<'_>) -> Result<JsonValue, ScriptError> {
    convert(value, 0)
}

fn convert(value: &Value<'_>, depth: usize) -> Result<JsonValue, ScriptError> {
    if depth > MAX_DEPTH {
        return Err(ScriptError::Marshal {
            message: format!("value nests deeper than {MAX_DEPTH} levels"),
        });
    }

    if value.is_undefined() || value.is_null() {
        return Ok(JsonValue::Null);
    }
    if let Some(flag) = value.as_bool() {
        return Ok(JsonValue::Bool(flag));
    }
    if let Some(int) = value.as_int() {
        return Ok(JsonValue::from(int));
    }
    if let Some(float) = value.as_float() {
        return Ok(float_to_json(float));
    }
    if let Some(string) = value.as_string() {
        return Ok(JsonValue::String(string.to_string()?));
    }
    if value.is_function() {
        return Ok(JsonValue::String(FUNCTION_MARKER.to_string()));
    }
    if let Some(array) = value.as_array() {
        let mut items = Vec::with_capacity(array.len());
        for item in array.iter::<Value>() {
            items.push(convert(&item?, depth + 1)?);
        }
        return Ok(JsonValue::Array(items));
    }
    if let Some(object) = value.as_object() {
        let mut map = Map::new();
        for prop in object.props::<String, Value>() {
            let (key, item) = prop?;
            map.insert(key, convert(&item, depth + 1)?);
        }
        return Ok(JsonValue::Object(map));
    }

    Ok(JsonValue::Null)
}

fn float_to_json(float: f64) -> JsonValue {
    if float.fract() == 0.0 && float.abs() < (i64::MAX as f64) {
        return JsonValue::from(float as i64);
    }
    Number::from_f64(float)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

/// Converts a JSON value into a script value owned by `ctx`.
pub fn to_js<'js>(ctx: &Ctx<'js>, value: &JsonValue) -> rquickjs::Result<Value<'js>> {
    match value {
        JsonValue::Null => Ok(Value::new_null(ctx.clone())),
        JsonValue::Bool(flag) => Ok(Value::new_bool(ctx.clone(), *flag)),
        JsonValue::Number(number) => {
            match number.as_i64().and_then(|int| i32::try_from(int).ok()) {
                Some(int) => Ok(Value::new_int(ctx.clone(), int)),
                None => Ok(Value::new_float(
                    ctx.clone(),
                    number.as_f64().unwrap_or(f64::NAN),
                )),
            }
        }
        JsonValue::String(string) => {
            Ok(rquickjs::String::from_str(ctx.clone(), string)?.into_value())
        }
        JsonValue::Array(items) => {
            let array = Array::new(ctx.clone())?;
            for (index, item) in items.iter().enumerate() {
                array.set(index, to_js(ctx, item)?)?;
            }
            Ok(array.into_value())
        }
        JsonValue::Object(map) => {
            let object = Object::new(ctx.clone())?;
            for (key, item) in map {
                object.set(key.as_str(), to_js(ctx, item)?)?;
            }
            Ok(object.into_value())
        }
    }
}

/// Renders a script value for log lines and error messages.
pub(crate) fn display(value: &Value<'_>) -> String {
    if let Some(string) = value.as_string() {
        if let Ok(text) = string.to_string() {
            return text;
        }
    }
    match from_js(value) {
        Ok(json) => json.to_string(),
        Err(_) => "<unprintable value>".to_string(),
    }
}
