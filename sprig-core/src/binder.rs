//! Parameter binding
//!
//! Turns the raw text of one query value, or the raw request body, into a
//! [`serde_json::Value`] shaped for the parameter's declared [`ValueKind`].
//! Absent or empty input yields the kind's zero value; input that is present
//! but malformed is a [`Error::Binding`], never a default.

use crate::codec;
use crate::metadata::{ParamSource, ParameterSpec, ValueKind};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::{Number, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// A type that can appear as a controller method parameter.
///
/// Primitive-like types report their own kind so that absent values fall back
/// to `0`, `false`, `'\0'` or `""`. Everything else is an object kind and falls
/// back to `null`, which makes `Option<T>` the natural choice for optional
/// structured parameters. User types opt in with an empty impl:
///
/// ```ignore
/// impl Bindable for NewUser {}
/// ```
pub trait Bindable: DeserializeOwned + Send + 'static {
    fn value_kind() -> ValueKind {
        ValueKind::Object(std::any::type_name::<Self>())
    }
}

macro_rules! impl_bindable {
    ($($ty:ty => $kind:expr),* $(,)?) => {
        $(
            impl Bindable for $ty {
                fn value_kind() -> ValueKind {
                    $kind
                }
            }
        )*
    };
}

impl_bindable! {
    i8 => ValueKind::Byte,
    i16 => ValueKind::Short,
    i32 => ValueKind::Int,
    u8 => ValueKind::Int,
    u16 => ValueKind::Int,
    i64 => ValueKind::Long,
    u32 => ValueKind::Long,
    u64 => ValueKind::Long,
    isize => ValueKind::Long,
    usize => ValueKind::Long,
    f32 => ValueKind::Float,
    f64 => ValueKind::Double,
    bool => ValueKind::Boolean,
    char => ValueKind::Char,
    String => ValueKind::String,
}

impl<T: DeserializeOwned + Send + 'static> Bindable for Option<T> {}
impl<T: DeserializeOwned + Send + 'static> Bindable for Vec<T> {}
impl<V: DeserializeOwned + Send + 'static> Bindable for HashMap<String, V> {}
impl<V: DeserializeOwned + Send + 'static> Bindable for BTreeMap<String, V> {}
impl Bindable for Value {}

/// Zero value injected when a parameter has no usable input
pub fn zero_value(kind: &ValueKind) -> Value {
    match kind {
        ValueKind::Byte | ValueKind::Short | ValueKind::Int | ValueKind::Long => Value::from(0),
        ValueKind::Float | ValueKind::Double => Value::from(0.0),
        ValueKind::Boolean => Value::Bool(false),
        ValueKind::Char => Value::String('\0'.to_string()),
        ValueKind::String => Value::String(String::new()),
        ValueKind::Object(_) => Value::Null,
    }
}

/// Bind one raw value against its parameter spec
pub fn bind(raw: Option<&[u8]>, spec: &ParameterSpec) -> Result<Value> {
    let raw = match spec.source {
        ParamSource::None => None,
        ParamSource::Query | ParamSource::Body => raw.filter(|bytes| !bytes.is_empty()),
    };

    let Some(raw) = raw else {
        trace!(
            parameter = %spec.binding_name,
            kind = ?spec.declared_type,
            "No input, injecting zero value"
        );
        return Ok(zero_value(&spec.declared_type));
    };

    match spec.source {
        ParamSource::Body => codec::deserialize_slice::<Value>(raw).map_err(|e| {
            Error::Binding(format!(
                "request body is not valid for {}: {}",
                kind_name(&spec.declared_type),
                e
            ))
        }),
        _ => {
            let text = std::str::from_utf8(raw).map_err(|e| {
                Error::Binding(format!(
                    "query parameter '{}' is not valid UTF-8: {}",
                    spec.binding_name, e
                ))
            })?;
            parse_text(text, &spec.declared_type).map_err(|reason| {
                Error::Binding(format!(
                    "query parameter '{}' expected {}: {}",
                    spec.binding_name,
                    kind_name(&spec.declared_type),
                    reason
                ))
            })
        }
    }
}

/// Parse a single query value according to its kind
fn parse_text(text: &str, kind: &ValueKind) -> std::result::Result<Value, String> {
    match kind {
        kind if kind.is_integer() => text
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| text.parse::<u64>().map(Value::from))
            .map_err(|e| e.to_string()),
        kind if kind.is_float() => {
            let number = text.parse::<f64>().map_err(|e| e.to_string())?;
            Number::from_f64(number)
                .map(Value::Number)
                .ok_or_else(|| format!("{} is not a finite number", text))
        }
        ValueKind::Boolean => text
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|e| e.to_string()),
        ValueKind::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::String(c.to_string())),
                _ => Err(format!("\"{}\" is not a single character", text)),
            }
        }
        ValueKind::String => Ok(Value::String(text.to_string())),
        // Structured values are JSON. Bare words fall through as strings so
        // that `Option<String>` binds `?name=alice`.
        _ => Ok(codec::deserialize::<Value>(text)
            .unwrap_or_else(|_| Value::String(text.to_string()))),
    }
}

fn kind_name(kind: &ValueKind) -> &'static str {
    match kind {
        ValueKind::Byte => "Byte",
        ValueKind::Short => "Short",
        ValueKind::Int => "Int",
        ValueKind::Long => "Long",
        ValueKind::Float => "Float",
        ValueKind::Double => "Double",
        ValueKind::Boolean => "Boolean",
        ValueKind::Char => "Char",
        ValueKind::String => "String",
        ValueKind::Object(name) => *name,
    }
}
