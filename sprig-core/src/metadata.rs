// Route, controller and parameter metadata

use std::collections::BTreeMap;
use std::fmt;

/// HTTP verbs a route can be mapped to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    GET,
    POST,
    PUT,
}

impl HttpVerb {
    /// Parse a request method. Matching is exact: `get` is not `GET`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(HttpVerb::GET),
            "POST" => Some(HttpVerb::POST),
            "PUT" => Some(HttpVerb::PUT),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::GET => "GET",
            HttpVerb::POST => "POST",
            HttpVerb::PUT => "PUT",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of the controller instance behind a route
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InstanceScope {
    /// One instance shared by every route of the controller, for the process lifetime
    #[default]
    Singleton,
    /// The route replaces its instance with a fresh one after every successful call
    Prototype,
}

/// Verb and path suffix attached to a controller method
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteMetadata {
    pub verb: HttpVerb,
    pub path: String,
}

impl RouteMetadata {
    pub fn new(verb: HttpVerb, path: impl Into<String>) -> Self {
        Self {
            verb,
            path: path.into(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpVerb::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpVerb::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpVerb::PUT, path)
    }
}

/// Path prefix and scope attached to a controller type, plus free-form tags
/// the application reads at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ControllerMetadata {
    pub prefix: String,
    pub scope: InstanceScope,
    pub tags: BTreeMap<String, String>,
}

/// Where a parameter's raw value comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamSource {
    Query,
    Body,
    None,
}

/// Semantic type of a method parameter, used to pick the zero value and the text parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Char,
    String,
    /// Anything decoded as structured JSON; carries the Rust type name
    Object(&'static str),
}

impl ValueKind {
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ValueKind::Byte | ValueKind::Short | ValueKind::Int | ValueKind::Long
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ValueKind::Float | ValueKind::Double)
    }
}

/// Binding declared for one method parameter, before its type is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub source: ParamSource,
    pub name: String,
}

impl Param {
    /// Bind from the first query value under `name`
    pub fn query(name: impl Into<String>) -> Self {
        Self {
            source: ParamSource::Query,
            name: name.into(),
        }
    }

    /// Bind from the whole JSON request body
    pub fn body() -> Self {
        Self {
            source: ParamSource::Body,
            name: String::new(),
        }
    }

    /// No binding; the parameter always receives its type's zero value
    pub fn none() -> Self {
        Self {
            source: ParamSource::None,
            name: String::new(),
        }
    }
}

/// Fully resolved binding for one method parameter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterSpec {
    pub source: ParamSource,
    pub binding_name: String,
    pub declared_type: ValueKind,
}

impl ParameterSpec {
    pub fn new(param: Param, declared_type: ValueKind) -> Self {
        Self {
            source: param.source,
            binding_name: param.name,
            declared_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_parsing_is_exact() {
        assert_eq!(HttpVerb::from_str("GET"), Some(HttpVerb::GET));
        assert_eq!(HttpVerb::from_str("PUT"), Some(HttpVerb::PUT));
        assert_eq!(HttpVerb::from_str("get"), None);
        assert_eq!(HttpVerb::from_str("DELETE"), None);
    }

    #[test]
    fn test_default_scope_is_singleton() {
        assert_eq!(InstanceScope::default(), InstanceScope::Singleton);
        assert_eq!(ControllerMetadata::default().scope, InstanceScope::Singleton);
    }

    #[test]
    fn test_param_spec_from_param() {
        let spec = ParameterSpec::new(Param::query("userId"), ValueKind::String);
        assert_eq!(spec.source, ParamSource::Query);
        assert_eq!(spec.binding_name, "userId");
        assert_eq!(spec.declared_type, ValueKind::String);
    }
}
