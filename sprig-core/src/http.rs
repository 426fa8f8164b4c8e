// HTTP request and response types

use serde::Serialize;
use std::collections::HashMap;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";
pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// HTTP request as seen by a dispatcher
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    /// Raw query string, without the leading `?`
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Create a request from a method and a request target such as `/v1/users/put?userId=alice`.
    pub fn new(method: impl Into<String>, target: impl AsRef<str>) -> Self {
        let (path, query) = match target.as_ref().split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.as_ref().to_string(), None),
        };

        Self {
            method: method.into(),
            path,
            query,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// HTTP response wrapper
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Plain text response with the given status
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status)
            .content_type(TEXT_PLAIN)
            .with_body(body.into().into_bytes())
    }

    /// Error body in the `{"error": .., "status": ..}` shape
    pub fn from_error(err: &crate::Error) -> Self {
        let status = err.status_code();
        let body = serde_json::json!({
            "error": err.to_string(),
            "status": status,
        });
        Self::new(status)
            .with_json(&body)
            .unwrap_or_else(|_| Self::text(status, err.to_string()))
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, crate::Error> {
        self.body =
            serde_json::to_vec(value).map_err(|e| crate::Error::Serialization(e.to_string()))?;
        self.headers
            .insert(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());
        Ok(self)
    }

    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn content_type(self, value: &str) -> Self {
        self.with_header(CONTENT_TYPE.to_string(), value.to_string())
    }

    /// Body as UTF-8 text, lossy
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Marks a controller return value to be serialized as JSON.
///
/// Primitive, string, collection and `Option` return types serialize on their
/// own; wrap user-defined types in `Json` to return them from a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T: Serialize>(pub T);
