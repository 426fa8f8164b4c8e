// Error types for the sprig dispatch engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Startup / configuration errors. These abort bootstrap.
    #[error("Entry point missing: {0} does not declare a `fn(Vec<String>)` entry point")]
    MissingEntryPoint(String),

    #[error("Base namespace missing: {0} does not declare a namespace to scan")]
    MissingBaseNamespace(String),

    #[error("HTTP request path {0} is duplicated")]
    DuplicateRoute(String),

    #[error(
        "Route {path} declares {declared} parameter bindings but its method takes {expected} arguments"
    )]
    ParameterCount {
        path: String,
        declared: usize,
        expected: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    // Per-request errors
    #[error("Binding error: {0}")]
    Binding(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invocation error: {0}")]
    Invocation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Binding(_) | Error::Deserialization(_) => 400,
            _ => 500,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Check if this error can only happen while the application is being configured
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MissingEntryPoint(_)
                | Error::MissingBaseNamespace(_)
                | Error::DuplicateRoute(_)
                | Error::ParameterCount { .. }
                | Error::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::Binding("bad int".into()).status_code(), 400);
        assert_eq!(Error::Deserialization("eof".into()).status_code(), 400);
        assert_eq!(Error::Invocation("boom".into()).status_code(), 500);
        assert_eq!(Error::Serialization("nan".into()).status_code(), 500);
    }

    #[test]
    fn test_error_classes() {
        let err = Error::Binding("x".into());
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert!(!err.is_configuration());

        let err = Error::DuplicateRoute("/v1/users/get".into());
        assert!(err.is_configuration());
        assert!(err.is_server_error());
        assert_eq!(
            err.to_string(),
            "HTTP request path /v1/users/get is duplicated"
        );
    }
}
