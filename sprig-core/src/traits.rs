// Core traits for the sprig dispatch engine

use crate::metadata::{ControllerMetadata, HttpVerb};
use crate::{Error, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for request handlers registered with the HTTP listener
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handle an HTTP request and return a response.
    ///
    /// Validation failures (unknown path, wrong verb) are ordinary responses.
    /// An `Err` is a dispatch failure the listener turns into an error response.
    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}

/// A route ready to be registered: its full path, verb and dispatcher.
#[derive(Clone)]
pub struct BoundRoute {
    pub path: String,
    pub verb: HttpVerb,
    pub handler: Arc<dyn RequestHandler>,
}

impl std::fmt::Debug for BoundRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundRoute")
            .field("path", &self.path)
            .field("verb", &self.verb)
            .finish()
    }
}

/// Options applied to every dispatcher built during bootstrap
#[derive(Clone, Debug)]
pub struct DispatchOptions {
    /// Content type sent with serialized return values
    pub content_type: String,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            content_type: crate::http::APPLICATION_OCTET_STREAM.to_string(),
        }
    }
}

/// Type-erased controller declaration, as collected by discovery.
pub trait ControllerDefinition: Send {
    /// Name of the controller type (for diagnostics)
    fn type_name(&self) -> &'static str;

    /// Path prefix and instance scope
    fn metadata(&self) -> &ControllerMetadata;

    /// Construct the controller instance and one dispatcher per declared route.
    fn into_routes(self: Box<Self>, options: &DispatchOptions) -> Result<Vec<BoundRoute>, Error>;
}
