// Per-route request dispatch: validate, bind, invoke, respond

use crate::binder;
use crate::handler::{Invoker, Reply};
use crate::metadata::{HttpVerb, InstanceScope, ParamSource, ParameterSpec};
use crate::traits::RequestHandler;
use crate::{Error, HttpRequest, HttpResponse, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const NOT_FOUND_BODY: &str = "Method not found";
pub const METHOD_NOT_ALLOWED_BODY: &str = "Method Not Allowed";
pub const EXECUTED_BODY: &str = "Method executed successfully";

/// Shared handle on a controller instance
pub type Instance<C> = Arc<Mutex<C>>;

/// Builds a fresh controller instance
pub type Factory<C> = Arc<dyn Fn() -> C + Send + Sync>;

/// Split a raw query string into key -> values, in encounter order.
///
/// `a=1&a=2&b` gives `{"a": ["1", "2"], "b": [""]}`. Keys and values are
/// percent-decoded; a pair that fails to decode is kept verbatim.
pub fn parse_query(query: Option<&str>) -> HashMap<String, Vec<String>> {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();

    let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
        return params;
    };

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(decode(key))
            .or_default()
            .push(decode(value));
    }

    params
}

fn decode(text: &str) -> String {
    urlencoding::decode(text)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| text.to_string())
}

/// One (verb, path) pair bound to a controller method and its instance.
pub struct Route<C> {
    pub full_path: String,
    pub verb: HttpVerb,
    pub params: Vec<ParameterSpec>,
    pub scope: InstanceScope,
    /// Controller type and path suffix, for logs
    pub handler_name: String,
    invoker: Invoker<C>,
    factory: Factory<C>,
    // Prototype routes hold this lock across invoke and rebind
    slot: Mutex<Instance<C>>,
}

impl<C> Route<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        full_path: impl Into<String>,
        verb: HttpVerb,
        params: Vec<ParameterSpec>,
        scope: InstanceScope,
        handler_name: impl Into<String>,
        invoker: Invoker<C>,
        factory: Factory<C>,
        instance: Instance<C>,
    ) -> Self {
        Self {
            full_path: full_path.into(),
            verb,
            params,
            scope,
            handler_name: handler_name.into(),
            invoker,
            factory,
            slot: Mutex::new(instance),
        }
    }

    /// The instance the next request will be invoked on
    pub fn instance(&self) -> Instance<C> {
        Arc::clone(&self.slot.lock())
    }

    /// Invoke the method on the bound instance, applying the scope policy.
    pub fn invoke(&self, values: Vec<Value>) -> Result<Reply> {
        match self.scope {
            InstanceScope::Singleton => {
                let instance = self.instance();
                let mut controller = instance.lock();
                (self.invoker)(&mut *controller, values)
            }
            InstanceScope::Prototype => {
                let mut slot = self.slot.lock();
                let reply = {
                    let mut controller = slot.lock();
                    (self.invoker)(&mut *controller, values)?
                };
                *slot = Arc::new(Mutex::new((self.factory)()));
                debug!(route = %self.handler_name, "Prototype instance replaced");
                Ok(reply)
            }
        }
    }
}

/// Request handler for exactly one route.
pub struct Dispatcher<C> {
    route: Arc<Route<C>>,
    content_type: String,
}

impl<C: Send + 'static> Dispatcher<C> {
    pub fn new(route: Route<C>, content_type: impl Into<String>) -> Self {
        Self {
            route: Arc::new(route),
            content_type: content_type.into(),
        }
    }

    pub fn route(&self) -> &Route<C> {
        &self.route
    }

    /// Path and verb checks. `Some` is the rejection to send back.
    fn validate(&self, request: &HttpRequest) -> Option<HttpResponse> {
        if request.path != self.route.full_path {
            warn!(
                path = %request.path,
                route = %self.route.full_path,
                "Request path does not match route"
            );
            return Some(HttpResponse::text(404, NOT_FOUND_BODY));
        }

        if HttpVerb::from_str(&request.method) != Some(self.route.verb) {
            warn!(
                method = %request.method,
                expected = %self.route.verb,
                path = %request.path,
                "Request method does not match route"
            );
            return Some(HttpResponse::text(405, METHOD_NOT_ALLOWED_BODY));
        }

        None
    }

    /// Bind every declared parameter, in declaration order.
    fn bind_parameters(&self, request: &HttpRequest) -> Result<Vec<Value>> {
        let query = parse_query(request.query.as_deref());

        self.route
            .params
            .iter()
            .map(|spec| {
                let raw = match spec.source {
                    ParamSource::Query => query
                        .get(&spec.binding_name)
                        .and_then(|values| values.first())
                        .map(String::as_bytes),
                    ParamSource::Body => Some(request.body.as_slice()),
                    ParamSource::None => None,
                };
                binder::bind(raw, spec)
            })
            .collect()
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse> {
        let values = self.bind_parameters(&request)?;
        debug!(route = %self.route.handler_name, args = values.len(), "Parameters bound");

        let route = Arc::clone(&self.route);
        let reply = tokio::task::spawn_blocking(move || route.invoke(values))
            .await
            .map_err(|e| {
                if e.is_panic() {
                    Error::Invocation(format!("{} panicked", self.route.handler_name))
                } else {
                    Error::Invocation(e.to_string())
                }
            })??;

        Ok(match reply {
            Reply::Empty => HttpResponse::text(200, EXECUTED_BODY),
            Reply::Json(body) => HttpResponse::ok()
                .content_type(&self.content_type)
                .with_body(body.into_bytes()),
        })
    }
}

#[async_trait]
impl<C: Send + 'static> RequestHandler for Dispatcher<C> {
    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        if let Some(rejection) = self.validate(&request) {
            return Ok(rejection);
        }

        let method = request.method.clone();
        self.dispatch(request).await.map_err(|err| {
            error!(
                route = %self.route.handler_name,
                method = %method,
                path = %self.route.full_path,
                error = %err,
                "Request dispatch failed"
            );
            err
        })
    }
}

impl<C> std::fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("path", &self.route.full_path)
            .field("verb", &self.route.verb)
            .field("scope", &self.route.scope)
            .finish()
    }
}
