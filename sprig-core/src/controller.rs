//! Controller declarations
//!
//! A controller is declared once, as a value: its path prefix, its instance
//! scope, and one entry per routed method. Each method entry pairs a
//! [`RouteMetadata`] (verb + path suffix) with the parameter bindings and a
//! typed closure:
//!
//! ```ignore
//! ControllerDescriptor::<UsersController>::new("/v1/users")
//!     .get("/get", vec![], |c, ()| c.status())
//!     .put(
//!         "/put",
//!         vec![Param::query("userId"), Param::query("userId2")],
//!         |c, (a, b): (String, String)| c.rename(a, b),
//!     )
//! ```
//!
//! The closure's argument tuple fixes every parameter's declared kind, so the
//! only check left for bootstrap is that the bindings and the tuple line up.

use crate::dispatcher::{Dispatcher, Factory, Route};
use crate::handler::{self, IntoReply, Invoker, MethodArgs};
use crate::metadata::{
    ControllerMetadata, HttpVerb, InstanceScope, Param, ParameterSpec, RouteMetadata, ValueKind,
};
use crate::traits::{BoundRoute, ControllerDefinition, DispatchOptions};
use crate::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

struct RouteDecl<C> {
    metadata: RouteMetadata,
    params: Vec<Param>,
    kinds: Vec<ValueKind>,
    invoker: Invoker<C>,
}

/// Declaration of one controller type and its routed methods.
pub struct ControllerDescriptor<C> {
    type_name: &'static str,
    metadata: ControllerMetadata,
    factory: Factory<C>,
    routes: Vec<RouteDecl<C>>,
}

impl<C: Default + Send + 'static> ControllerDescriptor<C> {
    /// Declare a controller built with `C::default()`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_factory(prefix, C::default)
    }
}

impl<C: Send + 'static> ControllerDescriptor<C> {
    /// Declare a controller built by `factory`.
    ///
    /// The factory is called once at bootstrap, and again after every call
    /// on a prototype-scoped controller.
    pub fn with_factory<F>(prefix: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self {
            type_name: std::any::type_name::<C>(),
            metadata: ControllerMetadata {
                prefix: prefix.into(),
                scope: InstanceScope::Singleton,
                tags: Default::default(),
            },
            factory: Arc::new(factory),
            routes: Vec::new(),
        }
    }

    pub fn scope(mut self, scope: InstanceScope) -> Self {
        self.metadata.scope = scope;
        self
    }

    /// Attach a tag, logged with the controller at bootstrap
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.tags.insert(key.into(), value.into());
        self
    }

    /// Shorthand for `scope(InstanceScope::Prototype)`
    pub fn prototype(self) -> Self {
        self.scope(InstanceScope::Prototype)
    }

    /// Map a method. `params` gives one binding per method argument, in order.
    pub fn route<A, R, F>(mut self, metadata: RouteMetadata, params: Vec<Param>, method: F) -> Self
    where
        A: MethodArgs,
        R: IntoReply + 'static,
        F: Fn(&mut C, A) -> R + Send + Sync + 'static,
    {
        self.routes.push(RouteDecl {
            metadata,
            params,
            kinds: A::kinds(),
            invoker: handler::invoker(method),
        });
        self
    }

    pub fn get<A, R, F>(self, path: impl Into<String>, params: Vec<Param>, method: F) -> Self
    where
        A: MethodArgs,
        R: IntoReply + 'static,
        F: Fn(&mut C, A) -> R + Send + Sync + 'static,
    {
        self.route(RouteMetadata::get(path), params, method)
    }

    pub fn post<A, R, F>(self, path: impl Into<String>, params: Vec<Param>, method: F) -> Self
    where
        A: MethodArgs,
        R: IntoReply + 'static,
        F: Fn(&mut C, A) -> R + Send + Sync + 'static,
    {
        self.route(RouteMetadata::post(path), params, method)
    }

    pub fn put<A, R, F>(self, path: impl Into<String>, params: Vec<Param>, method: F) -> Self
    where
        A: MethodArgs,
        R: IntoReply + 'static,
        F: Fn(&mut C, A) -> R + Send + Sync + 'static,
    {
        self.route(RouteMetadata::put(path), params, method)
    }

    /// Declared (verb, full path) pairs
    pub fn routes(&self) -> Vec<(HttpVerb, String)> {
        self.routes
            .iter()
            .map(|decl| {
                (
                    decl.metadata.verb,
                    format!("{}{}", self.metadata.prefix, decl.metadata.path),
                )
            })
            .collect()
    }
}

impl<C: Send + 'static> ControllerDefinition for ControllerDescriptor<C> {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn metadata(&self) -> &ControllerMetadata {
        &self.metadata
    }

    fn into_routes(self: Box<Self>, options: &DispatchOptions) -> Result<Vec<BoundRoute>> {
        let ControllerDescriptor {
            type_name,
            metadata,
            factory,
            routes,
        } = *self;

        let short_name = type_name.rsplit("::").next().unwrap_or(type_name);
        let instance = Arc::new(Mutex::new(factory()));

        routes
            .into_iter()
            .map(|decl| {
                let full_path = format!("{}{}", metadata.prefix, decl.metadata.path);

                if decl.params.len() != decl.kinds.len() {
                    return Err(Error::ParameterCount {
                        path: full_path,
                        declared: decl.params.len(),
                        expected: decl.kinds.len(),
                    });
                }

                let specs: Vec<ParameterSpec> = decl
                    .params
                    .into_iter()
                    .zip(decl.kinds)
                    .map(|(param, kind)| ParameterSpec::new(param, kind))
                    .collect();

                debug!(
                    controller = %short_name,
                    verb = %decl.metadata.verb,
                    path = %full_path,
                    params = specs.len(),
                    scope = ?metadata.scope,
                    "Building dispatcher"
                );

                let route = Route::new(
                    full_path.clone(),
                    decl.metadata.verb,
                    specs,
                    metadata.scope,
                    format!("{} {}{}", short_name, decl.metadata.verb, decl.metadata.path),
                    decl.invoker,
                    Arc::clone(&factory),
                    Arc::clone(&instance),
                );

                Ok(BoundRoute {
                    path: full_path,
                    verb: decl.metadata.verb,
                    handler: Arc::new(Dispatcher::new(route, options.content_type.clone())),
                })
            })
            .collect()
    }
}

impl<C> std::fmt::Debug for ControllerDescriptor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerDescriptor")
            .field("type_name", &self.type_name)
            .field("metadata", &self.metadata)
            .field("routes", &self.routes.len())
            .finish()
    }
}
