//! Core of the sprig HTTP dispatch engine.
//!
//! Controllers declare a path prefix, an instance scope and a set of routed
//! methods. At startup the [`Application`] collects every controller registered
//! under a namespace, builds one [`Dispatcher`] per route and registers it in
//! the [`RouteTable`]. Each request is then validated against its route, its
//! parameters are bound from the query string and body, the method is invoked
//! and its return value serialized.
//!
//! ```ignore
//! use sprig_core::*;
//!
//! #[derive(Default)]
//! struct UsersController;
//!
//! register_controller!(
//!     UsersController,
//!     ControllerDescriptor::<UsersController>::new("/v1/users")
//!         .get("/get", vec![], |_c, ()| "Regular mapping is active!")
//! );
//! ```

pub mod application;
pub mod binder;
pub mod codec;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod http;
pub mod logging;
pub mod metadata;
pub mod route_table;
pub mod server;
pub mod traits;

pub use application::{AppDescriptor, Application, ApplicationBuilder, EntryPoint};
pub use binder::{Bindable, bind, zero_value};
pub use config::{ConfigOverlay, EnvLoader, ServerConfig};
pub use controller::ControllerDescriptor;
pub use discovery::{ControllerRegistration, ControllerScanner, InventoryScanner, namespace_matches};
pub use dispatcher::{
    Dispatcher, EXECUTED_BODY, METHOD_NOT_ALLOWED_BODY, NOT_FOUND_BODY, Route, parse_query,
};
pub use error::{Error, Result};
pub use handler::{IntoReply, Invoker, MethodArgs, Reply};
pub use http::{HttpRequest, HttpResponse, Json};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use metadata::{
    ControllerMetadata, HttpVerb, InstanceScope, Param, ParamSource, ParameterSpec, RouteMetadata,
    ValueKind,
};
pub use route_table::RouteTable;
pub use server::{HttpServer, ServerHandle};
pub use traits::{BoundRoute, ControllerDefinition, DispatchOptions, RequestHandler};

// Used by `register_controller!`
#[doc(hidden)]
pub use inventory;
