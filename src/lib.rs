// Sprig - controller-style HTTP dispatch for Rust
//
// Controllers map methods to (verb, path) pairs, bind parameters from the
// query string and JSON body, and are discovered at startup by namespace.

// Re-export core functionality
pub use sprig_core::*;

// Controller attribute macro; its expansion names `sprig_core` directly
pub use sprig_macro::controller;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        AppDescriptor, Application, Bindable, ControllerDescriptor, Error, HttpRequest,
        HttpResponse, InstanceScope, Json, LogConfig, Param, Result, ServerConfig,
        register_controller,
    };
    pub use sprig_macro::controller;
}
