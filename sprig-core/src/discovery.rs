//! Controller discovery
//!
//! Controllers register themselves at compile time with
//! [`register_controller!`](crate::register_controller). Each registration
//! records the module path it was submitted from, which is the namespace a
//! [`ControllerScanner`] filters on.

use crate::traits::ControllerDefinition;
use tracing::debug;

/// A controller registration collected with `inventory`
pub struct ControllerRegistration {
    /// Name of the controller type
    pub type_name: &'static str,
    /// Module path the registration was submitted from
    pub namespace: &'static str,
    /// Builds the controller declaration
    pub describe: fn() -> Box<dyn ControllerDefinition>,
}

inventory::collect!(ControllerRegistration);

/// Register a controller for discovery.
///
/// The second argument is an expression producing the controller's
/// [`ControllerDescriptor`](crate::ControllerDescriptor). It is evaluated
/// during bootstrap, once per scan.
///
/// ```ignore
/// register_controller!(UsersController, UsersController::descriptor());
/// ```
#[macro_export]
macro_rules! register_controller {
    ($controller:ty, $describe:expr) => {
        $crate::inventory::submit! {
            $crate::ControllerRegistration {
                type_name: ::std::stringify!($controller),
                namespace: ::std::module_path!(),
                describe: {
                    fn __describe() -> ::std::boxed::Box<dyn $crate::ControllerDefinition> {
                        ::std::boxed::Box::new($describe)
                    }
                    __describe
                },
            }
        }
    };
}

/// Whether `namespace` is `base` or one of its descendants
pub fn namespace_matches(base: &str, namespace: &str) -> bool {
    match namespace.strip_prefix(base) {
        Some("") => true,
        Some(rest) => rest.starts_with("::"),
        None => false,
    }
}

/// Finds the controllers declared under a namespace
pub trait ControllerScanner: Send + Sync {
    fn find_controllers(&self, namespace: &str) -> Vec<Box<dyn ControllerDefinition>>;
}

/// Scanner over the compile-time registration table.
///
/// Results are ordered by namespace, then type name, so bootstrap order
/// (and therefore which registration reports a duplicate path) is stable.
#[derive(Debug, Default, Clone, Copy)]
pub struct InventoryScanner;

impl InventoryScanner {
    /// Registrations under `namespace`, sorted
    pub fn registrations(namespace: &str) -> Vec<&'static ControllerRegistration> {
        let mut found: Vec<&'static ControllerRegistration> =
            inventory::iter::<ControllerRegistration>
                .into_iter()
                .filter(|registration| namespace_matches(namespace, registration.namespace))
                .collect();

        found.sort_by(|a, b| {
            a.namespace
                .cmp(b.namespace)
                .then_with(|| a.type_name.cmp(b.type_name))
        });
        found
    }
}

impl ControllerScanner for InventoryScanner {
    fn find_controllers(&self, namespace: &str) -> Vec<Box<dyn ControllerDefinition>> {
        Self::registrations(namespace)
            .into_iter()
            .map(|registration| {
                debug!(
                    controller = registration.type_name,
                    namespace = registration.namespace,
                    "Controller discovered"
                );
                (registration.describe)()
            })
            .collect()
    }
}
