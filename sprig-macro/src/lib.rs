// Procedural macros for sprig controllers

use proc_macro::TokenStream;

mod controller;
mod path_validation;

/// Declares a controller from an `impl` block.
///
/// Methods marked `#[get("/path")]`, `#[put("/path")]` or `#[post("/path")]`
/// become routes under the prefix. Their parameters bind from
/// `#[query("name")]` or `#[body]`; a parameter with neither gets its zero
/// value. The block gains `pub fn descriptor() -> ControllerDescriptor<Self>`,
/// ready for `register_controller!`. The type must implement `Default`.
///
/// ```ignore
/// #[controller("/v1/users")]
/// impl UsersController {
///     #[get("/get")]
///     fn status(&self) -> &'static str {
///         "Regular mapping is active!"
///     }
///
///     #[put("/put")]
///     fn save(&mut self, #[query("userId")] a: String, #[query("userId2")] b: String) {}
/// }
///
/// register_controller!(UsersController, UsersController::descriptor());
/// ```
///
/// `#[controller("/v1/users", prototype)]` gives every call a fresh instance.
#[proc_macro_attribute]
pub fn controller(attr: TokenStream, item: TokenStream) -> TokenStream {
    controller::controller_impl(attr, item)
}
