//! Compile-time checks on controller prefixes and route paths

use proc_macro2::Span;
use syn::Error;

/// A prefix or route path must be empty or start with `/`, and carry no
/// query string, whitespace or double slashes.
pub fn validate_path(kind: &str, path: &str, span: Span) -> Result<(), Error> {
    if path.is_empty() {
        return Ok(());
    }

    if !path.starts_with('/') {
        return Err(Error::new(
            span,
            format!(
                "{} path must start with '/' or be empty, got: \"{}\"\n\
                 hint: change to \"/{}\"",
                kind, path, path
            ),
        ));
    }

    if path.contains("//") {
        return Err(Error::new(
            span,
            format!("{} path contains double slashes: \"{}\"", kind, path),
        ));
    }

    if let Some(bad) = path.chars().find(|c| *c == '?' || *c == '#' || c.is_whitespace()) {
        return Err(Error::new(
            span,
            format!("{} path \"{}\" contains {:?}", kind, path, bad),
        ));
    }

    Ok(())
}
