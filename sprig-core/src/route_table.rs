// Route table: full path -> dispatcher

use crate::traits::RequestHandler;
use crate::{Error, Result};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tracing::debug;

/// Registry of dispatchers keyed by their full path.
///
/// Insert-or-fail: a path can be registered once. There is no update or
/// removal; the table is filled while the application is configured and only
/// read once it serves.
#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<String, Arc<dyn RequestHandler>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `path`; fails if the path is already taken.
    pub fn register(
        &mut self,
        path: impl Into<String>,
        handler: Arc<dyn RequestHandler>,
    ) -> Result<()> {
        match self.routes.entry(path.into()) {
            Entry::Occupied(entry) => Err(Error::DuplicateRoute(entry.key().clone())),
            Entry::Vacant(entry) => {
                debug!(path = %entry.key(), "Route registered");
                entry.insert(handler);
                Ok(())
            }
        }
    }

    /// Exact lookup
    pub fn lookup(&self, path: &str) -> Option<&Arc<dyn RequestHandler>> {
        self.routes.get(path)
    }

    /// Listener-side matching: the longest registered path that prefixes `path`.
    ///
    /// A request for `/v1/users/get/extra` reaches the `/v1/users/get`
    /// dispatcher, which then rejects it for not matching exactly.
    pub fn resolve(&self, path: &str) -> Option<&Arc<dyn RequestHandler>> {
        if let Some(handler) = self.routes.get(path) {
            return Some(handler);
        }

        self.routes
            .iter()
            .filter(|(registered, _)| path.starts_with(registered.as_str()))
            .max_by_key(|(registered, _)| registered.len())
            .map(|(_, handler)| handler)
    }

    /// Registered paths, sorted
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("paths", &self.paths())
            .finish()
    }
}
