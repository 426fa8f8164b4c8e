// Application bootstrapper: discovery, route registration and listening

use crate::config::ServerConfig;
use crate::discovery::{ControllerScanner, InventoryScanner};
use crate::route_table::RouteTable;
use crate::server::{HttpServer, ServerHandle};
use crate::traits::{ControllerDefinition, DispatchOptions};
use crate::{Error, Result};
use tracing::{debug, info};

/// Signature every application entry point must have
pub type EntryPoint = fn(Vec<String>);

/// Application-level metadata read once at startup.
///
/// ```ignore
/// let app = AppDescriptor::new("demo")
///     .entry(main_entry)
///     .base_namespace(module_path!())
///     .port(8083);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppDescriptor {
    pub name: String,
    pub entry: Option<EntryPoint>,
    pub base_namespace: Option<String>,
    pub port: Option<u16>,
}

impl AppDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn entry(mut self, entry: EntryPoint) -> Self {
        self.entry = Some(entry);
        self
    }

    /// Module path scanned for controller registrations, usually `module_path!()`
    pub fn base_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.base_namespace = Some(namespace.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

/// A configured application: every route built and registered, not yet listening.
#[derive(Debug)]
pub struct Application {
    server: HttpServer,
    config: ServerConfig,
    args: Vec<String>,
}

impl Application {
    pub fn builder(descriptor: AppDescriptor) -> ApplicationBuilder {
        ApplicationBuilder::new(descriptor)
    }

    /// Discover controllers and build the route table.
    ///
    /// Any configuration error (missing entry point or namespace, a duplicate
    /// path, a bad binding declaration) is returned before anything listens.
    pub fn bootstrap(descriptor: AppDescriptor, args: Vec<String>) -> Result<Self> {
        Self::builder(descriptor).args(args).build()
    }

    /// Bootstrap, listen on the configured address, and serve until ctrl-c.
    pub async fn run(descriptor: AppDescriptor, args: Vec<String>) -> Result<()> {
        let app = Self::bootstrap(descriptor, args)?;
        let timeout_ms = app.config.shutdown_timeout_ms;
        let handle = app.start().await?;

        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received");
        handle.stop(timeout_ms).await;
        Ok(())
    }

    /// Listen on the configured host and port
    pub async fn start(self) -> Result<ServerHandle> {
        let addr = self.config.bind_address();
        self.start_on(&addr).await
    }

    /// Listen on `addr`, ignoring the configured host and port
    pub async fn start_on(self, addr: &str) -> Result<ServerHandle> {
        self.server.start(addr).await
    }

    pub fn routes(&self) -> &RouteTable {
        self.server.routes()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Command-line arguments handed to the application
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Step-by-step application setup
pub struct ApplicationBuilder {
    descriptor: AppDescriptor,
    args: Vec<String>,
    config: Option<ServerConfig>,
    scanner: Box<dyn ControllerScanner>,
    controllers: Vec<Box<dyn ControllerDefinition>>,
}

impl ApplicationBuilder {
    pub fn new(descriptor: AppDescriptor) -> Self {
        Self {
            descriptor,
            args: Vec::new(),
            config: None,
            scanner: Box::new(InventoryScanner),
            controllers: Vec::new(),
        }
    }

    pub fn args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Use `config` as is: descriptor port, TOML file and environment are skipped.
    /// A config without a base namespace still takes the descriptor's.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn scanner(mut self, scanner: impl ControllerScanner + 'static) -> Self {
        self.scanner = Box::new(scanner);
        self
    }

    /// Register a controller in addition to the discovered ones
    pub fn controller(mut self, controller: impl ControllerDefinition + 'static) -> Self {
        self.controllers.push(Box::new(controller));
        self
    }

    fn resolve_config(&mut self) -> Result<ServerConfig> {
        let descriptor = &self.descriptor;

        let config = match self.config.take() {
            Some(mut config) => {
                if config.base_namespace.is_none() {
                    config.base_namespace = descriptor.base_namespace.clone();
                }
                config
            }
            None => {
                let mut config = ServerConfig::default();
                config.base_namespace = descriptor.base_namespace.clone();
                if let Some(port) = descriptor.port {
                    config.port = port;
                }
                config.merge_env()?
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn build(mut self) -> Result<Application> {
        if self.descriptor.entry.is_none() {
            return Err(Error::MissingEntryPoint(self.descriptor.name.clone()));
        }

        let config = self.resolve_config()?;
        let namespace = config
            .base_namespace
            .clone()
            .ok_or_else(|| Error::MissingBaseNamespace(self.descriptor.name.clone()))?;

        info!(
            application = %self.descriptor.name,
            namespace = %namespace,
            "Bootstrapping application"
        );

        let mut controllers = self.scanner.find_controllers(&namespace);
        controllers.append(&mut self.controllers);

        let options = DispatchOptions {
            content_type: config.response_content_type.clone(),
        };

        let mut server = HttpServer::new();
        for controller in controllers {
            let type_name = controller.type_name();
            let metadata = controller.metadata();
            if metadata.tags.is_empty() {
                debug!(controller = type_name, prefix = %metadata.prefix, "Building routes");
            } else {
                info!(
                    controller = type_name,
                    prefix = %metadata.prefix,
                    tags = ?metadata.tags,
                    "Building tagged controller routes"
                );
            }

            for route in controller.into_routes(&options)? {
                server.register(route.path.clone(), route.handler)?;
                info!(verb = %route.verb, path = %route.path, "Mapped route");
            }
        }

        info!(routes = server.routes().len(), "Application bootstrap complete");

        Ok(Application {
            server,
            config,
            args: self.args,
        })
    }
}
