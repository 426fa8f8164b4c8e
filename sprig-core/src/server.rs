// HTTP listener: hyper http1 over tokio, dispatching through the route table

use crate::dispatcher::NOT_FOUND_BODY;
use crate::route_table::RouteTable;
use crate::traits::RequestHandler;
use crate::{HttpRequest, HttpResponse, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, body::Incoming as IncomingBody};
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// HTTP listener collaborator: a route table plus the accept loop serving it.
#[derive(Debug, Default)]
pub struct HttpServer {
    table: RouteTable,
}

impl HttpServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its full path; a duplicate path is an error.
    pub fn register(&mut self, path: impl Into<String>, handler: Arc<dyn RequestHandler>) -> Result<()> {
        self.table.register(path, handler)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    /// Bind `addr` (`host:port`, port 0 for an ephemeral port) and start serving.
    ///
    /// The route table is frozen from here on. Dropping the returned handle
    /// closes the listener; open connections then drain in the background.
    pub async fn start(self, addr: &str) -> Result<ServerHandle> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let table = Arc::new(self.table);

        info!(address = %local_addr, routes = table.len(), "Server listening");

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(accept_loop(listener, table, shutdown_rx));

        Ok(ServerHandle {
            local_addr,
            shutdown,
            task,
        })
    }
}

/// Handle on a running server
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, let open connections finish their current request,
    /// and abort whatever is still running after `timeout_ms`.
    ///
    /// Returns `true` when every connection closed in time.
    pub async fn stop(mut self, timeout_ms: u64) -> bool {
        info!(timeout_ms, "Stopping server");
        // Fails only if the accept loop is already gone
        let _ = self.shutdown.send(true);

        match tokio::time::timeout(Duration::from_millis(timeout_ms), &mut self.task).await {
            Ok(Ok(())) => {
                info!("Server stopped");
                true
            }
            Ok(Err(err)) => {
                error!(error = %err, "Server task failed");
                false
            }
            Err(_) => {
                warn!(timeout_ms, "Connections still open after timeout, aborting");
                self.task.abort();
                false
            }
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    table: Arc<RouteTable>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        warn!(error = %err, "Failed to accept connection");
                        continue;
                    }
                };
                debug!(peer = %peer, "Connection accepted");
                connections.spawn(serve_connection(stream, table.clone(), shutdown.clone()));
            }
        }
    }

    drop(listener);
    debug!(open = connections.len(), "Listener closed, draining connections");
    while connections.join_next().await.is_some() {}
}

async fn serve_connection(
    stream: tokio::net::TcpStream,
    table: Arc<RouteTable>,
    mut shutdown: watch::Receiver<bool>,
) {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req: Request<IncomingBody>| {
        let table = table.clone();
        async move { handle_request(req, table).await }
    });

    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        served = conn.as_mut() => {
            if let Err(err) = served {
                debug!(error = %err, "Error serving connection");
            }
            return;
        }
        _ = shutdown.wait_for(|stop| *stop) => {
            conn.as_mut().graceful_shutdown();
        }
    }

    if let Err(err) = conn.await {
        debug!(error = %err, "Error closing connection");
    }
}

/// Translate one hyper request, route it, and translate the response back.
async fn handle_request(
    req: Request<IncomingBody>,
    table: Arc<RouteTable>,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    let mut headers = HashMap::new();
    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            headers.insert(name.to_string(), value.to_string());
        }
    }

    let body = req.collect().await?.to_bytes().to_vec();

    let request = HttpRequest {
        method,
        path,
        query,
        headers,
        body,
    };

    let response = match table.resolve(&request.path) {
        Some(handler) => handler
            .handle(request)
            .await
            .unwrap_or_else(|err| HttpResponse::from_error(&err)),
        None => {
            warn!(method = %request.method, path = %request.path, "No route for request");
            HttpResponse::text(404, NOT_FOUND_BODY)
        }
    };

    Ok(into_hyper(response))
}

fn into_hyper(response: HttpResponse) -> Response<Full<Bytes>> {
    let status = response.status;
    let mut builder = Response::builder().status(status);
    for (key, value) in response.headers {
        builder = builder.header(key, value);
    }

    builder
        .body(Full::new(Bytes::from(response.body)))
        .unwrap_or_else(|err| {
            error!(status, error = %err, "Invalid response");
            let mut fallback = Response::new(Full::new(Bytes::from_static(b"Internal Server Error")));
            *fallback.status_mut() = ::http::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}
