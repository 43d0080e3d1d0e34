//! Async TCP transport using Tokio.
//!
//! Accepts connections, parses HTTP/1.1 requests, and hands each one to the
//! [`Dispatcher`]. Supports persistent connections (keep-alive) and optional
//! TLS termination out of the box. This layer owns everything the dispatch
//! core does not: sockets, framing, body buffering, and connection lifecycle.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::dispatch::Dispatcher;
use crate::fault::{DefaultFaultMapper, FaultMapper};
use crate::http::{Request, RequestError, Response, StatusCode};
use crate::router::{Controller, Router, TemplateError};

mod tls;

pub use tls::TlsSettings;

/// Errors produced by the server.
///
/// Only startup errors ([`ServerError::Bind`], TLS/certificate configuration)
/// are fatal; per-request failures are recovered inside the connection loop
/// and never surface here.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS configuration error: {0}")]
    Tls(#[from] tokio_rustls::rustls::Error),

    #[error("certificate generation error: {0}")]
    Certificate(#[from] rcgen::Error),

    #[error("no private key found in {path}")]
    MissingPrivateKey { path: PathBuf },
}

/// Maximum size of a complete HTTP request we will buffer before rejecting it (8 MiB).
const MAX_REQUEST_SIZE: usize = 8 * 1024 * 1024;

/// Initial read buffer capacity per connection.
const INITIAL_BUF_SIZE: usize = 4096;

/// The routekit HTTP server.
///
/// Configuration is chainable, mirroring the registration-then-serve
/// lifecycle: routes are registered while the server is being built, and
/// [`serve`](Self::serve) consumes the builder, publishes the route table
/// read-only, and runs the accept loop until the process terminates.
///
/// # Examples
///
/// ```rust,no_run
/// use routekit::Server;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut server = Server::new("127.0.0.1:8080");
///     server.routes().get("/hello", |_ctx, _res| {
///         Ok(Some(serde_json::json!({"message": "Hello!"})))
///     })?;
///     server.serve().await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    addr: String,
    router: Router,
    mapper: Arc<dyn FaultMapper>,
    tls: Option<TlsSettings>,
}

impl Server {
    /// Create a server that will listen on `addr` (e.g. `"127.0.0.1:8080"`).
    ///
    /// Nothing is bound until [`serve`](Self::serve) runs.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            router: Router::new(),
            mapper: Arc::new(DefaultFaultMapper::new()),
            tls: None,
        }
    }

    /// Returns the route table for direct handler registration.
    pub fn routes(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Register every handler of a [`Controller`], in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if any of the controller's templates is
    /// malformed.
    pub fn mount<C>(mut self, controller: C) -> Result<Self, TemplateError>
    where
        C: Controller + Send + Sync + 'static,
    {
        Arc::new(controller).mount(&mut self.router)?;
        Ok(self)
    }

    /// Replace the default fault classification with a custom mapper.
    ///
    /// The custom mapper inherits the totality obligation: every fault must
    /// end in exactly one finalized response.
    pub fn fault_mapper<M: FaultMapper + 'static>(mut self, mapper: M) -> Self {
        self.mapper = Arc::new(mapper);
        self
    }

    /// Enable TLS termination.
    ///
    /// Use [`TlsSettings::self_signed`] for a locally generated development
    /// certificate, or [`TlsSettings::from_pem_files`] for a real one.
    pub fn tls(mut self, settings: TlsSettings) -> Self {
        self.tls = Some(settings);
        self
    }

    /// Bind the listener and serve until the process is terminated.
    ///
    /// Publishing happens here: the route table and fault mapper move into a
    /// shared [`Dispatcher`] and can no longer be modified.
    ///
    /// # Errors
    ///
    /// [`ServerError::Bind`] if the address cannot be bound; TLS and
    /// certificate errors if the configured settings cannot produce an
    /// acceptor; [`ServerError::Io`] if the listener itself fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: self.addr.clone(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;

        let acceptor = match &self.tls {
            Some(settings) => Some(settings.build_acceptor()?),
            None => None,
        };
        let scheme = if acceptor.is_some() { "https" } else { "http" };

        let dispatcher = Arc::new(Dispatcher::with_mapper(self.router, self.mapper));

        info!(address = %local_addr, scheme, "routekit listening");
        for route in dispatcher.routes() {
            info!(route = %route, "route registered");
        }

        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let dispatcher = Arc::clone(&dispatcher);
            let acceptor = acceptor.clone();

            tokio::spawn(async move {
                let result = match acceptor {
                    Some(acceptor) => match acceptor.accept(stream).await {
                        Ok(tls_stream) => {
                            handle_connection(tls_stream, peer_addr, dispatcher).await
                        }
                        Err(e) => {
                            warn!(peer = %peer_addr, error = %e, "TLS handshake failed");
                            return;
                        }
                    },
                    None => handle_connection(stream, peer_addr, dispatcher).await,
                };
                if let Err(e) = result {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }
    }
}

/// Handles a single connection over its lifetime.
///
/// HTTP/1.1 connections are persistent by default: we loop, reading one
/// request per iteration, until the peer closes the connection or signals
/// `Connection: close`. Generic over the stream so plain TCP and TLS
/// connections share one code path.
async fn handle_connection<S>(
    mut stream: S,
    peer_addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
) -> Result<(), std::io::Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);

    loop {
        let bytes_read = stream.read_buf(&mut buf).await?;

        if bytes_read == 0 {
            debug!(peer = %peer_addr, "connection closed by peer");
            break;
        }

        // Guard against excessively large requests.
        if buf.len() > MAX_REQUEST_SIZE {
            warn!(peer = %peer_addr, "request too large — sending 413");
            let response = Response::new(StatusCode::PayloadTooLarge)
                .body("Request entity too large")
                .keep_alive(false);
            stream.write_all(&response.into_bytes()).await?;
            break;
        }

        // Attempt to parse the buffered data as an HTTP request.
        let (request, body_offset) = match Request::parse(&buf) {
            Ok(pair) => pair,
            Err(RequestError::Incomplete) => {
                // Headers not yet fully received — read more data.
                continue;
            }
            Err(e) => {
                warn!(peer = %peer_addr, error = %e, "bad request — sending 400");
                let response = Response::new(StatusCode::BadRequest)
                    .body(format!("Bad Request: {e}"))
                    .keep_alive(false);
                stream.write_all(&response.into_bytes()).await?;
                break;
            }
        };

        // Wait for the full body to arrive if Content-Length is set.
        let content_length = request.content_length().unwrap_or(0);
        let total_needed = body_offset + content_length;
        if buf.len() < total_needed {
            continue;
        }

        let keep_alive = request.is_keep_alive();

        debug!(
            peer = %peer_addr,
            method = %request.method(),
            path = %request.path(),
            "dispatching request"
        );

        let response = dispatcher.dispatch(request);
        stream.write_all(&response.into_bytes()).await?;
        stream.flush().await?;

        // Drop the consumed request bytes from the buffer.
        let _ = buf.split_to(total_needed);

        if !keep_alive {
            debug!(peer = %peer_addr, "Connection: close — shutting down");
            break;
        }
    }

    Ok(())
}
