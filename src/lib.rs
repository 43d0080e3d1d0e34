//! # routekit
//!
//! An embeddable HTTP request-dispatch core with an async transport on top.
//!
//! routekit turns parsed HTTP requests into exactly one response each. Routes
//! are `(verb, path template)` pairs registered explicitly, resolved in
//! registration order with first-match-wins semantics. Handlers receive the
//! request [`Context`] and a write-once [`ResponseSink`]; failures are
//! reported as tagged [`Fault`] values and classified into status codes by a
//! pluggable [`FaultMapper`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use routekit::{Fault, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new("127.0.0.1:8080");
//!
//!     server.routes().get("/hello", |_ctx, _res| {
//!         Ok(Some(serde_json::json!({"message": "Hello, World!"})))
//!     })?;
//!
//!     server.routes().get("/users/{id}", |ctx, _res| {
//!         let id = ctx
//!             .param("id")
//!             .ok_or_else(|| Fault::bad_input("missing id"))?;
//!         Ok(Some(serde_json::json!({"id": id})))
//!     })?;
//!
//!     server.serve().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Embedding without the server
//!
//! The dispatch core is independent of the transport: build a [`Router`],
//! wrap it in a [`Dispatcher`], and feed it parsed [`Request`]s directly.
//!
//! ```rust
//! use routekit::{Dispatcher, Request, Router, StatusCode};
//!
//! let mut router = Router::new();
//! router.get("/ping", |_ctx, _res| Ok(Some(serde_json::json!("pong")))).unwrap();
//! let dispatcher = Dispatcher::new(router);
//!
//! let (request, _) = Request::parse(b"GET /ping HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
//! assert_eq!(dispatcher.dispatch(request).status(), StatusCode::Ok);
//! ```

pub mod context;
pub mod dispatch;
pub mod fault;
pub mod http;
pub mod router;
pub mod server;

pub use context::{Context, PathParams, ResponseSink, SinkError};
pub use dispatch::Dispatcher;
pub use fault::{DefaultFaultMapper, Fault, FaultMapper, FaultRule};
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use router::{Controller, Route, RouteTemplate, Router, TemplateError};
pub use server::{Server, ServerError, TlsSettings};
