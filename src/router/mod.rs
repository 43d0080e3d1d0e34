//! Route table and resolver — map `(verb, path template)` pairs to handlers.
//!
//! Routes are compiled once at registration time and kept in registration
//! order. Resolution scans that order and returns the **first** route whose
//! verb and template both match, so overlapping templates are disambiguated by
//! when they were registered, never by shape. Registering the same
//! `(verb, template)` twice keeps both entries; the earlier one always wins.
//!
//! The table is mutable only during the registration phase. [`crate::Server`]
//! consumes the `Router` when serving begins and publishes it behind an `Arc`,
//! after which it is read-only and safe to share across connection tasks
//! without synchronization.

use std::fmt;
use std::sync::Arc;

use crate::context::{Context, PathParams, ResponseSink};
use crate::fault::Fault;
use crate::http::Method;

pub mod template;

pub use template::{RouteTemplate, TemplateError};

/// What a handler returns.
///
/// - `Ok(Some(value))` — the dispatcher serializes `value` as JSON with
///   status 200, unless the handler already finalized the response itself.
/// - `Ok(None)` — the dispatcher sends an empty 200, unless already finalized.
/// - `Err(fault)` — routed to the [`FaultMapper`](crate::fault::FaultMapper).
pub type HandlerResult = Result<Option<serde_json::Value>, Fault>;

/// Type-erased, shared handler function.
///
/// Every handler receives exactly the request [`Context`] and the
/// [`ResponseSink`] — this binding is fixed at the type level rather than
/// discovered at runtime. Handlers are synchronous and must not block on I/O
/// or long computations: the calling connection task is occupied for the full
/// duration of the call.
pub type Handler = Arc<dyn Fn(&Context, &mut ResponseSink) -> HandlerResult + Send + Sync>;

/// A unit of handlers that registers itself into a [`Router`].
///
/// This is the explicit replacement for annotation scanning: `mount` makes one
/// registration call per handler, each a closure capturing the owning `Arc`
/// instance, in declaration order.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use routekit::{Context, Controller, ResponseSink, Router, TemplateError};
/// use routekit::router::HandlerResult;
///
/// struct Ping;
///
/// impl Ping {
///     fn ping(&self, _ctx: &Context, _res: &mut ResponseSink) -> HandlerResult {
///         Ok(Some(serde_json::json!({"pong": true})))
///     }
/// }
///
/// impl Controller for Ping {
///     fn mount(self: Arc<Self>, router: &mut Router) -> Result<(), TemplateError> {
///         let this = Arc::clone(&self);
///         router.get("/ping", move |ctx, res| this.ping(ctx, res))
///     }
/// }
/// ```
pub trait Controller {
    /// Register every handler of this unit into `router`.
    fn mount(self: Arc<Self>, router: &mut Router) -> Result<(), TemplateError>;
}

/// A single registered route: verb, compiled template, and handler.
///
/// Created once at registration and never mutated afterwards; owned
/// exclusively by the [`Router`].
pub struct Route {
    method: Method,
    template: RouteTemplate,
    handler: Handler,
}

impl Route {
    /// Returns the HTTP verb this route answers.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the compiled template.
    pub fn template(&self) -> &RouteTemplate {
        &self.template
    }

    /// Returns the handler bound at registration time.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.template.raw())
    }
}

/// Ordered route table with first-match resolution.
///
/// # Examples
///
/// ```rust
/// use routekit::{Method, Router};
///
/// let mut router = Router::new();
/// router.get("/users/{id}", |ctx, _res| {
///     let id = ctx.param("id").unwrap_or("unknown");
///     Ok(Some(serde_json::json!({"id": id})))
/// }).unwrap();
///
/// let (route, params) = router.resolve(&Method::Get, "/users/42").unwrap();
/// assert_eq!(route.template().raw(), "/users/{id}");
/// assert_eq!(params.get("id"), Some("42"));
/// ```
pub struct Router {
    routes: Vec<Route>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a new, empty `Router` with no registered routes.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Compile `template` and append a route for `method` to the end of the
    /// table. No deduplication is performed.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the template string is malformed.
    pub fn route<H>(
        &mut self,
        method: Method,
        template: &str,
        handler: H,
    ) -> Result<(), TemplateError>
    where
        H: Fn(&Context, &mut ResponseSink) -> HandlerResult + Send + Sync + 'static,
    {
        let template = RouteTemplate::compile(template)?;
        self.routes.push(Route {
            method,
            template,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    /// Register a handler for `GET` requests matching `template`.
    pub fn get<H>(&mut self, template: &str, handler: H) -> Result<(), TemplateError>
    where
        H: Fn(&Context, &mut ResponseSink) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(Method::Get, template, handler)
    }

    /// Register a handler for `POST` requests matching `template`.
    pub fn post<H>(&mut self, template: &str, handler: H) -> Result<(), TemplateError>
    where
        H: Fn(&Context, &mut ResponseSink) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(Method::Post, template, handler)
    }

    /// Register a handler for `PUT` requests matching `template`.
    pub fn put<H>(&mut self, template: &str, handler: H) -> Result<(), TemplateError>
    where
        H: Fn(&Context, &mut ResponseSink) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(Method::Put, template, handler)
    }

    /// Register a handler for `DELETE` requests matching `template`.
    pub fn delete<H>(&mut self, template: &str, handler: H) -> Result<(), TemplateError>
    where
        H: Fn(&Context, &mut ResponseSink) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(Method::Delete, template, handler)
    }

    /// Returns the registered routes in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the first route matching `method` and `path` and bind its path
    /// parameters.
    ///
    /// Scans the table in registration order; for each entry whose verb equals
    /// `method`, attempts a full match of `path` against the entry's template.
    /// The first success wins. Returns `None` when the table is exhausted —
    /// a path that matched some route under a different verb is
    /// indistinguishable from a path that matched nothing.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<(&Route, PathParams)> {
        for route in &self.routes {
            if route.method != *method {
                continue;
            }
            if let Some(values) = route.template.captures(path) {
                let mut params = PathParams::new();
                for (name, value) in route.template.param_names().iter().zip(values) {
                    params.insert(name.clone(), value);
                }
                return Some((route, params));
            }
        }
        None
    }
}
