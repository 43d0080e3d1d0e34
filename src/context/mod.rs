//! Per-request value objects: the request [`Context`] and the write-once
//! [`ResponseSink`].
//!
//! One `Context`/`ResponseSink` pair is created for each inbound request,
//! owned exclusively by that request's dispatch, and discarded once the
//! response is finalized. Neither is ever shared across requests.

use std::collections::HashMap;

use crate::http::Request;

mod sink;

pub use sink::{ResponseSink, SinkError};

/// Path parameters captured from the matched route template.
///
/// Populated exactly once, by the resolver at match time; there is no public
/// mutator, so bindings cannot change after resolution.
#[derive(Debug, Clone, Default)]
pub struct PathParams {
    map: HashMap<String, String>,
}

impl PathParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    // Resolver-only: bind one captured value to its template name.
    pub(crate) fn insert(&mut self, name: String, value: String) {
        self.map.insert(name, value);
    }

    /// Returns the captured value for `name`, if the matched template
    /// declared it.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    /// Returns the number of bound parameters.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the matched template declared no parameters.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// The request side of one dispatch: the parsed request plus the path
/// parameters bound by the resolver.
///
/// The body is kept as opaque bytes; decoding it (e.g. as JSON via
/// [`Context::json`]) is the handler's responsibility.
pub struct Context {
    request: Request,
    params: PathParams,
}

impl Context {
    /// Create a context with no path parameters (unmatched or param-free
    /// routes).
    pub fn new(request: Request) -> Self {
        Self {
            request,
            params: PathParams::new(),
        }
    }

    /// Create a context carrying the parameters bound at match time.
    pub fn with_params(request: Request, params: PathParams) -> Self {
        Self { request, params }
    }

    /// Returns the underlying parsed request.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns all bound path parameters.
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Returns one bound path parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Returns the first value of a query parameter.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.request.query_param(key)
    }

    /// Returns every value of a repeated query parameter, in URL order.
    pub fn query_params(&self, key: &str) -> &[String] {
        self.request.query_params(key)
    }

    /// Returns a request header value (case-insensitive name lookup).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.headers().get(name)
    }

    /// Decode the raw body as JSON via the serde codec.
    ///
    /// The error converts into [`Fault::BadInput`](crate::Fault::BadInput),
    /// so handlers can propagate it with `?`.
    pub fn json<T>(&self) -> Result<T, serde_json::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_slice(self.request.body())
    }
}
