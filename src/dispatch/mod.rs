//! Request dispatch — resolve, invoke, and finalize exactly one response.
//!
//! One call to [`Dispatcher::dispatch`] walks a request through a fixed
//! lifecycle:
//!
//! ```text
//! Received ──resolve──▶ Resolved ──invoke──▶ Responded
//!     │                                          ▲
//!     └──────────── Unmatched (404) ─────────────┘
//! ```
//!
//! Every path through the lifecycle finalizes the response exactly once:
//! unmatched requests get a 404 naming the path, handler faults go through
//! the [`FaultMapper`], and handlers that return without writing are
//! auto-finalized (JSON 200 for a returned value, empty 200 otherwise). No
//! per-request failure escapes this function.
//!
//! Dispatch is synchronous: the calling connection task is occupied for the
//! full duration of resolution, handler execution, and finalization. The
//! dispatcher holds no per-request state of its own, so one instance is
//! shared by every connection task.

use std::sync::Arc;

use tracing::debug;

use crate::context::{Context, ResponseSink};
use crate::fault::{DefaultFaultMapper, FaultMapper};
use crate::http::{Request, Response, StatusCode};
use crate::router::{Route, Router};

/// Orchestrates one request from resolution through response finalization.
///
/// # Examples
///
/// ```rust
/// use routekit::{Dispatcher, Request, Router, StatusCode};
///
/// let mut router = Router::new();
/// router.get("/ping", |_ctx, _res| Ok(Some(serde_json::json!("pong")))).unwrap();
///
/// let dispatcher = Dispatcher::new(router);
/// let raw = b"GET /ping HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let (request, _) = Request::parse(raw).unwrap();
///
/// let response = dispatcher.dispatch(request);
/// assert_eq!(response.status(), StatusCode::Ok);
/// ```
pub struct Dispatcher {
    router: Arc<Router>,
    mapper: Arc<dyn FaultMapper>,
}

impl Dispatcher {
    /// Create a dispatcher over a finished route table, using the default
    /// fault classification.
    ///
    /// Taking the `Router` by value ends the registration phase: the table is
    /// published read-only behind an `Arc` and cannot be mutated afterwards.
    pub fn new(router: Router) -> Self {
        Self::with_mapper(router, Arc::new(DefaultFaultMapper::new()))
    }

    /// Create a dispatcher with a custom [`FaultMapper`].
    ///
    /// The mapper must stay total: every fault it receives must end in
    /// exactly one finalized response (unless one was already sent).
    pub fn with_mapper(router: Router, mapper: Arc<dyn FaultMapper>) -> Self {
        Self {
            router: Arc::new(router),
            mapper,
        }
    }

    /// Returns the published routes in registration order.
    pub fn routes(&self) -> &[Route] {
        self.router.routes()
    }

    /// Handle one request and produce its response.
    ///
    /// This function is total over parsed requests: whatever the handler
    /// does — writes early, returns a value, returns nothing, or fails — the
    /// transport receives exactly one well-formed response.
    pub fn dispatch(&self, request: Request) -> Response {
        let mut sink = ResponseSink::new(request.is_keep_alive());

        match self.router.resolve(request.method(), request.path()) {
            None => {
                debug!(method = %request.method(), path = %request.path(), "no route matched");
                sink.send_error(
                    StatusCode::NotFound,
                    format!("Not Found: {}", request.path()),
                );
            }
            Some((route, params)) => {
                debug!(route = %route, "route resolved");
                let ctx = Context::with_params(request, params);

                match (route.handler())(&ctx, &mut sink) {
                    Ok(returned) => {
                        if !sink.is_sent() {
                            match returned {
                                // `json` cannot be rejected here: the sink is
                                // still Unsent and serialization failures
                                // degrade internally.
                                Some(value) => {
                                    let _ = sink.json(StatusCode::Ok, &value);
                                }
                                None => {
                                    let _ = sink.text(StatusCode::Ok, "");
                                }
                            }
                        }
                    }
                    Err(fault) => {
                        debug!(kind = fault.kind(), message = fault.message(), "handler fault");
                        self.mapper.handle(&fault, &mut sink);
                        // Backstop for custom mappers that break the totality
                        // contract.
                        if !sink.is_sent() {
                            sink.send_error(
                                StatusCode::InternalServerError,
                                "Internal Server Error",
                            );
                        }
                    }
                }
            }
        }

        sink.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::Fault;
    use serde_json::json;

    fn request(method: &str, target: &str) -> Request {
        let raw = format!("{method} {target} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let (req, _) = Request::parse(raw.as_bytes()).unwrap();
        req
    }

    fn body_json(response: &Response) -> serde_json::Value {
        serde_json::from_slice(response.body_bytes()).unwrap()
    }

    #[test]
    fn unmatched_request_is_404_naming_the_path() {
        let dispatcher = Dispatcher::new(Router::new());
        let response = dispatcher.dispatch(request("GET", "/missing"));
        assert_eq!(response.status(), StatusCode::NotFound);
        assert_eq!(response.body_bytes(), b"Not Found: /missing");
    }

    #[test]
    fn verb_mismatch_is_also_404() {
        let mut router = Router::new();
        router.get("/x", |_ctx, _res| Ok(None)).unwrap();
        let dispatcher = Dispatcher::new(router);

        let response = dispatcher.dispatch(request("POST", "/x"));
        assert_eq!(response.status(), StatusCode::NotFound);
    }

    #[test]
    fn returned_value_becomes_json_200() {
        let mut router = Router::new();
        router
            .get("/value", |_ctx, _res| Ok(Some(json!({"n": 7}))))
            .unwrap();
        let dispatcher = Dispatcher::new(router);

        let response = dispatcher.dispatch(request("GET", "/value"));
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(
            response.headers().get("content-type"),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(body_json(&response), json!({"n": 7}));
    }

    #[test]
    fn no_value_no_write_becomes_empty_200() {
        let mut router = Router::new();
        router.get("/silent", |_ctx, _res| Ok(None)).unwrap();
        let dispatcher = Dispatcher::new(router);

        let response = dispatcher.dispatch(request("GET", "/silent"));
        assert_eq!(response.status(), StatusCode::Ok);
        assert!(response.body_bytes().is_empty());
    }

    #[test]
    fn handler_written_response_is_left_untouched() {
        let mut router = Router::new();
        router
            .get("/manual", |_ctx, res| {
                res.text(StatusCode::Created, "made").unwrap();
                // A returned value must not overwrite the explicit response.
                Ok(Some(json!("ignored")))
            })
            .unwrap();
        let dispatcher = Dispatcher::new(router);

        let response = dispatcher.dispatch(request("GET", "/manual"));
        assert_eq!(response.status(), StatusCode::Created);
        assert_eq!(response.body_bytes(), b"made");
    }

    #[test]
    fn fault_is_classified_with_structured_body() {
        let mut router = Router::new();
        router
            .get("/boom", |_ctx, _res| Err(Fault::bad_input("bad")))
            .unwrap();
        let dispatcher = Dispatcher::new(router);

        let response = dispatcher.dispatch(request("GET", "/boom"));
        assert_eq!(response.status(), StatusCode::BadRequest);
        assert_eq!(
            body_json(&response),
            json!({"error": true, "message": "bad", "type": "BadInput"})
        );
    }

    #[test]
    fn fault_after_write_leaves_first_response() {
        let mut router = Router::new();
        router
            .get("/late", |_ctx, res| {
                res.text(StatusCode::Accepted, "partial").unwrap();
                Err(Fault::failure("post-write failure"))
            })
            .unwrap();
        let dispatcher = Dispatcher::new(router);

        let response = dispatcher.dispatch(request("GET", "/late"));
        assert_eq!(response.status(), StatusCode::Accepted);
        assert_eq!(response.body_bytes(), b"partial");
    }

    #[test]
    fn path_params_reach_the_handler() {
        let mut router = Router::new();
        router
            .get("/users/{id}", |ctx, _res| {
                Ok(Some(json!({"id": ctx.param("id").unwrap_or_default()})))
            })
            .unwrap();
        let dispatcher = Dispatcher::new(router);

        let response = dispatcher.dispatch(request("GET", "/users/42"));
        assert_eq!(body_json(&response), json!({"id": "42"}));
    }

    #[test]
    fn query_params_reach_the_handler() {
        let mut router = Router::new();
        router
            .get("/sum", |ctx, _res| {
                let a: f64 = ctx
                    .query_param("a")
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| Fault::bad_input("parameter a is required"))?;
                let b: f64 = ctx
                    .query_param("b")
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| Fault::bad_input("parameter b is required"))?;
                Ok(Some(json!({"result": a + b})))
            })
            .unwrap();
        let dispatcher = Dispatcher::new(router);

        let ok = dispatcher.dispatch(request("GET", "/sum?a=2&b=3"));
        assert_eq!(body_json(&ok), json!({"result": 5.0}));

        let bad = dispatcher.dispatch(request("GET", "/sum?a=2"));
        assert_eq!(bad.status(), StatusCode::BadRequest);
    }

    #[test]
    fn first_registered_route_always_executes() {
        let mut router = Router::new();
        router
            .get("/x", |_ctx, _res| Ok(Some(json!("first"))))
            .unwrap();
        router
            .get("/x", |_ctx, _res| Ok(Some(json!("second"))))
            .unwrap();
        let dispatcher = Dispatcher::new(router);

        for _ in 0..3 {
            let response = dispatcher.dispatch(request("GET", "/x"));
            assert_eq!(body_json(&response), json!("first"));
        }
    }

    #[test]
    fn custom_mapper_is_consulted() {
        struct TeapotMapper;
        impl FaultMapper for TeapotMapper {
            fn handle(&self, _fault: &Fault, response: &mut ResponseSink) {
                response.send_error(StatusCode::Conflict, "conflict");
            }
        }

        let mut router = Router::new();
        router
            .get("/boom", |_ctx, _res| Err(Fault::failure("x")))
            .unwrap();
        let dispatcher = Dispatcher::with_mapper(router, Arc::new(TeapotMapper));

        let response = dispatcher.dispatch(request("GET", "/boom"));
        assert_eq!(response.status(), StatusCode::Conflict);
    }

    #[test]
    fn broken_custom_mapper_still_yields_a_response() {
        struct SilentMapper;
        impl FaultMapper for SilentMapper {
            fn handle(&self, _fault: &Fault, _response: &mut ResponseSink) {}
        }

        let mut router = Router::new();
        router
            .get("/boom", |_ctx, _res| Err(Fault::failure("x")))
            .unwrap();
        let dispatcher = Dispatcher::with_mapper(router, Arc::new(SilentMapper));

        let response = dispatcher.dispatch(request("GET", "/boom"));
        assert_eq!(response.status(), StatusCode::InternalServerError);
    }

    #[test]
    fn fault_totality_over_every_kind() {
        let faults = [
            Fault::bad_input("a"),
            Fault::access_denied("b"),
            Fault::failure("thing not found"),
            Fault::failure("other"),
            Fault::failure(""),
        ];
        let expected = [400u16, 403, 404, 500, 500];

        for (fault, status) in faults.into_iter().zip(expected) {
            let mut router = Router::new();
            let fault_clone = fault.clone();
            router
                .get("/f", move |_ctx, _res| Err(fault_clone.clone()))
                .unwrap();
            let dispatcher = Dispatcher::new(router);

            let response = dispatcher.dispatch(request("GET", "/f"));
            assert_eq!(response.status().as_u16(), status, "fault: {fault:?}");
            let body = body_json(&response);
            assert_eq!(body["error"], json!(true));
            assert!(body["message"].is_string());
            assert!(body["type"].is_string());
        }
    }
}
