//! Write-once response sink.

use serde::Serialize;
use thiserror::Error;

use crate::http::{Response, StatusCode};

const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";

/// Rejected writes against a [`ResponseSink`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SinkError {
    /// The response was already finalized; a second write is a programming
    /// error at the call site, not a recoverable condition.
    #[error("response already sent")]
    AlreadySent,
}

/// The response side of one dispatch.
///
/// A sink is Unsent until the first finalizer succeeds, then Sent forever:
/// the transition happens at most once per request and is irreversible.
/// [`json`](Self::json), [`text`](Self::text) and [`html`](Self::html) reject
/// a second write with [`SinkError::AlreadySent`] so double-writes are
/// observable during development; [`send_error`](Self::send_error) instead
/// treats an already-sent response as an expected race and does nothing.
///
/// # Examples
///
/// ```rust
/// use routekit::{ResponseSink, SinkError, StatusCode};
///
/// let mut sink = ResponseSink::new(true);
/// sink.text(StatusCode::Ok, "hello").unwrap();
/// assert!(sink.is_sent());
/// assert_eq!(
///     sink.text(StatusCode::Ok, "again"),
///     Err(SinkError::AlreadySent)
/// );
/// ```
pub struct ResponseSink {
    keep_alive: bool,
    finalized: Option<Response>,
}

impl ResponseSink {
    /// Create an Unsent sink. `keep_alive` is stamped onto the finalized
    /// response so the transport can frame the connection correctly.
    pub fn new(keep_alive: bool) -> Self {
        Self {
            keep_alive,
            finalized: None,
        }
    }

    /// Returns `true` once a finalizer has run.
    pub fn is_sent(&self) -> bool {
        self.finalized.is_some()
    }

    /// Finalize as JSON: serialize `value` and send it with `status`.
    ///
    /// If serialization fails, the sink degrades in place to a plain-text 500
    /// naming the codec error — the failure never propagates to the caller.
    ///
    /// # Errors
    ///
    /// [`SinkError::AlreadySent`] if the response was already finalized.
    pub fn json<T: Serialize + ?Sized>(
        &mut self,
        status: StatusCode,
        value: &T,
    ) -> Result<(), SinkError> {
        if self.is_sent() {
            return Err(SinkError::AlreadySent);
        }
        match serde_json::to_string(value) {
            Ok(body) => self.finalize(status, body, CONTENT_TYPE_JSON),
            Err(err) => self.finalize(
                StatusCode::InternalServerError,
                format!("JSON serialization error: {err}"),
                CONTENT_TYPE_TEXT,
            ),
        }
        Ok(())
    }

    /// Finalize as plain text with `status`.
    ///
    /// # Errors
    ///
    /// [`SinkError::AlreadySent`] if the response was already finalized.
    pub fn text(&mut self, status: StatusCode, body: impl Into<String>) -> Result<(), SinkError> {
        if self.is_sent() {
            return Err(SinkError::AlreadySent);
        }
        self.finalize(status, body.into(), CONTENT_TYPE_TEXT);
        Ok(())
    }

    /// Finalize as HTML with `status`.
    ///
    /// # Errors
    ///
    /// [`SinkError::AlreadySent`] if the response was already finalized.
    pub fn html(&mut self, status: StatusCode, body: impl Into<String>) -> Result<(), SinkError> {
        if self.is_sent() {
            return Err(SinkError::AlreadySent);
        }
        self.finalize(status, body.into(), CONTENT_TYPE_HTML);
        Ok(())
    }

    /// Finalize a plain-text error, or do nothing if already Sent.
    ///
    /// This is the variant used on failure paths, where a handler may already
    /// have produced a response before the failure surfaced.
    pub fn send_error(&mut self, status: StatusCode, message: impl Into<String>) {
        if self.is_sent() {
            return;
        }
        self.finalize(status, message.into(), CONTENT_TYPE_TEXT);
    }

    fn finalize(&mut self, status: StatusCode, body: String, content_type: &str) {
        self.finalized = Some(
            Response::new(status)
                .header("Content-Type", content_type)
                .body(body)
                .keep_alive(self.keep_alive),
        );
    }

    /// Consume the sink and hand the finalized response to the transport.
    ///
    /// The dispatcher guarantees every request is finalized before this runs;
    /// the fallback exists so the transport still receives a well-formed
    /// response if that contract is ever broken by a custom caller.
    pub fn into_response(self) -> Response {
        match self.finalized {
            Some(response) => response,
            None => Response::new(StatusCode::InternalServerError)
                .header("Content-Type", CONTENT_TYPE_TEXT)
                .body("Internal Server Error")
                .keep_alive(self.keep_alive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn starts_unsent() {
        let sink = ResponseSink::new(true);
        assert!(!sink.is_sent());
    }

    #[test]
    fn text_finalizes_once() {
        let mut sink = ResponseSink::new(true);
        sink.text(StatusCode::Created, "made").unwrap();
        assert!(sink.is_sent());

        let response = sink.into_response();
        assert_eq!(response.status(), StatusCode::Created);
        assert_eq!(response.body_bytes(), b"made");
        assert_eq!(
            response.headers().get("content-type"),
            Some("text/plain; charset=utf-8")
        );
    }

    #[test]
    fn json_sets_content_type_and_body() {
        let mut sink = ResponseSink::new(true);
        sink.json(StatusCode::Ok, &serde_json::json!({"a": 1})).unwrap();

        let response = sink.into_response();
        assert_eq!(
            response.headers().get("content-type"),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(response.body_bytes(), br#"{"a":1}"#);
    }

    #[test]
    fn html_sets_content_type() {
        let mut sink = ResponseSink::new(true);
        sink.html(StatusCode::Ok, "<p>hi</p>").unwrap();
        assert_eq!(
            sink.into_response().headers().get("content-type"),
            Some("text/html; charset=utf-8")
        );
    }

    #[test]
    fn second_write_is_rejected_not_silently_dropped() {
        let mut sink = ResponseSink::new(true);
        sink.json(StatusCode::Ok, &serde_json::json!(1)).unwrap();

        assert_eq!(
            sink.json(StatusCode::Ok, &serde_json::json!(2)),
            Err(SinkError::AlreadySent)
        );
        assert_eq!(sink.text(StatusCode::Ok, "x"), Err(SinkError::AlreadySent));
        assert_eq!(sink.html(StatusCode::Ok, "x"), Err(SinkError::AlreadySent));

        // The first write is what goes out.
        assert_eq!(sink.into_response().body_bytes(), b"1");
    }

    #[test]
    fn send_error_is_noop_once_sent() {
        let mut sink = ResponseSink::new(true);
        sink.text(StatusCode::Ok, "fine").unwrap();
        sink.send_error(StatusCode::InternalServerError, "too late");

        let response = sink.into_response();
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body_bytes(), b"fine");
    }

    #[test]
    fn send_error_finalizes_when_unsent() {
        let mut sink = ResponseSink::new(false);
        sink.send_error(StatusCode::NotFound, "Not Found: /x");

        let response = sink.into_response();
        assert_eq!(response.status(), StatusCode::NotFound);
        assert_eq!(response.body_bytes(), b"Not Found: /x");
    }

    #[test]
    fn serialization_failure_degrades_to_plain_text_500() {
        // serde_json rejects maps with non-string keys.
        let mut unencodable = BTreeMap::new();
        unencodable.insert((1u8, 2u8), "x");

        let mut sink = ResponseSink::new(true);
        sink.json(StatusCode::Ok, &unencodable).unwrap();

        let response = sink.into_response();
        assert_eq!(response.status(), StatusCode::InternalServerError);
        assert_eq!(
            response.headers().get("content-type"),
            Some("text/plain; charset=utf-8")
        );
        assert!(response.body_bytes().starts_with(b"JSON serialization error"));
    }

    #[test]
    fn unfinalized_sink_falls_back_to_500() {
        let response = ResponseSink::new(true).into_response();
        assert_eq!(response.status(), StatusCode::InternalServerError);
    }
}
