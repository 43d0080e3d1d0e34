//! Fault classification — turn any handler error into exactly one response.
//!
//! Handlers report failures as [`Fault`] values: a small closed set of tagged
//! kinds produced explicitly at the error site, instead of an open exception
//! hierarchy inspected by type. The [`DefaultFaultMapper`] classifies a fault
//! with an ordered list of [`FaultRule`]s — first match wins — ending in an
//! unconditional 500 fallback, so classification is total by construction.
//!
//! The mapper is pluggable via the [`FaultMapper`] trait. A custom mapper
//! carries the same obligation: it must finalize exactly one response for
//! every fault it is handed (nothing in the type system enforces this).

use serde_json::json;
use thiserror::Error;

use crate::context::ResponseSink;
use crate::http::StatusCode;

/// A handler-reported failure.
///
/// # Examples
///
/// ```rust
/// use routekit::Fault;
///
/// let fault = Fault::bad_input("age must be a number");
/// assert_eq!(fault.kind(), "BadInput");
/// assert_eq!(fault.message(), "age must be a number");
/// ```
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Fault {
    /// The request carried invalid input. Classified 400.
    #[error("{0}")]
    BadInput(String),

    /// The caller is not allowed to perform the operation. Classified 403.
    #[error("{0}")]
    AccessDenied(String),

    /// Any other failure. Classified 404 when the message contains the
    /// case-insensitive substring "not found", 500 otherwise.
    #[error("{0}")]
    Failure(String),
}

impl Fault {
    /// Shorthand for [`Fault::BadInput`].
    pub fn bad_input(message: impl Into<String>) -> Self {
        Self::BadInput(message.into())
    }

    /// Shorthand for [`Fault::AccessDenied`].
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied(message.into())
    }

    /// Shorthand for [`Fault::Failure`].
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    /// Returns the kind name used as the `type` field of the error body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadInput(_) => "BadInput",
            Self::AccessDenied(_) => "AccessDenied",
            Self::Failure(_) => "Failure",
        }
    }

    /// Returns the fault message.
    pub fn message(&self) -> &str {
        match self {
            Self::BadInput(m) | Self::AccessDenied(m) | Self::Failure(m) => m,
        }
    }
}

// Lets handlers `?` body-decoding failures straight into a 400.
impl From<serde_json::Error> for Fault {
    fn from(err: serde_json::Error) -> Self {
        Self::BadInput(format!("invalid JSON body: {err}"))
    }
}

// A rejected sink write inside a handler is a handler bug; surface it as a
// plain failure so it classifies as 500.
impl From<crate::context::SinkError> for Fault {
    fn from(err: crate::context::SinkError) -> Self {
        Self::Failure(err.to_string())
    }
}

/// Maps a [`Fault`] to a finalized response.
///
/// Implementations must finalize exactly one response per call unless the
/// sink is already Sent, in which case they must do nothing — a response
/// racing a fault is expected, not an error.
pub trait FaultMapper: Send + Sync {
    /// Classify `fault` and write the error response into `response`.
    fn handle(&self, fault: &Fault, response: &mut ResponseSink);
}

/// One classification rule: a predicate over the fault and the status to use
/// when it matches.
#[derive(Clone, Copy)]
pub struct FaultRule {
    /// Returns `true` when this rule applies to the fault.
    pub matches: fn(&Fault) -> bool,
    /// Status code for faults matched by this rule.
    pub status: StatusCode,
}

fn is_bad_input(fault: &Fault) -> bool {
    matches!(fault, Fault::BadInput(_))
}

fn is_access_denied(fault: &Fault) -> bool {
    matches!(fault, Fault::AccessDenied(_))
}

fn mentions_not_found(fault: &Fault) -> bool {
    matches!(fault, Fault::Failure(m) if m.to_lowercase().contains("not found"))
}

fn any(_fault: &Fault) -> bool {
    true
}

/// The built-in classification table.
///
/// Rules are evaluated top to bottom; the final rule matches unconditionally,
/// so every fault receives a status:
///
/// | fault                                   | status |
/// |-----------------------------------------|--------|
/// | `BadInput`                              | 400    |
/// | `AccessDenied`                          | 403    |
/// | `Failure` with "not found" in message   | 404    |
/// | anything else                           | 500    |
///
/// The error body is `{"error": true, "message": ..., "type": ...}`, with a
/// fixed `"Internal Server Error"` message when the fault carries none.
pub struct DefaultFaultMapper {
    rules: Vec<FaultRule>,
}

impl Default for DefaultFaultMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultFaultMapper {
    /// Create a mapper with the built-in rule table.
    pub fn new() -> Self {
        Self {
            rules: vec![
                FaultRule {
                    matches: is_bad_input,
                    status: StatusCode::BadRequest,
                },
                FaultRule {
                    matches: is_access_denied,
                    status: StatusCode::Forbidden,
                },
                FaultRule {
                    matches: mentions_not_found,
                    status: StatusCode::NotFound,
                },
                FaultRule {
                    matches: any,
                    status: StatusCode::InternalServerError,
                },
            ],
        }
    }

    /// Returns the status of the first rule matching `fault`.
    pub fn status_for(&self, fault: &Fault) -> StatusCode {
        self.rules
            .iter()
            .find(|rule| (rule.matches)(fault))
            .map(|rule| rule.status)
            .unwrap_or(StatusCode::InternalServerError)
    }
}

impl FaultMapper for DefaultFaultMapper {
    fn handle(&self, fault: &Fault, response: &mut ResponseSink) {
        if response.is_sent() {
            return;
        }

        let message = if fault.message().is_empty() {
            "Internal Server Error"
        } else {
            fault.message()
        };
        let body = json!({
            "error": true,
            "message": message,
            "type": fault.kind(),
        });

        // Guarded by is_sent above, so the write cannot be rejected; a
        // serialization failure degrades inside `json` itself.
        let _ = response.json(self.status_for(fault), &body);
    }
}
