//! Order-intake responses and submission failures.
//!
//! The intake service answers with a small JSON envelope:
//!
//! ```json
//! {"success": true, "tracking_id": "KS-10293"}
//! {"success": false, "error": "Only 2 left in stock", "code": "OUT_OF_STOCK"}
//! ```
//!
//! Older deployments return `order_id` (string or number) instead of
//! `tracking_id`. [`interpret_response`] accepts both.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier the intake service assigns to an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingId(String);

impl TrackingId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a submission did not produce a tracking id.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionError {
    /// The request never completed (connect, timeout, TLS).
    #[error("could not reach the order service: {0}")]
    Network(String),

    /// The service is temporarily unable to take orders.
    #[error("order service unavailable (HTTP {status}): {message}")]
    Unavailable { status: u16, message: String },

    /// Stock changed since the product was loaded.
    #[error("out of stock: {message}")]
    OutOfStock { message: String },

    /// The service refused the order's contents.
    #[error("order rejected: {message}")]
    Rejected {
        message: String,
        code: Option<String>,
    },

    /// The service answered with something we cannot interpret.
    #[error("unexpected response from order service: {0}")]
    InvalidResponse(String),

    /// Another submission for the same session is still outstanding.
    #[error("a submission for this order is already in progress")]
    AlreadyInFlight,
}

impl SubmissionError {
    /// Whether the same payload may be submitted again unchanged.
    ///
    /// `false` means the customer has to change something first.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Unavailable { .. } | Self::AlreadyInFlight
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum OrderRef {
    Text(String),
    Number(i64),
}

impl OrderRef {
    fn into_tracking_id(self) -> Option<TrackingId> {
        match self {
            Self::Text(s) if !s.trim().is_empty() => Some(TrackingId::new(s.trim())),
            Self::Text(_) => None,
            Self::Number(n) => Some(TrackingId::new(n.to_string())),
        }
    }
}

/// The intake service's response envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IntakeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    tracking_id: Option<OrderRef>,
    #[serde(default)]
    order_id: Option<OrderRef>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl IntakeResponse {
    fn tracking_id(self) -> Option<TrackingId> {
        self.tracking_id
            .and_then(OrderRef::into_tracking_id)
            .or_else(|| self.order_id.and_then(OrderRef::into_tracking_id))
    }

    fn is_out_of_stock(&self) -> bool {
        self.code
            .as_deref()
            .is_some_and(|code| code.eq_ignore_ascii_case("out_of_stock"))
    }
}

/// Map an HTTP status and response body to a tracking id or a typed failure.
///
/// # Errors
///
/// Returns the [`SubmissionError`] the response describes.
pub fn interpret_response(status: u16, body: &str) -> Result<TrackingId, SubmissionError> {
    let parsed: Option<IntakeResponse> = serde_json::from_str(body).ok();
    let message = |parsed: &Option<IntakeResponse>, fallback: &str| {
        parsed
            .as_ref()
            .and_then(|r| r.error.clone())
            .unwrap_or_else(|| fallback.to_string())
    };

    match status {
        200..=299 => {
            let Some(response) = parsed else {
                return Err(SubmissionError::InvalidResponse(
                    "response body is not valid JSON".to_string(),
                ));
            };
            if !response.success {
                return Err(rejection(response));
            }
            response.tracking_id().ok_or_else(|| {
                SubmissionError::InvalidResponse("success without a tracking id".to_string())
            })
        }
        409 | 400 | 422 => match parsed {
            Some(response) => Err(rejection(response)),
            None if status == 409 => Err(SubmissionError::OutOfStock {
                message: "stock changed".to_string(),
            }),
            None => Err(SubmissionError::Rejected {
                message: format!("HTTP {status}"),
                code: None,
            }),
        },
        408 | 429 | 500..=599 => Err(SubmissionError::Unavailable {
            status,
            message: message(&parsed, "try again shortly"),
        }),
        _ => Err(SubmissionError::InvalidResponse(format!(
            "HTTP {status}: {}",
            message(&parsed, "no error message")
        ))),
    }
}

fn rejection(response: IntakeResponse) -> SubmissionError {
    let message = response
        .error
        .clone()
        .unwrap_or_else(|| "order was not accepted".to_string());
    if response.is_out_of_stock() {
        SubmissionError::OutOfStock { message }
    } else {
        SubmissionError::Rejected {
            message,
            code: response.code,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_success_with_tracking_id() {
        let id = interpret_response(200, r#"{"success": true, "tracking_id": "KS-1"}"#).unwrap();
        assert_eq!(id.as_str(), "KS-1");
    }

    #[test]
    fn test_success_with_numeric_order_id() {
        let id = interpret_response(201, r#"{"success": true, "order_id": 4412}"#).unwrap();
        assert_eq!(id.to_string(), "4412");
    }

    #[test]
    fn test_success_without_id_is_invalid() {
        let err = interpret_response(200, r#"{"success": true}"#).unwrap_err();
        assert!(matches!(err, SubmissionError::InvalidResponse(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_out_of_stock_code() {
        let err = interpret_response(
            409,
            r#"{"success": false, "error": "Only 1 left", "code": "OUT_OF_STOCK"}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SubmissionError::OutOfStock {
                message: "Only 1 left".to_string()
            }
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_validation_rejection_keeps_code() {
        let err = interpret_response(
            422,
            r#"{"success": false, "error": "bad phone", "code": "VALIDATION_ERROR"}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Rejected { ref code, .. } if code.as_deref() == Some("VALIDATION_ERROR")
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_failure_flag_in_ok_response() {
        let err = interpret_response(200, r#"{"success": false, "error": "closed"}"#).unwrap_err();
        assert!(matches!(err, SubmissionError::Rejected { .. }));
    }

    #[test]
    fn test_server_errors_are_retryable() {
        let err = interpret_response(503, "<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, SubmissionError::Unavailable { status: 503, .. }));
        assert!(err.is_retryable());

        let err = interpret_response(429, "").unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_garbage_success_body() {
        let err = interpret_response(200, "OK").unwrap_err();
        assert!(matches!(err, SubmissionError::InvalidResponse(_)));
    }

    #[test]
    fn test_in_flight_and_network_are_retryable() {
        assert!(SubmissionError::AlreadyInFlight.is_retryable());
        assert!(SubmissionError::Network("timeout".to_string()).is_retryable());
    }
}
