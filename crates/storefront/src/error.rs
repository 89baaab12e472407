//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`. Responses are JSON:
//!
//! ```json
//! {"error": "the options step is incomplete: ...", "fields": [{"field": {...}, "message": "..."}]}
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use keepsake_core::WizardError;
use keepsake_core::order::SubmissionError;
use keepsake_core::validation::{FieldError, join_errors};
use serde::Serialize;
use thiserror::Error;

use crate::flow::FlowError;
use crate::products::ProductSourceError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Product source operation failed.
    #[error("Product source error: {0}")]
    ProductSource(#[from] ProductSourceError),

    /// A wizard operation was refused.
    #[error("{0}")]
    Wizard(#[from] WizardError),

    /// The order-intake service did not accept the order.
    #[error("{0}")]
    Submission(#[from] SubmissionError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Client-supplied data failed field validation.
    #[error("Invalid request: {}", join_errors(.0))]
    Invalid(Vec<FieldError>),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FlowError> for AppError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::Wizard(e) => Self::Wizard(e),
            FlowError::Submission(e) => Self::Submission(e),
            FlowError::Task(e) => Self::Internal(e),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::ProductSource(ProductSourceError::NotFound(_)) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::ProductSource(_) => StatusCode::BAD_GATEWAY,
            Self::Wizard(err) => match err {
                WizardError::ReadOnly | WizardError::SubmissionInFlight => StatusCode::CONFLICT,
                WizardError::Pricing(_) | WizardError::Assembly(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::Submission(err) => match err {
                SubmissionError::AlreadyInFlight | SubmissionError::OutOfStock { .. } => {
                    StatusCode::CONFLICT
                }
                SubmissionError::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                SubmissionError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                SubmissionError::Network(_) | SubmissionError::InvalidResponse(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
            Self::BadRequest(_) | Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Server-side defects that should reach Sentry.
    const fn is_server_error(&self) -> bool {
        match self {
            Self::ProductSource(ProductSourceError::NotFound(_)) => false,
            Self::Internal(_)
            | Self::ProductSource(_)
            | Self::Wizard(WizardError::Pricing(_) | WizardError::Assembly(_))
            | Self::Submission(SubmissionError::InvalidResponse(_)) => true,
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Internal(_) | Self::Wizard(WizardError::Pricing(_) | WizardError::Assembly(_)) => {
                ErrorBody {
                    error: "Internal server error".to_string(),
                    fields: Vec::new(),
                    retryable: None,
                }
            }
            Self::ProductSource(ProductSourceError::NotFound(_)) => ErrorBody {
                error: self.to_string(),
                fields: Vec::new(),
                retryable: None,
            },
            Self::ProductSource(_) => ErrorBody {
                error: "External service error".to_string(),
                fields: Vec::new(),
                retryable: None,
            },
            Self::Wizard(err) => ErrorBody {
                error: err.to_string(),
                fields: err.field_errors(),
                retryable: None,
            },
            Self::Invalid(errors) => ErrorBody {
                error: self.to_string(),
                fields: errors.clone(),
                retryable: None,
            },
            Self::Submission(err) => ErrorBody {
                error: err.to_string(),
                fields: Vec::new(),
                retryable: Some(err.is_retryable()),
            },
            _ => ErrorBody {
                error: self.to_string(),
                fields: Vec::new(),
                retryable: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for customer actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use keepsake_core::ProductId;
    use keepsake_core::validation::Field;
    use keepsake_core::wizard::WizardStep;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("flow 123".to_string());
        assert_eq!(err.to_string(), "Not found: flow 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::ProductSource(ProductSourceError::NotFound(
                ProductId::new(1)
            ))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Wizard(WizardError::StepIncomplete {
                step: WizardStep::Options,
                errors: vec![FieldError::required(Field::Quantity)],
            })),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Wizard(WizardError::ReadOnly)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Submission(SubmissionError::AlreadyInFlight)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Submission(SubmissionError::Unavailable {
                status: 503,
                message: "down".to_string()
            })),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Invalid(vec![FieldError::required(Field::Images)])),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
