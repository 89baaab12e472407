//! Field-level validation errors.
//!
//! Validation errors are local and recoverable: each one names the field it
//! belongs to so a presentation layer can render it next to that field without
//! blocking unrelated input.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::AxisId;
use crate::session::TextField;

/// A user-editable field of the customization flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Field {
    /// An option axis selection (size, color, ...).
    Option(AxisId),
    /// One of the free-text design fields.
    Text(TextField),
    Quantity,
    Images,
    CustomerName,
    Phone,
    Email,
    Address,
    PaymentMethod,
    TransactionReference,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Option(axis) => write!(f, "{axis}"),
            Self::Text(text) => write!(f, "{text}"),
            Self::Quantity => f.write_str("quantity"),
            Self::Images => f.write_str("images"),
            Self::CustomerName => f.write_str("name"),
            Self::Phone => f.write_str("phone"),
            Self::Email => f.write_str("email"),
            Self::Address => f.write_str("address"),
            Self::PaymentMethod => f.write_str("payment method"),
            Self::TransactionReference => f.write_str("transaction reference"),
        }
    }
}

/// A validation failure attached to a single field.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{field}: {message}")]
pub struct FieldError {
    /// The field that failed validation.
    pub field: Field,
    /// User-facing description of the problem.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    #[must_use]
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    /// Shorthand for a "this field is required" error.
    #[must_use]
    pub fn required(field: Field) -> Self {
        let message = format!("{field} is required");
        Self::new(field, message)
    }
}

/// Render a list of field errors as a single `; `-separated line.
#[must_use]
pub fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_message_names_field() {
        let err = FieldError::required(Field::Option(AxisId::new("size")));
        assert_eq!(err.message, "size is required");
        assert_eq!(err.to_string(), "size: size is required");
    }

    #[test]
    fn test_join_errors() {
        let errors = vec![
            FieldError::required(Field::CustomerName),
            FieldError::new(Field::Phone, "not a valid mobile number"),
        ];
        assert_eq!(
            join_errors(&errors),
            "name: name is required; phone: not a valid mobile number"
        );
    }
}
