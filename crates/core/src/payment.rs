//! Payment method selection.
//!
//! The engine never talks to a payment gateway. For prepaid methods it only
//! records the transaction reference the customer received from their wallet
//! app, and hands it to the order-intake service.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::{Field, FieldError};

/// Supported payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    Bkash,
    Nagad,
    Rocket,
}

impl PaymentMethod {
    /// Wire name used in order payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cash_on_delivery",
            Self::Bkash => "bkash",
            Self::Nagad => "nagad",
            Self::Rocket => "rocket",
        }
    }

    /// Whether the customer must supply a transaction reference.
    #[must_use]
    pub const fn requires_reference(self) -> bool {
        !matches!(self, Self::CashOnDelivery)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CashOnDelivery => "Cash on Delivery",
            Self::Bkash => "bKash",
            Self::Nagad => "Nagad",
            Self::Rocket => "Rocket",
        })
    }
}

/// Payment choice as entered, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentDraft {
    pub method: Option<PaymentMethod>,
    pub transaction_reference: String,
}

/// A complete payment selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSelection {
    pub method: PaymentMethod,
    pub transaction_reference: Option<String>,
}

impl PaymentSelection {
    /// Cash on delivery, which needs no reference.
    #[must_use]
    pub const fn cash_on_delivery() -> Self {
        Self {
            method: PaymentMethod::CashOnDelivery,
            transaction_reference: None,
        }
    }
}

impl PaymentDraft {
    /// Draft with a method and reference filled in.
    #[must_use]
    pub fn new(method: PaymentMethod, transaction_reference: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            transaction_reference: transaction_reference.into(),
        }
    }

    /// Validate the draft.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] if no method is chosen, or if a prepaid
    /// method has no transaction reference.
    pub fn validate(&self) -> Result<PaymentSelection, FieldError> {
        let method = self
            .method
            .ok_or_else(|| FieldError::required(Field::PaymentMethod))?;

        let reference = self.transaction_reference.trim();
        if method.requires_reference() && reference.is_empty() {
            return Err(FieldError::new(
                Field::TransactionReference,
                format!("a transaction reference is required for {method} payments"),
            ));
        }

        Ok(PaymentSelection {
            method,
            transaction_reference: (!reference.is_empty()).then(|| reference.to_string()),
        })
    }
}
