//! Order payload assembly.
//!
//! [`assemble`] converts a finished customization into the [`OrderPayload`]
//! the order-intake service accepts. The JSON field names are a contract with
//! that service and must not change; fields added since the original contract
//! are optional and omitted when empty.
//!
//! ```json
//! {
//!   "customer_name": "...", "phone": "...", "email": null,
//!   "address": "...", "district": "...", "thana": "...",
//!   "items": [{
//!     "id": 7, "name": "...", "price": 925.0, "quantity": 2,
//!     "customization": {"size": "XL", "color": "blue", "images": ["a.png"], "instructions": null}
//!   }],
//!   "total": 1850.0,
//!   "payment_info": {"method": "cash_on_delivery"},
//!   "custom_instructions": "",
//!   "custom_images": "[{\"name\":\"a.png\",\"dataUrl\":\"data:image/png;base64,...\"}]"
//! }
//! ```

pub mod message;
pub mod submission;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::AxisId;
use crate::customer::CustomerInfo;
use crate::payment::{PaymentMethod, PaymentSelection};
use crate::pricing::PriceBreakdown;
use crate::product::Product;
use crate::session::{CustomizationSession, TextField};
use crate::types::ProductId;

pub use message::format_order_message;
pub use submission::{IntakeResponse, SubmissionError, TrackingId, interpret_response};

/// Errors that can occur while assembling a payload.
#[derive(thiserror::Error, Debug)]
pub enum AssemblyError {
    /// The breakdown was computed for a different quantity than the session holds.
    #[error("price breakdown is stale: computed for quantity {breakdown}, session has {session}")]
    StaleBreakdown { breakdown: u32, session: u32 },

    /// The image list could not be JSON-encoded.
    #[error("failed to encode custom images: {0}")]
    Encode(#[from] serde_json::Error),
}

const fn is_false(value: &bool) -> bool {
    !*value
}

/// The order as submitted to the order-intake service. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub customer_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub district: String,
    pub thana: String,
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub payment_info: PaymentInfo,
    pub custom_instructions: String,
    /// JSON-encoded array of [`CustomImage`].
    pub custom_images: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub delivery_charge: Decimal,
}

/// One ordered product line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: ProductId,
    pub name: String,
    /// Customized unit price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    pub customization: ItemCustomization,
}

/// Customization attached to an order line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCustomization {
    pub size: Option<String>,
    pub color: Option<String>,
    /// Filenames of the attached images; content is in `custom_images`.
    pub images: Vec<String>,
    pub instructions: Option<String>,
    /// Every selection by axis, including size and color.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engraving: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub gift_wrap: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<String>,
}

/// Payment details sent with the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// An image entry inside `custom_images`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomImage {
    pub name: String,
    #[serde(rename = "dataUrl")]
    pub data_url: String,
}

impl OrderPayload {
    /// Decode the `custom_images` field.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is not a JSON array of images.
    pub fn decode_custom_images(&self) -> Result<Vec<CustomImage>, serde_json::Error> {
        serde_json::from_str(&self.custom_images)
    }
}

fn trimmed(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// Build the order payload for a completed customization.
///
/// No input is modified; the payload is a new snapshot.
///
/// # Errors
///
/// Returns [`AssemblyError::StaleBreakdown`] if `breakdown` was computed for a
/// different quantity, or [`AssemblyError::Encode`] if the images cannot be
/// serialized.
pub fn assemble(
    product: &Product,
    session: &CustomizationSession,
    customer: &CustomerInfo,
    payment: &PaymentSelection,
    breakdown: &PriceBreakdown,
) -> Result<OrderPayload, AssemblyError> {
    if breakdown.quantity != session.quantity() {
        return Err(AssemblyError::StaleBreakdown {
            breakdown: breakdown.quantity,
            session: session.quantity(),
        });
    }

    let images = session.images().ordered();
    let custom_images: Vec<CustomImage> = images
        .iter()
        .map(|image| CustomImage {
            name: image.filename.clone(),
            data_url: image.data_url.clone(),
        })
        .collect();

    let instructions = trimmed(session.text(TextField::SpecialInstructions));
    let options: BTreeMap<String, String> = session
        .selections()
        .iter()
        .map(|(axis, key)| (axis.to_string(), key.clone()))
        .collect();

    let customization = ItemCustomization {
        size: session.selection(AxisId::SIZE).map(String::from),
        color: session.selection(AxisId::COLOR).map(String::from),
        images: images.iter().map(|image| image.filename.clone()).collect(),
        instructions: instructions.clone(),
        options,
        custom_text: trimmed(session.text(TextField::CustomText)),
        engraving: trimmed(session.text(TextField::Engraving)),
        gift_wrap: session.gift_wrap(),
        delivery: Some(session.delivery().to_string()),
    };

    Ok(OrderPayload {
        customer_name: customer.name.clone(),
        phone: customer.phone.to_string(),
        email: customer.email.as_ref().map(ToString::to_string),
        address: customer.address.clone(),
        district: customer.district.clone(),
        thana: customer.thana.clone(),
        items: vec![OrderItem {
            id: product.id,
            name: product.name.clone(),
            price: breakdown.unit_subtotal,
            quantity: session.quantity(),
            customization,
        }],
        total: breakdown.total,
        payment_info: PaymentInfo {
            method: payment.method,
            transaction_id: payment.transaction_reference.clone(),
        },
        custom_instructions: instructions.unwrap_or_default(),
        custom_images: serde_json::to_string(&custom_images)?,
        delivery_charge: breakdown.delivery_price,
    })
}
