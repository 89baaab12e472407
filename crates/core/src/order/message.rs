//! Plain-text rendering of an order for chat hand-off.

use core::fmt::Write as _;

use rust_decimal::Decimal;

use super::OrderPayload;
use crate::types::Price;

/// Render an order payload as a message a customer can send to the shop.
///
/// The text is derived from the same payload that goes to the order-intake
/// service, so the two can never disagree.
#[must_use]
pub fn format_order_message(payload: &OrderPayload) -> String {
    let mut out = String::from("New custom order\n\n");

    for item in &payload.items {
        let _ = writeln!(out, "Product: {} (#{})", item.name, item.id);
        let _ = writeln!(out, "Quantity: {}", item.quantity);
        let _ = writeln!(out, "Unit price: {}", Price::taka(item.price));

        let c = &item.customization;
        if c.options.is_empty() {
            if let Some(size) = &c.size {
                let _ = writeln!(out, "Size: {size}");
            }
            if let Some(color) = &c.color {
                let _ = writeln!(out, "Color: {color}");
            }
        } else {
            for (axis, value) in &c.options {
                let _ = writeln!(out, "{axis}: {value}");
            }
        }
        if let Some(text) = &c.custom_text {
            let _ = writeln!(out, "Custom text: {text}");
        }
        if let Some(text) = &c.engraving {
            let _ = writeln!(out, "Engraving: {text}");
        }
        if !c.images.is_empty() {
            let _ = writeln!(out, "Images: {}", c.images.join(", "));
        }
        if c.gift_wrap {
            out.push_str("Gift wrap: yes\n");
        }
        if let Some(delivery) = &c.delivery {
            let _ = writeln!(out, "Delivery: {delivery}");
        }
        out.push('\n');
    }

    if !payload.custom_instructions.is_empty() {
        let _ = writeln!(out, "Instructions: {}\n", payload.custom_instructions);
    }

    let _ = writeln!(out, "Name: {}", payload.customer_name);
    let _ = writeln!(out, "Phone: {}", payload.phone);
    if let Some(email) = &payload.email {
        let _ = writeln!(out, "Email: {email}");
    }
    let location: Vec<&str> = [
        payload.address.as_str(),
        payload.thana.as_str(),
        payload.district.as_str(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect();
    let _ = writeln!(out, "Address: {}", location.join(", "));

    let _ = write!(out, "\nPayment: {}", payload.payment_info.method);
    if let Some(reference) = &payload.payment_info.transaction_id {
        let _ = write!(out, " (ref {reference})");
    }
    out.push('\n');

    if payload.delivery_charge > Decimal::ZERO {
        let _ = writeln!(out, "Delivery charge: {}", Price::taka(payload.delivery_charge));
    }
    let _ = write!(out, "Total: {}", Price::taka(payload.total));
    out
}
