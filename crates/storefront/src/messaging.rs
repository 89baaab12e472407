//! Click-to-chat order hand-off.
//!
//! Some customers prefer to confirm an order over chat. The link opens a
//! conversation with the shop pre-filled with the same order the intake
//! service received.

use keepsake_core::order::{OrderPayload, format_order_message};
use url::Url;

const CHAT_BASE: &str = "https://wa.me/";

/// Build a click-to-chat link for an order.
///
/// `number` is the shop's number in international format, digits only.
///
/// # Errors
///
/// Returns an error if `number` does not form a valid URL path.
pub fn chat_link(number: &str, payload: &OrderPayload) -> Result<Url, url::ParseError> {
    let text = format_order_message(payload);
    Url::parse(&format!(
        "{CHAT_BASE}{number}?text={}",
        urlencoding::encode(&text)
    ))
}
