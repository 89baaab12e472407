//! Product records supplied by the external catalog collaborator.
//!
//! The engine only ever reads products; it never changes price or stock.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// A product as listed by the product source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Base unit price before any customization.
    pub price: Decimal,
    /// Units currently available.
    #[serde(default)]
    pub stock: u32,
    /// Free-form category tag (e.g. "apparel", "mugs").
    #[serde(default)]
    pub category: Option<String>,
    /// Reference to the product's primary image.
    #[serde(default)]
    pub image: Option<String>,
}

impl Product {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Whether `quantity` units can be ordered.
    #[must_use]
    pub const fn has_stock_for(&self, quantity: u32) -> bool {
        quantity <= self.stock
    }
}
