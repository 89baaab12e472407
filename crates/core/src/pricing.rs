//! Dynamic pricing for customized products.
//!
//! [`compute_price`] turns a base price, the option catalog, and a
//! [`CustomizationSession`] into an itemized [`PriceBreakdown`]. All terms are
//! additive and applied in a fixed order:
//!
//! 1. base unit price
//! 2. the delta of every selected option, in catalog axis order
//! 3. custom text surcharge (once, when the trimmed text is non-empty)
//! 4. engraving surcharge (same rule), then the special-instructions surcharge
//! 5. per-image surcharge × number of images
//! 6. gift-wrap surcharge
//! 7. unit subtotal × quantity
//! 8. delivery, waived when the subtotal meets the free-delivery threshold
//! 9. grand total, rounded half-up to two places
//!
//! Every surcharge is charged per unit: a quantity of two doubles the text,
//! image, and gift-wrap charges along with the base price.
//!
//! The calculation is pure. It runs in O(axes + images) and is cheap enough to
//! call on every keystroke.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{AxisId, Catalog, ProductFamily};
use crate::session::{CustomizationSession, DeliveryOption, TextField};
use crate::types::round_money;

/// Errors that indicate a catalog or data defect. These are never user errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("base price must not be negative (got {0})")]
    NegativeBasePrice(Decimal),

    #[error("quantity must be at least 1 (got {0})")]
    InvalidQuantity(u32),

    #[error("selection references axis `{axis}`, which {family} products do not have")]
    UnknownAxis { family: ProductFamily, axis: AxisId },

    #[error("selection references unknown value `{key}` of axis `{axis}`")]
    UnknownOption { axis: AxisId, key: String },
}

/// Flat per-unit surcharges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurchargeSchedule {
    pub custom_text: Decimal,
    pub engraving: Decimal,
    pub special_instructions: Decimal,
    pub per_image: Decimal,
    pub gift_wrap: Decimal,
}

impl Default for SurchargeSchedule {
    fn default() -> Self {
        Self {
            custom_text: Decimal::from(100),
            engraving: Decimal::from(150),
            special_instructions: Decimal::ZERO,
            per_image: Decimal::from(150),
            gift_wrap: Decimal::from(50),
        }
    }
}

impl SurchargeSchedule {
    /// Surcharge for a text field.
    #[must_use]
    pub const fn text(&self, field: TextField) -> Decimal {
        match field {
            TextField::CustomText => self.custom_text,
            TextField::Engraving => self.engraving,
            TextField::SpecialInstructions => self.special_instructions,
        }
    }
}

/// Delivery prices and the free-delivery threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryRates {
    pub standard: Decimal,
    pub express: Decimal,
    pub pickup: Decimal,
    /// Subtotal at or above which delivery is free. `None` disables the rule.
    pub free_threshold: Option<Decimal>,
}

impl Default for DeliveryRates {
    fn default() -> Self {
        Self {
            standard: Decimal::from(60),
            express: Decimal::from(120),
            pickup: Decimal::ZERO,
            free_threshold: Some(Decimal::from(1000)),
        }
    }
}

impl DeliveryRates {
    /// Undiscounted price of a delivery option.
    #[must_use]
    pub const fn rate(&self, option: DeliveryOption) -> Decimal {
        match option {
            DeliveryOption::Standard => self.standard,
            DeliveryOption::Express => self.express,
            DeliveryOption::Pickup => self.pickup,
        }
    }

    /// Whether a pre-delivery subtotal qualifies for free delivery.
    #[must_use]
    pub fn is_free_for(&self, subtotal: Decimal) -> bool {
        self.free_threshold
            .is_some_and(|threshold| subtotal >= threshold)
    }
}

/// All price rules applied on top of the catalog deltas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingRules {
    pub surcharges: SurchargeSchedule,
    pub delivery: DeliveryRates,
}

impl PricingRules {
    /// Every configured amount with its name, for validation.
    #[must_use]
    pub fn named_amounts(&self) -> Vec<(&'static str, Decimal)> {
        let s = &self.surcharges;
        let d = &self.delivery;
        let mut amounts = vec![
            ("custom_text", s.custom_text),
            ("engraving", s.engraving),
            ("special_instructions", s.special_instructions),
            ("per_image", s.per_image),
            ("gift_wrap", s.gift_wrap),
            ("delivery.standard", d.standard),
            ("delivery.express", d.express),
            ("delivery.pickup", d.pickup),
        ];
        if let Some(threshold) = d.free_threshold {
            amounts.push(("delivery.free_threshold", threshold));
        }
        amounts
    }
}

/// Price contributed by one selected option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionCharge {
    pub axis: AxisId,
    pub axis_label: String,
    pub key: String,
    pub label: String,
    pub delta: Decimal,
}

/// Itemized decomposition of a customized product's price.
///
/// Derived on demand; never stored or edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base_price: Decimal,
    /// Selected options in catalog axis order.
    pub option_charges: Vec<OptionCharge>,
    pub options_total: Decimal,
    pub text_surcharge: Decimal,
    pub engraving_surcharge: Decimal,
    pub instructions_surcharge: Decimal,
    pub image_count: usize,
    pub image_surcharge: Decimal,
    pub gift_wrap_surcharge: Decimal,
    /// Price of one customized unit.
    pub unit_subtotal: Decimal,
    pub quantity: u32,
    /// `unit_subtotal × quantity`.
    pub subtotal: Decimal,
    pub delivery_option: DeliveryOption,
    pub delivery_price: Decimal,
    pub free_delivery: bool,
    /// `subtotal + delivery_price`, rounded half-up to two places.
    pub total: Decimal,
}

fn text_charge(session: &CustomizationSession, rules: &PricingRules, field: TextField) -> Decimal {
    if session.has_text(field) {
        rules.surcharges.text(field)
    } else {
        Decimal::ZERO
    }
}

/// Compute the itemized price of a customization.
///
/// # Errors
///
/// Returns a [`PricingError`] if the base price is negative, the quantity is
/// zero, or the session references an axis or value the catalog does not
/// define for its family. These indicate a data defect and must not be
/// treated as a zero charge.
pub fn compute_price(
    base_price: Decimal,
    catalog: &Catalog,
    session: &CustomizationSession,
    rules: &PricingRules,
) -> Result<PriceBreakdown, PricingError> {
    if base_price < Decimal::ZERO {
        return Err(PricingError::NegativeBasePrice(base_price));
    }
    let quantity = session.quantity();
    if quantity == 0 {
        return Err(PricingError::InvalidQuantity(quantity));
    }

    let family = session.family();
    let axes = catalog.family_axes(family);

    if let Some(stray) = session
        .selections()
        .keys()
        .find(|axis| !axes.iter().any(|a| &a.id == *axis))
    {
        return Err(PricingError::UnknownAxis {
            family,
            axis: stray.clone(),
        });
    }

    let mut option_charges = Vec::new();
    for axis in axes {
        let Some(key) = session.selections().get(&axis.id) else {
            continue;
        };
        let value = axis.value(key).ok_or_else(|| PricingError::UnknownOption {
            axis: axis.id.clone(),
            key: key.clone(),
        })?;
        option_charges.push(OptionCharge {
            axis: axis.id.clone(),
            axis_label: axis.label.clone(),
            key: value.key.clone(),
            label: value.label.clone(),
            delta: value.price_delta,
        });
    }
    let options_total: Decimal = option_charges.iter().map(|c| c.delta).sum();

    let text_surcharge = text_charge(session, rules, TextField::CustomText);
    let engraving_surcharge = text_charge(session, rules, TextField::Engraving);
    let instructions_surcharge = text_charge(session, rules, TextField::SpecialInstructions);

    let image_count = session.images().len();
    let image_surcharge = rules.surcharges.per_image * Decimal::from(image_count);

    let gift_wrap_surcharge = if session.gift_wrap() {
        rules.surcharges.gift_wrap
    } else {
        Decimal::ZERO
    };

    let unit_subtotal = base_price
        + options_total
        + text_surcharge
        + engraving_surcharge
        + instructions_surcharge
        + image_surcharge
        + gift_wrap_surcharge;
    let subtotal = unit_subtotal * Decimal::from(quantity);

    let delivery_option = session.delivery();
    let free_delivery = rules.delivery.is_free_for(subtotal);
    let delivery_price = if free_delivery {
        Decimal::ZERO
    } else {
        rules.delivery.rate(delivery_option)
    };

    Ok(PriceBreakdown {
        base_price,
        option_charges,
        options_total,
        text_surcharge,
        engraving_surcharge,
        instructions_surcharge,
        image_count,
        image_surcharge,
        gift_wrap_surcharge,
        unit_subtotal,
        quantity,
        subtotal,
        delivery_option,
        delivery_price,
        free_delivery,
        total: round_money(subtotal + delivery_price),
    })
}
