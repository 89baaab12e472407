//! Customization session: the mutable state of one customization attempt.
//!
//! A session is owned by exactly one [`Wizard`](crate::wizard::Wizard). Every
//! setter validates its input before touching state, so a rejected change
//! leaves the session exactly as it was.

use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{AxisId, Catalog, ProductFamily, SelectionError};
use crate::images::ImageSet;
use crate::policy::{CustomizationPolicy, TextLimits};
use crate::validation::{Field, FieldError};
use crate::wizard::WizardStep;

/// Free-text design fields that can carry a surcharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    CustomText,
    Engraving,
    SpecialInstructions,
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CustomText => "custom text",
            Self::Engraving => "engraving",
            Self::SpecialInstructions => "special instructions",
        })
    }
}

/// Delivery choices offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOption {
    #[default]
    Standard,
    Express,
    Pickup,
}

impl DeliveryOption {
    /// Wire name of the option.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
            Self::Pickup => "pickup",
        }
    }
}

impl fmt::Display for DeliveryOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-progress selection state for one product customization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomizationSession {
    family: ProductFamily,
    selections: BTreeMap<AxisId, String>,
    quantity: u32,
    #[serde(default)]
    custom_text: Option<String>,
    #[serde(default)]
    engraving_text: Option<String>,
    #[serde(default)]
    special_instructions: Option<String>,
    #[serde(default)]
    images: ImageSet,
    #[serde(default)]
    delivery: DeliveryOption,
    #[serde(default)]
    gift_wrap: bool,
    #[serde(default)]
    current_step: WizardStep,
}

impl CustomizationSession {
    /// Start an empty session for a product family.
    #[must_use]
    pub fn new(family: ProductFamily) -> Self {
        Self {
            family,
            selections: BTreeMap::new(),
            quantity: 1,
            custom_text: None,
            engraving_text: None,
            special_instructions: None,
            images: ImageSet::default(),
            delivery: DeliveryOption::default(),
            gift_wrap: false,
            current_step: WizardStep::default(),
        }
    }

    #[must_use]
    pub const fn family(&self) -> ProductFamily {
        self.family
    }

    /// Chosen value keys by axis.
    #[must_use]
    pub const fn selections(&self) -> &BTreeMap<AxisId, String> {
        &self.selections
    }

    /// The value chosen for an axis, if any.
    #[must_use]
    pub fn selection(&self, axis: &str) -> Option<&str> {
        self.selections
            .get(&AxisId::new(axis))
            .map(String::as_str)
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Raw value of a text field.
    #[must_use]
    pub fn text(&self, field: TextField) -> Option<&str> {
        match field {
            TextField::CustomText => self.custom_text.as_deref(),
            TextField::Engraving => self.engraving_text.as_deref(),
            TextField::SpecialInstructions => self.special_instructions.as_deref(),
        }
    }

    /// Whether a text field is non-empty after trimming.
    #[must_use]
    pub fn has_text(&self, field: TextField) -> bool {
        self.text(field).is_some_and(|t| !t.trim().is_empty())
    }

    #[must_use]
    pub const fn images(&self) -> &ImageSet {
        &self.images
    }

    #[must_use]
    pub const fn delivery(&self) -> DeliveryOption {
        self.delivery
    }

    #[must_use]
    pub const fn gift_wrap(&self) -> bool {
        self.gift_wrap
    }

    #[must_use]
    pub const fn current_step(&self) -> WizardStep {
        self.current_step
    }

    /// Choose a value for an axis after validating it against the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError`] if the axis or key is not in the catalog for
    /// this session's family. The session is unchanged on error.
    pub fn select(
        &mut self,
        catalog: &Catalog,
        axis: &AxisId,
        key: &str,
    ) -> Result<(), SelectionError> {
        catalog.validate_selection(self.family, axis, key)?;
        self.selections.insert(axis.clone(), key.to_string());
        Ok(())
    }

    /// Remove the selection for an axis. Returns the previous key.
    pub fn clear_selection(&mut self, axis: &AxisId) -> Option<String> {
        self.selections.remove(axis)
    }

    /// Set the quantity.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] if `quantity` is zero.
    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), FieldError> {
        if quantity == 0 {
            return Err(FieldError::new(
                Field::Quantity,
                "quantity must be at least 1",
            ));
        }
        self.quantity = quantity;
        Ok(())
    }

    /// Set or clear a text field, enforcing its maximum length.
    ///
    /// Length is counted in characters after trimming. An empty value clears
    /// the field.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] if the text is longer than allowed.
    pub fn set_text(
        &mut self,
        field: TextField,
        value: &str,
        limits: &TextLimits,
    ) -> Result<(), FieldError> {
        let max = limits.max_len(field);
        let len = value.trim().chars().count();
        if len > max {
            return Err(FieldError::new(
                Field::Text(field),
                format!("{field} must be at most {max} characters (got {len})"),
            ));
        }

        let stored = if value.trim().is_empty() {
            None
        } else {
            Some(value.to_string())
        };
        match field {
            TextField::CustomText => self.custom_text = stored,
            TextField::Engraving => self.engraving_text = stored,
            TextField::SpecialInstructions => self.special_instructions = stored,
        }
        Ok(())
    }

    /// Check text lengths and the image count against a policy.
    ///
    /// Setters enforce these limits as data is entered; a session read from a
    /// file or a request body has bypassed them.
    ///
    /// # Errors
    ///
    /// Returns every field that exceeds its limit.
    pub fn check_limits(&self, policy: &CustomizationPolicy) -> Result<(), Vec<FieldError>> {
        let mut errors: Vec<FieldError> = [
            TextField::CustomText,
            TextField::Engraving,
            TextField::SpecialInstructions,
        ]
        .into_iter()
        .filter_map(|field| {
            let len = self.text(field)?.trim().chars().count();
            let max = policy.text.max_len(field);
            (len > max).then(|| {
                FieldError::new(
                    Field::Text(field),
                    format!("{field} must be at most {max} characters (got {len})"),
                )
            })
        })
        .collect();

        let max_images = policy.images.max_count;
        if self.images.len() > max_images {
            errors.push(FieldError::new(
                Field::Images,
                format!("at most {max_images} images can be attached"),
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub const fn set_delivery(&mut self, delivery: DeliveryOption) {
        self.delivery = delivery;
    }

    pub const fn set_gift_wrap(&mut self, gift_wrap: bool) {
        self.gift_wrap = gift_wrap;
    }

    pub(crate) const fn images_mut(&mut self) -> &mut ImageSet {
        &mut self.images
    }

    pub(crate) fn replace_images(&mut self, images: ImageSet) {
        self.images = images;
    }

    pub(crate) const fn set_step(&mut self, step: WizardStep) {
        self.current_step = step;
    }
}
