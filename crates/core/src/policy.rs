//! Tunable limits and prices for a customization flow.
//!
//! All values have defaults, so a policy can be deserialized from a partial
//! YAML or JSON document and overridden field by field.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::PricingRules;
use crate::session::TextField;

/// Default maximum size of a single uploaded image (5 MiB).
pub const DEFAULT_IMAGE_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Default maximum number of images per session.
pub const DEFAULT_IMAGE_MAX_COUNT: usize = 5;

/// Errors in a policy that make it unusable.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("surcharge `{name}` must not be negative (got {amount})")]
    NegativeAmount { name: &'static str, amount: Decimal },

    #[error("image limit `{0}` must be greater than zero")]
    ZeroImageLimit(&'static str),

    #[error("at least one image type must be allowed")]
    NoImageTypes,
}

/// Maximum lengths of the free-text fields, in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextLimits {
    pub custom_text: usize,
    pub engraving: usize,
    pub special_instructions: usize,
}

impl TextLimits {
    /// Maximum length for a field.
    #[must_use]
    pub const fn max_len(&self, field: TextField) -> usize {
        match field {
            TextField::CustomText => self.custom_text,
            TextField::Engraving => self.engraving,
            TextField::SpecialInstructions => self.special_instructions,
        }
    }
}

impl Default for TextLimits {
    fn default() -> Self {
        Self {
            custom_text: 100,
            engraving: 50,
            special_instructions: 500,
        }
    }
}

/// Constraints on uploaded reference images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageLimits {
    /// Maximum size of one file in bytes.
    pub max_bytes: u64,
    /// Maximum number of images attached to a session.
    pub max_count: usize,
    /// Allowed MIME types, lowercase.
    pub allowed_types: Vec<String>,
}

impl ImageLimits {
    /// Whether a (normalized, lowercase) MIME type is allowed.
    #[must_use]
    pub fn allows(&self, content_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == content_type)
    }
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_IMAGE_MAX_BYTES,
            max_count: DEFAULT_IMAGE_MAX_COUNT,
            allowed_types: ["image/jpeg", "image/png", "image/gif", "image/webp"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Complete configuration of a customization flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomizationPolicy {
    pub pricing: PricingRules,
    pub images: ImageLimits,
    pub text: TextLimits,
}

impl CustomizationPolicy {
    /// Check the policy for values that would make pricing or intake misbehave.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] for negative surcharges or delivery rates,
    /// zero image limits, or an empty allowed-type list.
    pub fn validate(&self) -> Result<(), PolicyError> {
        for (name, amount) in self.pricing.named_amounts() {
            if amount < Decimal::ZERO {
                return Err(PolicyError::NegativeAmount { name, amount });
            }
        }
        if self.images.max_bytes == 0 {
            return Err(PolicyError::ZeroImageLimit("max_bytes"));
        }
        if self.images.max_count == 0 {
            return Err(PolicyError::ZeroImageLimit("max_count"));
        }
        if self.images.allowed_types.is_empty() {
            return Err(PolicyError::NoImageTypes);
        }
        Ok(())
    }
}
