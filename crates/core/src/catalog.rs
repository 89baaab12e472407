//! Option catalog: the customizable axes of each product family.
//!
//! A [`Catalog`] maps every [`ProductFamily`] to an ordered list of
//! [`OptionAxis`] values. The catalog is read-only once built and is meant to
//! be shared (behind an `Arc`) by every open customization flow.
//!
//! Catalog definitions are validated when the catalog is built. An axis with
//! no values, a duplicate key, or a negative delta is a configuration defect
//! and is reported by [`Catalog::from_definition`], never later at pricing
//! time.

use core::fmt;
use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::product::Product;

/// Errors detected while building a catalog.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// An axis was defined without any values.
    #[error("axis `{axis}` in family `{family}` has no values")]
    EmptyAxis { family: ProductFamily, axis: AxisId },

    /// The same axis appears twice in one family.
    #[error("axis `{axis}` is defined twice in family `{family}`")]
    DuplicateAxis { family: ProductFamily, axis: AxisId },

    /// The same value key appears twice in one axis.
    #[error("value `{key}` is defined twice in axis `{axis}` of family `{family}`")]
    DuplicateValue {
        family: ProductFamily,
        axis: AxisId,
        key: String,
    },

    /// A value carries a negative price delta.
    #[error("value `{key}` in axis `{axis}` has negative price delta {delta}")]
    NegativeDelta {
        axis: AxisId,
        key: String,
        delta: Decimal,
    },

    /// A family was defined with no axes.
    #[error("family `{family}` defines no axes")]
    EmptyFamily { family: ProductFamily },

    /// The fallback family is missing, so unclassified products would have no axes.
    #[error("catalog must define the default family `{}`", ProductFamily::DEFAULT)]
    MissingDefaultFamily,
}

/// Errors from validating a selection against the catalog.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// The axis is not offered for the product's family.
    #[error("`{axis}` is not an option for {family} products")]
    UnknownAxis { family: ProductFamily, axis: AxisId },

    /// The value is not one of the axis's choices.
    #[error("`{key}` is not a valid choice for {axis}")]
    UnknownValue { axis: AxisId, key: String },
}

/// Identifier of an option axis, e.g. `size` or `printArea`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AxisId(String);

impl AxisId {
    pub const SIZE: &'static str = "size";
    pub const COLOR: &'static str = "color";
    pub const MATERIAL: &'static str = "material";
    pub const PRINT_AREA: &'static str = "printArea";

    /// Create an axis ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AxisId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl AsRef<str> for AxisId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One concrete choice within an axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionValue {
    /// Key unique within the axis (e.g. "XL", "blue").
    pub key: String,
    /// Display label.
    pub label: String,
    /// Amount added to the unit price when chosen.
    #[serde(default)]
    pub price_delta: Decimal,
}

impl OptionValue {
    /// Create an option value.
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>, price_delta: Decimal) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            price_delta,
        }
    }
}

/// One customizable dimension of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionAxis {
    pub id: AxisId,
    pub label: String,
    /// Whether a selection is mandatory before leaving the options step.
    #[serde(default = "default_required")]
    pub required: bool,
    pub values: Vec<OptionValue>,
}

const fn default_required() -> bool {
    true
}

impl OptionAxis {
    /// Create a required axis.
    #[must_use]
    pub fn new(id: &str, label: impl Into<String>, values: Vec<OptionValue>) -> Self {
        Self {
            id: AxisId::new(id),
            label: label.into(),
            required: true,
            values,
        }
    }

    /// Mark the axis as optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Look up a value by key.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&OptionValue> {
        self.values.iter().find(|v| v.key == key)
    }
}

/// Product family, derived from a product's category tag or name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ProductFamily {
    Apparel,
    Drinkware,
    Frame,
    Engravable,
    #[default]
    General,
}

impl ProductFamily {
    /// Family used for products that match no classifier keyword.
    pub const DEFAULT: Self = Self::General;

    /// Families in classification priority order.
    pub const ALL: [Self; 5] = [
        Self::Apparel,
        Self::Drinkware,
        Self::Frame,
        Self::Engravable,
        Self::General,
    ];

    /// Lowercase name as used in category tags and definitions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Apparel => "apparel",
            Self::Drinkware => "drinkware",
            Self::Frame => "frame",
            Self::Engravable => "engravable",
            Self::General => "general",
        }
    }

    const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Apparel => &[
                "shirt",
                "tshirt",
                "tee",
                "hoodie",
                "sweatshirt",
                "jersey",
                "cap",
                "tote",
                "clothing",
            ],
            Self::Drinkware => &["mug", "mugs", "cup", "cups", "bottle", "tumbler", "flask"],
            Self::Frame => &["frame", "frames", "photo", "canvas", "poster", "portrait"],
            Self::Engravable => &[
                "keychain",
                "keyring",
                "pen",
                "wallet",
                "lighter",
                "plaque",
                "engraved",
                "engraving",
                "wooden",
            ],
            Self::General => &[],
        }
    }

    /// Classify a product by category tag first, then by its name.
    ///
    /// Products matching nothing fall back to [`ProductFamily::DEFAULT`].
    #[must_use]
    pub fn classify(name: &str, category: Option<&str>) -> Self {
        category
            .and_then(Self::match_text)
            .or_else(|| Self::match_text(name))
            .unwrap_or(Self::DEFAULT)
    }

    fn match_text(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        Self::ALL.into_iter().find(|family| {
            tokens
                .iter()
                .any(|t| *t == family.as_str() || family.keywords().contains(t))
        })
    }
}

impl fmt::Display for ProductFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable catalog description, e.g. loaded from YAML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDefinition {
    pub families: BTreeMap<ProductFamily, Vec<OptionAxis>>,
}

/// Validated, read-only option catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    families: HashMap<ProductFamily, Vec<OptionAxis>>,
}

impl Catalog {
    /// Build a catalog from a definition, validating every axis.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the default family is missing, a family
    /// has no axes, an axis has no values, an axis or value key is duplicated,
    /// or a delta is negative.
    pub fn from_definition(definition: CatalogDefinition) -> Result<Self, CatalogError> {
        if !definition.families.contains_key(&ProductFamily::DEFAULT) {
            return Err(CatalogError::MissingDefaultFamily);
        }

        for (family, axes) in &definition.families {
            validate_family(*family, axes)?;
        }

        Ok(Self {
            families: definition.families.into_iter().collect(),
        })
    }

    /// The built-in catalog shipped with the storefront.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            families: builtin_families().into_iter().collect(),
        }
    }

    /// Convert back into a serializable definition.
    #[must_use]
    pub fn to_definition(&self) -> CatalogDefinition {
        CatalogDefinition {
            families: self
                .families
                .iter()
                .map(|(family, axes)| (*family, axes.clone()))
                .collect(),
        }
    }

    /// Ordered axes for a family, falling back to the default family.
    #[must_use]
    pub fn family_axes(&self, family: ProductFamily) -> &[OptionAxis] {
        self.families
            .get(&family)
            .or_else(|| self.families.get(&ProductFamily::DEFAULT))
            .map_or(&[], Vec::as_slice)
    }

    /// Family a product belongs to in this catalog.
    ///
    /// A classified family the catalog does not define resolves to the
    /// default family.
    #[must_use]
    pub fn family_of(&self, product: &Product) -> ProductFamily {
        let family = ProductFamily::classify(&product.name, product.category.as_deref());
        if self.families.contains_key(&family) {
            family
        } else {
            ProductFamily::DEFAULT
        }
    }

    /// Ordered axes applicable to a product.
    #[must_use]
    pub fn axes_for(&self, product: &Product) -> &[OptionAxis] {
        self.family_axes(self.family_of(product))
    }

    /// Look up a single axis of a family.
    #[must_use]
    pub fn axis(&self, family: ProductFamily, axis: &AxisId) -> Option<&OptionAxis> {
        self.family_axes(family).iter().find(|a| &a.id == axis)
    }

    /// Check that `key` is a valid value of `axis` for `family`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError`] if the axis or the value is unknown.
    pub fn validate_selection(
        &self,
        family: ProductFamily,
        axis: &AxisId,
        key: &str,
    ) -> Result<&OptionValue, SelectionError> {
        let option_axis = self
            .axis(family, axis)
            .ok_or_else(|| SelectionError::UnknownAxis {
                family,
                axis: axis.clone(),
            })?;

        option_axis
            .value(key)
            .ok_or_else(|| SelectionError::UnknownValue {
                axis: axis.clone(),
                key: key.to_string(),
            })
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_family(family: ProductFamily, axes: &[OptionAxis]) -> Result<(), CatalogError> {
    if axes.is_empty() {
        return Err(CatalogError::EmptyFamily { family });
    }
    let mut seen_axes = HashSet::new();
    for axis in axes {
        if !seen_axes.insert(&axis.id) {
            return Err(CatalogError::DuplicateAxis {
                family,
                axis: axis.id.clone(),
            });
        }
        if axis.values.is_empty() {
            return Err(CatalogError::EmptyAxis {
                family,
                axis: axis.id.clone(),
            });
        }

        let mut seen_keys = HashSet::new();
        for value in &axis.values {
            if !seen_keys.insert(value.key.as_str()) {
                return Err(CatalogError::DuplicateValue {
                    family,
                    axis: axis.id.clone(),
                    key: value.key.clone(),
                });
            }
            if value.price_delta < Decimal::ZERO {
                return Err(CatalogError::NegativeDelta {
                    axis: axis.id.clone(),
                    key: value.key.clone(),
                    delta: value.price_delta,
                });
            }
        }
    }
    Ok(())
}

// =============================================================================
// Built-in catalog
// =============================================================================

fn value(key: &str, label: &str, delta: i64) -> OptionValue {
    OptionValue::new(key, label, Decimal::from(delta))
}

fn color_axis() -> OptionAxis {
    OptionAxis::new(
        AxisId::COLOR,
        "Color",
        vec![
            value("white", "White", 0),
            value("black", "Black", 0),
            value("red", "Red", 25),
            value("blue", "Blue", 25),
            value("green", "Green", 25),
        ],
    )
}

fn builtin_families() -> Vec<(ProductFamily, Vec<OptionAxis>)> {
    vec![
        (
            ProductFamily::Apparel,
            vec![
                OptionAxis::new(
                    AxisId::SIZE,
                    "Size",
                    vec![
                        value("S", "Small", 0),
                        value("M", "Medium", 0),
                        value("L", "Large", 0),
                        value("XL", "Extra Large", 50),
                        value("XXL", "Double Extra Large", 80),
                    ],
                ),
                color_axis(),
                OptionAxis::new(
                    AxisId::PRINT_AREA,
                    "Print Area",
                    vec![
                        value("front", "Front", 0),
                        value("back", "Back", 0),
                        value("both", "Front & Back", 150),
                    ],
                ),
            ],
        ),
        (
            ProductFamily::Drinkware,
            vec![
                OptionAxis::new(
                    AxisId::SIZE,
                    "Capacity",
                    vec![
                        value("11oz", "11 oz", 0),
                        value("15oz", "15 oz", 60),
                    ],
                ),
                color_axis(),
                OptionAxis::new(
                    AxisId::PRINT_AREA,
                    "Print Area",
                    vec![
                        value("one-side", "One Side", 0),
                        value("wrap", "Full Wrap", 80),
                    ],
                )
                .optional(),
            ],
        ),
        (
            ProductFamily::Frame,
            vec![
                OptionAxis::new(
                    AxisId::SIZE,
                    "Size",
                    vec![
                        value("5x7", "5\" x 7\"", 0),
                        value("8x10", "8\" x 10\"", 120),
                        value("12x16", "12\" x 16\"", 300),
                    ],
                ),
                OptionAxis::new(
                    AxisId::MATERIAL,
                    "Material",
                    vec![
                        value("wood", "Wood", 0),
                        value("metal", "Metal", 150),
                        value("acrylic", "Acrylic", 100),
                    ],
                ),
            ],
        ),
        (
            ProductFamily::Engravable,
            vec![OptionAxis::new(
                AxisId::MATERIAL,
                "Material",
                vec![
                    value("wood", "Wood", 0),
                    value("leather", "Leather", 100),
                    value("steel", "Stainless Steel", 150),
                ],
            )],
        ),
        (ProductFamily::General, vec![color_axis().optional()]),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ProductId;

    fn product(name: &str, category: Option<&str>) -> Product {
        Product {
            id: ProductId::new(1),
            name: name.to_string(),
            price: Decimal::from(100),
            stock: 5,
            category: category.map(String::from),
            image: None,
        }
    }

    #[test]
    fn test_builtin_catalog_passes_validation() {
        let definition = Catalog::builtin().to_definition();
        assert!(Catalog::from_definition(definition).is_ok());
    }

    #[test]
    fn test_classify_by_category_then_name() {
        assert_eq!(
            ProductFamily::classify("Custom Gift", Some("Mugs")),
            ProductFamily::Drinkware
        );
        assert_eq!(
            ProductFamily::classify("Custom T-Shirt", None),
            ProductFamily::Apparel
        );
        assert_eq!(
            ProductFamily::classify("Engraved Wallet", Some("")),
            ProductFamily::Engravable
        );
    }

    #[test]
    fn test_unknown_product_falls_back_to_default_family() {
        let catalog = Catalog::builtin();
        let p = product("Mystery Box", Some("surprises"));
        assert_eq!(catalog.family_of(&p), ProductFamily::DEFAULT);
        assert!(!catalog.axes_for(&p).is_empty());
    }

    #[test]
    fn test_keyword_matching_uses_whole_words() {
        // "capacity" must not match the apparel keyword "cap"
        assert_eq!(
            ProductFamily::classify("High capacity gift", None),
            ProductFamily::General
        );
    }

    #[test]
    fn test_axes_are_ordered() {
        let catalog = Catalog::builtin();
        let ids: Vec<&str> = catalog
            .family_axes(ProductFamily::Apparel)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["size", "color", "printArea"]);
    }

    #[test]
    fn test_empty_axis_fails_at_load() {
        let mut definition = Catalog::builtin().to_definition();
        definition.families.insert(
            ProductFamily::Frame,
            vec![OptionAxis::new(AxisId::SIZE, "Size", vec![])],
        );
        assert!(matches!(
            Catalog::from_definition(definition),
            Err(CatalogError::EmptyAxis { .. })
        ));
    }

    #[test]
    fn test_duplicate_value_fails_at_load() {
        let mut definition = Catalog::builtin().to_definition();
        definition.families.insert(
            ProductFamily::Frame,
            vec![OptionAxis::new(
                AxisId::SIZE,
                "Size",
                vec![value("A4", "A4", 0), value("A4", "A4 again", 10)],
            )],
        );
        assert!(matches!(
            Catalog::from_definition(definition),
            Err(CatalogError::DuplicateValue { .. })
        ));
    }

    #[test]
    fn test_negative_delta_fails_at_load() {
        let mut definition = Catalog::builtin().to_definition();
        definition.families.insert(
            ProductFamily::Frame,
            vec![OptionAxis::new(
                AxisId::SIZE,
                "Size",
                vec![value("A4", "A4", -10)],
            )],
        );
        assert!(matches!(
            Catalog::from_definition(definition),
            Err(CatalogError::NegativeDelta { .. })
        ));
    }

    #[test]
    fn test_missing_default_family_fails_at_load() {
        let mut definition = Catalog::builtin().to_definition();
        definition.families.remove(&ProductFamily::General);
        assert_eq!(
            Catalog::from_definition(definition),
            Err(CatalogError::MissingDefaultFamily)
        );
    }

    #[test]
    fn test_empty_default_family_fails_at_load() {
        let mut definition = Catalog::builtin().to_definition();
        definition.families.insert(ProductFamily::General, Vec::new());
        assert_eq!(
            Catalog::from_definition(definition),
            Err(CatalogError::EmptyFamily {
                family: ProductFamily::General
            })
        );
    }

    #[test]
    fn test_validate_selection() {
        let catalog = Catalog::builtin();
        let size = AxisId::new(AxisId::SIZE);

        let xl = catalog
            .validate_selection(ProductFamily::Apparel, &size, "XL")
            .unwrap();
        assert_eq!(xl.price_delta, Decimal::from(50));

        assert!(matches!(
            catalog.validate_selection(ProductFamily::Apparel, &size, "XS"),
            Err(SelectionError::UnknownValue { .. })
        ));
        assert!(matches!(
            catalog.validate_selection(ProductFamily::Engravable, &size, "S"),
            Err(SelectionError::UnknownAxis { .. })
        ));
    }

    #[test]
    fn test_definition_from_json() {
        let json = r#"{
            "families": {
                "general": [
                    {"id": "color", "label": "Color", "required": false,
                     "values": [{"key": "red", "label": "Red", "price_delta": "10.50"}]}
                ]
            }
        }"#;
        let definition: CatalogDefinition = serde_json::from_str(json).unwrap();
        let catalog = Catalog::from_definition(definition).unwrap();
        let axes = catalog.family_axes(ProductFamily::Apparel);
        assert_eq!(axes.len(), 1);
        assert!(!axes[0].required);
        assert_eq!(axes[0].values[0].price_delta, Decimal::new(1050, 2));
    }
}
