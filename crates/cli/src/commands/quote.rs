//! Offline price quotes.

use std::path::Path;

use keepsake_core::session::CustomizationSession;
use keepsake_core::{PriceBreakdown, Price, compute_price};
use rust_decimal::Decimal;
use tracing::info;

use super::{CommandError, catalog, policy, read_json};

/// Price a saved session and print the breakdown.
///
/// # Errors
///
/// Returns an error if an input file is invalid or the session references
/// options the catalog does not define.
#[allow(clippy::print_stdout)]
pub fn run(
    session: &Path,
    base_price: Decimal,
    catalog: Option<&Path>,
    policy: Option<&Path>,
) -> Result<(), CommandError> {
    let session: CustomizationSession = read_json(session)?;
    let breakdown = quote(
        &session,
        base_price,
        &catalog::load(catalog)?,
        &policy::load(policy)?,
    )?;

    info!(family = %session.family(), total = %breakdown.total, "Quoted session");
    print!("{}", render(&breakdown));
    Ok(())
}

fn quote(
    session: &CustomizationSession,
    base_price: Decimal,
    catalog: &keepsake_core::Catalog,
    policy: &keepsake_core::CustomizationPolicy,
) -> Result<PriceBreakdown, CommandError> {
    session.check_limits(policy).map_err(CommandError::Limits)?;
    Ok(compute_price(base_price, catalog, session, &policy.pricing)?)
}

fn render(b: &PriceBreakdown) -> String {
    let mut lines = vec![format!("{:<24}{}", "Base price", Price::taka(b.base_price))];
    for charge in &b.option_charges {
        lines.push(format!(
            "{:<24}{}",
            format!("{}: {}", charge.axis_label, charge.label),
            Price::taka(charge.delta)
        ));
    }
    let surcharges = [
        ("Custom text", b.text_surcharge),
        ("Engraving", b.engraving_surcharge),
        ("Instructions", b.instructions_surcharge),
        ("Images", b.image_surcharge),
        ("Gift wrap", b.gift_wrap_surcharge),
    ];
    for (label, amount) in surcharges {
        if amount > Decimal::ZERO {
            lines.push(format!("{label:<24}{}", Price::taka(amount)));
        }
    }
    lines.push(format!("{:<24}{}", "Unit price", Price::taka(b.unit_subtotal)));
    lines.push(format!("{:<24}{}", "Quantity", b.quantity));
    lines.push(format!("{:<24}{}", "Subtotal", Price::taka(b.subtotal)));
    let delivery = if b.free_delivery {
        "free".to_string()
    } else {
        Price::taka(b.delivery_price).to_string()
    };
    lines.push(format!(
        "{:<24}{delivery}",
        format!("Delivery ({})", b.delivery_option)
    ));
    lines.push(format!("{:<24}{}", "Total", Price::taka(b.total)));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use keepsake_core::catalog::AxisId;
    use keepsake_core::{Catalog, CustomizationPolicy, ProductFamily};

    use super::*;

    #[test]
    fn test_quote_and_render() {
        let catalog = Catalog::builtin();
        let mut session = CustomizationSession::new(ProductFamily::Apparel);
        session
            .select(&catalog, &AxisId::new(AxisId::SIZE), "XL")
            .unwrap();

        let breakdown = quote(
            &session,
            Decimal::from(450),
            &catalog,
            &CustomizationPolicy::default(),
        )
        .unwrap();
        let text = render(&breakdown);

        assert_eq!(breakdown.unit_subtotal, Decimal::from(500));
        assert!(text.starts_with("Base price"));
        assert!(text.contains("Size: Extra Large"));
        assert!(text.contains("৳450.00"));
        assert!(text.trim_end().ends_with(&Price::taka(breakdown.total).to_string()));
    }

    #[test]
    fn test_quote_rejects_session_over_policy_limits() {
        let catalog = Catalog::builtin();
        let policy = CustomizationPolicy::default();
        let mut json =
            serde_json::to_value(CustomizationSession::new(ProductFamily::Apparel)).unwrap();
        json["engraving_text"] = serde_json::Value::String("x".repeat(policy.text.engraving + 1));
        let session: CustomizationSession = serde_json::from_value(json).unwrap();

        let err = quote(&session, Decimal::from(450), &catalog, &policy).unwrap_err();
        assert!(matches!(err, CommandError::Limits(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("engraving"));
    }
}
