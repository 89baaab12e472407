//! Property tests for the pricing calculator and the wizard's step gates.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use keepsake_core::catalog::AxisId;
use keepsake_core::customer::CustomerDraft;
use keepsake_core::images::IncomingFile;
use keepsake_core::payment::{PaymentDraft, PaymentMethod};
use keepsake_core::policy::CustomizationPolicy;
use keepsake_core::session::{DeliveryOption, TextField};
use keepsake_core::validation::Field;
use keepsake_core::{Catalog, Product, ProductId, Wizard, WizardError, WizardStep, round_money};
use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;

fn product(price: Decimal) -> Product {
    Product {
        id: ProductId::new(1),
        name: "Custom T-Shirt".to_string(),
        price,
        stock: 1_000,
        category: Some("apparel".to_string()),
        image: None,
    }
}

fn wizard(price: Decimal) -> Wizard {
    Wizard::new(
        product(price),
        Arc::new(Catalog::builtin()),
        Arc::new(CustomizationPolicy::default()),
    )
}

fn png(index: usize) -> IncomingFile {
    IncomingFile::new(format!("{index}.png"), Some("image/png"), vec![1, 2, 3])
}

#[derive(Debug, Clone)]
struct Choices {
    base_cents: i64,
    size: &'static str,
    color: &'static str,
    print_area: &'static str,
    quantity: u32,
    text: Option<String>,
    images: usize,
    gift_wrap: bool,
    delivery: DeliveryOption,
}

fn choices() -> impl Strategy<Value = Choices> {
    (
        0i64..2_000_000,
        prop::sample::select(vec!["S", "M", "L", "XL", "XXL"]),
        prop::sample::select(vec!["white", "black", "red", "blue", "green"]),
        prop::sample::select(vec!["front", "back", "both"]),
        1u32..20,
        prop::option::of("[a-zA-Z ]{1,40}"),
        0usize..=5,
        any::<bool>(),
        prop::sample::select(vec![
            DeliveryOption::Standard,
            DeliveryOption::Express,
            DeliveryOption::Pickup,
        ]),
    )
        .prop_map(
            |(base_cents, size, color, print_area, quantity, text, images, gift_wrap, delivery)| {
                Choices {
                    base_cents,
                    size,
                    color,
                    print_area,
                    quantity,
                    text,
                    images,
                    gift_wrap,
                    delivery,
                }
            },
        )
}

fn build(c: &Choices) -> Wizard {
    let mut w = wizard(Decimal::new(c.base_cents, 2));
    w.select(&AxisId::new(AxisId::SIZE), c.size).unwrap();
    w.select(&AxisId::new(AxisId::COLOR), c.color).unwrap();
    w.select(&AxisId::new(AxisId::PRINT_AREA), c.print_area)
        .unwrap();
    w.set_quantity(c.quantity).unwrap();
    if let Some(text) = &c.text {
        w.set_text(TextField::CustomText, text).unwrap();
    }
    w.add_images((0..c.images).map(png).collect()).unwrap();
    w.set_gift_wrap(c.gift_wrap).unwrap();
    w.set_delivery(c.delivery).unwrap();
    w
}

proptest! {
    /// The same session always prices the same.
    #[test]
    fn prop_price_is_deterministic(c in choices()) {
        let w = build(&c);
        prop_assert_eq!(w.price().unwrap(), w.price().unwrap());
    }

    /// Buying one more unit never lowers the subtotal.
    #[test]
    fn prop_subtotal_monotonic_in_quantity(c in choices()) {
        let mut w = build(&c);
        let before = w.price().unwrap();
        w.set_quantity(c.quantity + 1).unwrap();
        let after = w.price().unwrap();

        prop_assert!(after.subtotal >= before.subtotal);
        prop_assert_eq!(after.unit_subtotal, before.unit_subtotal);
        prop_assert!(after.total >= after.subtotal);
    }

    /// The breakdown terms add up to the unit subtotal and the total.
    #[test]
    fn prop_breakdown_is_consistent(c in choices()) {
        let b = build(&c).price().unwrap();
        let unit = b.base_price
            + b.options_total
            + b.text_surcharge
            + b.engraving_surcharge
            + b.instructions_surcharge
            + b.image_surcharge
            + b.gift_wrap_surcharge;
        prop_assert_eq!(b.unit_subtotal, unit);
        prop_assert_eq!(b.subtotal, unit * Decimal::from(c.quantity));
        prop_assert_eq!(b.total, round_money(b.subtotal + b.delivery_price));
        prop_assert!(b.total >= Decimal::ZERO);
        prop_assert_eq!(b.image_count, c.images);
    }

    /// Delivery is waived exactly when the subtotal reaches the threshold.
    #[test]
    fn prop_free_delivery_threshold(c in choices()) {
        let b = build(&c).price().unwrap();
        let threshold = Decimal::from(1000);
        if b.subtotal >= threshold {
            prop_assert!(b.free_delivery);
            prop_assert_eq!(b.delivery_price, Decimal::ZERO);
        } else {
            prop_assert!(!b.free_delivery);
            let expected = match c.delivery {
                DeliveryOption::Standard => Decimal::from(60),
                DeliveryOption::Express => Decimal::from(120),
                DeliveryOption::Pickup => Decimal::ZERO,
            };
            prop_assert_eq!(b.delivery_price, expected);
        }
    }

    /// Options with a zero delta leave the unit price at the base price.
    #[test]
    fn prop_zero_delta_identity(base_cents in 0i64..2_000_000) {
        let base = Decimal::new(base_cents, 2);
        let mut w = wizard(base);
        w.select(&AxisId::new(AxisId::SIZE), "M").unwrap();
        w.select(&AxisId::new(AxisId::COLOR), "white").unwrap();
        w.select(&AxisId::new(AxisId::PRINT_AREA), "front").unwrap();
        prop_assert_eq!(w.price().unwrap().unit_subtotal, base);
    }

    /// Uploading past the cap keeps the first `max` files and rejects the rest.
    #[test]
    fn prop_image_cap(already in 0usize..=5, incoming in 0usize..10) {
        let max = CustomizationPolicy::default().images.max_count;
        let mut w = wizard(Decimal::from(100));
        w.add_images((0..already).map(png).collect()).unwrap();

        let report = w.add_images((0..incoming).map(png).collect()).unwrap();
        let room = max - already;
        prop_assert_eq!(report.accepted.len(), incoming.min(room));
        prop_assert_eq!(report.rejections.len(), incoming.saturating_sub(room));
        prop_assert!(w.session().images().len() <= max);
    }
}

#[test]
fn test_image_cap_max_plus_two() {
    let max = CustomizationPolicy::default().images.max_count;
    let mut w = wizard(Decimal::from(100));
    let report = w.add_images((0..max + 2).map(png).collect()).unwrap();
    assert_eq!(report.accepted.len(), max);
    assert_eq!(report.rejections.len(), 2);
    let order: Vec<&str> = w
        .session()
        .images()
        .ordered()
        .into_iter()
        .map(|image| image.filename.as_str())
        .collect();
    assert_eq!(order, vec!["0.png", "1.png", "2.png", "3.png", "4.png"]);
}

fn customer() -> CustomerDraft {
    CustomerDraft {
        name: "Tanvir Hasan".to_string(),
        phone: "01912345678".to_string(),
        address: "Road 3, Sector 7".to_string(),
        district: "Dhaka".to_string(),
        thana: "Uttara".to_string(),
        ..CustomerDraft::default()
    }
}

#[rstest]
#[case::missing_color(&[("size", "M"), ("printArea", "front")], Some(Field::Option(AxisId::new("color"))))]
#[case::missing_size(&[("color", "red"), ("printArea", "back")], Some(Field::Option(AxisId::new("size"))))]
#[case::complete(&[("size", "L"), ("color", "red"), ("printArea", "both")], None)]
fn test_options_gate(#[case] picks: &[(&str, &str)], #[case] missing: Option<Field>) {
    let mut w = wizard(Decimal::from(450));
    for (axis, key) in picks {
        w.select(&AxisId::new(*axis), key).unwrap();
    }
    match (w.advance(), missing) {
        (Ok(step), None) => assert_eq!(step, WizardStep::Design),
        (Err(WizardError::StepIncomplete { errors, .. }), Some(field)) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, field);
        }
        (other, expected) => panic!("unexpected {other:?} for missing {expected:?}"),
    }
}

#[rstest]
#[case::cash(PaymentDraft::new(PaymentMethod::CashOnDelivery, ""), true)]
#[case::bkash_without_reference(PaymentDraft::new(PaymentMethod::Bkash, ""), false)]
#[case::rocket_with_reference(PaymentDraft::new(PaymentMethod::Rocket, "R-1234"), true)]
#[case::nothing_chosen(PaymentDraft::default(), false)]
fn test_payment_gate(#[case] payment: PaymentDraft, #[case] passes: bool) {
    let mut w = wizard(Decimal::from(450));
    w.select(&AxisId::new(AxisId::SIZE), "M").unwrap();
    w.select(&AxisId::new(AxisId::COLOR), "red").unwrap();
    w.select(&AxisId::new(AxisId::PRINT_AREA), "front").unwrap();
    w.set_customer(customer()).unwrap();
    w.go_to(WizardStep::Payment).unwrap();
    w.set_payment(payment).unwrap();

    assert_eq!(w.advance().is_ok(), passes);
    let expected = if passes {
        WizardStep::Confirm
    } else {
        WizardStep::Payment
    };
    assert_eq!(w.current_step(), expected);
}

#[test]
fn test_worked_examples() {
    let mut w = wizard(Decimal::from(450));
    w.select(&AxisId::new(AxisId::SIZE), "XL").unwrap();
    w.select(&AxisId::new(AxisId::COLOR), "blue").unwrap();
    w.set_text(TextField::CustomText, "Hello").unwrap();
    w.add_images(vec![png(0), png(1)]).unwrap();

    assert_eq!(w.price().unwrap().total, Decimal::from(985));

    w.set_quantity(2).unwrap();
    let b = w.price().unwrap();
    assert_eq!(b.subtotal, Decimal::from(1850));
    assert!(b.free_delivery);
    assert_eq!(b.total, Decimal::from(1850));
}
