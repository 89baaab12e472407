//! Integration test harness for Keepsake.
//!
//! Everything runs in-process: products come from a
//! [`StaticProductSource`] and orders go to a [`ScriptedIntake`] whose
//! answers each test decides up front.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p keepsake-integration-tests
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use keepsake_core::catalog::AxisId;
use keepsake_core::customer::CustomerDraft;
use keepsake_core::images::IncomingFile;
use keepsake_core::order::{OrderPayload, SubmissionError, TrackingId};
use keepsake_core::payment::{PaymentDraft, PaymentMethod};
use keepsake_core::{Catalog, CustomizationPolicy, Product, ProductId};
use keepsake_storefront::intake::OrderIntake;
use keepsake_storefront::products::StaticProductSource;
use keepsake_storefront::state::AppState;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

/// ID of the apparel product in [`sample_products`].
pub const TSHIRT: ProductId = ProductId::new(1);

/// ID of the engravable product in [`sample_products`].
pub const KEYCHAIN: ProductId = ProductId::new(2);

/// ID of the sold-out product in [`sample_products`].
pub const SOLD_OUT_MUG: ProductId = ProductId::new(3);

/// Products every test can rely on.
#[must_use]
pub fn sample_products() -> Vec<Product> {
    vec![
        Product {
            id: TSHIRT,
            name: "Custom T-Shirt".to_string(),
            price: Decimal::from(450),
            stock: 25,
            category: Some("apparel".to_string()),
            image: None,
        },
        Product {
            id: KEYCHAIN,
            name: "Wooden Keychain".to_string(),
            price: Decimal::from(300),
            stock: 3,
            category: None,
            image: None,
        },
        Product {
            id: SOLD_OUT_MUG,
            name: "Photo Mug".to_string(),
            price: Decimal::from(350),
            stock: 0,
            category: Some("mugs".to_string()),
            image: None,
        },
    ]
}

// =============================================================================
// Scripted order intake
// =============================================================================

/// Order intake that replays queued answers and records what it was sent.
///
/// When the script runs out, every order is accepted with a generated
/// tracking ID.
#[derive(Default)]
pub struct ScriptedIntake {
    script: Mutex<VecDeque<Result<TrackingId, SubmissionError>>>,
    received: Mutex<Vec<OrderPayload>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedIntake {
    /// Intake that accepts everything.
    #[must_use]
    pub fn accepting() -> Self {
        Self::default()
    }

    /// Intake that answers with `responses`, in order.
    #[must_use]
    pub fn with_script(responses: Vec<Result<TrackingId, SubmissionError>>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    /// Hold every request for `delay` before answering.
    #[must_use]
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of submissions received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Payloads received, in order.
    pub async fn received(&self) -> Vec<OrderPayload> {
        self.received.lock().await.clone()
    }
}

#[async_trait]
impl OrderIntake for ScriptedIntake {
    async fn submit(&self, payload: &OrderPayload) -> Result<TrackingId, SubmissionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.received.lock().await.push(payload.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(TrackingId::new(format!("KS-{call:04}"))))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Application state over the sample products and `intake`.
#[must_use]
pub fn test_state(intake: Arc<ScriptedIntake>) -> AppState {
    AppState::from_parts(
        Catalog::builtin(),
        CustomizationPolicy::default(),
        Arc::new(StaticProductSource::new(sample_products())),
        intake,
        Some("8801700000000".to_string()),
    )
}

/// A customer that passes validation.
#[must_use]
pub fn customer() -> CustomerDraft {
    CustomerDraft {
        name: "Nusrat Jahan".to_string(),
        phone: "01712345678".to_string(),
        email: "nusrat@example.com".to_string(),
        address: "House 14, Road 7, Dhanmondi".to_string(),
        district: "Dhaka".to_string(),
        thana: "Dhanmondi".to_string(),
    }
}

/// A prepaid payment with a reference.
#[must_use]
pub fn bkash() -> PaymentDraft {
    PaymentDraft::new(PaymentMethod::Bkash, "TXN8842")
}

/// A small PNG-typed file.
#[must_use]
pub fn png(name: &str) -> IncomingFile {
    IncomingFile::new(name, Some("image/png"), vec![0x89, b'P', b'N', b'G'])
}

/// Apparel selections that pass the options step: XL, blue, front print.
#[must_use]
pub fn tshirt_selections() -> Vec<(AxisId, &'static str)> {
    vec![
        (AxisId::new(AxisId::SIZE), "XL"),
        (AxisId::new(AxisId::COLOR), "blue"),
        (AxisId::new(AxisId::PRINT_AREA), "front"),
    ]
}
