//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use keepsake_core::{Catalog, CustomizationPolicy, Wizard};
use moka::future::Cache;
use uuid::Uuid;

use crate::config::StorefrontConfig;
use crate::flow::CustomizationFlow;
use crate::intake::{HttpOrderIntake, IntakeClientError, OrderIntake};
use crate::products::{HttpProductSource, ProductSource};

/// Flows untouched for this long are discarded.
const FLOW_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// Upper bound on concurrently open flows.
const MAX_OPEN_FLOWS: u64 = 10_000;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, policy, collaborators, and open customization flows.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    catalog: Arc<Catalog>,
    policy: Arc<CustomizationPolicy>,
    products: Arc<dyn ProductSource>,
    intake: Arc<dyn OrderIntake>,
    messaging_number: Option<String>,
    flows: Cache<Uuid, CustomizationFlow>,
}

impl AppState {
    /// Create application state with HTTP collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the order-intake client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, IntakeClientError> {
        let intake = HttpOrderIntake::new(&config.order_intake)?;
        let products = HttpProductSource::new(reqwest::Client::new(), config.product_source_url);

        Ok(Self::from_parts(
            config.catalog,
            config.policy,
            Arc::new(products),
            Arc::new(intake),
            config.messaging_number,
        ))
    }

    /// Create application state from explicit parts.
    #[must_use]
    pub fn from_parts(
        catalog: Catalog,
        policy: CustomizationPolicy,
        products: Arc<dyn ProductSource>,
        intake: Arc<dyn OrderIntake>,
        messaging_number: Option<String>,
    ) -> Self {
        let flows = Cache::builder()
            .max_capacity(MAX_OPEN_FLOWS)
            .time_to_idle(FLOW_IDLE_TIMEOUT)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                catalog: Arc::new(catalog),
                policy: Arc::new(policy),
                products,
                intake,
                messaging_number,
                flows,
            }),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn policy(&self) -> &CustomizationPolicy {
        &self.inner.policy
    }

    #[must_use]
    pub fn products(&self) -> &dyn ProductSource {
        self.inner.products.as_ref()
    }

    #[must_use]
    pub fn messaging_number(&self) -> Option<&str> {
        self.inner.messaging_number.as_deref()
    }

    /// Open a new flow for a product and register it.
    pub async fn open_flow(&self, product: keepsake_core::Product) -> CustomizationFlow {
        let wizard = Wizard::new(
            product,
            Arc::clone(&self.inner.catalog),
            Arc::clone(&self.inner.policy),
        );
        let flow = CustomizationFlow::new(wizard, Arc::clone(&self.inner.intake));
        self.inner.flows.insert(flow.id(), flow.clone()).await;
        flow
    }

    /// Look up an open flow.
    pub async fn flow(&self, id: Uuid) -> Option<CustomizationFlow> {
        self.inner.flows.get(&id).await
    }

    /// Discard a flow and everything entered in it.
    ///
    /// Returns the flow if it was open.
    pub async fn close_flow(&self, id: Uuid) -> Option<CustomizationFlow> {
        self.inner.flows.remove(&id).await
    }
}
