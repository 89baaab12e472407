//! Product source: read-only access to the shop's product records.
//!
//! [`HttpProductSource`] talks to the catalog service and caches responses
//! with `moka` (5-minute TTL). [`StaticProductSource`] serves a fixed list and
//! is used for local development and tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keepsake_core::{Product, ProductId};
use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

/// Errors that can occur when loading products.
#[derive(Debug, Error)]
pub enum ProductSourceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The product does not exist.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response or build a request URL.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Read-only product lookup.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Load one product.
    async fn product(&self, id: ProductId) -> Result<Product, ProductSourceError>;

    /// Load every listed product.
    async fn list(&self) -> Result<Vec<Product>, ProductSourceError>;
}

// =============================================================================
// HttpProductSource
// =============================================================================

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Product(ProductId),
    All,
}

#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    All(Arc<Vec<Product>>),
}

/// Product source backed by the catalog service's JSON API.
///
/// - `GET {base}/products` returns an array of products
/// - `GET {base}/products/{id}` returns one product, or 404
#[derive(Clone)]
pub struct HttpProductSource {
    inner: Arc<HttpProductSourceInner>,
}

struct HttpProductSourceInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl HttpProductSource {
    /// Create a new product source.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(HttpProductSourceInner {
                client,
                base_url,
                cache,
            }),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProductSourceError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ProductSourceError::Parse(format!("invalid product URL: {e}")))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        id: Option<ProductId>,
    ) -> Result<T, ProductSourceError> {
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND
            && let Some(id) = id
        {
            return Err(ProductSourceError::NotFound(id));
        }

        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Product source returned non-success status"
            );
            return Err(ProductSourceError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| ProductSourceError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ProductSource for HttpProductSource {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: ProductId) -> Result<Product, ProductSourceError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&format!("products/{id}"))?;
        let product: Product = self.get_json(url, Some(id)).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Product>, ProductSourceError> {
        if let Some(CacheValue::All(products)) = self.inner.cache.get(&CacheKey::All).await {
            debug!("Cache hit for product list");
            return Ok(products.as_ref().clone());
        }

        let url = self.endpoint("products")?;
        let products: Vec<Product> = self.get_json(url, None).await?;

        self.inner
            .cache
            .insert(CacheKey::All, CacheValue::All(Arc::new(products.clone())))
            .await;
        Ok(products)
    }
}

// =============================================================================
// StaticProductSource
// =============================================================================

/// Product source serving a fixed in-memory list.
#[derive(Debug, Clone, Default)]
pub struct StaticProductSource {
    products: Arc<HashMap<ProductId, Product>>,
    order: Arc<Vec<ProductId>>,
}

impl StaticProductSource {
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        let order = products.iter().map(|p| p.id).collect();
        let products = products.into_iter().map(|p| (p.id, p)).collect();
        Self {
            products: Arc::new(products),
            order: Arc::new(order),
        }
    }
}

#[async_trait]
impl ProductSource for StaticProductSource {
    async fn product(&self, id: ProductId) -> Result<Product, ProductSourceError> {
        self.products
            .get(&id)
            .cloned()
            .ok_or(ProductSourceError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<Product>, ProductSourceError> {
        Ok(self
            .order
            .iter()
            .filter_map(|id| self.products.get(id).cloned())
            .collect())
    }
}
