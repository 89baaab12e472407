//! Order-intake collaborator.
//!
//! Submitting an order is the only network call the checkout makes. The
//! [`OrderIntake`] trait hides the transport so flows can be exercised
//! against an in-memory fake.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keepsake_core::order::{OrderPayload, SubmissionError, TrackingId, interpret_response};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::{OrderIntakeConfig, bearer_token};

/// Request timeout for order submission.
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Accepts finished orders.
#[async_trait]
pub trait OrderIntake: Send + Sync {
    /// Submit an order, returning the service's tracking id.
    async fn submit(&self, payload: &OrderPayload) -> Result<TrackingId, SubmissionError>;
}

/// Errors building the HTTP intake client.
#[derive(Debug, Error)]
pub enum IntakeClientError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid token format: {0}")]
    InvalidToken(String),
}

/// Order intake over HTTP: `POST`s the payload as JSON.
#[derive(Clone)]
pub struct HttpOrderIntake {
    inner: Arc<HttpOrderIntakeInner>,
}

struct HttpOrderIntakeInner {
    client: reqwest::Client,
    url: Url,
}

impl HttpOrderIntake {
    /// Create a new intake client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &OrderIntakeConfig) -> Result<Self, IntakeClientError> {
        let mut headers = HeaderMap::new();
        if let Some(auth_value) = bearer_token(config) {
            let mut value = HeaderValue::from_str(&auth_value)
                .map_err(|e| IntakeClientError::InvalidToken(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(SUBMIT_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpOrderIntakeInner {
                client,
                url: config.url.clone(),
            }),
        })
    }
}

#[async_trait]
impl OrderIntake for HttpOrderIntake {
    #[instrument(skip_all, fields(total = %payload.total, items = payload.items.len()))]
    async fn submit(&self, payload: &OrderPayload) -> Result<TrackingId, SubmissionError> {
        let response = self
            .inner
            .client
            .post(self.inner.url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        let result = interpret_response(status.as_u16(), &body);
        match &result {
            Ok(tracking_id) => tracing::info!(%tracking_id, "Order accepted"),
            Err(error) if error.is_retryable() => {
                tracing::warn!(%status, %error, "Order intake temporarily unavailable");
            }
            Err(error) => tracing::info!(%status, %error, "Order rejected by intake service"),
        }
        result
    }
}
