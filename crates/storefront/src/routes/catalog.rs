//! Product option and stateless quote handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use keepsake_core::catalog::OptionAxis;
use keepsake_core::session::CustomizationSession;
use keepsake_core::{PriceBreakdown, Product, ProductFamily, ProductId, compute_price};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Options offered for a product.
#[derive(Debug, Serialize)]
pub struct ProductOptions {
    pub product: Product,
    pub family: ProductFamily,
    pub axes: Vec<OptionAxis>,
}

/// List products.
///
/// GET /api/products
#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.products().list().await?))
}

/// Show the option axes for a product.
///
/// GET /api/products/{id}/options
#[instrument(skip(state))]
pub async fn product_options(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductOptions>> {
    let product = state.products().product(ProductId::new(id)).await?;
    let family = state.catalog().family_of(&product);
    let axes = state.catalog().family_axes(family).to_vec();

    Ok(Json(ProductOptions {
        product,
        family,
        axes,
    }))
}

/// Request for a one-off price quote.
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub product_id: ProductId,
    pub session: CustomizationSession,
}

/// Price a session without opening a flow.
///
/// POST /api/quote
#[instrument(skip(state, request), fields(product_id = %request.product_id))]
pub async fn quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<PriceBreakdown>> {
    let product = state.products().product(request.product_id).await?;
    let family = state.catalog().family_of(&product);
    if request.session.family() != family {
        return Err(AppError::BadRequest(format!(
            "session is for {} products but product {} is {family}",
            request.session.family(),
            product.id
        )));
    }

    request
        .session
        .check_limits(state.policy())
        .map_err(AppError::Invalid)?;

    // A bad selection here comes from the client, not our catalog data.
    compute_price(
        product.price,
        state.catalog(),
        &request.session,
        &state.policy().pricing,
    )
    .map(Json)
    .map_err(|e| AppError::BadRequest(e.to_string()))
}
