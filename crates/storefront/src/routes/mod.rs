//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                              - Health check
//!
//! # Products
//! GET    /api/products                        - Product listing
//! GET    /api/products/{id}/options           - Option axes for a product
//! POST   /api/quote                           - Price a session without a flow
//!
//! # Customization flows
//! POST   /api/flows                           - Open a flow for a product
//! GET    /api/flows/{id}                      - Current flow state
//! DELETE /api/flows/{id}                      - Close a flow, discarding it
//! PUT    /api/flows/{id}/selections/{axis}    - Choose an option value
//! DELETE /api/flows/{id}/selections/{axis}    - Clear an option
//! PUT    /api/flows/{id}/quantity             - Set quantity
//! PATCH  /api/flows/{id}/design               - Text, gift wrap, delivery
//! POST   /api/flows/{id}/images               - Upload images (multipart)
//! DELETE /api/flows/{id}/images/{image_id}    - Remove an image
//! PUT    /api/flows/{id}/customer             - Customer details
//! PUT    /api/flows/{id}/payment              - Payment choice
//! POST   /api/flows/{id}/advance              - Next step
//! POST   /api/flows/{id}/back                 - Previous step
//! POST   /api/flows/{id}/step                 - Jump to a step
//! POST   /api/flows/{id}/submit               - Submit the order
//! GET    /api/flows/{id}/receipt              - Receipt of a submitted order
//! ```

pub mod catalog;
pub mod flows;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::state::AppState;

/// Headroom on top of the image payload for multipart framing.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::list_products))
        .route("/{id}/options", get(catalog::product_options))
}

/// Create the flow routes router.
///
/// `upload_limit` caps the size of one image upload request.
pub fn flow_routes(upload_limit: usize) -> Router<AppState> {
    let uploads = Router::new()
        .route("/{id}/images", post(flows::upload_images))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(upload_limit));

    Router::new()
        .route("/", post(flows::open))
        .route("/{id}", get(flows::show).delete(flows::close))
        .route(
            "/{id}/selections/{axis}",
            put(flows::select).delete(flows::clear_selection),
        )
        .route("/{id}/quantity", put(flows::set_quantity))
        .route("/{id}/design", patch(flows::update_design))
        .route("/{id}/images/{image_id}", delete(flows::remove_image))
        .route("/{id}/customer", put(flows::set_customer))
        .route("/{id}/payment", put(flows::set_payment))
        .route("/{id}/advance", post(flows::advance))
        .route("/{id}/back", post(flows::back))
        .route("/{id}/step", post(flows::go_to))
        .route("/{id}/submit", post(flows::submit))
        .route("/{id}/receipt", get(flows::receipt))
        .merge(uploads)
}

/// Create the API router.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let images = &state.policy().images;
    let upload_limit = usize::try_from(images.max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_mul(images.max_count)
        .saturating_add(UPLOAD_OVERHEAD_BYTES);

    Router::new()
        .nest("/products", product_routes())
        .route("/quote", post(catalog::quote))
        .nest("/flows", flow_routes(upload_limit))
}
