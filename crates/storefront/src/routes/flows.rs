//! Customization flow handlers.
//!
//! Each customer works through one flow per product. Every mutating handler
//! answers with the full [`FlowView`] so the client can re-render the step,
//! the live price, and the outstanding validation errors from one response.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use keepsake_core::catalog::{AxisId, OptionAxis};
use keepsake_core::customer::CustomerDraft;
use keepsake_core::images::IncomingFile;
use keepsake_core::payment::PaymentDraft;
use keepsake_core::session::{CustomizationSession, DeliveryOption, TextField};
use keepsake_core::validation::FieldError;
use keepsake_core::wizard::ImageBatchReport;
use keepsake_core::{ImageId, PriceBreakdown, Product, ProductId, Wizard, WizardStep};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::flow::{CustomizationFlow, SubmissionReceipt};
use crate::messaging::chat_link;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Snapshot of a flow as the client sees it.
#[derive(Debug, Serialize)]
pub struct FlowView {
    pub id: Uuid,
    pub step: WizardStep,
    pub product: Product,
    pub axes: Vec<OptionAxis>,
    pub session: CustomizationSession,
    pub customer: CustomerDraft,
    pub payment: PaymentDraft,
    pub price: PriceBreakdown,
    /// What still blocks leaving the current step.
    pub step_errors: Vec<FieldError>,
    pub submitting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
}

impl FlowView {
    fn of(id: Uuid, wizard: &Wizard) -> Result<Self> {
        let price = wizard
            .price()
            .map_err(|e| AppError::Wizard(keepsake_core::WizardError::Pricing(e)))?;

        Ok(Self {
            id,
            step: wizard.current_step(),
            product: wizard.product().clone(),
            axes: wizard.axes().to_vec(),
            session: wizard.session().clone(),
            customer: wizard.customer().clone(),
            payment: wizard.payment().clone(),
            price,
            step_errors: wizard.step_errors(),
            submitting: wizard.is_submitting(),
            tracking_id: wizard.tracking_id().map(ToString::to_string),
        })
    }
}

/// Response to an image upload.
#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub report: ImageBatchReport,
    pub flow: FlowView,
}

/// Response to a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub tracking_id: String,
    pub total: Decimal,
    /// Pre-filled chat link for customers who want to confirm by message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_link: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

async fn find_flow(state: &AppState, id: Uuid) -> Result<CustomizationFlow> {
    state
        .flow(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("flow {id}")))
}

async fn view(flow: &CustomizationFlow) -> Result<Json<FlowView>> {
    let id = flow.id();
    flow.read(|w| FlowView::of(id, w)).await.map(Json)
}

// =============================================================================
// Handlers
// =============================================================================

/// Request to open a flow.
#[derive(Debug, Deserialize)]
pub struct OpenFlowRequest {
    pub product_id: ProductId,
}

/// Open a customization flow for a product.
///
/// POST /api/flows
#[instrument(skip(state), fields(product_id = %request.product_id))]
pub async fn open(
    State(state): State<AppState>,
    Json(request): Json<OpenFlowRequest>,
) -> Result<(StatusCode, Json<FlowView>)> {
    let product = state.products().product(request.product_id).await?;
    let flow = state.open_flow(product).await;
    tracing::info!(flow_id = %flow.id(), "Opened customization flow");

    let flow_id = flow.id().to_string();
    add_breadcrumb("flow", "Opened flow", Some(&[("flow_id", &flow_id)]));

    Ok((StatusCode::CREATED, view(&flow).await?))
}

/// Show a flow.
///
/// GET /api/flows/{id}
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<FlowView>> {
    let flow = find_flow(&state, id).await?;
    view(&flow).await
}

/// Close a flow, discarding its session.
///
/// An in-flight submission still completes; its result is simply not kept.
///
/// DELETE /api/flows/{id}
#[instrument(skip(state))]
pub async fn close(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    state
        .close_flow(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("flow {id}")))?;
    tracing::info!(flow_id = %id, "Closed customization flow");
    Ok(StatusCode::NO_CONTENT)
}

/// Body for choosing an option value.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub key: String,
}

/// Choose a value on an option axis.
///
/// PUT /api/flows/{id}/selections/{axis}
#[instrument(skip(state, request))]
pub async fn select(
    State(state): State<AppState>,
    Path((id, axis)): Path<(Uuid, String)>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<FlowView>> {
    let flow = find_flow(&state, id).await?;
    flow.edit(|w| w.select(&AxisId::new(axis), &request.key))
        .await?;
    view(&flow).await
}

/// Clear the choice on an option axis.
///
/// DELETE /api/flows/{id}/selections/{axis}
#[instrument(skip(state))]
pub async fn clear_selection(
    State(state): State<AppState>,
    Path((id, axis)): Path<(Uuid, String)>,
) -> Result<Json<FlowView>> {
    let flow = find_flow(&state, id).await?;
    flow.edit(|w| w.clear_selection(&AxisId::new(axis))).await?;
    view(&flow).await
}

/// Body for setting the quantity.
#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: u32,
}

/// Set the quantity.
///
/// PUT /api/flows/{id}/quantity
#[instrument(skip(state))]
pub async fn set_quantity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<QuantityRequest>,
) -> Result<Json<FlowView>> {
    let flow = find_flow(&state, id).await?;
    flow.edit(|w| w.set_quantity(request.quantity)).await?;
    view(&flow).await
}

/// Partial update of the design step. Absent fields are left alone; an
/// empty string clears a text field.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DesignUpdate {
    pub custom_text: Option<String>,
    pub engraving: Option<String>,
    pub special_instructions: Option<String>,
    pub gift_wrap: Option<bool>,
    pub delivery: Option<DeliveryOption>,
}

/// Update design fields.
///
/// Either every field in the body is applied or none is.
///
/// PATCH /api/flows/{id}/design
#[instrument(skip(state, update))]
pub async fn update_design(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<DesignUpdate>,
) -> Result<Json<FlowView>> {
    let flow = find_flow(&state, id).await?;
    flow.edit(|w| {
        let mut draft = w.clone();
        let texts = [
            (TextField::CustomText, update.custom_text),
            (TextField::Engraving, update.engraving),
            (TextField::SpecialInstructions, update.special_instructions),
        ];
        for (field, value) in texts {
            if let Some(value) = value {
                draft.set_text(field, &value)?;
            }
        }
        if let Some(gift_wrap) = update.gift_wrap {
            draft.set_gift_wrap(gift_wrap)?;
        }
        if let Some(delivery) = update.delivery {
            draft.set_delivery(delivery)?;
        }
        *w = draft;
        Ok(())
    })
    .await?;
    view(&flow).await
}

/// Upload reference images.
///
/// Every file part of the multipart body is treated as one image. Files that
/// fail validation are reported alongside the accepted ones; they never fail
/// the request as a whole.
///
/// POST /api/flows/{id}/images
#[instrument(skip(state, multipart))]
pub async fn upload_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ImageUploadResponse>> {
    let flow = find_flow(&state, id).await?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?
    {
        let Some(filename) = field.file_name().map(String::from) else {
            continue;
        };
        let content_type = field.content_type().map(String::from);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?;
        files.push(IncomingFile::new(
            filename,
            content_type.as_deref(),
            bytes.to_vec(),
        ));
    }

    if files.is_empty() {
        return Err(AppError::BadRequest("no files in upload".to_string()));
    }

    let report = flow.add_images(files).await?;
    let flow = view(&flow).await?.0;
    Ok(Json(ImageUploadResponse { report, flow }))
}

/// Remove an uploaded image.
///
/// DELETE /api/flows/{id}/images/{image_id}
#[instrument(skip(state))]
pub async fn remove_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<FlowView>> {
    let flow = find_flow(&state, id).await?;
    let removed = flow
        .edit(|w| w.remove_image(ImageId::from_uuid(image_id)))
        .await?;
    if removed.is_none() {
        return Err(AppError::NotFound(format!("image {image_id}")));
    }
    view(&flow).await
}

/// Replace the customer details.
///
/// PUT /api/flows/{id}/customer
#[instrument(skip(state, draft))]
pub async fn set_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<CustomerDraft>,
) -> Result<Json<FlowView>> {
    let flow = find_flow(&state, id).await?;
    flow.edit(|w| w.set_customer(draft)).await?;
    view(&flow).await
}

/// Replace the payment choice.
///
/// PUT /api/flows/{id}/payment
#[instrument(skip(state, draft))]
pub async fn set_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<PaymentDraft>,
) -> Result<Json<FlowView>> {
    let flow = find_flow(&state, id).await?;
    flow.edit(|w| w.set_payment(draft)).await?;
    view(&flow).await
}

/// Move to the next step.
///
/// POST /api/flows/{id}/advance
#[instrument(skip(state))]
pub async fn advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlowView>> {
    let flow = find_flow(&state, id).await?;
    let step = flow.edit(Wizard::advance).await?;
    tracing::debug!(step = %step, "Advanced");
    view(&flow).await
}

/// Move to the previous step.
///
/// POST /api/flows/{id}/back
#[instrument(skip(state))]
pub async fn back(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<FlowView>> {
    let flow = find_flow(&state, id).await?;
    flow.edit(Wizard::back).await?;
    view(&flow).await
}

/// Body for jumping to a step.
#[derive(Debug, Deserialize)]
pub struct GoToRequest {
    pub step: WizardStep,
}

/// Jump to a step.
///
/// POST /api/flows/{id}/step
#[instrument(skip(state))]
pub async fn go_to(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<GoToRequest>,
) -> Result<Json<FlowView>> {
    let flow = find_flow(&state, id).await?;
    flow.edit(|w| w.go_to(request.step)).await?;
    view(&flow).await
}

/// Submit the order.
///
/// POST /api/flows/{id}/submit
#[instrument(skip(state))]
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmitResponse>> {
    let flow = find_flow(&state, id).await?;
    let receipt = flow.submit().await?;

    add_breadcrumb(
        "order",
        "Submitted order",
        Some(&[("tracking_id", receipt.tracking_id.as_str())]),
    );
    tracing::info!(tracking_id = %receipt.tracking_id, total = %receipt.payload.total, "Order submitted");

    let chat_link = match state.messaging_number() {
        Some(number) => match chat_link(number, &receipt.payload) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build chat link");
                None
            }
        },
        None => None,
    };

    Ok(Json(SubmitResponse {
        tracking_id: receipt.tracking_id.to_string(),
        total: receipt.payload.total,
        chat_link,
    }))
}

/// Show the receipt of a submitted order.
///
/// GET /api/flows/{id}/receipt
#[instrument(skip(state))]
pub async fn receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmissionReceipt>> {
    let flow = find_flow(&state, id).await?;
    flow.receipt()
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("receipt for flow {id}")))
}
