//! The step-gated customization wizard.
//!
//! A [`Wizard`] owns one [`CustomizationSession`] together with the customer
//! and payment drafts, and moves through the steps
//!
//! ```text
//! Options → Design → CustomerInfo → Payment → Confirm → Submitted
//! ```
//!
//! Moving forward runs the guard of the step being left; moving back never
//! clears anything. `Confirm → Submitted` happens only through a successful
//! submission:
//!
//! 1. [`Wizard::begin_submission`] assembles the payload and marks the wizard
//!    as submitting. A second call fails until the first is resolved.
//! 2. The caller hands the payload to the order-intake service.
//! 3. [`Wizard::complete_submission`] moves to `Submitted` and freezes the
//!    wizard, or [`Wizard::abort_submission`] returns it to `Confirm` with
//!    every field as it was.

use core::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{AxisId, Catalog, OptionAxis, SelectionError};
use crate::customer::CustomerDraft;
use crate::images::{ImageRejection, IncomingFile, UploadedImage, admit, prepare_file};
use crate::order::{AssemblyError, OrderPayload, TrackingId, assemble};
use crate::payment::PaymentDraft;
use crate::policy::CustomizationPolicy;
use crate::pricing::{PriceBreakdown, PricingError, compute_price};
use crate::product::Product;
use crate::session::{CustomizationSession, DeliveryOption, TextField};
use crate::types::ImageId;
use crate::validation::{Field, FieldError, join_errors};

// =============================================================================
// Steps
// =============================================================================

/// A step of the customization flow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Options,
    Design,
    CustomerInfo,
    Payment,
    Confirm,
    Submitted,
}

impl WizardStep {
    /// All steps in flow order.
    pub const ALL: [Self; 6] = [
        Self::Options,
        Self::Design,
        Self::CustomerInfo,
        Self::Payment,
        Self::Confirm,
        Self::Submitted,
    ];

    /// The step after this one.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Options => Some(Self::Design),
            Self::Design => Some(Self::CustomerInfo),
            Self::CustomerInfo => Some(Self::Payment),
            Self::Payment => Some(Self::Confirm),
            Self::Confirm => Some(Self::Submitted),
            Self::Submitted => None,
        }
    }

    /// The step before this one.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Options | Self::Submitted => None,
            Self::Design => Some(Self::Options),
            Self::CustomerInfo => Some(Self::Design),
            Self::Payment => Some(Self::CustomerInfo),
            Self::Confirm => Some(Self::Payment),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Options => "options",
            Self::Design => "design",
            Self::CustomerInfo => "customer_info",
            Self::Payment => "payment",
            Self::Confirm => "confirm",
            Self::Submitted => "submitted",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors returned by wizard operations.
#[derive(thiserror::Error, Debug)]
pub enum WizardError {
    #[error("the order has been submitted and can no longer be changed")]
    ReadOnly,

    #[error("a submission is in progress")]
    SubmissionInFlight,

    #[error("no submission is in progress")]
    NotSubmitting,

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Invalid(#[from] FieldError),

    #[error("the {step} step is incomplete: {}", join_errors(.errors))]
    StepIncomplete {
        step: WizardStep,
        errors: Vec<FieldError>,
    },

    #[error("the order must be submitted to leave the confirm step")]
    SubmissionRequired,

    #[error("already at the first step")]
    NoPreviousStep,

    #[error("orders can only be submitted from the confirm step (currently at {0})")]
    NotAtConfirm(WizardStep),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

impl WizardError {
    /// Field errors carried by this error, for rendering next to inputs.
    #[must_use]
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            Self::Invalid(error) => vec![error.clone()],
            Self::StepIncomplete { errors, .. } => errors.clone(),
            _ => Vec::new(),
        }
    }
}

/// Images accepted and rejected from one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageBatchReport {
    pub accepted: Vec<ImageId>,
    pub rejections: Vec<ImageRejection>,
}

// =============================================================================
// Wizard
// =============================================================================

/// One customer's customization flow for one product.
#[derive(Debug, Clone)]
pub struct Wizard {
    product: Product,
    catalog: Arc<Catalog>,
    policy: Arc<CustomizationPolicy>,
    session: CustomizationSession,
    customer: CustomerDraft,
    payment: PaymentDraft,
    submitting: bool,
    tracking_id: Option<TrackingId>,
}

impl Wizard {
    /// Start a flow for `product` at the options step.
    #[must_use]
    pub fn new(product: Product, catalog: Arc<Catalog>, policy: Arc<CustomizationPolicy>) -> Self {
        let family = catalog.family_of(&product);
        Self {
            product,
            catalog,
            policy,
            session: CustomizationSession::new(family),
            customer: CustomerDraft::default(),
            payment: PaymentDraft::default(),
            submitting: false,
            tracking_id: None,
        }
    }

    #[must_use]
    pub const fn product(&self) -> &Product {
        &self.product
    }

    #[must_use]
    pub const fn session(&self) -> &CustomizationSession {
        &self.session
    }

    #[must_use]
    pub const fn customer(&self) -> &CustomerDraft {
        &self.customer
    }

    #[must_use]
    pub const fn payment(&self) -> &PaymentDraft {
        &self.payment
    }

    #[must_use]
    pub fn policy(&self) -> &CustomizationPolicy {
        &self.policy
    }

    #[must_use]
    pub const fn current_step(&self) -> WizardStep {
        self.session.current_step()
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Tracking id of the submitted order.
    #[must_use]
    pub const fn tracking_id(&self) -> Option<&TrackingId> {
        self.tracking_id.as_ref()
    }

    /// Ordered option axes offered for this product.
    #[must_use]
    pub fn axes(&self) -> &[OptionAxis] {
        self.catalog.family_axes(self.session.family())
    }

    /// Current price of the customization.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] on catalog or product data defects.
    pub fn price(&self) -> Result<PriceBreakdown, PricingError> {
        compute_price(
            self.product.price,
            &self.catalog,
            &self.session,
            &self.policy.pricing,
        )
    }

    const fn ensure_editable(&self) -> Result<(), WizardError> {
        if matches!(self.session.current_step(), WizardStep::Submitted) {
            return Err(WizardError::ReadOnly);
        }
        if self.submitting {
            return Err(WizardError::SubmissionInFlight);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Edits
    // -------------------------------------------------------------------------

    /// Choose a value for an option axis.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::Selection`] for an axis or value outside this
    /// product's catalog family.
    pub fn select(&mut self, axis: &AxisId, key: &str) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.session.select(&self.catalog, axis, key)?;
        Ok(())
    }

    /// Remove the selection for an axis.
    ///
    /// # Errors
    ///
    /// Returns an error if the wizard is read-only or submitting.
    pub fn clear_selection(&mut self, axis: &AxisId) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.session.clear_selection(axis);
        Ok(())
    }

    /// Set the quantity.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::Invalid`] for a zero quantity.
    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.session.set_quantity(quantity)?;
        Ok(())
    }

    /// Set or clear a free-text design field.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::Invalid`] if the text is too long.
    pub fn set_text(&mut self, field: TextField, value: &str) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.session.set_text(field, value, &self.policy.text)?;
        Ok(())
    }

    /// Choose a delivery option.
    ///
    /// # Errors
    ///
    /// Returns an error if the wizard is read-only or submitting.
    pub fn set_delivery(&mut self, delivery: DeliveryOption) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.session.set_delivery(delivery);
        Ok(())
    }

    /// Turn gift wrap on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the wizard is read-only or submitting.
    pub fn set_gift_wrap(&mut self, gift_wrap: bool) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.session.set_gift_wrap(gift_wrap);
        Ok(())
    }

    /// Validate, encode, and attach a batch of files.
    ///
    /// # Errors
    ///
    /// Returns an error if the wizard is read-only or submitting. Per-file
    /// problems are reported in the batch report, not as errors.
    pub fn add_images(&mut self, files: Vec<IncomingFile>) -> Result<ImageBatchReport, WizardError> {
        self.ensure_editable()?;
        let prepared = files
            .into_iter()
            .map(|file| prepare_file(file, &self.policy.images))
            .collect();
        self.apply_prepared(prepared)
    }

    /// Attach a batch of files that were validated and encoded elsewhere.
    ///
    /// The whole batch is applied in one step, so a price computed before or
    /// after this call never sees a partial batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the wizard is read-only or submitting.
    pub fn apply_prepared(
        &mut self,
        prepared: Vec<Result<UploadedImage, ImageRejection>>,
    ) -> Result<ImageBatchReport, WizardError> {
        self.ensure_editable()?;
        let outcome = admit(prepared, self.session.images(), &self.policy.images);
        self.session.replace_images(outcome.images);
        Ok(ImageBatchReport {
            accepted: outcome.accepted,
            rejections: outcome.rejections,
        })
    }

    /// Remove an image by id. Returns the removed image, if it was attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the wizard is read-only or submitting.
    pub fn remove_image(&mut self, id: ImageId) -> Result<Option<UploadedImage>, WizardError> {
        self.ensure_editable()?;
        Ok(self.session.images_mut().remove(id))
    }

    /// Replace the customer details draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the wizard is read-only or submitting.
    pub fn set_customer(&mut self, customer: CustomerDraft) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.customer = customer;
        Ok(())
    }

    /// Replace the payment draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the wizard is read-only or submitting.
    pub fn set_payment(&mut self, payment: PaymentDraft) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.payment = payment;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Errors that keep the current step from being completed.
    #[must_use]
    pub fn step_errors(&self) -> Vec<FieldError> {
        self.errors_for(self.current_step())
    }

    fn errors_for(&self, step: WizardStep) -> Vec<FieldError> {
        match step {
            WizardStep::Options => self.option_errors(),
            WizardStep::Design => self.design_errors(),
            WizardStep::CustomerInfo => self.customer.validate().err().unwrap_or_default(),
            WizardStep::Payment => self.payment.validate().err().into_iter().collect(),
            WizardStep::Confirm | WizardStep::Submitted => Vec::new(),
        }
    }

    fn option_errors(&self) -> Vec<FieldError> {
        let mut errors: Vec<FieldError> = self
            .axes()
            .iter()
            .filter(|axis| axis.required && !self.session.selections().contains_key(&axis.id))
            .map(|axis| {
                FieldError::new(
                    Field::Option(axis.id.clone()),
                    format!("please choose a {}", axis.label.to_lowercase()),
                )
            })
            .collect();

        let quantity = self.session.quantity();
        if !self.product.in_stock() {
            errors.push(FieldError::new(Field::Quantity, "this product is out of stock"));
        } else if !self.product.has_stock_for(quantity) {
            errors.push(FieldError::new(
                Field::Quantity,
                format!("only {} in stock", self.product.stock),
            ));
        }
        errors
    }

    fn design_errors(&self) -> Vec<FieldError> {
        self.session
            .check_limits(&self.policy)
            .err()
            .unwrap_or_default()
    }

    /// Complete the current step and move to the next.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::StepIncomplete`] with every field error if the
    /// step's guard fails, or [`WizardError::SubmissionRequired`] at the
    /// confirm step.
    pub fn advance(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_editable()?;
        let step = self.current_step();
        if step == WizardStep::Confirm {
            return Err(WizardError::SubmissionRequired);
        }
        let errors = self.errors_for(step);
        if !errors.is_empty() {
            return Err(WizardError::StepIncomplete { step, errors });
        }
        let next = step.next().ok_or(WizardError::ReadOnly)?;
        self.session.set_step(next);
        Ok(next)
    }

    /// Go back one step. Nothing entered is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::NoPreviousStep`] at the options step.
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_editable()?;
        let previous = self
            .current_step()
            .previous()
            .ok_or(WizardError::NoPreviousStep)?;
        self.session.set_step(previous);
        Ok(previous)
    }

    /// Jump to a step.
    ///
    /// Earlier steps are always reachable. Later steps are reachable only if
    /// every step in between passes its guard; otherwise the wizard stays
    /// where it is and the first failing step is reported.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::StepIncomplete`] for the first failing guard,
    /// or [`WizardError::SubmissionRequired`] when targeting `Submitted`.
    pub fn go_to(&mut self, target: WizardStep) -> Result<WizardStep, WizardError> {
        self.ensure_editable()?;
        if target == WizardStep::Submitted {
            return Err(WizardError::SubmissionRequired);
        }
        let current = self.current_step();
        if target > current {
            for step in WizardStep::ALL
                .into_iter()
                .filter(|step| *step >= current && *step < target)
            {
                let errors = self.errors_for(step);
                if !errors.is_empty() {
                    return Err(WizardError::StepIncomplete { step, errors });
                }
            }
        }
        self.session.set_step(target);
        Ok(target)
    }

    // -------------------------------------------------------------------------
    // Submission
    // -------------------------------------------------------------------------

    /// Assemble the order payload and mark the wizard as submitting.
    ///
    /// Nothing in the session changes, so an aborted submission can be
    /// retried with identical data.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::SubmissionInFlight`] while a previous call is
    /// unresolved, [`WizardError::NotAtConfirm`] outside the confirm step,
    /// [`WizardError::StepIncomplete`] for the first step whose guard no
    /// longer passes, and pricing or assembly errors for data defects.
    pub fn begin_submission(&mut self) -> Result<OrderPayload, WizardError> {
        self.ensure_editable()?;
        let step = self.current_step();
        if step != WizardStep::Confirm {
            return Err(WizardError::NotAtConfirm(step));
        }
        // Earlier steps stay editable at confirm; every guard must still hold.
        for step in WizardStep::ALL
            .into_iter()
            .filter(|step| *step < WizardStep::Confirm)
        {
            let errors = self.errors_for(step);
            if !errors.is_empty() {
                return Err(WizardError::StepIncomplete { step, errors });
            }
        }

        let customer = self
            .customer
            .validate()
            .map_err(|errors| WizardError::StepIncomplete {
                step: WizardStep::CustomerInfo,
                errors,
            })?;
        let payment = self
            .payment
            .validate()
            .map_err(|error| WizardError::StepIncomplete {
                step: WizardStep::Payment,
                errors: vec![error],
            })?;
        let breakdown = self.price()?;
        let payload = assemble(&self.product, &self.session, &customer, &payment, &breakdown)?;

        self.submitting = true;
        Ok(payload)
    }

    /// Record a successful submission. The wizard becomes read-only.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::NotSubmitting`] if no submission was started.
    pub fn complete_submission(&mut self, tracking_id: TrackingId) -> Result<(), WizardError> {
        if !self.submitting {
            return Err(WizardError::NotSubmitting);
        }
        self.submitting = false;
        self.tracking_id = Some(tracking_id);
        self.session.set_step(WizardStep::Submitted);
        Ok(())
    }

    /// Record a failed submission. The wizard stays at `Confirm`, unchanged.
    pub const fn abort_submission(&mut self) {
        self.submitting = false;
    }
}
