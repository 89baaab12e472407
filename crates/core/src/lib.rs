//! Keepsake Core - product customization and dynamic pricing engine.
//!
//! This crate holds the rules behind the customization flow shared by every
//! Keepsake component:
//! - `storefront` - JSON service that drives customization flows and submits orders
//! - `cli` - Command-line tools for catalog validation and offline quotes
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no async, no
//! HTTP clients. Submitting an order is the caller's job: the wizard hands out
//! an [`OrderPayload`](order::OrderPayload) and is told the outcome.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs and money helpers
//! - [`catalog`] - Option axes per product family
//! - [`session`] - Mutable state of one customization
//! - [`pricing`] - Itemized price computation
//! - [`images`] - Reference image validation and encoding
//! - [`customer`] / [`payment`] - Checkout details
//! - [`wizard`] - Step-gated flow tying it all together
//! - [`order`] - Order payload, response interpretation, chat message

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod customer;
pub mod images;
pub mod order;
pub mod payment;
pub mod policy;
pub mod pricing;
pub mod product;
pub mod session;
pub mod types;
pub mod validation;
pub mod wizard;

pub use catalog::{Catalog, ProductFamily};
pub use policy::CustomizationPolicy;
pub use pricing::{PriceBreakdown, compute_price};
pub use product::Product;
pub use types::*;
pub use wizard::{Wizard, WizardError, WizardStep};
