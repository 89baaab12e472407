//! Core value types for Keepsake.
//!
//! This module provides type-safe wrappers for IDs and money.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{CurrencyCode, MONEY_SCALE, Price, round_money};
