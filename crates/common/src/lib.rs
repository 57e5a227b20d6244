//! Common types and utilities for TradingRoad
//!
//! This crate provides shared types used across all TradingRoad crates.
//!
//! # Modules
//!
//! - [`error`] - Common error type and its HTTP status mapping
//! - [`types`] - JSON response envelope and symbol normalization

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
