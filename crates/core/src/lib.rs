//! Keepsake Core - Shared cart and wishlist types.
//!
//! This crate provides the types used across all Keepsake components:
//! - `storefront` - Dual-mode cart and wishlist reconciliation
//! - `cli` - Command-line driver for the reconcilers
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no storage access, no HTTP clients. This keeps it lightweight and allows
//! it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, cart lines, wishlist entries, session mode

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
