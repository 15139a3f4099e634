//! Core types for Keepsake.
//!
//! This module provides type-safe wrappers and collections for the cart and
//! wishlist domain.

pub mod cart;
pub mod id;
pub mod mode;
pub mod price;
pub mod wishlist;

pub use cart::{Cart, CartLineItem, QuantityChange};
pub use id::*;
pub use mode::SessionMode;
pub use price::{Price, PriceError};
pub use wishlist::{Wishlist, WishlistAction, WishlistEntry};
