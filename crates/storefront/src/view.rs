//! Presentation contracts.
//!
//! Reconcilers never touch presentation directly. They push state changes
//! through [`ViewSync`] and ask the hosting page for confirmations and
//! navigation through [`PageHost`]. Both are fire-and-forget.

use std::time::Duration;

use keepsake_core::{CartLineItem, ProductId, WishlistEntry};
use rust_decimal::Decimal;

/// Delay before reloading the wishlist view after an authenticated toggle.
pub const WISHLIST_RELOAD_DELAY: Duration = Duration::from_millis(800);

/// User-facing notification texts.
pub mod messages {
    pub const CART_ADDED: &str = "Item added to cart!";
    pub const WISHLIST_ADDED: &str = "Added to wishlist!";
    pub const WISHLIST_REMOVED: &str = "Removed from wishlist";
    pub const CONFIRM_REMOVE: &str = "Remove this item?";
    pub const LOGIN_AGAIN: &str = "Please log in again.";
    pub const SESSION_EXPIRED: &str = "Session expired. Please log in again.";
}

/// Which count badge to update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeScope {
    Cart,
    Wishlist,
}

/// A navigation the hosting page should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageTransition {
    /// Navigate to a path on the same site.
    Visit(String),
    /// Reload the current page now.
    Reload,
    /// Reload the current page after a delay.
    ReloadAfter(Duration),
}

/// How wishlist membership indicators should change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorUpdate {
    /// Exactly these products are members; every other indicator is inactive.
    Exact(Vec<ProductId>),
    /// Only this product's membership is known.
    Single { id: ProductId, active: bool },
}

/// Observer notified after every state change.
pub trait ViewSync: Send + Sync {
    /// Re-render the cart-detail list and total.
    fn render_cart_view(&self, items: &[CartLineItem], total: Decimal);

    /// Re-render the wishlist-detail list.
    fn render_wishlist_view(&self, entries: &[WishlistEntry]);

    /// Show `count` on a header badge.
    fn set_count_badge(&self, scope: BadgeScope, count: u32);

    /// Transient, non-blocking notification.
    fn show_toast(&self, text: &str);

    /// Blocking error message.
    fn alert(&self, text: &str);

    /// Update heart/membership indicators on product cards.
    fn refresh_wishlist_indicators(&self, update: &IndicatorUpdate);
}

/// The page the reconcilers run inside.
pub trait PageHost: Send + Sync {
    /// Ask the user a yes/no question.
    fn confirm(&self, question: &str) -> bool;

    /// Navigate or reload.
    fn transition(&self, transition: &PageTransition);
}
