//! Cart and wishlist state stores.
//!
//! # Architecture
//!
//! - [`StateStore`] is the capability interface the reconcilers program against
//! - [`LocalStateStore`] keeps guest state in a client-resident key/value blob
//! - [`RemoteStateStore`] delegates authenticated state to the backend API
//! - [`Stores`] routes a [`SessionMode`] to exactly one of them
//!
//! Results describe what the store knows after the call: the full contents
//! (local), only an authoritative count (remote), or a page transition that
//! completes the change on the server side.

mod local;
mod remote;
pub mod storage;

pub use local::{LocalStateStore, keys};
pub use remote::{CartItemsResponse, RemoteStateStore, ServerCartItem};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};

use async_trait::async_trait;
use keepsake_core::{Cart, CartLineItem, ProductId, SessionMode, Wishlist, WishlistAction, WishlistEntry};
use thiserror::Error;

use crate::view::PageTransition;

/// Errors raised by a state store.
///
/// Only the remote store produces these; local storage failures are logged
/// and degrade to empty collections instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request failed before a response arrived.
    #[error("Network failure: {0}")]
    Network(reqwest::Error),

    /// No response within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("Server rejected request: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// The server answered `success: false`.
    #[error("Server reported the action as unsuccessful")]
    Unsuccessful,

    /// The response body could not be understood.
    #[error("Invalid response: {0}")]
    Parse(String),

    /// A request URL could not be built from the configured base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A removal toggled an absent wishlist entry in and the undo failed, so
    /// the server still holds the entry.
    #[error("Wishlist entry {id} was left added: {source}")]
    LeftAdded {
        id: ProductId,
        #[source]
        source: Box<StoreError>,
    },

    /// No store serves this session mode.
    #[error("No store configured for {0:?} sessions")]
    Unavailable(SessionMode),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }
}

impl StoreError {
    /// The call never produced a response (network failure or timeout).
    #[must_use]
    pub fn is_network(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::LeftAdded { source, .. } => source.is_network(),
            _ => false,
        }
    }

    /// The server responded but did not apply the action.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        match self {
            Self::Rejected { .. } | Self::Unsuccessful | Self::Parse(_) => true,
            Self::LeftAdded { source, .. } => source.is_rejected(),
            _ => false,
        }
    }
}

/// Cart knowledge after a store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartState {
    /// Every line is known.
    Lines(Cart),
    /// Only the authoritative unit count is known.
    Count(u32),
    /// The change is completed by a page transition.
    Transition(PageTransition),
}

/// Wishlist knowledge after a store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WishlistState {
    /// Every entry is known.
    Entries(Wishlist),
    /// Only the authoritative entry count is known.
    Count(u32),
    /// The store applied the change but could not report a count.
    Unknown,
}

/// Outcome of a wishlist toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistToggle {
    /// What the store reports it did.
    pub action: WishlistAction,
    /// Wishlist knowledge after the toggle.
    pub state: WishlistState,
}

/// Capability interface over guest and authenticated state.
///
/// Implementations never consult the authentication signal; the caller has
/// already chosen the store for the whole operation.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Whether removing a cart line needs explicit user confirmation first.
    fn confirms_cart_removal(&self) -> bool;

    /// Add `item.quantity` units of a product.
    async fn add_to_cart(&self, item: CartLineItem) -> Result<CartState, StoreError>;

    /// Remove a product's cart line.
    async fn remove_from_cart(&self, id: ProductId) -> Result<CartState, StoreError>;

    /// Set a line's quantity; zero or less removes it.
    async fn set_cart_quantity(&self, id: ProductId, quantity: i64)
    -> Result<CartState, StoreError>;

    /// Cheapest available view of the cart (used for count badges).
    async fn cart(&self) -> Result<CartState, StoreError>;

    /// Full cart contents.
    async fn cart_snapshot(&self) -> Result<Cart, StoreError>;

    /// Flip wishlist membership for `entry.id`.
    async fn toggle_wishlist(&self, entry: WishlistEntry) -> Result<WishlistToggle, StoreError>;

    /// Make sure a product is not in the wishlist.
    async fn remove_from_wishlist(&self, id: ProductId) -> Result<WishlistState, StoreError>;

    /// Cheapest available view of the wishlist.
    async fn wishlist(&self) -> Result<WishlistState, StoreError>;

    /// Membership of a product, or `None` when the store cannot answer directly.
    async fn is_wishlisted(&self, id: ProductId) -> Result<Option<bool>, StoreError>;
}

/// The guest store and, when a backend is configured, the authenticated one.
pub struct Stores {
    local: LocalStateStore,
    remote: Option<RemoteStateStore>,
}

impl Stores {
    /// Stores for a deployment without a backend; only guest sessions work.
    #[must_use]
    pub const fn new(local: LocalStateStore) -> Self {
        Self {
            local,
            remote: None,
        }
    }

    /// Serve authenticated sessions from `remote`.
    #[must_use]
    pub fn with_remote(mut self, remote: RemoteStateStore) -> Self {
        self.remote = Some(remote);
        self
    }

    /// The single store that serves `mode`.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` for an authenticated session when no backend is
    /// configured.
    pub fn select(&self, mode: SessionMode) -> Result<&dyn StateStore, StoreError> {
        match mode {
            SessionMode::Guest => Ok(&self.local),
            SessionMode::Authenticated => self
                .remote
                .as_ref()
                .map(|remote| remote as &dyn StateStore)
                .ok_or(StoreError::Unavailable(mode)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_classification() {
        assert!(StoreError::Timeout.is_network());
        assert!(!StoreError::Timeout.is_rejected());

        let rejected = StoreError::Rejected {
            status: 403,
            message: "Forbidden".to_string(),
        };
        assert!(rejected.is_rejected());
        assert!(!rejected.is_network());

        assert!(StoreError::Unsuccessful.is_rejected());
        assert!(StoreError::Parse("not json".to_string()).is_rejected());

        assert!(!StoreError::Unavailable(SessionMode::Authenticated).is_rejected());
    }

    #[test]
    fn test_left_added_classified_by_cause() {
        let err = StoreError::LeftAdded {
            id: ProductId::new(3),
            source: Box::new(StoreError::Timeout),
        };
        assert!(err.is_network());
        assert!(!err.is_rejected());
        assert_eq!(
            err.to_string(),
            "Wishlist entry 3 was left added: Request timed out"
        );
    }

    #[test]
    fn test_guest_only_stores() {
        let stores = Stores::new(LocalStateStore::new(std::sync::Arc::new(MemoryStorage::new())));

        assert!(stores.select(SessionMode::Guest).is_ok());
        assert!(matches!(
            stores.select(SessionMode::Authenticated),
            Err(StoreError::Unavailable(SessionMode::Authenticated))
        ));
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Rejected {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "Server rejected request: 404 - Not Found");
    }
}
