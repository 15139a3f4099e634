//! Guest-mode state kept in client-resident storage.
//!
//! Every mutation is a full read-modify-serialize-write of one collection.
//! Storage failures and unparseable blobs are logged and treated as an empty
//! collection so guest flows are never blocked; a single unreadable record
//! only costs that record. Writes are best-effort.

use std::sync::Arc;

use async_trait::async_trait;
use keepsake_core::{
    Cart, CartLineItem, ProductId, QuantityChange, Wishlist, WishlistEntry,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::storage::Storage;
use super::{CartState, StateStore, StoreError, WishlistState, WishlistToggle};

/// Fixed storage keys for the local blob.
pub mod keys {
    /// Key for the serialized cart lines.
    pub const CART: &str = "cart";

    /// Key for the serialized wishlist entries.
    pub const WISHLIST: &str = "wishlist";
}

/// Guest store backed by a [`Storage`] implementation.
#[derive(Clone)]
pub struct LocalStateStore {
    storage: Arc<dyn Storage>,
}

impl LocalStateStore {
    /// Create a store over the given backend.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Load the cart; absent or unreadable data is an empty cart.
    #[must_use]
    pub fn load_cart(&self) -> Cart {
        self.load::<CartLineItem, _>(keys::CART)
    }

    /// Overwrite the stored cart.
    pub fn save_cart(&self, cart: &Cart) {
        self.save(keys::CART, cart);
    }

    /// Load the wishlist; absent or unreadable data is an empty wishlist.
    #[must_use]
    pub fn load_wishlist(&self) -> Wishlist {
        self.load::<WishlistEntry, _>(keys::WISHLIST)
    }

    /// Overwrite the stored wishlist.
    pub fn save_wishlist(&self, wishlist: &Wishlist) {
        self.save(keys::WISHLIST, wishlist);
    }

    /// Decode a stored collection record by record.
    ///
    /// A record that no longer parses is dropped with a warning; the rest of
    /// the collection survives and is written back on the next mutation.
    fn load<R, T>(&self, key: &str) -> T
    where
        R: DeserializeOwned,
        T: From<Vec<R>> + Default,
    {
        let raw = match self.storage.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                warn!(key, error = %e, "Local storage unavailable, using empty collection");
                return T::default();
            }
        };

        // A stored JSON `null` is treated the same as a missing key.
        let values = match serde_json::from_str::<Option<Vec<Value>>>(&raw) {
            Ok(values) => values.unwrap_or_default(),
            Err(e) => {
                warn!(key, error = %e, "Corrupt local storage value, using empty collection");
                return T::default();
            }
        };

        let records = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value::<R>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(key, index, error = %e, "Dropping unreadable local record");
                    None
                }
            })
            .collect::<Vec<_>>();
        T::from(records)
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize local state");
                return;
            }
        };

        if let Err(e) = self.storage.set_item(key, &json) {
            warn!(key, error = %e, "Failed to persist local state");
        }
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    fn confirms_cart_removal(&self) -> bool {
        false
    }

    #[instrument(skip(self, item), fields(product_id = %item.id, quantity = item.quantity))]
    async fn add_to_cart(&self, item: CartLineItem) -> Result<CartState, StoreError> {
        let mut cart = self.load_cart();
        cart.add(item);
        self.save_cart(&cart);
        Ok(CartState::Lines(cart))
    }

    #[instrument(skip(self))]
    async fn remove_from_cart(&self, id: ProductId) -> Result<CartState, StoreError> {
        let mut cart = self.load_cart();
        if !cart.remove(id) {
            debug!("Product not in local cart");
        }
        self.save_cart(&cart);
        Ok(CartState::Lines(cart))
    }

    #[instrument(skip(self))]
    async fn set_cart_quantity(
        &self,
        id: ProductId,
        quantity: i64,
    ) -> Result<CartState, StoreError> {
        if quantity <= 0 {
            return self.remove_from_cart(id).await;
        }

        let mut cart = self.load_cart();
        match cart.set_quantity(id, quantity) {
            QuantityChange::Updated | QuantityChange::Removed => self.save_cart(&cart),
            QuantityChange::NotFound => debug!("Product not in local cart, nothing to update"),
        }
        Ok(CartState::Lines(cart))
    }

    async fn cart(&self) -> Result<CartState, StoreError> {
        Ok(CartState::Lines(self.load_cart()))
    }

    async fn cart_snapshot(&self) -> Result<Cart, StoreError> {
        Ok(self.load_cart())
    }

    #[instrument(skip(self, entry), fields(product_id = %entry.id))]
    async fn toggle_wishlist(&self, entry: WishlistEntry) -> Result<WishlistToggle, StoreError> {
        let mut wishlist = self.load_wishlist();
        let action = wishlist.toggle(entry);
        self.save_wishlist(&wishlist);
        debug!(%action, "Toggled local wishlist entry");
        Ok(WishlistToggle {
            action,
            state: WishlistState::Entries(wishlist),
        })
    }

    #[instrument(skip(self))]
    async fn remove_from_wishlist(&self, id: ProductId) -> Result<WishlistState, StoreError> {
        let mut wishlist = self.load_wishlist();
        wishlist.remove(id);
        self.save_wishlist(&wishlist);
        Ok(WishlistState::Entries(wishlist))
    }

    async fn wishlist(&self) -> Result<WishlistState, StoreError> {
        Ok(WishlistState::Entries(self.load_wishlist()))
    }

    async fn is_wishlisted(&self, id: ProductId) -> Result<Option<bool>, StoreError> {
        Ok(Some(self.load_wishlist().contains(id)))
    }
}
