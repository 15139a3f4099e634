//! Mode-agnostic cart and wishlist reconcilers.
//!
//! A reconciler takes the session mode for each call, routes it to the single
//! store serving that mode, and turns the store's answer into view updates.
//! Both reconcilers reject a second invocation of the same mutation for the
//! same product while the first is still unsettled.

mod cart;
mod wishlist;

pub use cart::{CartOutcome, CartReconciler};
pub use wishlist::WishlistReconciler;

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use keepsake_core::ProductId;

use crate::error::{ReconcileError, Result};

/// A state-changing operation on one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    CartAdd(ProductId),
    CartRemove(ProductId),
    CartSetQuantity(ProductId),
    WishlistToggle(ProductId),
    WishlistRemove(ProductId),
}

impl Mutation {
    /// The product the mutation targets.
    #[must_use]
    pub const fn product_id(self) -> ProductId {
        match self {
            Self::CartAdd(id)
            | Self::CartRemove(id)
            | Self::CartSetQuantity(id)
            | Self::WishlistToggle(id)
            | Self::WishlistRemove(id) => id,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::CartAdd(_) => "add-to-cart",
            Self::CartRemove(_) => "remove-from-cart",
            Self::CartSetQuantity(_) => "set-cart-quantity",
            Self::WishlistToggle(_) => "toggle-wishlist",
            Self::WishlistRemove(_) => "remove-from-wishlist",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} for product {}", self.name(), self.product_id())
    }
}

/// Set of mutations that have started but not settled.
#[derive(Debug, Default, Clone)]
pub(crate) struct InFlight {
    pending: Arc<Mutex<HashSet<Mutation>>>,
}

impl InFlight {
    /// Claim `mutation`, failing if it is already pending.
    ///
    /// The claim is released when the returned guard drops.
    pub(crate) fn claim(&self, mutation: Mutation) -> Result<InFlightGuard> {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if !pending.insert(mutation) {
            return Err(ReconcileError::InFlight(mutation));
        }
        Ok(InFlightGuard {
            pending: Arc::clone(&self.pending),
            mutation,
        })
    }
}

/// Releases an in-flight claim on drop.
#[derive(Debug)]
pub(crate) struct InFlightGuard {
    pending: Arc<Mutex<HashSet<Mutation>>>,
    mutation: Mutation,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        pending.remove(&self.mutation);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_display() {
        assert_eq!(
            Mutation::WishlistRemove(ProductId::new(12)).to_string(),
            "remove-from-wishlist for product 12"
        );
    }

    #[test]
    fn test_in_flight_rejects_duplicate_until_released() {
        let in_flight = InFlight::default();
        let add = Mutation::CartAdd(ProductId::new(1));

        let guard = in_flight.claim(add).unwrap();
        assert!(matches!(
            in_flight.claim(add),
            Err(ReconcileError::InFlight(m)) if m == add
        ));

        // Other products and other mutations are independent.
        let _other = in_flight.claim(Mutation::CartAdd(ProductId::new(2))).unwrap();
        let _remove = in_flight.claim(Mutation::CartRemove(ProductId::new(1))).unwrap();

        drop(guard);
        assert!(in_flight.claim(add).is_ok());
    }
}
