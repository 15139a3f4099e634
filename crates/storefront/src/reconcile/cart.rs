//! Cart reconciler.

use std::sync::Arc;

use keepsake_core::{CartLineItem, ProductId, SessionMode};
use tracing::{debug, instrument, warn};

use super::{InFlight, Mutation};
use crate::error::{ReconcileError, Result, add_breadcrumb};
use crate::mode::PageContext;
use crate::store::{CartState, StateStore, StoreError, Stores};
use crate::view::{BadgeScope, PageHost, PageTransition, ViewSync, messages};

/// What a cart mutation led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOutcome {
    /// Applied; the cart badge now shows `count`.
    Updated { count: u32 },
    /// The change completes through a page transition.
    Transitioning(PageTransition),
    /// The user declined the removal confirmation. Nothing changed.
    Declined,
}

/// Applies cart operations to whichever store serves the session.
pub struct CartReconciler {
    stores: Arc<Stores>,
    page: PageContext,
    view: Arc<dyn ViewSync>,
    host: Arc<dyn PageHost>,
    in_flight: InFlight,
}

impl CartReconciler {
    #[must_use]
    pub fn new(
        stores: Arc<Stores>,
        page: PageContext,
        view: Arc<dyn ViewSync>,
        host: Arc<dyn PageHost>,
    ) -> Self {
        Self {
            stores,
            page,
            view,
            host,
            in_flight: InFlight::default(),
        }
    }

    /// Add `item.quantity` units of a product.
    ///
    /// # Errors
    ///
    /// Returns `ZeroQuantity` for an item with no units, `InFlight` if the
    /// same add is still pending, or `ActionFailed` if the backend rejected
    /// or never answered. The user has already been told in the failure case.
    #[instrument(skip(self, item), fields(product_id = %item.id, quantity = item.quantity))]
    pub async fn add_item(&self, mode: SessionMode, item: CartLineItem) -> Result<CartOutcome> {
        let id = item.id;
        if item.quantity == 0 {
            return Err(ReconcileError::ZeroQuantity(id));
        }
        let _guard = self.in_flight.claim(Mutation::CartAdd(id))?;
        let store = self.stores.select(mode).map_err(|e| self.fail("add_item", e))?;

        let state = store
            .add_to_cart(item)
            .await
            .map_err(|e| self.fail("add_item", e))?;

        let product_id = id.to_string();
        add_breadcrumb("cart", "Added item", Some(&[("product_id", product_id.as_str())]));
        self.view.show_toast(messages::CART_ADDED);
        Ok(self.apply(store, state).await)
    }

    /// Remove a product's line.
    ///
    /// Authenticated removal asks for confirmation first and then hands over
    /// to the server-side removal route.
    ///
    /// # Errors
    ///
    /// Returns `InFlight` or `ActionFailed`.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, mode: SessionMode, id: ProductId) -> Result<CartOutcome> {
        let _guard = self.in_flight.claim(Mutation::CartRemove(id))?;
        let store = self
            .stores
            .select(mode)
            .map_err(|e| self.fail("remove_item", e))?;

        if store.confirms_cart_removal() && !self.host.confirm(messages::CONFIRM_REMOVE) {
            debug!("Removal declined");
            return Ok(CartOutcome::Declined);
        }

        let state = store
            .remove_from_cart(id)
            .await
            .map_err(|e| self.fail("remove_item", e))?;
        Ok(self.apply(store, state).await)
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `InFlight` or `ActionFailed`.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        mode: SessionMode,
        id: ProductId,
        quantity: i64,
    ) -> Result<CartOutcome> {
        let _guard = self.in_flight.claim(Mutation::CartSetQuantity(id))?;
        let store = self
            .stores
            .select(mode)
            .map_err(|e| self.fail("set_quantity", e))?;

        let state = store
            .set_cart_quantity(id, quantity)
            .await
            .map_err(|e| self.fail("set_quantity", e))?;
        Ok(self.apply(store, state).await)
    }

    /// Current unit count, pushed to the cart badge.
    ///
    /// # Errors
    ///
    /// Returns `ActionFailed` if the count query failed; the badge is left
    /// as it was.
    #[instrument(skip(self))]
    pub async fn get_count(&self, mode: SessionMode) -> Result<u32> {
        let count = match self.count(mode).await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Cart count unavailable, keeping displayed count");
                return Err(ReconcileError::ActionFailed(e));
            }
        };

        self.view.set_count_badge(BadgeScope::Cart, count);
        Ok(count)
    }

    /// Bring the cart badge and, on the cart page, the cart list up to date.
    #[instrument(skip(self), fields(mode = ?self.page.mode(), path = self.page.path()))]
    pub async fn sync_on_load(&self) {
        let mode = self.page.mode();
        // Failures are already logged and leave the badge alone.
        let _ = self.get_count(mode).await;

        if self.page.is_cart_view() {
            match self.stores.select(mode) {
                Ok(store) => {
                    self.render_snapshot(store).await;
                }
                Err(e) => warn!(error = %e, "Cart view not rendered"),
            }
        }
    }

    async fn count(&self, mode: SessionMode) -> std::result::Result<u32, StoreError> {
        let store = self.stores.select(mode)?;
        match store.cart().await? {
            CartState::Lines(cart) => Ok(cart.item_count()),
            CartState::Count(count) => Ok(count),
            CartState::Transition(_) => Ok(store.cart_snapshot().await?.item_count()),
        }
    }

    /// Push a store answer to the view.
    async fn apply(&self, store: &dyn StateStore, state: CartState) -> CartOutcome {
        match state {
            CartState::Lines(cart) => {
                let count = cart.item_count();
                self.view.set_count_badge(BadgeScope::Cart, count);
                if self.page.is_cart_view() {
                    self.view.render_cart_view(cart.lines(), cart.total());
                }
                CartOutcome::Updated { count }
            }
            CartState::Count(count) => {
                self.view.set_count_badge(BadgeScope::Cart, count);
                if self.page.is_cart_view() && !self.render_snapshot(store).await {
                    return self.transition(PageTransition::Reload);
                }
                CartOutcome::Updated { count }
            }
            CartState::Transition(transition) => self.transition(transition),
        }
    }

    /// Fetch the full cart and render it. Returns `false` if the fetch failed.
    async fn render_snapshot(&self, store: &dyn StateStore) -> bool {
        match store.cart_snapshot().await {
            Ok(cart) => {
                self.view.render_cart_view(cart.lines(), cart.total());
                true
            }
            Err(e) => {
                warn!(error = %e, "Cart snapshot unavailable");
                false
            }
        }
    }

    fn transition(&self, transition: PageTransition) -> CartOutcome {
        self.host.transition(&transition);
        CartOutcome::Transitioning(transition)
    }

    fn fail(&self, operation: &str, source: StoreError) -> ReconcileError {
        let err = ReconcileError::ActionFailed(source);
        err.report(operation);
        self.view.alert(messages::LOGIN_AGAIN);
        err
    }
}
