//! Wishlist reconciler.

use std::sync::Arc;

use keepsake_core::{ProductId, SessionMode, WishlistAction, WishlistEntry};
use tracing::{debug, instrument, warn};

use super::{InFlight, Mutation};
use crate::error::{ReconcileError, Result, add_breadcrumb};
use crate::mode::PageContext;
use crate::store::{StoreError, Stores, WishlistState};
use crate::view::{
    BadgeScope, IndicatorUpdate, PageHost, PageTransition, ViewSync, WISHLIST_RELOAD_DELAY,
    messages,
};

/// Applies wishlist operations to whichever store serves the session.
pub struct WishlistReconciler {
    stores: Arc<Stores>,
    page: PageContext,
    view: Arc<dyn ViewSync>,
    host: Arc<dyn PageHost>,
    in_flight: InFlight,
}

impl WishlistReconciler {
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

    /// Flip membership of `entry.id` and report what the store did.
    ///
    /// # Errors
    ///
    /// Returns `InFlight` if the same toggle is pending, or `ActionFailed` if
    /// no store serves `mode`. Any failure of the store itself is treated as
    /// an expired session: the user is sent to the login page and
    /// `SessionExpired` is returned.
    #[instrument(skip(self, entry), fields(product_id = %entry.id))]
    pub async fn toggle(&self, mode: SessionMode, entry: WishlistEntry) -> Result<WishlistAction> {
        let id = entry.id;
        let _guard = self.in_flight.claim(Mutation::WishlistToggle(id))?;

        let toggled = self
            .stores
            .select(mode)?
            .toggle_wishlist(entry)
            .await
            .map_err(|e| self.expire("toggle", e))?;

        let action = toggled.action;
        let product_id = id.to_string();
        let action_name = action.to_string();
        add_breadcrumb(
            "wishlist",
            "Toggled item",
            Some(&[("product_id", product_id.as_str()), ("action", action_name.as_str())]),
        );
        self.view.show_toast(match action {
            WishlistAction::Added => messages::WISHLIST_ADDED,
            WishlistAction::Removed => messages::WISHLIST_REMOVED,
        });
        self.apply(id, action.is_member(), toggled.state);
        Ok(action)
    }

    /// Make sure a product is not in the wishlist.
    ///
    /// # Errors
    ///
    /// Same as [`Self::toggle`].
    #[instrument(skip(self))]
    pub async fn remove(&self, mode: SessionMode, id: ProductId) -> Result<()> {
        let _guard = self.in_flight.claim(Mutation::WishlistRemove(id))?;

        let state = self
            .stores
            .select(mode)?
            .remove_from_wishlist(id)
            .await
            .map_err(|e| self.expire("remove", e))?;

        self.view.show_toast(messages::WISHLIST_REMOVED);
        self.apply(id, false, state);
        Ok(())
    }

    /// Whether a product is in the wishlist, or `None` when the store can
    /// only learn that by mutating.
    ///
    /// # Errors
    ///
    /// Returns `ActionFailed` if the store could not be queried.
    pub async fn is_member(&self, mode: SessionMode, id: ProductId) -> Result<Option<bool>> {
        Ok(self.stores.select(mode)?.is_wishlisted(id).await?)
    }

    /// Current entry count, pushed to the wishlist badge when known.
    ///
    /// # Errors
    ///
    /// Returns `ActionFailed` if the count query failed; the badge is left
    /// as it was.
    #[instrument(skip(self))]
    pub async fn count(&self, mode: SessionMode) -> Result<Option<u32>> {
        let state = match self.stores.select(mode)?.wishlist().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Wishlist count unavailable, keeping displayed count");
                return Err(ReconcileError::ActionFailed(e));
            }
        };

        let count = match state {
            WishlistState::Entries(wishlist) => Some(wishlist.count()),
            WishlistState::Count(count) => Some(count),
            WishlistState::Unknown => None,
        };
        if let Some(count) = count {
            self.view.set_count_badge(BadgeScope::Wishlist, count);
        }
        Ok(count)
    }

    /// Bring the wishlist badge, membership indicators and, on the wishlist
    /// page, the wishlist list up to date.
    #[instrument(skip(self), fields(mode = ?self.page.mode(), path = self.page.path()))]
    pub async fn sync_on_load(&self) {
        let state = match self.stores.select(self.page.mode()) {
            Ok(store) => store.wishlist().await,
            Err(e) => Err(e),
        };

        match state {
            Ok(WishlistState::Entries(wishlist)) => {
                self.view.set_count_badge(BadgeScope::Wishlist, wishlist.count());
                self.view
                    .refresh_wishlist_indicators(&IndicatorUpdate::Exact(wishlist.ids().collect()));
                if self.page.is_wishlist_view() {
                    self.view.render_wishlist_view(wishlist.entries());
                }
            }
            Ok(WishlistState::Count(count)) => {
                self.view.set_count_badge(BadgeScope::Wishlist, count);
            }
            Ok(WishlistState::Unknown) => debug!("Wishlist state unknown on load"),
            Err(e) => warn!(error = %e, "Wishlist unavailable on load"),
        }
    }

    /// Push a store answer to the view. `member` is the product's membership
    /// after the change.
    fn apply(&self, id: ProductId, member: bool, state: WishlistState) {
        let single = IndicatorUpdate::Single { id, active: member };

        match state {
            WishlistState::Entries(wishlist) => {
                self.view.set_count_badge(BadgeScope::Wishlist, wishlist.count());
                self.view
                    .refresh_wishlist_indicators(&IndicatorUpdate::Exact(wishlist.ids().collect()));
                if self.page.is_wishlist_view() {
                    self.view.render_wishlist_view(wishlist.entries());
                }
            }
            WishlistState::Count(count) => {
                self.view.set_count_badge(BadgeScope::Wishlist, count);
                self.view.refresh_wishlist_indicators(&single);
                self.reload_wishlist_view();
            }
            WishlistState::Unknown => {
                self.view.refresh_wishlist_indicators(&single);
                self.reload_wishlist_view();
            }
        }
    }

    /// Server-rendered wishlist pages only change on reload.
    fn reload_wishlist_view(&self) {
        if self.page.is_wishlist_view() {
            self.host
                .transition(&PageTransition::ReloadAfter(WISHLIST_RELOAD_DELAY));
        }
    }

    fn expire(&self, operation: &str, source: StoreError) -> ReconcileError {
        let redirect = self.page.login_redirect();
        let err = ReconcileError::SessionExpired {
            redirect: redirect.clone(),
            source,
        };
        err.report(operation);
        self.view.alert(messages::SESSION_EXPIRED);
        self.host.transition(&PageTransition::Visit(redirect));
        err
    }
}
