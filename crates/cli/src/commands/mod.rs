//! CLI commands.

pub mod cart;
pub mod wishlist;

use std::sync::Arc;

use keepsake_core::SessionMode;
use keepsake_storefront::config::StorefrontConfig;
use keepsake_storefront::store::FileStorage;
use keepsake_storefront::{
    AuthSignal, CartReconciler, CsrfToken, LocalStateStore, PageContext, RemoteStateStore,
    StoreError, Stores, WishlistReconciler,
};

use crate::terminal::{TerminalHost, TerminalView};

/// Reconcilers wired up for one invocation (one "page load").
pub struct Session {
    pub mode: SessionMode,
    pub cart: CartReconciler,
    pub wishlist: WishlistReconciler,
}

impl Session {
    /// Build the stores and reconcilers for a page at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the page is authenticated but no backend is
    /// configured, or if the remote client cannot be built.
    pub fn open(
        config: &StorefrontConfig,
        authenticated: bool,
        path: &str,
        csrf_token: Option<&str>,
        assume_yes: bool,
    ) -> Result<Self, StoreError> {
        let page = PageContext::new(AuthSignal::new(authenticated), path)
            .with_login_path(config.login_path.clone());
        let mode = page.mode();

        let mut stores = Stores::new(LocalStateStore::new(Arc::new(FileStorage::new(
            &config.storage_dir,
        ))));
        match &config.remote {
            Some(remote_config) => {
                let mut remote = RemoteStateStore::new(remote_config)?;
                if let Some(token) = CsrfToken::resolve(csrf_token, None) {
                    remote = remote.with_csrf_token(token);
                }
                stores = stores.with_remote(remote);
            }
            None if mode.is_authenticated() => return Err(StoreError::Unavailable(mode)),
            None => tracing::debug!("No backend configured, serving guest state only"),
        }
        let stores = Arc::new(stores);

        let view = Arc::new(TerminalView);
        let host = Arc::new(TerminalHost::new(assume_yes));

        tracing::debug!(?mode, path, "Session opened");

        Ok(Self {
            mode,
            cart: CartReconciler::new(Arc::clone(&stores), page.clone(), view.clone(), host.clone()),
            wishlist: WishlistReconciler::new(stores, page, view, host),
        })
    }
}

/// Refresh badges and detail views as a page load does.
pub async fn sync(session: &Session) {
    session.cart.sync_on_load().await;
    session.wishlist.sync_on_load().await;
}
