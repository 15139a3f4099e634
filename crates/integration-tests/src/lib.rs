//! Integration tests for Keepsake.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p keepsake-integration-tests
//! ```
//!
//! Remote tests start a `wiremock` server per test; nothing external is
//! needed.
//!
//! # Test Categories
//!
//! - `guest_cart` / `guest_wishlist` - Local store behavior through the reconcilers
//! - `remote_cart` / `remote_wishlist` - Backend API contract against a mock server
//!
//! This library holds the shared harness: a view that records every update
//! and a page host with a scripted confirmation answer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use keepsake_core::{CartLineItem, Price, ProductId, SessionMode, WishlistEntry};
use keepsake_storefront::config::RemoteConfig;
use keepsake_storefront::store::{MemoryStorage, Storage};
use keepsake_storefront::view::{
    BadgeScope, IndicatorUpdate, PageHost, PageTransition, ViewSync,
};
use keepsake_storefront::{
    AuthSignal, CartReconciler, LocalStateStore, PageContext, RemoteStateStore, Stores,
    WishlistReconciler,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use url::Url;

/// CSRF token the harness attaches to remote requests.
pub const TEST_CSRF_TOKEN: &str = "Xk2vQ9pL4mR7tW1zB8nC3hF6";

/// Session cookie the harness forwards to the backend.
pub const TEST_COOKIE: &str = "sessionid=k3j4h5g6f7d8s9a0";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One update pushed to the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    CartView {
        items: Vec<CartLineItem>,
        total: Decimal,
    },
    WishlistView(Vec<WishlistEntry>),
    Badge(BadgeScope, u32),
    Toast(String),
    Alert(String),
    Indicators(IndicatorUpdate),
}

/// View that records updates in order.
#[derive(Debug, Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    /// Everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<ViewEvent> {
        lock(&self.events).clone()
    }

    /// The most recent count shown on a badge.
    #[must_use]
    pub fn badge(&self, scope: BadgeScope) -> Option<u32> {
        lock(&self.events).iter().rev().find_map(|event| match event {
            ViewEvent::Badge(s, count) if *s == scope => Some(*count),
            _ => None,
        })
    }

    #[must_use]
    pub fn toasts(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                ViewEvent::Toast(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn alerts(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                ViewEvent::Alert(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// The most recent cart-detail render.
    #[must_use]
    pub fn last_cart_view(&self) -> Option<(Vec<CartLineItem>, Decimal)> {
        lock(&self.events).iter().rev().find_map(|event| match event {
            ViewEvent::CartView { items, total } => Some((items.clone(), *total)),
            _ => None,
        })
    }

    /// The most recent wishlist-detail render.
    #[must_use]
    pub fn last_wishlist_view(&self) -> Option<Vec<WishlistEntry>> {
        lock(&self.events).iter().rev().find_map(|event| match event {
            ViewEvent::WishlistView(entries) => Some(entries.clone()),
            _ => None,
        })
    }

    /// The most recent indicator update.
    #[must_use]
    pub fn last_indicators(&self) -> Option<IndicatorUpdate> {
        lock(&self.events).iter().rev().find_map(|event| match event {
            ViewEvent::Indicators(update) => Some(update.clone()),
            _ => None,
        })
    }

    fn push(&self, event: ViewEvent) {
        lock(&self.events).push(event);
    }
}

impl ViewSync for RecordingView {
    fn render_cart_view(&self, items: &[CartLineItem], total: Decimal) {
        self.push(ViewEvent::CartView {
            items: items.to_vec(),
            total,
        });
    }

    fn render_wishlist_view(&self, entries: &[WishlistEntry]) {
        self.push(ViewEvent::WishlistView(entries.to_vec()));
    }

    fn set_count_badge(&self, scope: BadgeScope, count: u32) {
        self.push(ViewEvent::Badge(scope, count));
    }

    fn show_toast(&self, text: &str) {
        self.push(ViewEvent::Toast(text.to_string()));
    }

    fn alert(&self, text: &str) {
        self.push(ViewEvent::Alert(text.to_string()));
    }

    fn refresh_wishlist_indicators(&self, update: &IndicatorUpdate) {
        self.push(ViewEvent::Indicators(update.clone()));
    }
}

/// Page host that answers every confirmation the same way.
#[derive(Debug)]
pub struct ScriptedHost {
    answer: bool,
    questions: Mutex<Vec<String>>,
    transitions: Mutex<Vec<PageTransition>>,
}

impl ScriptedHost {
    #[must_use]
    pub const fn new(answer: bool) -> Self {
        Self {
            answer,
            questions: Mutex::new(Vec::new()),
            transitions: Mutex::new(Vec::new()),
        }
    }

    /// Confirmation questions asked so far.
    #[must_use]
    pub fn questions(&self) -> Vec<String> {
        lock(&self.questions).clone()
    }

    /// Transitions requested so far.
    #[must_use]
    pub fn transitions(&self) -> Vec<PageTransition> {
        lock(&self.transitions).clone()
    }
}

impl PageHost for ScriptedHost {
    fn confirm(&self, question: &str) -> bool {
        lock(&self.questions).push(question.to_string());
        self.answer
    }

    fn transition(&self, transition: &PageTransition) {
        lock(&self.transitions).push(transition.clone());
    }
}

/// Reconcilers for one simulated page load, with recording collaborators.
pub struct Harness {
    pub mode: SessionMode,
    pub storage: Arc<dyn Storage>,
    pub view: Arc<RecordingView>,
    pub host: Arc<ScriptedHost>,
    pub cart: CartReconciler,
    pub wishlist: WishlistReconciler,
}

/// Builder for [`Harness`].
pub struct HarnessBuilder {
    authenticated: bool,
    path: String,
    confirm: bool,
    remote: Option<RemoteConfig>,
    storage: Arc<dyn Storage>,
}

impl HarnessBuilder {
    /// Guest page at `/` with in-memory storage and no backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            authenticated: false,
            path: "/".to_string(),
            confirm: true,
            remote: None,
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    /// Authenticated page backed by the server at `base_url`.
    #[must_use]
    pub fn authenticated(mut self, base_url: &str) -> Self {
        self.authenticated = true;
        self.remote = Some(test_remote_config(base_url));
        self
    }

    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// How the page host answers confirmations.
    #[must_use]
    pub fn confirm(mut self, answer: bool) -> Self {
        self.confirm = answer;
        self
    }

    #[must_use]
    pub fn remote(mut self, remote: RemoteConfig) -> Self {
        self.remote = Some(remote);
        self
    }

    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = storage;
        self
    }

    /// # Panics
    ///
    /// Panics if the remote client cannot be built.
    #[must_use]
    pub fn build(self) -> Harness {
        let mut stores = Stores::new(LocalStateStore::new(Arc::clone(&self.storage)));
        if let Some(remote) = &self.remote {
            let remote =
                RemoteStateStore::new(remote).unwrap_or_else(|e| panic!("remote store: {e}"));
            stores = stores.with_remote(remote);
        }
        let stores = Arc::new(stores);

        let page = PageContext::new(AuthSignal::new(self.authenticated), self.path);
        let view = Arc::new(RecordingView::default());
        let host = Arc::new(ScriptedHost::new(self.confirm));

        Harness {
            mode: page.mode(),
            storage: self.storage,
            cart: CartReconciler::new(
                Arc::clone(&stores),
                page.clone(),
                view.clone(),
                host.clone(),
            ),
            wishlist: WishlistReconciler::new(stores, page, view.clone(), host.clone()),
            view,
            host,
        }
    }
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Remote configuration with the test token and cookie.
///
/// # Panics
///
/// Panics if `base_url` is not a valid URL.
#[must_use]
pub fn test_remote_config(base_url: &str) -> RemoteConfig {
    let mut config = RemoteConfig::new(
        Url::parse(base_url).unwrap_or_else(|e| panic!("invalid base url {base_url}: {e}")),
    );
    config.csrf_token = Some(SecretString::from(TEST_CSRF_TOKEN));
    config.cookie = Some(SecretString::from(TEST_COOKIE));
    config
}

/// Parse a price literal.
///
/// # Panics
///
/// Panics on an invalid price.
#[must_use]
pub fn price(value: &str) -> Price {
    Price::parse(value).unwrap_or_else(|e| panic!("invalid price {value}: {e}"))
}

/// A cart line for `id` with a generated name.
#[must_use]
pub fn line(id: i32, unit_price: &str, quantity: u32) -> CartLineItem {
    CartLineItem::new(
        ProductId::new(id),
        format!("Product {id}"),
        price(unit_price),
        None,
        quantity,
    )
}

/// A wishlist entry for `id` with a generated name.
#[must_use]
pub fn entry(id: i32, unit_price: &str) -> WishlistEntry {
    WishlistEntry::new(ProductId::new(id), format!("Product {id}"), price(unit_price), None)
}
