//! Keepsake Storefront library.
//!
//! Keeps the cart and wishlist consistent for both guest and authenticated
//! visitors. Guest state lives in client-resident storage; authenticated state
//! is owned by the backend API and only mirrored as counts.
//!
//! # Architecture
//!
//! - [`mode`] - Session mode selection and page context (read once per page load)
//! - [`store`] - `StateStore` capability trait with local and remote implementations
//! - [`reconcile`] - Mode-agnostic cart and wishlist reconcilers
//! - [`view`] - View Sync and page host contracts consumed by rendering code
//!
//! # Example
//!
//! ```rust,ignore
//! let page = PageContext::new(AuthSignal::from_attribute(Some("True")), "/cart/");
//! let stores = Arc::new(Stores::new(local).with_remote(remote));
//! let cart = CartReconciler::new(stores, page.clone(), view, host);
//!
//! let outcome = cart.add_item(page.mode(), item).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod mode;
pub mod reconcile;
pub mod store;
pub mod view;

pub use error::ReconcileError;
pub use mode::{AuthSignal, CsrfToken, PageContext, select_mode};
pub use reconcile::{CartOutcome, CartReconciler, WishlistReconciler};
pub use store::{LocalStateStore, RemoteStateStore, StateStore, StoreError, Stores};
pub use view::{BadgeScope, IndicatorUpdate, PageHost, PageTransition, ViewSync};
