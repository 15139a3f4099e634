//! Authenticated-mode state delegated to the backend API.
//!
//! The backend owns the cart and wishlist. This store only issues requests
//! and reports what the server says; it keeps no copy of server line items.
//! Every request carries the configured timeout, so each call settles with
//! exactly one outcome.

use async_trait::async_trait;
use keepsake_core::{Cart, CartLineItem, Price, ProductId, WishlistAction, WishlistEntry};
use reqwest::header::{ACCEPT, COOKIE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};
use url::Url;

use super::{CartState, StateStore, StoreError, WishlistState, WishlistToggle};
use crate::config::RemoteConfig;
use crate::mode::CsrfToken;
use crate::view::PageTransition;

/// Header carrying the anti-forgery token.
const CSRF_HEADER: &str = "X-CSRFToken";

/// Backend API paths.
mod paths {
    pub const ADD_TO_CART: &str = "/api/add-to-cart/";
    pub const CART_COUNT: &str = "/api/cart-count/";
    pub const CART_ITEMS: &str = "/api/cart-items/";
    pub const TOGGLE_WISHLIST: &str = "/api/add-to-wishlist/";
    pub const WISHLIST_COUNT: &str = "/api/wishlist-count/";
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct AddToCartRequest {
    product_id: ProductId,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct AddToCartResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    cart_count: u32,
}

#[derive(Debug, Deserialize)]
struct CartCountResponse {
    #[serde(default)]
    cart_count: u32,
}

#[derive(Debug, Serialize)]
struct ToggleWishlistRequest {
    product_id: ProductId,
}

#[derive(Debug, Deserialize)]
struct ToggleWishlistResponse {
    #[serde(default)]
    success: bool,
    action: Option<WishlistAction>,
    wishlist_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WishlistCountResponse {
    #[serde(default)]
    wishlist_count: u32,
}

/// Body of `GET /api/cart-items/`.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemsResponse {
    pub items: Vec<ServerCartItem>,
}

/// One server-side cart line.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerCartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl From<ServerCartItem> for CartLineItem {
    fn from(item: ServerCartItem) -> Self {
        Self::new(item.id, item.name, item.price, item.image, item.quantity)
    }
}

// =============================================================================
// RemoteStateStore
// =============================================================================

/// Authenticated store talking to the backend cart/wishlist API.
#[derive(Clone)]
pub struct RemoteStateStore {
    client: reqwest::Client,
    base_url: Url,
    csrf_token: Option<CsrfToken>,
}

impl std::fmt::Debug for RemoteStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStateStore")
            .field("base_url", &self.base_url.as_str())
            .field("csrf_token", &self.csrf_token)
            .finish_non_exhaustive()
    }
}

impl RemoteStateStore {
    /// Create a store for the configured backend.
    ///
    /// The anti-forgery token comes from the configuration, falling back to
    /// the `csrftoken` cookie inside the configured `Cookie` header.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &RemoteConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let cookie = config.cookie.as_ref().map(|c| c.expose_secret());
        if let Some(cookie) = cookie {
            let mut value = HeaderValue::from_str(cookie)
                .map_err(|e| StoreError::Parse(format!("Invalid cookie header: {e}")))?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let csrf_token = CsrfToken::resolve(
            config.csrf_token.as_ref().map(|t| t.expose_secret()),
            cookie,
        );

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            csrf_token,
        })
    }

    /// Use the token read from the page instead of the configured one.
    #[must_use]
    pub fn with_csrf_token(mut self, token: CsrfToken) -> Self {
        self.csrf_token = Some(token);
        self
    }

    /// Server route that removes a cart line (reached by navigation).
    #[must_use]
    pub fn cart_removal_path(id: ProductId) -> String {
        format!("/cart/remove/{id}/")
    }

    /// `POST /api/add-to-cart/`; returns the server's cart count.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, timeout, non-success status,
    /// `success: false` or an unparseable body.
    #[instrument(skip(self))]
    pub async fn post_add_to_cart(&self, id: ProductId, quantity: u32) -> Result<u32, StoreError> {
        let response: AddToCartResponse = self
            .post_json(
                paths::ADD_TO_CART,
                &AddToCartRequest {
                    product_id: id,
                    quantity,
                },
            )
            .await?;

        if response.success == Some(false) {
            return Err(StoreError::Unsuccessful);
        }
        debug!(cart_count = response.cart_count, "Server cart updated");
        Ok(response.cart_count)
    }

    /// `GET /api/cart-count/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is invalid.
    #[instrument(skip(self))]
    pub async fn fetch_cart_count(&self) -> Result<u32, StoreError> {
        let response: CartCountResponse = self.get_json(paths::CART_COUNT).await?;
        Ok(response.cart_count)
    }

    /// `GET /api/cart-items/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is invalid.
    #[instrument(skip(self))]
    pub async fn fetch_cart_items(&self) -> Result<Cart, StoreError> {
        let response: CartItemsResponse = self.get_json(paths::CART_ITEMS).await?;
        Ok(response
            .items
            .into_iter()
            .map(CartLineItem::from)
            .collect::<Vec<_>>()
            .into())
    }

    /// `POST /api/add-to-wishlist/`; returns the action the server performed
    /// and the count it reported, if any.
    ///
    /// # Errors
    ///
    /// Returns an error on any failure, including `success: false` or a
    /// missing action.
    #[instrument(skip(self))]
    pub async fn post_toggle_wishlist(
        &self,
        id: ProductId,
    ) -> Result<(WishlistAction, Option<u32>), StoreError> {
        let response: ToggleWishlistResponse = self
            .post_json(paths::TOGGLE_WISHLIST, &ToggleWishlistRequest { product_id: id })
            .await?;

        if !response.success {
            return Err(StoreError::Unsuccessful);
        }
        let action = response
            .action
            .ok_or_else(|| StoreError::Parse("toggle response has no action".to_string()))?;

        debug!(%action, "Server wishlist toggled");
        Ok((action, response.wishlist_count))
    }

    /// `GET /api/wishlist-count/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is invalid.
    #[instrument(skip(self))]
    pub async fn fetch_wishlist_count(&self) -> Result<u32, StoreError> {
        let response: WishlistCountResponse = self.get_json(paths::WISHLIST_COUNT).await?;
        Ok(response.wishlist_count)
    }

    /// Toggle and turn the reported count into wishlist state, querying the
    /// count separately when the toggle response omits it.
    async fn toggle(&self, id: ProductId) -> Result<WishlistToggle, StoreError> {
        let (action, reported) = self.post_toggle_wishlist(id).await?;

        let state = match reported {
            Some(count) => WishlistState::Count(count),
            None => match self.fetch_wishlist_count().await {
                Ok(count) => WishlistState::Count(count),
                Err(e) => {
                    warn!(error = %e, "Wishlist toggled but count query failed");
                    WishlistState::Unknown
                }
            },
        };

        Ok(WishlistToggle { action, state })
    }

    // =========================================================================
    // HTTP Helpers
    // =========================================================================

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, StoreError> {
        let url = self.base_url.join(path)?;
        let response = self.client.get(url).send().await?;
        Self::read_json(response).await
    }

    async fn post_json<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, StoreError> {
        let url = self.base_url.join(path)?;
        let mut request = self.client.post(url).json(body);
        match &self.csrf_token {
            Some(token) => request = request.header(CSRF_HEADER, token.expose()),
            None => warn!(path, "No anti-forgery token available for mutating request"),
        }

        let response = request.send().await?;
        Self::read_json(response).await
    }

    async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, StoreError> {
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            StoreError::Parse(e.to_string())
        })
    }
}

#[async_trait]
impl StateStore for RemoteStateStore {
    fn confirms_cart_removal(&self) -> bool {
        true
    }

    async fn add_to_cart(&self, item: CartLineItem) -> Result<CartState, StoreError> {
        let count = self.post_add_to_cart(item.id, item.quantity).await?;
        Ok(CartState::Count(count))
    }

    async fn remove_from_cart(&self, id: ProductId) -> Result<CartState, StoreError> {
        Ok(CartState::Transition(PageTransition::Visit(
            Self::cart_removal_path(id),
        )))
    }

    async fn set_cart_quantity(
        &self,
        id: ProductId,
        quantity: i64,
    ) -> Result<CartState, StoreError> {
        debug!(%id, quantity, "Quantity edits are applied by the server on refresh");
        Ok(CartState::Transition(PageTransition::Reload))
    }

    async fn cart(&self) -> Result<CartState, StoreError> {
        Ok(CartState::Count(self.fetch_cart_count().await?))
    }

    async fn cart_snapshot(&self) -> Result<Cart, StoreError> {
        self.fetch_cart_items().await
    }

    async fn toggle_wishlist(&self, entry: WishlistEntry) -> Result<WishlistToggle, StoreError> {
        self.toggle(entry.id).await
    }

    #[instrument(skip(self))]
    async fn remove_from_wishlist(&self, id: ProductId) -> Result<WishlistState, StoreError> {
        let toggled = self.toggle(id).await?;
        if toggled.action == WishlistAction::Removed {
            return Ok(toggled.state);
        }

        // The product was not a member; undo the accidental add.
        warn!("Removal toggled an absent wishlist entry in, toggling it back out");
        let undone = match self.toggle(id).await {
            Ok(undone) => undone,
            Err(e) => {
                error!(%id, error = %e, "Undo failed, wishlist entry left added on the server");
                return Err(StoreError::LeftAdded {
                    id,
                    source: Box::new(e),
                });
            }
        };
        if undone.action == WishlistAction::Added {
            return Err(StoreError::Parse(
                "server added the entry on both toggles".to_string(),
            ));
        }
        Ok(undone.state)
    }

    async fn wishlist(&self) -> Result<WishlistState, StoreError> {
        Ok(WishlistState::Count(self.fetch_wishlist_count().await?))
    }

    async fn is_wishlisted(&self, _id: ProductId) -> Result<Option<bool>, StoreError> {
        Ok(None)
    }
}
