//! Reconciler error type with Sentry integration.
//!
//! Remote failures are caught at the reconciler boundary, turned into a
//! user-visible message, and returned as a `ReconcileError` so the caller can
//! decide on retries. Storage failures never reach this layer; the local store
//! logs them and falls back to empty collections.

use keepsake_core::ProductId;
use thiserror::Error;

use crate::reconcile::Mutation;
use crate::store::StoreError;

/// Error returned by cart and wishlist reconcilers.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The store rejected or never answered; the operation was not applied.
    #[error("Action failed: {0}")]
    ActionFailed(#[from] StoreError),

    /// An authenticated wishlist call failed; the session is treated as expired.
    #[error("Session expired, redirecting to {redirect}")]
    SessionExpired {
        /// Login URL carrying the return path.
        redirect: String,
        #[source]
        source: StoreError,
    },

    /// The same mutation for the same product has not settled yet.
    #[error("{0} is already in progress")]
    InFlight(Mutation),

    /// An add asked for zero units. Nothing was sent or stored.
    #[error("Nothing to add for product {0}: quantity must be at least 1")]
    ZeroQuantity(ProductId),
}

impl ReconcileError {
    /// The underlying store failure, if any.
    #[must_use]
    pub const fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::ActionFailed(source) | Self::SessionExpired { source, .. } => Some(source),
            Self::InFlight(_) | Self::ZeroQuantity(_) => None,
        }
    }

    /// Report a failure that was surfaced to the user.
    ///
    /// Logs at error level (forwarded to Sentry by the tracing layer when one is
    /// installed) and leaves a breadcrumb naming the operation.
    pub(crate) fn report(&self, operation: &str) {
        let message = self.to_string();
        tracing::error!(error = %message, operation, "Reconcile failed");
        add_breadcrumb("reconcile", operation, Some(&[("error", message.as_str())]));
    }
}

/// Result type alias for `ReconcileError`.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "7")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
