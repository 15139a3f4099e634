//! Wishlist commands.

use keepsake_core::{Price, ProductId, WishlistEntry};
use keepsake_storefront::ReconcileError;
use tracing::info;

use super::Session;

/// Flip membership of a product.
///
/// # Errors
///
/// Returns an error if the backend call failed (treated as session expiry).
pub async fn toggle(
    session: &Session,
    id: ProductId,
    name: String,
    price: Price,
    image: Option<String>,
) -> Result<(), ReconcileError> {
    let entry = WishlistEntry::new(id, name, price, image);
    let action = session.wishlist.toggle(session.mode, entry).await?;
    info!(%id, %action, "Wishlist toggled");
    Ok(())
}

/// Make sure a product is not in the wishlist.
///
/// # Errors
///
/// Returns an error if the backend call failed.
pub async fn remove(session: &Session, id: ProductId) -> Result<(), ReconcileError> {
    session.wishlist.remove(session.mode, id).await
}

/// Report membership of a product.
///
/// # Errors
///
/// Returns an error if the store could not be queried.
pub async fn check(session: &Session, id: ProductId) -> Result<(), ReconcileError> {
    match session.wishlist.is_member(session.mode, id).await? {
        Some(member) => info!(%id, member, "Wishlist membership"),
        None => info!(%id, "Membership is only reported by the server when toggling"),
    }
    Ok(())
}

/// Show the entry count.
///
/// # Errors
///
/// Returns an error if the count query failed.
pub async fn count(session: &Session) -> Result<(), ReconcileError> {
    match session.wishlist.count(session.mode).await? {
        Some(count) => info!(count, "Wishlist count"),
        None => info!("Wishlist count unknown"),
    }
    Ok(())
}
