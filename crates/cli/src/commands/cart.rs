//! Cart commands.

use keepsake_core::{CartLineItem, Price, ProductId};
use keepsake_storefront::{CartOutcome, ReconcileError};
use tracing::info;

use super::Session;

/// Add `quantity` units of a product.
///
/// # Errors
///
/// Returns an error if the backend rejected the add.
pub async fn add(
    session: &Session,
    id: ProductId,
    name: String,
    price: Price,
    image: Option<String>,
    quantity: u32,
) -> Result<(), ReconcileError> {
    let item = CartLineItem::new(id, name, price, image, quantity);
    let outcome = session.cart.add_item(session.mode, item).await?;
    report(&outcome);
    Ok(())
}

/// Remove a product's line.
///
/// # Errors
///
/// Returns an error if the backend rejected the removal.
pub async fn remove(session: &Session, id: ProductId) -> Result<(), ReconcileError> {
    let outcome = session.cart.remove_item(session.mode, id).await?;
    report(&outcome);
    Ok(())
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns an error if the backend rejected the update.
pub async fn set(session: &Session, id: ProductId, quantity: i64) -> Result<(), ReconcileError> {
    let outcome = session.cart.set_quantity(session.mode, id, quantity).await?;
    report(&outcome);
    Ok(())
}

/// Show the unit count.
///
/// # Errors
///
/// Returns an error if the count query failed.
pub async fn count(session: &Session) -> Result<(), ReconcileError> {
    let count = session.cart.get_count(session.mode).await?;
    info!(count, "Cart count");
    Ok(())
}

fn report(outcome: &CartOutcome) {
    match outcome {
        CartOutcome::Updated { count } => info!(count, "Cart updated"),
        CartOutcome::Transitioning(transition) => {
            info!(?transition, "Cart change completes on the server");
        }
        CartOutcome::Declined => info!("Cart left unchanged"),
    }
}
