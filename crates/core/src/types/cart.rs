//! Cart line items and the ordered cart collection.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::id::ProductId;
use super::price::Price;

/// One product entry in the cart with a quantity.
///
/// The serialized field names (`id`, `name`, `price`, `image`, `quantity`)
/// are the persisted local layout and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Product the line refers to.
    pub id: ProductId,
    /// Display name captured when the line was added.
    pub name: String,
    /// Unit price captured when the line was added.
    #[serde(rename = "price")]
    pub unit_price: Price,
    /// Product image URL, if any.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,
    /// Number of units, always at least 1 inside a [`Cart`].
    pub quantity: u32,
}

impl CartLineItem {
    /// Create a line item.
    #[must_use]
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        unit_price: Price,
        image: Option<String>,
        quantity: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            unit_price,
            image: image.filter(|url| !url.is_empty()),
            quantity,
        }
    }

    /// Line total (`unit_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.amount() * Decimal::from(self.quantity)
    }
}

/// Treat a stored empty image string as "no image".
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Result of [`Cart::set_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line now has the requested quantity.
    Updated,
    /// The requested quantity was not positive, so the line was removed.
    Removed,
    /// No line with that product exists.
    NotFound,
}

/// An ordered cart holding at most one line per product.
///
/// Every line has a positive quantity. Serializes as a plain JSON array of
/// [`CartLineItem`]s; deserializing merges duplicate products and drops
/// zero-quantity lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLineItem>", into = "Vec<CartLineItem>")]
pub struct Cart {
    lines: Vec<CartLineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLineItem] {
        &self.lines
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartLineItem> {
        self.lines.iter().find(|line| line.id == id)
    }

    /// Add units of a product.
    ///
    /// An existing line has its quantity increased by `item.quantity`; the
    /// stored name, price and image are kept. Otherwise the item is appended.
    /// A zero-quantity item is ignored.
    pub fn add(&mut self, item: CartLineItem) {
        if item.quantity == 0 {
            return;
        }

        match self.lines.iter_mut().find(|line| line.id == item.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => self.lines.push(item),
        }
    }

    /// Remove the line for a product. Returns `true` if a line was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != id);
        self.lines.len() != before
    }

    /// Set the quantity of an existing line.
    ///
    /// A quantity of zero or less removes the line.
    pub fn set_quantity(&mut self, id: ProductId, quantity: i64) -> QuantityChange {
        if quantity <= 0 {
            return if self.remove(id) {
                QuantityChange::Removed
            } else {
                QuantityChange::NotFound
            };
        }

        match self.lines.iter_mut().find(|line| line.id == id) {
            Some(line) => {
                line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                QuantityChange::Updated
            }
            None => QuantityChange::NotFound,
        }
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |sum, line| sum.saturating_add(line.quantity))
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLineItem::line_total).sum()
    }
}

impl From<Vec<CartLineItem>> for Cart {
    fn from(lines: Vec<CartLineItem>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            cart.add(line);
        }
        cart
    }
}

impl From<Cart> for Vec<CartLineItem> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}
