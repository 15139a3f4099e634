//! Wishlist entries and the membership set.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::cart::empty_as_none;
use super::id::ProductId;
use super::price::Price;

/// One product reference in the wishlist (binary membership, no quantity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub id: ProductId,
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price: Price,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,
}

impl WishlistEntry {
    /// Create a wishlist entry.
    #[must_use]
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        unit_price: Price,
        image: Option<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            unit_price,
            image: image.filter(|url| !url.is_empty()),
        }
    }
}

/// What a wishlist toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WishlistAction {
    Added,
    Removed,
}

impl WishlistAction {
    /// Whether the product is a member after this action.
    #[must_use]
    pub const fn is_member(self) -> bool {
        matches!(self, Self::Added)
    }
}

impl fmt::Display for WishlistAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => f.write_str("added"),
            Self::Removed => f.write_str("removed"),
        }
    }
}

/// An ordered set of wishlist entries, at most one per product.
///
/// Serializes as a plain JSON array; duplicate products are dropped on
/// deserialization (first occurrence wins).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<WishlistEntry>", into = "Vec<WishlistEntry>")]
pub struct Wishlist {
    entries: Vec<WishlistEntry>,
}

impl Wishlist {
    /// Create an empty wishlist.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[WishlistEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the wishlist has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries as a badge count.
    #[must_use]
    pub fn count(&self) -> u32 {
        u32::try_from(self.entries.len()).unwrap_or(u32::MAX)
    }

    /// Linear membership test.
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Product IDs of all members, in order.
    pub fn ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.entries.iter().map(|entry| entry.id)
    }

    /// Flip membership of `entry.id`.
    ///
    /// Removes the existing entry if present, otherwise appends `entry`.
    pub fn toggle(&mut self, entry: WishlistEntry) -> WishlistAction {
        match self.entries.iter().position(|e| e.id == entry.id) {
            Some(index) => {
                self.entries.remove(index);
                WishlistAction::Removed
            }
            None => {
                self.entries.push(entry);
                WishlistAction::Added
            }
        }
    }

    /// Remove the entry for a product. Returns `true` if one was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }
}

impl From<Vec<WishlistEntry>> for Wishlist {
    fn from(entries: Vec<WishlistEntry>) -> Self {
        let mut wishlist = Self::new();
        for entry in entries {
            if !wishlist.contains(entry.id) {
                wishlist.entries.push(entry);
            }
        }
        wishlist
    }
}

impl From<Wishlist> for Vec<WishlistEntry> {
    fn from(wishlist: Wishlist) -> Self {
        wishlist.entries
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn necklace() -> WishlistEntry {
        WishlistEntry::new(
            ProductId::new(3),
            "Pearl Necklace",
            Price::parse("4200").unwrap(),
            Some("/media/pearl.jpg".to_string()),
        )
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut wishlist = Wishlist::new();

        assert_eq!(wishlist.toggle(necklace()), WishlistAction::Added);
        assert!(wishlist.contains(ProductId::new(3)));

        assert_eq!(wishlist.toggle(necklace()), WishlistAction::Removed);
        assert!(!wishlist.contains(ProductId::new(3)));
    }

    #[test]
    fn test_toggle_twice_restores_prior_state() {
        let mut wishlist = Wishlist::new();
        wishlist.toggle(WishlistEntry::new(
            ProductId::new(1),
            "Bangle",
            Price::parse("80").unwrap(),
            None,
        ));
        wishlist.toggle(necklace());
        let before = wishlist.clone();

        // Removing then re-adding moves the entry to the end, so toggle an
        // absent product to check the inverse property on contents.
        let earrings = WishlistEntry::new(
            ProductId::new(5),
            "Earrings",
            Price::parse("99.90").unwrap(),
            None,
        );
        wishlist.toggle(earrings.clone());
        wishlist.toggle(earrings);

        assert_eq!(wishlist, before);
    }

    #[test]
    fn test_remove() {
        let mut wishlist = Wishlist::new();
        wishlist.toggle(necklace());
        assert!(wishlist.remove(ProductId::new(3)));
        assert!(!wishlist.remove(ProductId::new(3)));
        assert!(wishlist.is_empty());
    }

    #[test]
    fn test_count_and_ids() {
        let mut wishlist = Wishlist::new();
        wishlist.toggle(necklace());
        assert_eq!(wishlist.count(), 1);
        assert_eq!(wishlist.ids().collect::<Vec<_>>(), vec![ProductId::new(3)]);
    }

    #[test]
    fn test_action_serde() {
        assert_eq!(
            serde_json::to_string(&WishlistAction::Added).unwrap(),
            "\"added\""
        );
        let parsed: WishlistAction = serde_json::from_str("\"removed\"").unwrap();
        assert_eq!(parsed, WishlistAction::Removed);
        assert!(!parsed.is_member());
    }

    #[test]
    fn test_serde_roundtrip_preserves_order() {
        let mut wishlist = Wishlist::new();
        wishlist.toggle(necklace());
        wishlist.toggle(WishlistEntry::new(
            ProductId::new(1),
            "Bangle",
            Price::parse("80").unwrap(),
            None,
        ));

        let json = serde_json::to_string(&wishlist).unwrap();
        let parsed: Wishlist = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.entries(), wishlist.entries());
    }

    #[test]
    fn test_deserialize_drops_duplicates() {
        let json = r#"[
            {"id": 3, "name": "A", "price": 1},
            {"id": 3, "name": "B", "price": 2}
        ]"#;
        let wishlist: Wishlist = serde_json::from_str(json).unwrap();
        assert_eq!(wishlist.len(), 1);
        assert_eq!(wishlist.entries()[0].name, "A");
    }
}
