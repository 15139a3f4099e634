//! Session mode.

use serde::{Deserialize, Serialize};

/// Where cart and wishlist state lives for a page load.
///
/// Derived once per page load from the server-supplied authentication flag
/// and never re-derived mid-operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// No authenticated identity; state lives in client-resident storage.
    #[default]
    Guest,
    /// Verified identity; state is owned by the remote service.
    Authenticated,
}

impl SessionMode {
    /// Returns `true` for [`SessionMode::Authenticated`].
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}
