//! Terminal rendition of the page: view updates become log lines.

use std::io::{BufRead, Write};

use keepsake_core::{CartLineItem, WishlistEntry};
use keepsake_storefront::view::{BadgeScope, IndicatorUpdate, PageHost, PageTransition, ViewSync};
use rust_decimal::Decimal;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::block_in_place;
use tracing::{info, warn};

/// Logs every view update.
#[derive(Debug, Default)]
pub struct TerminalView;

impl ViewSync for TerminalView {
    fn render_cart_view(&self, items: &[CartLineItem], total: Decimal) {
        if items.is_empty() {
            info!("Cart is empty");
        }
        for item in items {
            info!(
                id = %item.id,
                name = %item.name,
                price = %item.unit_price,
                quantity = item.quantity,
                line_total = %item.line_total(),
                "Cart line"
            );
        }
        info!(total = %total.round_dp(2), "Cart total");
    }

    fn render_wishlist_view(&self, entries: &[WishlistEntry]) {
        if entries.is_empty() {
            info!("Wishlist is empty");
        }
        for entry in entries {
            info!(id = %entry.id, name = %entry.name, price = %entry.unit_price, "Wishlist entry");
        }
    }

    fn set_count_badge(&self, scope: BadgeScope, count: u32) {
        info!(badge = ?scope, count, "Badge updated");
    }

    fn show_toast(&self, text: &str) {
        info!("{text}");
    }

    fn alert(&self, text: &str) {
        warn!("{text}");
    }

    fn refresh_wishlist_indicators(&self, update: &IndicatorUpdate) {
        match update {
            IndicatorUpdate::Exact(ids) => {
                let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
                info!(members = %ids.join(","), "Wishlist indicators");
            }
            IndicatorUpdate::Single { id, active } => {
                info!(%id, active, "Wishlist indicator");
            }
        }
    }
}

/// Asks confirmations on the terminal and logs navigation.
#[derive(Debug)]
pub struct TerminalHost {
    assume_yes: bool,
}

impl TerminalHost {
    pub const fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl PageHost for TerminalHost {
    fn confirm(&self, question: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        blocking(|| prompt(question))
    }

    fn transition(&self, transition: &PageTransition) {
        match transition {
            PageTransition::Visit(path) => info!(%path, "Navigate"),
            PageTransition::Reload => info!("Reload page"),
            PageTransition::ReloadAfter(delay) => info!(?delay, "Reload page"),
        }
    }
}

/// Run blocking terminal I/O without stalling other tasks on a worker thread.
fn blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => block_in_place(f),
        _ => f(),
    }
}

fn prompt(question: &str) -> bool {
    let mut stderr = std::io::stderr().lock();
    if write!(stderr, "{question} [y/N] ").and_then(|()| stderr.flush()).is_err() {
        return false;
    }

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_outside_runtime() {
        assert_eq!(blocking(|| 2 + 2), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_on_worker_thread() {
        assert!(blocking(|| true));
    }

    #[tokio::test]
    async fn test_blocking_on_current_thread_runtime() {
        assert!(blocking(|| true));
    }

    #[test]
    fn test_assume_yes_skips_prompt() {
        assert!(TerminalHost::new(true).confirm("Remove?"));
    }
}
