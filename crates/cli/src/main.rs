//! Keepsake CLI - Drive the cart and wishlist from a terminal.
//!
//! Runs the same reconcilers the storefront pages use. Guest state is kept in
//! `KEEPSAKE_STORAGE_DIR`; authenticated calls go to `KEEPSAKE_API_BASE_URL`
//! with the session cookie from `KEEPSAKE_COOKIE`.
//!
//! # Usage
//!
//! ```bash
//! # Add two mugs to the guest cart
//! keepsake cart add 7 --name Mug --price 500 --quantity 2
//!
//! # Remove a line from the authenticated cart without prompting
//! keepsake --authenticated cart remove 7 --yes
//!
//! # Toggle a wishlist entry while "on" the wishlist page
//! keepsake --authenticated --path /wishlist/ wishlist toggle 3 --name "Pearl Necklace" --price 4200
//!
//! # Refresh badges and detail views as on page load
//! keepsake --path /cart/ sync
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use keepsake_core::{Price, ProductId};
use keepsake_storefront::config::StorefrontConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod terminal;

#[derive(Parser)]
#[command(name = "keepsake")]
#[command(author, version, about = "Keepsake cart and wishlist CLI")]
struct Cli {
    /// Act as a logged-in visitor (state lives on the backend at KEEPSAKE_API_BASE_URL)
    #[arg(long, global = true)]
    authenticated: bool,

    /// Page the command runs "on"; decides which detail view is refreshed
    #[arg(long, global = true, default_value = "/")]
    path: String,

    /// Anti-forgery token read from the page form
    #[arg(long, global = true)]
    csrf_token: Option<String>,

    /// Answer yes to confirmation prompts
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Change or inspect the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Change or inspect the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Refresh badges and detail views as a page load does
    Sync,
}

#[derive(Subcommand)]
enum CartAction {
    /// Add units of a product
    Add {
        /// Product ID
        id: ProductId,

        /// Product display name
        #[arg(short, long)]
        name: String,

        /// Unit price
        #[arg(short, long)]
        price: Price,

        /// Product image URL
        #[arg(short, long)]
        image: Option<String>,

        /// Units to add
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },
    /// Remove a product's line
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set a line's quantity (0 or less removes it)
    Set {
        /// Product ID
        id: ProductId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Show the unit count
    Count,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Add the product if absent, remove it if present
    Toggle {
        /// Product ID
        id: ProductId,

        /// Product display name
        #[arg(short, long)]
        name: String,

        /// Unit price
        #[arg(short, long)]
        price: Price,

        /// Product image URL
        #[arg(short, long)]
        image: Option<String>,
    },
    /// Make sure the product is not in the wishlist
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Report whether the product is in the wishlist
    Check {
        /// Product ID
        id: ProductId,
    },
    /// Show the entry count
    Count,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration from environment (needed for Sentry init)
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "keepsake_storefront=info,keepsake_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let session = commands::Session::open(
        config,
        cli.authenticated,
        &cli.path,
        cli.csrf_token.as_deref(),
        cli.yes,
    )?;

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Add {
                id,
                name,
                price,
                image,
                quantity,
            } => commands::cart::add(&session, id, name, price, image, quantity).await?,
            CartAction::Remove { id } => commands::cart::remove(&session, id).await?,
            CartAction::Set { id, quantity } => {
                commands::cart::set(&session, id, quantity).await?;
            }
            CartAction::Count => commands::cart::count(&session).await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Toggle {
                id,
                name,
                price,
                image,
            } => commands::wishlist::toggle(&session, id, name, price, image).await?,
            WishlistAction::Remove { id } => commands::wishlist::remove(&session, id).await?,
            WishlistAction::Check { id } => commands::wishlist::check(&session, id).await?,
            WishlistAction::Count => commands::wishlist::count(&session).await?,
        },
        Commands::Sync => commands::sync(&session).await,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cart_add() {
        let cli = Cli::try_parse_from([
            "keepsake", "cart", "add", "7", "--name", "Mug", "--price", "500", "-q", "2",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        assert!(!cli.authenticated);
        assert_eq!(cli.path, "/");
        let Commands::Cart {
            action: CartAction::Add { id, quantity, .. },
        } = cli.command
        else {
            panic!("expected cart add");
        };
        assert_eq!(id, ProductId::new(7));
        assert_eq!(quantity, 2);
    }

    #[test]
    fn test_parse_negative_quantity() {
        let cli = Cli::try_parse_from(["keepsake", "--authenticated", "cart", "set", "7", "-1"])
            .unwrap_or_else(|e| panic!("{e}"));

        assert!(cli.authenticated);
        assert!(matches!(
            cli.command,
            Commands::Cart {
                action: CartAction::Set { quantity: -1, .. }
            }
        ));
    }

    #[test]
    fn test_rejects_zero_add_quantity() {
        assert!(
            Cli::try_parse_from([
                "keepsake", "cart", "add", "7", "--name", "Mug", "--price", "500", "-q", "0",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_rejects_negative_price() {
        assert!(
            Cli::try_parse_from([
                "keepsake", "wishlist", "toggle", "3", "--name", "Ring", "--price", "-1",
            ])
            .is_err()
        );
    }
}
