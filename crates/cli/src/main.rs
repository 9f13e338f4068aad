//! RocketShoes CLI - Terminal front end for the cart.
//!
//! # Usage
//!
//! ```bash
//! # List the catalog with the amount of each product already in the cart
//! rs-cart products
//!
//! # Show cart lines, subtotals and total
//! rs-cart show
//!
//! # Add one unit of product 3
//! rs-cart add 3
//!
//! # Set product 3 to five units
//! rs-cart update 3 5
//!
//! # Remove product 3
//! rs-cart remove 3
//! ```
//!
//! Configuration comes from the environment (see
//! `rocketshoes_storefront::config`). Exits with status 1 when an operation
//! raised an error toast.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rocketshoes_core::ProductId;
use rocketshoes_storefront::config::CartConfig;
use rocketshoes_storefront::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod toast;

use toast::ConsoleToast;

#[derive(Parser)]
#[command(name = "rs-cart")]
#[command(author, version, about = "RocketShoes cart")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the product catalog
    Products,
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Set the quantity of a product already in the cart
    Update {
        /// Product ID
        product_id: ProductId,

        /// Requested quantity (zero or less is ignored)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
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
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Logs go to stderr so command output stays clean on stdout
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rocketshoes_storefront=warn,rocketshoes_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CartConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = init_sentry(&config);
    init_tracing();

    let toasts = ConsoleToast::new();
    let state = AppState::new(config, toasts.clone());

    let result = run(cli, &state).await;
    if let Err(e) = &result {
        tracing::error!("Command failed: {e}");
    }
    let status = exit_status(result.is_err(), toasts.raised());

    // Flushes events captured by failed cart operations
    drop(sentry_guard);
    ExitCode::from(status)
}

/// Process status: 1 when the command failed or raised a toast.
const fn exit_status(failed: bool, toast_raised: bool) -> u8 {
    if failed || toast_raised { 1 } else { 0 }
}

async fn run(
    cli: Cli,
    state: &AppState<ConsoleToast>,
) -> Result<(), Box<dyn std::error::Error>> {
    let cart = state.cart_context().use_cart()?;

    match cli.command {
        Commands::Products => commands::products::list(cart).await?,
        Commands::Show => commands::cart::show(cart),
        Commands::Add { product_id } => commands::cart::add(cart, product_id).await,
        Commands::Remove { product_id } => commands::cart::remove(cart, product_id).await,
        Commands::Update { product_id, amount } => {
            commands::cart::update(cart, product_id, amount).await;
        }
    }
    Ok(())
}
