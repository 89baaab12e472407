//! Keepsake CLI - catalog checks and offline price quotes.
//!
//! # Usage
//!
//! ```bash
//! # Check a catalog file before deploying it
//! ks-cli catalog validate catalog.yaml
//!
//! # Print the built-in catalog as YAML (a starting point for overrides)
//! ks-cli catalog show
//!
//! # Price a saved session against a base price
//! ks-cli quote --session session.json --base-price 450
//! ```
//!
//! # Commands
//!
//! - `catalog validate` - Validate a catalog YAML file
//! - `catalog show` - Print a catalog as YAML
//! - `policy validate` - Validate a customization policy YAML file
//! - `quote` - Compute a price breakdown for a session

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "ks-cli")]
#[command(author, version, about = "Keepsake CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect option catalogs
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Inspect customization policies
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },
    /// Price a customization session
    Quote {
        /// Session JSON file
        #[arg(short, long)]
        session: PathBuf,

        /// Base price of one unit
        #[arg(short, long)]
        base_price: Decimal,

        /// Catalog YAML file (defaults to the built-in catalog)
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Policy YAML file (defaults to the built-in policy)
        #[arg(short, long)]
        policy: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Validate a catalog YAML file
    Validate {
        /// Path to the catalog file
        path: PathBuf,
    },
    /// Print a catalog as YAML
    Show {
        /// Catalog YAML file (defaults to the built-in catalog)
        path: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PolicyAction {
    /// Validate a policy YAML file
    Validate {
        /// Path to the policy file
        path: PathBuf,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::Validate { path } => commands::catalog::validate(&path)?,
            CatalogAction::Show { path } => commands::catalog::show(path.as_deref())?,
        },
        Commands::Policy { action } => match action {
            PolicyAction::Validate { path } => commands::policy::validate(&path)?,
        },
        Commands::Quote {
            session,
            base_price,
            catalog,
            policy,
        } => commands::quote::run(&session, base_price, catalog.as_deref(), policy.as_deref())?,
    }
    Ok(())
}
