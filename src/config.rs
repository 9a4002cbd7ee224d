//! Configuration
//!
//! Command line arguments with environment fallbacks. A `.env` file in the
//! working directory is loaded first when present.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    catalog::{CatalogError, PackageCatalog},
    selection::SelectionLine,
    table::PriceTable,
};

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,
}

/// Where prices and packages are read from.
#[derive(Debug, Args)]
pub struct SourceConfig {
    /// Price table source, HTML or YAML by extension. Uses the built-in table when omitted.
    #[arg(long, env = "APERTURE_PRICE_TABLE", global = true)]
    pub price_table: Option<PathBuf>,

    /// Package catalog YAML. Uses the built-in catalog when omitted.
    #[arg(long, env = "APERTURE_PACKAGES", global = true)]
    pub packages: Option<PathBuf>,
}

impl SourceConfig {
    /// Load the configured price table.
    ///
    /// Never fails: an unreadable or malformed source is logged and replaced
    /// by the empty fallback table.
    pub fn price_table(&self) -> PriceTable {
        match &self.price_table {
            Some(path) => PriceTable::load_or_fallback(path),
            None => PriceTable::builtin(),
        }
    }

    /// Load the configured package catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the catalog cannot be read or is invalid.
    pub fn package_catalog(&self) -> Result<PackageCatalog, CatalogError> {
        match &self.packages {
            Some(path) => PackageCatalog::load(path),
            None => PackageCatalog::builtin(),
        }
    }
}

/// Aperture configuration
#[derive(Debug, Parser)]
#[command(name = "aperture", about = "Real estate photography pricing", long_about = None)]
pub struct Config {
    /// Price and package sources
    #[command(flatten)]
    pub sources: SourceConfig,

    /// Logging settings
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the parsed price table
    Table,

    /// Price a selection of services for a property
    Quote(QuoteArgs),

    /// List the packages offered for a property
    Packages(PropertyArgs),

    /// Print the pricing data JSON served to the booking form
    PricingData,

    /// Submit a booking from a JSON file and print the confirmation
    Book(BookArgs),
}

/// Property size argument
#[derive(Debug, Args)]
pub struct PropertyArgs {
    /// Property size in square feet
    #[arg(long)]
    pub sqft: u32,
}

/// Arguments for `quote`
#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Property size in square feet
    #[arg(long)]
    pub sqft: u32,

    /// Service to include, as `serviceId` or `serviceId=quantity`; repeatable
    #[arg(long = "service", required = true)]
    pub services: Vec<SelectionLine>,
}

/// Arguments for `book`
#[derive(Debug, Args)]
pub struct BookArgs {
    /// Booking submission JSON; `-` reads standard input
    pub submission: PathBuf,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}
