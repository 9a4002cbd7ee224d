//! Aperture CLI

use std::{
    fs,
    io::{self, Read, Write},
    process::ExitCode,
};

use aperture::{
    api::PricingData,
    booking::{BookingError, BookingHandler, BookingSubmission, InMemoryBookingStore, OutboxNotifier},
    catalog::{CatalogError, PackageCatalog},
    config::{BookArgs, Command, Config, PropertyArgs, QuoteArgs},
    logging,
    pricing::{PricingEngine, PricingError},
    quote::{self, QuoteError},
    selection::{Selection, SelectionError},
    sizes::{SizeBucket, SizeError},
    table::PriceTable,
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Size(#[from] SizeError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Render(#[from] QuoteError),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => err.exit(),
    };

    if let Err(err) = logging::init_subscriber(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging is not initialized, must use eprintln for setup errors"
        )]
        {
            eprintln!("Logging setup failed: {err}");
        }
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            #[expect(
                clippy::print_stderr,
                reason = "user-facing error message for the command that failed"
            )]
            {
                eprintln!("{err}");
            }

            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), CliError> {
    let table = config.sources.price_table();
    let catalog = config.sources.package_catalog()?;

    let missing = table.missing_entries();

    if !missing.is_empty() {
        warn!(missing = missing.len(), "price table has gaps; affected services cannot be quoted");
    }

    debug!(
        buckets = table.bucket_count(),
        entries = table.entry_count(),
        packages = catalog.len(),
        "pricing sources loaded"
    );

    let mut out = io::stdout().lock();

    match &config.command {
        Command::Table => quote::write_price_table(&mut out, &table)?,
        Command::Quote(args) => write_quote(&mut out, &table, &catalog, args)?,
        Command::Packages(args) => write_packages(&mut out, &catalog, args)?,
        Command::PricingData => {
            let json = PricingData::from_sources(&table, &catalog).to_json_pretty()?;

            writeln!(out, "{json}")?;
        }
        Command::Book(args) => book(&mut out, &table, &catalog, args)?,
    }

    Ok(())
}

fn write_quote(
    out: &mut impl Write,
    table: &PriceTable,
    catalog: &PackageCatalog,
    args: &QuoteArgs,
) -> Result<(), CliError> {
    let bucket = SizeBucket::for_square_feet(args.sqft)?;
    let selection = Selection::from_lines(args.services.iter().copied())?;
    let engine = PricingEngine::new(table, catalog);

    engine.quote(bucket, &selection)?.write_to(out)?;

    Ok(())
}

fn write_packages(
    out: &mut impl Write,
    catalog: &PackageCatalog,
    args: &PropertyArgs,
) -> Result<(), CliError> {
    let bucket = SizeBucket::for_square_feet(args.sqft)?;
    let offers = catalog.offers_for(bucket);

    if offers.is_empty() {
        writeln!(out, "No packages are offered for {bucket}.")?;

        return Ok(());
    }

    writeln!(out, "\nPackages for {bucket}")?;
    quote::write_packages(out, &offers)?;

    Ok(())
}

fn book(
    out: &mut impl Write,
    table: &PriceTable,
    catalog: &PackageCatalog,
    args: &BookArgs,
) -> Result<(), CliError> {
    let body = if args.submission.as_os_str() == "-" {
        let mut body = String::new();
        io::stdin().read_to_string(&mut body)?;
        body
    } else {
        fs::read_to_string(&args.submission)?
    };

    let submission = BookingSubmission::from_json(&body)?;
    let engine = PricingEngine::new(table, catalog);
    let mut handler = BookingHandler::new(engine, InMemoryBookingStore::new(), OutboxNotifier::new());

    let receipt = handler.submit(&submission)?;

    writeln!(out, "Booking {} confirmed, total {}\n", receipt.id, receipt.total)?;
    writeln!(out, "{}", receipt.email)?;

    Ok(())
}
