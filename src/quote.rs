//! Quotes
//!
//! A [`Quote`] is the full pricing result for one selection: the itemized
//! subtotal, the volume discount taken from it, and the packages offered for
//! the same size bucket.

use std::io;

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{
    Money,
    iso::{Currency, USD},
};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    catalog::PackageOffer,
    discounts::{VolumeDiscount, next_tier},
    prices::PriceEntry,
    pricing::{PackageRecommendation, SubtotalBreakdown, UnpricedLine},
    services::ServiceId,
    sizes::SizeBucket,
    table::{PriceTable, ServicePrices},
};

/// Errors that can occur when rendering a quote.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Failed to write to output.
    #[error("failed to write quote: {0}")]
    Io(#[from] io::Error),
}

/// Subtotal, discount and package recommendations for one selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote<'a> {
    breakdown: SubtotalBreakdown<'a>,
    discount: VolumeDiscount<'static>,
    packages: Vec<PackageRecommendation<'a>>,
}

impl<'a> Quote<'a> {
    /// Assemble a quote from its computed parts.
    pub fn new(
        breakdown: SubtotalBreakdown<'a>,
        discount: VolumeDiscount<'static>,
        packages: Vec<PackageRecommendation<'a>>,
    ) -> Self {
        Self {
            breakdown,
            discount,
            packages,
        }
    }

    /// Bucket the quote was computed for
    pub fn bucket(&self) -> SizeBucket {
        self.breakdown.bucket()
    }

    /// Itemized lines and any unpriced lines
    pub fn breakdown(&self) -> &SubtotalBreakdown<'a> {
        &self.breakdown
    }

    /// Lines that could not be priced
    pub fn unpriced(&self) -> &[UnpricedLine] {
        self.breakdown.unpriced()
    }

    /// Pre-discount subtotal
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.breakdown.subtotal()
    }

    /// Volume discount applied to the subtotal
    pub fn discount(&self) -> &VolumeDiscount<'static> {
        &self.discount
    }

    /// Amount due after the volume discount
    pub fn total(&self) -> Money<'static, Currency> {
        self.discount.final_total()
    }

    /// Packages offered for the bucket
    pub fn packages(&self) -> &[PackageRecommendation<'a>] {
        &self.packages
    }

    /// Whether every selected line was priced.
    pub fn is_complete(&self) -> bool {
        self.breakdown.is_complete()
    }

    /// Whether package savings may be shown alongside this quote.
    ///
    /// Savings are suppressed when pricing is incomplete, so that a partial
    /// quote is never presented next to a savings figure.
    pub fn package_section_allowed(&self) -> bool {
        self.is_complete() && !self.packages.is_empty()
    }

    /// Write the quote as a terminal table followed by a totals summary.
    ///
    /// # Errors
    ///
    /// Returns a [`QuoteError`] if writing to `out` fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), QuoteError> {
        writeln!(out, "\nQuote for {}", self.bucket())?;

        let mut builder = Builder::default();

        builder.push_record(["", "Service", "Price", "Qty", "Amount"]);

        for (idx, line) in self.breakdown.lines().iter().enumerate() {
            builder.push_record([
                format!("#{:<3}", idx + 1),
                line.service_id().display_name().to_string(),
                price_cell(line.entry()),
                line.quantity().to_string(),
                dollars(line.amount()),
            ]);
        }

        for line in self.unpriced() {
            builder.push_record([
                "-".to_string(),
                line.service_id.display_name().to_string(),
                "unavailable".to_string(),
                line.quantity.to_string(),
                String::new(),
            ]);
        }

        writeln!(out, "{}", render(builder, 2..5))?;

        self.write_summary(&mut out)?;

        if self.package_section_allowed() {
            let offers: Vec<&PackageOffer> = self
                .packages
                .iter()
                .map(PackageRecommendation::offer)
                .collect();

            writeln!(out, "\nPackages for {}", self.bucket())?;
            write_packages(&mut out, &offers)?;
        } else if !self.is_complete() {
            writeln!(
                out,
                "\nSome services are not priced for {}; contact us for a quote.",
                self.bucket()
            )?;
        }

        Ok(())
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), QuoteError> {
        let mut rows = vec![(" Subtotal:".to_string(), money_dollars(self.subtotal()))];

        if self.discount.is_discounted() {
            rows.push((
                format!(" Volume Discount ({}%):", self.discount.percent_points()),
                format!("-{}", money_dollars(self.discount.discount())),
            ));
        }

        rows.push((" Total:".to_string(), money_dollars(self.total())));

        let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        let value_width = rows.iter().map(|(_, value)| value.len()).max().unwrap_or(0);

        for (label, value) in &rows {
            writeln!(out, "{label:>label_width$}  {value:>value_width$}")?;
        }

        if let Some((tier, gap)) = next_tier(self.subtotal().to_minor_units()) {
            writeln!(
                out,
                "\n Add {} more to reach the {}% volume discount.",
                money_dollars(Money::from_minor(gap, self.subtotal().currency())),
                tier.percent_points
            )?;
        }

        Ok(())
    }
}

/// Write package offers as a terminal table.
///
/// # Errors
///
/// Returns a [`QuoteError`] if writing to `out` fails.
pub fn write_packages(out: &mut impl io::Write, offers: &[&PackageOffer]) -> Result<(), QuoteError> {
    let mut builder = Builder::default();

    builder.push_record(["Package", "Price", "Value", "Savings", "Includes"]);

    for offer in offers {
        builder.push_record([
            offer.name().to_string(),
            money_dollars(offer.price()),
            money_dollars(offer.value()),
            money_dollars(offer.savings()),
            offer.includes().join("\n"),
        ]);
    }

    writeln!(out, "{}", render(builder, 1..4))?;

    Ok(())
}

/// Write a price table with one row per service and one column per bucket.
///
/// Missing entries are shown as `-`. Columns whose header was not recognised
/// as a size bucket are listed after the buckets under their raw labels.
///
/// # Errors
///
/// Returns a [`QuoteError`] if writing to `out` fails.
pub fn write_price_table(out: &mut impl io::Write, table: &PriceTable) -> Result<(), QuoteError> {
    let columns: Vec<(String, &ServicePrices)> = table
        .buckets()
        .map(|(bucket, prices)| (bucket.label().to_string(), prices))
        .chain(
            table
                .unmapped_columns()
                .iter()
                .map(|(label, prices)| (label.clone(), prices)),
        )
        .collect();

    let mut builder = Builder::default();

    builder.push_record(
        std::iter::once("Service".to_string()).chain(columns.iter().map(|(label, _)| label.clone())),
    );

    for service in ServiceId::ALL {
        builder.push_record(std::iter::once(service.display_name().to_string()).chain(
            columns.iter().map(|(_, prices)| {
                prices
                    .get(&service)
                    .map_or_else(|| "-".to_string(), price_cell)
            }),
        ));
    }

    writeln!(out, "{}", render(builder, 1..columns.len() + 1))?;

    Ok(())
}

fn price_cell(entry: &PriceEntry) -> String {
    match entry.unit() {
        Some(unit) => format!("{}/{unit}", dollars(entry.amount())),
        None => dollars(entry.amount()),
    }
}

/// Build a rounded table with a bold header and right-aligned money columns.
fn render(builder: Builder, money_columns: std::ops::Range<usize>) -> String {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(money_columns), Alignment::right());

    table.to_string()
}

/// Format an amount as US dollars: `$1,234.56`. Rounds half away from zero.
pub fn dollars(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    money_dollars(Money::from_decimal(rounded, USD))
}

/// Format money as US dollars: `$1,234.56`.
pub fn money_dollars(money: Money<'_, Currency>) -> String {
    money.to_string()
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{catalog::PackageCatalog, pricing::PricingEngine, selection::Selection};

    #[test]
    fn dollars_groups_thousands_and_pads_cents() {
        assert_eq!(dollars(Decimal::new(0, 0)), "$0.00");
        assert_eq!(dollars(Decimal::new(984, 2)), "$9.84");
        assert_eq!(dollars(Decimal::new(1149, 0)), "$1,149.00");
        assert_eq!(dollars(Decimal::new(123_456_789, 2)), "$1,234,567.89");
        assert_eq!(dollars(Decimal::new(-5, 1)), "-$0.50");
        assert_eq!(dollars(Decimal::new(12_345, 3)), "$12.35");
    }

    #[test]
    fn money_dollars_reads_minor_units() {
        assert_eq!(money_dollars(Money::from_minor(31_816, USD)), "$318.16");
    }

    #[test]
    fn dollars_agrees_with_money_display() {
        for minor in [0, 984, 114_900, 123_456_789, -50, 31_816] {
            let money = Money::from_minor(minor, USD);

            assert_eq!(money_dollars(money), money.to_string());
            assert_eq!(dollars(Decimal::new(minor, 2)), money.to_string());
        }
    }

    #[test]
    fn package_section_is_hidden_for_incomplete_quotes() -> TestResult {
        let mut table = PriceTable::with_buckets([SizeBucket::Under1500]);
        let catalog = PackageCatalog::builtin()?;

        table.insert(
            SizeBucket::Under1500,
            ServiceId::HdrPhotography,
            PriceEntry::Flat(Decimal::new(169, 0)),
        );

        let engine = PricingEngine::new(&table, &catalog);

        let mut selection = Selection::new();
        selection.add(ServiceId::HdrPhotography, 1)?;

        let complete = engine.quote(SizeBucket::Under1500, &selection)?;

        selection.add(ServiceId::FloorPlan, 1)?;

        let incomplete = engine.quote(SizeBucket::Under1500, &selection)?;

        assert!(complete.package_section_allowed());
        assert!(!incomplete.package_section_allowed());
        assert_eq!(incomplete.subtotal(), complete.subtotal());

        Ok(())
    }

    #[test]
    fn write_to_renders_lines_and_totals() -> TestResult {
        let table = PriceTable::builtin();
        let catalog = PackageCatalog::builtin()?;
        let engine = PricingEngine::new(&table, &catalog);

        let mut selection = Selection::new();
        selection
            .add(ServiceId::HdrPhotography, 1)?
            .add(ServiceId::DroneAerialPhotos, 1)?;

        let quote = engine.quote(SizeBucket::Under1500, &selection)?;

        let mut out = Vec::new();
        quote.write_to(&mut out)?;
        let rendered = String::from_utf8(out)?;

        assert!(rendered.contains("HDR Photography"));
        assert!(rendered.contains("$169.00"));
        assert!(rendered.contains("Volume Discount (3%):"));
        assert!(rendered.contains("-$9.84"));
        assert!(rendered.contains("$318.16"));
        assert!(rendered.contains("Essentials"));

        Ok(())
    }

    #[test]
    fn write_to_flags_unpriced_lines() -> TestResult {
        let table = PriceTable::fallback();
        let catalog = PackageCatalog::builtin()?;
        let engine = PricingEngine::new(&table, &catalog);

        let mut selection = Selection::new();
        selection.add(ServiceId::CinematicVideo, 1)?;

        let quote = engine.quote(SizeBucket::From2500To3500, &selection)?;

        let mut out = Vec::new();
        quote.write_to(&mut out)?;
        let rendered = String::from_utf8(out)?;

        assert!(rendered.contains("unavailable"));
        assert!(rendered.contains("contact us for a quote"));
        assert!(!rendered.contains("Packages for"));

        Ok(())
    }

    #[test]
    fn write_price_table_shows_every_service_and_gaps() -> TestResult {
        let mut table = PriceTable::with_buckets([SizeBucket::Under1500]);

        table.insert(
            SizeBucket::Under1500,
            ServiceId::VirtualStaging,
            PriceEntry::PerUnit {
                amount: Decimal::new(29, 0),
                unit: "image".to_string(),
            },
        );

        let mut out = Vec::new();
        write_price_table(&mut out, &table)?;
        let rendered = String::from_utf8(out)?;

        assert!(rendered.contains("Under 1500"));
        assert!(rendered.contains("$29.00/image"));
        assert!(rendered.contains("Agent Intro Video"));

        Ok(())
    }
}
