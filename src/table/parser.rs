//! Price Table Parser
//!
//! Turns a [`Grid`] into a [`PriceTable`]:
//!
//! 1. Header labels are mapped to size buckets. Labels that do not match are
//!    kept as raw, unmapped columns rather than failing the parse.
//! 2. Each data row's leading cell is mapped to a service. Unknown services
//!    (descriptive rows, notes) are skipped.
//! 3. Rows whose cell count differs from the header are skipped.
//! 4. Each remaining cell is parsed as a [`PriceEntry`]; cells that are not
//!    prices are left absent rather than priced at zero.
//!
//! Structural failures (no table, no header, no bucket columns) are errors
//! from [`PriceTableParser::parse`]. [`PriceTableParser::parse_or_fallback`]
//! logs them and returns [`PriceTable::fallback`] instead.

use std::path::Path;

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::{
    prices::PriceEntry,
    services::ServiceId,
    sizes::SizeBucket,
    table::{Grid, PriceTable, TableError, html::HtmlGridExtractor, sheet::PriceSheet},
};

/// Format of a price source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Marketing page containing an HTML `<table>`.
    Html,

    /// YAML price sheet.
    Yaml,
}

impl SourceFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
                SourceFormat::Yaml
            }
            _ => SourceFormat::Html,
        }
    }
}

/// A header column after label mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Column<'a> {
    Bucket(SizeBucket),
    Unmapped(&'a str),
}

/// Price table parser.
#[derive(Debug)]
pub struct PriceTableParser;

impl PriceTableParser {
    /// Parse a price source document.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] when the document has no usable table or header.
    pub fn parse(source: &str, format: SourceFormat) -> Result<PriceTable, TableError> {
        let grid = match format {
            SourceFormat::Html => HtmlGridExtractor::new()?.extract(source)?,
            SourceFormat::Yaml => PriceSheet::from_yaml(source)?.into_grid(),
        };

        Self::parse_grid(&grid)
    }

    /// Parse a price source document, returning the fail-closed table on any
    /// structural failure.
    pub fn parse_or_fallback(source: &str, format: SourceFormat) -> PriceTable {
        match Self::parse(source, format) {
            Ok(table) => table,
            Err(err) => {
                warn!(error = %err, ?format, "price source malformed; serving empty price table");

                PriceTable::fallback()
            }
        }
    }

    /// Normalize an extracted grid into a price table.
    ///
    /// # Errors
    ///
    /// - [`TableError::NoHeader`]: the header has no columns after the service column.
    /// - [`TableError::NoBucketColumns`]: no header label names a size bucket.
    pub fn parse_grid(grid: &Grid) -> Result<PriceTable, TableError> {
        let columns = map_columns(grid.column_labels());

        if columns.is_empty() {
            return Err(TableError::NoHeader);
        }

        let buckets: Vec<SizeBucket> = columns
            .iter()
            .filter_map(|column| match column {
                Column::Bucket(bucket) => Some(*bucket),
                Column::Unmapped(_) => None,
            })
            .collect();

        if buckets.is_empty() {
            return Err(TableError::NoBucketColumns);
        }

        let mut table = PriceTable::with_buckets(buckets);

        for (row_idx, row) in grid.rows().iter().enumerate() {
            if row.len() != grid.width() {
                debug!(row = row_idx, cells = row.len(), expected = grid.width(), "skipping malformed row");
                continue;
            }

            let Some((name, cells)) = row.split_first() else {
                continue;
            };

            let Some(service) = ServiceId::from_name(name) else {
                debug!(row = row_idx, name = %name, "skipping unrecognised service row");
                continue;
            };

            for (column, cell) in columns.iter().zip(cells) {
                let Some(entry) = PriceEntry::parse(cell) else {
                    debug!(service = %service, cell = %cell, "cell is not a price; leaving absent");
                    continue;
                };

                match column {
                    Column::Bucket(bucket) => table.insert(*bucket, service, entry),
                    Column::Unmapped(label) => table.insert_unmapped(label, service, entry),
                }
            }
        }

        Ok(table)
    }
}

/// Map header labels to columns. A bucket named twice keeps its first column;
/// later duplicates are carried as unmapped.
fn map_columns(labels: &[String]) -> Vec<Column<'_>> {
    let mut seen = FxHashSet::default();

    labels
        .iter()
        .map(|label| match SizeBucket::from_label(label) {
            Some(bucket) if seen.insert(bucket) => Column::Bucket(bucket),
            _ => Column::Unmapped(label.as_str()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;

    fn grid(header: &[&str], rows: &[&[&str]]) -> Grid {
        Grid::new(
            header.iter().map(ToString::to_string).collect(),
            rows.iter()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect(),
        )
    }

    fn flat(amount: i64) -> PriceEntry {
        PriceEntry::Flat(Decimal::new(amount, 0))
    }

    #[test]
    fn parse_grid_maps_buckets_and_services() -> TestResult {
        let grid = grid(
            &["Service", "Under 1,500 sq ft", "1,500 \u{2013} 2,500 sq ft"],
            &[
                &["HDR Photography", "$169", "$199"],
                &["Matterport 3D Tour", "$199", "$249"],
            ],
        );

        let table = PriceTableParser::parse_grid(&grid)?;

        assert_eq!(table.bucket_count(), 2);
        assert_eq!(table.entry_count(), 4);
        assert_eq!(
            table.get(SizeBucket::From1500To2500, ServiceId::MatterportTour),
            Some(&flat(249))
        );

        Ok(())
    }

    #[test]
    fn parse_grid_skips_unknown_services_and_short_rows() -> TestResult {
        let grid = grid(
            &["Service", "Under 1500", "1500-2500"],
            &[
                &["Rush Delivery", "Call", "Call"],
                &["Homes over 5,500 sq ft: contact us"],
                &["Floor Plan", "$99", "$119", "$139"],
                &["HDR Photography", "$169", "$199"],
            ],
        );

        let table = PriceTableParser::parse_grid(&grid)?;

        assert_eq!(table.entry_count(), 2);
        assert_eq!(table.get(SizeBucket::Under1500, ServiceId::FloorPlan), None);

        Ok(())
    }

    #[test]
    fn parse_grid_leaves_unparseable_cells_absent() -> TestResult {
        let grid = grid(
            &["Service", "Under 1500", "1500-2500"],
            &[&["Cinematic Video", "TBD", "$399"]],
        );

        let table = PriceTableParser::parse_grid(&grid)?;

        assert_eq!(table.get(SizeBucket::Under1500, ServiceId::CinematicVideo), None);
        assert_eq!(
            table.get(SizeBucket::From1500To2500, ServiceId::CinematicVideo),
            Some(&flat(399))
        );
        assert_eq!(
            table.missing_entries().first(),
            Some(&(SizeBucket::Under1500, ServiceId::HdrPhotography))
        );

        Ok(())
    }

    #[test]
    fn parse_grid_passes_through_unrecognised_labels() -> TestResult {
        let grid = grid(
            &["Service", "Under 1500", "Estates"],
            &[&["HDR Photography", "$169", "$499"]],
        );

        let table = PriceTableParser::parse_grid(&grid)?;

        assert_eq!(table.bucket_count(), 1);
        assert_eq!(
            table
                .unmapped_columns()
                .get("Estates")
                .and_then(|prices| prices.get(&ServiceId::HdrPhotography)),
            Some(&flat(499))
        );

        Ok(())
    }

    #[test]
    fn parse_grid_keeps_first_column_for_repeated_bucket() -> TestResult {
        let grid = grid(
            &["Service", "Under 1500", "1500-2500", "Under 1,500 sq ft"],
            &[&["HDR Photography", "$169", "$199", "$179"]],
        );

        let table = PriceTableParser::parse_grid(&grid)?;

        assert_eq!(table.bucket_count(), 2);
        assert_eq!(
            table.get(SizeBucket::Under1500, ServiceId::HdrPhotography),
            Some(&flat(169))
        );
        assert_eq!(
            table
                .unmapped_columns()
                .get("Under 1,500 sq ft")
                .and_then(|prices| prices.get(&ServiceId::HdrPhotography)),
            Some(&flat(179))
        );

        Ok(())
    }

    #[test]
    fn parse_grid_without_bucket_columns_fails() {
        let grid = grid(&["Service", "Small", "Large"], &[&["HDR Photography", "1", "2"]]);

        assert!(matches!(
            PriceTableParser::parse_grid(&grid),
            Err(TableError::NoBucketColumns)
        ));
    }

    #[test]
    fn parse_grid_without_columns_fails() {
        let grid = grid(&["Service"], &[]);

        assert!(matches!(
            PriceTableParser::parse_grid(&grid),
            Err(TableError::NoHeader)
        ));
    }

    #[test]
    fn parse_or_fallback_returns_fallback_without_table() {
        let table = PriceTableParser::parse_or_fallback("<main>No prices</main>", SourceFormat::Html);

        assert_eq!(table, PriceTable::fallback());
    }

    #[test]
    fn parse_or_fallback_returns_fallback_for_broken_yaml() {
        let table = PriceTableParser::parse_or_fallback("columns: [", SourceFormat::Yaml);

        assert_eq!(table, PriceTable::fallback());
    }

    #[test]
    fn source_format_from_path_uses_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("prices.YML")), SourceFormat::Yaml);
        assert_eq!(SourceFormat::from_path(Path::new("prices.yaml")), SourceFormat::Yaml);
        assert_eq!(SourceFormat::from_path(Path::new("pricing.html")), SourceFormat::Html);
        assert_eq!(SourceFormat::from_path(Path::new("pricing")), SourceFormat::Html);
    }
}
