//! Price Table
//!
//! The normalized lookup every price computation reads from:
//! size bucket -> service -> [`PriceEntry`].
//!
//! Tables are built by [`PriceTableParser`] from a price source document
//! (an HTML `<table>` or a YAML price sheet), once per process, and are
//! read-only afterwards.

use std::{collections::BTreeMap, fs, path::Path};

use thiserror::Error;
use tracing::warn;

use crate::{prices::PriceEntry, services::ServiceId, sizes::SizeBucket};

pub mod grid;
pub mod html;
pub mod parser;
pub mod sheet;

pub use grid::Grid;
pub use parser::{PriceTableParser, SourceFormat};

/// Embedded marketing-site price table.
const BUILTIN_SOURCE: &str = include_str!("../../data/pricing.html");

/// Prices for every service in one column of the table.
pub type ServicePrices = BTreeMap<ServiceId, PriceEntry>;

/// Structural failures reading a price source.
#[derive(Debug, Error)]
pub enum TableError {
    /// The source does not contain a pricing table.
    #[error("no pricing table found in source")]
    NoTable,

    /// The table has no header row naming its columns.
    #[error("pricing table has no header row")]
    NoHeader,

    /// None of the header labels name a size bucket.
    #[error("pricing table header does not name any size bucket")]
    NoBucketColumns,

    /// A cell extraction pattern failed to compile.
    #[error(transparent)]
    Pattern(#[from] regex::Error),

    /// The YAML price sheet could not be parsed.
    #[error("Failed to parse YAML price sheet: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// The price source could not be read.
    #[error("Failed to read price source: {0}")]
    Io(#[from] std::io::Error),
}

/// Normalized price lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    buckets: BTreeMap<SizeBucket, ServicePrices>,

    /// Columns whose header label did not match a size bucket, keyed by the raw label.
    unmapped: BTreeMap<String, ServicePrices>,
}

impl PriceTable {
    /// The fail-closed table: every bucket present, no prices.
    ///
    /// Used whenever a price source is structurally broken, so that the site
    /// shows an obviously empty price list rather than a partial one.
    pub fn fallback() -> Self {
        Self {
            buckets: SizeBucket::ALL
                .into_iter()
                .map(|bucket| (bucket, ServicePrices::new()))
                .collect(),
            unmapped: BTreeMap::new(),
        }
    }

    /// Parse the embedded price table, falling back to [`PriceTable::fallback`].
    pub fn builtin() -> Self {
        PriceTableParser::parse_or_fallback(BUILTIN_SOURCE, SourceFormat::Html)
    }

    /// Read and parse a price source from disk.
    ///
    /// The format is chosen from the file extension (`.yml`/`.yaml` for price
    /// sheets, anything else is treated as HTML).
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if the file cannot be read or is structurally invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        PriceTableParser::parse(&contents, SourceFormat::from_path(path))
    }

    /// Like [`PriceTable::load`], but never fails: errors are logged and the
    /// fallback table is returned.
    pub fn load_or_fallback(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        match Self::load(path) {
            Ok(table) => table,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "price source unusable; serving empty price table");

                Self::fallback()
            }
        }
    }

    /// Look up the price of a service in a bucket.
    pub fn get(&self, bucket: SizeBucket, service: ServiceId) -> Option<&PriceEntry> {
        self.buckets.get(&bucket)?.get(&service)
    }

    /// All prices for one bucket, if the bucket is present.
    pub fn bucket(&self, bucket: SizeBucket) -> Option<&ServicePrices> {
        self.buckets.get(&bucket)
    }

    /// Iterate over buckets in size order.
    pub fn buckets(&self) -> impl Iterator<Item = (SizeBucket, &ServicePrices)> {
        self.buckets.iter().map(|(bucket, prices)| (*bucket, prices))
    }

    /// Columns whose header did not match a known size bucket.
    pub fn unmapped_columns(&self) -> &BTreeMap<String, ServicePrices> {
        &self.unmapped
    }

    /// Number of buckets present.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of priced (bucket, service) pairs.
    pub fn entry_count(&self) -> usize {
        self.buckets.values().map(BTreeMap::len).sum()
    }

    /// True when no bucket carries any price.
    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    /// Every (bucket, service) pair with no price, in size order.
    ///
    /// Buckets absent from the source count as having no prices at all.
    pub fn missing_entries(&self) -> Vec<(SizeBucket, ServiceId)> {
        SizeBucket::ALL
            .into_iter()
            .flat_map(|bucket| {
                let prices = self.buckets.get(&bucket);

                ServiceId::ALL
                    .into_iter()
                    .filter(move |service| !prices.is_some_and(|prices| prices.contains_key(service)))
                    .map(move |service| (bucket, service))
            })
            .collect()
    }

    pub(crate) fn with_buckets(buckets: impl IntoIterator<Item = SizeBucket>) -> Self {
        Self {
            buckets: buckets
                .into_iter()
                .map(|bucket| (bucket, ServicePrices::new()))
                .collect(),
            unmapped: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, bucket: SizeBucket, service: ServiceId, entry: PriceEntry) {
        self.buckets.entry(bucket).or_default().insert(service, entry);
    }

    pub(crate) fn insert_unmapped(&mut self, label: &str, service: ServiceId, entry: PriceEntry) {
        self.unmapped
            .entry(label.to_string())
            .or_default()
            .insert(service, entry);
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn fallback_has_every_bucket_and_no_prices() {
        let table = PriceTable::fallback();

        assert_eq!(table.bucket_count(), SizeBucket::ALL.len());
        assert!(table.is_empty());

        for bucket in SizeBucket::ALL {
            assert!(table.bucket(bucket).is_some_and(BTreeMap::is_empty));
        }
    }

    #[test]
    fn builtin_table_is_complete() {
        let table = PriceTable::builtin();

        assert_eq!(table.bucket_count(), 5);
        assert_eq!(table.entry_count(), 5 * ServiceId::ALL.len());
        assert!(table.missing_entries().is_empty());
        assert!(table.unmapped_columns().is_empty());
    }

    #[test]
    fn builtin_table_matches_published_prices() {
        let table = PriceTable::builtin();

        assert_eq!(
            table.get(SizeBucket::Under1500, ServiceId::HdrPhotography),
            Some(&PriceEntry::Flat(Decimal::new(169, 0)))
        );
        assert_eq!(
            table.get(SizeBucket::From4500To5500, ServiceId::MatterportTour),
            Some(&PriceEntry::Flat(Decimal::new(399, 0)))
        );
        assert_eq!(
            table
                .get(SizeBucket::From2500To3500, ServiceId::VirtualStaging)
                .map(ToString::to_string),
            Some("29/image".to_string())
        );
    }

    #[test]
    fn missing_entries_lists_gaps() {
        let mut table = PriceTable::fallback();

        for bucket in SizeBucket::ALL {
            for service in ServiceId::ALL {
                if (bucket, service) != (SizeBucket::Under1500, ServiceId::FloorPlan) {
                    table.insert(bucket, service, PriceEntry::Flat(Decimal::ONE));
                }
            }
        }

        assert_eq!(
            table.missing_entries(),
            vec![(SizeBucket::Under1500, ServiceId::FloorPlan)]
        );
    }

    #[test]
    fn missing_entries_covers_buckets_absent_from_source() -> TestResult {
        let rows: String = ServiceId::ALL
            .iter()
            .map(|service| format!("  - service: {}\n    prices: [100]\n", service.display_name()))
            .collect();
        let sheet = format!("columns: [\"Under 1500\"]\nrows:\n{rows}");

        let table = PriceTableParser::parse(&sheet, SourceFormat::Yaml)?;
        let missing = table.missing_entries();

        assert_eq!(table.bucket_count(), 1);
        assert_eq!(missing.len(), 4 * ServiceId::ALL.len());
        assert!(missing.iter().all(|(bucket, _)| *bucket != SizeBucket::Under1500));
        assert!(missing.contains(&(SizeBucket::From1500To2500, ServiceId::HdrPhotography)));

        Ok(())
    }

    #[test]
    fn load_reads_yaml_sheets_by_extension() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("prices.yml");

        fs::write(
            &path,
            "columns: [\"Under 1500\"]\nrows:\n  - service: HDR Photography\n    prices: [175]\n",
        )?;

        let table = PriceTable::load(&path)?;

        assert_eq!(
            table.get(SizeBucket::Under1500, ServiceId::HdrPhotography),
            Some(&PriceEntry::Flat(Decimal::new(175, 0)))
        );

        Ok(())
    }

    #[test]
    fn load_or_fallback_returns_empty_table_for_missing_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let table = PriceTable::load_or_fallback(dir.path().join("missing.html"));

        assert_eq!(table, PriceTable::fallback());

        Ok(())
    }
}
