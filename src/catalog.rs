//! Package Catalog
//!
//! Bundled offerings, each tied to a single size bucket, with the bundle price
//! and the a la carte value of everything it includes.

use std::{fs, path::Path};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Money, MoneyError,
    iso::{Currency, USD},
};
use serde::Deserialize;
use thiserror::Error;

use crate::sizes::SizeBucket;

/// Embedded package catalog.
const BUILTIN_CATALOG: &str = include_str!("../data/packages.yml");

/// Package catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading the catalog file
    #[error("Failed to read package catalog: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown or unsupported currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// A bundle costs more than its a la carte value.
    #[error("package {name} ({bucket}) costs more than its a la carte value")]
    NegativeSavings {
        /// Package name
        name: String,

        /// Bucket the package is offered for
        bucket: SizeBucket,
    },

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A bundled offering for one size bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageOffer {
    name: String,
    size_bucket: SizeBucket,
    price: Money<'static, Currency>,
    value: Money<'static, Currency>,
    savings: Money<'static, Currency>,
    includes: Vec<String>,
}

impl PackageOffer {
    /// Create a package offer.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NegativeSavings`]: `price` exceeds `value`.
    /// - [`CatalogError::Money`]: `price` and `value` are in different currencies.
    pub fn new(
        name: impl Into<String>,
        size_bucket: SizeBucket,
        price: Money<'static, Currency>,
        value: Money<'static, Currency>,
        includes: Vec<String>,
    ) -> Result<Self, CatalogError> {
        let name = name.into();
        let savings = value.sub(price)?;

        if savings.to_minor_units() < 0 {
            return Err(CatalogError::NegativeSavings {
                name,
                bucket: size_bucket,
            });
        }

        Ok(Self {
            name,
            size_bucket,
            price,
            value,
            savings,
            includes,
        })
    }

    /// Package name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size bucket the package is offered for
    pub fn size_bucket(&self) -> SizeBucket {
        self.size_bucket
    }

    /// Bundle price
    pub fn price(&self) -> Money<'static, Currency> {
        self.price
    }

    /// Stated a la carte value of the bundle's contents
    pub fn value(&self) -> Money<'static, Currency> {
        self.value
    }

    /// `value - price`; never negative.
    pub fn savings(&self) -> Money<'static, Currency> {
        self.savings
    }

    /// What the bundle includes, as shown to customers
    pub fn includes(&self) -> &[String] {
        &self.includes
    }
}

/// Wrapper for packages in YAML
#[derive(Debug, Deserialize)]
pub struct PackagesFixture {
    /// Package entries
    pub packages: Vec<PackageFixture>,
}

/// Package entry from YAML
#[derive(Debug, Deserialize)]
pub struct PackageFixture {
    /// Package name
    pub name: String,

    /// Size bucket label
    pub size_bucket: SizeBucket,

    /// Bundle price (e.g., "379.00 USD")
    pub price: String,

    /// A la carte value (e.g., "427.00 USD")
    pub value: String,

    /// Included items
    #[serde(default)]
    pub includes: Vec<String>,
}

impl TryFrom<PackageFixture> for PackageOffer {
    type Error = CatalogError;

    fn try_from(fixture: PackageFixture) -> Result<Self, Self::Error> {
        let price = parse_price(&fixture.price)?;
        let value = parse_price(&fixture.value)?;

        PackageOffer::new(
            fixture.name,
            fixture.size_bucket,
            price,
            value,
            fixture.includes,
        )
    }
}

/// The static list of package offers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageCatalog {
    offers: Vec<PackageOffer>,
}

impl PackageCatalog {
    /// Create a catalog from already-validated offers.
    pub fn new(offers: Vec<PackageOffer>) -> Self {
        Self { offers }
    }

    /// Load the embedded catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the embedded catalog is invalid.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// Parse a catalog from YAML.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the YAML is malformed or any offer is invalid.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let fixture: PackagesFixture = serde_norway::from_str(yaml)?;

        let offers = fixture
            .packages
            .into_iter()
            .map(PackageOffer::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { offers })
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Offers defined for `bucket`, in catalog order. Empty when the bucket has none.
    pub fn offers_for(&self, bucket: SizeBucket) -> Vec<&PackageOffer> {
        self.offers
            .iter()
            .filter(|offer| offer.size_bucket == bucket)
            .collect()
    }

    /// All offers
    pub fn offers(&self) -> &[PackageOffer] {
        &self.offers
    }

    /// Get the number of offers.
    pub fn len(&self) -> usize {
        self.offers.len()
    }

    /// Check if the catalog has no offers.
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

/// Parse a price string (e.g., "379.00 USD") into money.
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if
/// the amount is not a decimal number, or if the currency is not USD.
pub fn parse_price(s: &str) -> Result<Money<'static, Currency>, CatalogError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(CatalogError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .trim_start_matches('$')
        .parse::<Decimal>()
        .map_err(|_err| CatalogError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::new(100, 0))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| CatalogError::InvalidPrice(s.to_string()))?;

    let currency = match *currency_code {
        "USD" => USD,
        other => return Err(CatalogError::UnknownCurrency(other.to_string())),
    };

    Ok(Money::from_minor(minor_units, currency))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn usd(minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, USD)
    }

    #[test]
    fn builtin_catalog_has_offers_for_every_bucket() -> TestResult {
        let catalog = PackageCatalog::builtin()?;

        for bucket in SizeBucket::ALL {
            assert_eq!(catalog.offers_for(bucket).len(), 3, "bucket {bucket}");
        }

        Ok(())
    }

    #[test]
    fn builtin_catalog_savings_are_never_negative() -> TestResult {
        let catalog = PackageCatalog::builtin()?;

        for offer in catalog.offers() {
            assert!(
                offer.value().to_minor_units() >= offer.price().to_minor_units(),
                "{} in {} is priced above its value",
                offer.name(),
                offer.size_bucket()
            );
            assert!(offer.savings().to_minor_units() >= 0);
        }

        Ok(())
    }

    #[test]
    fn offers_for_only_returns_matching_bucket() -> TestResult {
        let catalog = PackageCatalog::builtin()?;
        let offers = catalog.offers_for(SizeBucket::Under1500);

        assert!(
            offers
                .iter()
                .all(|offer| offer.size_bucket() == SizeBucket::Under1500)
        );
        assert_eq!(
            offers.first().map(|offer| (offer.name(), offer.savings())),
            Some(("Essentials", usd(4_800)))
        );

        Ok(())
    }

    #[test]
    fn offers_for_bucket_without_packages_is_empty() -> TestResult {
        let catalog = PackageCatalog::from_yaml(
            "packages:\n  - name: Starter\n    size_bucket: Under 1500\n    price: 100.00 USD\n    value: 120.00 USD\n",
        )?;

        assert!(catalog.offers_for(SizeBucket::From4500To5500).is_empty());
        assert_eq!(catalog.len(), 1);

        Ok(())
    }

    #[test]
    fn from_yaml_rejects_bundle_priced_above_value() {
        let result = PackageCatalog::from_yaml(
            "packages:\n  - name: Oops\n    size_bucket: 1500-2500\n    price: 500.00 USD\n    value: 450.00 USD\n",
        );

        assert!(matches!(
            result,
            Err(CatalogError::NegativeSavings { bucket: SizeBucket::From1500To2500, .. })
        ));
    }

    #[test]
    fn from_yaml_rejects_unknown_bucket_label() {
        let result = PackageCatalog::from_yaml(
            "packages:\n  - name: Estate\n    size_bucket: 9000+\n    price: 1.00 USD\n    value: 2.00 USD\n",
        );

        assert!(matches!(result, Err(CatalogError::Yaml(_))));
    }

    #[test]
    fn load_reads_catalog_from_disk() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("packages.yml");

        fs::write(
            &path,
            "packages:\n  - name: Starter\n    size_bucket: 2500-3500\n    price: 400.00 USD\n    value: 450.00 USD\n    includes: [HDR Photography]\n",
        )?;

        let catalog = PackageCatalog::load(&path)?;
        let offers = catalog.offers_for(SizeBucket::From2500To3500);

        assert_eq!(offers.len(), 1);
        assert_eq!(
            offers.first().map(|offer| offer.includes().to_vec()),
            Some(vec!["HDR Photography".to_string()])
        );

        Ok(())
    }

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("379.00USD");

        assert!(matches!(result, Err(CatalogError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("379.00 GBP");

        assert!(matches!(result, Err(CatalogError::UnknownCurrency(code)) if code == "GBP"));
    }

    #[test]
    fn parse_price_accepts_dollar_prefix() -> TestResult {
        assert_eq!(parse_price("$1149.00 USD")?, usd(114_900));

        Ok(())
    }
}
