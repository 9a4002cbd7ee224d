//! Pricing Data Payload
//!
//! The JSON document served to the booking form:
//!
//! ```json
//! {
//!   "pricingData": { "Under 1500": { "hdrPhotography": 169, "virtualStaging": "29/image" } },
//!   "packagesData": [
//!     { "name": "Essentials", "sizeBucket": "Under 1500", "price": 379, "value": 427,
//!       "savings": 48, "includes": ["HDR Photography"] }
//!   ]
//! }
//! ```
//!
//! Buckets appear in size order. Columns the parser could not map to a bucket
//! follow under their original header text.

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{
    catalog::{PackageCatalog, PackageOffer},
    prices::serialize_amount,
    sizes::SizeBucket,
    table::PriceTable,
};

/// `{ pricingData, packagesData }`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingData<'a> {
    pricing_data: BucketPrices<'a>,
    packages_data: Vec<PackageData<'a>>,
}

impl<'a> PricingData<'a> {
    /// Build the payload from the loaded table and catalog.
    pub fn from_sources(table: &'a PriceTable, catalog: &'a PackageCatalog) -> Self {
        Self {
            pricing_data: BucketPrices(table),
            packages_data: catalog.offers().iter().map(PackageData::from).collect(),
        }
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Copy)]
struct BucketPrices<'a>(&'a PriceTable);

impl Serialize for BucketPrices<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let table = self.0;
        let mut map =
            serializer.serialize_map(Some(table.bucket_count() + table.unmapped_columns().len()))?;

        for (bucket, prices) in table.buckets() {
            map.serialize_entry(bucket.label(), prices)?;
        }

        for (label, prices) in table.unmapped_columns() {
            map.serialize_entry(label, prices)?;
        }

        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PackageData<'a> {
    name: &'a str,
    size_bucket: SizeBucket,
    #[serde(serialize_with = "serialize_amount")]
    price: Decimal,
    #[serde(serialize_with = "serialize_amount")]
    value: Decimal,
    #[serde(serialize_with = "serialize_amount")]
    savings: Decimal,
    includes: &'a [String],
}

impl<'a> From<&'a PackageOffer> for PackageData<'a> {
    fn from(offer: &'a PackageOffer) -> Self {
        Self {
            name: offer.name(),
            size_bucket: offer.size_bucket(),
            price: to_decimal(offer.price()),
            value: to_decimal(offer.value()),
            savings: to_decimal(offer.savings()),
            includes: offer.includes(),
        }
    }
}

fn to_decimal(money: Money<'_, Currency>) -> Decimal {
    Decimal::new(money.to_minor_units(), 2)
}
