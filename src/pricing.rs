//! Pricing Engine
//!
//! Stateless price computation over an immutable [`PriceTable`] and
//! [`PackageCatalog`]. Every method is a pure function of its arguments.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{
    Money, MoneyError,
    iso::{Currency, USD},
};
use thiserror::Error;
use tracing::debug;

use crate::{
    catalog::{PackageCatalog, PackageOffer},
    discounts::{self, DiscountError, VolumeDiscount},
    prices::PriceEntry,
    quote::Quote,
    selection::Selection,
    services::ServiceId,
    sizes::SizeBucket,
    table::PriceTable,
};

/// Errors that can occur while pricing a selection.
#[derive(Debug, Error)]
pub enum PricingError {
    /// A line or subtotal cannot be represented in minor units.
    #[error("amount {0} is out of range")]
    AmountOutOfRange(Decimal),

    /// Wrapped discount error.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// A selection line with a resolved price.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine<'a> {
    service_id: ServiceId,
    quantity: u32,
    entry: &'a PriceEntry,
    amount: Decimal,
}

impl<'a> PricedLine<'a> {
    /// Priced service
    pub fn service_id(&self) -> ServiceId {
        self.service_id
    }

    /// Quantity priced
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Table entry the line was priced from
    pub fn entry(&self) -> &'a PriceEntry {
        self.entry
    }

    /// Unit amount times quantity, unrounded.
    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

/// A selection line with no price in the chosen bucket.
///
/// Never priced at zero; it is excluded from the subtotal and reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpricedLine {
    /// Service without a price
    pub service_id: ServiceId,

    /// Quantity requested
    pub quantity: u32,

    /// Bucket that was searched
    pub bucket: SizeBucket,
}

impl fmt::Display for UnpricedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unpriced service in this size bucket: {} ({})",
            self.service_id, self.bucket
        )
    }
}

/// Itemized result of [`PricingEngine::compute_subtotal`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubtotalBreakdown<'a> {
    bucket: SizeBucket,
    lines: Vec<PricedLine<'a>>,
    unpriced: Vec<UnpricedLine>,
    subtotal: Money<'static, Currency>,
}

impl<'a> SubtotalBreakdown<'a> {
    /// Bucket the selection was priced in
    pub fn bucket(&self) -> SizeBucket {
        self.bucket
    }

    /// Priced lines, in selection order
    pub fn lines(&self) -> &[PricedLine<'a>] {
        &self.lines
    }

    /// Lines that could not be priced
    pub fn unpriced(&self) -> &[UnpricedLine] {
        &self.unpriced
    }

    /// Sum of the priced lines, rounded once to the cent.
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.subtotal
    }

    /// Whether every selected line was priced.
    pub fn is_complete(&self) -> bool {
        self.unpriced.is_empty()
    }
}

/// A package offer applicable to the bucket being quoted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackageRecommendation<'a> {
    offer: &'a PackageOffer,
    itemized_subtotal: Money<'static, Currency>,
}

impl<'a> PackageRecommendation<'a> {
    /// The recommended offer
    pub fn offer(&self) -> &'a PackageOffer {
        self.offer
    }

    /// The catalog's own savings figure: stated value minus bundle price.
    ///
    /// Not compared against [`Self::itemized_subtotal`].
    pub fn savings(&self) -> Money<'static, Currency> {
        self.offer.savings()
    }

    /// The subtotal the customer was building when the recommendation was made.
    pub fn itemized_subtotal(&self) -> Money<'static, Currency> {
        self.itemized_subtotal
    }
}

/// Computes subtotals, discounts and package recommendations.
#[derive(Debug, Clone, Copy)]
pub struct PricingEngine<'a> {
    table: &'a PriceTable,
    catalog: &'a PackageCatalog,
    currency: &'static Currency,
}

impl<'a> PricingEngine<'a> {
    /// Create an engine over a parsed table and catalog. Amounts are in USD.
    pub fn new(table: &'a PriceTable, catalog: &'a PackageCatalog) -> Self {
        Self {
            table,
            catalog,
            currency: USD,
        }
    }

    /// The price table being read from
    pub fn table(&self) -> &'a PriceTable {
        self.table
    }

    /// The package catalog being read from
    pub fn catalog(&self) -> &'a PackageCatalog {
        self.catalog
    }

    /// Price of `service_id` in `bucket`, or `None` when it is not available.
    pub fn price_for(&self, bucket: SizeBucket, service_id: ServiceId) -> Option<&'a PriceEntry> {
        self.table.get(bucket, service_id)
    }

    /// Price every line of `selection` in `bucket`.
    ///
    /// Line amounts are kept at full precision and the sum is rounded once.
    /// Lines without a price are reported in [`SubtotalBreakdown::unpriced`] and
    /// contribute nothing to the subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::AmountOutOfRange`] if a line or the subtotal
    /// overflows.
    pub fn compute_subtotal(
        &self,
        bucket: SizeBucket,
        selection: &Selection,
    ) -> Result<SubtotalBreakdown<'a>, PricingError> {
        let mut lines = Vec::with_capacity(selection.len());
        let mut unpriced = Vec::new();
        let mut total = Decimal::ZERO;

        for line in selection.lines() {
            let Some(entry) = self.price_for(bucket, line.service_id) else {
                debug!(service = %line.service_id, %bucket, "excluding unpriced line from subtotal");

                unpriced.push(UnpricedLine {
                    service_id: line.service_id,
                    quantity: line.quantity,
                    bucket,
                });

                continue;
            };

            let amount = entry
                .amount()
                .checked_mul(Decimal::from(line.quantity))
                .ok_or(PricingError::AmountOutOfRange(entry.amount()))?;

            total = total
                .checked_add(amount)
                .ok_or(PricingError::AmountOutOfRange(amount))?;

            lines.push(PricedLine {
                service_id: line.service_id,
                quantity: line.quantity,
                entry,
                amount,
            });
        }

        Ok(SubtotalBreakdown {
            bucket,
            lines,
            unpriced,
            subtotal: self.to_money(total)?,
        })
    }

    /// Apply the volume discount schedule to a subtotal.
    ///
    /// # Errors
    ///
    /// - [`DiscountError::NegativeSubtotal`]: `subtotal` is below zero.
    /// - [`DiscountError::Money`]: `subtotal` is not in the engine's currency.
    pub fn apply_volume_discount(
        &self,
        subtotal: Money<'static, Currency>,
    ) -> Result<VolumeDiscount<'static>, DiscountError> {
        if subtotal.currency().iso_alpha_code != self.currency.iso_alpha_code {
            return Err(MoneyError::CurrencyMismatch {
                expected: self.currency.iso_alpha_code,
                actual: subtotal.currency().iso_alpha_code,
            }
            .into());
        }

        discounts::apply_volume_discount(subtotal)
    }

    /// Package offers for `bucket`, each carrying the catalog's savings figure.
    ///
    /// `subtotal` is recorded on each recommendation for display; it does not
    /// affect which offers are returned or their savings.
    pub fn recommend_packages(
        &self,
        bucket: SizeBucket,
        subtotal: Money<'static, Currency>,
    ) -> Vec<PackageRecommendation<'a>> {
        self.catalog
            .offers_for(bucket)
            .into_iter()
            .map(|offer| PackageRecommendation {
                offer,
                itemized_subtotal: subtotal,
            })
            .collect()
    }

    /// Subtotal, discount and package recommendations for one selection.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the subtotal cannot be computed or discounted.
    pub fn quote(&self, bucket: SizeBucket, selection: &Selection) -> Result<Quote<'a>, PricingError> {
        let breakdown = self.compute_subtotal(bucket, selection)?;
        let discount = self.apply_volume_discount(breakdown.subtotal())?;
        let packages = self.recommend_packages(bucket, breakdown.subtotal());

        Ok(Quote::new(breakdown, discount, packages))
    }

    /// Round a full-precision amount to the cent and convert it to money.
    fn to_money(&self, amount: Decimal) -> Result<Money<'static, Currency>, PricingError> {
        let minor = amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .ok_or(PricingError::AmountOutOfRange(amount))?;

        Ok(Money::from_minor(minor, self.currency))
    }
}
