//! Volume Discounts
//!
//! Larger orders earn a percentage off the whole order. The tier is chosen
//! from the pre-discount subtotal exactly once; discounts never compound.
//!
//! | Subtotal      | Discount |
//! |---------------|----------|
//! | >= $1,100.00  | 17%      |
//! | >= $900.00    | 15%      |
//! | >= $700.00    | 12%      |
//! | >= $500.00    | 10%      |
//! | >= $350.00    | 5%       |
//! | >= $199.99    | 3%       |
//! | otherwise     | 0%       |

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Discounts are only defined for non-negative subtotals.
    #[error("subtotal must not be negative (got {0} minor units)")]
    NegativeSubtotal(i64),

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// One breakpoint of the volume discount schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountTier {
    /// Inclusive lower bound, in minor units (cents).
    pub threshold_minor: i64,

    /// Whole percentage points taken off.
    pub percent_points: u32,
}

impl DiscountTier {
    /// Discount rate as a [`Percentage`].
    pub fn percent(&self) -> Percentage {
        Percentage::from(Decimal::new(i64::from(self.percent_points), 2))
    }
}

/// Breakpoints, highest first.
pub const VOLUME_DISCOUNT_TIERS: [DiscountTier; 6] = [
    DiscountTier {
        threshold_minor: 110_000,
        percent_points: 17,
    },
    DiscountTier {
        threshold_minor: 90_000,
        percent_points: 15,
    },
    DiscountTier {
        threshold_minor: 70_000,
        percent_points: 12,
    },
    DiscountTier {
        threshold_minor: 50_000,
        percent_points: 10,
    },
    DiscountTier {
        threshold_minor: 35_000,
        percent_points: 5,
    },
    DiscountTier {
        threshold_minor: 19_999,
        percent_points: 3,
    },
];

/// Highest tier whose threshold `subtotal_minor` reaches, if any.
pub fn tier_for(subtotal_minor: i64) -> Option<&'static DiscountTier> {
    VOLUME_DISCOUNT_TIERS
        .iter()
        .find(|tier| subtotal_minor >= tier.threshold_minor)
}

/// The next tier up from `subtotal_minor`, and how far away it is in minor units.
pub fn next_tier(subtotal_minor: i64) -> Option<(&'static DiscountTier, i64)> {
    VOLUME_DISCOUNT_TIERS
        .iter()
        .rev()
        .find(|tier| subtotal_minor < tier.threshold_minor)
        .map(|tier| (tier, tier.threshold_minor - subtotal_minor))
}

/// Result of applying the volume discount to a subtotal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeDiscount<'a> {
    subtotal: Money<'a, Currency>,
    percent_points: u32,
    discount: Money<'a, Currency>,
    final_total: Money<'a, Currency>,
}

impl<'a> VolumeDiscount<'a> {
    /// Pre-discount subtotal the tier was chosen from.
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Whole percentage points taken off (0 when no tier applies).
    pub fn percent_points(&self) -> u32 {
        self.percent_points
    }

    /// Amount taken off, rounded to the cent.
    pub fn discount(&self) -> Money<'a, Currency> {
        self.discount
    }

    /// Subtotal minus discount.
    pub fn final_total(&self) -> Money<'a, Currency> {
        self.final_total
    }

    /// Whether any discount applies.
    pub fn is_discounted(&self) -> bool {
        self.percent_points > 0
    }
}

/// Apply the volume discount schedule to a pre-discount subtotal.
///
/// `discount = round(subtotal * percent / 100, 2)` and
/// `final_total = subtotal - discount`.
///
/// # Errors
///
/// - [`DiscountError::NegativeSubtotal`]: `subtotal` is below zero.
/// - [`DiscountError::PercentConversion`]: the discount cannot be represented in minor units.
/// - [`DiscountError::Money`]: money arithmetic failed.
pub fn apply_volume_discount(
    subtotal: Money<'_, Currency>,
) -> Result<VolumeDiscount<'_>, DiscountError> {
    let subtotal_minor = subtotal.to_minor_units();

    if subtotal_minor < 0 {
        return Err(DiscountError::NegativeSubtotal(subtotal_minor));
    }

    let (percent_points, discount_minor) = match tier_for(subtotal_minor) {
        Some(tier) => (
            tier.percent_points,
            percent_of_minor(&tier.percent(), subtotal_minor)?,
        ),
        None => (0, 0),
    };

    let discount = Money::from_minor(discount_minor, subtotal.currency());
    let final_total = subtotal.sub(discount)?;

    Ok(VolumeDiscount {
        subtotal,
        percent_points,
        discount,
        final_total,
    })
}

/// Calculate a percentage of a minor unit amount, rounded half away from zero.
pub(crate) fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage does not expose the inner Decimal
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    fn usd(minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, USD)
    }

    #[test]
    fn tier_boundaries_are_inclusive() {
        let points = |minor| tier_for(minor).map_or(0, |tier| tier.percent_points);

        assert_eq!(points(19_998), 0);
        assert_eq!(points(19_999), 3);
        assert_eq!(points(34_999), 3);
        assert_eq!(points(35_000), 5);
        assert_eq!(points(50_000), 10);
        assert_eq!(points(70_000), 12);
        assert_eq!(points(90_000), 15);
        assert_eq!(points(109_999), 15);
        assert_eq!(points(110_000), 17);
        assert_eq!(points(10_000_000), 17);
    }

    #[test]
    fn tiers_are_monotonic_in_subtotal() {
        let mut previous = 0;

        for minor in (0..150_000).step_by(7) {
            let points = tier_for(minor).map_or(0, |tier| tier.percent_points);

            assert!(points >= previous, "discount dropped at {minor}");

            previous = points;
        }
    }

    #[test]
    fn apply_volume_discount_rounds_to_the_cent() -> TestResult {
        let result = apply_volume_discount(usd(32_800))?;

        assert_eq!(result.percent_points(), 3);
        assert_eq!(result.discount(), usd(984));
        assert_eq!(result.final_total(), usd(31_816));

        Ok(())
    }

    #[test]
    fn apply_volume_discount_rounds_half_away_from_zero() -> TestResult {
        // 3% of $199.99 is $5.9997
        let result = apply_volume_discount(usd(19_999))?;

        assert_eq!(result.discount(), usd(600));
        assert_eq!(result.final_total(), usd(19_399));

        Ok(())
    }

    #[test]
    fn apply_volume_discount_below_first_tier_is_zero() -> TestResult {
        let result = apply_volume_discount(usd(19_998))?;

        assert!(!result.is_discounted());
        assert_eq!(result.discount(), usd(0));
        assert_eq!(result.final_total(), usd(19_998));

        Ok(())
    }

    #[test]
    fn apply_volume_discount_rejects_negative_subtotal() {
        let result = apply_volume_discount(usd(-1));

        assert!(matches!(result, Err(DiscountError::NegativeSubtotal(-1))));
    }

    #[test]
    fn discount_is_taken_once_from_the_original_subtotal() -> TestResult {
        for minor in [19_999, 35_000, 61_234, 88_888, 110_000, 254_321] {
            let result = apply_volume_discount(usd(minor))?;

            let rate = Decimal::ONE - Decimal::new(i64::from(result.percent_points()), 2);
            let implied = Decimal::from(result.final_total().to_minor_units()) / rate;
            let drift = (implied - Decimal::from(minor)).abs();

            assert!(drift <= Decimal::ONE, "subtotal {minor} drifted by {drift}");
        }

        Ok(())
    }

    #[test]
    fn rediscounting_the_final_total_is_not_the_same_result() -> TestResult {
        let once = apply_volume_discount(usd(120_000))?;
        let twice = apply_volume_discount(once.final_total())?;

        assert_eq!(once.final_total(), usd(99_600));
        assert_ne!(twice.final_total(), once.final_total());

        Ok(())
    }

    #[test]
    fn next_tier_reports_distance_to_the_next_breakpoint() {
        assert_eq!(
            next_tier(32_800).map(|(tier, gap)| (tier.percent_points, gap)),
            Some((5, 2_200))
        );
        assert_eq!(
            next_tier(0).map(|(tier, gap)| (tier.percent_points, gap)),
            Some((3, 19_999))
        );
        assert!(next_tier(110_000).is_none());
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let percent = Percentage::from(2.0);
        let result = percent_of_minor(&percent, i64::MAX);

        assert!(matches!(result, Err(DiscountError::PercentConversion)));
    }
}
