//! Size Buckets
//!
//! Every price lookup is keyed by the property's size bucket. Buckets are
//! contiguous, non-overlapping square-footage ranges; properties larger than
//! the top bucket are out of catalog and must be quoted by hand.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

/// Largest square footage that still has catalogued prices.
pub const MAX_CATALOG_SQUARE_FEET: u32 = 5_500;

/// Errors resolving a property size to a bucket.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SizeError {
    /// The property is larger than the top bucket.
    #[error("{square_feet} sq ft is outside the price catalog; contact us for a quote")]
    OutOfCatalog {
        /// Requested square footage
        square_feet: u32,
    },

    /// A label did not match any known bucket.
    #[error("unrecognised size bucket label: {0}")]
    UnknownLabel(String),
}

/// Property size bucket, ordered smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SizeBucket {
    /// Under 1,500 sq ft
    Under1500,

    /// 1,500 to 2,499 sq ft
    From1500To2500,

    /// 2,500 to 3,499 sq ft
    From2500To3500,

    /// 3,500 to 4,499 sq ft
    From3500To4500,

    /// 4,500 to 5,500 sq ft
    From4500To5500,
}

impl SizeBucket {
    /// All buckets in size order.
    pub const ALL: [SizeBucket; 5] = [
        SizeBucket::Under1500,
        SizeBucket::From1500To2500,
        SizeBucket::From2500To3500,
        SizeBucket::From3500To4500,
        SizeBucket::From4500To5500,
    ];

    /// Resolve a square footage to its bucket.
    ///
    /// Lower bounds are inclusive. The top bucket also includes its upper bound,
    /// so 5,500 sq ft is priced and 5,501 sq ft is not.
    ///
    /// # Errors
    ///
    /// Returns [`SizeError::OutOfCatalog`] for sizes above [`MAX_CATALOG_SQUARE_FEET`].
    pub fn for_square_feet(square_feet: u32) -> Result<Self, SizeError> {
        match square_feet {
            0..1_500 => Ok(SizeBucket::Under1500),
            1_500..2_500 => Ok(SizeBucket::From1500To2500),
            2_500..3_500 => Ok(SizeBucket::From2500To3500),
            3_500..4_500 => Ok(SizeBucket::From3500To4500),
            4_500..=MAX_CATALOG_SQUARE_FEET => Ok(SizeBucket::From4500To5500),
            _ => Err(SizeError::OutOfCatalog { square_feet }),
        }
    }

    /// Canonical label, as used in the pricing-data payload.
    pub const fn label(self) -> &'static str {
        match self {
            SizeBucket::Under1500 => "Under 1500",
            SizeBucket::From1500To2500 => "1500-2500",
            SizeBucket::From2500To3500 => "2500-3500",
            SizeBucket::From3500To4500 => "3500-4500",
            SizeBucket::From4500To5500 => "4500-5500",
        }
    }

    /// Look up a bucket from a header label.
    ///
    /// Accepts the canonical labels plus the verbose forms found on the
    /// marketing site: thousands separators, en/em dashes, `sq ft` suffixes
    /// and `<1500` / `0-1500` for the smallest bucket.
    pub fn from_label(label: &str) -> Option<Self> {
        match normalize_label(label).as_str() {
            "under1500" | "<1500" | "0-1500" | "lessthan1500" => {
                Some(SizeBucket::Under1500)
            }
            "1500-2500" => Some(SizeBucket::From1500To2500),
            "2500-3500" => Some(SizeBucket::From2500To3500),
            "3500-4500" => Some(SizeBucket::From3500To4500),
            "4500-5500" => Some(SizeBucket::From4500To5500),
            _ => None,
        }
    }
}

impl fmt::Display for SizeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<&str> for SizeBucket {
    type Error = SizeError;

    fn try_from(label: &str) -> Result<Self, Self::Error> {
        SizeBucket::from_label(label).ok_or_else(|| SizeError::UnknownLabel(label.to_string()))
    }
}

impl Serialize for SizeBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for SizeBucket {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;

        SizeBucket::from_label(&label)
            .ok_or_else(|| de::Error::custom(format!("unknown size bucket: {label}")))
    }
}

/// Lowercase, drop whitespace, thousands separators and area units, and fold
/// dash variants to `-`.
fn normalize_label(label: &str) -> String {
    let folded: String = label
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            other => other.to_ascii_lowercase(),
        })
        .collect();

    ["sq.ft.", "sq.ft", "sqft", "sf", "ft²", "ft2"]
        .iter()
        .fold(folded, |acc, unit| acc.replace(unit, ""))
        .replace("to", "-")
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn for_square_feet_uses_inclusive_lower_bounds() -> TestResult {
        assert_eq!(SizeBucket::for_square_feet(0)?, SizeBucket::Under1500);
        assert_eq!(SizeBucket::for_square_feet(1_499)?, SizeBucket::Under1500);
        assert_eq!(SizeBucket::for_square_feet(1_500)?, SizeBucket::From1500To2500);
        assert_eq!(SizeBucket::for_square_feet(3_500)?, SizeBucket::From3500To4500);
        assert_eq!(SizeBucket::for_square_feet(5_500)?, SizeBucket::From4500To5500);

        Ok(())
    }

    #[test]
    fn for_square_feet_rejects_sizes_above_catalog() {
        assert_eq!(
            SizeBucket::for_square_feet(5_501),
            Err(SizeError::OutOfCatalog { square_feet: 5_501 })
        );
    }

    #[test]
    fn out_of_catalog_message_asks_customer_to_contact_us() {
        let message = SizeError::OutOfCatalog { square_feet: 6_000 }.to_string();

        assert!(message.contains("contact us"), "message was: {message}");
    }

    #[test]
    fn buckets_are_totally_ordered() {
        let mut sorted = SizeBucket::ALL;
        sorted.sort();

        assert_eq!(sorted, SizeBucket::ALL);
        assert!(SizeBucket::Under1500 < SizeBucket::From4500To5500);
    }

    #[test]
    fn from_label_accepts_canonical_labels() {
        for bucket in SizeBucket::ALL {
            assert_eq!(SizeBucket::from_label(bucket.label()), Some(bucket));
        }
    }

    #[test]
    fn from_label_accepts_verbose_labels() {
        assert_eq!(
            SizeBucket::from_label("Under 1,500 sq ft"),
            Some(SizeBucket::Under1500)
        );
        assert_eq!(
            SizeBucket::from_label("1,500 \u{2013} 2,500 sq ft"),
            Some(SizeBucket::From1500To2500)
        );
        assert_eq!(
            SizeBucket::from_label("2500 to 3500 SF"),
            Some(SizeBucket::From2500To3500)
        );
        assert_eq!(SizeBucket::from_label("<1500"), Some(SizeBucket::Under1500));
    }

    #[test]
    fn from_label_rejects_unknown_labels() {
        assert_eq!(SizeBucket::from_label("5500-6500"), None);
        assert_eq!(SizeBucket::from_label("Service"), None);
    }

    #[test]
    fn try_from_reports_unknown_label() {
        assert_eq!(
            SizeBucket::try_from("Mansion"),
            Err(SizeError::UnknownLabel("Mansion".to_string()))
        );
    }
}
