//! Prices
//!
//! A price table cell is either a flat amount (`$169`) or a per-unit amount
//! (`$29/image`). Cells are resolved into [`PriceEntry`] once, when the table
//! is parsed, so nothing downstream has to re-read price strings.

use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Price of one service in one size bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceEntry {
    /// A flat price, charged once per unit of quantity.
    Flat(Decimal),

    /// A price per unit of work (e.g. per image).
    PerUnit {
        /// Price of a single unit
        amount: Decimal,

        /// Unit label, e.g. `image`
        unit: String,
    },
}

impl PriceEntry {
    /// Parse a price token from a table cell.
    ///
    /// Returns `None` for anything that is not a non-negative amount, optionally
    /// followed by `/unit` or `per unit`. Placeholders such as `Call`, `TBD` or
    /// an empty cell are not prices.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();

        let per_unit = token.split_once('/').or_else(|| split_per(token));

        match per_unit {
            Some((amount, unit)) => {
                let amount = parse_amount(amount)?;
                let unit = unit.trim().to_lowercase();

                if unit.is_empty() || !unit.chars().all(|c| c.is_alphabetic() || c == ' ') {
                    return None;
                }

                Some(PriceEntry::PerUnit { amount, unit })
            }
            None => parse_amount(token).map(PriceEntry::Flat),
        }
    }

    /// Amount for a single unit (flat entries are a single unit).
    pub fn amount(&self) -> Decimal {
        match self {
            PriceEntry::Flat(amount) | PriceEntry::PerUnit { amount, .. } => *amount,
        }
    }

    /// Unit label for per-unit entries.
    pub fn unit(&self) -> Option<&str> {
        match self {
            PriceEntry::Flat(_) => None,
            PriceEntry::PerUnit { unit, .. } => Some(unit),
        }
    }

    /// Whether this entry must be multiplied by an explicit quantity.
    pub fn is_per_unit(&self) -> bool {
        matches!(self, PriceEntry::PerUnit { .. })
    }

    /// Full-precision amount for `quantity` units. No rounding is applied.
    pub fn line_amount(&self, quantity: u32) -> Decimal {
        self.amount() * Decimal::from(quantity)
    }
}

impl fmt::Display for PriceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceEntry::Flat(amount) => write!(f, "{}", amount.normalize()),
            PriceEntry::PerUnit { amount, unit } => write!(f, "{}/{unit}", amount.normalize()),
        }
    }
}

impl FromStr for PriceEntry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PriceEntry::parse(s).ok_or_else(|| format!("not a price: {s}"))
    }
}

impl Serialize for PriceEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PriceEntry::Flat(amount) => serialize_amount(amount, serializer),
            PriceEntry::PerUnit { .. } => serializer.collect_str(self),
        }
    }
}

impl<'de> Deserialize<'de> for PriceEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceEntryVisitor)
    }
}

struct PriceEntryVisitor;

impl de::Visitor<'_> for PriceEntryVisitor {
    type Value = PriceEntry;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative number or an \"<amount>/<unit>\" string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(PriceEntry::Flat(Decimal::from(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        if v < 0 {
            return Err(E::custom(format!("negative price: {v}")));
        }

        Ok(PriceEntry::Flat(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        PriceEntry::parse(v).ok_or_else(|| E::custom(format!("not a price: {v}")))
    }
}

/// Serialize an amount as a JSON-friendly number: integral amounts as
/// integers, everything else as a float.
pub(crate) fn serialize_amount<S: Serializer>(
    amount: &Decimal,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let normalized = amount.normalize();

    if normalized.scale() == 0
        && let Some(whole) = normalized.to_i64()
    {
        return serializer.serialize_i64(whole);
    }

    match normalized.to_f64() {
        Some(value) => serializer.serialize_f64(value),
        None => serializer.collect_str(&normalized),
    }
}

/// Split `29 per image` on the first ` per `, ignoring case.
fn split_per(token: &str) -> Option<(&str, &str)> {
    const SEPARATOR: &str = " per ";

    let idx = token.to_ascii_lowercase().find(SEPARATOR)?;
    let (amount, rest) = token.split_at_checked(idx)?;

    Some((amount, rest.get(SEPARATOR.len()..)?))
}

/// Parse `$1,169.50` style amounts. Negative or non-numeric input is rejected.
fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}
