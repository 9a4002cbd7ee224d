//! Price Sheets
//!
//! A YAML rendition of the price table, for deployments that maintain prices
//! as data rather than markup.
//!
//! ```yaml
//! columns: ["Under 1500", "1500-2500"]
//! rows:
//!   - service: HDR Photography
//!     prices: [169, 199]
//!   - service: Virtual Staging
//!     prices: [29/image, 29/image]
//! ```

use serde::Deserialize;

use crate::table::{Grid, TableError};

/// Service column label used when converting a sheet to a [`Grid`].
const SERVICE_COLUMN: &str = "Service";

/// Wrapper for a price sheet in YAML
#[derive(Debug, Deserialize)]
pub struct PriceSheet {
    /// Size-bucket column labels
    pub columns: Vec<String>,

    /// One row per service
    #[serde(default)]
    pub rows: Vec<PriceSheetRow>,
}

/// Price sheet row
#[derive(Debug, Deserialize)]
pub struct PriceSheetRow {
    /// Service name, as it would appear on the site
    pub service: String,

    /// One price token per column
    pub prices: Vec<SheetCell>,
}

/// A single price sheet cell. YAML may type a bare `169` as a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SheetCell {
    /// Integer amount
    Integer(i64),

    /// Fractional amount
    Float(f64),

    /// Text token, e.g. `29/image` or `Call`
    Text(String),

    /// Empty cell
    Empty(()),
}

impl SheetCell {
    fn into_text(self) -> String {
        match self {
            SheetCell::Integer(value) => value.to_string(),
            SheetCell::Float(value) => value.to_string(),
            SheetCell::Text(value) => value,
            SheetCell::Empty(()) => String::new(),
        }
    }
}

impl PriceSheet {
    /// Parse a price sheet from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Yaml`] if the document does not match the sheet shape.
    pub fn from_yaml(yaml: &str) -> Result<Self, TableError> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// Convert the sheet into a [`Grid`], ready for the price table parser.
    pub fn into_grid(self) -> Grid {
        let header = std::iter::once(SERVICE_COLUMN.to_string())
            .chain(self.columns)
            .collect();

        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                std::iter::once(row.service)
                    .chain(row.prices.into_iter().map(SheetCell::into_text))
                    .collect()
            })
            .collect();

        Grid::new(header, rows)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn into_grid_prefixes_service_column() -> TestResult {
        let sheet = PriceSheet::from_yaml(
            r#"
columns: ["Under 1500", "1500-2500"]
rows:
  - service: HDR Photography
    prices: [169, 199.5]
  - service: Virtual Staging
    prices: [29/image, ~]
"#,
        )?;

        let grid = sheet.into_grid();

        assert_eq!(grid.header(), ["Service", "Under 1500", "1500-2500"]);
        assert_eq!(
            grid.rows(),
            [
                vec![
                    "HDR Photography".to_string(),
                    "169".to_string(),
                    "199.5".to_string()
                ],
                vec![
                    "Virtual Staging".to_string(),
                    "29/image".to_string(),
                    String::new()
                ],
            ]
        );

        Ok(())
    }

    #[test]
    fn from_yaml_rejects_missing_columns() {
        let result = PriceSheet::from_yaml("rows: []\n");

        assert!(matches!(result, Err(TableError::Yaml(_))));
    }
}
