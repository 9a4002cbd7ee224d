//! HTML extraction
//!
//! Pulls the pricing `<table>` out of a marketing page as a [`Grid`]. Rows and
//! cells are matched with patterns, inner markup is stripped, and a handful of
//! entities are decoded. Nothing here knows about services or size buckets.

use regex::Regex;
use tracing::debug;

use crate::table::{Grid, TableError};

const TABLE_PATTERN: &str = r"(?is)<table\b[^>]*>(.*?)</table\s*>";
const ROW_PATTERN: &str = r"(?is)<tr\b[^>]*>(.*?)</tr\s*>";
const CELL_PATTERN: &str = r"(?is)<t[hd]\b[^>]*>(.*?)</t[hd]\s*>";
const TAG_PATTERN: &str = r"(?s)<[^>]*>";

/// Extracts pricing grids from HTML.
#[derive(Debug)]
pub struct HtmlGridExtractor {
    table: Regex,
    row: Regex,
    cell: Regex,
    tag: Regex,
}

impl HtmlGridExtractor {
    /// Compile the extraction patterns.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Pattern`] if a pattern fails to compile.
    pub fn new() -> Result<Self, TableError> {
        Ok(Self {
            table: Regex::new(TABLE_PATTERN)?,
            row: Regex::new(ROW_PATTERN)?,
            cell: Regex::new(CELL_PATTERN)?,
            tag: Regex::new(TAG_PATTERN)?,
        })
    }

    /// Extract the pricing table from `html`.
    ///
    /// The pricing table is the first `<table>` whose first row has at least
    /// two cells (a service column plus one price column).
    ///
    /// # Errors
    ///
    /// - [`TableError::NoTable`]: the document contains no `<table>`.
    /// - [`TableError::NoHeader`]: no table has a usable header row.
    pub fn extract(&self, html: &str) -> Result<Grid, TableError> {
        let mut saw_table = false;

        for table in self.table.captures_iter(html) {
            saw_table = true;

            let Some(body) = table.get(1) else {
                continue;
            };

            let mut rows = self.rows(body.as_str());

            if rows.first().is_some_and(|header| header.len() >= 2) {
                let header = rows.remove(0);

                debug!(columns = header.len(), rows = rows.len(), "extracted pricing table");

                return Ok(Grid::new(header, rows));
            }
        }

        if saw_table {
            Err(TableError::NoHeader)
        } else {
            Err(TableError::NoTable)
        }
    }

    fn rows(&self, table_body: &str) -> Vec<Vec<String>> {
        self.row
            .captures_iter(table_body)
            .filter_map(|row| row.get(1))
            .map(|row| {
                self.cell
                    .captures_iter(row.as_str())
                    .filter_map(|cell| cell.get(1))
                    .map(|cell| self.cell_text(cell.as_str()))
                    .collect::<Vec<_>>()
            })
            .filter(|cells| !cells.is_empty())
            .collect()
    }

    fn cell_text(&self, inner_html: &str) -> String {
        let stripped = self.tag.replace_all(inner_html, " ");

        decode_entities(&stripped)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Decode the entities that appear in hand-written price tables.
fn decode_entities(text: &str) -> String {
    [
        ("&nbsp;", " "),
        ("&#160;", " "),
        ("&ndash;", "\u{2013}"),
        ("&#8211;", "\u{2013}"),
        ("&mdash;", "\u{2014}"),
        ("&#8212;", "\u{2014}"),
        ("&#36;", "$"),
        ("&dollar;", "$"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&amp;", "&"),
    ]
    .iter()
    .fold(text.to_string(), |acc, (entity, decoded)| {
        acc.replace(entity, decoded)
    })
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn extract_reads_header_and_rows() -> TestResult {
        let html = r#"
            <table class="prices">
              <tr><th>Service</th><th>Under 1,500&nbsp;sq ft</th></tr>
              <tr><td><strong>HDR  Photography</strong></td><td>$169</td></tr>
            </table>
        "#;

        let grid = HtmlGridExtractor::new()?.extract(html)?;

        assert_eq!(grid.header(), ["Service", "Under 1,500 sq ft"]);
        assert_eq!(grid.rows(), [vec!["HDR Photography".to_string(), "$169".to_string()]]);

        Ok(())
    }

    #[test]
    fn extract_skips_layout_tables_without_header() -> TestResult {
        let html = r"
            <table><tr><td>Logo</td></tr></table>
            <table>
              <tr><th>Service</th><th>1500-2500</th></tr>
              <tr><td>Floor Plan</td><td>$119</td></tr>
            </table>
        ";

        let grid = HtmlGridExtractor::new()?.extract(html)?;

        assert_eq!(grid.column_labels(), ["1500-2500"]);
        assert_eq!(grid.rows().len(), 1);

        Ok(())
    }

    #[test]
    fn extract_without_table_is_no_table() -> TestResult {
        let result = HtmlGridExtractor::new()?.extract("<p>Pricing coming soon</p>");

        assert!(matches!(result, Err(TableError::NoTable)));

        Ok(())
    }

    #[test]
    fn extract_with_headerless_table_is_no_header() -> TestResult {
        let result = HtmlGridExtractor::new()?.extract("<table><tr><td>only</td></tr></table>");

        assert!(matches!(result, Err(TableError::NoHeader)));

        Ok(())
    }

    #[test]
    fn decode_entities_handles_dashes_and_ampersands() {
        assert_eq!(decode_entities("1,500 &ndash; 2,500"), "1,500 \u{2013} 2,500");
        assert_eq!(decode_entities("Photo &amp; Video"), "Photo & Video");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }
}
