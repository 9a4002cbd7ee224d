//! Grid
//!
//! A price source reduced to plain cell text: one header row followed by data
//! rows. Extraction (HTML, YAML) produces a [`Grid`]; the label and service
//! dictionaries are only applied afterwards, by the parser.

/// Rows of trimmed cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Grid {
    /// Create a grid from a header row and data rows.
    ///
    /// The first header cell labels the service column; each further cell
    /// labels one size-bucket column.
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// Header row, including the leading service-column label.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Column labels after the service column.
    pub fn column_labels(&self) -> &[String] {
        self.header.get(1..).unwrap_or_default()
    }

    /// Data rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of cells a well-formed data row carries.
    pub fn width(&self) -> usize {
        self.header.len()
    }
}
