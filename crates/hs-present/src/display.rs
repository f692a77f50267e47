//! Render-ready table model.
//!
//! Derived on every presentation call and never persisted.

use serde::Serialize;

use crate::color_band::Rgb;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayGroup {
    pub label: String,
    pub columns: Vec<DisplayColumn>,
    pub rows: Vec<DisplayRow>,
}

impl DisplayGroup {
    pub fn total_row(&self) -> Option<&DisplayRow> {
        self.rows.last().filter(|r| r.is_total)
    }

    pub fn column_keys(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.key.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayColumn {
    pub key: String,
    pub header: String,
    /// Position of the column in the group's original column order.
    pub source_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    pub is_total: bool,
    /// Background applied to the row; band color for data rows, the fixed
    /// highlight for the total row.
    pub background: Option<Rgb>,
    pub cells: Vec<DisplayCell>,
}

impl DisplayRow {
    pub fn texts(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayCell {
    pub text: String,
    pub background: Option<Rgb>,
    pub bold: bool,
}
