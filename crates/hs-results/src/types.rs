//! Result data types.

use std::collections::BTreeMap;

/// A single cell value as produced by the analytics pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Null,
}

impl Scalar {
    /// True when the value is neither null, an empty string, nor zero.
    pub fn is_informative(&self) -> bool {
        match self {
            Scalar::Number(n) => *n != 0.0,
            Scalar::Text(s) => !s.is_empty(),
            Scalar::Null => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Canonical text form: integral numbers print without a fractional part.
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Number(n) => format_number(*n),
            Scalar::Text(s) => s.clone(),
            Scalar::Null => String::new(),
        }
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        // -0.0 prints as "0"
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One record of a result group, keyed by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: BTreeMap<String, Scalar>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: Scalar) -> Self {
        self.cells.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.cells.get(key)
    }
}

/// A row as decoded from the payload. Rows with an unexpected shape are
/// retained so that presentation can drop them without failing the group.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRow {
    Cells(Row),
    Malformed { reason: String },
}

impl RawRow {
    pub fn as_row(&self) -> Option<&Row> {
        match self {
            RawRow::Cells(row) => Some(row),
            RawRow::Malformed { .. } => None,
        }
    }
}

impl From<Row> for RawRow {
    fn from(row: Row) -> Self {
        RawRow::Cells(row)
    }
}

/// One labelled table section, e.g. a state or county.
///
/// The first column is the discriminant (size bucket). The last row is the
/// aggregate row by position; nothing in the row content flags it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultGroup {
    pub label: String,
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl ResultGroup {
    pub fn discriminant_column(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }
}
