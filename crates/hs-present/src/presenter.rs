//! Result table presentation.
//!
//! Turns raw result groups into [`DisplayGroup`]s:
//!
//! 1. Rows with nothing informative outside the discriminant column are
//!    dropped, and a group left with no rows is dropped entirely.
//! 2. Unless all columns are shown, columns at the hidden positions (counted
//!    in the original column order) are left out of the view.
//! 3. The last surviving row is the total row. It is labelled `Total`, bold,
//!    and highlighted on every visible cell.
//! 4. Other rows show the discriminant with an inch mark and are tinted from
//!    the color band on their first two visible cells.
//! 5. Numeric non-discriminant cells are rounded to integers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use hs_results::{ResultGroup, Row, Scalar, decode_groups, format_number};

use crate::color_band::{ColorBand, Rgb};
use crate::display::{DisplayCell, DisplayColumn, DisplayGroup, DisplayRow};
use crate::error::{PresentError, PresentResult};

pub const TOTAL_LABEL: &str = "Total";
pub const TOTAL_HIGHLIGHT: Rgb = Rgb(255, 255, 153);

/// Number of leading visible columns that carry the band tint.
const TINTED_COLUMNS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentOptions {
    pub show_all_columns: bool,
    /// Column positions hidden when `show_all_columns` is false.
    pub hidden_column_indexes: Vec<usize>,
    pub header_labels: BTreeMap<String, String>,
}

impl Default for PresentOptions {
    fn default() -> Self {
        Self {
            show_all_columns: false,
            hidden_column_indexes: vec![2, 6],
            header_labels: BTreeMap::new(),
        }
    }
}

impl PresentOptions {
    pub fn all_columns(mut self) -> Self {
        self.show_all_columns = true;
        self
    }

    fn is_visible(&self, index: usize) -> bool {
        self.show_all_columns || !self.hidden_column_indexes.contains(&index)
    }

    fn header_for(&self, key: &str) -> String {
        self.header_labels
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultTablePresenter {
    band: ColorBand,
}

impl ResultTablePresenter {
    pub fn new(band: ColorBand) -> Self {
        Self { band }
    }

    pub fn band(&self) -> &ColorBand {
        &self.band
    }

    /// Present raw JSON. Fails only when the input is not an array of groups.
    pub fn present_value(
        &self,
        raw: &Value,
        options: &PresentOptions,
    ) -> PresentResult<Vec<DisplayGroup>> {
        let groups = decode_groups(raw).map_err(|e| PresentError::InvalidInput {
            what: e.to_string(),
        })?;
        Ok(self.present(&groups, options))
    }

    pub fn present(&self, groups: &[ResultGroup], options: &PresentOptions) -> Vec<DisplayGroup> {
        groups
            .iter()
            .filter_map(|group| self.present_group(group, options))
            .collect()
    }

    fn present_group(&self, group: &ResultGroup, options: &PresentOptions) -> Option<DisplayGroup> {
        let discriminant = group.discriminant_column()?;

        let rows: Vec<&Row> = group
            .rows
            .iter()
            .filter_map(|r| r.as_row())
            .filter(|row| is_informative(row, discriminant))
            .collect();
        if rows.is_empty() {
            return None;
        }

        let columns: Vec<DisplayColumn> = group
            .columns
            .iter()
            .enumerate()
            .filter(|(index, _)| options.is_visible(*index))
            .map(|(index, key)| DisplayColumn {
                key: key.clone(),
                header: options.header_for(key),
                source_index: index,
            })
            .collect();

        let last = rows.len() - 1;
        let rows = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                if i == last {
                    total_row(row, &columns)
                } else {
                    self.data_row(row, discriminant, &columns)
                }
            })
            .collect();

        Some(DisplayGroup {
            label: group.label.clone(),
            columns,
            rows,
        })
    }

    fn data_row(&self, row: &Row, discriminant: &str, columns: &[DisplayColumn]) -> DisplayRow {
        let background = row
            .get(discriminant)
            .and_then(|v| self.band.color_for(&v.to_text()));

        let cells = columns
            .iter()
            .enumerate()
            .map(|(position, column)| {
                let value = row.get(&column.key);
                let text = if column.source_index == 0 {
                    discriminant_text(value)
                } else {
                    value_text(value)
                };
                DisplayCell {
                    text,
                    background: if position < TINTED_COLUMNS {
                        background
                    } else {
                        None
                    },
                    bold: false,
                }
            })
            .collect();

        DisplayRow {
            is_total: false,
            background,
            cells,
        }
    }
}

fn total_row(row: &Row, columns: &[DisplayColumn]) -> DisplayRow {
    let cells = columns
        .iter()
        .map(|column| DisplayCell {
            text: if column.source_index == 0 {
                TOTAL_LABEL.to_string()
            } else {
                value_text(row.get(&column.key))
            },
            background: Some(TOTAL_HIGHLIGHT),
            bold: true,
        })
        .collect();

    DisplayRow {
        is_total: true,
        background: Some(TOTAL_HIGHLIGHT),
        cells,
    }
}

/// A row is informative when any non-discriminant cell is non-empty and non-zero.
pub fn is_informative(row: &Row, discriminant: &str) -> bool {
    row.cells
        .iter()
        .any(|(key, value)| key != discriminant && value.is_informative())
}

fn discriminant_text(value: Option<&Scalar>) -> String {
    match value {
        None | Some(Scalar::Null) => String::new(),
        Some(v) => format!("{}\"", v.to_text()),
    }
}

fn value_text(value: Option<&Scalar>) -> String {
    match value {
        Some(Scalar::Number(n)) => format_number(round_half_up(*n)),
        Some(Scalar::Text(s)) => s.clone(),
        Some(Scalar::Null) | None => String::new(),
    }
}

/// Ties go toward positive infinity. `v - floor(v)` is exact, so values just
/// below a half are not pushed over it by the addition.
fn round_half_up(v: f64) -> f64 {
    let floor = v.floor();
    if v - floor >= 0.5 { floor + 1.0 } else { floor }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, Scalar)]) -> Row {
        cells
            .iter()
            .fold(Row::new(), |r, (k, v)| r.with(*k, v.clone()))
    }

    #[test]
    fn zero_and_empty_values_are_not_informative() {
        let r = row(&[
            ("diam_in", Scalar::Number(2.0)),
            ("count", Scalar::Number(0.0)),
            ("note", Scalar::Text(String::new())),
            ("mean", Scalar::Null),
        ]);
        assert!(!is_informative(&r, "diam_in"));
    }

    #[test]
    fn discriminant_alone_is_not_informative() {
        let r = row(&[("diam_in", Scalar::Number(2.0))]);
        assert!(!is_informative(&r, "diam_in"));
    }

    #[test]
    fn any_text_or_nonzero_is_informative() {
        assert!(is_informative(
            &row(&[("diam_in", Scalar::Null), ("note", Scalar::Text("x".into()))]),
            "diam_in"
        ));
        assert!(is_informative(
            &row(&[("diam_in", Scalar::Null), ("count", Scalar::Number(-1.0))]),
            "diam_in"
        ));
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(value_text(Some(&Scalar::Number(2.5))), "3");
        assert_eq!(value_text(Some(&Scalar::Number(2.49))), "2");
        assert_eq!(value_text(Some(&Scalar::Number(-2.5))), "-2");
        assert_eq!(value_text(Some(&Scalar::Number(-0.2))), "0");
        assert_eq!(value_text(Some(&Scalar::Number(0.49999999999999994))), "0");
        assert_eq!(value_text(Some(&Scalar::Number(-0.5))), "0");
        assert_eq!(value_text(None), "");
    }

    #[test]
    fn discriminant_gets_inch_mark() {
        assert_eq!(discriminant_text(Some(&Scalar::Number(1.0))), "1\"");
        assert_eq!(discriminant_text(Some(&Scalar::Number(1.75))), "1.75\"");
        assert_eq!(discriminant_text(Some(&Scalar::Null)), "");
    }

    #[test]
    fn default_options_hide_quartile_columns() {
        let options = PresentOptions::default();
        assert!(options.is_visible(0));
        assert!(!options.is_visible(2));
        assert!(!options.is_visible(6));
        assert!(options.clone().all_columns().is_visible(6));
    }
}
