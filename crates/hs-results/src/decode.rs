//! Decoding of the raw JSON output into result groups.
//!
//! Group-level structure is strict: a payload that is not an array of
//! `{label, columns, rows}` objects is rejected as a whole. Row-level shape
//! is lenient: an odd row becomes [`RawRow::Malformed`] and is left for the
//! presenter to drop.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::types::{RawRow, ResultGroup, Row, Scalar};
use crate::{ResultsError, ResultsResult};

/// Decode the output as delivered by the job service, which is either a JSON
/// document or a string holding one.
pub fn decode_payload(payload: &Value) -> ResultsResult<Vec<ResultGroup>> {
    match payload {
        Value::String(text) => {
            let parsed: Value = serde_json::from_str(text).map_err(|e| {
                ResultsError::invalid(format!("payload string is not valid JSON: {e}"))
            })?;
            decode_groups(&parsed)
        }
        other => decode_groups(other),
    }
}

/// Decode an already-parsed document.
pub fn decode_groups(value: &Value) -> ResultsResult<Vec<ResultGroup>> {
    let items = value.as_array().ok_or_else(|| {
        ResultsError::invalid(format!(
            "expected an array of result groups, found {}",
            kind_of(value)
        ))
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| decode_group(index, item))
        .collect()
}

fn decode_group(index: usize, item: &Value) -> ResultsResult<ResultGroup> {
    let obj = item.as_object().ok_or_else(|| {
        ResultsError::invalid(format!("group {index} is {}, not an object", kind_of(item)))
    })?;

    let label = match obj.get("label") {
        Some(Value::String(s)) => s.clone(),
        _ => {
            return Err(ResultsError::invalid(format!(
                "group {index} has no string 'label'"
            )));
        }
    };

    let columns = match obj.get("columns") {
        Some(Value::Array(cols)) => cols
            .iter()
            .map(|c| c.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                ResultsError::invalid(format!("group '{label}' has a non-string column key"))
            })?,
        _ => {
            return Err(ResultsError::invalid(format!(
                "group '{label}' has no 'columns' array"
            )));
        }
    };

    let rows = match obj.get("rows") {
        Some(Value::Array(rows)) => rows.iter().map(|r| decode_row(r, &columns)).collect(),
        _ => {
            return Err(ResultsError::invalid(format!(
                "group '{label}' has no 'rows' array"
            )));
        }
    };

    Ok(ResultGroup {
        label,
        columns,
        rows,
    })
}

fn decode_row(value: &Value, columns: &[String]) -> RawRow {
    match value.as_object() {
        Some(obj) => match decode_cells(obj, columns) {
            Ok(cells) => RawRow::Cells(Row { cells }),
            Err(reason) => RawRow::Malformed { reason },
        },
        None => RawRow::Malformed {
            reason: format!("row is {}, not an object", kind_of(value)),
        },
    }
}

fn decode_cells(
    obj: &Map<String, Value>,
    columns: &[String],
) -> Result<BTreeMap<String, Scalar>, String> {
    let mut cells = BTreeMap::new();
    for (key, value) in obj {
        if !columns.iter().any(|c| c == key) {
            return Err(format!("unknown column '{key}'"));
        }
        let scalar = match value {
            Value::Null => Scalar::Null,
            Value::String(s) => Scalar::Text(s.clone()),
            Value::Number(n) => match n.as_f64() {
                Some(f) => Scalar::Number(f),
                None => return Err(format!("column '{key}' holds an unrepresentable number")),
            },
            other => return Err(format!("column '{key}' holds {}", kind_of(other))),
        };
        cells.insert(key.clone(), scalar);
    }
    Ok(cells)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
