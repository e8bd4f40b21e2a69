pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Round every decimal string inside the "result" section to `dp` places.
pub fn round_decimals(value: &mut Value, dp: u32) {
    if let Some(result) = value.get_mut("result") {
        round_in_place(result, dp);
    }
}

fn round_in_place(value: &mut Value, dp: u32) {
    match value {
        Value::String(s) => {
            if let Ok(d) = s.parse::<Decimal>() {
                *s = d.round_dp(dp).to_string();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| round_in_place(v, dp)),
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                // labels and names are identifiers, even when numeric-looking
                if key != "label" && key != "name" && key != "contributors" && key != "roster" {
                    round_in_place(v, dp);
                }
            }
        }
        _ => {}
    }
}

/// The row set that best represents a result: impact scenarios, the portfolio
/// schedule, or a single loan's schedule.
pub fn primary_rows(result: &Value) -> Option<&Vec<Value>> {
    result
        .pointer("/impacts/scenarios")
        .or_else(|| result.pointer("/portfolio/records"))
        .or_else(|| result.get("records"))
        .and_then(Value::as_array)
}

/// Scalar summary fields of a result (totals, durations), skipping nested data.
pub fn summary_fields(result: &Value) -> Vec<(String, Value)> {
    let source = result.get("portfolio").unwrap_or(result);
    match source {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_array() && !v.is_object())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Flatten one level of nested objects into "parent.child" keys.
pub fn flatten_row(row: &Value) -> Map<String, Value> {
    let mut flat = Map::new();
    if let Value::Object(map) = row {
        for (key, val) in map {
            match val {
                Value::Object(inner) => {
                    for (inner_key, inner_val) in inner {
                        flat.insert(format!("{key}.{inner_key}"), inner_val.clone());
                    }
                }
                _ => {
                    flat.insert(key.clone(), val.clone());
                }
            }
        }
    }
    flat
}

/// Column headers in first-seen order across all rows.
pub fn row_headers(rows: &[Map<String, Value>]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    headers
}

/// Render a JSON value as a plain cell string.
pub fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(cell).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
