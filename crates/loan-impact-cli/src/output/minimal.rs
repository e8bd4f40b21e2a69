use serde_json::Value;

use super::cell;

/// Print just the key answer from the output.
///
/// Impact analyses print one `label: interest impact` line per scenario;
/// schedules print their duration and total interest.
pub fn print_minimal(value: &Value) {
    let result = value.get("result").unwrap_or(value);

    if let Some(Value::Array(rows)) = result.pointer("/impacts/scenarios") {
        for row in rows {
            let label = row.get("label").map(cell).unwrap_or_default();
            let interest = row
                .pointer("/marginal_impact/interest")
                .or_else(|| row.get("total_interest_paid"))
                .map(cell)
                .unwrap_or_default();
            println!("{}: {}", label, interest);
        }
        return;
    }

    let source = result.get("portfolio").unwrap_or(result);
    let priority_keys = ["time_to_termination", "total_interest_paid"];
    let parts: Vec<String> = priority_keys
        .iter()
        .filter_map(|key| source.get(*key).filter(|v| !v.is_null()).map(cell))
        .collect();

    if parts.is_empty() {
        println!("{}", cell(result));
    } else {
        println!("{}", parts.join(" "));
    }
}
