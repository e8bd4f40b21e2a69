use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{cell, flatten_row, primary_rows, row_headers, summary_fields};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value.get("result") {
        Some(result) => {
            print_summary(result);
            if let Some(rows) = primary_rows(result) {
                println!();
                print_rows(rows);
            }
            print_envelope(value);
        }
        None => println!("{}", value),
    }
}

fn print_summary(result: &Value) {
    let fields = summary_fields(result);
    if fields.is_empty() {
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in &fields {
        builder.push_record([key.as_str(), &cell(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    let flat: Vec<_> = rows.iter().map(flatten_row).collect();
    let headers = row_headers(&flat);
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in &flat {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(h).map(cell).unwrap_or_default())
            .collect();
        builder.push_record(record);
    }
    println!("{}", Table::from(builder));
}

fn print_envelope(value: &Value) {
    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
