use serde_json::Value;
use std::io;

use super::{cell, flatten_row, primary_rows, row_headers, summary_fields};

/// Write the primary rows of a result as CSV to stdout, falling back to
/// field/value pairs when the result has no row set.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let result = value.get("result").unwrap_or(value);

    if let Some(rows) = primary_rows(result) {
        let flat: Vec<_> = rows.iter().map(flatten_row).collect();
        let headers = row_headers(&flat);
        let _ = wtr.write_record(&headers);
        for row in &flat {
            let record: Vec<String> = headers
                .iter()
                .map(|h| row.get(h).map(cell).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&record);
        }
    } else {
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in summary_fields(result) {
            let _ = wtr.write_record([key.as_str(), &cell(&val)]);
        }
    }

    let _ = wtr.flush();
}
