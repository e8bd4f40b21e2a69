use serde::de::DeserializeOwned;
use std::io::{self, Read};
use tracing::debug;

/// Deserialise a loan document piped on stdin.
/// `Ok(None)` means nothing was piped, so the caller falls back to flags.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut document = String::new();
    io::stdin().read_to_string(&mut document)?;
    let document = document.trim();
    if document.is_empty() {
        return Ok(None);
    }

    debug!(bytes = document.len(), "reading input from stdin");
    serde_json::from_str(document)
        .map(Some)
        .map_err(|e| format!("Failed to parse stdin: {e}").into())
}
