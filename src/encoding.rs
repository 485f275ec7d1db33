//! Per-field text normalization for upstream snapshot files.
//!
//! The daily transaction dumps are nominally Latin-1, but individual fields
//! have shown up double-encoded as UTF-8 across upstream revisions. Decoding
//! happens field by field: valid UTF-8 passes through, anything else falls
//! back to the Latin-1 byte map (total, never fails).

/// Decodes one delimited field into a `String`, trimming surrounding
/// whitespace (including the line terminator on the last field of a row).
pub fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.trim().to_string(),
        Err(_) => latin1_to_string(bytes).trim().to_string(),
    }
}

/// Maps Latin-1 bytes 1:1 onto Unicode scalar values.
fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
