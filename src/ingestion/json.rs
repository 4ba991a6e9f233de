//! JSON record ingestion.
//!
//! Supported inputs:
//! - A JSON array of values: `[{"a":1}, {"a":2}]` (one record per element)
//! - A single JSON value: `{"a":1}` (one record)
//! - Newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`
//!
//! Object key order is preserved, so evolving an ingested record yields keys in file order.

use std::fs;
use std::path::Path;

use crate::error::{EvolveError, EvolveResult};
use crate::types::Value;

/// Read records from a JSON/NDJSON file.
pub fn records_from_json_path(path: impl AsRef<Path>) -> EvolveResult<Vec<Value>> {
    let text = fs::read_to_string(path)?;
    records_from_json_str(&text)
}

/// Read records from an in-memory JSON/NDJSON string.
///
/// Integers above `i64::MAX` are read as [`Value::Float64`] and lose precision.
pub fn records_from_json_str(input: &str) -> EvolveResult<Vec<Value>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(EvolveError::InvalidArgument {
            path: "$".to_string(),
            message: "json input is empty".to_string(),
        });
    }

    // First try parsing as a single JSON value (array or otherwise).
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return Ok(match v {
            serde_json::Value::Array(items) => items.into_iter().map(Value::from).collect(),
            other => vec![Value::from(other)],
        });
    }

    // Fall back to NDJSON.
    let mut records = Vec::new();
    for (i, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let v = serde_json::from_str::<serde_json::Value>(line).map_err(|e| {
            EvolveError::InvalidArgument {
                path: format!("$[line {}]", i + 1),
                message: format!("invalid ndjson: {e}"),
            }
        })?;
        records.push(Value::from(v));
    }
    Ok(records)
}

/// Render records as NDJSON, one compact JSON document per line.
pub fn records_to_ndjson(records: &[Value]) -> EvolveResult<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}
