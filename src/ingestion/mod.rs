//! Record ingestion.
//!
//! Records are loaded as dynamic [`crate::types::Value`]s ready to be evolved. See [`json`] for
//! the supported layouts.

pub mod json;

pub use json::{records_from_json_path, records_from_json_str, records_to_ndjson};
