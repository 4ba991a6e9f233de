//! `data-evolve` recursively applies a tree of transformation functions to a matching tree of
//! dynamic values, producing a new value with the same shape where each leaf has been either
//! transformed or carried over unchanged.
//!
//! The primary entrypoint is [`processing::evolve()`]; bind a spec once with
//! [`processing::evolver`] to reuse it.
//!
//! ## Semantics
//!
//! For every key `k` of the source map (in the source's own order):
//!
//! - the spec entry for `k` is a function → the result holds `f(source[k])`;
//! - the spec entry is a nested spec → the result holds `evolve(nested, source[k])`;
//! - otherwise → the result holds `source[k]`, shared rather than copied.
//!
//! Keys only present in the spec never appear in the result and their functions are never
//! called. A list is walked like a map keyed `"0"`, `"1"`, .... A nested spec applied to a
//! scalar yields an empty map; use [`processing::try_evolve`] with a
//! [`processing::MismatchPolicy`] to choose differently.
//!
//! ## Quick example
//!
//! ```rust
//! use data_evolve::processing::{evolve, evolver};
//! use data_evolve::transform::{leaves, TransformationSpec};
//! use data_evolve::types::{Map, Value};
//!
//! let spec = TransformationSpec::new().nested(
//!     "a",
//!     TransformationSpec::new().leaf("b", leaves::add(1)),
//! );
//! let source = Value::map(Map::from([(
//!     "a",
//!     Value::map(Map::from([("b", Value::from(1)), ("c", Value::from(2))])),
//! )]));
//!
//! let out = evolve(&spec, &source);
//! assert_eq!(out.to_string(), r#"{"a":{"b":2,"c":2}}"#);
//!
//! // Partial application: bind the spec, supply the source later.
//! let inc_b = evolver(spec);
//! assert_eq!(inc_b.apply(&source), out);
//! ```
//!
//! ## Batches
//!
//! ```rust
//! use data_evolve::execution::{ExecutionEngine, ExecutionOptions};
//! use data_evolve::ingestion::records_from_json_str;
//! use data_evolve::transform::{leaves, TransformationSpec};
//!
//! # fn main() -> Result<(), data_evolve::EvolveError> {
//! let records = records_from_json_str(
//!     "{\"name\":\" Ada \",\"age\":36}\n{\"name\":\"Grace \",\"age\":45}\n",
//! )?;
//! let spec = TransformationSpec::new().leaf("name", leaves::trim());
//!
//! let engine = ExecutionEngine::new(ExecutionOptions::default());
//! let out = engine.evolve_parallel(&spec, &records);
//! assert_eq!(out[1].to_string(), r#"{"name":"Grace","age":45}"#);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: the dynamic [`types::Value`] / [`types::Map`] model
//! - [`transform`]: transformation specs and ready-made leaves
//! - [`processing`]: evolve, partial application, mismatch handling
//! - [`ingestion`]: JSON / NDJSON records in and out
//! - [`execution`]: chunked parallel evolve with metrics and observer hooks
//! - [`error`]: error types

pub mod error;
pub mod execution;
pub mod ingestion;
pub mod processing;
pub mod transform;
pub mod types;

pub use error::{EvolveError, EvolveResult};
