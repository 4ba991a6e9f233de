//! In-memory record transformations.
//!
//! The processing layer evolves [`crate::types::Value`] records with a
//! [`crate::transform::TransformationSpec`]. It is purely in-memory and sequential; see
//! [`crate::execution`] for chunked parallel execution over many records.
//!
//! Currently implemented:
//!
//! - [`evolve()`] / [`evolve_map`]: recursive evolve, total
//! - [`evolver`]: partial application returning an [`Evolver`]
//! - [`try_evolve`]: evolve with an explicit [`MismatchPolicy`]
//!
//! ## Example: nested evolve
//!
//! ```rust
//! use data_evolve::processing::evolve;
//! use data_evolve::transform::{leaves, TransformationSpec};
//! use data_evolve::types::{Map, Value};
//!
//! let spec = TransformationSpec::new()
//!     .leaf("firstName", leaves::trim())
//!     .leaf("lastName", leaves::trim()) // never invoked: no such key in the source
//!     .nested(
//!         "data",
//!         TransformationSpec::new()
//!             .leaf("elapsed", leaves::add(1))
//!             .leaf("remaining", leaves::add(-1)),
//!     );
//!
//! let tomato = Value::map(Map::from([
//!     ("firstName", Value::from("  Tomato ")),
//!     (
//!         "data",
//!         Value::map(Map::from([
//!             ("elapsed", Value::from(100)),
//!             ("remaining", Value::from(1400)),
//!         ])),
//!     ),
//! ]));
//!
//! let out = evolve(&spec, &tomato);
//! assert_eq!(
//!     out.to_string(),
//!     r#"{"firstName":"Tomato","data":{"elapsed":101,"remaining":1399}}"#
//! );
//! ```

pub mod evolve;

pub use evolve::{evolve, evolve_map, evolver, try_evolve, EvolveOptions, Evolver, MismatchPolicy};
