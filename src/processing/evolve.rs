//! Recursive evolve of a [`Value`] by a [`TransformationSpec`].
//!
//! For every key of the source map, in the source's own order:
//!
//! - a [`Transformation::Leaf`] replaces the value with `leaf(value)`;
//! - a [`Transformation::Nested`] spec is applied recursively to the value;
//! - anything else (no entry, or a [`Transformation::Constant`]) copies the value unchanged.
//!
//! Keys that only exist in the spec are never visited, so their leaves are never called.
//! Untransformed values are cloned, which shares their allocation rather than copying it.
//!
//! ## Lists
//!
//! A list is walked like a map keyed by its indices (`"0"`, `"1"`, ...), and the result is a
//! map: `{a: {"0": inc}}` against `{a: [1, 2]}` gives `{a: {"0": 2, "1": 2}}`.
//!
//! ## Mismatched nesting
//!
//! A nested spec applied to a scalar (e.g. `{a: {b: inc}}` against `{a: 5}`) produces an
//! **empty map**: the walk iterates the keys of a scalar, of which there are none. This is
//! counter-intuitive but it is what [`evolve()`] does. [`try_evolve`] makes the choice explicit
//! through [`MismatchPolicy`]. The same rule applies to a scalar top-level source.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{EvolveError, EvolveResult};
use crate::transform::{Leaf, Transformation, TransformationSpec};
use crate::types::{Map, Value};

/// What to do when a nested spec meets a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Produce an empty map, exactly like [`evolve()`].
    #[default]
    EmptyMap,
    /// Keep the source value unchanged.
    PassThrough,
    /// Fail with [`EvolveError::InvalidArgument`] naming the offending path.
    Reject,
}

/// Options for [`try_evolve`].
///
/// Deserializable, so it can live in a caller's config file:
/// `{"on_mismatch": "reject"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolveOptions {
    /// Behavior for nested specs applied to scalars (including a scalar root).
    pub on_mismatch: MismatchPolicy,
}

impl EvolveOptions {
    /// Options that reject mismatched nesting.
    pub fn strict() -> Self {
        Self {
            on_mismatch: MismatchPolicy::Reject,
        }
    }
}

/// Evolve `source` with `spec`.
///
/// Total: never fails and never mutates its inputs. A list `source` is keyed by index; a scalar
/// `source` yields an empty map.
///
/// ```rust
/// use data_evolve::processing::evolve;
/// use data_evolve::transform::{leaves, TransformationSpec};
/// use data_evolve::types::{Map, Value};
///
/// let spec = TransformationSpec::new().leaf("firstName", leaves::trim());
/// let tomato = Value::map(Map::from([
///     ("firstName", Value::from("  Tomato ")),
///     ("age", Value::from(4)),
/// ]));
///
/// let out = evolve(&spec, &tomato);
/// assert_eq!(
///     out,
///     Value::map(Map::from([("firstName", Value::from("Tomato")), ("age", Value::from(4))]))
/// );
/// ```
pub fn evolve(spec: &TransformationSpec, source: &Value) -> Value {
    match source {
        Value::Map(map) => Value::map(evolve_map(spec, map)),
        Value::List(items) => Value::map(evolve_map(spec, &list_as_map(items))),
        _ => Value::map(Map::new()),
    }
}

/// Evolve a map directly. Same semantics as [`evolve()`].
pub fn evolve_map(spec: &TransformationSpec, source: &Map) -> Map {
    let mut out = Map::with_capacity(source.len());
    for (key, value) in source.entries() {
        let evolved = match spec.get(key) {
            Some(Transformation::Leaf(leaf)) => leaf.call(value),
            Some(Transformation::Nested(nested)) => evolve(nested, value),
            Some(Transformation::Constant(_)) | None => value.clone(),
        };
        out.push_unique(Arc::clone(key), evolved);
    }
    out
}

/// Evolve `source` with `spec`, handling mismatched nesting per `options`.
///
/// With the default options this returns `Ok(evolve(spec, source))`.
pub fn try_evolve(
    spec: &TransformationSpec,
    source: &Value,
    options: &EvolveOptions,
) -> EvolveResult<Value> {
    match source {
        Value::Map(map) => try_evolve_map(spec, map, options).map(Value::map),
        Value::List(items) => try_evolve_map(spec, &list_as_map(items), options).map(Value::map),
        other => match options.on_mismatch {
            MismatchPolicy::EmptyMap => Ok(Value::map(Map::new())),
            MismatchPolicy::PassThrough => Ok(other.clone()),
            MismatchPolicy::Reject => Err(EvolveError::InvalidArgument {
                path: "$".to_string(),
                message: format!("expected a map or list to evolve, found {}", other.kind()),
            }),
        },
    }
}

fn try_evolve_map(
    spec: &TransformationSpec,
    source: &Map,
    options: &EvolveOptions,
) -> EvolveResult<Map> {
    let mut out = Map::with_capacity(source.len());
    for (key, value) in source.entries() {
        let evolved = match spec.get(key) {
            Some(Transformation::Leaf(leaf)) => leaf.call(value),
            Some(Transformation::Nested(nested)) => try_evolve(nested, value, options)
                .map_err(|e| e.within(&format!("$.{key}")))?,
            Some(Transformation::Constant(_)) | None => value.clone(),
        };
        out.push_unique(Arc::clone(key), evolved);
    }
    Ok(out)
}

/// Index-keyed view of a list. Items are shared, not copied.
fn list_as_map(items: &[Value]) -> Map {
    let mut out = Map::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        out.push_unique(Arc::from(i.to_string()), item.clone());
    }
    out
}

/// Partially apply [`evolve()`]: bind the spec now, supply the source later.
///
/// `evolver(spec).apply(&source)` equals `evolve(&spec, &source)`.
pub fn evolver(spec: TransformationSpec) -> Evolver {
    Evolver::new(spec)
}

/// A [`TransformationSpec`] bound for repeated use.
///
/// Cloning is cheap; the spec is shared.
#[derive(Debug, Clone)]
pub struct Evolver {
    spec: Arc<TransformationSpec>,
    options: EvolveOptions,
}

impl Evolver {
    pub fn new(spec: TransformationSpec) -> Self {
        Self {
            spec: Arc::new(spec),
            options: EvolveOptions::default(),
        }
    }

    /// Set the options used by [`Evolver::try_apply`].
    pub fn with_options(mut self, options: EvolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn spec(&self) -> &TransformationSpec {
        &self.spec
    }

    pub fn options(&self) -> &EvolveOptions {
        &self.options
    }

    /// See [`evolve()`].
    pub fn apply(&self, source: &Value) -> Value {
        evolve(&self.spec, source)
    }

    /// See [`evolve_map`].
    pub fn apply_map(&self, source: &Map) -> Map {
        evolve_map(&self.spec, source)
    }

    /// See [`try_evolve`]; uses the options set with [`Evolver::with_options`].
    pub fn try_apply(&self, source: &Value) -> EvolveResult<Value> {
        try_evolve(&self.spec, source, &self.options)
    }

    /// Turn this evolver into a leaf, so it can be used inside another spec.
    pub fn into_leaf(self) -> Leaf {
        Leaf::new(move |v: &Value| self.apply(v))
    }
}

impl From<Evolver> for Transformation {
    fn from(v: Evolver) -> Self {
        Transformation::Leaf(v.into_leaf())
    }
}
