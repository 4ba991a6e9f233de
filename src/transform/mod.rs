//! Transformation trees.
//!
//! A [`TransformationSpec`] maps keys to [`Transformation`]s. Each entry is either a [`Leaf`]
//! function applied to the matching source value, a nested spec applied recursively, or a plain
//! [`Value`] that never transforms anything (the source value passes through).
//!
//! ```rust
//! use data_evolve::transform::{leaves, TransformationSpec};
//!
//! let spec = TransformationSpec::new()
//!     .leaf("firstName", leaves::trim())
//!     .nested(
//!         "data",
//!         TransformationSpec::new()
//!             .leaf("elapsed", leaves::add(1))
//!             .leaf("remaining", leaves::add(-1)),
//!     );
//! assert_eq!(spec.len(), 2);
//! ```

pub mod leaves;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::types::Value;

/// Signature of a leaf transformation.
pub type LeafFn = dyn Fn(&Value) -> Value + Send + Sync;

/// A shared unary transformation `Value -> Value`.
#[derive(Clone)]
pub struct Leaf(Arc<LeafFn>);

impl Leaf {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Apply the transformation.
    pub fn call(&self, value: &Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Leaf(..)")
    }
}

/// A single entry of a [`TransformationSpec`].
#[derive(Debug, Clone)]
pub enum Transformation {
    /// Applied to the source value directly.
    Leaf(Leaf),
    /// Applied recursively to the source value.
    Nested(TransformationSpec),
    /// Not a transformation: the source value is copied unchanged.
    Constant(Value),
}

impl Transformation {
    pub fn leaf<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Transformation::Leaf(Leaf::new(f))
    }
}

impl From<Leaf> for Transformation {
    fn from(v: Leaf) -> Self {
        Transformation::Leaf(v)
    }
}

impl From<TransformationSpec> for Transformation {
    fn from(v: TransformationSpec) -> Self {
        Transformation::Nested(v)
    }
}

impl From<Value> for Transformation {
    fn from(v: Value) -> Self {
        Transformation::Constant(v)
    }
}

/// A possibly-nested mapping from key to [`Transformation`].
///
/// Cloning copies the key structure but shares the leaves.
#[derive(Debug, Clone, Default)]
pub struct TransformationSpec {
    entries: BTreeMap<String, Transformation>,
}

impl TransformationSpec {
    /// Create an empty spec. Evolving with it copies every source key unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a leaf transformation for `key`.
    pub fn leaf<F>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.entries.insert(key.into(), Transformation::leaf(f));
        self
    }

    /// Add (or replace) a nested spec for `key`.
    pub fn nested(mut self, key: impl Into<String>, spec: TransformationSpec) -> Self {
        self.entries.insert(key.into(), Transformation::Nested(spec));
        self
    }

    /// Add (or replace) a non-transforming entry for `key`.
    pub fn constant(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries
            .insert(key.into(), Transformation::Constant(value.into()));
        self
    }

    /// Insert an entry, returning the one it replaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        transformation: impl Into<Transformation>,
    ) -> Option<Transformation> {
        self.entries.insert(key.into(), transformation.into())
    }

    pub fn get(&self, key: &str) -> Option<&Transformation> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate keys (sorted).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
