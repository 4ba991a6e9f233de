use thiserror::Error;

/// Convenience result type for fallible evolve operations.
pub type EvolveResult<T> = Result<T, EvolveError>;

/// Error type returned by the hardened evolve paths and JSON ingestion.
///
/// [`crate::processing::evolve()`] itself never fails; only [`crate::processing::try_evolve`],
/// the parallel engine's `try_` variant and the JSON helpers return this.
#[derive(Debug, Error)]
pub enum EvolveError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value did not have the shape the operation requires (e.g. a nested transformation
    /// applied to a scalar, under [`crate::processing::MismatchPolicy::Reject`]).
    #[error("invalid argument at '{path}': {message}")]
    InvalidArgument { path: String, message: String },
}

impl EvolveError {
    /// Prefix the path of an [`EvolveError::InvalidArgument`] with `prefix`.
    ///
    /// Other variants are returned unchanged.
    pub(crate) fn within(self, prefix: &str) -> Self {
        match self {
            EvolveError::InvalidArgument { path, message } => {
                let rest = path.strip_prefix('$').unwrap_or(&path);
                EvolveError::InvalidArgument {
                    path: format!("{prefix}{rest}"),
                    message,
                }
            }
            other => other,
        }
    }
}
