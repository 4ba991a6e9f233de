//! Ready-made leaf transformations.
//!
//! Each function returns a closure usable with [`super::TransformationSpec::leaf`]. Leaves are
//! lenient: a value of the wrong kind is returned unchanged (a cheap, sharing clone).

use crate::types::Value;

/// Trim leading and trailing whitespace from strings.
pub fn trim() -> impl Fn(&Value) -> Value + Send + Sync + 'static {
    |v: &Value| match v {
        Value::Utf8(s) if s.trim().len() != s.len() => Value::from(s.trim()),
        other => other.clone(),
    }
}

/// Uppercase strings.
pub fn to_upper() -> impl Fn(&Value) -> Value + Send + Sync + 'static {
    |v: &Value| match v {
        Value::Utf8(s) => Value::from(s.to_uppercase()),
        other => other.clone(),
    }
}

/// Lowercase strings.
pub fn to_lower() -> impl Fn(&Value) -> Value + Send + Sync + 'static {
    |v: &Value| match v {
        Value::Utf8(s) => Value::from(s.to_lowercase()),
        other => other.clone(),
    }
}

/// Negate booleans.
pub fn not() -> impl Fn(&Value) -> Value + Send + Sync + 'static {
    |v: &Value| match v {
        Value::Bool(b) => Value::Bool(!b),
        other => other.clone(),
    }
}

/// Replace any value with `value`.
pub fn always(value: impl Into<Value>) -> impl Fn(&Value) -> Value + Send + Sync + 'static {
    let value = value.into();
    move |_: &Value| value.clone()
}

/// Add `by` to numbers.
///
/// Integer plus integer stays an integer (promoted to float on overflow); any float operand makes
/// the result a float.
pub fn add(by: impl Into<Value>) -> impl Fn(&Value) -> Value + Send + Sync + 'static {
    let by = by.into();
    move |v: &Value| arithmetic(v, &by, i64::checked_add, |a, b| a + b)
}

/// Multiply numbers by `by`, with the same promotion rules as [`add`].
pub fn multiply(by: impl Into<Value>) -> impl Fn(&Value) -> Value + Send + Sync + 'static {
    let by = by.into();
    move |v: &Value| arithmetic(v, &by, i64::checked_mul, |a, b| a * b)
}

fn arithmetic(
    v: &Value,
    by: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Value {
    match (v, by) {
        (Value::Int64(a), Value::Int64(b)) => match int_op(*a, *b) {
            Some(n) => Value::Int64(n),
            None => Value::Float64(float_op(*a as f64, *b as f64)),
        },
        (Value::Int64(_) | Value::Float64(_), Value::Int64(_) | Value::Float64(_)) => {
            match (v.as_f64(), by.as_f64()) {
                (Some(a), Some(b)) => Value::Float64(float_op(a, b)),
                _ => v.clone(),
            }
        }
        _ => v.clone(),
    }
}
