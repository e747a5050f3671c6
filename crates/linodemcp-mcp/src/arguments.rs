//! Argument decoding.
//!
//! MCP delivers tool arguments as a JSON object. [`Arguments`] owns that
//! object and offers typed accessors; request records implement
//! [`FromArguments`] on top of them so handlers only ever see typed values.
//!
//! Decoding is total and does no I/O: it yields either the typed record or
//! exactly one [`ArgumentError`] naming the first offending field.
//!
//! Rules applied by every accessor:
//! - `null` is treated the same as an absent key.
//! - Integers may arrive as floats when the fractional part is zero.
//! - Required strings reject `""`; optional strings treat `""` as not supplied.
//! - Absent sequences decode as empty; an element of the wrong kind rejects
//!   the whole field.
//! - Unknown keys are ignored.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Why a field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentReason {
    /// A required field is absent.
    Missing,
    /// The value has the wrong JSON kind.
    WrongKind { expected: &'static str },
    /// A required string is empty.
    EmptyWhenRequired,
    /// A numeric value is outside the accepted range.
    OutOfRange { constraint: String },
}

impl ArgumentReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ArgumentReason::Missing => "missing",
            ArgumentReason::WrongKind { .. } => "wrong_kind",
            ArgumentReason::EmptyWhenRequired => "empty",
            ArgumentReason::OutOfRange { .. } => "out_of_range",
        }
    }
}

impl fmt::Display for ArgumentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentReason::Missing => write!(f, "missing"),
            ArgumentReason::WrongKind { expected } => write!(f, "wrong kind, expected {expected}"),
            ArgumentReason::EmptyWhenRequired => write!(f, "empty, a value is required"),
            ArgumentReason::OutOfRange { constraint } => write!(f, "out of range, {constraint}"),
        }
    }
}

/// The first field that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid argument '{field}': {reason}")]
pub struct ArgumentError {
    pub field: String,
    pub reason: ArgumentReason,
}

impl ArgumentError {
    pub fn new(field: impl Into<String>, reason: ArgumentReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::new(field, ArgumentReason::Missing)
    }

    pub fn wrong_kind(field: &str, expected: &'static str) -> Self {
        Self::new(field, ArgumentReason::WrongKind { expected })
    }

    pub fn out_of_range(field: &str, constraint: impl Into<String>) -> Self {
        Self::new(
            field,
            ArgumentReason::OutOfRange {
                constraint: constraint.into(),
            },
        )
    }

    /// Prefix the field with the path of the enclosing object.
    fn within(mut self, parent: &str) -> Self {
        self.field = format!("{parent}.{}", self.field);
        self
    }
}

/// Typed request records decoded from tool arguments.
pub trait FromArguments: Sized {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError>;
}

/// Records with no fields decode from any argument map.
impl FromArguments for () {
    fn from_arguments(_args: &Arguments) -> Result<Self, ArgumentError> {
        Ok(())
    }
}

/// A decoded tool argument map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Map<String, Value>,
    /// Path of this map inside the top-level arguments, used in error fields.
    path: Option<String>,
}

impl Arguments {
    /// Wrap a JSON object.
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values, path: None }
    }

    /// Accept the `arguments` member of a tool call: an object, or null/absent.
    pub fn from_value(value: Value) -> Result<Self, ArgumentError> {
        match value {
            Value::Object(values) => Ok(Self::new(values)),
            Value::Null => Ok(Self::default()),
            _ => Err(ArgumentError::wrong_kind("arguments", "object")),
        }
    }

    /// Decode into a typed record.
    pub fn decode<T: FromArguments>(&self) -> Result<T, ArgumentError> {
        T::from_arguments(self)
    }

    fn error(&self, err: ArgumentError) -> ArgumentError {
        match &self.path {
            Some(path) => err.within(path),
            None => err,
        }
    }

    fn child_path(&self, field: &str) -> String {
        match &self.path {
            Some(path) => format!("{path}.{field}"),
            None => field.to_string(),
        }
    }

    fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field).filter(|v| !v.is_null())
    }

    // -------------------------------------------------------------------------
    // Integers
    // -------------------------------------------------------------------------

    /// An optional integer of any sign.
    pub fn integer(&self, field: &str) -> Result<Option<i64>, ArgumentError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        as_integer(value)
            .map(Some)
            .map_err(|reason| self.error(ArgumentError::new(field, reason)))
    }

    /// A required identity: an integer greater than zero.
    pub fn required_id(&self, field: &str) -> Result<u64, ArgumentError> {
        match self.integer(field)? {
            None => Err(self.error(ArgumentError::missing(field))),
            Some(id) if id > 0 => Ok(id.unsigned_abs()),
            Some(_) => Err(self.error(ArgumentError::out_of_range(
                field,
                "must be greater than 0",
            ))),
        }
    }

    /// An optional identity where `0` (or absence) means unspecified.
    pub fn optional_id(&self, field: &str) -> Result<u64, ArgumentError> {
        match self.integer(field)? {
            None => Ok(0),
            Some(id) if id >= 0 => Ok(id.unsigned_abs()),
            Some(_) => Err(self.error(ArgumentError::out_of_range(field, "must not be negative"))),
        }
    }

    // -------------------------------------------------------------------------
    // Strings and booleans
    // -------------------------------------------------------------------------

    /// A required, non-empty string.
    pub fn required_string(&self, field: &str) -> Result<String, ArgumentError> {
        match self.get(field) {
            None => Err(self.error(ArgumentError::missing(field))),
            Some(Value::String(s)) if s.is_empty() => Err(self.error(ArgumentError::new(
                field,
                ArgumentReason::EmptyWhenRequired,
            ))),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(self.error(ArgumentError::wrong_kind(field, "string"))),
        }
    }

    /// An optional string; absent and empty both mean not supplied.
    pub fn optional_string(&self, field: &str) -> Result<Option<String>, ArgumentError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.error(ArgumentError::wrong_kind(field, "string"))),
        }
    }

    /// An optional string restricted to `allowed`, matched case-insensitively
    /// and returned in the spelling given in `allowed`.
    pub fn one_of(&self, field: &str, allowed: &[&str]) -> Result<Option<String>, ArgumentError> {
        let Some(raw) = self.optional_string(field)? else {
            return Ok(None);
        };
        allowed
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(&raw))
            .map(|candidate| Some(candidate.to_string()))
            .ok_or_else(|| {
                self.error(ArgumentError::out_of_range(
                    field,
                    format!("must be one of {}", allowed.join(", ")),
                ))
            })
    }

    /// A required string restricted to `allowed`.
    pub fn required_one_of(&self, field: &str, allowed: &[&str]) -> Result<String, ArgumentError> {
        self.required_string(field)?;
        self.one_of(field, allowed)?
            .ok_or_else(|| self.error(ArgumentError::missing(field)))
    }

    /// An optional boolean.
    pub fn optional_bool(&self, field: &str) -> Result<Option<bool>, ArgumentError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(self.error(ArgumentError::wrong_kind(field, "boolean"))),
        }
    }

    // -------------------------------------------------------------------------
    // Sequences and nested objects
    // -------------------------------------------------------------------------

    /// A sequence of strings; absent means empty.
    pub fn string_list(&self, field: &str) -> Result<Vec<String>, ArgumentError> {
        let Some(value) = self.get(field) else {
            return Ok(Vec::new());
        };
        let Value::Array(items) = value else {
            return Err(self.error(ArgumentError::wrong_kind(field, "array of strings")));
        };
        items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(self.error(ArgumentError::wrong_kind(field, "array of strings"))),
            })
            .collect()
    }

    /// A sequence of strings where absence is distinguishable from empty.
    pub fn optional_string_list(&self, field: &str) -> Result<Option<Vec<String>>, ArgumentError> {
        if self.get(field).is_none() {
            return Ok(None);
        }
        self.string_list(field).map(Some)
    }

    /// An optional nested object.
    pub fn object(&self, field: &str) -> Result<Option<Arguments>, ArgumentError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Object(values)) => Ok(Some(Arguments {
                values: values.clone(),
                path: Some(self.child_path(field)),
            })),
            Some(_) => Err(self.error(ArgumentError::wrong_kind(field, "object"))),
        }
    }

    /// A required nested object.
    pub fn required_object(&self, field: &str) -> Result<Arguments, ArgumentError> {
        self.object(field)?
            .ok_or_else(|| self.error(ArgumentError::missing(field)))
    }

    /// A sequence of objects; absent means empty.
    pub fn object_list(&self, field: &str) -> Result<Vec<Arguments>, ArgumentError> {
        let Some(value) = self.get(field) else {
            return Ok(Vec::new());
        };
        let Value::Array(items) = value else {
            return Err(self.error(ArgumentError::wrong_kind(field, "array of objects")));
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(values) => Ok(Arguments {
                    values: values.clone(),
                    path: Some(format!("{}[{index}]", self.child_path(field))),
                }),
                _ => Err(self.error(ArgumentError::wrong_kind(field, "array of objects"))),
            })
            .collect()
    }
}

/// Interpret a JSON number as an integer. Floats are accepted only when whole.
fn as_integer(value: &Value) -> Result<i64, ArgumentReason> {
    let Value::Number(number) = value else {
        return Err(ArgumentReason::WrongKind { expected: "integer" });
    };
    if let Some(n) = number.as_i64() {
        return Ok(n);
    }
    if number.is_u64() {
        return Err(ArgumentReason::OutOfRange {
            constraint: format!("must be at most {}", i64::MAX),
        });
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 => {
            // i64::MAX as f64 rounds up to 2^63, which is already out of range.
            if f >= -(2f64.powi(63)) && f < 2f64.powi(63) {
                Ok(f as i64)
            } else {
                Err(ArgumentReason::OutOfRange {
                    constraint: "must fit in a 64-bit integer".to_string(),
                })
            }
        }
        _ => Err(ArgumentReason::WrongKind { expected: "integer" }),
    }
}
