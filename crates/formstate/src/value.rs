//! Field values and the maps built from them.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::field::FieldKind;

/// Values keyed by field name, in registration order.
///
/// This is the payload handed to validators and submit handlers.
pub type Values = IndexMap<String, FieldValue>;

/// Validation messages keyed by field name.
///
/// A name that is absent (or maps to an empty message) is valid.
pub type Errors = IndexMap<String, String>;

/// The committed value of a field.
///
/// Every kind stores text except checkboxes, which store a boolean.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Text value (inputs, textareas, selects, radios, custom fields).
    Text(String),
    /// Checked state of a checkbox.
    Bool(bool),
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl FieldValue {
    /// Returns the empty value for a field kind.
    pub fn empty_for(kind: &FieldKind) -> Self {
        if kind.is_boolean() {
            Self::Bool(false)
        } else {
            Self::Text(String::new())
        }
    }

    /// Converts the value to the representation used by `kind`.
    ///
    /// Text kinds render booleans as `"true"`/`"false"`. Checkboxes treat
    /// any text other than `""` and `"false"` as checked.
    pub fn coerce_for(self, kind: &FieldKind) -> Self {
        match (self, kind.is_boolean()) {
            (Self::Text(s), true) => Self::Bool(!s.is_empty() && s != "false"),
            (Self::Bool(b), false) => Self::Text(b.to_string()),
            (value, _) => value,
        }
    }

    /// Returns the text, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Bool(_) => None,
        }
    }

    /// Returns the boolean, if this is a checkbox value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(_) => None,
        }
    }

    /// Returns true for `""` and `false`.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Bool(b) => !b,
        }
    }

    /// Trims surrounding whitespace from text values.
    pub(crate) fn trimmed(self) -> Self {
        match self {
            Self::Text(s) if s.trim().len() != s.len() => Self::Text(s.trim().to_string()),
            value => value,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl PartialEq<str> for FieldValue {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for FieldValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<bool> for FieldValue {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

/// Builds a [`Values`] map from name/value pairs.
///
/// ```rust
/// use formstate::values;
///
/// let initial = values([("email", "a@b.co"), ("name", "Sally")]);
/// assert_eq!(initial["name"], "Sally");
/// ```
pub fn values<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Values
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
