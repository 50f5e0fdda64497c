//! Ready-made checks and a composer that turns them into a form validator.
//!
//! A check looks at one value and returns `Some(message)` when it is
//! invalid. [`Rules`] runs checks per field, plus any cross-field checks,
//! and produces the error map a [`Validator`](crate::Validator) returns.
//!
//! ```rust
//! use formstate::validate::{validate_email, validate_min_length, Rules};
//! use formstate::{FieldInit, Form, FormOptions};
//!
//! let rules = Rules::new()
//!     .field("email", validate_email())
//!     .field("password", validate_min_length(6))
//!     .matches("confirm", "password", "passwords do not match");
//!
//! let form = Form::new(FormOptions::new().validate(rules.into_validator()));
//! form.register_field(FieldInit::text("email")).unwrap();
//! assert_eq!(form.get_form_state().error("email"), Some("email is required"));
//! ```

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::state::FormState;
use crate::value::{Errors, FieldValue, Values};

/// A single-value check: `Some(message)` when the value is invalid.
pub type Check = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

type CrossCheck = Arc<dyn Fn(&Values) -> Option<(String, String)> + Send + Sync>;

/// Text a check sees for a value. Unchecked boxes and missing fields are
/// empty.
fn text_of(value: Option<&FieldValue>) -> &str {
    match value {
        Some(FieldValue::Text(s)) => s,
        Some(FieldValue::Bool(true)) => "true",
        Some(FieldValue::Bool(false)) | None => "",
    }
}

// -----------------------------------------------------------------------------
// Checks
// -----------------------------------------------------------------------------

/// Fails on empty or whitespace-only values.
///
/// ```
/// use formstate::validate::validate_required;
/// let check = validate_required();
/// assert!(check("").is_some());
/// assert!(check("John").is_none());
/// ```
pub fn validate_required() -> impl Fn(&str) -> Option<String> + Send + Sync + Clone {
    |s: &str| {
        if s.trim().is_empty() {
            Some("field is required".to_string())
        } else {
            None
        }
    }
}

/// Fails on values shorter than `min` characters.
pub fn validate_min_length(min: usize) -> impl Fn(&str) -> Option<String> + Send + Sync + Clone {
    move |s: &str| {
        if s.chars().count() < min {
            Some(format!("must be at least {min} characters"))
        } else {
            None
        }
    }
}

/// Fails on values longer than `max` characters.
pub fn validate_max_length(max: usize) -> impl Fn(&str) -> Option<String> + Send + Sync + Clone {
    move |s: &str| {
        if s.chars().count() > max {
            Some(format!("must be at most {max} characters"))
        } else {
            None
        }
    }
}

/// Fails on anything that does not look like `local@domain.tld`.
pub fn validate_email() -> impl Fn(&str) -> Option<String> + Send + Sync + Clone {
    |s: &str| {
        if s.is_empty() {
            return Some("email is required".to_string());
        }
        let Some((local, domain)) = s.split_once('@') else {
            return Some("invalid email address".to_string());
        };
        if local.is_empty() || domain.contains('@') {
            return Some("invalid email address".to_string());
        }
        // Domain needs at least one dot and no empty labels.
        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
            return Some("invalid email address".to_string());
        }
        None
    }
}

/// Fails unless the whole value matches `pattern`.
pub fn validate_pattern(
    pattern: Regex,
    message: impl Into<String>,
) -> impl Fn(&str) -> Option<String> + Send + Sync + Clone {
    let message = message.into();
    move |s: &str| {
        let whole = pattern
            .find(s)
            .is_some_and(|m| m.start() == 0 && m.end() == s.len());
        if whole { None } else { Some(message.clone()) }
    }
}

// -----------------------------------------------------------------------------
// Rules
// -----------------------------------------------------------------------------

/// Per-field and cross-field checks combined into one validator.
///
/// Checks run in the order they were added; the first failing check of a
/// field decides its message.
#[derive(Clone, Default)]
pub struct Rules {
    fields: Vec<(String, Check)>,
    cross: Vec<CrossCheck>,
}

impl Rules {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a check for one field.
    pub fn field<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.fields.push((name.into(), Arc::new(check)));
        self
    }

    /// Requires `name` to hold the same value as `other`.
    pub fn matches(
        mut self,
        name: impl Into<String>,
        other: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let (name, other, message) = (name.into(), other.into(), message.into());
        self.cross.push(Arc::new(move |values: &Values| {
            (text_of(values.get(&name)) != text_of(values.get(&other)))
                .then(|| (name.clone(), message.clone()))
        }));
        self
    }

    /// Adds a check over all values returning `(field, message)` on failure.
    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&Values) -> Option<(String, String)> + Send + Sync + 'static,
    {
        self.cross.push(Arc::new(check));
        self
    }

    /// Runs every check against `values`.
    pub fn validate(&self, values: &Values) -> Errors {
        let mut errors = Errors::new();
        for (name, check) in &self.fields {
            if errors.contains_key(name) {
                continue;
            }
            if let Some(message) = check(text_of(values.get(name))) {
                errors.insert(name.clone(), message);
            }
        }
        for check in &self.cross {
            if let Some((name, message)) = check(values) {
                errors.entry(name).or_insert(message);
            }
        }
        errors
    }

    /// Converts the rules into a validator for
    /// [`FormOptions::validate`](crate::FormOptions::validate).
    pub fn into_validator(self) -> impl Fn(&Values, &FormState) -> Errors + Send + Sync + 'static {
        move |values: &Values, _: &FormState| self.validate(values)
    }
}

impl fmt::Debug for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rules")
            .field("fields", &self.fields.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("cross", &self.cross.len())
            .finish()
    }
}
