//! The form-state aggregate.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::field::FieldState;
use crate::value::{Errors, FieldValue, Values};

/// A complete snapshot of a form.
///
/// Snapshots are immutable once published: every operation on a
/// [`Form`](crate::Form) builds the next snapshot and swaps it in, so a
/// snapshot never shows a half-applied update. Fields are shared between
/// consecutive snapshots until one of them changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormState {
    /// Registered fields, in registration order.
    pub fields: IndexMap<String, Arc<FieldState>>,
    /// `fields[name].value` for every registered name.
    pub values: Values,
    /// Output of the last validation pass, without empty messages.
    pub errors: Errors,
    /// `errors.is_empty()`.
    pub valid_form: bool,
    /// Some field value has changed since the last reset or successful submit.
    pub dirty: bool,
    /// Some field has been visited since the last reset.
    pub visited: bool,
    /// A submit has been attempted since the last reset.
    pub has_submitted: bool,
    /// A submit handler is running.
    pub submitting: bool,
    /// The last submit was rejected, by validation or by the handler.
    pub submit_failed: bool,
    /// Incremented by every committed change.
    pub version: u64,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            fields: IndexMap::new(),
            values: Values::new(),
            errors: Errors::new(),
            valid_form: true,
            dirty: false,
            visited: false,
            has_submitted: false,
            submitting: false,
            submit_failed: false,
            version: 0,
        }
    }
}

impl FormState {
    /// Returns the state of a field.
    pub fn field(&self, name: &str) -> Option<&FieldState> {
        self.fields.get(name).map(Arc::as_ref)
    }

    /// Returns the value of a field.
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Returns the text value of a field.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(FieldValue::as_str)
    }

    /// Returns the boolean value of a checkbox.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.value(name).and_then(FieldValue::as_bool)
    }

    /// Returns the validation message of a field, if it has one.
    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    /// Returns true if a field with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns the registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns the number of registered fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether no field has been registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns true if the invariants between fields, values and errors hold.
    ///
    /// The engine maintains these after every operation; the check is
    /// exposed for tests and debug assertions in view adapters.
    pub fn is_consistent(&self) -> bool {
        self.valid_form == self.errors.is_empty()
            && self.fields.len() == self.values.len()
            && self.fields.iter().all(|(name, field)| {
                let expected = self.errors.get(name).map_or("", String::as_str);
                field.error == expected
                    && field.valid_field == field.error.is_empty()
                    && self.values.get(name) == Some(&field.value)
            })
    }

    /// Writes a field's value into both representations.
    pub(crate) fn store_value(&mut self, name: &str, value: FieldValue) {
        if let Some(field) = self.fields.get_mut(name) {
            let field = Arc::make_mut(field);
            field.props.check_matching(&value);
            field.value = value.clone();
        }
        self.values.insert(name.to_string(), value);
    }
}
