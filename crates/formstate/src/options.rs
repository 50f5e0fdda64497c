//! Per-form configuration.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::error::SubmitError;
use crate::state::FormState;
use crate::value::{Errors, FieldValue, Values};

/// Rewrites a value before it is stored: `(value, field name) -> value`.
pub type Formatter = Arc<dyn Fn(FieldValue, &str) -> FieldValue + Send + Sync>;

/// Whole-form validator: `(values, form state) -> errors`.
///
/// Must be pure and synchronous. It runs inside the form's commit, so it
/// must not call back into the same form.
pub type Validator = Arc<dyn Fn(&Values, &FormState) -> Errors + Send + Sync>;

/// Submit handler: `(values, form state) -> completion`.
pub type SubmitHandler =
    Arc<dyn Fn(Values, Arc<FormState>) -> BoxFuture<'static, Result<(), SubmitError>> + Send + Sync>;

/// Observer notified with `(field name, form state)` after a field changes.
pub type ChangeObserver = Arc<dyn Fn(&str, &FormState) + Send + Sync>;

/// Configuration for a [`Form`](crate::Form).
///
/// # Example
///
/// ```rust
/// use formstate::{Errors, Form, FormOptions, values};
///
/// let options = FormOptions::new()
///     .trim(false)
///     .initial_values(values([("email", "example@example.com")]))
///     .validate(|values, _| {
///         let mut errors = Errors::new();
///         if values.get("email").and_then(|v| v.as_str()).is_some_and(|e| !e.contains('@')) {
///             errors.insert("email".into(), "Invalid Email".into());
///         }
///         errors
///     })
///     .on_submit(|_values, _state| async { Ok(()) });
///
/// let form = Form::new(options);
/// assert!(form.get_form_state().valid_form);
/// ```
#[derive(Clone)]
pub struct FormOptions {
    pub(crate) trim: bool,
    pub(crate) format: Option<Formatter>,
    pub(crate) validate: Option<Validator>,
    pub(crate) on_submit: Option<SubmitHandler>,
    pub(crate) on_change: Option<ChangeObserver>,
    pub(crate) initial_values: Option<Values>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            trim: true,
            format: None,
            validate: None,
            on_submit: None,
            on_change: None,
            initial_values: None,
        }
    }
}

impl FormOptions {
    /// Creates the default configuration: trimming on, nothing else set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether text values are trimmed before storage.
    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Sets the form-level formatter.
    pub fn format<F>(mut self, format: F) -> Self
    where
        F: Fn(FieldValue, &str) -> FieldValue + Send + Sync + 'static,
    {
        self.format = Some(Arc::new(format));
        self
    }

    /// Sets the validator.
    pub fn validate<F>(mut self, validate: F) -> Self
    where
        F: Fn(&Values, &FormState) -> Errors + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(validate));
        self
    }

    /// Sets the submit handler.
    ///
    /// The handler's future decides the outcome: `Ok` clears `submitting`
    /// and `dirty`, `Err` sets `submit_failed`.
    pub fn on_submit<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Values, Arc<FormState>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), SubmitError>> + Send + 'static,
    {
        self.on_submit = Some(Arc::new(move |values, state| handler(values, state).boxed()));
        self
    }

    /// Sets the change observer.
    pub fn on_change<F>(mut self, observer: F) -> Self
    where
        F: Fn(&str, &FormState) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(observer));
        self
    }

    /// Sets the initial values applied as fields register.
    pub fn initial_values(mut self, values: Values) -> Self {
        self.initial_values = Some(values);
        self
    }

    /// Returns whether text values are trimmed.
    pub fn trims(&self) -> bool {
        self.trim
    }

    /// Returns whether a submit handler is configured.
    pub fn has_submit_handler(&self) -> bool {
        self.on_submit.is_some()
    }
}

impl fmt::Debug for FormOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormOptions")
            .field("trim", &self.trim)
            .field("format", &self.format.is_some())
            .field("validate", &self.validate.is_some())
            .field("on_submit", &self.on_submit.is_some())
            .field("on_change", &self.on_change.is_some())
            .field("initial_values", &self.initial_values)
            .finish()
    }
}
