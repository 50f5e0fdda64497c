//! Error types.

use thiserror::Error;

use crate::field::FieldKind;

/// Errors returned by form operations.
///
/// Every variant describes misuse of the engine by the view layer, not a
/// runtime condition: the caller handed the form something it cannot make
/// sense of. Callers are expected to propagate these with `?` and fix the
/// call site rather than retry.
///
/// Validation failures are *not* errors. They are ordinary data that lives
/// in [`FormState::errors`](crate::FormState::errors) and on each field.
/// Likewise a rejected submit handler is reported through
/// [`SubmitOutcome::Failed`](crate::SubmitOutcome::Failed), not through this
/// enum.
///
/// # Example
///
/// ```rust
/// use formstate::{FieldInit, Form, FormError, FormOptions};
///
/// let form = Form::new(FormOptions::new());
/// let err = form.register_field(FieldInit::text("")).unwrap_err();
/// assert_eq!(err, FormError::MissingName);
/// assert!(err.is_contract_violation());
/// ```
///
/// # Note on Clone and PartialEq
///
/// The enum implements `Clone` and `PartialEq` to make assertions in tests
/// straightforward, so variants carry owned strings rather than sources.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// A field was registered without a name.
    #[error("a field must be registered with a non-empty name")]
    MissingName,

    /// An update or handle referred to a name that was never registered.
    #[error("no field named `{0}` has been registered")]
    UnknownField(String),

    /// A name was re-registered with a kind that cannot merge with the
    /// registered one.
    ///
    /// Only radio options may share a name; anything else must keep the
    /// kind it was first registered with.
    #[error("field `{name}` is registered as {registered}, cannot re-register it as {requested}")]
    KindMismatch {
        /// The field name.
        name: String,
        /// Kind of the existing field.
        registered: FieldKind,
        /// Kind of the rejected registration.
        requested: FieldKind,
    },
}

impl FormError {
    /// Creates an unknown-field error for the given name.
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField(name.into())
    }

    /// Creates a kind mismatch error.
    pub fn kind_mismatch(
        name: impl Into<String>,
        registered: FieldKind,
        requested: FieldKind,
    ) -> Self {
        Self::KindMismatch {
            name: name.into(),
            registered,
            requested,
        }
    }

    /// Returns true for errors caused by calling the engine incorrectly.
    ///
    /// All current variants are contract violations; the method exists so
    /// callers can branch on intent rather than on variant lists.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::MissingName | Self::UnknownField(_) | Self::KindMismatch { .. }
        )
    }

    /// Returns the field name involved, if any.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::MissingName => None,
            Self::UnknownField(name) | Self::KindMismatch { name, .. } => Some(name),
        }
    }
}

/// A specialized [`Result`] type for form operations.
pub type Result<T> = std::result::Result<T, FormError>;

/// Failure reported by a submit handler.
///
/// A rejected handler leaves the form editable and its values untouched;
/// the form records `submit_failed` and the caller gets this error back in
/// [`SubmitOutcome::Failed`](crate::SubmitOutcome::Failed).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("submission failed: {message}")]
pub struct SubmitError {
    message: String,
}

impl SubmitError {
    /// Creates a submit error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for SubmitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for SubmitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}
