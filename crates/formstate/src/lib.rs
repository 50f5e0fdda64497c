#![forbid(unsafe_code)]
// Allow pedantic lints for early-stage API ergonomics.
#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

//! # Formstate
//!
//! Headless state for HTML-style forms: field registration, value
//! reconciliation, validation and submission.
//!
//! A [`Form`] owns one immutable [`FormState`] snapshot at a time. Every
//! operation builds the next snapshot and publishes it atomically, so a
//! reader never sees a value without its validation result.
//!
//! Formstate provides:
//! - A field registry that merges radio inputs sharing a name into one group
//! - Value updates with trimming, formatting and whole-form validation
//! - A submit lifecycle driven by an async handler
//! - Snapshot subscriptions through a [`tokio::sync::watch`] channel
//!
//! ## Example
//!
//! ```rust
//! use formstate::{Errors, FieldInit, FieldUpdate, Form, FormOptions};
//!
//! # fn main() -> formstate::Result<()> {
//! let form = Form::new(FormOptions::new().validate(|values, _| {
//!     let mut errors = Errors::new();
//!     if values.get("email").is_some_and(|v| v.is_empty()) {
//!         errors.insert("email".into(), "Required".into());
//!     }
//!     errors
//! }));
//!
//! form.register_field(FieldInit::text("email"))?;
//! assert!(!form.get_form_state().valid_form);
//!
//! let state = form.set_field_state("email", FieldUpdate::value("  john@example.com "))?;
//! assert_eq!(state.get_string("email"), Some("john@example.com"));
//! assert!(state.valid_form && state.dirty);
//! # Ok(())
//! # }
//! ```

mod error;
mod field;
mod form;
mod handle;
mod options;
mod reconcile;
mod registry;
mod state;
mod submit;
pub mod validate;
mod value;

pub use error::{FormError, Result, SubmitError};
pub use field::{FieldInit, FieldKind, FieldProps, FieldState, FieldUpdate, PropMap, RadioOption};
pub use form::Form;
pub use handle::FieldHandle;
pub use options::{ChangeObserver, FormOptions, Formatter, SubmitHandler, Validator};
pub use registry::Registration;
pub use state::FormState;
pub use submit::{SubmitOutcome, Submission};
pub use validate::{
    Rules, validate_email, validate_max_length, validate_min_length, validate_pattern,
    validate_required,
};
pub use value::{Errors, FieldValue, Values, values};
