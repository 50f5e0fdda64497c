//! Field handles for view adapters.

use std::sync::Arc;

use crate::error::{FormError, Result};
use crate::field::{FieldState, FieldUpdate};
use crate::form::Form;
use crate::state::FormState;
use crate::value::FieldValue;

/// A reference to one registered field.
///
/// View adapters keep a handle per mounted input and route its events
/// through it, so every change flows through
/// [`Form::set_field_state`].
///
/// ```rust
/// use formstate::{FieldInit, Form, FormOptions};
///
/// # fn main() -> formstate::Result<()> {
/// let form = Form::new(FormOptions::new());
/// form.register_field(FieldInit::checkbox("agree"))?;
///
/// let agree = form.field("agree")?;
/// agree.focus()?;
/// agree.toggle()?;
/// agree.blur()?;
///
/// let state = agree.state().unwrap();
/// assert_eq!(state.value, true);
/// assert!(state.touched && state.dirty);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FieldHandle {
    form: Form,
    name: String,
}

impl Form {
    /// Returns a handle to a registered field.
    ///
    /// # Errors
    ///
    /// [`FormError::UnknownField`] if `name` was never registered.
    pub fn field(&self, name: &str) -> Result<FieldHandle> {
        if !self.get_form_state().contains(name) {
            return Err(FormError::unknown_field(name));
        }
        Ok(FieldHandle {
            form: self.clone(),
            name: name.to_string(),
        })
    }
}

impl FieldHandle {
    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the form this field belongs to.
    pub fn form(&self) -> &Form {
        &self.form
    }

    /// Returns the field's current state.
    pub fn state(&self) -> Option<Arc<FieldState>> {
        self.form.get_form_state().fields.get(&self.name).cloned()
    }

    /// Returns the field's current value.
    pub fn value(&self) -> Option<FieldValue> {
        self.form.get_form_state().values.get(&self.name).cloned()
    }

    /// Applies a value entered by the user and notifies the form's
    /// `on_change` observer.
    pub fn change(&self, value: impl Into<FieldValue>) -> Result<Arc<FormState>> {
        let state = self.form.set_field_state(&self.name, FieldUpdate::value(value))?;
        self.form.on_change(&self.name, &state);
        Ok(state)
    }

    /// Flips a checkbox.
    pub fn toggle(&self) -> Result<Arc<FormState>> {
        let checked = self.value().and_then(|v| v.as_bool()).unwrap_or(false);
        self.change(!checked)
    }

    /// Checks one option of a radio group.
    pub fn select(&self, option: &str) -> Result<Arc<FormState>> {
        self.change(option)
    }

    /// Marks the field visited and active.
    pub fn focus(&self) -> Result<Arc<FormState>> {
        self.form.set_field_state(&self.name, FieldUpdate::focus())
    }

    /// Marks the field inactive and touched.
    pub fn blur(&self) -> Result<Arc<FormState>> {
        self.form.set_field_state(&self.name, FieldUpdate::blur())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldInit;
    use crate::options::FormOptions;
    use std::sync::Mutex;

    #[test]
    fn test_unknown_field_handle() {
        let form = Form::new(FormOptions::new());
        assert_eq!(
            form.field("nope").unwrap_err(),
            FormError::unknown_field("nope")
        );
    }

    #[test]
    fn test_change_notifies_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let form = Form::new(FormOptions::new().on_change(move |name, state| {
            sink.lock()
                .unwrap()
                .push((name.to_string(), state.get_string(name).map(str::to_string)));
        }));
        form.register_field(FieldInit::text("name")).unwrap();

        let name = form.field("name").unwrap();
        name.focus().unwrap();
        name.change("Sally").unwrap();
        name.blur().unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![("name".to_string(), Some("Sally".to_string()))]
        );
    }

    #[test]
    fn test_select_radio_option() {
        let form = Form::new(FormOptions::new());
        form.register_field(FieldInit::radio("g", "m").checked(true)).unwrap();
        form.register_field(FieldInit::radio("g", "f")).unwrap();
        let state = form.field("g").unwrap().select("f").unwrap();
        assert_eq!(state.get_string("g"), Some("f"));
    }

    #[test]
    fn test_toggle_twice() {
        let form = Form::new(FormOptions::new());
        form.register_field(FieldInit::checkbox("agree")).unwrap();
        let agree = form.field("agree").unwrap();
        agree.toggle().unwrap();
        let state = agree.toggle().unwrap();
        assert_eq!(state.get_bool("agree"), Some(false));
    }
}
