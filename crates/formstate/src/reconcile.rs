//! Per-field updates and whole-form validation.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{FormError, Result};
use crate::field::{FieldState, FieldUpdate};
use crate::form::{Form, Step};
use crate::options::FormOptions;
use crate::registry::FieldMeta;
use crate::state::FormState;
use crate::value::FieldValue;

impl Form {
    /// Merges a partial update into a registered field.
    ///
    /// A value update is formatted, stored in the field and in
    /// [`FormState::values`], marks the field and the form dirty and
    /// re-validates the whole form, all within the same commit. Flag-only
    /// updates (focus, blur) skip validation.
    ///
    /// Returns the snapshot that includes the update.
    ///
    /// # Errors
    ///
    /// [`FormError::UnknownField`] if `name` was never registered.
    pub fn set_field_state(&self, name: &str, update: FieldUpdate) -> Result<Arc<FormState>> {
        let options = &self.inner.options;

        let ((), state) = self.commit(|registry, state| {
            if !state.contains(name) {
                return Err(FormError::unknown_field(name));
            }
            apply_update(options, registry.meta(name), state, name, &update);
            Ok(Step::Changed(()))
        })?;

        debug!(
            field = name,
            value = update.value.is_some(),
            valid_form = state.valid_form,
            version = state.version,
            "Field state updated"
        );
        Ok(state)
    }

    /// Like [`set_field_state`](Self::set_field_state), then hands the
    /// reconciled field and form to `on_complete`.
    ///
    /// # Errors
    ///
    /// [`FormError::UnknownField`] if `name` was never registered; the
    /// callback is not called.
    pub fn set_field_state_then<F>(&self, name: &str, update: FieldUpdate, on_complete: F) -> Result<()>
    where
        F: FnOnce(&FieldState, &FormState),
    {
        let state = self.set_field_state(name, update)?;
        if let Some(field) = state.field(name) {
            on_complete(field, &state);
        }
        Ok(())
    }
}

/// Applies `update` to the field `name`, which must be registered.
pub(crate) fn apply_update(
    options: &FormOptions,
    meta: Option<&FieldMeta>,
    state: &mut FormState,
    name: &str,
    update: &FieldUpdate,
) {
    let Some(field) = state.fields.get_mut(name) else {
        return;
    };
    let field = Arc::make_mut(field);
    update.apply_flags(field);
    if update.visited == Some(true) {
        state.visited = true;
    }

    let Some(value) = update.value.clone() else {
        return;
    };
    field.dirty = true;
    let value = format_value(options, meta, name, value.coerce_for(&field.kind))
        .coerce_for(&field.kind);
    state.store_value(name, value);
    state.dirty = true;
    validate(options, state);
}

/// Runs the field formatter (or the form's), then trims if enabled.
fn format_value(
    options: &FormOptions,
    meta: Option<&FieldMeta>,
    name: &str,
    value: FieldValue,
) -> FieldValue {
    let formatter = meta
        .and_then(|meta| meta.format.as_ref())
        .or(options.format.as_ref());
    let value = match formatter {
        Some(format) => format(value, name),
        None => value,
    };

    let trim = meta.and_then(|meta| meta.trim).unwrap_or(options.trim);
    if trim {
        value.trimmed()
    } else {
        value
    }
}

/// Recomputes `errors` and `valid_form` and rewrites every field's error.
///
/// Every field is revisited on every pass because validators may relate
/// fields to each other. Fields whose error is unchanged keep sharing their
/// state with the previous snapshot.
pub(crate) fn validate(options: &FormOptions, state: &mut FormState) {
    let Some(validator) = &options.validate else {
        return;
    };

    let mut errors = validator(&state.values, state);
    errors.retain(|_, message| !message.is_empty());
    state.valid_form = errors.is_empty();

    for (name, field) in state.fields.iter_mut() {
        let error = errors.get(name).map_or("", String::as_str);
        if field.error != error {
            trace!(field = %name, error, "Field error changed");
            Arc::make_mut(field).set_error(error.to_string());
        }
    }
    state.errors = errors;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldInit;
    use crate::value::{Errors, Values};

    fn email_validator(values: &Values, _: &FormState) -> Errors {
        let mut errors = Errors::new();
        let ok = values
            .get("email")
            .and_then(FieldValue::as_str)
            .is_some_and(|email| email.contains('@'));
        if !ok {
            errors.insert("email".into(), "bad".into());
        }
        errors
    }

    fn form_with(options: FormOptions, names: &[&str]) -> Form {
        let form = Form::new(options);
        for name in names {
            form.register_field(FieldInit::text(*name)).unwrap();
        }
        form
    }

    #[test]
    fn test_validation_fan_out() {
        let form = form_with(FormOptions::new().validate(email_validator), &["email"]);

        let state = form.set_field_state("email", FieldUpdate::value("x")).unwrap();
        assert_eq!(state.error("email"), Some("bad"));
        assert!(!state.valid_form);
        assert!(!state.field("email").unwrap().valid_field);

        let state = form
            .set_field_state("email", FieldUpdate::value("x@y.com"))
            .unwrap();
        assert!(state.errors.is_empty());
        assert!(state.valid_form);
        assert_eq!(state.field("email").unwrap().error, "");
        assert!(state.is_consistent());
    }

    #[test]
    fn test_cross_field_errors_are_recomputed() {
        let matching = |values: &Values, _: &FormState| {
            let mut errors = Errors::new();
            if values.get("password") != values.get("confirm") {
                errors.insert("confirm".into(), "passwords differ".into());
            }
            errors
        };
        let form = form_with(FormOptions::new().validate(matching), &["password", "confirm"]);

        let state = form.set_field_state("password", FieldUpdate::value("secret")).unwrap();
        assert_eq!(state.field("confirm").unwrap().error, "passwords differ");

        // Changing the other field clears the first one's error.
        let state = form.set_field_state("confirm", FieldUpdate::value("secret")).unwrap();
        assert!(state.field("confirm").unwrap().valid_field);
        assert!(state.valid_form);
    }

    #[test]
    fn test_empty_messages_are_valid() {
        let lenient = |_: &Values, _: &FormState| {
            let mut errors = Errors::new();
            errors.insert("a".into(), String::new());
            errors
        };
        let form = form_with(FormOptions::new().validate(lenient), &["a"]);
        let state = form.get_form_state();
        assert!(state.valid_form);
        assert!(state.errors.is_empty());
    }

    #[test]
    fn test_unchanged_fields_are_shared() {
        let form = form_with(FormOptions::new().validate(email_validator), &["email", "name"]);
        let before = form.get_form_state();
        let after = form.set_field_state("email", FieldUpdate::value("x@y.com")).unwrap();
        assert!(Arc::ptr_eq(&before.fields["name"], &after.fields["name"]));
        assert!(!Arc::ptr_eq(&before.fields["email"], &after.fields["email"]));
    }

    #[test]
    fn test_unknown_field() {
        let form = Form::new(FormOptions::new());
        let err = form.set_field_state("ghost", FieldUpdate::focus()).unwrap_err();
        assert_eq!(err, FormError::unknown_field("ghost"));
    }

    #[test]
    fn test_focus_and_blur_do_not_validate() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let form = form_with(
            FormOptions::new().validate(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Errors::new()
            }),
            &["a"],
        );
        let after_register = calls.load(Ordering::SeqCst);

        let state = form.set_field_state("a", FieldUpdate::focus()).unwrap();
        let field = state.field("a").unwrap();
        assert!(field.visited && field.active);
        assert!(state.visited);
        assert!(!state.dirty);

        let state = form.set_field_state("a", FieldUpdate::blur()).unwrap();
        let field = state.field("a").unwrap();
        assert!(!field.active && field.touched);
        assert_eq!(calls.load(Ordering::SeqCst), after_register);
    }

    #[test]
    fn test_value_marks_dirty() {
        let form = form_with(FormOptions::new(), &["a"]);
        let state = form.set_field_state("a", FieldUpdate::value("x")).unwrap();
        assert!(state.dirty);
        assert!(state.field("a").unwrap().dirty);
        assert_eq!(state.values["a"], "x");
    }

    #[test]
    fn test_trim_default_and_opt_out() {
        let form = form_with(FormOptions::new(), &["a"]);
        form.register_field(FieldInit::text("raw").trim(false)).unwrap();

        let state = form.set_field_state("a", FieldUpdate::value("  x  ")).unwrap();
        assert_eq!(state.get_string("a"), Some("x"));
        let state = form.set_field_state("raw", FieldUpdate::value("  x  ")).unwrap();
        assert_eq!(state.get_string("raw"), Some("  x  "));

        let form = form_with(FormOptions::new().trim(false), &["a"]);
        let state = form.set_field_state("a", FieldUpdate::value(" x")).unwrap();
        assert_eq!(state.get_string("a"), Some(" x"));
    }

    #[test]
    fn test_field_formatter_beats_form_formatter() {
        let upper = |value: FieldValue, _: &str| match value {
            FieldValue::Text(s) => FieldValue::Text(s.to_uppercase()),
            other => other,
        };
        let form = form_with(
            FormOptions::new().format(|value, name| match value {
                FieldValue::Text(s) => FieldValue::Text(format!("{name}:{s}")),
                other => other,
            }),
            &["plain"],
        );
        form.register_field(FieldInit::text("shout").format(upper)).unwrap();

        let state = form.set_field_state("plain", FieldUpdate::value("a")).unwrap();
        assert_eq!(state.get_string("plain"), Some("plain:a"));
        let state = form.set_field_state("shout", FieldUpdate::value("a")).unwrap();
        assert_eq!(state.get_string("shout"), Some("A"));
    }

    #[test]
    fn test_props_update_merges_keys() {
        use serde_json::json;

        let form = Form::new(FormOptions::new());
        form.register_field(
            FieldInit::text("name")
                .prop("label", json!("Name"))
                .prop("placeholder", json!("Jane")),
        )
        .unwrap();

        let state = form
            .set_field_state("name", FieldUpdate::new().prop("placeholder", json!("Sally")))
            .unwrap();
        let field = state.field("name").unwrap();
        let props = field.plain_props().unwrap();
        assert_eq!(props["label"], json!("Name"));
        assert_eq!(props["placeholder"], json!("Sally"));
        assert!(!field.dirty && !state.dirty);
        assert_eq!(field.value, "");
    }

    #[test]
    fn test_props_update_leaves_radio_options() {
        use serde_json::json;

        let form = Form::new(FormOptions::new());
        form.register_field(FieldInit::radio("g", "m").prop("label", json!("Male")))
            .unwrap();
        let state = form
            .set_field_state("g", FieldUpdate::new().prop("label", json!("Other")))
            .unwrap();
        let option = state.field("g").unwrap().props.option("m").unwrap().clone();
        assert_eq!(option.props["label"], json!("Male"));
    }

    #[test]
    fn test_checkbox_value_stays_boolean() {
        let form = Form::new(FormOptions::new());
        form.register_field(FieldInit::checkbox("agree")).unwrap();
        let state = form.set_field_state("agree", FieldUpdate::value(true)).unwrap();
        assert_eq!(state.get_bool("agree"), Some(true));
        let state = form.set_field_state("agree", FieldUpdate::value("")).unwrap();
        assert_eq!(state.get_bool("agree"), Some(false));
    }

    #[test]
    fn test_radio_value_update_moves_check() {
        let form = Form::new(FormOptions::new());
        form.register_field(FieldInit::radio("g", "m").checked(true)).unwrap();
        form.register_field(FieldInit::radio("g", "f")).unwrap();
        let state = form.set_field_state("g", FieldUpdate::value("f")).unwrap();
        let field = state.field("g").unwrap();
        assert_eq!(field.value, "f");
        assert!(field.props.option("f").unwrap().checked);
        assert!(!field.props.option("m").unwrap().checked);
    }

    #[test]
    fn test_on_complete_sees_reconciled_state() {
        let form = form_with(FormOptions::new().validate(email_validator), &["email"]);
        let mut seen = None;
        form.set_field_state_then("email", FieldUpdate::value("nope"), |field, state| {
            seen = Some((field.error.clone(), state.valid_form, state.values["email"].clone()));
        })
        .unwrap();
        assert_eq!(seen, Some(("bad".to_string(), false, FieldValue::from("nope"))));
    }
}
