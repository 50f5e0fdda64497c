//! Field registration and initial values.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{FormError, Result};
use crate::field::{FieldInit, FieldProps, FieldState, FieldUpdate, PropMap};
use crate::form::{Form, Step};
use crate::options::Formatter;
use crate::reconcile::{apply_update, validate};
use crate::state::FormState;
use crate::value::{FieldValue, Values};

/// What a call to [`Form::register_field`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A new field was created.
    Admitted,
    /// A radio option joined the field registered under the same name.
    JoinedGroup,
    /// The definition carried a new explicit value, which was applied.
    ValueUpdated,
    /// The same field mounted again; nothing changed.
    Duplicate,
}

/// Registration-time settings kept alongside the snapshot.
#[derive(Clone, Default)]
pub(crate) struct FieldMeta {
    /// Explicit value of the latest definition.
    explicit: Option<FieldValue>,
    pub(crate) format: Option<Formatter>,
    pub(crate) trim: Option<bool>,
}

impl From<&FieldInit> for FieldMeta {
    fn from(init: &FieldInit) -> Self {
        Self {
            explicit: init.explicit_value(),
            format: init.format.clone(),
            trim: init.trim,
        }
    }
}

/// Per-field settings and the latest initial values.
pub(crate) struct Registry {
    fields: HashMap<String, FieldMeta>,
    initial_values: Option<Values>,
}

impl Registry {
    pub(crate) fn new(initial_values: Option<Values>) -> Self {
        Self {
            fields: HashMap::new(),
            initial_values,
        }
    }

    pub(crate) fn meta(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.get(name)
    }

    /// Returns the initial value waiting for `name`. Empty values do not
    /// count.
    fn pending(&self, name: &str) -> Option<&FieldValue> {
        self.initial_values
            .as_ref()
            .and_then(|values| values.get(name))
            .filter(|value| !value.is_empty())
    }
}

impl Form {
    /// Admits a field into the form.
    ///
    /// - A new name creates a field seeded from the definition's explicit
    ///   value, else the pending initial value, else the empty value, then
    ///   validates the form.
    /// - A radio option under an existing radio name joins that name's
    ///   group; the group's value becomes the last checked option.
    /// - Mounting the same field again is a no-op, unless the definition
    ///   now carries a different explicit value, which is applied like a
    ///   value update.
    ///
    /// # Errors
    ///
    /// [`FormError::MissingName`] for an empty name and
    /// [`FormError::KindMismatch`] when the kind conflicts with the
    /// registered one. The form is left untouched in both cases.
    pub fn register_field(&self, init: FieldInit) -> Result<Registration> {
        if init.name.is_empty() {
            return Err(FormError::MissingName);
        }
        let options = &self.inner.options;

        let (registration, state) = self.commit(|registry, state| {
            let Some(existing) = state.fields.get(&init.name) else {
                admit(registry, state, &init);
                validate(options, state);
                return Ok(Step::Changed(Registration::Admitted));
            };

            if existing.kind != init.kind {
                return Err(FormError::kind_mismatch(
                    &init.name,
                    existing.kind.clone(),
                    init.kind.clone(),
                ));
            }

            if init.kind.is_radio() {
                if existing.props.option(&init.option).is_some() {
                    return Ok(Step::Unchanged(Registration::Duplicate));
                }
                join_group(registry, state, &init);
                validate(options, state);
                return Ok(Step::Changed(Registration::JoinedGroup));
            }

            let explicit = init.explicit_value();
            let Some(meta) = registry.fields.get_mut(&init.name) else {
                return Ok(Step::Unchanged(Registration::Duplicate));
            };
            match explicit {
                Some(value) if meta.explicit.as_ref() != Some(&value) => {
                    meta.explicit = Some(value.clone());
                    apply_update(options, Some(&*meta), state, &init.name, &FieldUpdate::value(value));
                    Ok(Step::Changed(Registration::ValueUpdated))
                }
                _ => Ok(Step::Unchanged(Registration::Duplicate)),
            }
        })?;

        debug!(
            field = %init.name,
            kind = %init.kind,
            ?registration,
            fields = state.len(),
            "Field registered"
        );
        Ok(registration)
    }

    /// Supplies (or replaces) the initial values.
    ///
    /// The values are kept for fields that have not registered yet. If they
    /// differ from the last values seen, every registered field with a
    /// matching name takes its initial value and the form is validated.
    /// Returns false when the values equal the previous ones.
    pub fn set_initial_values(&self, values: Values) -> bool {
        let options = &self.inner.options;

        let (applied, _) = self.update(|registry, state| {
            if registry.initial_values.as_ref() == Some(&values) {
                return Step::Unchanged(None);
            }

            let mut applied = 0usize;
            for (name, value) in &values {
                let Some(kind) = state.fields.get(name).map(|field| field.kind.clone()) else {
                    continue;
                };
                state.store_value(name, value.clone().coerce_for(&kind));
                applied += 1;
            }
            registry.initial_values = Some(values);

            if applied == 0 {
                return Step::Unchanged(Some(applied));
            }
            validate(options, state);
            Step::Changed(Some(applied))
        });

        match applied {
            Some(applied) => {
                debug!(applied, "Initial values updated");
                true
            }
            None => false,
        }
    }
}

/// Inserts a new field for `init`.
fn admit(registry: &mut Registry, state: &mut FormState, init: &FieldInit) {
    let pending = registry.pending(&init.name).cloned();

    // A radio's value is whatever its option ends up checked as.
    let (value, props) = if init.kind.is_radio() {
        let option = init.radio_option(pending.as_ref());
        let value = if option.checked {
            FieldValue::Text(option.value.clone())
        } else {
            FieldValue::empty_for(&init.kind)
        };
        (value, FieldProps::Radio(option))
    } else {
        let value = init
            .explicit_value()
            .or_else(|| pending.map(|v| v.coerce_for(&init.kind)))
            .unwrap_or_else(|| FieldValue::empty_for(&init.kind));
        (value, FieldProps::Plain(init.props.clone()))
    };

    let field = FieldState::new(init.kind.clone(), value.clone(), props);
    state.fields.insert(init.name.clone(), Arc::new(field));
    state.values.insert(init.name.clone(), value);
    registry.fields.insert(init.name.clone(), FieldMeta::from(init));
}

/// Adds a radio option to the field registered under the same name.
fn join_group(registry: &Registry, state: &mut FormState, init: &FieldInit) {
    let Some(field) = state.fields.get_mut(&init.name) else {
        return;
    };
    let field = Arc::make_mut(field);
    let current = Some(&field.value)
        .filter(|value| !value.is_empty())
        .or_else(|| registry.pending(&init.name));
    let option = init.radio_option(current);

    let props = std::mem::replace(&mut field.props, FieldProps::Plain(PropMap::new()));
    field.props = match props {
        FieldProps::Radio(first) => {
            let mut group = IndexMap::new();
            group.insert(first.value.clone(), first);
            group.insert(option.value.clone(), option);
            FieldProps::RadioGroup(group)
        }
        FieldProps::RadioGroup(mut group) => {
            group.insert(option.value.clone(), option);
            FieldProps::RadioGroup(group)
        }
        plain @ FieldProps::Plain(_) => plain,
    };

    if let Some(checked) = field.props.checked_option().map(str::to_string) {
        state.store_value(&init.name, FieldValue::Text(checked));
    }
}
