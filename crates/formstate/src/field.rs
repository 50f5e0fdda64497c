//! Field definitions, per-field state and partial updates.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::options::Formatter;
use crate::value::FieldValue;

/// Free-form properties attached to a field by the view layer
/// (placeholder, label, css class, ...). The engine stores them untouched.
pub type PropMap = IndexMap<String, serde_json::Value>;

// -----------------------------------------------------------------------------
// FieldKind
// -----------------------------------------------------------------------------

/// The kind of input a field represents.
///
/// Resolved once at registration. Decides the value representation
/// (checkboxes are boolean, everything else is text) and whether several
/// registrations may share one name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Single-line text input.
    Text,
    /// Checkbox; stores a boolean.
    Checkbox,
    /// One option of a radio group.
    Radio,
    /// Select menu.
    Select,
    /// Multi-line text input.
    Textarea,
    /// A view-defined component, identified by tag.
    Custom(String),
}

impl FieldKind {
    /// Returns true if values of this kind are booleans.
    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Checkbox)
    }

    /// Returns true if several registrations may share a name.
    pub fn is_radio(&self) -> bool {
        matches!(self, Self::Radio)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Checkbox => f.write_str("checkbox"),
            Self::Radio => f.write_str("radio"),
            Self::Select => f.write_str("select"),
            Self::Textarea => f.write_str("textarea"),
            Self::Custom(tag) => write!(f, "custom `{tag}`"),
        }
    }
}

// -----------------------------------------------------------------------------
// Props
// -----------------------------------------------------------------------------

/// One option of a radio field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadioOption {
    /// The value the field takes when this option is checked.
    pub value: String,
    /// Whether this option is checked.
    pub checked: bool,
    /// Properties supplied with this option's registration.
    pub props: PropMap,
}

/// Properties of a registered field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldProps {
    /// Properties of an ordinary field.
    Plain(PropMap),
    /// A radio option that has not (yet) been joined by another option.
    Radio(RadioOption),
    /// Several radio options sharing one name, keyed by option value.
    RadioGroup(IndexMap<String, RadioOption>),
}

impl FieldProps {
    /// Returns the value of the checked radio option.
    ///
    /// `None` for plain fields and for radios with nothing checked. If
    /// several options are checked the last registered one wins.
    pub fn checked_option(&self) -> Option<&str> {
        match self {
            Self::Plain(_) => None,
            Self::Radio(opt) => opt.checked.then_some(opt.value.as_str()),
            Self::RadioGroup(options) => options
                .values()
                .rev()
                .find(|opt| opt.checked)
                .map(|opt| opt.value.as_str()),
        }
    }

    /// Marks exactly the options equal to `value` as checked.
    pub(crate) fn check_matching(&mut self, value: &FieldValue) {
        let check = |opt: &mut RadioOption| opt.checked = *value == *opt.value;
        match self {
            Self::Plain(_) => {}
            Self::Radio(opt) => check(opt),
            Self::RadioGroup(options) => options.values_mut().for_each(check),
        }
    }

    /// Returns the properties registered for a radio option.
    pub fn option(&self, value: &str) -> Option<&RadioOption> {
        match self {
            Self::Plain(_) => None,
            Self::Radio(opt) => (opt.value == value).then_some(opt),
            Self::RadioGroup(options) => options.get(value),
        }
    }
}

// -----------------------------------------------------------------------------
// FieldState
// -----------------------------------------------------------------------------

/// The state of one registered field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldState {
    /// The committed value.
    pub value: FieldValue,
    /// The current validation message; empty when valid.
    pub error: String,
    /// Always `error.is_empty()`.
    pub valid_field: bool,
    /// The field has received focus at least once.
    pub visited: bool,
    /// The value has changed since registration or the last reset.
    pub dirty: bool,
    /// The field currently has focus.
    pub active: bool,
    /// The field has been blurred at least once.
    pub touched: bool,
    /// The kind the field was registered with.
    pub kind: FieldKind,
    /// Properties supplied at registration.
    pub props: FieldProps,
}

impl FieldState {
    pub(crate) fn new(kind: FieldKind, value: FieldValue, props: FieldProps) -> Self {
        Self {
            value,
            error: String::new(),
            valid_field: true,
            visited: false,
            dirty: false,
            active: false,
            touched: false,
            kind,
            props,
        }
    }

    /// Returns true if several radio options have been merged into this field.
    pub fn is_radio_group(&self) -> bool {
        matches!(self.props, FieldProps::RadioGroup(_))
    }

    /// Returns the registration properties of a plain field.
    pub fn plain_props(&self) -> Option<&PropMap> {
        match &self.props {
            FieldProps::Plain(props) => Some(props),
            _ => None,
        }
    }

    pub(crate) fn set_error(&mut self, error: String) {
        self.valid_field = error.is_empty();
        self.error = error;
    }

    /// Returns the field to its registered baseline, keeping kind and props.
    pub(crate) fn reset(&mut self) {
        let kind = self.kind.clone();
        let mut props = std::mem::replace(&mut self.props, FieldProps::Plain(PropMap::new()));
        let value = FieldValue::empty_for(&kind);
        props.check_matching(&value);
        *self = Self::new(kind, value, props);
    }
}

// -----------------------------------------------------------------------------
// FieldInit
// -----------------------------------------------------------------------------

/// The definition a view supplies when it mounts a field.
///
/// # Example
///
/// ```rust
/// use formstate::FieldInit;
/// use serde_json::json;
///
/// let email = FieldInit::text("email").prop("placeholder", json!("you@example.com"));
/// let agree = FieldInit::checkbox("agree").checked(true);
/// let male = FieldInit::radio("gender", "m").checked(true);
/// # let _ = (email, agree, male);
/// ```
#[derive(Clone)]
pub struct FieldInit {
    pub(crate) name: String,
    pub(crate) kind: FieldKind,
    pub(crate) value: Option<FieldValue>,
    pub(crate) checked: Option<bool>,
    pub(crate) option: String,
    pub(crate) props: PropMap,
    pub(crate) format: Option<Formatter>,
    pub(crate) trim: Option<bool>,
}

impl FieldInit {
    /// Creates a definition of the given kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: None,
            checked: None,
            option: String::new(),
            props: PropMap::new(),
            format: None,
            trim: None,
        }
    }

    /// A single-line text input.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// A multi-line text input.
    pub fn textarea(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Textarea)
    }

    /// A select menu.
    pub fn select(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Select)
    }

    /// A checkbox.
    pub fn checkbox(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Checkbox)
    }

    /// One option of a radio group.
    pub fn radio(name: impl Into<String>, option: impl Into<String>) -> Self {
        let mut init = Self::new(name, FieldKind::Radio);
        init.option = option.into();
        init
    }

    /// A view-defined component.
    pub fn custom(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Custom(tag.into()))
    }

    /// Sets an explicit initial value. Radios ignore this; their value
    /// comes from the checked option.
    pub fn value(mut self, value: impl Into<FieldValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the checked flag of a checkbox or radio option.
    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    /// Adds a view property.
    pub fn prop(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    /// Sets a formatter for this field, taking precedence over the form's.
    pub fn format<F>(mut self, format: F) -> Self
    where
        F: Fn(FieldValue, &str) -> FieldValue + Send + Sync + 'static,
    {
        self.format = Some(Arc::new(format));
        self
    }

    /// Overrides the form's trim setting for this field.
    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = Some(trim);
        self
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field kind.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// The value this definition asks for explicitly, coerced to its kind.
    pub(crate) fn explicit_value(&self) -> Option<FieldValue> {
        match self.kind {
            FieldKind::Radio => (self.checked == Some(true))
                .then(|| FieldValue::Text(self.option.clone())),
            FieldKind::Checkbox => self
                .checked
                .map(FieldValue::Bool)
                .or_else(|| self.value.clone().map(|v| v.coerce_for(&self.kind))),
            _ => self.value.clone().map(|v| v.coerce_for(&self.kind)),
        }
    }

    /// Builds the radio option this definition describes.
    pub(crate) fn radio_option(&self, pending: Option<&FieldValue>) -> RadioOption {
        let checked = self
            .checked
            .unwrap_or_else(|| pending.is_some_and(|v| *v == *self.option));
        RadioOption {
            value: self.option.clone(),
            checked,
            props: self.props.clone(),
        }
    }
}

impl fmt::Debug for FieldInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInit")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("checked", &self.checked)
            .field("option", &self.option)
            .field("props", &self.props)
            .field("format", &self.format.is_some())
            .field("trim", &self.trim)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// FieldUpdate
// -----------------------------------------------------------------------------

/// A partial update to a field. `None` members are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdate {
    /// New value; triggers formatting, dirtiness and validation.
    pub value: Option<FieldValue>,
    /// Visited flag.
    pub visited: Option<bool>,
    /// Dirty flag.
    pub dirty: Option<bool>,
    /// Active flag.
    pub active: Option<bool>,
    /// Touched flag.
    pub touched: Option<bool>,
    /// View properties merged key by key into a plain field's props.
    /// Radio fields keep the props of their options.
    pub props: Option<PropMap>,
}

impl FieldUpdate {
    /// An empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// A value change.
    pub fn value(value: impl Into<FieldValue>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// The update applied when a field gains focus.
    pub fn focus() -> Self {
        Self {
            visited: Some(true),
            active: Some(true),
            ..Self::default()
        }
    }

    /// The update applied when a field loses focus.
    pub fn blur() -> Self {
        Self {
            active: Some(false),
            touched: Some(true),
            ..Self::default()
        }
    }

    /// Sets the visited flag.
    pub fn visited(mut self, visited: bool) -> Self {
        self.visited = Some(visited);
        self
    }

    /// Sets the dirty flag.
    pub fn dirty(mut self, dirty: bool) -> Self {
        self.dirty = Some(dirty);
        self
    }

    /// Sets the active flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Sets the touched flag.
    pub fn touched(mut self, touched: bool) -> Self {
        self.touched = Some(touched);
        self
    }

    /// Adds a view property to merge into the field's props.
    pub fn prop(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.props
            .get_or_insert_with(PropMap::new)
            .insert(key.into(), value);
        self
    }

    /// Merges the flag and prop members into `field`. The value is handled
    /// by the reconciler.
    pub(crate) fn apply_flags(&self, field: &mut FieldState) {
        if let (Some(props), FieldProps::Plain(current)) = (&self.props, &mut field.props) {
            current.extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(visited) = self.visited {
            field.visited = visited;
        }
        if let Some(dirty) = self.dirty {
            field.dirty = dirty;
        }
        if let Some(active) = self.active {
            field.active = active;
        }
        if let Some(touched) = self.touched {
            field.touched = touched;
        }
    }
}
