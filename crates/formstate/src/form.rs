//! The form handle: shared aggregate, commits and the read API.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use parking_lot::RwLock;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::options::FormOptions;
use crate::registry::Registry;
use crate::state::FormState;

/// Outcome of a mutation closure passed to [`Form::commit`].
pub(crate) enum Step<T> {
    /// Nothing changed; the current snapshot stays published.
    Unchanged(T),
    /// The working copy becomes the next snapshot.
    Changed(T),
}

/// Everything guarded by the form's lock.
struct Core {
    snapshot: Arc<FormState>,
    registry: Registry,
}

pub(crate) struct Inner {
    core: RwLock<Core>,
    changes: watch::Sender<Arc<FormState>>,
    pub(crate) options: FormOptions,
    pub(crate) lifecycle: CancellationToken,
    /// Generation of the current submit attempt. Only written under the
    /// core write lock; bumped by every started submit and every reset.
    pub(crate) attempt: AtomicU64,
}

/// A form-state engine.
///
/// `Form` is a cheap handle; clones share the same form. The view layer
/// keeps one and calls into it as fields mount and users interact:
///
/// ```rust
/// use formstate::{FieldInit, FieldUpdate, Form, FormOptions};
///
/// # fn main() -> formstate::Result<()> {
/// let form = Form::new(FormOptions::new());
/// form.register_field(FieldInit::text("name"))?;
/// form.set_field_state("name", FieldUpdate::focus())?;
/// let state = form.set_field_state("name", FieldUpdate::value("  Sally "))?;
///
/// assert_eq!(state.get_string("name"), Some("Sally"));
/// assert!(state.dirty && state.visited);
/// # Ok(())
/// # }
/// ```
///
/// Every operation reads the latest committed state, builds the next one
/// and publishes it in a single step under the form's lock. Readers
/// ([`get_form_state`](Self::get_form_state), [`subscribe`](Self::subscribe))
/// therefore only ever observe complete snapshots.
#[derive(Clone)]
pub struct Form {
    pub(crate) inner: Arc<Inner>,
}

impl Form {
    /// Creates an empty form.
    ///
    /// Initial values in `options` are held until matching fields register.
    pub fn new(options: FormOptions) -> Self {
        let snapshot = Arc::new(FormState::default());
        let (changes, _) = watch::channel(Arc::clone(&snapshot));
        let registry = Registry::new(options.initial_values.clone());

        debug!(
            trim = options.trim,
            validate = options.validate.is_some(),
            on_submit = options.on_submit.is_some(),
            initial_values = options.initial_values.as_ref().map_or(0, |v| v.len()),
            "Form created"
        );

        Self {
            inner: Arc::new(Inner {
                core: RwLock::new(Core { snapshot, registry }),
                changes,
                options,
                lifecycle: CancellationToken::new(),
                attempt: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the current snapshot.
    pub fn get_form_state(&self) -> Arc<FormState> {
        Arc::clone(&self.inner.core.read().snapshot)
    }

    /// Subscribes to committed snapshots.
    ///
    /// The receiver starts at the current snapshot and is marked changed on
    /// every commit.
    pub fn subscribe(&self) -> watch::Receiver<Arc<FormState>> {
        self.inner.changes.subscribe()
    }

    /// Forwards a field change to the configured `on_change` observer.
    ///
    /// View adapters call this once a value update has been reconciled;
    /// [`FieldHandle::change`](crate::FieldHandle::change) does it for you.
    pub fn on_change(&self, name: &str, state: &FormState) {
        if let Some(observer) = &self.inner.options.on_change {
            observer(name, state);
        }
    }

    /// Ends the form's lifecycle.
    ///
    /// Submissions that settle afterwards leave the state alone.
    pub fn teardown(&self) {
        if !self.inner.lifecycle.is_cancelled() {
            debug!(fields = self.get_form_state().len(), "Form torn down");
            self.inner.lifecycle.cancel();
        }
    }

    /// Returns false once [`teardown`](Self::teardown) has been called.
    pub fn is_mounted(&self) -> bool {
        !self.inner.lifecycle.is_cancelled()
    }

    /// Applies `step` to a working copy of the latest snapshot and publishes
    /// the result if it reports a change.
    ///
    /// Returns the closure's output and the snapshot that is current after
    /// the call. Errors leave the published state untouched.
    pub(crate) fn commit<T, E>(
        &self,
        step: impl FnOnce(&mut Registry, &mut FormState) -> std::result::Result<Step<T>, E>,
    ) -> std::result::Result<(T, Arc<FormState>), E> {
        let mut core = self.inner.core.write();
        let Core { snapshot, registry } = &mut *core;
        let mut next = FormState::clone(snapshot);

        match step(registry, &mut next)? {
            Step::Unchanged(out) => Ok((out, Arc::clone(snapshot))),
            Step::Changed(out) => {
                next.version += 1;
                debug_assert!(next.is_consistent(), "inconsistent form state committed");
                let next = Arc::new(next);
                *snapshot = Arc::clone(&next);
                self.inner.changes.send_replace(Arc::clone(&next));
                Ok((out, next))
            }
        }
    }

    /// [`commit`](Self::commit) for steps that cannot fail.
    pub(crate) fn update<T>(
        &self,
        step: impl FnOnce(&mut Registry, &mut FormState) -> Step<T>,
    ) -> (T, Arc<FormState>) {
        match self.commit(|registry, state| Ok::<_, Infallible>(step(registry, state))) {
            Ok(committed) => committed,
            Err(never) => match never {},
        }
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.get_form_state();
        f.debug_struct("Form")
            .field("fields", &state.len())
            .field("version", &state.version)
            .field("mounted", &self.is_mounted())
            .field("options", &self.inner.options)
            .finish()
    }
}
