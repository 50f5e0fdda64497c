//! Submission and reset.

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SubmitError;
use crate::form::{Form, Inner, Step};
use crate::state::FormState;

/// How a submit attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The form was invalid; the handler was not called.
    Invalid,
    /// A previous submission is still running; the handler was not called.
    AlreadySubmitting,
    /// The form is valid and has no handler; the default submission should
    /// proceed.
    PassThrough,
    /// The handler resolved.
    Submitted,
    /// The handler rejected.
    Failed(SubmitError),
    /// The form was torn down, or reset, before the handler settled;
    /// nothing was applied.
    Detached,
}

impl SubmitOutcome {
    /// Returns true if the handler resolved.
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted)
    }

    /// Returns true if the form recorded a failed submit.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Invalid | Self::Failed(_))
    }
}

enum Pending {
    Settled(SubmitOutcome),
    Running {
        completion: BoxFuture<'static, Result<(), SubmitError>>,
        attempt: Attempt,
    },
}

/// The form's side of a running submission.
///
/// Dropping it before it settles records the attempt as failed, so the form
/// never stays `submitting` once nobody can finish it.
struct Attempt {
    form: Weak<Inner>,
    lifecycle: CancellationToken,
    id: u64,
    settled: bool,
}

impl Attempt {
    /// Returns the form if it is still mounted.
    fn form(&self) -> Option<Form> {
        self.form
            .upgrade()
            .filter(|_| !self.lifecycle.is_cancelled())
            .map(|inner| Form { inner })
    }

    /// Leaves `submitting`. Returns false if the form was torn down or reset
    /// in the meantime, in which case nothing is applied.
    fn settle(&mut self, ok: bool) -> bool {
        self.settled = true;
        let Some(form) = self.form() else {
            return false;
        };
        let id = self.id;
        let (applied, _) = form.update(|_, state| {
            if !form.is_current_attempt(id) {
                return Step::Unchanged(false);
            }
            state.submitting = false;
            if ok {
                state.dirty = false;
            } else {
                state.submit_failed = true;
            }
            Step::Changed(true)
        });
        applied
    }
}

impl Drop for Attempt {
    fn drop(&mut self) {
        if !self.settled && self.settle(false) {
            warn!(attempt = self.id, "Submission abandoned before its handler settled");
        }
    }
}

/// A submit attempt, returned by [`Form::submit`].
///
/// The state transition into `submitting` has already happened when this
/// value exists. Await [`finish`](Self::finish) (or [`spawn`](Self::spawn)
/// it) to settle the handler's completion back into the form. Dropping a
/// running submission, or the `finish` future before it completes, abandons
/// the handler and records the attempt as failed.
#[must_use = "dropping a running submission abandons the handler and records a failed submit"]
pub struct Submission {
    prevent_default: bool,
    pending: Pending,
}

impl Submission {
    fn settled(outcome: SubmitOutcome, prevent_default: bool) -> Self {
        Self {
            prevent_default,
            pending: Pending::Settled(outcome),
        }
    }

    /// Returns true if the view should suppress the native submission: the
    /// form is invalid, or a handler takes over.
    pub fn prevents_default(&self) -> bool {
        self.prevent_default
    }

    /// Returns true while the handler's completion has not been awaited.
    pub fn is_pending(&self) -> bool {
        matches!(self.pending, Pending::Running { .. })
    }

    /// Awaits the handler and applies its result.
    ///
    /// On success the update is deferred by one scheduler turn, then clears
    /// `submitting` and `dirty`. On failure it clears `submitting` and sets
    /// `submit_failed`. Either way nothing is applied if the form has been
    /// torn down or reset in the meantime.
    pub async fn finish(self) -> SubmitOutcome {
        let (completion, mut attempt) = match self.pending {
            Pending::Settled(outcome) => return outcome,
            Pending::Running {
                completion,
                attempt,
            } => (completion, attempt),
        };

        let result = completion.await;
        if result.is_ok() {
            tokio::task::yield_now().await;
        }

        if attempt.form().is_none() {
            attempt.settled = true;
            warn!(ok = result.is_ok(), "Submission settled after form teardown");
            return SubmitOutcome::Detached;
        }
        if !attempt.settle(result.is_ok()) {
            debug!(attempt = attempt.id, "Submission settled after form reset");
            return SubmitOutcome::Detached;
        }

        match result {
            Ok(()) => {
                info!(attempt = attempt.id, "Form submitted");
                SubmitOutcome::Submitted
            }
            Err(err) => {
                info!(attempt = attempt.id, error = %err, "Form submission failed");
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Settles the submission on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(self) -> JoinHandle<SubmitOutcome> {
        tokio::spawn(self.finish())
    }
}

impl fmt::Debug for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Submission");
        s.field("prevent_default", &self.prevent_default);
        match &self.pending {
            Pending::Settled(outcome) => s.field("outcome", outcome),
            Pending::Running { .. } => s.field("outcome", &"pending"),
        };
        s.finish()
    }
}

/// What `submit` decided under the lock.
enum Decision {
    Invalid,
    Busy,
    PassThrough,
    Start(u64),
}

impl Form {
    /// Submits the form.
    ///
    /// - Invalid form: records `submit_failed` and `has_submitted`; the
    ///   handler is never called.
    /// - Valid form with a handler: enters `submitting`, records
    ///   `has_submitted`, clears `submit_failed` and calls the handler with
    ///   the values and the new snapshot.
    /// - Valid form without a handler: only records `has_submitted`.
    ///
    /// The handler is invoked before this returns; its completion is
    /// applied when the returned [`Submission`] is finished.
    pub fn submit(&self) -> Submission {
        let handler = self.inner.options.on_submit.clone();

        let (decision, state) = self.update(|_, state| {
            if state.submitting {
                return Step::Unchanged(Decision::Busy);
            }
            state.has_submitted = true;
            if !state.valid_form {
                state.submitting = false;
                state.submit_failed = true;
                return Step::Changed(Decision::Invalid);
            }
            if handler.is_none() {
                return Step::Changed(Decision::PassThrough);
            }
            state.submitting = true;
            state.submit_failed = false;
            let attempt = self.inner.attempt.fetch_add(1, Ordering::SeqCst) + 1;
            Step::Changed(Decision::Start(attempt))
        });

        match (decision, handler) {
            (Decision::Busy, _) => {
                debug!("Submit ignored, submission in progress");
                Submission::settled(SubmitOutcome::AlreadySubmitting, true)
            }
            (Decision::Invalid, _) => {
                debug!(errors = state.errors.len(), "Submit rejected, form invalid");
                Submission::settled(SubmitOutcome::Invalid, true)
            }
            (Decision::PassThrough, _) | (Decision::Start(_), None) => {
                debug!("Submit passed through, no handler configured");
                Submission::settled(SubmitOutcome::PassThrough, false)
            }
            (Decision::Start(attempt), Some(handler)) => {
                debug!(attempt, fields = state.len(), "Submitting form");
                let completion = handler(state.values.clone(), Arc::clone(&state));
                Submission {
                    prevent_default: true,
                    pending: Pending::Running {
                        completion,
                        attempt: Attempt {
                            form: Arc::downgrade(&self.inner),
                            lifecycle: self.inner.lifecycle.clone(),
                            id: attempt,
                            settled: false,
                        },
                    },
                }
            }
        }
    }

    /// Returns true if `attempt` is the submission the form is waiting on.
    fn is_current_attempt(&self, attempt: u64) -> bool {
        self.inner.attempt.load(Ordering::SeqCst) == attempt
    }

    /// Submits and waits for the handler to settle.
    pub async fn submit_and_wait(&self) -> SubmitOutcome {
        self.submit().finish().await
    }

    /// Returns every field to its empty, untouched state.
    ///
    /// Registered names and their props survive. Errors of registered
    /// fields are cleared without running the validator, and the form-level
    /// submit and interaction flags are reset. A submission still running
    /// settles as [`SubmitOutcome::Detached`].
    pub fn reset_form(&self) -> Arc<FormState> {
        let ((), state) = self.update(|_, state| {
            self.inner.attempt.fetch_add(1, Ordering::SeqCst);
            let FormState {
                fields,
                values,
                errors,
                ..
            } = state;
            for (name, field) in fields.iter_mut() {
                let field = Arc::make_mut(field);
                field.reset();
                values.insert(name.clone(), field.value.clone());
                errors.shift_remove(name);
            }
            state.valid_form = state.errors.is_empty();
            state.dirty = false;
            state.visited = false;
            state.has_submitted = false;
            state.submit_failed = false;
            state.submitting = false;
            Step::Changed(())
        });

        debug!(fields = state.len(), version = state.version, "Form reset");
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldInit, FieldUpdate};
    use crate::options::FormOptions;
    use crate::value::{Errors, Values};

    fn required(values: &Values, _: &FormState) -> Errors {
        values
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| (name.clone(), "required".to_string()))
            .collect()
    }

    #[test]
    fn test_invalid_submit_never_calls_handler() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let form = Form::new(FormOptions::new().validate(required).on_submit(move |_, _| {
            flag.store(true, Ordering::SeqCst);
            async { Ok(()) }
        }));
        form.register_field(FieldInit::text("name")).unwrap();

        let submission = form.submit();
        assert!(submission.prevents_default());
        assert!(!submission.is_pending());
        assert!(!called.load(Ordering::SeqCst));

        let state = form.get_form_state();
        assert!(state.submit_failed);
        assert!(state.has_submitted);
        assert!(!state.submitting);
    }

    #[test]
    fn test_pass_through_without_handler() {
        let form = Form::new(FormOptions::new());
        form.register_field(FieldInit::text("name")).unwrap();
        let submission = form.submit();
        assert!(!submission.prevents_default());
        let state = form.get_form_state();
        assert!(state.has_submitted);
        assert!(!state.submitting);
        assert!(!state.submit_failed);
    }

    #[test]
    fn test_submit_enters_submitting() {
        let form = Form::new(FormOptions::new().on_submit(|_, _| async { Ok(()) }));
        form.register_field(FieldInit::text("name")).unwrap();
        let submission = form.submit();
        assert!(submission.prevents_default());
        assert!(submission.is_pending());
        let state = form.get_form_state();
        assert!(state.submitting && state.has_submitted && !state.submit_failed);

        let again = form.submit();
        assert!(!again.is_pending());

        drop(submission);
        let state = form.get_form_state();
        assert!(!state.submitting);
        assert!(state.submit_failed);
    }

    #[test]
    fn test_reset_supersedes_running_submission() {
        let form = Form::new(FormOptions::new().on_submit(|_, _| async { Ok(()) }));
        form.register_field(FieldInit::text("name")).unwrap();
        let stale = form.submit();
        form.reset_form();
        let current = form.submit();
        assert!(current.is_pending());

        drop(stale);
        let state = form.get_form_state();
        assert!(state.submitting, "a superseded submission leaves the new one alone");
        assert!(!state.submit_failed);
        drop(current);
    }

    #[test]
    fn test_reset_preserves_names_and_props() {
        let form = Form::new(FormOptions::new().validate(required));
        form.register_field(FieldInit::text("name").prop("label", serde_json::json!("Name")))
            .unwrap();
        form.register_field(FieldInit::checkbox("agree").checked(true)).unwrap();
        form.register_field(FieldInit::radio("g", "m").checked(true)).unwrap();
        form.register_field(FieldInit::radio("g", "f")).unwrap();
        form.set_field_state("name", FieldUpdate::focus()).unwrap();
        form.set_field_state("name", FieldUpdate::value("Sally")).unwrap();
        let _ = form.submit();

        let before = form.get_form_state();
        let state = form.reset_form();

        assert_eq!(
            state.names().collect::<Vec<_>>(),
            before.names().collect::<Vec<_>>()
        );
        for field in state.fields.values() {
            assert!(field.value.is_empty());
            assert!(!field.dirty && !field.visited && !field.touched && !field.active);
            assert!(field.valid_field);
        }
        assert_eq!(state.get_string("name"), Some(""));
        assert_eq!(state.get_bool("agree"), Some(false));
        assert!(!state.field("g").unwrap().props.option("m").unwrap().checked);
        assert_eq!(
            state.field("name").unwrap().plain_props().unwrap()["label"],
            serde_json::json!("Name")
        );
        assert!(!state.dirty && !state.has_submitted && !state.submit_failed && !state.submitting);
        assert!(state.errors.is_empty());
        assert!(state.valid_form);
        assert!(state.is_consistent());
    }
}
