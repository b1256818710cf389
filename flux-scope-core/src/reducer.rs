//! The reducer handed to the external store
//!
//! A [`ScopedReducer`] shares its engine with the [`Flux`](crate::Flux) that
//! created it: scope changes made after creation apply to every later
//! dispatch.

use std::any::Any;
use std::rc::Rc;

use crate::action::RootAction;
use crate::flux::Shared;
use crate::stack::{find_handler, Step};
use crate::token::ActionToken;

/// What happened while reducing one envelope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// The envelope was built by another engine (or was not an envelope)
    pub foreign: bool,
    /// Sub-actions whose transition ran, in dispatch order
    pub applied: Vec<ActionToken>,
    /// Sub-actions with no enabled handler or an unusable payload
    pub skipped: Vec<ActionToken>,
    /// Whether the sub-action at each envelope position was applied
    pub outcomes: Vec<bool>,
}

impl DispatchReport {
    fn foreign() -> Self {
        Self {
            foreign: true,
            ..Self::default()
        }
    }

    /// Whether any transition ran
    #[inline]
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }

    /// Whether a sub-action named `name` was applied
    pub fn has_applied(&self, name: &str) -> bool {
        self.applied.iter().any(|t| t.name() == name)
    }

    /// Whether a sub-action named `name` was skipped
    pub fn has_skipped(&self, name: &str) -> bool {
        self.skipped.iter().any(|t| t.name() == name)
    }

    /// Outcome of the sub-action at envelope position `index`
    ///
    /// `None` for positions past the end of the envelope, and for every
    /// position of a foreign envelope.
    pub fn applied_at(&self, index: usize) -> Option<bool> {
        self.outcomes.get(index).copied()
    }

    /// Names of applied sub-actions, in dispatch order
    pub fn applied_names(&self) -> Vec<&str> {
        self.applied.iter().map(|t| t.name()).collect()
    }

    /// Names of skipped sub-actions, in dispatch order
    pub fn skipped_names(&self) -> Vec<&str> {
        self.skipped.iter().map(|t| t.name()).collect()
    }
}

/// Reducer function produced by [`Flux::create_reducer`](crate::Flux::create_reducer)
///
/// # Example
///
/// ```
/// use flux_scope_core::Flux;
///
/// #[derive(Clone, Debug, Default, PartialEq)]
/// struct State { count: i32 }
///
/// let flux = Flux::new(State::default());
/// let add = flux.add_action("add", |state: &mut State, by: i32| state.count += by);
/// let reducer = flux.create_reducer();
///
/// let state = reducer.reduce(None, &flux.act(&add).with(2));
/// let state = reducer.reduce(Some(state), &flux.act(&add).with(3));
/// assert_eq!(state.count, 5);
/// ```
pub struct ScopedReducer<S> {
    shared: Rc<Shared<S>>,
}

impl<S> Clone for ScopedReducer<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<S> std::fmt::Debug for ScopedReducer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedReducer")
            .field("marker", &self.shared.marker)
            .finish_non_exhaustive()
    }
}

impl<S> ScopedReducer<S> {
    pub(crate) fn new(shared: Rc<Shared<S>>) -> Self {
        Self { shared }
    }

    /// Fold `envelope` into `state` in place
    ///
    /// Sub-actions run left to right; each sees the state left by the
    /// previous one. The filtered handler list is looked up again for every
    /// sub-action so that transitions toggling scopes affect the rest of the
    /// envelope.
    pub fn reduce_in_place(&self, state: &mut S, envelope: &RootAction) -> DispatchReport {
        if envelope.marker() != self.shared.marker {
            tracing::trace!(marker = ?envelope.marker(), "ignoring foreign envelope");
            return DispatchReport::foreign();
        }

        let mut report = DispatchReport::default();
        for action in envelope.actions() {
            let token = action.action_type();
            // The engine borrow ends with this statement; transitions may
            // call back into the engine.
            let handlers = self.shared.engine.borrow_mut().lookup();
            let Some(entry) = find_handler(&handlers, token) else {
                tracing::trace!(action = %token, "no enabled handler, skipping");
                report.skipped.push(token.clone());
                report.outcomes.push(false);
                continue;
            };

            match entry.transition().apply(state, action) {
                Step::Kept => {}
                Step::Replaced(next) => *state = next,
                Step::PayloadMismatch => {
                    tracing::warn!(action = %token, "payload type mismatch, skipping");
                    report.skipped.push(token.clone());
                    report.outcomes.push(false);
                    continue;
                }
            }
            tracing::trace!(action = %token, "applied");
            report.applied.push(token.clone());
            report.outcomes.push(true);
        }
        report
    }
}

impl<S: Clone> ScopedReducer<S> {
    /// A fresh copy of the configured initial state
    pub fn initial_state(&self) -> S {
        self.shared.initial.clone()
    }

    /// Reduce `envelope` starting from `state`, or the initial state if `None`
    pub fn reduce(&self, state: Option<S>, envelope: &RootAction) -> S {
        self.reduce_with_report(state, envelope).0
    }

    /// Like [`ScopedReducer::reduce`], also returning what was applied
    pub fn reduce_with_report(
        &self,
        state: Option<S>,
        envelope: &RootAction,
    ) -> (S, DispatchReport) {
        let mut state = state.unwrap_or_else(|| self.initial_state());
        let report = self.reduce_in_place(&mut state, envelope);
        (state, report)
    }

    /// Reduce an arbitrary dispatched value
    ///
    /// Anything that is not a [`RootAction`] from this engine leaves the
    /// state untouched.
    pub fn reduce_dyn(&self, state: Option<S>, value: &dyn Any) -> S {
        let state = state.unwrap_or_else(|| self.initial_state());
        match value.downcast_ref::<RootAction>() {
            Some(envelope) => self.reduce(Some(state), envelope),
            None => {
                tracing::trace!("ignoring non-envelope dispatch");
                state
            }
        }
    }

    /// Plain `(state, envelope) -> state` closure for stores taking functions
    pub fn into_fn(self) -> impl Fn(Option<S>, &RootAction) -> S {
        move |state, envelope| self.reduce(state, envelope)
    }
}
