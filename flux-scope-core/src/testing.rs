//! Test utilities for applications built on flux-scope
//!
//! - [`TestHarness`]: holds a reducer and the state it folds into
//! - [`assert_applied!`](crate::assert_applied) and
//!   [`assert_skipped!`](crate::assert_skipped) for checking dispatch reports
//!
//! # Example
//!
//! ```
//! use flux_scope_core::testing::TestHarness;
//! use flux_scope_core::{assert_applied, assert_skipped, Flux};
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct State { count: i32 }
//!
//! let flux = Flux::new(State::default());
//! let add = flux.add_action("add", |s: &mut State, by: i32| s.count += by);
//! let reset = flux.add_scoped_action("reset", "admin", |s: &mut State, _: ()| s.count = 0);
//!
//! let mut harness = TestHarness::new(flux.create_reducer_scoped(Vec::<String>::new()));
//! let report = harness.dispatch(&flux.act((&add, &reset)).with((2, ())));
//!
//! assert_applied!(report, "add");
//! assert_skipped!(report, "reset");
//! assert_eq!(harness.state().count, 2);
//! ```

use crate::action::RootAction;
use crate::reducer::{DispatchReport, ScopedReducer};

/// Reducer plus the state it folds into, with a dispatch history
pub struct TestHarness<S> {
    reducer: ScopedReducer<S>,
    /// The application state under test
    pub state: S,
    reports: Vec<DispatchReport>,
}

impl<S: Clone> TestHarness<S> {
    /// Start from the reducer's initial state
    pub fn new(reducer: ScopedReducer<S>) -> Self {
        Self {
            state: reducer.initial_state(),
            reducer,
            reports: Vec::new(),
        }
    }

    /// Start from `state`
    pub fn with_state(reducer: ScopedReducer<S>, state: S) -> Self {
        Self {
            reducer,
            state,
            reports: Vec::new(),
        }
    }

    /// Reduce `envelope` into the current state
    pub fn dispatch(&mut self, envelope: &RootAction) -> DispatchReport {
        let report = self.reducer.reduce_in_place(&mut self.state, envelope);
        self.reports.push(report.clone());
        report
    }

    /// Dispatch several envelopes in order, returning every report
    pub fn dispatch_all<'a>(
        &mut self,
        envelopes: impl IntoIterator<Item = &'a RootAction>,
    ) -> Vec<DispatchReport> {
        envelopes
            .into_iter()
            .map(|envelope| self.dispatch(envelope))
            .collect()
    }

    /// Current state
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Current state, mutably
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Reports of every dispatch so far
    pub fn reports(&self) -> &[DispatchReport] {
        &self.reports
    }

    /// Drain the collected reports
    pub fn drain_reports(&mut self) -> Vec<DispatchReport> {
        std::mem::take(&mut self.reports)
    }

    /// Back to the initial state, forgetting past reports
    pub fn reset(&mut self) {
        self.state = self.reducer.initial_state();
        self.reports.clear();
    }
}

/// Assert that a dispatch report applied an action with the given name.
///
/// # Example
///
/// ```ignore
/// let report = harness.dispatch(&envelope);
/// assert_applied!(report, "hoge");
/// ```
#[macro_export]
macro_rules! assert_applied {
    ($report:expr, $name:expr) => {
        assert!(
            $report.has_applied($name),
            "Expected action `{}` to be applied, but applied: {:?}, skipped: {:?}",
            $name,
            $report.applied_names(),
            $report.skipped_names()
        );
    };
}

/// Assert that a dispatch report skipped an action with the given name.
///
/// # Example
///
/// ```ignore
/// let report = harness.dispatch(&envelope);
/// assert_skipped!(report, "fuga");
/// ```
#[macro_export]
macro_rules! assert_skipped {
    ($report:expr, $name:expr) => {
        assert!(
            $report.has_skipped($name),
            "Expected action `{}` to be skipped, but applied: {:?}, skipped: {:?}",
            $name,
            $report.applied_names(),
            $report.skipped_names()
        );
    };
}

/// Assert that a dispatch report applied nothing.
#[macro_export]
macro_rules! assert_unchanged {
    ($report:expr) => {
        assert!(
            !$report.changed(),
            "Expected no action to be applied, but applied: {:?}",
            $report.applied_names()
        );
    };
}
