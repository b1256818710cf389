//! Minimal store driving a [`ScopedReducer`]

use crate::action::RootAction;
use crate::reducer::{DispatchReport, ScopedReducer};

/// Holds the current state and folds dispatched envelopes into it
///
/// # Example
/// ```
/// use flux_scope_core::{Flux, Store};
///
/// #[derive(Clone, Debug, Default)]
/// struct AppState {
///     counter: i32,
/// }
///
/// let flux = Flux::new(AppState::default());
/// let increment = flux.add_action("increment", |s: &mut AppState, by: i32| s.counter += by);
///
/// let mut store = Store::new(flux.create_reducer());
/// let report = store.dispatch(&flux.act(&increment).with(1));
/// assert!(report.changed());
/// assert_eq!(store.state().counter, 1);
/// ```
pub struct Store<S> {
    state: S,
    reducer: ScopedReducer<S>,
}

impl<S: Clone> Store<S> {
    /// Create a store starting from the reducer's initial state
    pub fn new(reducer: ScopedReducer<S>) -> Self {
        Self {
            state: reducer.initial_state(),
            reducer,
        }
    }
}

impl<S> Store<S> {
    /// Create a store starting from `state`
    pub fn with_state(state: S, reducer: ScopedReducer<S>) -> Self {
        Self { state, reducer }
    }

    /// Dispatch an envelope to the reducer
    ///
    /// Envelopes from another engine leave the state untouched and come back
    /// with [`DispatchReport::foreign`] set.
    pub fn dispatch(&mut self, envelope: &RootAction) -> DispatchReport {
        self.reducer.reduce_in_place(&mut self.state, envelope)
    }

    /// Get a reference to the current state
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Get a mutable reference to the state
    ///
    /// Use this sparingly; prefer dispatching envelopes for state changes.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Reducer this store dispatches to
    pub fn reducer(&self) -> &ScopedReducer<S> {
        &self.reducer
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("reducer", &self.reducer)
            .finish()
    }
}

/// Store with middleware support
///
/// Middleware sees every envelope before it reaches the reducer and again
/// afterwards, together with the dispatch report.
pub struct StoreWithMiddleware<S, M: Middleware> {
    store: Store<S>,
    middleware: M,
}

impl<S: Clone, M: Middleware> StoreWithMiddleware<S, M> {
    /// Create a store starting from the reducer's initial state
    pub fn new(reducer: ScopedReducer<S>, middleware: M) -> Self {
        Self {
            store: Store::new(reducer),
            middleware,
        }
    }
}

impl<S, M: Middleware> StoreWithMiddleware<S, M> {
    /// Create a store starting from `state`
    pub fn with_state(state: S, reducer: ScopedReducer<S>, middleware: M) -> Self {
        Self {
            store: Store::with_state(state, reducer),
            middleware,
        }
    }

    /// Dispatch an envelope through middleware and store
    pub fn dispatch(&mut self, envelope: &RootAction) -> DispatchReport {
        self.middleware.before(envelope);
        let report = self.store.dispatch(envelope);
        self.middleware.after(envelope, &report);
        report
    }

    /// Get a reference to the current state
    pub fn state(&self) -> &S {
        self.store.state()
    }

    /// Get a mutable reference to the state
    pub fn state_mut(&mut self) -> &mut S {
        self.store.state_mut()
    }

    /// Get a reference to the middleware
    pub fn middleware(&self) -> &M {
        &self.middleware
    }

    /// Get a mutable reference to the middleware
    pub fn middleware_mut(&mut self) -> &mut M {
        &mut self.middleware
    }
}

/// Hook around every dispatched envelope
///
/// Implement this trait to add logging, persistence, or other
/// cross-cutting concerns to your store.
pub trait Middleware {
    /// Called before the envelope reaches the reducer
    fn before(&mut self, envelope: &RootAction);

    /// Called after the envelope was reduced
    fn after(&mut self, envelope: &RootAction, report: &DispatchReport);
}

/// A no-op middleware that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl Middleware for NoopMiddleware {
    fn before(&mut self, _envelope: &RootAction) {}
    fn after(&mut self, _envelope: &RootAction, _report: &DispatchReport) {}
}

/// Middleware that logs whole envelopes through `tracing`
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    /// Whether to log before dispatch
    pub log_before: bool,
    /// Whether to log after dispatch
    pub log_after: bool,
}

impl LoggingMiddleware {
    /// Log after dispatch only
    pub fn new() -> Self {
        Self {
            log_before: false,
            log_after: true,
        }
    }

    /// Log both before and after dispatch
    pub fn verbose() -> Self {
        Self {
            log_before: true,
            log_after: true,
        }
    }
}

impl Middleware for LoggingMiddleware {
    fn before(&mut self, envelope: &RootAction) {
        if self.log_before {
            tracing::debug!(
                marker = ?envelope.marker(),
                actions = %envelope.summary(),
                "Dispatching envelope"
            );
        }
    }

    fn after(&mut self, envelope: &RootAction, report: &DispatchReport) {
        if self.log_after {
            tracing::debug!(
                marker = ?envelope.marker(),
                foreign = report.foreign,
                applied = ?report.applied_names(),
                skipped = report.skipped.len(),
                "Envelope processed"
            );
        }
    }
}

/// Compose multiple middleware into a single middleware
///
/// `before` hooks run in insertion order, `after` hooks in reverse.
#[derive(Default)]
pub struct ComposedMiddleware {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl std::fmt::Debug for ComposedMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedMiddleware")
            .field("middlewares_count", &self.middlewares.len())
            .finish()
    }
}

impl ComposedMiddleware {
    /// Create an empty composition
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a middleware to the composition
    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }

    /// Builder form of [`ComposedMiddleware::add`]
    pub fn with<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.add(middleware);
        self
    }

    /// Number of composed middlewares
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Whether nothing was composed
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

impl Middleware for ComposedMiddleware {
    fn before(&mut self, envelope: &RootAction) {
        for middleware in &mut self.middlewares {
            middleware.before(envelope);
        }
    }

    fn after(&mut self, envelope: &RootAction, report: &DispatchReport) {
        for middleware in self.middlewares.iter_mut().rev() {
            middleware.after(envelope, report);
        }
    }
}
