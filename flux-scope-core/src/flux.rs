//! The engine: handler registration, scope control and envelope building
//!
//! ```
//! use flux_scope_core::Flux;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct State { aaa: String, bbb: i32 }
//!
//! #[derive(Clone, Debug)]
//! struct Hoge { aaa: String }
//!
//! #[derive(Clone, Debug)]
//! struct Fuga { bbb: i32 }
//!
//! let flux = Flux::new(State { aaa: String::new(), bbb: -1 });
//! let hoge = flux.add_action("hoge", |state: &mut State, p: Hoge| state.aaa = p.aaa);
//! let fuga = flux.add_scoped_action("fuga", "baz", |state: &mut State, p: Fuga| {
//!     state.bbb = p.bbb
//! });
//!
//! let reducer = flux.create_reducer_scoped(Vec::<String>::new());
//! let envelope = flux.act((&hoge, &fuga)).with((Hoge { aaa: "x".into() }, Fuga { bbb: 5 }));
//!
//! let state = reducer.reduce(None, &envelope);
//! assert_eq!(state, State { aaa: "x".into(), bbb: -1 });
//!
//! flux.activate("baz");
//! let state = reducer.reduce(None, &envelope);
//! assert_eq!(state, State { aaa: "x".into(), bbb: 5 });
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::action::{Action, ActionType, Payload, RootAction};
use crate::batch::{ActionCreators, ActionTuple, Batch, NamedBatch};
use crate::config::FluxConfig;
use crate::error::{FluxError, Result};
use crate::reducer::ScopedReducer;
use crate::scope::{IntoScopeNames, ScopeState};
use crate::stack::{FilteredHandlers, HandlerEntry, ReducerStack, Transition, TransitionResult};
use crate::token::{ActionToken, RootMarker};

/// Mutable engine state shared by a [`Flux`] and its reducers
pub(crate) struct Engine<S> {
    stack: ReducerStack<S>,
    scopes: ScopeState,
    /// First token registered under each name
    types: HashMap<String, ActionToken>,
}

impl<S> Engine<S> {
    fn new() -> Self {
        Self {
            stack: ReducerStack::new(),
            scopes: ScopeState::new(),
            types: HashMap::new(),
        }
    }

    pub(crate) fn lookup(&mut self) -> FilteredHandlers<S> {
        self.stack.lookup(&self.scopes)
    }

    fn register(
        &mut self,
        token: ActionToken,
        transition: Transition<S>,
        scopes: Option<Vec<String>>,
    ) {
        if let Some(names) = &scopes {
            self.scopes.register(names.clone());
        }
        if self.types.contains_key(token.name()) {
            tracing::debug!(action = %token, "action name registered twice, first handler wins");
        } else {
            self.types.insert(token.name().to_string(), token.clone());
        }
        tracing::trace!(
            action = ?token,
            kind = ?transition.kind(),
            scopes = ?scopes,
            "registered handler"
        );
        self.stack.push(HandlerEntry::new(token, transition, scopes));
    }

    /// Run a scope mutation, dropping the handler cache only if it changed
    fn update_scopes(&mut self, update: impl FnOnce(&mut ScopeState) -> bool) -> bool {
        let changed = update(&mut self.scopes);
        if changed {
            self.stack.invalidate();
            tracing::debug!(
                active = ?self.scopes.active().collect::<Vec<_>>(),
                "active scopes changed"
            );
        }
        changed
    }
}

pub(crate) struct Shared<S> {
    pub(crate) initial: S,
    pub(crate) marker: RootMarker,
    pub(crate) engine: RefCell<Engine<S>>,
}

/// Scoped reducer-stack engine
///
/// Register handlers with the `add_*` methods, toggle scopes, then hand the
/// reducer from [`Flux::create_reducer`] to a store and dispatch envelopes
/// built with [`Flux::act`], [`Flux::act_named`] or [`Flux::act_with`].
///
/// The engine is single-threaded; clones share the same handlers and scopes.
/// Transitions that need the engine should capture a [`WeakFlux`] from
/// [`Flux::downgrade`]; a captured clone keeps the engine alive forever.
pub struct Flux<S> {
    shared: Rc<Shared<S>>,
}

impl<S> Clone for Flux<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

/// Non-owning handle to a [`Flux`] engine
///
/// ```
/// use flux_scope_core::Flux;
///
/// #[derive(Clone, Default)]
/// struct State { unlocked: bool }
///
/// let flux = Flux::new(State::default());
/// let weak = flux.downgrade();
/// flux.add_action("unlock", move |state: &mut State, _: ()| {
///     if let Some(flux) = weak.upgrade() {
///         flux.activate("admin");
///     }
///     state.unlocked = true;
/// });
/// ```
pub struct WeakFlux<S> {
    shared: Weak<Shared<S>>,
}

impl<S> Clone for WeakFlux<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<S> fmt::Debug for WeakFlux<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakFlux")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl<S> WeakFlux<S> {
    /// The engine, if any `Flux` or reducer still holds it
    pub fn upgrade(&self) -> Option<Flux<S>> {
        self.shared.upgrade().map(|shared| Flux { shared })
    }
}

impl<S> fmt::Debug for Flux<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let engine = self.shared.engine.borrow();
        f.debug_struct("Flux")
            .field("marker", &self.shared.marker)
            .field("stack", &engine.stack)
            .field("scopes", &engine.scopes)
            .finish()
    }
}

impl<S: 'static> Flux<S> {
    /// Create an engine whose reducers start from `initial_state`
    pub fn new(initial_state: S) -> Self {
        Self {
            shared: Rc::new(Shared {
                initial: initial_state,
                marker: RootMarker::mint(),
                engine: RefCell::new(Engine::new()),
            }),
        }
    }

    /// State reducers start from when called without one
    pub fn initial_state(&self) -> &S {
        &self.shared.initial
    }

    /// Marker stamped on every envelope this engine builds
    pub fn marker(&self) -> RootMarker {
        self.shared.marker
    }

    /// Handle that does not keep the engine alive
    pub fn downgrade(&self) -> WeakFlux<S> {
        WeakFlux {
            shared: Rc::downgrade(&self.shared),
        }
    }

    // ===== Registration =====

    /// Register a direct transition `f(&mut state, payload)`
    pub fn add_action<P, F, R>(&self, name: &str, f: F) -> ActionType<P>
    where
        P: Payload,
        F: Fn(&mut S, P) -> R + 'static,
        R: TransitionResult<S> + 'static,
    {
        self.add_transition(name, Transition::direct(f), None)
    }

    /// Register a direct transition that only runs while one of `scopes` is active
    pub fn add_scoped_action<P, F, R>(
        &self,
        name: &str,
        scopes: impl IntoScopeNames,
        f: F,
    ) -> ActionType<P>
    where
        P: Payload,
        F: Fn(&mut S, P) -> R + 'static,
        R: TransitionResult<S> + 'static,
    {
        self.add_transition(name, Transition::direct(f), Some(scopes.into_scope_names()))
    }

    /// Register a curried transition `f(payload)(&mut state)`
    pub fn add_curried_action<P, F, G, R>(&self, name: &str, f: F) -> ActionType<P>
    where
        P: Payload,
        F: Fn(P) -> G + 'static,
        G: FnOnce(&mut S) -> R + 'static,
        R: TransitionResult<S> + 'static,
    {
        self.add_transition(name, Transition::curried(f), None)
    }

    /// Register a curried transition gated by `scopes`
    pub fn add_scoped_curried_action<P, F, G, R>(
        &self,
        name: &str,
        scopes: impl IntoScopeNames,
        f: F,
    ) -> ActionType<P>
    where
        P: Payload,
        F: Fn(P) -> G + 'static,
        G: FnOnce(&mut S) -> R + 'static,
        R: TransitionResult<S> + 'static,
    {
        self.add_transition(name, Transition::curried(f), Some(scopes.into_scope_names()))
    }

    /// Register an already built transition under a freshly minted type
    ///
    /// The caller picks `P`; it must match the payload type `transition`
    /// was built for, or dispatches will skip it with a warning.
    pub fn add_transition<P: Payload>(
        &self,
        name: &str,
        transition: Transition<S>,
        scopes: Option<Vec<String>>,
    ) -> ActionType<P> {
        let action_type = ActionType::from_token(ActionToken::mint::<P>(name));
        self.add_action_for(&action_type, transition, scopes);
        action_type
    }

    /// Bind a transition to an existing handle
    ///
    /// Typically one minted by [`create_action`](crate::create_action).
    pub fn add_action_for<P: Payload>(
        &self,
        action_type: &ActionType<P>,
        transition: Transition<S>,
        scopes: Option<Vec<String>>,
    ) {
        self.shared
            .engine
            .borrow_mut()
            .register(action_type.token().clone(), transition, scopes);
    }

    /// Typed handle for the first action registered as `name`
    ///
    /// `None` if the name is unknown or carries another payload type.
    pub fn action_type<P: Payload>(&self, name: &str) -> Option<ActionType<P>> {
        let engine = self.shared.engine.borrow();
        let token = engine.types.get(name)?;
        (token.payload_type() == std::any::TypeId::of::<P>())
            .then(|| ActionType::from_token(token.clone()))
    }

    /// Names of every registered action
    pub fn action_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.shared.engine.borrow().types.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.shared.engine.borrow().stack.len()
    }

    /// Handlers enabled under the current scopes (memoized)
    pub fn lookup(&self) -> FilteredHandlers<S> {
        self.shared.engine.borrow_mut().lookup()
    }

    // ===== Scopes =====

    /// Activate every scope known right now
    pub fn activate_all(&self) -> bool {
        self.shared.engine.borrow_mut().update_scopes(ScopeState::activate_all)
    }

    /// Activate one or more scopes
    pub fn activate(&self, names: impl IntoScopeNames) -> bool {
        self.shared
            .engine
            .borrow_mut()
            .update_scopes(|scopes| scopes.activate(names))
    }

    /// Deactivate every scope
    pub fn deactivate_all(&self) -> bool {
        self.shared.engine.borrow_mut().update_scopes(ScopeState::deactivate_all)
    }

    /// Deactivate one or more scopes
    pub fn deactivate(&self, names: impl IntoScopeNames) -> bool {
        self.shared
            .engine
            .borrow_mut()
            .update_scopes(|scopes| scopes.deactivate(names))
    }

    /// Whether `name` is currently active
    pub fn is_active(&self, name: &str) -> bool {
        self.shared.engine.borrow().scopes.is_active(name)
    }

    /// Active scope names, sorted
    pub fn active_scopes(&self) -> Vec<String> {
        let engine = self.shared.engine.borrow();
        engine.scopes.active().map(str::to_string).collect()
    }

    /// Every scope referenced by a registered handler, sorted
    pub fn known_scopes(&self) -> Vec<String> {
        let engine = self.shared.engine.borrow();
        engine.scopes.known().map(str::to_string).collect()
    }

    /// Apply scope flags from a map; unknown scopes are ignored
    ///
    /// Returns how many known scopes were set.
    pub fn load_scopes(&self, map: &HashMap<String, bool>) -> usize {
        let mut count = 0;
        self.shared.engine.borrow_mut().update_scopes(|scopes| {
            let before = scopes.export();
            count = scopes.load(map);
            scopes.export() != before
        });
        count
    }

    /// Every known scope with its activation flag
    pub fn export_scopes(&self) -> HashMap<String, bool> {
        self.shared.engine.borrow().scopes.export()
    }

    // ===== Reducers =====

    /// Create a reducer with every scope known so far active
    pub fn create_reducer(&self) -> ScopedReducer<S> {
        self.activate_all();
        self.reducer()
    }

    /// Create a reducer with exactly `scopes` active
    pub fn create_reducer_scoped(&self, scopes: impl IntoScopeNames) -> ScopedReducer<S> {
        self.shared
            .engine
            .borrow_mut()
            .update_scopes(|state| state.replace(scopes));
        self.reducer()
    }

    /// Create a reducer from configuration
    ///
    /// `initial_scopes: None` activates every known scope.
    pub fn create_reducer_with(&self, config: &FluxConfig) -> ScopedReducer<S> {
        match &config.initial_scopes {
            Some(scopes) => self.create_reducer_scoped(scopes.clone()),
            None => self.create_reducer(),
        }
    }

    fn reducer(&self) -> ScopedReducer<S> {
        tracing::debug!(
            marker = ?self.shared.marker,
            active = ?self.active_scopes(),
            handlers = self.handler_count(),
            "created reducer"
        );
        ScopedReducer::new(Rc::clone(&self.shared))
    }

    // ===== Envelopes =====

    /// Start a positional batch from typed handles
    ///
    /// Accepts one handle or a tuple of up to ten; the returned [`Batch`]
    /// takes the payloads in the same positions.
    pub fn act<T: ActionTuple>(&self, types: T) -> Batch<T> {
        Batch::new(self.shared.marker, types)
    }

    /// Start a positional batch from registered action names
    pub fn act_named<I>(&self, names: I) -> Result<NamedBatch>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        // The iterator may call back into this engine; drain it before borrowing.
        let names: Vec<I::Item> = names.into_iter().collect();
        let engine = self.shared.engine.borrow();
        let tokens = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                engine
                    .types
                    .get(name)
                    .cloned()
                    .ok_or_else(|| FluxError::UnknownAction(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(NamedBatch::new(self.shared.marker, tokens))
    }

    /// Build an envelope from a callback receiving every registered constructor
    ///
    /// The callback runs immediately; the engine is not borrowed while it runs.
    pub fn act_with<F, I>(&self, build: F) -> RootAction
    where
        F: FnOnce(&ActionCreators) -> I,
        I: IntoIterator<Item = Action>,
    {
        let creators = ActionCreators::new(self.shared.engine.borrow().types.clone());
        let actions = build(&creators).into_iter().collect();
        RootAction::new(self.shared.marker, actions)
    }

    /// Wrap already built actions into an envelope
    pub fn envelope(&self, actions: impl IntoIterator<Item = Action>) -> RootAction {
        RootAction::new(self.shared.marker, actions.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct State {
        count: i32,
        log: Vec<&'static str>,
    }

    fn tagged_flux() -> Flux<State> {
        let flux = Flux::new(State::default());
        flux.add_scoped_action("a", ["a"], |s: &mut State, _: ()| s.log.push("a"));
        flux.add_scoped_action("b", ["b"], |s: &mut State, _: ()| s.log.push("b"));
        flux.add_action("plain", |s: &mut State, _: ()| s.log.push("plain"));
        flux
    }

    fn enabled(flux: &Flux<State>) -> Vec<String> {
        flux.lookup()
            .iter()
            .map(|h| h.token().name().to_string())
            .collect()
    }

    #[test]
    fn test_scope_filtering() {
        let flux = tagged_flux();
        assert_eq!(enabled(&flux), vec!["plain"]);

        flux.activate_all();
        assert_eq!(enabled(&flux), vec!["a", "b", "plain"]);

        flux.deactivate_all();
        assert_eq!(enabled(&flux), vec!["plain"]);

        flux.activate(["a"]);
        assert_eq!(enabled(&flux), vec!["a", "plain"]);

        flux.deactivate(["a"]);
        assert_eq!(enabled(&flux), vec!["plain"]);
    }

    #[test]
    fn test_cache_survives_noop_scope_changes() {
        let flux = tagged_flux();
        flux.activate("a");
        let first = flux.lookup();
        let second = flux.lookup();
        assert!(Rc::ptr_eq(&first, &second));

        assert!(!flux.activate("a"));
        assert!(!flux.deactivate("b"));
        assert!(!flux.activate("unknown"));
        assert!(Rc::ptr_eq(&first, &flux.lookup()));

        assert!(flux.activate("b"));
        let third = flux.lookup();
        assert!(!Rc::ptr_eq(&first, &third));
        assert_eq!(third.len(), 3);
    }

    #[test]
    fn test_register_invalidates_cache() {
        let flux = tagged_flux();
        let before = flux.lookup();
        flux.add_action("more", |s: &mut State, _: ()| s.log.push("more"));
        let after = flux.lookup();
        assert!(!Rc::ptr_eq(&before, &after));
        assert_eq!(after.len(), before.len() + 1);
    }

    #[test]
    fn test_new_scopes_join_universe_inactive() {
        let flux = tagged_flux();
        flux.activate_all();
        flux.add_scoped_action("c", "c", |s: &mut State, _: ()| s.log.push("c"));

        assert_eq!(flux.known_scopes(), vec!["a", "b", "c"]);
        assert_eq!(flux.active_scopes(), vec!["a", "b"]);
    }

    #[test]
    fn test_create_reducer_defaults_to_all_scopes() {
        let flux = tagged_flux();
        let _reducer = flux.create_reducer();
        assert_eq!(flux.active_scopes(), vec!["a", "b"]);

        let _reducer = flux.create_reducer_scoped("b");
        assert_eq!(flux.active_scopes(), vec!["b"]);
    }

    #[test]
    fn test_action_type_lookup_checks_payload() {
        let flux = tagged_flux();
        assert!(flux.action_type::<()>("plain").is_some());
        assert!(flux.action_type::<i32>("plain").is_none());
        assert!(flux.action_type::<()>("missing").is_none());
    }

    #[test]
    fn test_duplicate_names_keep_first_type() {
        let flux = Flux::new(State::default());
        let first = flux.add_action("dup", |s: &mut State, _: ()| s.count = 1);
        let second = flux.add_action("dup", |s: &mut State, _: ()| s.count = 2);
        assert_ne!(first, second);
        assert_eq!(flux.action_type::<()>("dup"), Some(first));
        assert_eq!(flux.handler_count(), 2);
    }

    #[test]
    fn test_load_and_export_scopes() {
        let flux = tagged_flux();
        let before = flux.lookup();

        let mut map = HashMap::new();
        map.insert("a".to_string(), true);
        map.insert("zzz".to_string(), true);
        assert_eq!(flux.load_scopes(&map), 1);
        assert!(!Rc::ptr_eq(&before, &flux.lookup()));

        let exported = flux.export_scopes();
        assert_eq!(exported.get("a"), Some(&true));
        assert_eq!(exported.get("b"), Some(&false));
    }

    #[test]
    fn test_act_named_unknown_action() {
        let flux = tagged_flux();
        let err = flux.act_named(["plain", "nope"]).unwrap_err();
        assert!(matches!(err, FluxError::UnknownAction(name) if name == "nope"));
    }

    #[test]
    fn test_act_named_iterator_may_reenter_engine() {
        let flux = tagged_flux();
        let names = ["a", "plain"].into_iter().inspect(|_| {
            flux.activate("a");
        });
        let batch = flux.act_named(names).unwrap();
        assert_eq!(batch.names(), vec!["a", "plain"]);
        assert!(flux.is_active("a"));
    }

    struct DropFlag(Rc<std::cell::Cell<bool>>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    #[test]
    fn test_weak_handle_does_not_keep_engine_alive() {
        let dropped = Rc::new(std::cell::Cell::new(false));
        let weak = {
            let flux = tagged_flux();
            let weak = flux.downgrade();
            let guard = DropFlag(Rc::clone(&dropped));
            let handle = flux.downgrade();
            flux.add_action("unlock", move |s: &mut State, _: ()| {
                let _keep = &guard;
                if let Some(flux) = handle.upgrade() {
                    flux.activate("b");
                }
                s.log.push("unlock");
            });
            let reducer = flux.create_reducer();
            let unlock = flux.action_type::<()>("unlock").unwrap();
            reducer.reduce(None, &flux.act(&unlock).with(()));
            assert!(weak.upgrade().is_some());
            weak
        };

        assert!(dropped.get());
        assert!(weak.upgrade().is_none());
    }
}
