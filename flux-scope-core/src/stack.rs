//! Registered handlers and the scope-filtered lookup cache

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::action::{Action, Payload};
use crate::scope::ScopeState;
use crate::token::ActionToken;

/// What a transition hands back to the dispatch loop
///
/// - `()` means the transition mutated the state in place.
/// - `Option<S>`: `Some(next)` replaces the state, `None` keeps it.
pub trait TransitionResult<S> {
    /// Replacement state, if any
    fn into_next(self) -> Option<S>;
}

impl<S> TransitionResult<S> for () {
    #[inline]
    fn into_next(self) -> Option<S> {
        None
    }
}

impl<S> TransitionResult<S> for Option<S> {
    #[inline]
    fn into_next(self) -> Option<S> {
        self
    }
}

/// Result of running one transition against the fold state
pub(crate) enum Step<S> {
    Kept,
    Replaced(S),
    PayloadMismatch,
}

impl<S> Step<S> {
    fn from_next(next: Option<S>) -> Self {
        match next {
            Some(state) => Step::Replaced(state),
            None => Step::Kept,
        }
    }
}

/// Calling convention a transition was registered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// `(state, payload) -> result`
    Direct,
    /// `payload -> (state -> result)`
    Curried,
}

type DirectFn<S> = dyn Fn(&mut S, &Action) -> Step<S>;
type Continuation<S> = Box<dyn FnOnce(&mut S) -> Option<S>>;
type CurriedFn<S> = dyn Fn(&Action) -> Option<Continuation<S>>;

enum Callable<S> {
    Direct(Box<DirectFn<S>>),
    Curried(Box<CurriedFn<S>>),
}

/// A state-transition function, tagged with its calling convention
///
/// # Example
///
/// ```
/// use flux_scope_core::{Transition, TransitionKind};
///
/// #[derive(Clone, Default)]
/// struct State { count: i32 }
///
/// let add = Transition::direct(|state: &mut State, by: i32| state.count += by);
/// assert_eq!(add.kind(), TransitionKind::Direct);
///
/// let set = Transition::curried(|to: i32| move |state: &mut State| {
///     Some(State { count: to, ..state.clone() })
/// });
/// assert_eq!(set.kind(), TransitionKind::Curried);
/// ```
pub struct Transition<S> {
    callable: Callable<S>,
}

impl<S: 'static> Transition<S> {
    /// Transition called as `f(&mut state, payload)`
    pub fn direct<P, F, R>(f: F) -> Self
    where
        P: Payload,
        F: Fn(&mut S, P) -> R + 'static,
        R: TransitionResult<S> + 'static,
    {
        let erased = move |state: &mut S, action: &Action| match action.payload::<P>() {
            Some(payload) => Step::from_next(f(state, payload.clone()).into_next()),
            None => Step::PayloadMismatch,
        };
        Self {
            callable: Callable::Direct(Box::new(erased)),
        }
    }

    /// Transition called as `f(payload)(&mut state)`
    pub fn curried<P, F, G, R>(f: F) -> Self
    where
        P: Payload,
        F: Fn(P) -> G + 'static,
        G: FnOnce(&mut S) -> R + 'static,
        R: TransitionResult<S> + 'static,
    {
        let erased = move |action: &Action| -> Option<Continuation<S>> {
            let payload = action.payload::<P>()?.clone();
            let apply = f(payload);
            Some(Box::new(move |state: &mut S| apply(state).into_next()))
        };
        Self {
            callable: Callable::Curried(Box::new(erased)),
        }
    }
}

impl<S> Transition<S> {
    /// Calling convention chosen at registration
    pub fn kind(&self) -> TransitionKind {
        match self.callable {
            Callable::Direct(_) => TransitionKind::Direct,
            Callable::Curried(_) => TransitionKind::Curried,
        }
    }

    pub(crate) fn apply(&self, state: &mut S, action: &Action) -> Step<S> {
        match &self.callable {
            Callable::Direct(f) => f(state, action),
            Callable::Curried(f) => match f(action) {
                Some(continuation) => Step::from_next(continuation(state)),
                None => Step::PayloadMismatch,
            },
        }
    }
}

impl<S> fmt::Debug for Transition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

/// One registered handler
#[derive(Debug)]
pub struct HandlerEntry<S> {
    token: ActionToken,
    transition: Transition<S>,
    scopes: Option<BTreeSet<String>>,
}

impl<S> HandlerEntry<S> {
    /// Bind `transition` to `token`, optionally gated by `scopes`
    pub fn new(token: ActionToken, transition: Transition<S>, scopes: Option<Vec<String>>) -> Self {
        Self {
            token,
            transition,
            scopes: scopes.map(|names| names.into_iter().collect()),
        }
    }

    /// Action type this handler reacts to
    pub fn token(&self) -> &ActionToken {
        &self.token
    }

    /// The registered transition
    pub fn transition(&self) -> &Transition<S> {
        &self.transition
    }

    /// Scopes gating this handler, `None` if it always runs
    pub fn scopes(&self) -> Option<&BTreeSet<String>> {
        self.scopes.as_ref()
    }

    /// Whether the handler runs under the given scope state
    pub fn is_enabled(&self, scopes: &ScopeState) -> bool {
        match &self.scopes {
            None => true,
            Some(tags) => scopes.any_active(tags.iter()),
        }
    }
}

/// Handlers enabled under the current scopes, in registration order
pub type FilteredHandlers<S> = Rc<[Rc<HandlerEntry<S>>]>;

/// Append-only handler stack with a memoized scope filter
///
/// The cache is dropped on every push and whenever the owner reports a scope
/// change, then rebuilt lazily by [`ReducerStack::lookup`].
pub struct ReducerStack<S> {
    entries: Vec<Rc<HandlerEntry<S>>>,
    cache: Option<FilteredHandlers<S>>,
}

impl<S> Default for ReducerStack<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            cache: None,
        }
    }
}

impl<S> fmt::Debug for ReducerStack<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReducerStack")
            .field("entries", &self.entries.len())
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

impl<S> ReducerStack<S> {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler
    pub fn push(&mut self, entry: HandlerEntry<S>) {
        self.entries.push(Rc::new(entry));
        self.invalidate();
    }

    /// Drop the filtered cache
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Whether a filtered list is currently memoized
    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no handler is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All handlers, in registration order
    pub fn entries(&self) -> impl Iterator<Item = &HandlerEntry<S>> {
        self.entries.iter().map(|entry| entry.as_ref())
    }

    /// Handlers enabled under `scopes`
    ///
    /// Returns the memoized list when present. Callers must invalidate the
    /// stack whenever `scopes` changes.
    pub fn lookup(&mut self, scopes: &ScopeState) -> FilteredHandlers<S> {
        if let Some(cached) = &self.cache {
            return Rc::clone(cached);
        }
        let filtered: FilteredHandlers<S> = self
            .entries
            .iter()
            .filter(|entry| entry.is_enabled(scopes))
            .cloned()
            .collect();
        self.cache = Some(Rc::clone(&filtered));
        filtered
    }
}

/// First handler in `handlers` bound to `token`
pub fn find_handler<'a, S>(
    handlers: &'a [Rc<HandlerEntry<S>>],
    token: &ActionToken,
) -> Option<&'a Rc<HandlerEntry<S>>> {
    handlers.iter().find(|entry| entry.token() == token)
}
