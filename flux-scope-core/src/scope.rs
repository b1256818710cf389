//! Scope activation state
//!
//! Scopes are named gates over registered handlers. A handler tagged with
//! scopes only runs while at least one of them is active; untagged handlers
//! always run.
//!
//! # Example
//!
//! ```
//! use flux_scope_core::ScopeState;
//!
//! let mut scopes = ScopeState::new();
//! scopes.register(["editor", "search"]);
//!
//! assert!(scopes.activate("editor"));
//! assert!(!scopes.activate("editor")); // already active
//! assert!(scopes.is_active("editor"));
//!
//! assert!(scopes.deactivate_all());
//! assert!(!scopes.is_active("editor"));
//! ```

use std::collections::{BTreeSet, HashMap};

/// Conversion into an ordered list of scope names
///
/// Lets every scope operation accept a single name or a sequence of names.
pub trait IntoScopeNames {
    /// Collect the names in order
    fn into_scope_names(self) -> Vec<String>;
}

impl IntoScopeNames for &str {
    fn into_scope_names(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoScopeNames for String {
    fn into_scope_names(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoScopeNames for &String {
    fn into_scope_names(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl<T: AsRef<str>> IntoScopeNames for Vec<T> {
    fn into_scope_names(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<T: AsRef<str>> IntoScopeNames for &[T] {
    fn into_scope_names(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<T: AsRef<str>, const N: usize> IntoScopeNames for [T; N] {
    fn into_scope_names(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

/// Known scopes and the subset currently active
///
/// The universe only grows, through [`ScopeState::register`]. The active set
/// never holds a name outside the universe: activating an unknown scope is
/// accepted and ignored. Every mutator returns whether the active set
/// actually changed, so callers can skip cache invalidation on no-ops.
#[derive(Debug, Clone, Default)]
pub struct ScopeState {
    universe: BTreeSet<String>,
    active: BTreeSet<String>,
}

impl ScopeState {
    /// Create an empty scope state
    pub fn new() -> Self {
        Self::default()
    }

    /// Add scope names to the universe
    ///
    /// Newly known scopes start inactive. Returns `true` if any name was new.
    pub fn register(&mut self, names: impl IntoScopeNames) -> bool {
        let mut grew = false;
        for name in names.into_scope_names() {
            grew |= self.universe.insert(name);
        }
        grew
    }

    /// Whether `name` was ever registered
    pub fn is_known(&self, name: &str) -> bool {
        self.universe.contains(name)
    }

    /// Whether `name` is currently active
    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    /// Whether any of `scopes` is currently active
    pub fn any_active<'a>(&self, mut scopes: impl Iterator<Item = &'a String>) -> bool {
        scopes.any(|s| self.active.contains(s))
    }

    /// All known scope names, sorted
    pub fn known(&self) -> impl Iterator<Item = &str> {
        self.universe.iter().map(|s| s.as_str())
    }

    /// Active scope names, sorted
    pub fn active(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(|s| s.as_str())
    }

    /// Activate every scope known right now
    ///
    /// Scopes registered later stay inactive until activated explicitly.
    pub fn activate_all(&mut self) -> bool {
        if self.active.len() == self.universe.len() {
            return false;
        }
        self.active = self.universe.clone();
        true
    }

    /// Activate the given scopes
    pub fn activate(&mut self, names: impl IntoScopeNames) -> bool {
        let mut changed = false;
        for name in names.into_scope_names() {
            if !self.universe.contains(&name) {
                tracing::trace!(scope = %name, "ignoring activation of unknown scope");
                continue;
            }
            changed |= self.active.insert(name);
        }
        changed
    }

    /// Deactivate every scope
    pub fn deactivate_all(&mut self) -> bool {
        if self.active.is_empty() {
            return false;
        }
        self.active.clear();
        true
    }

    /// Deactivate the given scopes
    pub fn deactivate(&mut self, names: impl IntoScopeNames) -> bool {
        let mut changed = false;
        for name in names.into_scope_names() {
            changed |= self.active.remove(&name);
        }
        changed
    }

    /// Make exactly the given scopes active
    pub fn replace(&mut self, names: impl IntoScopeNames) -> bool {
        let next: BTreeSet<String> = names
            .into_scope_names()
            .into_iter()
            .filter(|name| self.universe.contains(name))
            .collect();
        if next == self.active {
            return false;
        }
        self.active = next;
        true
    }

    /// Apply activation flags from a map (e.g. from a config file)
    ///
    /// Unknown scopes are ignored. Returns how many known scopes were set.
    pub fn load(&mut self, map: &HashMap<String, bool>) -> usize {
        let mut count = 0;
        for (name, enabled) in map {
            if !self.universe.contains(name) {
                continue;
            }
            if *enabled {
                self.active.insert(name.clone());
            } else {
                self.active.remove(name);
            }
            count += 1;
        }
        count
    }

    /// Export every known scope with its activation flag
    pub fn export(&self) -> HashMap<String, bool> {
        self.universe
            .iter()
            .map(|name| (name.clone(), self.active.contains(name)))
            .collect()
    }
}
