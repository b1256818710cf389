//! Copy-on-write helper for transitions that prefer returning a new state

/// Apply `mutator` to a copy of `state` and return the copy
///
/// `state` itself is never touched, so a transition can build its
/// replacement from the previous value:
///
/// ```
/// use flux_scope_core::produce;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct State { items: Vec<&'static str> }
///
/// let before = State { items: vec!["a"] };
/// let after = produce(&before, |draft| draft.items.push("b"));
///
/// assert_eq!(before.items, vec!["a"]);
/// assert_eq!(after.items, vec!["a", "b"]);
/// ```
pub fn produce<S: Clone>(state: &S, mutator: impl FnOnce(&mut S)) -> S {
    let mut draft = state.clone();
    mutator(&mut draft);
    draft
}
