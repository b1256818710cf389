//! Building envelopes from several actions at once
//!
//! Three shapes are supported:
//!
//! - **Typed positional**: `flux.act((&hoge, &fuga)).with((p1, p2))`. The
//!   tuple arity fixes how many payloads must be supplied.
//! - **Named positional**: `flux.act_named(["hoge", "fuga"])?.with([..])`,
//!   pairing names with type-erased payloads by position.
//! - **Callback**: `flux.act_with(|c| [c.create("hoge", p1), ..])`.

use std::collections::HashMap;
use std::fmt;

use crate::action::{Action, ActionType, DynPayload, Payload, RootAction};
use crate::error::{FluxError, Result};
use crate::token::{ActionToken, RootMarker};

/// Anything that can stand for a typed action handle
pub trait ActionHandle {
    /// Payload carried by the action
    type Payload: Payload;

    /// The handle itself
    fn handle(&self) -> &ActionType<Self::Payload>;
}

impl<P: Payload> ActionHandle for ActionType<P> {
    type Payload = P;

    fn handle(&self) -> &ActionType<P> {
        self
    }
}

impl<P: Payload> ActionHandle for &ActionType<P> {
    type Payload = P;

    fn handle(&self) -> &ActionType<P> {
        self
    }
}

/// One or more typed handles that a [`Batch`] pairs with payloads
pub trait ActionTuple {
    /// Payloads, in the same positions as the handles
    type Payloads;

    /// Create one action per position
    fn build(&self, payloads: Self::Payloads) -> Vec<Action>;

    /// Action names, in order
    fn names(&self) -> Vec<&str>;
}

impl<P: Payload> ActionTuple for ActionType<P> {
    type Payloads = P;

    fn build(&self, payload: P) -> Vec<Action> {
        vec![self.create(payload)]
    }

    fn names(&self) -> Vec<&str> {
        vec![self.name()]
    }
}

impl<P: Payload> ActionTuple for &ActionType<P> {
    type Payloads = P;

    fn build(&self, payload: P) -> Vec<Action> {
        vec![self.create(payload)]
    }

    fn names(&self) -> Vec<&str> {
        vec![self.name()]
    }
}

macro_rules! impl_action_tuple {
    ($($H:ident $h:ident $p:ident),+) => {
        impl<$($H: ActionHandle),+> ActionTuple for ($($H,)+) {
            type Payloads = ($($H::Payload,)+);

            fn build(&self, payloads: Self::Payloads) -> Vec<Action> {
                let ($($h,)+) = self;
                let ($($p,)+) = payloads;
                vec![$($h.handle().create($p)),+]
            }

            fn names(&self) -> Vec<&str> {
                let ($($h,)+) = self;
                vec![$($h.handle().name()),+]
            }
        }
    };
}

impl_action_tuple!(H1 h1 p1);
impl_action_tuple!(H1 h1 p1, H2 h2 p2);
impl_action_tuple!(H1 h1 p1, H2 h2 p2, H3 h3 p3);
impl_action_tuple!(H1 h1 p1, H2 h2 p2, H3 h3 p3, H4 h4 p4);
impl_action_tuple!(H1 h1 p1, H2 h2 p2, H3 h3 p3, H4 h4 p4, H5 h5 p5);
impl_action_tuple!(H1 h1 p1, H2 h2 p2, H3 h3 p3, H4 h4 p4, H5 h5 p5, H6 h6 p6);
impl_action_tuple!(H1 h1 p1, H2 h2 p2, H3 h3 p3, H4 h4 p4, H5 h5 p5, H6 h6 p6, H7 h7 p7);
impl_action_tuple!(
    H1 h1 p1, H2 h2 p2, H3 h3 p3, H4 h4 p4, H5 h5 p5, H6 h6 p6, H7 h7 p7, H8 h8 p8
);
impl_action_tuple!(
    H1 h1 p1, H2 h2 p2, H3 h3 p3, H4 h4 p4, H5 h5 p5, H6 h6 p6, H7 h7 p7, H8 h8 p8, H9 h9 p9
);
impl_action_tuple!(
    H1 h1 p1, H2 h2 p2, H3 h3 p3, H4 h4 p4, H5 h5 p5, H6 h6 p6, H7 h7 p7, H8 h8 p8, H9 h9 p9,
    H10 h10 p10
);

/// Typed positional batch returned by [`Flux::act`](crate::Flux::act)
///
/// Reusable: every call to [`Batch::with`] builds a new envelope.
pub struct Batch<T> {
    marker: RootMarker,
    types: T,
}

impl<T: ActionTuple> Batch<T> {
    pub(crate) fn new(marker: RootMarker, types: T) -> Self {
        Self { marker, types }
    }

    /// Pair each handle with the payload in the same position
    pub fn with(&self, payloads: T::Payloads) -> RootAction {
        RootAction::new(self.marker, self.types.build(payloads))
    }

    /// Action names, in order
    pub fn names(&self) -> Vec<&str> {
        self.types.names()
    }
}

impl<T: ActionTuple> fmt::Debug for Batch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("marker", &self.marker)
            .field("names", &self.names())
            .finish()
    }
}

/// Positional batch over registered names, returned by [`Flux::act_named`](crate::Flux::act_named)
#[derive(Debug, Clone)]
pub struct NamedBatch {
    marker: RootMarker,
    tokens: Vec<ActionToken>,
}

impl NamedBatch {
    pub(crate) fn new(marker: RootMarker, tokens: Vec<ActionToken>) -> Self {
        Self { marker, tokens }
    }

    /// Pair names with payloads by position
    ///
    /// Positions present on only one side are dropped. Values are never
    /// inspected: `0`, `false` or `""` are kept like any other payload.
    /// Fails if a payload's type differs from the one its action was
    /// registered with.
    pub fn with(&self, payloads: impl IntoIterator<Item = DynPayload>) -> Result<RootAction> {
        let actions = self
            .tokens
            .iter()
            .zip(payloads)
            .map(|(token, payload)| {
                if payload.payload_type() != token.payload_type() {
                    return Err(FluxError::PayloadMismatch {
                        action: token.name().to_string(),
                    });
                }
                Ok(Action::from_dyn(token.clone(), payload))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RootAction::new(self.marker, actions))
    }

    /// Action names, in order
    pub fn names(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.name()).collect()
    }
}

/// Constructors for every registered action, passed to [`Flux::act_with`](crate::Flux::act_with)
#[derive(Debug, Clone)]
pub struct ActionCreators {
    types: HashMap<String, ActionToken>,
}

impl ActionCreators {
    pub(crate) fn new(types: HashMap<String, ActionToken>) -> Self {
        Self { types }
    }

    /// Typed handle for `name`, if registered with payload type `P`
    pub fn get<P: Payload>(&self, name: &str) -> Option<ActionType<P>> {
        let token = self.types.get(name)?;
        (token.payload_type() == std::any::TypeId::of::<P>())
            .then(|| ActionType::from_token(token.clone()))
    }

    /// Build an action for `name`
    ///
    /// An unregistered name or a mismatched payload type still yields an
    /// action, which every reducer of this engine skips.
    pub fn create<P: Payload>(&self, name: &str, payload: P) -> Action {
        match self.get::<P>(name) {
            Some(action_type) => action_type.create(payload),
            None => {
                tracing::debug!(action = name, "no matching action type, creating an inert action");
                Action::new(ActionToken::mint::<P>(name), payload)
            }
        }
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Every registered name, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::create_action;

    #[test]
    fn test_tuple_batch_keeps_order() {
        let a = create_action::<i32>("a");
        let b = create_action::<bool>("b");
        let c = create_action::<String>("c");
        let marker = RootMarker::mint();

        let batch = Batch::new(marker, (&a, &b, &c));
        assert_eq!(batch.names(), vec!["a", "b", "c"]);

        let root = batch.with((0, false, String::new()));
        assert_eq!(root.marker(), marker);
        assert_eq!(root.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(root.actions()[0].payload::<i32>(), Some(&0));
        assert_eq!(root.actions()[1].payload::<bool>(), Some(&false));
    }

    #[test]
    fn test_single_handle_batch() {
        let a = create_action::<i32>("a");
        let root = Batch::new(RootMarker::mint(), a).with(7);
        assert_eq!(root.len(), 1);
    }

    #[test]
    fn test_ten_handle_batch() {
        let n = create_action::<u8>("n");
        let batch = Batch::new(
            RootMarker::mint(),
            (&n, &n, &n, &n, &n, &n, &n, &n, &n, &n),
        );
        let root = batch.with((0, 1, 2, 3, 4, 5, 6, 7, 8, 9));
        assert_eq!(root.len(), 10);
        assert_eq!(root.actions()[9].payload::<u8>(), Some(&9));
    }

    #[test]
    fn test_named_batch_drops_unsupplied_positions() {
        let a = create_action::<i32>("a");
        let b = create_action::<bool>("b");
        let batch = NamedBatch::new(
            RootMarker::mint(),
            vec![a.token().clone(), b.token().clone(), a.token().clone()],
        );

        let root = batch
            .with([DynPayload::new(0i32), DynPayload::new(false)])
            .unwrap();
        assert_eq!(root.len(), 2);
        assert_eq!(root.actions()[0].payload::<i32>(), Some(&0));
        assert_eq!(root.actions()[1].payload::<bool>(), Some(&false));
    }

    #[test]
    fn test_named_batch_rejects_wrong_payload() {
        let a = create_action::<i32>("a");
        let batch = NamedBatch::new(RootMarker::mint(), vec![a.token().clone()]);
        let err = batch.with([DynPayload::new("nope")]).unwrap_err();
        assert!(matches!(err, FluxError::PayloadMismatch { action } if action == "a"));
    }

    #[test]
    fn test_creators() {
        let a = create_action::<i32>("a");
        let mut types = HashMap::new();
        types.insert("a".to_string(), a.token().clone());
        let creators = ActionCreators::new(types);

        assert!(creators.contains("a"));
        assert_eq!(creators.get::<i32>("a"), Some(a.clone()));
        assert!(creators.get::<bool>("a").is_none());

        assert_eq!(creators.create("a", 1i32).action_type(), a.token());
        assert_ne!(creators.create("a", true).action_type(), a.token());
        assert_ne!(creators.create("zzz", 1i32).action_type(), a.token());
    }
}
