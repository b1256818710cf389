//! Actions, typed action handles and the batched envelope
//!
//! An [`Action`] pairs an [`ActionToken`] with a type-erased payload. Actions
//! never travel alone: they are bundled into a [`RootAction`] envelope that is
//! stamped with the marker of the engine that built it.

use std::any::{Any, TypeId};
use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::token::{ActionToken, RootMarker};

/// Bound satisfied by every value usable as an action payload
///
/// Payloads are cloned out of the envelope when a transition runs, so the
/// same envelope can be replayed or logged afterwards.
pub trait Payload: Any + Clone + Debug + Send + Sync {}

impl<T: Any + Clone + Debug + Send + Sync> Payload for T {}

trait ErasedPayload: Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Payload> ErasedPayload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One named, typed intent inside an envelope
#[derive(Clone)]
pub struct Action {
    token: ActionToken,
    payload: Arc<dyn ErasedPayload>,
}

impl Action {
    pub(crate) fn new<P: Payload>(token: ActionToken, payload: P) -> Self {
        Self {
            token,
            payload: Arc::new(payload),
        }
    }

    pub(crate) fn from_dyn(token: ActionToken, payload: DynPayload) -> Self {
        Self {
            token,
            payload: payload.payload,
        }
    }

    /// The action type this action was created for
    pub fn action_type(&self) -> &ActionToken {
        &self.token
    }

    /// Human-readable action name
    pub fn name(&self) -> &str {
        self.token.name()
    }

    /// Borrow the payload if it is a `P`
    pub fn payload<P: Payload>(&self) -> Option<&P> {
        // Deref first: `Arc<dyn ErasedPayload>` is itself a payload type.
        (*self.payload).as_any().downcast_ref::<P>()
    }

    /// Short `name(payload)` representation used by loggers
    pub fn summary(&self) -> String {
        format!("{}({:?})", self.token.name(), self.payload)
    }
}

impl Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("type", &self.token)
            .field("payload", &self.payload)
            .finish()
    }
}

/// Type-erased payload for batches built from action names
#[derive(Clone, Debug)]
pub struct DynPayload {
    payload: Arc<dyn ErasedPayload>,
    payload_type: TypeId,
}

impl DynPayload {
    /// Erase `payload`
    pub fn new<P: Payload>(payload: P) -> Self {
        Self {
            payload: Arc::new(payload),
            payload_type: TypeId::of::<P>(),
        }
    }

    /// Type id of the erased value
    pub fn payload_type(&self) -> TypeId {
        self.payload_type
    }
}

/// Typed handle for one action type
///
/// Returned by registration and by [`create_action`]. The handle is the only
/// way to build an [`Action`] whose payload type is checked at compile time.
pub struct ActionType<P> {
    token: ActionToken,
    _payload: PhantomData<fn(P) -> P>,
}

impl<P> Clone for ActionType<P> {
    fn clone(&self) -> Self {
        Self {
            token: self.token.clone(),
            _payload: PhantomData,
        }
    }
}

impl<P> Debug for ActionType<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActionType").field(&self.token).finish()
    }
}

impl<P> PartialEq for ActionType<P> {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl<P> Eq for ActionType<P> {}

impl<P: Payload> ActionType<P> {
    pub(crate) fn from_token(token: ActionToken) -> Self {
        Self {
            token,
            _payload: PhantomData,
        }
    }

    /// Build an action of this type carrying `payload`
    pub fn create(&self, payload: P) -> Action {
        Action::new(self.token.clone(), payload)
    }

    /// Underlying token
    pub fn token(&self) -> &ActionToken {
        &self.token
    }

    /// Human-readable action name
    pub fn name(&self) -> &str {
        self.token.name()
    }
}

/// Mint a standalone action type outside any engine
///
/// The resulting actions fit into any envelope, but only engines that bound
/// a handler to this exact handle (see `Flux::add_action_for`) react to them.
///
/// # Example
///
/// ```
/// use flux_scope_core::create_action;
///
/// #[derive(Clone, Debug)]
/// struct Rename { name: String }
///
/// let rename = create_action::<Rename>("rename");
/// let action = rename.create(Rename { name: "aaa".into() });
/// assert_eq!(action.name(), "rename");
/// assert_eq!(action.payload::<Rename>().unwrap().name, "aaa");
/// ```
pub fn create_action<P: Payload>(name: &str) -> ActionType<P> {
    ActionType::from_token(ActionToken::mint::<P>(name))
}

/// Envelope carrying an ordered batch of actions
///
/// This is the only value a `ScopedReducer` reacts to. Envelopes stamped by
/// another engine are ignored.
#[derive(Clone)]
pub struct RootAction {
    marker: RootMarker,
    actions: Vec<Action>,
}

impl RootAction {
    /// Wrap `actions` into an envelope stamped with `marker`
    pub fn new(marker: RootMarker, actions: Vec<Action>) -> Self {
        Self { marker, actions }
    }

    /// Marker of the engine that built this envelope
    pub fn marker(&self) -> RootMarker {
        self.marker
    }

    /// Sub-actions in dispatch order
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Number of sub-actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the envelope carries no sub-actions
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Names of the sub-actions in dispatch order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(Action::name)
    }

    /// Comma-separated summary of every sub-action
    pub fn summary(&self) -> String {
        self.actions
            .iter()
            .map(Action::summary)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Debug for RootAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootAction")
            .field("marker", &self.marker)
            .field("actions", &self.actions)
            .finish()
    }
}
