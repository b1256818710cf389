//! Opaque identities for action types and envelopes
//!
//! Every registered action name gets an [`ActionToken`] minted from a single
//! process-wide counter. Tokens compare by identity, never by name: two
//! engines registering `"increment"` hold two distinct tokens.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Process-unique identity of one registered action type
///
/// Carries the human-readable name and the payload [`TypeId`] for logging
/// and diagnostics. Equality and hashing only look at the minted id.
#[derive(Clone)]
pub struct ActionToken {
    id: u64,
    name: Arc<str>,
    payload_type: TypeId,
}

impl ActionToken {
    /// Mint a fresh token for an action name carrying payloads of type `P`
    pub fn mint<P: 'static>(name: impl Into<Arc<str>>) -> Self {
        Self {
            id: next_id(),
            name: name.into(),
            payload_type: TypeId::of::<P>(),
        }
    }

    /// Human-readable action name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw minted id (only meaningful for comparisons and logs)
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Type id of the payload this action type carries
    pub fn payload_type(&self) -> TypeId {
        self.payload_type
    }
}

impl PartialEq for ActionToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ActionToken {}

impl Hash for ActionToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Sentinel stamped on every envelope built by one engine instance
///
/// A reducer only processes envelopes carrying its own engine's marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootMarker(u64);

impl RootMarker {
    /// Mint a marker that no other engine shares
    pub fn mint() -> Self {
        Self(next_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_with_same_name_differ() {
        let a = ActionToken::mint::<()>("x");
        let b = ActionToken::mint::<()>("x");
        assert_ne!(a, b);
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn test_token_clone_is_equal() {
        let a = ActionToken::mint::<u32>("count");
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.payload_type(), TypeId::of::<u32>());
    }

    #[test]
    fn test_root_markers_are_unique() {
        assert_ne!(RootMarker::mint(), RootMarker::mint());
    }

    #[test]
    fn test_token_display_uses_name() {
        let token = ActionToken::mint::<()>("hoge");
        assert_eq!(token.to_string(), "hoge");
        assert!(format!("{:?}", token).starts_with("hoge#"));
    }
}
