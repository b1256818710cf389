//! Core types for flux-scope
//!
//! A reducer-stack engine for Flux/Redux style stores. Handlers are
//! registered per action type, optionally gated by named scopes, and the
//! reducer handed to a store only runs the handlers whose scopes are active
//! at dispatch time.
//!
//! # Core Concepts
//!
//! - **Flux**: the engine; registers handlers, toggles scopes, builds envelopes
//! - **ActionType**: typed handle minted per registration; creates actions
//! - **RootAction**: envelope carrying an ordered batch of actions
//! - **ScopedReducer**: folds envelopes from its own engine into state
//! - **Store**: holds the state and runs middleware around dispatch
//!
//! # Basic Example
//!
//! ```
//! use flux_scope_core::prelude::*;
//!
//! #[derive(Clone, Debug, Default)]
//! struct AppState {
//!     counter: i32,
//! }
//!
//! let flux = Flux::new(AppState::default());
//! let increment = flux.add_action("increment", |s: &mut AppState, _: ()| s.counter += 1);
//! let turbo = flux.add_scoped_action("turbo", "turbo", |s: &mut AppState, _: ()| s.counter *= 10);
//!
//! let mut store = Store::new(flux.create_reducer_scoped(Vec::<String>::new()));
//! store.dispatch(&flux.act((&increment, &turbo)).with(((), ())));
//! assert_eq!(store.state().counter, 1);
//!
//! flux.activate("turbo");
//! store.dispatch(&flux.act((&increment, &turbo)).with(((), ())));
//! assert_eq!(store.state().counter, 20);
//! ```
//!
//! # Batching
//!
//! Every dispatch is an envelope. One envelope may carry many actions; they
//! are applied left to right and each sees the state left by the previous
//! one. A transition may itself toggle scopes through a [`WeakFlux`] from
//! [`Flux::downgrade`], which affects the remaining actions of the same
//! envelope. Capturing a `Flux` clone instead would keep the engine alive.
//!
//! ```
//! use flux_scope_core::Flux;
//!
//! #[derive(Clone, Debug, Default)]
//! struct AppState { count: i32 }
//!
//! let flux = Flux::new(AppState::default());
//! let add = flux.add_scoped_action("add", "unlocked", |s: &mut AppState, by: i32| s.count += by);
//! let engine = flux.downgrade();
//! let unlock = flux.add_action("unlock", move |_: &mut AppState, _: ()| {
//!     if let Some(flux) = engine.upgrade() {
//!         flux.activate("unlocked");
//!     }
//! });
//!
//! let reducer = flux.create_reducer_scoped(Vec::<String>::new());
//! let state = reducer.reduce(None, &flux.act((&add, &unlock, &add)).with((1, (), 2)));
//! assert_eq!(state.count, 2);
//! ```

pub mod action;
pub mod batch;
pub mod config;
pub mod debug;
pub mod draft;
pub mod error;
pub mod flux;
pub mod reducer;
pub mod scope;
pub mod stack;
pub mod store;
pub mod testing;
pub mod token;

// Engine exports
pub use flux::{Flux, WeakFlux};
pub use reducer::{DispatchReport, ScopedReducer};

// Action exports
pub use action::{create_action, Action, ActionType, DynPayload, Payload, RootAction};
pub use batch::{ActionCreators, ActionHandle, ActionTuple, Batch, NamedBatch};
pub use token::{ActionToken, RootMarker};

// Handler exports
pub use scope::{IntoScopeNames, ScopeState};
pub use stack::{
    FilteredHandlers, HandlerEntry, ReducerStack, Transition, TransitionKind, TransitionResult,
};

// Store exports
pub use store::{
    ComposedMiddleware, LoggingMiddleware, Middleware, NoopMiddleware, Store,
    StoreWithMiddleware,
};

pub use config::FluxConfig;
pub use draft::produce;
pub use error::{FluxError, Result};

// Testing exports
pub use testing::TestHarness;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{create_action, Action, ActionType, DynPayload, RootAction};
    pub use crate::debug::{ActionLoggerConfig, ActionLoggerMiddleware};
    pub use crate::draft::produce;
    pub use crate::flux::{Flux, WeakFlux};
    pub use crate::reducer::{DispatchReport, ScopedReducer};
    pub use crate::stack::Transition;
    pub use crate::store::{
        ComposedMiddleware, LoggingMiddleware, Middleware, NoopMiddleware, Store,
        StoreWithMiddleware,
    };
    pub use crate::{FluxConfig, FluxError};
}
