//! flux-scope: scoped reducer stacks for Flux/Redux style stores
//!
//! Register state transitions per action type, gate some of them behind
//! named scopes, and flip those scopes at runtime. The reducer you hand to
//! your store always runs against the scopes active at dispatch time.
//!
//! # Example
//! ```
//! use flux_scope::prelude::*;
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Editor { text: String, dirty: bool }
//!
//! let flux = Flux::new(Editor::default());
//! let insert = flux.add_action("insert", |s: &mut Editor, text: String| {
//!     s.text.push_str(&text);
//!     s.dirty = true;
//! });
//! let save = flux.add_scoped_action("save", "writable", |s: &mut Editor, _: ()| s.dirty = false);
//!
//! let mut store = Store::new(flux.create_reducer_scoped(Vec::<String>::new()));
//! let edit_and_save = flux.act((&insert, &save));
//!
//! store.dispatch(&edit_and_save.with(("a".into(), ())));
//! assert!(store.state().dirty);
//!
//! flux.activate("writable");
//! store.dispatch(&edit_and_save.with(("b".into(), ())));
//! assert_eq!(store.state(), &Editor { text: "ab".into(), dirty: false });
//! ```

// Re-export everything from core
pub use flux_scope_core::*;

/// Prelude for convenient imports
pub mod prelude {
    // Engine
    pub use flux_scope_core::{
        create_action, Action, ActionType, DispatchReport, DynPayload, Flux, RootAction,
        ScopedReducer, Transition, WeakFlux,
    };

    // Store
    pub use flux_scope_core::{
        ComposedMiddleware, LoggingMiddleware, Middleware, NoopMiddleware, Store,
        StoreWithMiddleware,
    };

    // Debug
    pub use flux_scope_core::debug::{ActionLogConfig, ActionLoggerConfig, ActionLoggerMiddleware};

    // Config, errors, helpers
    pub use flux_scope_core::{produce, FluxConfig, FluxError};
}
