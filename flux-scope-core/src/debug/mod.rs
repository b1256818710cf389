//! Debugging aids for envelopes flowing through a store
//!
//! Currently only the action logger middleware, which unpacks every
//! envelope and records its sub-actions.

pub mod action_logger;

pub use action_logger::{
    glob_match, ActionLog, ActionLogConfig, ActionLogEntry, ActionLoggerConfig,
    ActionLoggerMiddleware,
};
