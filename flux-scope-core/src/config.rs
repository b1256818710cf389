//! Engine configuration
//!
//! Loaded from JSON, typically next to the rest of an application's
//! settings:
//!
//! ```
//! use flux_scope_core::FluxConfig;
//!
//! let config = FluxConfig::from_json(r#"{
//!     "initial_scopes": ["editor"],
//!     "logger": { "include_patterns": ["search*"] }
//! }"#).unwrap();
//!
//! assert_eq!(config.initial_scopes, Some(vec!["editor".to_string()]));
//! assert!(config.logger.should_log("search_add_char"));
//! assert!(!config.logger.should_log("tick"));
//! ```

use serde::{Deserialize, Serialize};

use crate::debug::ActionLoggerConfig;
use crate::error::Result;

/// Settings applied when creating reducers and logging middleware
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluxConfig {
    /// Scopes active when a reducer is created; `None` activates all known scopes
    pub initial_scopes: Option<Vec<String>>,
    /// Filter for the action logger middleware
    pub logger: ActionLoggerConfig,
}

impl FluxConfig {
    /// Parse a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
