//! Sub-action logging with pattern-based filtering and in-memory storage
//!
//! Every envelope passing through a store is unpacked and each sub-action is
//! matched against glob patterns. Matching sub-actions are logged through
//! `tracing` and, optionally, kept in a ring buffer for later inspection.
//!
//! # Example
//!
//! ```ignore
//! use flux_scope_core::debug::{ActionLogConfig, ActionLoggerConfig, ActionLoggerMiddleware};
//!
//! // Log everything except the high-frequency `tick` action (tracing only)
//! let middleware = ActionLoggerMiddleware::new(ActionLoggerConfig::new(None, Some("tick")));
//!
//! // Also keep the last 100 sub-actions in memory
//! let middleware = ActionLoggerMiddleware::with_log(ActionLogConfig::default());
//!
//! if let Some(log) = middleware.log() {
//!     for entry in log.recent(10) {
//!         println!("{}: {}", entry.elapsed_display(), entry.summary);
//!     }
//! }
//! ```

use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::action::{Action, RootAction};
use crate::reducer::DispatchReport;
use crate::store::Middleware;
use crate::token::ActionToken;

/// Glob pattern filter over action names.
///
/// Patterns support:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
/// - Literal text matches exactly
///
/// # Examples
///
/// - `search*` matches search_add_char, search_clear, etc.
/// - `*_error` matches any action ending in "_error"
/// - `tick` matches only tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionLoggerConfig {
    /// If non-empty, only log actions matching these patterns
    pub include_patterns: Vec<String>,
    /// Exclude actions matching these patterns (applied after include)
    pub exclude_patterns: Vec<String>,
}

fn split_patterns(patterns: Option<&str>) -> Vec<String> {
    patterns
        .map(|s| {
            s.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

impl ActionLoggerConfig {
    /// Create a config from comma-separated pattern strings
    ///
    /// # Example
    /// ```
    /// use flux_scope_core::debug::ActionLoggerConfig;
    ///
    /// let config = ActionLoggerConfig::new(Some("search*,connect"), Some("search_tick"));
    /// assert!(config.should_log("search_add_char"));
    /// assert!(config.should_log("connect"));
    /// assert!(!config.should_log("search_tick"));
    /// assert!(!config.should_log("render"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include_patterns: split_patterns(include),
            exclude_patterns: split_patterns(exclude),
        }
    }

    /// Create a config with specific pattern vectors
    pub fn with_patterns(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            include_patterns: include,
            exclude_patterns: exclude,
        }
    }

    /// Check if an action name passes the include/exclude patterns
    pub fn should_log(&self, action_name: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self
                .include_patterns
                .iter()
                .any(|p| glob_match(p, action_name))
        {
            return false;
        }

        !self
            .exclude_patterns
            .iter()
            .any(|p| glob_match(p, action_name))
    }
}

// ============================================================================
// In-Memory Action Log
// ============================================================================

/// An entry in the action log
#[derive(Debug, Clone)]
pub struct ActionLogEntry {
    /// Token of the logged sub-action
    pub action_type: ActionToken,
    /// `name(payload)` summary
    pub summary: String,
    /// Timestamp when the sub-action was logged
    pub timestamp: Instant,
    /// Sequence number for ordering
    pub sequence: u64,
    /// Whether a transition ran for this sub-action (set after dispatch)
    pub applied: Option<bool>,
}

impl ActionLogEntry {
    /// Create a new log entry
    pub fn new(action: &Action, sequence: u64) -> Self {
        Self {
            action_type: action.action_type().clone(),
            summary: action.summary(),
            timestamp: Instant::now(),
            sequence,
            applied: None,
        }
    }

    /// Action name
    pub fn name(&self) -> &str {
        self.action_type.name()
    }

    /// Time since this sub-action was logged
    pub fn elapsed(&self) -> std::time::Duration {
        self.timestamp.elapsed()
    }

    /// Format the elapsed time for display (e.g., "2.3s", "150ms")
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.elapsed();
        if elapsed.as_secs() >= 1 {
            format!("{:.1}s", elapsed.as_secs_f64())
        } else {
            format!("{}ms", elapsed.as_millis())
        }
    }
}

/// Configuration for the action log ring buffer
#[derive(Debug, Clone)]
pub struct ActionLogConfig {
    /// Maximum number of entries to keep
    pub capacity: usize,
    /// Name filter
    pub filter: ActionLoggerConfig,
}

impl Default for ActionLogConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            filter: ActionLoggerConfig::default(),
        }
    }
}

impl ActionLogConfig {
    /// Create with custom capacity and filter
    pub fn new(capacity: usize, filter: ActionLoggerConfig) -> Self {
        Self { capacity, filter }
    }
}

/// In-memory ring buffer of recent sub-actions
///
/// Older entries are discarded once capacity is reached.
#[derive(Debug, Clone)]
pub struct ActionLog {
    entries: VecDeque<ActionLogEntry>,
    config: ActionLogConfig,
    next_sequence: u64,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new(ActionLogConfig::default())
    }
}

impl ActionLog {
    /// Create a new action log with configuration
    pub fn new(config: ActionLogConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.capacity),
            config,
            next_sequence: 0,
        }
    }

    /// Log a sub-action if it passes the filter
    pub fn log(&mut self, action: &Action) -> Option<&ActionLogEntry> {
        if self.config.capacity == 0 || !self.config.filter.should_log(action.name()) {
            return None;
        }

        let entry = ActionLogEntry::new(action, self.next_sequence);
        self.next_sequence += 1;

        if self.entries.len() >= self.config.capacity {
            self.entries.pop_front();
        }

        self.entries.push_back(entry);
        self.entries.back()
    }

    /// Record the dispatch outcome of the entry with `sequence`
    pub fn mark_applied(&mut self, sequence: u64, applied: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.sequence == sequence) {
            entry.applied = Some(applied);
        }
    }

    /// Get all entries (oldest first)
    pub fn entries(&self) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter()
    }

    /// Get the most recent N entries (newest first)
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter().rev().take(count)
    }

    /// Number of entries currently stored
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Get configuration
    pub fn config(&self) -> &ActionLogConfig {
        &self.config
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Store middleware logging every sub-action that passes the filter.
///
/// Supports two modes:
/// - **Tracing only** (default): logs via `tracing::debug!()`
/// - **With storage**: also keeps entries in an [`ActionLog`]
#[derive(Debug, Clone)]
pub struct ActionLoggerMiddleware {
    config: ActionLoggerConfig,
    log: Option<ActionLog>,
    /// `(log sequence, envelope position)` of entries awaiting an outcome
    pending: Vec<(u64, usize)>,
    active: bool,
}

impl ActionLoggerMiddleware {
    /// Tracing only, no in-memory storage
    pub fn new(config: ActionLoggerConfig) -> Self {
        Self {
            config,
            log: None,
            pending: Vec::new(),
            active: true,
        }
    }

    /// Tracing plus in-memory storage
    pub fn with_log(config: ActionLogConfig) -> Self {
        Self {
            config: config.filter.clone(),
            log: Some(ActionLog::new(config)),
            pending: Vec::new(),
            active: true,
        }
    }

    /// Storage with the default capacity and no filtering
    pub fn with_default_log() -> Self {
        Self::with_log(ActionLogConfig::default())
    }

    /// Set whether the middleware processes envelopes at all
    ///
    /// ```ignore
    /// let middleware = ActionLoggerMiddleware::with_default_log().active(args.debug);
    /// ```
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Check if the middleware is active
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Get the action log (if storage is enabled)
    pub fn log(&self) -> Option<&ActionLog> {
        self.log.as_ref()
    }

    /// Get a reference to the filter
    pub fn config(&self) -> &ActionLoggerConfig {
        &self.config
    }
}

impl Middleware for ActionLoggerMiddleware {
    fn before(&mut self, envelope: &RootAction) {
        if !self.active {
            return;
        }

        self.pending.clear();
        for (index, action) in envelope.actions().iter().enumerate() {
            if !self.config.should_log(action.name()) {
                continue;
            }
            tracing::debug!(action = %action.name(), summary = %action.summary(), "action");

            if let Some(entry) = self.log.as_mut().and_then(|log| log.log(action)) {
                self.pending.push((entry.sequence, index));
            }
        }
    }

    fn after(&mut self, _envelope: &RootAction, report: &DispatchReport) {
        if !self.active {
            return;
        }

        if let Some(log) = self.log.as_mut() {
            for (sequence, index) in self.pending.drain(..) {
                log.mark_applied(sequence, report.applied_at(index).unwrap_or(false));
            }
        }
    }
}

/// Simple glob pattern matching supporting `*` and `?`.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        match pattern.get(pi) {
            Some('*') => {
                star = Some((pi, ti));
                pi += 1;
            }
            Some(&c) if c == '?' || c == text[ti] => {
                pi += 1;
                ti += 1;
            }
            _ => match star {
                Some((spi, sti)) => {
                    pi = spi + 1;
                    ti = sti + 1;
                    star = Some((spi, sti + 1));
                }
                None => return false,
            },
        }
    }

    pattern[pi..].iter().all(|&c| c == '*')
}
