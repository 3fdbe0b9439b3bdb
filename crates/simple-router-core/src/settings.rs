//! Settings for the router.
//!
//! This module provides the [`Settings`] struct, which holds all router
//! configuration, with sensible defaults. Settings are passed explicitly to
//! the router that uses them; there is no global instance.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How the navigation primitive renders locations into hrefs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    /// Locations live in the URL fragment (`#/path`).
    Hash,
    /// Locations are real paths under the basename.
    #[default]
    History,
    /// Locations are kept in memory only.
    Memory,
}

impl HistoryMode {
    /// Parses a mode name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hash" => Some(Self::Hash),
            "history" | "browser" => Some(Self::History),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// The complete set of router settings.
///
/// # Examples
///
/// ```
/// use simple_router_core::settings::{HistoryMode, Settings};
///
/// let settings = Settings::default();
/// assert_eq!(settings.mode, HistoryMode::History);
/// assert_eq!(settings.initial_entries, vec!["/".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // ── Navigation ───────────────────────────────────────────────────

    /// How locations are rendered into hrefs.
    pub mode: HistoryMode,
    /// Basename stripped from path-based navigation targets.
    pub base: String,
    /// The initial history stack of an in-memory navigator.
    pub initial_entries: Vec<String>,
    /// The active entry of `initial_entries` (defaults to the last one).
    pub initial_index: Option<usize>,
    /// Whether a committed location that resolves to a redirecting route is
    /// followed to the redirect target.
    pub follow_redirects: bool,
    /// Upper bound on chained guard jumps and redirects per operation.
    pub max_redirects: usize,

    // ── Logging ──────────────────────────────────────────────────────

    /// Whether debug mode (pretty logs) is enabled.
    pub debug: bool,
    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Navigation
            mode: HistoryMode::History,
            base: String::new(),
            initial_entries: vec!["/".to_string()],
            initial_index: None,
            follow_redirects: true,
            max_redirects: 16,

            // Logging
            debug: true,
            log_level: "info".to_string(),

            // Extra
            extra: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert!(s.base.is_empty());
        assert_eq!(s.mode, HistoryMode::History);
        assert_eq!(s.initial_entries, vec!["/".to_string()]);
        assert!(s.initial_index.is_none());
        assert!(s.follow_redirects);
        assert_eq!(s.max_redirects, 16);
        assert_eq!(s.log_level, "info");
        assert!(s.extra.is_empty());
    }

    #[test]
    fn test_history_mode_parse() {
        assert_eq!(HistoryMode::parse("hash"), Some(HistoryMode::Hash));
        assert_eq!(HistoryMode::parse(" History "), Some(HistoryMode::History));
        assert_eq!(HistoryMode::parse("browser"), Some(HistoryMode::History));
        assert_eq!(HistoryMode::parse("MEMORY"), Some(HistoryMode::Memory));
        assert_eq!(HistoryMode::parse("server"), None);
    }

    #[test]
    fn test_history_mode_serde_lowercase() {
        let json = serde_json::to_string(&HistoryMode::Hash).unwrap();
        assert_eq!(json, "\"hash\"");
        let mode: HistoryMode = serde_json::from_str("\"memory\"").unwrap();
        assert_eq!(mode, HistoryMode::Memory);
    }
}
