//! Core error type for the simple-router workspace.
//!
//! Only two kinds of failure ever reach a caller of a navigation operation:
//! [`RouterError::MissingRoute`] and [`RouterError::NavigationDuplicated`].
//! Everything else the router notices (missing template parameters, unknown
//! parent routes, undecodable query text) is reported as a `tracing` warning
//! and degrades gracefully. The remaining variants cover configuration and
//! bootstrap problems.

use thiserror::Error;

/// The primary error type for the router.
#[derive(Error, Debug)]
pub enum RouterError {
    // ── Navigation failures ──────────────────────────────────────────

    /// Resolution had neither a name nor a pathname and the current location
    /// could not be resolved either.
    #[error("Missing route: {0}")]
    MissingRoute(String),

    /// A structured navigation target resolved to no route at all.
    #[error("Navigation duplicated: from '{from}' to '{to}'")]
    NavigationDuplicated {
        /// Full path of the location the navigation started from.
        from: String,
        /// Full path the target resolved to.
        to: String,
    },

    // ── Configuration ────────────────────────────────────────────────

    /// A route definition cannot be turned into a matcher.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    /// A settings or route file is missing or malformed.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Bootstrap ────────────────────────────────────────────────────

    /// The bootstrap hook passed to `init_ready` failed.
    #[error("Init failed: {0}")]
    InitFailed(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RouterError {
    /// Returns `true` for the failures a navigation operation can surface.
    pub const fn is_navigation_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingRoute(_) | Self::NavigationDuplicated { .. }
        )
    }
}

/// A convenience type alias for `Result<T, RouterError>`.
pub type RouterResult<T> = Result<T, RouterError>;
