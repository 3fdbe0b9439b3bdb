//! # simple-router
//!
//! Named route matching, a query-string codec and guarded navigation for
//! client-side routers.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `simple-router` to get everything, or depend on
//! individual crates for finer-grained control.

/// Error type, settings, settings loader and logging.
pub use simple_router_core as core;

/// Path templates, the query codec and the named route registry.
#[cfg(feature = "matcher")]
pub use simple_router_matcher as matcher;

/// The navigation primitive contract and the in-memory navigator.
#[cfg(feature = "history")]
pub use simple_router_history as history;

/// The navigation coordinator: guards, redirects and route table mirroring.
#[cfg(feature = "navigation")]
pub use simple_router_navigation as navigation;

pub use simple_router_core::{HistoryMode, RouterError, RouterResult, Settings};

// Third-party crates used in the public API and in application setup.
pub use async_trait;
pub use serde;
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;

#[cfg(feature = "navigation")]
pub use simple_router_navigation::{create_memory_router, NavigationTarget, Router, RouterOptions};

#[cfg(feature = "matcher")]
pub use simple_router_matcher::{NamedLocationRaw, ResolvedLocation, RouteRecord};
