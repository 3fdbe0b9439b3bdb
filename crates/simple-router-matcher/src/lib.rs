//! # simple-router-matcher
//!
//! Route matching for the simple-router workspace:
//!
//! - [`record`]: Authored route records and their normalized form
//! - [`path`]: Path templates (`/user/:id`), path generation and parameter cleaning
//! - [`query`]: The query-string codec and its ordered query mappings
//! - [`location`]: Navigation intents and resolved locations
//! - [`registry`]: The mutable tree of named route matchers
//! - [`loader`]: Loading route tables from JSON or TOML
//!
//! # Examples
//!
//! ```
//! use simple_router_matcher::location::{NamedLocationRaw, ResolvedLocation, RouteLocationRaw};
//! use simple_router_matcher::record::RouteRecord;
//! use simple_router_matcher::registry::RouteMatcherRegistry;
//!
//! let routes = vec![RouteRecord::new("/user/:id").with_name("user")];
//! let registry = RouteMatcherRegistry::new(routes, "").unwrap();
//!
//! let target = RouteLocationRaw::Named(NamedLocationRaw::new("user").param("id", 5));
//! let resolved = registry.resolve(&target, &ResolvedLocation::start()).unwrap();
//! assert_eq!(resolved.full_path, "/user/5");
//! ```

pub mod loader;
pub mod location;
pub mod path;
pub mod query;
pub mod record;
pub mod registry;

pub use location::{
    CurrentLocationRaw, NamedLocationRaw, ParamValue, Params, PathLocationRaw, RawParam,
    RawParams, ResolvedLocation, RouteLocationRaw,
};
pub use path::{clean_params, generate_path, PathPattern};
pub use query::{
    normalize_query, parse_query, stringify_query, LocationQuery, LocationQueryRaw, QueryValue,
    RawQueryItem, RawQueryValue,
};
pub use record::{normalize_route_record, Meta, NormalizedRouteRecord, RouteRecord};
pub use registry::{MatcherId, MatcherNode, MatcherRef, RouteMatcherRegistry};
