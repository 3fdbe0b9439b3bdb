//! State shared between a navigation primitive and its observers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// The path, including any basename.
    pub pathname: String,
    /// The search string, with its leading `?`, or empty.
    pub search: String,
    /// The hash, with its leading `#`, or empty.
    pub hash: String,
    /// Transient state attached by the navigation that created the entry.
    pub state: Option<serde_json::Value>,
    /// Unique key of the entry.
    pub key: String,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            pathname: "/".to_string(),
            search: String::new(),
            hash: String::new(),
            state: None,
            key: "default".to_string(),
        }
    }
}

impl Location {
    /// Creates an entry for a path such as `/user/1?tab=a#top`, with a fresh key.
    pub fn new(path: &str) -> Self {
        let PartialPath {
            pathname,
            search,
            hash,
        } = parse_path(path);
        Self {
            pathname: if pathname.is_empty() { "/".to_string() } else { pathname },
            search,
            hash,
            state: None,
            key: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Path, search and hash joined back together.
    pub fn full_path(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }
}

/// A path split into its parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialPath {
    /// Everything before the `?` and `#`.
    pub pathname: String,
    /// From the `?` up to the `#`.
    pub search: String,
    /// From the `#` to the end.
    pub hash: String,
}

/// Splits a path into pathname, search and hash. The hash is cut off first,
/// so a `?` inside the hash stays part of it.
///
/// ```
/// use simple_router_history::state::parse_path;
///
/// let parts = parse_path("/a?x=1#frag?y");
/// assert_eq!(parts.pathname, "/a");
/// assert_eq!(parts.search, "?x=1");
/// assert_eq!(parts.hash, "#frag?y");
/// ```
pub fn parse_path(path: &str) -> PartialPath {
    let (rest, hash) = path
        .find('#')
        .map_or((path, ""), |i| (&path[..i], &path[i..]));
    let (pathname, search) = rest
        .find('?')
        .map_or((rest, ""), |i| (&rest[..i], &rest[i..]));

    PartialPath {
        pathname: pathname.to_string(),
        search: search.to_string(),
        hash: hash.to_string(),
    }
}

/// A route as the navigation primitive sees it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteObject {
    /// Unique id, used as the parent reference when patching routes.
    pub id: String,
    /// Route name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Path, absolute or relative to the parent. A route without a path is a
    /// layout route sharing its parent's path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Nested routes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteObject>,
    /// Arbitrary data attached to the route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<serde_json::Value>,
    /// Redirect target, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl RouteObject {
    /// Creates a route with the given id and path.
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Depth-first search for a route by id.
    pub fn find<'a>(routes: &'a [Self], id: &str) -> Option<&'a Self> {
        routes.iter().find_map(|route| {
            if route.id == id {
                Some(route)
            } else {
                Self::find(&route.children, id)
            }
        })
    }

    /// Depth-first search for a route by id, mutably.
    pub fn find_mut<'a>(routes: &'a mut [Self], id: &str) -> Option<&'a mut Self> {
        for route in routes {
            if route.id == id {
                return Some(route);
            }
            if let Some(found) = Self::find_mut(&mut route.children, id) {
                return Some(found);
            }
        }
        None
    }
}

/// One level of the matched route hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteMatch {
    /// Id of the matched route.
    pub route_id: String,
    /// Name of the matched route.
    pub route_name: Option<String>,
    /// Parameters bound by the deepest matched route.
    pub params: HashMap<String, String>,
    /// The matched route's handle.
    pub handle: Option<serde_json::Value>,
    /// Full path template of the matched route.
    pub path: String,
}

/// How the current location was reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryAction {
    /// Moved through the existing stack (or the initial entry).
    #[default]
    Pop,
    /// Pushed a new entry.
    Push,
    /// Replaced the current entry.
    Replace,
}

/// Whether a navigation is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum NavigationState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// A navigation is being processed.
    Loading,
}

/// Blocker status of the last navigation attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub enum BlockerState {
    /// The last navigation was allowed.
    #[default]
    Unblocked,
    /// The last navigation was blocked.
    Blocked {
        /// The location that was refused.
        location: Location,
    },
}

/// Everything a navigation primitive exposes to its observers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavigatorState {
    /// The current entry.
    pub location: Location,
    /// The route hierarchy matched by the current entry, root first.
    pub matches: Vec<RouteMatch>,
    /// How the current entry was reached.
    pub history_action: HistoryAction,
    /// Navigation status.
    pub navigation: NavigationState,
    /// Whether `initialize` has been called.
    pub initialized: bool,
    /// Blocker status.
    pub blocker: BlockerState,
}

/// A navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigateTo {
    /// A path, absolute or relative to the current entry.
    Path(String),
    /// An offset in the history stack.
    Delta(i64),
}

impl From<&str> for NavigateTo {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for NavigateTo {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<i64> for NavigateTo {
    fn from(delta: i64) -> Self {
        Self::Delta(delta)
    }
}

/// Options of a path navigation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigateOptions {
    /// Replace the current entry instead of pushing.
    pub replace: bool,
    /// Transient state for the new entry.
    pub state: Option<serde_json::Value>,
}

/// What a blocker predicate is asked about.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockerArgs {
    /// The current entry.
    pub current_location: Location,
    /// The entry about to become current.
    pub next_location: Location,
    /// How it would be reached.
    pub history_action: HistoryAction,
}

/// Handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// A state change handler.
pub type Subscriber = Box<dyn FnMut(&NavigatorState)>;

/// A blocker predicate: `true` blocks the navigation.
pub type BlockerFn = Box<dyn FnMut(&BlockerArgs) -> bool>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_parts() {
        assert_eq!(
            parse_path("/a/b?c=1#d"),
            PartialPath {
                pathname: "/a/b".into(),
                search: "?c=1".into(),
                hash: "#d".into(),
            }
        );
        assert_eq!(parse_path("?x").pathname, "");
        assert_eq!(parse_path("#only").hash, "#only");
    }

    #[test]
    fn test_location_new_and_full_path() {
        let location = Location::new("/user/1?tab=a#top");
        assert_eq!(location.pathname, "/user/1");
        assert_eq!(location.full_path(), "/user/1?tab=a#top");
        assert_ne!(location.key, Location::new("/user/1").key);
    }

    #[test]
    fn test_route_object_find() {
        let mut routes = vec![RouteObject {
            children: vec![RouteObject::new("child", "c")],
            ..RouteObject::new("parent", "/p")
        }];
        assert_eq!(RouteObject::find(&routes, "child").unwrap().path.as_deref(), Some("c"));
        assert!(RouteObject::find(&routes, "nope").is_none());
        RouteObject::find_mut(&mut routes, "child")
            .unwrap()
            .children
            .push(RouteObject::new("grandchild", "g"));
        assert!(RouteObject::find(&routes, "grandchild").is_some());
    }
}
