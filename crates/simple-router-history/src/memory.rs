//! An in-memory navigation primitive.

use std::fmt;

use url::Url;

use simple_router_core::{HistoryMode, Settings};
use simple_router_matcher::PathPattern;

use crate::state::{
    parse_path, BlockerArgs, BlockerFn, BlockerState, HistoryAction, Location, NavigateOptions,
    NavigateTo, NavigationState, NavigatorState, RouteMatch, RouteObject, Subscriber,
    SubscriptionId,
};
use crate::NavigationPrimitive;

/// Base used to resolve relative paths; only its path is ever read back.
const RELATIVE_BASE: &str = "memory://localhost";

/// Construction options of a [`MemoryNavigator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryNavigatorOptions {
    /// The initial history stack.
    pub initial_entries: Vec<String>,
    /// The active entry; defaults to the last one.
    pub initial_index: Option<usize>,
    /// Prefix added to absolute navigation targets.
    pub basename: String,
    /// How hrefs are rendered.
    pub mode: HistoryMode,
}

impl Default for MemoryNavigatorOptions {
    fn default() -> Self {
        Self {
            initial_entries: vec!["/".to_string()],
            initial_index: None,
            basename: String::new(),
            mode: HistoryMode::Memory,
        }
    }
}

impl From<&Settings> for MemoryNavigatorOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            initial_entries: settings.initial_entries.clone(),
            initial_index: settings.initial_index,
            basename: settings.base.clone(),
            mode: settings.mode,
        }
    }
}

/// A [`NavigationPrimitive`] that keeps its history stack in memory.
pub struct MemoryNavigator {
    entries: Vec<Location>,
    index: usize,
    routes: Vec<RouteObject>,
    state: NavigatorState,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    blockers: Vec<(String, BlockerFn)>,
    next_subscription: u64,
    basename: String,
    mode: HistoryMode,
    disposed: bool,
}

impl fmt::Debug for MemoryNavigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryNavigator")
            .field("entries", &self.entries)
            .field("index", &self.index)
            .field("routes", &self.routes)
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .field(
                "blockers",
                &self.blockers.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .field("basename", &self.basename)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl MemoryNavigator {
    /// Creates a navigator over `routes`.
    pub fn new(routes: Vec<RouteObject>, options: MemoryNavigatorOptions) -> Self {
        let mut entries: Vec<Location> = options
            .initial_entries
            .iter()
            .map(|entry| Location::new(entry))
            .collect();
        if entries.is_empty() {
            entries.push(Location::new("/"));
        }
        let last = entries.len() - 1;
        let index = options.initial_index.map_or(last, |i| i.min(last));

        let mut navigator = Self {
            state: NavigatorState {
                location: entries[index].clone(),
                ..NavigatorState::default()
            },
            entries,
            index,
            routes,
            subscribers: Vec::new(),
            blockers: Vec::new(),
            next_subscription: 0,
            basename: options.basename,
            mode: options.mode,
            disposed: false,
        };
        navigator.state.matches = navigator.match_location(&navigator.state.location.pathname);
        navigator
    }

    /// Creates a navigator configured from router settings.
    pub fn from_settings(routes: Vec<RouteObject>, settings: &Settings) -> Self {
        Self::new(routes, MemoryNavigatorOptions::from(settings))
    }

    /// The history stack.
    pub fn entries(&self) -> &[Location] {
        &self.entries
    }

    /// Position of the current entry in the stack.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The basename prefixed to absolute targets.
    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// Whether there is an entry before the current one.
    pub const fn can_go_back(&self) -> bool {
        self.index > 0
    }

    /// Whether there is an entry after the current one.
    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    // ── Path handling ────────────────────────────────────────────────

    fn with_basename(&self, pathname: &str) -> String {
        if self.basename.is_empty() || self.basename == "/" {
            pathname.to_string()
        } else if pathname == "/" {
            self.basename.clone()
        } else {
            format!("{}{pathname}", self.basename.trim_end_matches('/'))
        }
    }

    fn strip_basename<'a>(&self, pathname: &'a str) -> Option<&'a str> {
        if self.basename.is_empty() || self.basename == "/" {
            return Some(pathname);
        }
        let base = self.basename.trim_end_matches('/');
        let prefix = pathname.get(..base.len())?;
        if !prefix.eq_ignore_ascii_case(base) {
            return None;
        }
        match &pathname[base.len()..] {
            "" => Some("/"),
            rest if rest.starts_with('/') => Some(rest),
            _ => None,
        }
    }

    fn join_relative(&self, relative: &str) -> Option<String> {
        let base = format!("{RELATIVE_BASE}{}", self.state.location.pathname);
        match Url::parse(&base).and_then(|url| url.join(relative)) {
            Ok(url) => Some(url.path().to_string()),
            Err(e) => {
                tracing::error!(path = relative, error = %e, "cannot resolve relative path");
                None
            }
        }
    }

    fn resolve_path(&self, path: &str) -> Option<Location> {
        if path.starts_with("//") {
            tracing::error!(path, "paths starting with `//` are not supported");
            return None;
        }
        let parts = parse_path(path);
        let pathname = if parts.pathname.is_empty() {
            self.state.location.pathname.clone()
        } else if parts.pathname.starts_with('/') {
            self.with_basename(&parts.pathname)
        } else {
            self.join_relative(&parts.pathname)?
        };

        Some(Location {
            pathname,
            search: parts.search,
            hash: parts.hash,
            state: None,
            key: uuid::Uuid::new_v4().to_string(),
        })
    }

    // ── Route matching ───────────────────────────────────────────────

    fn match_location(&self, pathname: &str) -> Vec<RouteMatch> {
        let Some(pathname) = self.strip_basename(pathname) else {
            return Vec::new();
        };
        self.routes
            .iter()
            .find_map(|route| match_branch(route, "", pathname))
            .unwrap_or_default()
    }

    // ── Transitions ──────────────────────────────────────────────────

    fn is_blocked(&mut self, next: &Location, action: HistoryAction) -> bool {
        if self.blockers.is_empty() {
            return false;
        }
        let args = BlockerArgs {
            current_location: self.state.location.clone(),
            next_location: next.clone(),
            history_action: action,
        };
        self.blockers.iter_mut().any(|(_, blocker)| blocker(&args))
    }

    fn report_blocked(&mut self, location: Location) {
        tracing::debug!(to = %location.full_path(), "navigation blocked");
        self.state.blocker = BlockerState::Blocked { location };
        self.notify();
    }

    fn commit(&mut self, location: Location, action: HistoryAction) {
        tracing::debug!(to = %location.full_path(), ?action, "navigation committed");
        self.state.matches = self.match_location(&location.pathname);
        self.state.location = location;
        self.state.history_action = action;
        self.state.navigation = NavigationState::Idle;
        self.notify();
    }

    fn notify(&mut self) {
        let state = &self.state;
        for (_, subscriber) in &mut self.subscribers {
            subscriber(state);
        }
    }

    fn go(&mut self, delta: i64) {
        let target = i64::try_from(self.index)
            .ok()
            .and_then(|i| i.checked_add(delta))
            .and_then(|i| usize::try_from(i).ok())
            .filter(|i| *i < self.entries.len());
        let Some(target) = target.filter(|_| delta != 0) else {
            tracing::debug!(delta, index = self.index, "history offset out of range, ignored");
            return;
        };

        let next = self.entries[target].clone();
        if self.is_blocked(&next, HistoryAction::Pop) {
            self.report_blocked(next);
            return;
        }
        self.index = target;
        self.commit(next, HistoryAction::Pop);
    }

    fn push_path(&mut self, path: &str, options: NavigateOptions) {
        let Some(mut next) = self.resolve_path(path) else {
            return;
        };
        next.state = options.state;

        let action = if options.replace || next.full_path() == self.state.location.full_path() {
            HistoryAction::Replace
        } else {
            HistoryAction::Push
        };
        if self.is_blocked(&next, action) {
            self.report_blocked(next);
            return;
        }

        if action == HistoryAction::Replace {
            if let Some(slot) = self.entries.get_mut(self.index) {
                *slot = next.clone();
            }
        } else {
            self.entries.truncate(self.index + 1);
            self.entries.push(next.clone());
            self.index = self.entries.len() - 1;
        }
        self.commit(next, action);
    }
}

impl NavigationPrimitive for MemoryNavigator {
    fn state(&self) -> &NavigatorState {
        &self.state
    }

    fn navigate(&mut self, to: NavigateTo, options: NavigateOptions) {
        if self.disposed {
            tracing::warn!(?to, "navigation on a disposed navigator ignored");
            return;
        }
        self.state.blocker = BlockerState::Unblocked;
        match to {
            NavigateTo::Delta(delta) => self.go(delta),
            NavigateTo::Path(path) => self.push_path(&path, options),
        }
    }

    fn subscribe(&mut self, handler: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, handler));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    fn get_blocker(&mut self, key: &str, predicate: BlockerFn) {
        if !self.blockers.iter().any(|(k, _)| k == key) {
            self.blockers.push((key.to_string(), predicate));
        }
    }

    fn delete_blocker(&mut self, key: &str) {
        self.blockers.retain(|(k, _)| k != key);
    }

    fn initialize(&mut self) -> &mut Self {
        if !self.state.initialized {
            self.state.initialized = true;
            self.state.matches = self.match_location(&self.state.location.pathname);
            self.notify();
        }
        self
    }

    fn patch_routes(&mut self, parent_id: Option<&str>, routes: Vec<RouteObject>) {
        match parent_id.and_then(|id| RouteObject::find_mut(&mut self.routes, id)) {
            Some(parent) => parent.children.extend(routes),
            None => {
                if let Some(id) = parent_id {
                    tracing::warn!(parent = id, "parent route not found, adding routes at the root");
                }
                self.routes.extend(routes);
            }
        }
        self.state.matches = self.match_location(&self.state.location.pathname);
    }

    fn routes(&self) -> &[RouteObject] {
        &self.routes
    }

    fn routes_mut(&mut self) -> &mut Vec<RouteObject> {
        &mut self.routes
    }

    fn dispose(&mut self) {
        self.subscribers.clear();
        self.blockers.clear();
        self.disposed = true;
    }

    fn create_href(&self, location: &Location) -> String {
        let pathname = if self.strip_basename(&location.pathname).is_some() {
            location.pathname.clone()
        } else {
            self.with_basename(&location.pathname)
        };
        let path = format!("{pathname}{}{}", location.search, location.hash);
        match self.mode {
            HistoryMode::Hash => format!("#{path}"),
            HistoryMode::History | HistoryMode::Memory => path,
        }
    }
}

fn join_route_path(parent: &str, path: Option<&str>) -> String {
    match path {
        None | Some("") => {
            if parent.is_empty() {
                "/".to_string()
            } else {
                parent.to_string()
            }
        }
        Some(path) if path.starts_with('/') => path.to_string(),
        Some(path) => format!("{}/{path}", parent.trim_end_matches('/')),
    }
}

/// Matches a route branch depth first: children before the route itself.
fn match_branch(route: &RouteObject, parent_path: &str, pathname: &str) -> Option<Vec<RouteMatch>> {
    let full_path = join_route_path(parent_path, route.path.as_deref());

    for child in &route.children {
        if let Some(mut chain) = match_branch(child, &full_path, pathname) {
            let params = chain.last().map(|m| m.params.clone()).unwrap_or_default();
            chain.insert(0, route_match(route, &full_path, params));
            return Some(chain);
        }
    }

    let params = PathPattern::new(&full_path).ok()?.match_path(pathname)?;
    Some(vec![route_match(route, &full_path, params)])
}

fn route_match(
    route: &RouteObject,
    full_path: &str,
    params: std::collections::HashMap<String, String>,
) -> RouteMatch {
    RouteMatch {
        route_id: route.id.clone(),
        route_name: route.name.clone(),
        params,
        handle: route.handle.clone(),
        path: full_path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigator_at(entries: &[&str]) -> MemoryNavigator {
        MemoryNavigator::new(
            vec![
                RouteObject::new("home", "/home"),
                RouteObject {
                    children: vec![RouteObject::new("user_detail", ":id")],
                    ..RouteObject::new("user", "/user")
                },
            ],
            MemoryNavigatorOptions {
                initial_entries: entries.iter().map(ToString::to_string).collect(),
                ..MemoryNavigatorOptions::default()
            },
        )
    }

    fn push(nav: &mut MemoryNavigator, path: &str) {
        nav.navigate(NavigateTo::from(path), NavigateOptions::default());
    }

    #[test]
    fn test_initial_index_defaults_to_last() {
        let nav = navigator_at(&["/a", "/b"]);
        assert_eq!(nav.index(), 1);
        assert_eq!(nav.state().location.pathname, "/b");
    }

    #[test]
    fn test_initial_index_is_clamped() {
        let nav = MemoryNavigator::new(
            Vec::new(),
            MemoryNavigatorOptions {
                initial_entries: vec!["/a".into(), "/b".into()],
                initial_index: Some(9),
                ..MemoryNavigatorOptions::default()
            },
        );
        assert_eq!(nav.index(), 1);
    }

    #[test]
    fn test_push_truncates_forward_entries() {
        let mut nav = navigator_at(&["/"]);
        push(&mut nav, "/a");
        push(&mut nav, "/b");
        nav.navigate(NavigateTo::Delta(-1), NavigateOptions::default());
        push(&mut nav, "/c");
        let paths: Vec<&str> = nav.entries().iter().map(|l| l.pathname.as_str()).collect();
        assert_eq!(paths, ["/", "/a", "/c"]);
        assert!(!nav.can_go_forward());
    }

    #[test]
    fn test_same_path_push_becomes_replace() {
        let mut nav = navigator_at(&["/"]);
        push(&mut nav, "/a");
        push(&mut nav, "/a");
        assert_eq!(nav.entries().len(), 2);
        assert_eq!(nav.state().history_action, HistoryAction::Replace);
    }

    #[test]
    fn test_replace_keeps_stack_length() {
        let mut nav = navigator_at(&["/", "/a"]);
        nav.navigate(
            NavigateTo::from("/b"),
            NavigateOptions {
                replace: true,
                state: Some(serde_json::json!({"from": "test"})),
            },
        );
        assert_eq!(nav.entries().len(), 2);
        assert_eq!(nav.state().location.pathname, "/b");
        assert_eq!(nav.state().location.state, Some(serde_json::json!({"from": "test"})));
    }

    #[test]
    fn test_delta_out_of_range_ignored() {
        let mut nav = navigator_at(&["/", "/a"]);
        nav.navigate(NavigateTo::Delta(1), NavigateOptions::default());
        nav.navigate(NavigateTo::Delta(-5), NavigateOptions::default());
        assert_eq!(nav.state().location.pathname, "/a");
        nav.navigate(NavigateTo::Delta(-1), NavigateOptions::default());
        assert_eq!(nav.state().location.pathname, "/");
        assert_eq!(nav.state().history_action, HistoryAction::Pop);
    }

    #[test]
    fn test_relative_paths() {
        let mut nav = navigator_at(&["/user/1"]);
        push(&mut nav, "2");
        assert_eq!(nav.state().location.pathname, "/user/2");
        push(&mut nav, "../home");
        assert_eq!(nav.state().location.pathname, "/home");
        push(&mut nav, "?tab=x");
        assert_eq!(nav.state().location.full_path(), "/home?tab=x");
    }

    #[test]
    fn test_double_slash_rejected() {
        let mut nav = navigator_at(&["/"]);
        push(&mut nav, "//evil.example/x");
        assert_eq!(nav.state().location.pathname, "/");
        assert_eq!(nav.entries().len(), 1);
    }

    #[test]
    fn test_matches_nested_route() {
        let nav = navigator_at(&["/user/42"]);
        let ids: Vec<&str> = nav.state().matches.iter().map(|m| m.route_id.as_str()).collect();
        assert_eq!(ids, ["user", "user_detail"]);
        assert_eq!(nav.state().matches[1].params["id"], "42");
        assert_eq!(nav.state().matches[1].path, "/user/:id");
    }

    #[test]
    fn test_basename_prefix_and_matching() {
        let mut nav = MemoryNavigator::new(
            vec![RouteObject::new("home", "/home")],
            MemoryNavigatorOptions {
                initial_entries: vec!["/app".into()],
                basename: "/app".into(),
                ..MemoryNavigatorOptions::default()
            },
        );
        push(&mut nav, "/home");
        assert_eq!(nav.state().location.pathname, "/app/home");
        assert_eq!(nav.state().matches[0].route_id, "home");
    }

    #[test]
    fn test_create_href_modes() {
        let location = Location::new("/a?b=1#c");
        let nav = navigator_at(&["/"]);
        assert_eq!(nav.create_href(&location), "/a?b=1#c");

        let hash = MemoryNavigator::new(
            Vec::new(),
            MemoryNavigatorOptions {
                mode: HistoryMode::Hash,
                basename: "/app".into(),
                ..MemoryNavigatorOptions::default()
            },
        );
        assert_eq!(hash.create_href(&location), "#/app/a?b=1#c");
    }

    #[test]
    fn test_join_route_path() {
        assert_eq!(join_route_path("", Some("/a")), "/a");
        assert_eq!(join_route_path("/a/", Some("b")), "/a/b");
        assert_eq!(join_route_path("/a", None), "/a");
        assert_eq!(join_route_path("", None), "/");
        assert_eq!(join_route_path("", Some("*")), "/*");
    }
}
