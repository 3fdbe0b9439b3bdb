//! The route matcher registry.
//!
//! [`RouteMatcherRegistry`] owns the route tree. Nodes live in an arena and
//! are addressed by [`MatcherId`]: a node owns its children by id and refers
//! to its parent by a plain id used only for walking up the tree.
//!
//! Named nodes are additionally kept in a flat list, in insertion order, and in
//! a name index. The wildcard route (`"*"`) is kept apart in the fallback slot,
//! ahead of the flat list, and is only used when nothing else matches.

use std::collections::HashMap;

use simple_router_core::{RouterError, RouterResult};

use crate::location::{ParamValue, Params, ResolvedLocation, RouteLocationRaw};
use crate::path::{clean_params, generate_path, PathPattern};
use crate::query::{normalize_query, parse_query, stringify_query};
use crate::record::{
    check_child_missing_name_with_empty_path, merge_meta_fields, normalize_route_record,
    NormalizedRouteRecord, RouteRecord,
};

/// Path of the fallback route.
pub const WILDCARD: &str = "*";

/// Handle of a node in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatcherId(usize);

impl MatcherId {
    /// The arena slot of this node.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A node of the route tree.
#[derive(Debug, Clone)]
pub struct MatcherNode {
    record: NormalizedRouteRecord,
    pattern: PathPattern,
    children: Vec<MatcherId>,
    parent: Option<MatcherId>,
}

impl MatcherNode {
    /// The normalized record; its `path` is the full, composed path.
    pub const fn record(&self) -> &NormalizedRouteRecord {
        &self.record
    }

    /// The route name, if any.
    pub fn name(&self) -> Option<&str> {
        self.record.name.as_deref()
    }

    /// The full path template.
    pub fn path(&self) -> &str {
        &self.record.path
    }

    /// The compiled path template.
    pub const fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Child nodes, in definition order.
    pub fn children(&self) -> &[MatcherId] {
        &self.children
    }

    /// The parent node, if this is not a root.
    pub const fn parent(&self) -> Option<MatcherId> {
        self.parent
    }
}

/// A reference to a registered route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherRef<'a> {
    /// By route name.
    Name(&'a str),
    /// By node handle.
    Id(MatcherId),
}

impl<'a> From<&'a str> for MatcherRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for MatcherRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

impl From<MatcherId> for MatcherRef<'_> {
    fn from(id: MatcherId) -> Self {
        Self::Id(id)
    }
}

/// The mutable tree of route matchers.
#[derive(Debug, Clone, Default)]
pub struct RouteMatcherRegistry {
    nodes: Vec<Option<MatcherNode>>,
    /// Slots emptied by removals, reused by later additions.
    free: Vec<usize>,
    fallback: Option<MatcherId>,
    matchers: Vec<MatcherId>,
    by_name: HashMap<String, MatcherId>,
    base: String,
    init_routes: Vec<RouteRecord>,
}

impl RouteMatcherRegistry {
    /// Creates a registry holding the given routes.
    ///
    /// `base` is stripped once from the front of path-based targets; `"/"`
    /// disables stripping.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::ImproperlyConfigured`] if a route path cannot be
    /// compiled.
    pub fn new(routes: Vec<RouteRecord>, base: impl Into<String>) -> RouterResult<Self> {
        let mut registry = Self {
            base: base.into(),
            init_routes: routes,
            ..Self::default()
        };
        registry.initialize_routes()?;
        Ok(registry)
    }

    fn initialize_routes(&mut self) -> RouterResult<()> {
        for route in self.init_routes.clone() {
            self.add_route(&route, None)?;
        }
        Ok(())
    }

    /// The basename stripped from path-based targets.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The routes the registry was created with.
    pub fn init_routes(&self) -> &[RouteRecord] {
        &self.init_routes
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Adds a route, and its children, under an optional parent node.
    ///
    /// A route whose name is already registered replaces the previous route
    /// and its whole subtree. A relative path is joined to the parent's full
    /// path; an empty path takes the parent's path. Only named nodes become
    /// addressable by name, but unnamed nodes still take part in building
    /// their descendants' paths.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::ImproperlyConfigured`] if a route path cannot be
    /// compiled.
    pub fn add_route(
        &mut self,
        record: &RouteRecord,
        parent: Option<MatcherId>,
    ) -> RouterResult<MatcherId> {
        self.add_route_inner(record, parent, true)
    }

    fn add_route_inner(
        &mut self,
        record: &RouteRecord,
        parent: Option<MatcherId>,
        top_level: bool,
    ) -> RouterResult<MatcherId> {
        let mut normalized = normalize_route_record(record);

        if top_level {
            if let Some(name) = normalized.name.clone() {
                self.remove_route(name.as_str());
            }
        }

        let parent = parent.filter(|id| self.matcher(*id).is_some());
        let parent_record = parent.and_then(|id| self.matcher(id)).map(MatcherNode::record);
        check_child_missing_name_with_empty_path(&normalized, parent_record);

        if let Some(parent_record) = parent_record {
            if normalized.path.is_empty() {
                normalized.path.clone_from(&parent_record.path);
            } else if !normalized.path.starts_with('/') {
                let separator = if parent_record.path.ends_with('/') { "" } else { "/" };
                normalized.path = format!("{}{separator}{}", parent_record.path, normalized.path);
            }
        }

        let pattern = PathPattern::new(&normalized.path)?;
        let children = normalized.children.clone();
        tracing::debug!(
            name = normalized.name.as_deref().unwrap_or(""),
            path = %normalized.path,
            "adding route"
        );
        let id = self.allocate(MatcherNode {
            record: normalized,
            pattern,
            children: Vec::new(),
            parent,
        });
        if let Some(node) = parent.and_then(|p| self.matcher_mut(p)) {
            node.children.push(id);
        }

        for child in &children {
            self.add_route_inner(child, Some(id), false)?;
        }

        if self.matcher(id).and_then(MatcherNode::name).is_some() {
            self.insert_matcher(id);
        }

        Ok(id)
    }

    fn allocate(&mut self, node: MatcherNode) -> MatcherId {
        if let Some(slot) = self.free.pop() {
            self.nodes[slot] = Some(node);
            return MatcherId(slot);
        }
        self.nodes.push(Some(node));
        MatcherId(self.nodes.len() - 1)
    }

    /// Registers a named node: the wildcard takes the fallback slot, anything
    /// else is appended to the flat list.
    fn insert_matcher(&mut self, id: MatcherId) {
        let Some(node) = self.matcher(id) else {
            return;
        };
        let is_wildcard = node.path() == WILDCARD;
        let name = node.name().map(ToString::to_string);

        if is_wildcard {
            if let Some(previous) = self.fallback.filter(|prev| *prev != id) {
                tracing::debug!(?previous, "replacing wildcard route");
                self.remove_route(previous);
            }
            self.fallback = Some(id);
        } else {
            self.matchers.push(id);
        }

        if let Some(name) = name {
            if let Some(displaced) = self.by_name.insert(name, id).filter(|prev| *prev != id) {
                self.matchers.retain(|m| *m != displaced);
                if self.fallback == Some(displaced) {
                    self.fallback = None;
                }
            }
        }
    }

    /// Removes a route and, first, all of its descendants.
    ///
    /// Unknown references are ignored.
    pub fn remove_route<'a>(&mut self, reference: impl Into<MatcherRef<'a>>) {
        if let Some(id) = self.lookup(reference.into()) {
            self.remove_node(id);
        }
    }

    fn remove_node(&mut self, id: MatcherId) {
        let Some(node) = self.matcher(id) else {
            return;
        };
        for child in node.children.clone() {
            self.remove_node(child);
        }

        let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        tracing::debug!(name = node.name().unwrap_or(""), path = node.path(), "removing route");
        self.free.push(id.0);

        self.matchers.retain(|m| *m != id);
        if self.fallback == Some(id) {
            self.fallback = None;
        }
        if let Some(name) = node.name() {
            if self.by_name.get(name) == Some(&id) {
                self.by_name.remove(name);
            }
        }
        if let Some(parent) = node.parent.and_then(|p| self.matcher_mut(p)) {
            parent.children.retain(|c| *c != id);
        }
    }

    /// Clears everything and re-adds the routes the registry was created with.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::ImproperlyConfigured`] if a route path cannot be
    /// compiled.
    pub fn reset_matchers(&mut self) -> RouterResult<()> {
        self.nodes.clear();
        self.free.clear();
        self.matchers.clear();
        self.by_name.clear();
        self.fallback = None;
        self.initialize_routes()
    }

    // ── Lookup ───────────────────────────────────────────────────────

    fn lookup(&self, reference: MatcherRef<'_>) -> Option<MatcherId> {
        match reference {
            MatcherRef::Name(name) => self.by_name.get(name).copied(),
            MatcherRef::Id(id) => self.matcher(id).map(|_| id),
        }
    }

    /// Returns the node for a handle, if it is still registered.
    pub fn matcher(&self, id: MatcherId) -> Option<&MatcherNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn matcher_mut(&mut self, id: MatcherId) -> Option<&mut MatcherNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Returns the handle of a named route.
    pub fn matcher_id(&self, name: &str) -> Option<MatcherId> {
        self.by_name.get(name).copied()
    }

    /// Returns the node of a named route.
    pub fn get_record_matcher(&self, name: &str) -> Option<&MatcherNode> {
        self.matcher_id(name).and_then(|id| self.matcher(id))
    }

    /// Whether a route with this name is registered.
    pub fn has_route(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// The fallback route, if one is registered.
    pub fn fallback(&self) -> Option<&MatcherNode> {
        self.fallback.and_then(|id| self.matcher(id))
    }

    fn registered_ids(&self) -> impl Iterator<Item = MatcherId> + '_ {
        self.fallback.into_iter().chain(self.matchers.iter().copied())
    }

    /// All named routes: the fallback first, then in insertion order.
    pub fn get_routes(&self) -> Vec<&MatcherNode> {
        self.registered_ids()
            .filter_map(|id| self.matcher(id))
            .collect()
    }

    /// The names of all named routes, in the order of [`get_routes`](Self::get_routes).
    pub fn get_all_route_names(&self) -> Vec<String> {
        self.registered_ids()
            .filter_map(|id| self.matcher(id))
            .filter_map(|node| node.name().map(ToString::to_string))
            .collect()
    }

    /// Number of named routes.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether no named route is registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// The chain of handles from the root down to `id`.
    pub fn ancestors(&self, id: MatcherId) -> Vec<MatcherId> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.matcher(current) else {
                break;
            };
            chain.push(current);
            cursor = node.parent;
        }
        chain.reverse();
        chain
    }

    // ── Resolution ───────────────────────────────────────────────────

    /// Resolves a navigation intent into a location.
    ///
    /// A name that is not registered resolves to the fallback route; a path
    /// that matches nothing resolves to the fallback route too. Without a
    /// fallback the result has an empty `matched` chain.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::MissingRoute`] when reusing the current route
    /// and the current location cannot be resolved.
    pub fn resolve(
        &self,
        location: &RouteLocationRaw,
        current: &ResolvedLocation,
    ) -> RouterResult<ResolvedLocation> {
        match location {
            RouteLocationRaw::Named(named) => {
                let id = self.matcher_id(&named.name).or(self.fallback);
                let params = clean_params(&named.params);
                let template = id
                    .and_then(|id| self.matcher(id))
                    .map_or("", MatcherNode::path);
                let full_path = join_full_path(
                    generate_path(template, &params),
                    &stringify_query(&named.query),
                    &named.hash,
                );
                let resolved = ResolvedLocation {
                    full_path,
                    path: template.to_string(),
                    params,
                    query: normalize_query(&named.query),
                    hash: normalize_hash(&named.hash),
                    state: named.state.clone(),
                    ..ResolvedLocation::default()
                };
                Ok(self.with_matched(resolved, id))
            }
            RouteLocationRaw::Path(target) => {
                let path = self.strip_base(&target.pathname);
                let candidate = if path.is_empty() { "/" } else { path.as_str() };
                let id = self
                    .matchers
                    .iter()
                    .copied()
                    .find(|id| self.matcher(*id).is_some_and(|n| n.pattern.is_match(candidate)))
                    .or(self.fallback);

                let params: Params = id
                    .and_then(|id| self.matcher(id))
                    .and_then(|node| node.pattern.match_path(candidate))
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(k, v)| (k, ParamValue::Text(v)))
                    .collect();

                let search = normalize_search(&target.search);
                let full_path = self.strip_base(&join_full_path(
                    target.pathname.clone(),
                    &search,
                    &target.hash,
                ));
                let resolved = ResolvedLocation {
                    full_path,
                    path,
                    params,
                    query: parse_query(&search),
                    hash: normalize_hash(&target.hash),
                    state: target.state.clone(),
                    ..ResolvedLocation::default()
                };
                Ok(self.with_matched(resolved, id))
            }
            RouteLocationRaw::Current(target) => {
                let id = current
                    .name
                    .as_deref()
                    .and_then(|name| self.matcher_id(name))
                    .or_else(|| {
                        self.matchers.iter().copied().chain(self.fallback).find(|id| {
                            self.matcher(*id).is_some_and(|n| {
                                n.path() == current.path || n.pattern.is_match(&current.path)
                            })
                        })
                    })
                    .ok_or_else(|| RouterError::MissingRoute("there is no such route".to_string()))?;

                let mut params = current.params.clone();
                params.extend(clean_params(&target.params));
                let template = self.matcher(id).map_or("", MatcherNode::path);
                let full_path = join_full_path(
                    generate_path(template, &params),
                    &stringify_query(&target.query),
                    &target.hash,
                );
                let resolved = ResolvedLocation {
                    full_path,
                    path: template.to_string(),
                    params,
                    query: normalize_query(&target.query),
                    hash: normalize_hash(&target.hash),
                    ..ResolvedLocation::default()
                };
                Ok(self.with_matched(resolved, Some(id)))
            }
        }
    }

    /// Fills in name, matched chain, redirect and meta from the resolved node.
    fn with_matched(&self, mut resolved: ResolvedLocation, id: Option<MatcherId>) -> ResolvedLocation {
        let Some(node) = id.and_then(|id| self.matcher(id)) else {
            return resolved;
        };
        let chain = id.map(|id| self.ancestors(id)).unwrap_or_default();
        resolved.matched = chain
            .into_iter()
            .filter_map(|id| self.matcher(id))
            .map(|n| n.record.clone())
            .collect();
        resolved.name.clone_from(&node.record.name);
        resolved.redirect.clone_from(&node.record.redirect);
        resolved.meta = merge_meta_fields(&resolved.matched);
        resolved
    }

    fn strip_base(&self, path: &str) -> String {
        if self.base == "/" {
            path.to_string()
        } else {
            path.replacen(&self.base, "", 1)
        }
    }
}

fn normalize_search(search: &str) -> String {
    match search {
        "" | "?" => String::new(),
        s if s.starts_with('?') => s.to_string(),
        s => format!("?{s}"),
    }
}

fn normalize_hash(hash: &str) -> String {
    match hash {
        "" | "#" => String::new(),
        h if h.starts_with('#') => h.to_string(),
        h => format!("#{h}"),
    }
}

/// Appends a query string (without `?`, or already prefixed) and a hash to a path.
fn join_full_path(mut path: String, search: &str, hash: &str) -> String {
    if !search.is_empty() {
        if !search.starts_with('?') {
            path.push('?');
        }
        path.push_str(search);
    }
    path.push_str(&normalize_hash(hash));
    path
}
