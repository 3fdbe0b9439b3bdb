//! Route records as authored and as normalized for the registry.
//!
//! A [`RouteRecord`] is what an application writes (or loads from a route
//! file). Before it enters the registry it is normalized into a
//! [`NormalizedRouteRecord`], which fills in the defaults every later step
//! relies on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Free-form per-route metadata.
pub type Meta = HashMap<String, serde_json::Value>;

/// An authored route definition.
///
/// # Examples
///
/// ```
/// use simple_router_matcher::record::RouteRecord;
///
/// let manage = RouteRecord::new("/manage")
///     .with_name("manage")
///     .with_child(RouteRecord::new("user").with_name("manage_user"))
///     .with_meta("title", "Manage");
///
/// assert_eq!(manage.children.len(), 1);
/// assert_eq!(manage.meta["title"], "Manage");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    /// Optional unique name used for named navigation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Path template, absolute (`/user/:id`) or relative to the parent (`:id`).
    #[serde(default)]
    pub path: String,
    /// Nested route records.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteRecord>,
    /// Where navigating to this route should lead instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: Meta,
}

impl RouteRecord {
    /// Creates a record for the given path template.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Sets the route name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends a child record.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Replaces the child records.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Self>) -> Self {
        self.children = children;
        self
    }

    /// Sets an explicit redirect.
    #[must_use]
    pub fn with_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// A route record with every default filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedRouteRecord {
    /// The route name, if any.
    pub name: Option<String>,
    /// The path template. Inside the registry this is the full, composed path.
    pub path: String,
    /// Nested route records (never absent).
    pub children: Vec<RouteRecord>,
    /// The explicit redirect, or the first child's path.
    pub redirect: Option<String>,
    /// Metadata (never absent).
    pub meta: Meta,
}

/// Normalizes an authored record.
///
/// `redirect` defaults to the first child's path when the record has children
/// and no explicit redirect. The same default is applied to each direct child,
/// one level deep only: grandchildren are left to their own normalization.
pub fn normalize_route_record(record: &RouteRecord) -> NormalizedRouteRecord {
    let children = record
        .children
        .iter()
        .map(|child| {
            let mut child = child.clone();
            if child.redirect.is_none() {
                child.redirect = first_child_path(&child);
            }
            child
        })
        .collect();

    NormalizedRouteRecord {
        name: record.name.clone(),
        path: record.path.clone(),
        children,
        redirect: record.redirect.clone().or_else(|| first_child_path(record)),
        meta: record.meta.clone(),
    }
}

fn first_child_path(record: &RouteRecord) -> Option<String> {
    record.children.first().map(|child| child.path.clone())
}

/// Warns when a named parent has an unnamed child with an empty path.
///
/// Navigating by the parent's name will never render such a child, which is
/// almost always a mistake: the name usually belongs on the child.
pub fn check_child_missing_name_with_empty_path(
    record: &NormalizedRouteRecord,
    parent: Option<&NormalizedRouteRecord>,
) {
    if let Some(parent_name) = parent.and_then(|p| p.name.as_deref()) {
        if record.name.is_none() && record.path.is_empty() {
            tracing::warn!(
                parent = parent_name,
                "route has an unnamed child with an empty path; navigating by the parent's \
                 name will not render it, consider moving the name to the child"
            );
        }
    }
}

/// Merges the metadata of a matched chain, root first, so leaf keys win.
pub fn merge_meta_fields(matched: &[NormalizedRouteRecord]) -> Meta {
    matched.iter().fold(Meta::new(), |mut meta, record| {
        meta.extend(record.meta.iter().map(|(k, v)| (k.clone(), v.clone())));
        meta
    })
}
