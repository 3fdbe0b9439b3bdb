//! Navigation intents and resolved locations.
//!
//! A navigation intent comes in one of three shapes, modelled by
//! [`RouteLocationRaw`]:
//!
//! - [`NamedLocationRaw`]: a route name plus params, query and hash
//! - [`PathLocationRaw`]: a concrete pathname plus the raw search and hash
//! - [`CurrentLocationRaw`]: neither; the current route is reused with new params
//!
//! The registry turns any of them into a [`ResolvedLocation`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::query::{LocationQuery, LocationQueryRaw, RawQueryValue};
use crate::record::{Meta, NormalizedRouteRecord};

// ── Parameter values ─────────────────────────────────────────────────

/// A single route parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) if n.is_infinite() => {
                f.write_str(if n.is_sign_positive() { "Infinity" } else { "-Infinity" })
            }
            Self::Float(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! param_value_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ParamValue {
                fn from(value: $t) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

param_value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Text(value.to_string()), Self::Int)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Text(value.to_string()), Self::Int)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A parameter as supplied by a caller, before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub enum RawParam {
    /// An explicitly absent value; dropped by [`clean_params`](crate::path::clean_params).
    Null,
    /// A single value.
    Value(ParamValue),
    /// A list of values; joined with commas when cleaned.
    List(Vec<ParamValue>),
}

impl<T: Into<ParamValue>> From<Option<T>> for RawParam {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, |v| Self::Value(v.into()))
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for RawParam {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<ParamValue> for RawParam {
    fn from(value: ParamValue) -> Self {
        Self::Value(value)
    }
}

macro_rules! raw_param_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for RawParam {
                fn from(value: $t) -> Self {
                    Self::Value(ParamValue::from(value))
                }
            }
        )*
    };
}

raw_param_from_scalar!(&str, String, i32, i64, u32, u64, usize, f64);

/// Cleaned parameters, as found on a [`ResolvedLocation`].
pub type Params = HashMap<String, ParamValue>;

/// Parameters as supplied by a caller.
pub type RawParams = HashMap<String, RawParam>;

// ── Navigation intents ───────────────────────────────────────────────

/// Navigate to a route by name.
///
/// # Examples
///
/// ```
/// use simple_router_matcher::location::NamedLocationRaw;
///
/// let target = NamedLocationRaw::new("user")
///     .param("id", 5)
///     .query("tab", "profile")
///     .hash("#top");
/// assert_eq!(target.name, "user");
/// assert_eq!(target.hash, "#top");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedLocationRaw {
    /// The route name.
    pub name: String,
    /// Parameters substituted into the route's path template.
    pub params: RawParams,
    /// Query appended to the generated path.
    pub query: LocationQueryRaw,
    /// Hash appended after the query, including its leading `#`.
    pub hash: String,
    /// Transient state passed through to the navigator.
    pub state: Option<serde_json::Value>,
}

impl NamedLocationRaw {
    /// Creates a target for the named route.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets a parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<RawParam>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Appends a query entry.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<RawQueryValue>) -> Self {
        self.query.insert(key, value);
        self
    }

    /// Sets the hash.
    #[must_use]
    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }

    /// Sets the transient state.
    #[must_use]
    pub fn state(mut self, state: serde_json::Value) -> Self {
        self.state = Some(state);
        self
    }
}

/// Navigate to a concrete path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathLocationRaw {
    /// The pathname, possibly still carrying the basename.
    pub pathname: String,
    /// The raw search string, with or without its leading `?`.
    pub search: String,
    /// The hash, including its leading `#`.
    pub hash: String,
    /// Transient state passed through to the navigator.
    pub state: Option<serde_json::Value>,
}

impl PathLocationRaw {
    /// Creates a target for the given pathname.
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            ..Self::default()
        }
    }

    /// Sets the search string.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Sets the hash.
    #[must_use]
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }

    /// Sets the transient state.
    #[must_use]
    pub fn with_state(mut self, state: serde_json::Value) -> Self {
        self.state = Some(state);
        self
    }
}

/// Re-resolve the current route with new params, query or hash.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentLocationRaw {
    /// Parameters merged over the current route's parameters.
    pub params: RawParams,
    /// The query of the new location.
    pub query: LocationQueryRaw,
    /// The hash of the new location.
    pub hash: String,
}

/// A navigation intent.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteLocationRaw {
    /// By route name.
    Named(NamedLocationRaw),
    /// By concrete path.
    Path(PathLocationRaw),
    /// By reusing the current route.
    Current(CurrentLocationRaw),
}

impl RouteLocationRaw {
    /// The transient state carried by the intent, if any.
    pub const fn state(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Named(named) => named.state.as_ref(),
            Self::Path(path) => path.state.as_ref(),
            Self::Current(_) => None,
        }
    }
}

impl From<NamedLocationRaw> for RouteLocationRaw {
    fn from(location: NamedLocationRaw) -> Self {
        Self::Named(location)
    }
}

impl From<PathLocationRaw> for RouteLocationRaw {
    fn from(location: PathLocationRaw) -> Self {
        Self::Path(location)
    }
}

impl From<CurrentLocationRaw> for RouteLocationRaw {
    fn from(location: CurrentLocationRaw) -> Self {
        Self::Current(location)
    }
}

// ── Resolved locations ───────────────────────────────────────────────

/// The fully computed navigation target.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedLocation {
    /// Path, query and hash, with the basename stripped.
    pub full_path: String,
    /// Name of the matched route.
    pub name: Option<String>,
    /// The route template for named targets, the concrete path otherwise.
    pub path: String,
    /// Cleaned parameters.
    pub params: Params,
    /// Parsed query.
    pub query: LocationQuery,
    /// The hash, including its leading `#`.
    pub hash: String,
    /// The matched records, root first.
    pub matched: Vec<NormalizedRouteRecord>,
    /// The matched route's redirect, if any.
    pub redirect: Option<String>,
    /// Metadata of `matched`, merged root to leaf.
    pub meta: Meta,
    /// Transient navigation state.
    pub state: Option<serde_json::Value>,
    /// The location this one was resolved from.
    pub redirected_from: Option<Box<ResolvedLocation>>,
}

impl ResolvedLocation {
    /// The location a router starts from before its first navigation.
    pub fn start() -> Self {
        Self {
            full_path: "/".to_string(),
            path: "/".to_string(),
            ..Self::default()
        }
    }

    /// A copy suitable for `redirected_from`: its own history is cleared so
    /// chains never grow beyond one level.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self {
            redirected_from: None,
            ..self.clone()
        }
    }

    /// Whether any route matched.
    pub fn is_matched(&self) -> bool {
        !self.matched.is_empty()
    }

    /// The deepest matched record.
    pub fn leaf(&self) -> Option<&NormalizedRouteRecord> {
        self.matched.last()
    }

    /// The path the redirect finally leads to.
    ///
    /// An absolute redirect is taken as is; a relative one is joined to the
    /// full path of the matched route.
    ///
    /// ```
    /// use simple_router_matcher::location::ResolvedLocation;
    /// use simple_router_matcher::record::NormalizedRouteRecord;
    ///
    /// let location = ResolvedLocation {
    ///     redirect: Some("user".to_string()),
    ///     matched: vec![NormalizedRouteRecord {
    ///         path: "/manage".to_string(),
    ///         ..NormalizedRouteRecord::default()
    ///     }],
    ///     ..ResolvedLocation::default()
    /// };
    /// assert_eq!(location.redirect_target().as_deref(), Some("/manage/user"));
    /// ```
    pub fn redirect_target(&self) -> Option<String> {
        let redirect = self.redirect.as_deref()?;
        if redirect.starts_with('/') {
            return Some(redirect.to_string());
        }
        let base = self.leaf().map_or(self.path.as_str(), |leaf| leaf.path.as_str());
        if redirect.is_empty() {
            return Some(base.to_string());
        }
        let separator = if base.ends_with('/') { "" } else { "/" };
        Some(format!("{base}{separator}{redirect}"))
    }
}
