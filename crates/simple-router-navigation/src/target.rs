//! Navigation targets accepted by the router.

use url::Url;

use simple_router_history::parse_path;
use simple_router_matcher::{
    CurrentLocationRaw, NamedLocationRaw, PathLocationRaw, RouteLocationRaw,
};

/// Base used to resolve relative targets; only its path is ever read back.
const RELATIVE_BASE: &str = "memory://localhost";

/// Where to navigate: a URL string or a structured location.
///
/// ```
/// use simple_router_matcher::NamedLocationRaw;
/// use simple_router_navigation::NavigationTarget;
///
/// assert!(!NavigationTarget::from("/user/5").is_structured());
/// assert!(NavigationTarget::from(NamedLocationRaw::new("user")).is_structured());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationTarget {
    /// A path such as `/user/5?tab=a#top`, a relative path, or an absolute URL.
    Url(String),
    /// A structured location.
    Location(RouteLocationRaw),
}

impl NavigationTarget {
    /// Whether the target is a structured location rather than a URL string.
    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Location(_))
    }

    /// Whether the target is an empty URL string, which navigates nowhere.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Url(url) if url.trim().is_empty())
    }

    /// Turns the target into a resolution input.
    ///
    /// A URL string becomes a path location. Absolute URLs are reduced to
    /// their path, query and fragment; relative paths are joined to
    /// `current_path`, and a target without a path keeps `current_path`.
    pub fn to_location_raw(&self, current_path: &str) -> RouteLocationRaw {
        match self {
            Self::Location(location) => location.clone(),
            Self::Url(url) => {
                let parts = parse_path(&reduce_url(url));
                let pathname = if parts.pathname.is_empty() {
                    current_path.to_string()
                } else if parts.pathname.starts_with('/') {
                    parts.pathname
                } else {
                    join_relative(current_path, &parts.pathname)
                };
                RouteLocationRaw::Path(
                    PathLocationRaw::new(pathname)
                        .with_search(parts.search)
                        .with_hash(parts.hash),
                )
            }
        }
    }
}

impl From<&str> for NavigationTarget {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for NavigationTarget {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<&String> for NavigationTarget {
    fn from(url: &String) -> Self {
        Self::Url(url.clone())
    }
}

impl From<RouteLocationRaw> for NavigationTarget {
    fn from(location: RouteLocationRaw) -> Self {
        Self::Location(location)
    }
}

impl From<NamedLocationRaw> for NavigationTarget {
    fn from(location: NamedLocationRaw) -> Self {
        Self::Location(RouteLocationRaw::Named(location))
    }
}

impl From<PathLocationRaw> for NavigationTarget {
    fn from(location: PathLocationRaw) -> Self {
        Self::Location(RouteLocationRaw::Path(location))
    }
}

impl From<CurrentLocationRaw> for NavigationTarget {
    fn from(location: CurrentLocationRaw) -> Self {
        Self::Location(RouteLocationRaw::Current(location))
    }
}

/// Reduces an absolute URL such as `https://host/a?b#c` to `/a?b#c`.
/// Anything else is returned unchanged.
fn reduce_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) if !parsed.cannot_be_a_base() => {
            let mut path = parsed.path().to_string();
            if let Some(query) = parsed.query() {
                path.push('?');
                path.push_str(query);
            }
            if let Some(fragment) = parsed.fragment() {
                path.push('#');
                path.push_str(fragment);
            }
            path
        }
        _ => url.to_string(),
    }
}

fn join_relative(current_path: &str, relative: &str) -> String {
    let base = format!("{RELATIVE_BASE}{current_path}");
    match Url::parse(&base).and_then(|url| url.join(relative)) {
        Ok(url) => url.path().to_string(),
        Err(e) => {
            tracing::warn!(path = relative, error = %e, "cannot resolve relative target");
            relative.to_string()
        }
    }
}
