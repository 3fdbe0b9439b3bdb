//! The bootstrap hook run by [`Router::init_ready`](crate::Router::init_ready).

use async_trait::async_trait;

use simple_router_core::RouterResult;
use simple_router_matcher::RouteRecord;

use crate::target::NavigationTarget;

/// Application code run once before the router starts navigating.
///
/// The hook receives the full path the navigator starts at and a
/// [`RoutePatcher`] to record routes that should exist from the start, such as
/// routes granted to the signed-in user. It returns where to go once the
/// router is ready, or `None` to stay.
///
/// ```
/// use async_trait::async_trait;
/// use simple_router_core::RouterResult;
/// use simple_router_matcher::RouteRecord;
/// use simple_router_navigation::{InitHook, NavigationTarget, RoutePatcher};
///
/// struct LoadMenus;
///
/// #[async_trait(?Send)]
/// impl InitHook for LoadMenus {
///     async fn init(
///         &self,
///         current_full_path: &str,
///         patcher: &mut RoutePatcher,
///     ) -> RouterResult<Option<NavigationTarget>> {
///         patcher.patch_routes(None, vec![RouteRecord::new("/reports").with_name("reports")]);
///         Ok((current_full_path == "/").then(|| NavigationTarget::from("/reports")))
///     }
/// }
/// ```
#[async_trait(?Send)]
pub trait InitHook {
    /// Runs the bootstrap. An error aborts `init_ready` and is returned from it.
    async fn init(
        &self,
        current_full_path: &str,
        patcher: &mut RoutePatcher,
    ) -> RouterResult<Option<NavigationTarget>>;
}

/// Routes to add under a parent route.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePatch {
    /// Name of the parent route, or `None` for the root.
    pub parent: Option<String>,
    /// The routes to add.
    pub routes: Vec<RouteRecord>,
}

/// Records route additions requested by an [`InitHook`].
///
/// Nothing is applied while the hook runs; the router adds the recorded
/// routes, in order, once the hook has succeeded.
#[derive(Debug, Default)]
pub struct RoutePatcher {
    patches: Vec<RoutePatch>,
}

impl RoutePatcher {
    /// Creates an empty patcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records routes to add under `parent`.
    pub fn patch_routes(&mut self, parent: Option<&str>, routes: Vec<RouteRecord>) {
        self.patches.push(RoutePatch {
            parent: parent.map(ToString::to_string),
            routes,
        });
    }

    /// The recorded patches, in order.
    pub fn patches(&self) -> &[RoutePatch] {
        &self.patches
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Consumes the patcher, returning its patches.
    pub fn into_patches(self) -> Vec<RoutePatch> {
        self.patches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patcher_keeps_order() {
        let mut patcher = RoutePatcher::new();
        assert!(patcher.is_empty());
        patcher.patch_routes(None, vec![RouteRecord::new("/a").with_name("a")]);
        patcher.patch_routes(Some("a"), vec![RouteRecord::new("b").with_name("b")]);

        let patches = patcher.into_patches();
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].parent, None);
        assert_eq!(patches[1].parent.as_deref(), Some("a"));
        assert_eq!(patches[1].routes[0].name.as_deref(), Some("b"));
    }
}
