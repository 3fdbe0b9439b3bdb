//! The navigation coordinator.
//!
//! [`Router`] ties a [`RouteMatcherRegistry`] to a [`NavigationPrimitive`].
//! It registers a blocker with the primitive to run the before guard, and a
//! subscriber to update the current route and run the after guard once a
//! transition has committed. Both handlers share the router's state through
//! an `Rc<RefCell<_>>`; the router never holds a borrow of that state while
//! it calls into the primitive.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use simple_router_core::logging::navigation_span;
use simple_router_core::{RouterError, RouterResult, Settings};
use simple_router_history::{
    parse_path, BlockerArgs, BlockerState, Location, MemoryNavigator, NavigateOptions, NavigateTo,
    NavigationPrimitive, NavigationState, NavigatorState, RouteObject, SubscriptionId,
};
use simple_router_matcher::{
    generate_path, NormalizedRouteRecord, PathLocationRaw, ResolvedLocation, RouteLocationRaw,
    RouteMatcherRegistry, RouteRecord,
};

use crate::data_process::{
    route_record_to_object, transform_location_to_full_path, transform_location_to_route,
};
use crate::guards::{AfterGuard, BeforeGuard, GuardId, GuardSlot, Redirector};
use crate::init::{InitHook, RoutePatcher};
use crate::target::NavigationTarget;

/// Key under which the router registers its blocker.
pub const BEFORE_GUARD_KEY: &str = "beforeGuard";

/// Converts a route record into the navigator's route shape.
///
/// Named routes must get their name as id: the router patches children in
/// under their parent's name.
pub type RouteConverter = Box<dyn Fn(&RouteRecord) -> RouteObject>;

/// Construction options of a [`Router`].
#[derive(Default)]
pub struct RouterOptions {
    /// Router settings.
    pub settings: Settings,
    /// The initial route table.
    pub init_routes: Vec<RouteRecord>,
    /// Conversion into the navigator's routes; defaults to
    /// [`route_record_to_object`].
    pub route_converter: Option<RouteConverter>,
}

impl fmt::Debug for RouterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterOptions")
            .field("settings", &self.settings)
            .field("init_routes", &self.init_routes)
            .field("route_converter", &self.route_converter.is_some())
            .finish()
    }
}

/// A navigation queued by a guard jump or a redirect.
#[derive(Debug, Clone, PartialEq)]
struct PendingNavigation {
    target: NavigationTarget,
    replace: bool,
}

/// State shared with the handlers registered on the navigator.
struct RouterCore {
    registry: RouteMatcherRegistry,
    current_route: ResolvedLocation,
    before_guards: GuardSlot<BeforeGuard>,
    after_guards: GuardSlot<AfterGuard>,
    pending: VecDeque<PendingNavigation>,
    settings: Settings,
}

impl RouterCore {
    fn current_pathname(&self) -> String {
        parse_path(&self.current_route.full_path).pathname
    }

    /// Resolves a target against the current route.
    fn resolve(&self, target: &NavigationTarget) -> RouterResult<ResolvedLocation> {
        let raw = target.to_location_raw(&self.current_pathname());
        self.resolve_raw(&raw)
    }

    fn resolve_raw(&self, raw: &RouteLocationRaw) -> RouterResult<ResolvedLocation> {
        let mut resolved = self.registry.resolve(raw, &self.current_route)?;
        resolved.redirected_from = Some(Box::new(self.current_route.snapshot()));
        Ok(resolved)
    }

    fn resolve_location(&self, location: &Location) -> RouterResult<ResolvedLocation> {
        self.resolve_raw(&RouteLocationRaw::Path(PathLocationRaw {
            pathname: location.pathname.clone(),
            search: location.search.clone(),
            hash: location.hash.clone(),
            state: location.state.clone(),
        }))
    }

    /// The route for a navigator state: what the registry resolves, or what
    /// the navigator matched when only its own table knows the location.
    fn route_for(&self, state: &NavigatorState) -> ResolvedLocation {
        match self.resolve_location(&state.location) {
            Ok(resolved) if resolved.is_matched() || state.matches.is_empty() => resolved,
            other => {
                if let Err(e) = other {
                    tracing::warn!(error = %e, "cannot resolve navigator location");
                }
                ResolvedLocation {
                    redirected_from: Some(Box::new(self.current_route.snapshot())),
                    ..transform_location_to_route(&state.location, &state.matches)
                }
            }
        }
    }

    /// Blocker predicate: `true` blocks the transition.
    fn before_navigation(&mut self, args: &BlockerArgs) -> bool {
        let to = match self.resolve_location(&args.next_location) {
            Ok(to) => to,
            Err(e) => {
                tracing::warn!(error = %e, "cannot resolve navigation target, guard skipped");
                return false;
            }
        };
        let from = self.current_route.clone();
        let _span = navigation_span(&from.full_path, &to.full_path).entered();

        if to.full_path == from.full_path {
            tracing::debug!("target is the current location, guard skipped");
            return false;
        }
        if terminal_redirect(&to).is_some_and(|target| target == from.full_path) {
            tracing::debug!("target redirects to the current location, guard skipped");
            return false;
        }

        let Some(guard) = self.before_guards.active_mut() else {
            return false;
        };
        let redirector = Redirector::default();
        let allowed = guard(&to, &from, &redirector);

        let jumps = redirector.into_targets();
        if !jumps.is_empty() {
            tracing::debug!(count = jumps.len(), "before guard redirected the navigation");
            self.pending.extend(jumps.into_iter().map(|target| PendingNavigation {
                target,
                replace: false,
            }));
            return true;
        }
        if !allowed {
            tracing::debug!("before guard denied the navigation");
        }
        !allowed
    }

    /// Subscriber: runs once the navigator is idle after a committed
    /// transition.
    fn after_navigation(&mut self, state: &NavigatorState) {
        if state.navigation != NavigationState::Idle || state.blocker != BlockerState::Unblocked {
            return;
        }

        let to = self.route_for(state);
        let from = std::mem::replace(&mut self.current_route, to.clone());
        let _span = navigation_span(&from.full_path, &to.full_path).entered();
        tracing::debug!(name = to.name.as_deref().unwrap_or(""), "current route updated");

        if self.settings.follow_redirects {
            if let Some(target) = terminal_redirect(&to)
                .filter(|target| *target != to.full_path && *target != to.path)
            {
                tracing::debug!(redirect = %target, "following route redirect");
                self.pending.push_back(PendingNavigation {
                    target: NavigationTarget::Url(target),
                    replace: true,
                });
            }
        }

        if let Some(guard) = self.after_guards.active_mut() {
            guard(&to, &from);
        }
    }
}

/// The navigation coordinator.
///
/// # Examples
///
/// ```
/// use simple_router_matcher::{NamedLocationRaw, RouteRecord};
/// use simple_router_navigation::{create_memory_router, RouterOptions};
///
/// let mut router = create_memory_router(RouterOptions {
///     init_routes: vec![
///         RouteRecord::new("/home").with_name("home"),
///         RouteRecord::new("/user/:id").with_name("user"),
///     ],
///     ..RouterOptions::default()
/// })
/// .unwrap();
///
/// router.push(NamedLocationRaw::new("user").param("id", 5)).unwrap();
/// assert_eq!(router.current_route().full_path, "/user/5");
/// ```
pub struct Router<N: NavigationPrimitive> {
    navigator: N,
    core: Rc<RefCell<RouterCore>>,
    route_converter: RouteConverter,
    subscription: Option<SubscriptionId>,
    ready: bool,
}

impl<N: NavigationPrimitive + fmt::Debug> fmt::Debug for Router<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.borrow();
        f.debug_struct("Router")
            .field("navigator", &self.navigator)
            .field("current_route", &core.current_route.full_path)
            .field("routes", &core.registry.get_all_route_names())
            .field("ready", &self.ready)
            .finish_non_exhaustive()
    }
}

impl<N: NavigationPrimitive> Router<N> {
    /// Creates a router over `navigator`.
    ///
    /// The navigator's route table is replaced by the converted initial
    /// routes, and the router's blocker and subscriber are registered.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::ImproperlyConfigured`] if a route path cannot be
    /// compiled.
    pub fn new(mut navigator: N, options: RouterOptions) -> RouterResult<Self> {
        let RouterOptions {
            settings,
            init_routes,
            route_converter,
        } = options;
        let route_converter = route_converter.unwrap_or_else(default_converter);

        let objects = init_routes.iter().map(|route| route_converter(route)).collect();
        let registry = RouteMatcherRegistry::new(init_routes, settings.base.clone())?;
        navigator.routes_mut().clear();
        navigator.patch_routes(None, objects);

        let mut core = RouterCore {
            registry,
            current_route: ResolvedLocation::start(),
            before_guards: GuardSlot::new(),
            after_guards: GuardSlot::new(),
            pending: VecDeque::new(),
            settings,
        };
        core.current_route = ResolvedLocation {
            redirected_from: None,
            ..core.route_for(navigator.state())
        };
        tracing::debug!(
            routes = core.registry.len(),
            current = %core.current_route.full_path,
            "router created"
        );
        let core = Rc::new(RefCell::new(core));

        let blocker_core = Rc::clone(&core);
        navigator.get_blocker(
            BEFORE_GUARD_KEY,
            Box::new(move |args| blocker_core.borrow_mut().before_navigation(args)),
        );
        let subscriber_core = Rc::clone(&core);
        let subscription = navigator.subscribe(Box::new(move |state| {
            subscriber_core.borrow_mut().after_navigation(state);
        }));

        Ok(Self {
            navigator,
            core,
            route_converter,
            subscription: Some(subscription),
            ready: false,
        })
    }

    /// The navigation primitive.
    pub const fn navigator(&self) -> &N {
        &self.navigator
    }

    /// The navigation primitive, for direct edits such as patching its route
    /// table. Navigating through it bypasses the router's pending jumps.
    pub fn navigator_mut(&mut self) -> &mut N {
        &mut self.navigator
    }

    /// The router settings.
    pub fn settings(&self) -> Settings {
        self.core.borrow().settings.clone()
    }

    /// The current route.
    pub fn current_route(&self) -> ResolvedLocation {
        self.core.borrow().current_route.clone()
    }

    /// The current location as the navigator's own route table sees it.
    pub fn navigator_route(&self) -> ResolvedLocation {
        let state = self.navigator.state();
        transform_location_to_route(&state.location, &state.matches)
    }

    /// Resolves a target without navigating.
    ///
    /// The result's `redirected_from` is a snapshot of the current route.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::MissingRoute`] when a current-route target is
    /// given and the current route cannot be resolved.
    pub fn resolve(&self, to: impl Into<NavigationTarget>) -> RouterResult<ResolvedLocation> {
        self.core.borrow().resolve(&to.into())
    }

    /// Renders a target as an href for the navigator's mode.
    pub fn create_href(&self, to: impl Into<NavigationTarget>) -> RouterResult<String> {
        let resolved = self.resolve(to)?;
        Ok(self.navigator.create_href(&Location::new(&resolved.full_path)))
    }

    // ── Guards ───────────────────────────────────────────────────────

    /// Registers a before guard. Only the earliest registrant still present
    /// runs.
    pub fn before_each(
        &mut self,
        guard: impl FnMut(&ResolvedLocation, &ResolvedLocation, &Redirector) -> bool + 'static,
    ) -> GuardId {
        self.core.borrow_mut().before_guards.add(Box::new(guard))
    }

    /// Registers an after guard. Only the earliest registrant still present
    /// runs.
    pub fn after_each(
        &mut self,
        guard: impl FnMut(&ResolvedLocation, &ResolvedLocation) + 'static,
    ) -> GuardId {
        self.core.borrow_mut().after_guards.add(Box::new(guard))
    }

    /// Unregisters a before guard.
    pub fn remove_before_each(&mut self, id: GuardId) -> bool {
        self.core.borrow_mut().before_guards.remove(id)
    }

    /// Unregisters an after guard.
    pub fn remove_after_each(&mut self, id: GuardId) -> bool {
        self.core.borrow_mut().after_guards.remove(id)
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Navigates to a target, pushing a history entry.
    ///
    /// Navigating to the current full path does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::NavigationDuplicated`] when a structured target
    /// matches no route, and [`RouterError::MissingRoute`] when a
    /// current-route target cannot be resolved.
    pub fn push(&mut self, to: impl Into<NavigationTarget>) -> RouterResult<()> {
        self.navigate_to(to.into(), false)?;
        self.run_pending()
    }

    /// Navigates to a target, replacing the current history entry.
    ///
    /// # Errors
    ///
    /// Same as [`push`](Self::push).
    pub fn replace(&mut self, to: impl Into<NavigationTarget>) -> RouterResult<()> {
        self.navigate_to(to.into(), true)?;
        self.run_pending()
    }

    /// Moves through the history stack by `delta` entries.
    ///
    /// # Errors
    ///
    /// Returns the failure of a navigation queued by a guard or redirect.
    pub fn go(&mut self, delta: i64) -> RouterResult<()> {
        self.navigator
            .navigate(NavigateTo::Delta(delta), NavigateOptions::default());
        self.run_pending()
    }

    /// Goes one entry back.
    pub fn back(&mut self) -> RouterResult<()> {
        self.go(-1)
    }

    /// Goes one entry forward.
    pub fn forward(&mut self) -> RouterResult<()> {
        self.go(1)
    }

    fn navigate_to(&mut self, target: NavigationTarget, replace: bool) -> RouterResult<()> {
        let (resolved, from) = {
            let core = self.core.borrow();
            (core.resolve(&target)?, core.current_route.full_path.clone())
        };

        if target.is_structured() && !resolved.is_matched() {
            tracing::warn!(from = %from, to = %resolved.full_path, "navigation target matches no route");
            return Err(RouterError::NavigationDuplicated {
                from,
                to: resolved.full_path,
            });
        }
        if resolved.full_path == from {
            tracing::debug!(path = %from, "already at the target, navigation skipped");
            return Ok(());
        }

        tracing::debug!(from = %from, to = %resolved.full_path, replace, "navigating");
        self.navigator.navigate(
            NavigateTo::Path(resolved.full_path),
            NavigateOptions {
                replace,
                state: resolved.state,
            },
        );
        Ok(())
    }

    /// Runs the navigations queued by guard jumps and redirects.
    fn run_pending(&mut self) -> RouterResult<()> {
        let limit = self.core.borrow().settings.max_redirects;
        for _ in 0..limit {
            let next = self.core.borrow_mut().pending.pop_front();
            let Some(pending) = next else {
                return Ok(());
            };
            tracing::debug!(to = ?pending.target, replace = pending.replace, "running queued navigation");
            if let Err(e) = self.navigate_to(pending.target, pending.replace) {
                let mut core = self.core.borrow_mut();
                tracing::warn!(error = %e, dropped = core.pending.len(), "queued navigation failed");
                core.pending.clear();
                return Err(e);
            }
        }

        let dropped = {
            let mut core = self.core.borrow_mut();
            let dropped = core.pending.len();
            core.pending.clear();
            dropped
        };
        if dropped > 0 {
            tracing::warn!(limit, dropped, "too many chained redirects, remaining navigations dropped");
        }
        Ok(())
    }

    // ── Route table ──────────────────────────────────────────────────

    /// Adds a route under the route named `parent`, or at the root.
    ///
    /// A route whose name is already registered replaces the previous one. An
    /// unknown parent is reported and the route is added at the root. The
    /// navigator's route table is patched to match.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::ImproperlyConfigured`] if a route path cannot be
    /// compiled.
    pub fn add_route(&mut self, parent: Option<&str>, route: RouteRecord) -> RouterResult<()> {
        if let Some(name) = route.name.as_deref() {
            if self.has_route(name) {
                self.remove_route(name);
            }
        }
        let parent = self.register(parent, &route)?;
        let object = (self.route_converter)(&route);
        self.navigator.patch_routes(parent.as_deref(), vec![object]);
        Ok(())
    }

    /// Adds routes under the route named `parent`, or at the root, skipping
    /// routes whose name is already registered. The navigator is patched once
    /// with every route that was added.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::ImproperlyConfigured`] if a route path cannot be
    /// compiled.
    pub fn add_react_routes(
        &mut self,
        parent: Option<&str>,
        routes: Vec<RouteRecord>,
    ) -> RouterResult<()> {
        let mut objects = Vec::new();
        let mut patch_parent = parent.map(ToString::to_string);
        for route in routes {
            if route.name.as_deref().is_some_and(|name| self.has_route(name)) {
                tracing::debug!(name = ?route.name, "route already registered, skipped");
                continue;
            }
            patch_parent = self.register(parent, &route)?;
            objects.push((self.route_converter)(&route));
        }
        if objects.is_empty() {
            return Ok(());
        }
        self.navigator.patch_routes(patch_parent.as_deref(), objects);
        Ok(())
    }

    /// Adds a route to the registry. Returns the parent name the navigator
    /// should patch under.
    fn register(&self, parent: Option<&str>, route: &RouteRecord) -> RouterResult<Option<String>> {
        let mut core = self.core.borrow_mut();
        let parent_id = parent.and_then(|name| {
            let id = core.registry.matcher_id(name);
            if id.is_none() {
                tracing::warn!(parent = name, "parent route not found, adding the route at the root");
            }
            id
        });
        core.registry.add_route(route, parent_id)?;
        Ok(parent_id.and(parent).map(ToString::to_string))
    }

    /// Removes a named route and its descendants from the registry and from
    /// the navigator's route table. Unknown names are ignored.
    pub fn remove_route(&mut self, name: &str) {
        let chain = {
            let mut core = self.core.borrow_mut();
            let Some(id) = core.registry.matcher_id(name) else {
                tracing::debug!(name, "no such route to remove");
                return;
            };
            let chain: Vec<NormalizedRouteRecord> = core
                .registry
                .ancestors(id)
                .into_iter()
                .filter_map(|ancestor| core.registry.matcher(ancestor))
                .map(|node| node.record().clone())
                .collect();
            core.registry.remove_route(id);
            chain
        };

        if !splice_route(self.navigator.routes_mut(), &chain, None) {
            tracing::debug!(name, "route not present in the navigator's table");
        }
    }

    /// Restores the initial route table, in the registry and the navigator.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::ImproperlyConfigured`] if a route path cannot be
    /// compiled.
    pub fn reset_routes(&mut self) -> RouterResult<()> {
        let objects = {
            let mut core = self.core.borrow_mut();
            core.registry.reset_matchers()?;
            core.registry
                .init_routes()
                .iter()
                .map(|route| (self.route_converter)(route))
                .collect()
        };
        self.navigator.routes_mut().clear();
        self.navigator.patch_routes(None, objects);
        Ok(())
    }

    /// All named routes, the fallback first.
    pub fn get_routes(&self) -> Vec<NormalizedRouteRecord> {
        self.core
            .borrow()
            .registry
            .get_routes()
            .into_iter()
            .map(|node| node.record().clone())
            .collect()
    }

    /// The names of all named routes.
    pub fn get_all_route_names(&self) -> Vec<String> {
        self.core.borrow().registry.get_all_route_names()
    }

    /// Whether a route with this name is registered.
    pub fn has_route(&self, name: &str) -> bool {
        self.core.borrow().registry.has_route(name)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Runs the bootstrap hook, applies the routes it recorded, initializes
    /// the navigator and navigates to the hook's target, if any.
    ///
    /// Only the first call does anything.
    ///
    /// # Errors
    ///
    /// Returns the hook's error, or the failure of the initial navigation.
    pub async fn init_ready(&mut self, hook: &dyn InitHook) -> RouterResult<()> {
        if self.ready {
            tracing::debug!("router already initialized");
            return Ok(());
        }
        self.ready = true;

        let current = transform_location_to_full_path(&self.navigator.state().location);
        let mut patcher = RoutePatcher::new();
        let target = hook.init(&current, &mut patcher).await.map_err(|e| {
            tracing::error!(error = %e, "init hook failed");
            e
        })?;

        for patch in patcher.into_patches() {
            self.add_react_routes(patch.parent.as_deref(), patch.routes)?;
        }
        self.navigator.initialize();
        self.run_pending()?;

        match target {
            Some(target) if !target.is_empty() => self.push(target),
            _ => Ok(()),
        }
    }

    /// Whether [`init_ready`](Self::init_ready) has run.
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Detaches the router from the navigator and disposes of it.
    pub fn dispose(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.navigator.unsubscribe(id);
        }
        self.navigator.delete_blocker(BEFORE_GUARD_KEY);
        self.navigator.dispose();

        let mut core = self.core.borrow_mut();
        core.before_guards.clear();
        core.after_guards.clear();
        core.pending.clear();
    }
}

/// Creates a router over a [`MemoryNavigator`] configured from the settings.
///
/// # Errors
///
/// Returns [`RouterError::ImproperlyConfigured`] if a route path cannot be
/// compiled.
pub fn create_memory_router(options: RouterOptions) -> RouterResult<Router<MemoryNavigator>> {
    let navigator = MemoryNavigator::from_settings(Vec::new(), &options.settings);
    Router::new(navigator, options)
}

/// The concrete path a location redirects to, with its params filled in.
fn terminal_redirect(location: &ResolvedLocation) -> Option<String> {
    location
        .redirect_target()
        .map(|target| generate_path(&target, &location.params))
}

fn default_converter() -> RouteConverter {
    Box::new(route_record_to_object)
}

/// Removes the route at the end of `chain` from a navigator route table,
/// descending through the chain's ancestors level by level.
fn splice_route(
    routes: &mut Vec<RouteObject>,
    chain: &[NormalizedRouteRecord],
    parent_path: Option<&str>,
) -> bool {
    let Some((record, rest)) = chain.split_first() else {
        return false;
    };
    let Some(position) = routes
        .iter()
        .position(|route| is_same_route(route, record, parent_path))
    else {
        return false;
    };

    if rest.is_empty() {
        routes.remove(position);
        return true;
    }
    let full_path = compose_path(parent_path, routes[position].path.as_deref().unwrap_or(""));
    splice_route(&mut routes[position].children, rest, Some(&full_path))
}

fn is_same_route(route: &RouteObject, record: &NormalizedRouteRecord, parent_path: Option<&str>) -> bool {
    match record.name.as_deref() {
        Some(name) => route.id == name || route.name.as_deref() == Some(name),
        None => {
            route.name.is_none()
                && compose_path(parent_path, route.path.as_deref().unwrap_or("")) == record.path
        }
    }
}

/// Composes a route's full path the way the registry does.
fn compose_path(parent_path: Option<&str>, path: &str) -> String {
    match parent_path {
        None => path.to_string(),
        Some(parent) if path.is_empty() => parent.to_string(),
        Some(_) if path.starts_with('/') => path.to_string(),
        Some(parent) => {
            let separator = if parent.ends_with('/') { "" } else { "/" };
            format!("{parent}{separator}{path}")
        }
    }
}
