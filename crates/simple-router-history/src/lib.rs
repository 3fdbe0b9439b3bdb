//! # simple-router-history
//!
//! The navigation primitive a router coordinates with. A navigation primitive
//! owns the history stack, commits or refuses transitions, keeps its own route
//! table and tells subscribers about every state change.
//!
//! Any history backend can be used by implementing [`NavigationPrimitive`].
//! [`MemoryNavigator`] keeps the whole stack in memory and is what tests and
//! non-browser hosts use.
//!
//! ```
//! use simple_router_history::{MemoryNavigator, NavigateOptions, NavigateTo, NavigationPrimitive};
//!
//! let mut navigator = MemoryNavigator::new(Vec::new(), Default::default());
//! navigator.navigate(NavigateTo::from("/about?x=1"), NavigateOptions::default());
//! assert_eq!(navigator.state().location.pathname, "/about");
//! assert_eq!(navigator.state().location.search, "?x=1");
//! ```

pub mod memory;
pub mod state;

pub use memory::{MemoryNavigator, MemoryNavigatorOptions};
pub use state::{
    parse_path, BlockerArgs, BlockerFn, BlockerState, HistoryAction, Location, NavigateOptions,
    NavigateTo, NavigationState, NavigatorState, PartialPath, RouteMatch, RouteObject,
    Subscriber, SubscriptionId,
};

/// The contract a router relies on.
///
/// Implementations call subscribers and blockers synchronously from within
/// [`navigate`](Self::navigate); a handler must therefore never call back into
/// the primitive.
pub trait NavigationPrimitive {
    /// The current state.
    fn state(&self) -> &NavigatorState;

    /// Navigates to a path or by a history offset.
    ///
    /// Blockers are consulted before anything changes. A blocked transition
    /// leaves the location untouched and is reported to subscribers through
    /// [`BlockerState::Blocked`].
    fn navigate(&mut self, to: NavigateTo, options: NavigateOptions);

    /// Registers a state change handler.
    fn subscribe(&mut self, handler: Subscriber) -> SubscriptionId;

    /// Removes a state change handler.
    fn unsubscribe(&mut self, id: SubscriptionId);

    /// Registers a blocker under `key`. An existing blocker with the same key
    /// is kept.
    fn get_blocker(&mut self, key: &str, predicate: BlockerFn);

    /// Removes the blocker registered under `key`.
    fn delete_blocker(&mut self, key: &str);

    /// Marks the primitive as initialized and announces the current state.
    /// Calling it again does nothing.
    fn initialize(&mut self) -> &mut Self
    where
        Self: Sized;

    /// Adds routes under the route with id `parent_id`, or at the root.
    fn patch_routes(&mut self, parent_id: Option<&str>, routes: Vec<RouteObject>);

    /// The route table.
    fn routes(&self) -> &[RouteObject];

    /// The route table, for direct edits.
    fn routes_mut(&mut self) -> &mut Vec<RouteObject>;

    /// Drops every subscriber and blocker.
    fn dispose(&mut self);

    /// Renders a location as an href.
    fn create_href(&self, location: &Location) -> String;
}
