//! Navigation guard slots.
//!
//! A guard slot accepts any number of registrations but only ever runs one
//! guard: the earliest registrant that is still present. Removing it hands
//! the slot to the next one in registration order.
//!
//! ```
//! use simple_router_navigation::guards::GuardSlot;
//!
//! let mut slot: GuardSlot<&str> = GuardSlot::new();
//! let first = slot.add("first");
//! slot.add("second");
//! assert_eq!(slot.active_mut().copied(), Some("first"));
//!
//! slot.remove(first);
//! assert_eq!(slot.active_mut().copied(), Some("second"));
//! ```

use std::cell::RefCell;
use std::fmt;

use simple_router_matcher::ResolvedLocation;

use crate::target::NavigationTarget;

/// Runs before a transition commits, with `(to, from, redirector)`.
/// Returning `false` denies the transition.
pub type BeforeGuard = Box<dyn FnMut(&ResolvedLocation, &ResolvedLocation, &Redirector) -> bool>;

/// Runs after a transition committed, with `(to, from)`.
pub type AfterGuard = Box<dyn FnMut(&ResolvedLocation, &ResolvedLocation)>;

/// Handle returned when a guard is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuardId(u64);

/// An ordered set of registered guards of which only the first runs.
pub struct GuardSlot<F> {
    guards: Vec<(GuardId, F)>,
    next_id: u64,
}

impl<F> Default for GuardSlot<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> fmt::Debug for GuardSlot<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardSlot")
            .field(
                "guards",
                &self.guards.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl<F> GuardSlot<F> {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self {
            guards: Vec::new(),
            next_id: 0,
        }
    }

    /// Registers a guard. It only becomes active once every earlier
    /// registrant has been removed.
    pub fn add(&mut self, guard: F) -> GuardId {
        let id = GuardId(self.next_id);
        self.next_id += 1;
        self.guards.push((id, guard));
        id
    }

    /// Unregisters a guard. Returns `true` if it was registered.
    pub fn remove(&mut self, id: GuardId) -> bool {
        let len_before = self.guards.len();
        self.guards.retain(|(gid, _)| *gid != id);
        self.guards.len() < len_before
    }

    /// The guard that runs.
    pub fn active_mut(&mut self) -> Option<&mut F> {
        self.guards.first_mut().map(|(_, guard)| guard)
    }

    /// Number of registered guards.
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Whether no guard is registered.
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Unregisters every guard.
    pub fn clear(&mut self) {
        self.guards.clear();
    }
}

/// Lets a before guard send the navigation elsewhere.
///
/// Every target passed to [`jump`](Self::jump) is navigated to, in order,
/// right after the guarded transition has been denied.
#[derive(Debug, Default)]
pub struct Redirector {
    targets: RefCell<Vec<NavigationTarget>>,
}

impl Redirector {
    /// Denies the guarded transition and navigates to `target` instead.
    pub fn jump(&self, target: impl Into<NavigationTarget>) {
        self.targets.borrow_mut().push(target.into());
    }

    /// Whether `jump` has been called.
    pub fn is_jumping(&self) -> bool {
        !self.targets.borrow().is_empty()
    }

    pub(crate) fn into_targets(self) -> Vec<NavigationTarget> {
        self.targets.into_inner()
    }
}
