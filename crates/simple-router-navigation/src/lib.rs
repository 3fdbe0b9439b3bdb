//! # simple-router-navigation
//!
//! The navigation coordinator of the simple-router workspace. A [`Router`]
//! resolves navigation targets through the route registry, runs the before and
//! after guards around every transition of its navigation primitive, keeps the
//! current route, and mirrors route table changes into the primitive.
//!
//! ## Modules
//!
//! - [`router`]: The [`Router`] itself and its construction options
//! - [`guards`]: Single-slot guard registration and guard jumps
//! - [`target`]: URL and structured navigation targets
//! - [`init`]: The bootstrap hook run by [`Router::init_ready`]
//! - [`data_process`]: Conversions between navigator and router shapes
//!
//! ## Usage
//!
//! ```
//! use simple_router_matcher::RouteRecord;
//! use simple_router_navigation::{create_memory_router, RouterOptions};
//!
//! let mut router = create_memory_router(RouterOptions {
//!     init_routes: vec![
//!         RouteRecord::new("/login").with_name("login"),
//!         RouteRecord::new("/admin").with_name("admin"),
//!     ],
//!     ..RouterOptions::default()
//! })
//! .unwrap();
//!
//! router.before_each(|to, _from, redirector| {
//!     if to.name.as_deref() == Some("admin") {
//!         redirector.jump("/login");
//!     }
//!     true
//! });
//!
//! router.push("/admin").unwrap();
//! assert_eq!(router.current_route().full_path, "/login");
//! ```

pub mod data_process;
pub mod guards;
pub mod init;
pub mod router;
pub mod target;

pub use guards::{AfterGuard, BeforeGuard, GuardId, GuardSlot, Redirector};
pub use init::{InitHook, RoutePatch, RoutePatcher};
pub use router::{create_memory_router, RouteConverter, Router, RouterOptions};
pub use target::NavigationTarget;
