//! Integration tests for the navigation coordinator.
//!
//! Tests cover: before and after guards, guard jumps and their bound,
//! redirect-loop suppression, structured target failures, route table
//! mirroring and its unknown-parent warning, and the one-shot bootstrap.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::field::Field;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use simple_router_core::{RouterError, RouterResult, Settings};
use simple_router_history::{MemoryNavigator, NavigationPrimitive, RouteObject};
use simple_router_matcher::{CurrentLocationRaw, NamedLocationRaw, RouteRecord};
use simple_router_navigation::{
    create_memory_router, InitHook, NavigationTarget, RoutePatcher, Router, RouterOptions,
};

fn app_routes() -> Vec<RouteRecord> {
    vec![
        RouteRecord::new("/login").with_name("login"),
        RouteRecord::new("/home").with_name("home").with_meta("title", "Home"),
        RouteRecord::new("/user/:id").with_name("user"),
        RouteRecord::new("/manage")
            .with_name("manage")
            .with_child(RouteRecord::new("user").with_name("manage_user"))
            .with_child(RouteRecord::new("role").with_name("manage_role")),
        RouteRecord::new("*").with_name("not-found"),
    ]
}

fn router_with(settings: Settings) -> Router<MemoryNavigator> {
    create_memory_router(RouterOptions {
        settings,
        init_routes: app_routes(),
        ..RouterOptions::default()
    })
    .unwrap()
}

fn router() -> Router<MemoryNavigator> {
    router_with(Settings::default())
}

/// Collects the WARN events emitted while a closure runs.
#[derive(Clone, Default)]
struct CapturedWarnings(Arc<Mutex<Vec<String>>>);

impl CapturedWarnings {
    fn during<R>(&self, f: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl<S: Subscriber> Layer<S> for CapturedWarnings {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            let mut line = String::new();
            event.record(&mut |field: &Field, value: &dyn fmt::Debug| {
                line.push_str(&format!("{}={value:?} ", field.name()));
            });
            self.0.lock().unwrap().push(line);
        }
    }
}

type Visits = Rc<RefCell<Vec<(String, String)>>>;

fn record_after(router: &mut Router<MemoryNavigator>) -> Visits {
    let visits: Visits = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&visits);
    router.after_each(move |to, from| {
        sink.borrow_mut()
            .push((from.full_path.clone(), to.full_path.clone()));
    });
    visits
}

// ═════════════════════════════════════════════════════════════════════
// 1. A denying before guard leaves the current route untouched
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_before_guard_false_keeps_current_route() {
    let mut router = router();
    router.push("/home").unwrap();
    let visits = record_after(&mut router);
    router.before_each(|to, _, _| to.name.as_deref() != Some("user"));

    router.push("/user/1").unwrap();

    assert_eq!(router.current_route().full_path, "/home");
    assert!(visits.borrow().is_empty());
    assert_eq!(router.navigator().state().location.pathname, "/home");
}

#[test]
fn test_before_guard_sees_to_and_from() {
    let mut router = router();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    router.before_each(move |to, from, _| {
        sink.borrow_mut().push((
            from.full_path.clone(),
            to.name.clone(),
            to.meta.get("title").cloned(),
        ));
        true
    });

    router.push(NamedLocationRaw::new("home")).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![(
            "/".to_string(),
            Some("home".to_string()),
            Some(serde_json::json!("Home"))
        )]
    );
}

// ═════════════════════════════════════════════════════════════════════
// 2. After guards observe committed transitions
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_after_guard_runs_after_commit() {
    let mut router = router();
    let visits = record_after(&mut router);

    router.push("/home").unwrap();
    router.push("/user/2").unwrap();
    router.back().unwrap();

    assert_eq!(
        *visits.borrow(),
        vec![
            ("/".to_string(), "/home".to_string()),
            ("/home".to_string(), "/user/2".to_string()),
            ("/user/2".to_string(), "/home".to_string()),
        ]
    );
}

#[test]
fn test_only_first_after_guard_runs() {
    let mut router = router();
    let visits = record_after(&mut router);
    let other = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&other);
    router.after_each(move |_, _| *counter.borrow_mut() += 1);

    router.push("/home").unwrap();

    assert_eq!(visits.borrow().len(), 1);
    assert_eq!(*other.borrow(), 0);
}

// ═════════════════════════════════════════════════════════════════════
// 3. Guard jumps
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_jump_redirects_and_denies_original() {
    let mut router = router();
    let visits = record_after(&mut router);
    router.before_each(|to, _, redirector| {
        if to.name.as_deref() == Some("manage_user") {
            redirector.jump(NamedLocationRaw::new("login"));
        }
        true
    });

    router.push("/manage/user").unwrap();

    assert_eq!(router.current_route().full_path, "/login");
    assert_eq!(*visits.borrow(), vec![("/".to_string(), "/login".to_string())]);
}

#[test]
fn test_endless_jumps_are_bounded() {
    let mut router = router_with(Settings {
        max_redirects: 3,
        ..Settings::default()
    });
    let calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&calls);
    router.before_each(move |to, _, redirector| {
        *counter.borrow_mut() += 1;
        let next = if to.full_path == "/home" { "/user/1" } else { "/home" };
        redirector.jump(next);
        true
    });

    router.push("/home").unwrap();

    assert_eq!(router.current_route().full_path, "/");
    assert_eq!(*calls.borrow(), 4);
}

#[test]
fn test_failed_jump_discards_remaining_jumps() {
    let mut router = create_memory_router(RouterOptions {
        init_routes: vec![
            RouteRecord::new("/admin").with_name("admin"),
            RouteRecord::new("/b").with_name("b"),
            RouteRecord::new("/c").with_name("c"),
        ],
        ..RouterOptions::default()
    })
    .unwrap();
    router.before_each(|to, _, redirector| {
        if to.name.as_deref() == Some("admin") {
            redirector.jump(NamedLocationRaw::new("ghost"));
            redirector.jump("/b");
        }
        true
    });

    let err = router.push("/admin").unwrap_err();
    assert!(matches!(err, RouterError::NavigationDuplicated { .. }));
    assert_eq!(router.current_route().full_path, "/");

    router.push("/c").unwrap();
    assert_eq!(router.current_route().full_path, "/c");
    assert_eq!(router.navigator().state().location.pathname, "/c");
}

// ═════════════════════════════════════════════════════════════════════
// 4. Redirect-loop suppression
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_guard_skipped_when_target_redirects_to_current() {
    let mut router = router();
    router.push("/manage/user").unwrap();
    let guard_calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&guard_calls);
    router.before_each(move |to, _, _| {
        sink.borrow_mut().push(to.full_path.clone());
        true
    });

    router.push("/manage").unwrap();

    assert_eq!(*guard_calls.borrow(), vec!["/manage/user".to_string()]);
    assert_eq!(router.current_route().full_path, "/manage/user");
}

#[test]
fn test_guard_skipped_when_param_route_redirects_to_current() {
    let mut router = create_memory_router(RouterOptions {
        init_routes: vec![RouteRecord::new("/user/:id")
            .with_name("user")
            .with_child(RouteRecord::new("profile").with_name("user_profile"))],
        ..RouterOptions::default()
    })
    .unwrap();
    router.push("/user/5").unwrap();
    assert_eq!(router.current_route().full_path, "/user/5/profile");

    let guard_calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&guard_calls);
    router.before_each(move |to, _, _| {
        sink.borrow_mut().push(to.full_path.clone());
        true
    });

    router.push("/user/5").unwrap();

    assert!(!guard_calls.borrow().contains(&"/user/5".to_string()));
    assert_eq!(*guard_calls.borrow(), vec!["/user/5/profile".to_string()]);
    assert_eq!(router.current_route().full_path, "/user/5/profile");
}

// ═════════════════════════════════════════════════════════════════════
// 5. Structured targets and resolution failures
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_structured_target_matching_nothing_is_duplicated() {
    let mut router = create_memory_router(RouterOptions {
        init_routes: vec![RouteRecord::new("/home").with_name("home")],
        ..RouterOptions::default()
    })
    .unwrap();
    router.push("/home").unwrap();

    let err = router.push(NamedLocationRaw::new("missing")).unwrap_err();
    match err {
        RouterError::NavigationDuplicated { from, .. } => assert_eq!(from, "/home"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_name_falls_back_to_wildcard() {
    let router = router();
    let resolved = router.resolve(NamedLocationRaw::new("missing")).unwrap();
    assert_eq!(resolved.name.as_deref(), Some("not-found"));
}

#[test]
fn test_current_target_reuses_current_route() {
    let mut router = router();
    router.push("/user/1").unwrap();
    let mut target = CurrentLocationRaw::default();
    target.params.insert("id".into(), 9.into());

    router.push(target).unwrap();

    assert_eq!(router.current_route().full_path, "/user/9");
}

#[test]
fn test_resolve_stamps_redirected_from() {
    let mut router = router();
    router.push("/home").unwrap();
    let resolved = router.resolve("/user/3").unwrap();
    let from = resolved.redirected_from.unwrap();
    assert_eq!(from.full_path, "/home");
    assert!(from.redirected_from.is_none());
}

// ═════════════════════════════════════════════════════════════════════
// 6. Route table mirroring
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_added_and_removed_routes_mirror_into_navigator() {
    let mut router = router();
    router
        .add_route(Some("manage"), RouteRecord::new("menu").with_name("manage_menu"))
        .unwrap();
    assert!(RouteObject::find(router.navigator().routes(), "manage_menu").is_some());

    router.remove_route("manage_menu");
    assert!(!router.has_route("manage_menu"));
    assert!(RouteObject::find(router.navigator().routes(), "manage_menu").is_none());
    assert!(RouteObject::find(router.navigator().routes(), "manage_user").is_some());
}

#[test]
fn test_unknown_parent_is_reported_and_route_added_at_root() {
    let mut router = router();
    let warnings = CapturedWarnings::default();
    let reports = RouteRecord::new("/reports").with_name("reports");
    warnings
        .during(|| router.add_route(Some("reports_root"), reports))
        .unwrap();

    let lines = warnings.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("parent route not found"), "{lines:?}");
    assert!(lines[0].contains("reports_root"), "{lines:?}");
    assert!(router.navigator().routes().iter().any(|route| route.id == "reports"));
    assert_eq!(router.resolve("/reports").unwrap().name.as_deref(), Some("reports"));
}

#[test]
fn test_unmatched_url_still_navigates() {
    let mut router = create_memory_router(RouterOptions {
        init_routes: vec![RouteRecord::new("/home").with_name("home")],
        ..RouterOptions::default()
    })
    .unwrap();
    router.push("/home").unwrap();

    router.push("/unregistered").unwrap();
    assert!(router.current_route().name.is_none());
    assert_eq!(router.current_route().full_path, "/unregistered");
}

#[test]
fn test_routes_only_known_to_navigator_name_current_route() {
    let mut router = router_with(Settings::default());
    router.remove_route("not-found");
    router
        .navigator_mut()
        .patch_routes(None, vec![RouteObject::new("legacy", "/legacy/:page")]);

    router.push("/legacy/7").unwrap();

    let current = router.current_route();
    assert_eq!(current.name.as_deref(), Some("legacy"));
    assert_eq!(current.params["page"].to_string(), "7");
    assert_eq!(router.navigator_route().full_path, "/legacy/7");
}

// ═════════════════════════════════════════════════════════════════════
// 7. Bootstrap
// ═════════════════════════════════════════════════════════════════════

struct PatchAndGo {
    seen: RefCell<Vec<String>>,
    target: Option<NavigationTarget>,
}

#[async_trait(?Send)]
impl InitHook for PatchAndGo {
    async fn init(
        &self,
        current_full_path: &str,
        patcher: &mut RoutePatcher,
    ) -> RouterResult<Option<NavigationTarget>> {
        self.seen.borrow_mut().push(current_full_path.to_string());
        patcher.patch_routes(None, vec![RouteRecord::new("/reports").with_name("reports")]);
        patcher.patch_routes(
            Some("manage"),
            vec![RouteRecord::new("audit").with_name("manage_audit")],
        );
        Ok(self.target.clone())
    }
}

struct Failing;

#[async_trait(?Send)]
impl InitHook for Failing {
    async fn init(
        &self,
        _current_full_path: &str,
        patcher: &mut RoutePatcher,
    ) -> RouterResult<Option<NavigationTarget>> {
        patcher.patch_routes(None, vec![RouteRecord::new("/never").with_name("never")]);
        Err(RouterError::InitFailed("menu service unavailable".into()))
    }
}

#[tokio::test]
async fn test_init_ready_applies_patches_and_navigates() {
    let mut router = router();
    let hook = PatchAndGo {
        seen: RefCell::new(Vec::new()),
        target: Some(NavigationTarget::from("/manage/audit")),
    };

    router.init_ready(&hook).await.unwrap();

    assert!(router.is_ready());
    assert!(router.navigator().state().initialized);
    assert_eq!(*hook.seen.borrow(), vec!["/".to_string()]);
    assert!(router.has_route("reports"));
    assert!(RouteObject::find(router.navigator().routes(), "manage_audit").is_some());
    assert_eq!(router.current_route().name.as_deref(), Some("manage_audit"));
}

#[tokio::test]
async fn test_init_ready_without_target_only_initializes() {
    let mut router = router();
    let visits = record_after(&mut router);
    let hook = PatchAndGo {
        seen: RefCell::new(Vec::new()),
        target: None,
    };

    router.init_ready(&hook).await.unwrap();

    assert!(router.navigator().state().initialized);
    assert_eq!(router.current_route().full_path, "/");
    assert_eq!(*visits.borrow(), vec![("/".to_string(), "/".to_string())]);
}

#[tokio::test]
async fn test_init_ready_runs_once() {
    let mut router = router();
    let hook = PatchAndGo {
        seen: RefCell::new(Vec::new()),
        target: None,
    };

    router.init_ready(&hook).await.unwrap();
    router.init_ready(&hook).await.unwrap();

    assert_eq!(hook.seen.borrow().len(), 1);
}

#[tokio::test]
async fn test_init_ready_propagates_hook_failure() {
    let mut router = router();

    let err = router.init_ready(&Failing).await.unwrap_err();

    assert!(matches!(err, RouterError::InitFailed(_)));
    assert!(!router.has_route("never"));
    assert!(!router.navigator().state().initialized);
}
