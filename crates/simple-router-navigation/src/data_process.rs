//! Conversions between the navigator's shapes and the router's.

use simple_router_history::{Location, RouteMatch, RouteObject};
use simple_router_matcher::path::SPLAT;
use simple_router_matcher::{parse_query, Meta, ParamValue, ResolvedLocation, RouteRecord};

/// Path, search and hash of a navigator location joined together.
pub fn transform_location_to_full_path(location: &Location) -> String {
    format!("{}{}{}", location.pathname, location.search, location.hash)
}

/// Builds a resolved location from what the navigator matched.
///
/// The name is the id of the deepest match and the metadata its handle. The
/// splat parameter is left out. No record chain is available, so `matched`
/// stays empty.
pub fn transform_location_to_route(location: &Location, matches: &[RouteMatch]) -> ResolvedLocation {
    let last = matches.last();

    ResolvedLocation {
        full_path: transform_location_to_full_path(location),
        name: last.map(|m| m.route_id.clone()),
        path: location.pathname.clone(),
        params: last
            .map(|m| {
                m.params
                    .iter()
                    .filter(|(key, _)| key.as_str() != SPLAT)
                    .map(|(key, value)| (key.clone(), ParamValue::Text(value.clone())))
                    .collect()
            })
            .unwrap_or_default(),
        query: parse_query(&location.search),
        hash: location.hash.clone(),
        matched: Vec::new(),
        redirect: None,
        meta: last
            .and_then(|m| m.handle.as_ref())
            .map(handle_to_meta)
            .unwrap_or_default(),
        state: location.state.clone(),
        redirected_from: None,
    }
}

/// The default conversion from a route record to the navigator's route shape.
///
/// The id is the route name, or its path for unnamed routes. The metadata
/// becomes the handle.
pub fn route_record_to_object(record: &RouteRecord) -> RouteObject {
    RouteObject {
        id: record.name.clone().unwrap_or_else(|| record.path.clone()),
        name: record.name.clone(),
        path: (!record.path.is_empty()).then(|| record.path.clone()),
        children: record.children.iter().map(route_record_to_object).collect(),
        handle: (!record.meta.is_empty())
            .then(|| serde_json::Value::Object(record.meta.clone().into_iter().collect())),
        redirect: record.redirect.clone(),
    }
}

fn handle_to_meta(handle: &serde_json::Value) -> Meta {
    match handle {
        serde_json::Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => Meta::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;
    use simple_router_matcher::QueryValue;

    use super::*;

    fn location(path: &str) -> Location {
        Location {
            state: Some(json!({"from": "menu"})),
            ..Location::new(path)
        }
    }

    #[test]
    fn test_full_path() {
        assert_eq!(
            transform_location_to_full_path(&Location::new("/a/b?c=1#d")),
            "/a/b?c=1#d"
        );
    }

    #[test]
    fn test_location_to_route_uses_last_match() {
        let matches = vec![
            RouteMatch {
                route_id: "manage".into(),
                path: "/manage".into(),
                ..RouteMatch::default()
            },
            RouteMatch {
                route_id: "manage_user".into(),
                params: HashMap::from([
                    ("id".to_string(), "7".to_string()),
                    ("*".to_string(), "rest".to_string()),
                ]),
                handle: Some(json!({"title": "Users"})),
                path: "/manage/user/:id".into(),
                ..RouteMatch::default()
            },
        ];
        let route = transform_location_to_route(&location("/manage/user/7?tab=a#x"), &matches);

        assert_eq!(route.full_path, "/manage/user/7?tab=a#x");
        assert_eq!(route.name.as_deref(), Some("manage_user"));
        assert_eq!(route.path, "/manage/user/7");
        assert_eq!(route.params.len(), 1);
        assert_eq!(route.params["id"], ParamValue::Text("7".into()));
        assert_eq!(route.query.get("tab"), Some(&QueryValue::from("a")));
        assert_eq!(route.hash, "#x");
        assert_eq!(route.meta["title"], json!("Users"));
        assert_eq!(route.state, Some(json!({"from": "menu"})));
        assert!(route.matched.is_empty());
    }

    #[test]
    fn test_location_to_route_without_matches() {
        let route = transform_location_to_route(&Location::new("/nowhere"), &[]);
        assert!(route.name.is_none());
        assert!(route.params.is_empty());
        assert!(route.meta.is_empty());
    }

    #[test]
    fn test_non_object_handle_gives_empty_meta() {
        let matches = vec![RouteMatch {
            route_id: "x".into(),
            handle: Some(json!("just a string")),
            ..RouteMatch::default()
        }];
        assert!(transform_location_to_route(&Location::new("/x"), &matches).meta.is_empty());
    }

    #[test]
    fn test_route_record_to_object() {
        let record = RouteRecord::new("/manage")
            .with_name("manage")
            .with_meta("title", "Manage")
            .with_child(RouteRecord::new("user").with_name("manage_user"))
            .with_child(RouteRecord::new(""));
        let object = route_record_to_object(&record);

        assert_eq!(object.id, "manage");
        assert_eq!(object.path.as_deref(), Some("/manage"));
        assert_eq!(object.handle, Some(json!({"title": "Manage"})));
        assert_eq!(object.children[0].id, "manage_user");
        assert_eq!(object.children[1].path, None);
        assert_eq!(object.children[1].handle, None);
    }
}
