//! Route tables from configuration files.
//!
//! A route table is a list of [`RouteRecord`]s. In JSON it is either a bare
//! array or an object with a `routes` array; in TOML it is an array of tables
//! named `routes`:
//!
//! ```toml
//! [[routes]]
//! name = "home"
//! path = "/home"
//!
//! [[routes]]
//! name = "manage"
//! path = "/manage"
//!
//! [[routes.children]]
//! name = "manage_user"
//! path = "user"
//! meta = { title = "Users" }
//! ```

use std::path::Path;

use serde::Deserialize;

use simple_router_core::{RouterError, RouterResult};

use crate::record::RouteRecord;

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonRouteTable {
    Bare(Vec<RouteRecord>),
    Wrapped { routes: Vec<RouteRecord> },
}

#[derive(Deserialize)]
struct TomlRouteTable {
    #[serde(default)]
    routes: Vec<RouteRecord>,
}

/// Loads a route table from a JSON string.
///
/// # Errors
///
/// Returns [`RouterError::ConfigurationError`] if the JSON is malformed or
/// does not describe a route table.
pub fn routes_from_json_str(json_str: &str) -> RouterResult<Vec<RouteRecord>> {
    let table: JsonRouteTable = serde_json::from_str(json_str)
        .map_err(|e| RouterError::ConfigurationError(format!("Failed to parse route table JSON: {e}")))?;

    Ok(match table {
        JsonRouteTable::Bare(routes) | JsonRouteTable::Wrapped { routes } => routes,
    })
}

/// Loads a route table from a JSON file.
///
/// # Errors
///
/// Returns [`RouterError::ConfigurationError`] if the file cannot be read or
/// parsed.
pub fn routes_from_json_file(path: impl AsRef<Path>) -> RouterResult<Vec<RouteRecord>> {
    let content = read(path.as_ref())?;
    routes_from_json_str(&content)
}

/// Loads a route table from a TOML string.
///
/// # Errors
///
/// Returns [`RouterError::ConfigurationError`] if the TOML is malformed or
/// does not describe a route table.
pub fn routes_from_toml_str(toml_str: &str) -> RouterResult<Vec<RouteRecord>> {
    let table: TomlRouteTable = toml::from_str(toml_str)
        .map_err(|e| RouterError::ConfigurationError(format!("Failed to parse route table TOML: {e}")))?;
    Ok(table.routes)
}

/// Loads a route table from a TOML file.
///
/// # Errors
///
/// Returns [`RouterError::ConfigurationError`] if the file cannot be read or
/// parsed.
pub fn routes_from_toml_file(path: impl AsRef<Path>) -> RouterResult<Vec<RouteRecord>> {
    let content = read(path.as_ref())?;
    routes_from_toml_str(&content)
}

fn read(path: &Path) -> RouterResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        RouterError::ConfigurationError(format!(
            "Failed to read route table '{}': {e}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_bare_array() {
        let routes = routes_from_json_str(
            r#"[{"name": "home", "path": "/home"}, {"path": "/about"}]"#,
        )
        .unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].name.as_deref(), Some("home"));
        assert!(routes[1].name.is_none());
    }

    #[test]
    fn test_json_wrapped() {
        let routes = routes_from_json_str(
            r#"{"routes": [{"name": "manage", "path": "/manage",
                "children": [{"name": "manage_user", "path": "user"}]}]}"#,
        )
        .unwrap();
        assert_eq!(routes[0].children[0].path, "user");
    }

    #[test]
    fn test_json_invalid() {
        let err = routes_from_json_str("{not json").unwrap_err();
        assert!(matches!(err, RouterError::ConfigurationError(_)));
    }

    #[test]
    fn test_toml_nested() {
        let routes = routes_from_toml_str(
            r#"
[[routes]]
name = "home"
path = "/home"

[[routes]]
name = "manage"
path = "/manage"
redirect = "/manage/user"

[[routes.children]]
name = "manage_user"
path = "user"
meta = { title = "Users" }
"#,
        )
        .unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[1].redirect.as_deref(), Some("/manage/user"));
        assert_eq!(routes[1].children[0].meta["title"], "Users");
    }

    #[test]
    fn test_toml_empty() {
        assert!(routes_from_toml_str("").unwrap().is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = routes_from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read route table"));
    }
}
