//! Path templates.
//!
//! A path template is a route path such as `/user/:id`, `/docs/:page?` or
//! `/files/*`. This module compiles templates into matchers
//! ([`PathPattern`]), substitutes parameters into them ([`generate_path`]) and
//! cleans caller-supplied parameter maps ([`clean_params`]).

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};

use simple_router_core::{RouterError, RouterResult};

use crate::location::{ParamValue, Params, RawParam, RawParams};

/// Matches a `/:name` or `/:name?` segment while compiling a template.
static SEGMENT_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/:([\w-]+)(\?)?").expect("segment parameter regex is valid"));

/// Matches a `:name` or `:name?` token while generating a path.
static TEMPLATE_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([\w-]+)(\?)?").expect("template parameter regex is valid"));

static REPEATED_SLASHES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/+").expect("slash regex is valid"));

/// The parameter name bound by a trailing `*`.
pub const SPLAT: &str = "*";

/// A compiled path template.
///
/// Matching is case-insensitive and tolerates trailing slashes. A template
/// ending in `*` binds the rest of the path to the `"*"` parameter; `"*"` and
/// `"/*"` match every path.
///
/// # Examples
///
/// ```
/// use simple_router_matcher::path::PathPattern;
///
/// let pattern = PathPattern::new("/user/:id").unwrap();
/// let params = pattern.match_path("/User/42/").unwrap();
/// assert_eq!(params["id"], "42");
/// assert!(pattern.match_path("/user").is_none());
/// ```
#[derive(Clone)]
pub struct PathPattern {
    template: String,
    regex: Regex,
    param_names: Vec<String>,
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPattern")
            .field("template", &self.template)
            .field("regex", &self.regex.as_str())
            .field("param_names", &self.param_names)
            .finish()
    }
}

impl PathPattern {
    /// Compiles a path template.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::ImproperlyConfigured`] if the template cannot be
    /// compiled into a regular expression.
    pub fn new(template: &str) -> RouterResult<Self> {
        let (source, param_names) = compile_template(template);
        let regex = Regex::new(&source).map_err(|e| {
            RouterError::ImproperlyConfigured(format!("Invalid path template '{template}': {e}"))
        })?;

        Ok(Self {
            template: template.to_string(),
            regex,
            param_names,
        })
    }

    /// Returns the template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the compiled regex.
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns the parameter names, in template order.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Whether the whole path matches.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Matches the whole path, returning the bound parameters.
    ///
    /// Optional parameters that did not participate are left out. Values are
    /// percent-decoded; a value that cannot be decoded is kept as written.
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(path)?;

        let params = self
            .param_names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                captures
                    .get(i + 1)
                    .map(|m| (name.clone(), decode_segment(m.as_str())))
            })
            .collect();

        Some(params)
    }
}

fn compile_template(template: &str) -> (String, Vec<String>) {
    let splat = template.ends_with('*');
    let body = template.strip_suffix('*').unwrap_or(template);
    let body = format!("/{}", body.trim_end_matches('/').trim_start_matches('/'));

    let mut source = String::from("(?i)^");
    let mut param_names = Vec::new();
    let mut last = 0;

    for captures in SEGMENT_PARAM.captures_iter(&body) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        source.push_str(&regex::escape(&body[last..whole.start()]));
        if captures.get(2).is_some() {
            source.push_str("/?([^/]+)?");
        } else {
            source.push_str("/([^/]+)");
        }
        param_names.push(name.as_str().to_string());
        last = whole.end();
    }
    source.push_str(&regex::escape(&body[last..]));

    if splat {
        param_names.push(SPLAT.to_string());
        if template == "*" || template == "/*" {
            source.push_str("(.*)$");
        } else {
            source.push_str("(?:/(.+)|/*)$");
        }
    } else {
        source.push_str("/*$");
    }

    (source, param_names)
}

fn decode_segment(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8().map_or_else(
        |e| {
            tracing::warn!(value = raw, error = %e, "could not decode path parameter, keeping it as written");
            raw.to_string()
        },
        |decoded| decoded.into_owned(),
    )
}

/// Substitutes parameters into a path template.
///
/// Every `:name` token is replaced with the stringified parameter. A missing
/// required parameter is logged and replaced with an empty string; a missing
/// optional (`:name?`) parameter is dropped silently. Repeated slashes are then
/// collapsed and a trailing slash is removed (the root path stays `/`).
///
/// # Examples
///
/// ```
/// use simple_router_matcher::location::{ParamValue, Params};
/// use simple_router_matcher::path::generate_path;
///
/// let params = Params::from([("id".to_string(), ParamValue::Int(123))]);
/// assert_eq!(generate_path("/user/:id/profile", &params), "/user/123/profile");
/// assert_eq!(generate_path("/user/:id/profile", &Params::new()), "/user/profile");
/// ```
pub fn generate_path(template: &str, params: &Params) -> String {
    let substituted = TEMPLATE_PARAM.replace_all(template, |caps: &Captures<'_>| {
        let name = &caps[1];
        if let Some(value) = params.get(name) {
            return value.to_string();
        }
        if caps.get(2).is_none() {
            tracing::warn!(param = name, template, "parameter not found in params");
        }
        String::new()
    });

    let collapsed = REPEATED_SLASHES.replace_all(&substituted, "/");
    match collapsed.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => collapsed.into_owned(),
    }
}

/// Cleans caller-supplied parameters.
///
/// `Null` entries are dropped and lists are joined with commas.
pub fn clean_params(raw: &RawParams) -> Params {
    raw.iter()
        .filter_map(|(key, value)| {
            let cleaned = match value {
                RawParam::Null => return None,
                RawParam::Value(v) => v.clone(),
                RawParam::List(values) => ParamValue::Text(
                    values
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(","),
                ),
            };
            Some((key.clone(), cleaned))
        })
        .collect()
}
