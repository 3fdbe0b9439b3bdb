//! Query strings.
//!
//! [`stringify_query`] and [`parse_query`] implement a query codec whose
//! escaping differs from form encoding: a space becomes `+` while a literal
//! `+` becomes `%2B`, `#` and `&` are escaped, and `` ` { } ^ [ ] | `` are left
//! as they are. A key without `=` carries no value at all, which is distinct
//! from an empty value.
//!
//! # Examples
//!
//! ```
//! use simple_router_matcher::query::{parse_query, stringify_query, LocationQueryRaw};
//!
//! let raw = LocationQueryRaw::new()
//!     .with("a", 1)
//!     .with("b", vec![2, 3])
//!     .with_null("c");
//! let search = stringify_query(&raw);
//! assert_eq!(search, "a=1&b=2&b=3&c");
//!
//! let query = parse_query(&search);
//! assert_eq!(query.len(), 3);
//! ```

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::location::ParamValue;

/// Characters escaped in query values: what `encodeURI` escapes, minus the
/// characters left readable, plus `+ # &`.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'+')
    .add(b'#')
    .add(b'&');

/// Keys additionally escape `=`.
const QUERY_KEY: &AsciiSet = &QUERY_VALUE.add(b'=');

// ── Parsed query ─────────────────────────────────────────────────────

/// A parsed query value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// A single occurrence; `None` when the key had no `=`.
    One(Option<String>),
    /// A repeated key, in order of appearance.
    Many(Vec<Option<String>>),
}

impl QueryValue {
    /// The first value, if the key carried one.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::One(value) => value.as_deref(),
            Self::Many(values) => values.first().and_then(Option::as_deref),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::One(Some(value.to_string()))
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(|v| Some(v.to_string())).collect())
    }
}

impl Serialize for QueryValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::One(value) => value.serialize(serializer),
            Self::Many(values) => values.serialize(serializer),
        }
    }
}

/// An insertion-ordered mapping of query keys to parsed values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationQuery {
    entries: Vec<(String, QueryValue)>,
}

impl LocationQuery {
    /// Creates an empty query.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a key.
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Sets a key, replacing any previous value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: QueryValue) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(key, value.into());
        self
    }

    /// Serializes the query back into a query string, without the `?`.
    pub fn to_query_string(&self) -> String {
        stringify_query(&self.clone().into())
    }

    /// Adds an occurrence of a key. A repeated key is promoted to
    /// [`QueryValue::Many`].
    pub fn append(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        let Some((_, slot)) = self.entries.iter_mut().find(|(k, _)| *k == key) else {
            self.entries.push((key, QueryValue::One(value)));
            return;
        };
        match slot {
            QueryValue::Many(values) => values.push(value),
            QueryValue::One(first) => {
                let first = first.take();
                *slot = QueryValue::Many(vec![first, value]);
            }
        }
    }
}

impl FromIterator<(String, QueryValue)> for LocationQuery {
    fn from_iter<I: IntoIterator<Item = (String, QueryValue)>>(iter: I) -> Self {
        let mut query = Self::new();
        for (key, value) in iter {
            query.insert(key, value);
        }
        query
    }
}

impl Serialize for LocationQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ── Raw query ────────────────────────────────────────────────────────

/// One raw query value as supplied by a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RawQueryItem {
    /// Left out of the query string entirely.
    Undefined,
    /// Emitted as a bare key.
    Null,
    /// Emitted as `key=value`.
    Value(ParamValue),
}

/// A raw query entry: a single item or a list of items.
#[derive(Debug, Clone, PartialEq)]
pub enum RawQueryValue {
    /// A single item.
    One(RawQueryItem),
    /// One `key=value` pair per item.
    Many(Vec<RawQueryItem>),
}

macro_rules! raw_query_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for RawQueryItem {
                fn from(value: $t) -> Self {
                    Self::Value(ParamValue::from(value))
                }
            }

            impl From<$t> for RawQueryValue {
                fn from(value: $t) -> Self {
                    Self::One(RawQueryItem::from(value))
                }
            }
        )*
    };
}

raw_query_from_scalar!(&str, String, i32, i64, u32, u64, usize, f64, ParamValue);

impl<T: Into<ParamValue>> From<Option<T>> for RawQueryItem {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, |v| Self::Value(v.into()))
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for RawQueryValue {
    fn from(value: Option<T>) -> Self {
        Self::One(RawQueryItem::from(value))
    }
}

impl<T: Into<RawQueryItem>> From<Vec<T>> for RawQueryValue {
    fn from(values: Vec<T>) -> Self {
        Self::Many(values.into_iter().map(Into::into).collect())
    }
}

impl From<RawQueryItem> for RawQueryValue {
    fn from(item: RawQueryItem) -> Self {
        Self::One(item)
    }
}

/// An insertion-ordered raw query, as consumed by [`stringify_query`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationQueryRaw {
    entries: Vec<(String, RawQueryValue)>,
}

impl LocationQueryRaw {
    /// Creates an empty raw query.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a key.
    pub fn get(&self, key: &str) -> Option<&RawQueryValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawQueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Sets a key, replacing any previous value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawQueryValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawQueryValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds a key with no value.
    #[must_use]
    pub fn with_null(self, key: impl Into<String>) -> Self {
        self.with(key, RawQueryItem::Null)
    }

    /// Adds a key that is left out of the query string.
    #[must_use]
    pub fn with_undefined(self, key: impl Into<String>) -> Self {
        self.with(key, RawQueryItem::Undefined)
    }
}

impl From<LocationQuery> for LocationQueryRaw {
    fn from(query: LocationQuery) -> Self {
        fn item(value: Option<String>) -> RawQueryItem {
            value.map_or(RawQueryItem::Null, |v| RawQueryItem::Value(ParamValue::Text(v)))
        }

        let entries = query
            .entries
            .into_iter()
            .map(|(key, value)| {
                let raw = match value {
                    QueryValue::One(v) => RawQueryValue::One(item(v)),
                    QueryValue::Many(vs) => RawQueryValue::Many(vs.into_iter().map(item).collect()),
                };
                (key, raw)
            })
            .collect();
        Self { entries }
    }
}

// ── Codec ────────────────────────────────────────────────────────────

fn encode_query_value(text: &str) -> String {
    utf8_percent_encode(text, QUERY_VALUE)
        .to_string()
        .replace("%20", "+")
}

fn encode_query_key(text: &str) -> String {
    utf8_percent_encode(text, QUERY_KEY)
        .to_string()
        .replace("%20", "+")
}

/// Whether a `%` is not followed by two hex digits.
fn has_malformed_escape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'%'
            && !(bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit))
    })
}

fn decode(text: &str) -> String {
    if has_malformed_escape(text) {
        tracing::warn!(text, "error decoding query text, using original value");
        return text.to_string();
    }
    match percent_decode_str(text).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::warn!(text, error = %e, "error decoding query text, using original value");
            text.to_string()
        }
    }
}

/// Serializes a raw query, without the leading `?`.
///
/// Entries are written in insertion order. `Null` items become bare keys,
/// `Undefined` items are left out entirely and lists produce one pair per item.
pub fn stringify_query(query: &LocationQueryRaw) -> String {
    let mut pairs: Vec<String> = Vec::new();

    for (key, value) in query.iter() {
        let key = encode_query_key(key);
        let items = match value {
            RawQueryValue::One(item) => std::slice::from_ref(item),
            RawQueryValue::Many(items) => items.as_slice(),
        };
        for item in items {
            match item {
                RawQueryItem::Undefined => {}
                RawQueryItem::Null => pairs.push(key.clone()),
                RawQueryItem::Value(v) => {
                    pairs.push(format!("{key}={}", encode_query_value(&v.to_string())));
                }
            }
        }
    }

    pairs.join("&")
}

/// Parses a query string, with or without its leading `?`.
///
/// `+` is read as a space. A key without `=` maps to `None`, repeated keys
/// accumulate into [`QueryValue::Many`], and text that cannot be decoded is
/// kept as written.
pub fn parse_query(search: &str) -> LocationQuery {
    let mut query = LocationQuery::new();
    if search.is_empty() || search == "?" {
        return query;
    }

    let search = search.strip_prefix('?').unwrap_or(search);
    for param in search.split('&') {
        let param = param.replace('+', " ");
        match param.split_once('=') {
            Some((key, value)) => query.append(decode(key), Some(decode(value))),
            None => query.append(decode(&param), None),
        }
    }

    query
}

/// The parsed form of a raw query: what [`parse_query`] would return for
/// [`stringify_query`]'s output.
///
/// Numbers are stringified, `Undefined` items are dropped, and lists are
/// collapsed the way a query string reads back: an empty list disappears and
/// a single-item list becomes a single value.
pub fn normalize_query(raw: &LocationQueryRaw) -> LocationQuery {
    fn item(item: &RawQueryItem) -> Option<Option<String>> {
        match item {
            RawQueryItem::Undefined => None,
            RawQueryItem::Null => Some(None),
            RawQueryItem::Value(v) => Some(Some(v.to_string())),
        }
    }

    let mut query = LocationQuery::new();
    for (key, value) in raw.iter() {
        match value {
            RawQueryValue::One(single) => {
                if let Some(v) = item(single) {
                    query.insert(key, QueryValue::One(v));
                }
            }
            RawQueryValue::Many(items) => {
                let mut values: Vec<Option<String>> = items.iter().filter_map(item).collect();
                match values.len() {
                    0 => {}
                    1 => query.insert(key, QueryValue::One(values.remove(0))),
                    _ => query.insert(key, QueryValue::Many(values)),
                }
            }
        }
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stringify_basic() {
        let raw = LocationQueryRaw::new()
            .with("a", 1)
            .with("b", vec![2, 3])
            .with_null("c");
        assert_eq!(stringify_query(&raw), "a=1&b=2&b=3&c");
    }

    #[test]
    fn test_stringify_skips_undefined() {
        let raw = LocationQueryRaw::new()
            .with_undefined("skip")
            .with("list", vec![RawQueryItem::from(1), RawQueryItem::Undefined, RawQueryItem::Null])
            .with("x", "y");
        assert_eq!(stringify_query(&raw), "list=1&list&x=y");
    }

    #[test]
    fn test_stringify_empty() {
        assert_eq!(stringify_query(&LocationQueryRaw::new()), "");
        let raw = LocationQueryRaw::new().with("empty", Vec::<i32>::new());
        assert_eq!(stringify_query(&raw), "");
    }

    #[test]
    fn test_stringify_escaping() {
        let raw = LocationQueryRaw::new().with("q", "a b+c#d&e");
        assert_eq!(stringify_query(&raw), "q=a+b%2Bc%23d%26e");

        let raw = LocationQueryRaw::new().with("k", "[x]|{y}^`z`");
        assert_eq!(stringify_query(&raw), "k=[x]|{y}^`z`");

        let raw = LocationQueryRaw::new().with("k", "100%\"<>\\");
        assert_eq!(stringify_query(&raw), "k=100%25%22%3C%3E%5C");

        let raw = LocationQueryRaw::new().with("k", "é");
        assert_eq!(stringify_query(&raw), "k=%C3%A9");
    }

    #[test]
    fn test_stringify_key_escapes_equals() {
        let raw = LocationQueryRaw::new().with("a=b", "c=d");
        assert_eq!(stringify_query(&raw), "a%3Db=c=d");
    }

    #[test]
    fn test_parse_basic() {
        let query = parse_query("a=1&b=2&b=3&c");
        assert_eq!(query.get("a"), Some(&QueryValue::from("1")));
        assert_eq!(query.get("b"), Some(&QueryValue::from(vec!["2", "3"])));
        assert_eq!(query.get("c"), Some(&QueryValue::One(None)));
        let keys: Vec<&str> = query.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn test_parse_leading_question_mark() {
        assert_eq!(parse_query("?x=1"), parse_query("x=1"));
        assert!(parse_query("").is_empty());
        assert!(parse_query("?").is_empty());
    }

    #[test]
    fn test_parse_empty_value_differs_from_null() {
        let query = parse_query("a=&b");
        assert_eq!(query.get("a"), Some(&QueryValue::from("")));
        assert_eq!(query.get("b"), Some(&QueryValue::One(None)));
    }

    #[test]
    fn test_parse_plus_is_space() {
        let query = parse_query("q=a+b%2Bc");
        assert_eq!(query.get("q").and_then(QueryValue::first), Some("a b+c"));
    }

    #[test]
    fn test_parse_splits_at_first_equals() {
        let query = parse_query("expr=a=b");
        assert_eq!(query.get("expr").and_then(QueryValue::first), Some("a=b"));
    }

    #[test]
    fn test_parse_bad_escape_falls_back() {
        let query = parse_query("a=%E0%A4%A&b=%zz&c=%FF");
        assert_eq!(query.get("a").and_then(QueryValue::first), Some("%E0%A4%A"));
        assert_eq!(query.get("b").and_then(QueryValue::first), Some("%zz"));
        assert_eq!(query.get("c").and_then(QueryValue::first), Some("%FF"));
    }

    #[test]
    fn test_parse_third_duplicate_appends() {
        let query = parse_query("t=1&t&t=3");
        assert_eq!(
            query.get("t"),
            Some(&QueryValue::Many(vec![Some("1".into()), None, Some("3".into())]))
        );
    }

    #[test]
    fn test_normalize_query() {
        let raw = LocationQueryRaw::new()
            .with("n", 2.0)
            .with_undefined("gone")
            .with_null("flag")
            .with("one", vec![7])
            .with("many", vec![Some(1), None]);
        let query = normalize_query(&raw);
        assert_eq!(query.get("n"), Some(&QueryValue::from("2")));
        assert!(!query.contains_key("gone"));
        assert_eq!(query.get("flag"), Some(&QueryValue::One(None)));
        assert_eq!(query.get("one"), Some(&QueryValue::from("7")));
        assert_eq!(
            query.get("many"),
            Some(&QueryValue::Many(vec![Some("1".into()), None]))
        );
    }

    #[test]
    fn test_location_query_serializes_in_order() {
        let query = parse_query("z=1&a&m=2&m=3");
        let json = serde_json::to_string(&query).unwrap();
        assert_eq!(json, r#"{"z":"1","a":null,"m":["2","3"]}"#);
    }

    #[test]
    fn test_to_query_string_keeps_first_occurrence_order() {
        let query = parse_query("b=2&a&b=3");
        assert_eq!(query.to_query_string(), "b=2&b=3&a");
    }

    #[test]
    fn test_raw_from_parsed() {
        let parsed = parse_query("a=1&b&c=2&c=3");
        let raw = LocationQueryRaw::from(parsed.clone());
        assert_eq!(parse_query(&stringify_query(&raw)), parsed);
    }
}
