//! Per-request view of the incoming URL.

use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;

/// A decoded query value. Repeated keys collapse into [`QueryValue::Many`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    One(String),
    Many(Vec<String>),
}

impl QueryValue {
    /// Every value in request order, whatever the shape.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            QueryValue::One(value) => std::slice::from_ref(value),
            QueryValue::Many(values) => values,
        };
        slice.iter().map(String::as_str)
    }

    /// The last supplied value.
    pub fn last(&self) -> Option<&str> {
        self.values().last()
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::One(first) => {
                let first = std::mem::take(first);
                *self = QueryValue::Many(vec![first, value]);
            }
            QueryValue::Many(values) => values.push(value),
        }
    }
}

/// Path and query of one request. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    path: String,
    query: BTreeMap<String, QueryValue>,
}

impl RequestDescriptor {
    /// Build from a raw path and query, both still percent-encoded.
    pub fn new(path: &str, query: Option<&str>) -> Self {
        let mut parsed: BTreeMap<String, QueryValue> = BTreeMap::new();

        if let Some(query) = query {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                let key = key.trim_end_matches("[]").to_string();
                let value = value.into_owned();
                match parsed.get_mut(&key) {
                    Some(existing) => existing.push(value),
                    None => {
                        parsed.insert(key, QueryValue::One(value));
                    }
                }
            }
        }

        Self {
            path: decode_path(path),
            query: parsed,
        }
    }

    /// Build from a request target such as `/widget.js?debug`.
    pub fn from_uri(uri: &str) -> Self {
        let without_fragment = uri.split('#').next().unwrap_or_default();
        match without_fragment.split_once('?') {
            Some((path, query)) => Self::new(path, Some(query)),
            None => Self::new(without_fragment, None),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &BTreeMap<String, QueryValue> {
        &self.query
    }

    /// Whether the query carries `key`, with or without a value.
    pub fn has(&self, key: &str) -> bool {
        self.query.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.query.get(key)
    }
}

/// Percent-decode a URL path. `+` stays a plus sign; invalid UTF-8 is
/// replaced.
pub fn decode_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_uri_splits_path_and_query() {
        let req = RequestDescriptor::from_uri("/widget.js?debug&expose=my-widget");
        assert_eq!(req.path(), "/widget.js");
        assert!(req.has("debug"));
        assert_eq!(
            req.get("expose"),
            Some(&QueryValue::One("my-widget".to_string()))
        );
    }

    #[test]
    fn test_repeated_keys_collect() {
        let req = RequestDescriptor::from_uri("/a.js?external=react&external=react-dom");
        let values: Vec<_> = req.get("external").unwrap().values().collect();
        assert_eq!(values, vec!["react", "react-dom"]);
    }

    #[test]
    fn test_bracket_suffix_is_normalized() {
        let req = RequestDescriptor::from_uri("/a.js?external[]=react");
        assert!(req.has("external"));
    }

    #[test]
    fn test_percent_decoding() {
        let req = RequestDescriptor::from_uri("/a.js?expose=%40scope%2Fpkg");
        assert_eq!(req.get("expose").and_then(QueryValue::last), Some("@scope/pkg"));
    }

    #[test]
    fn test_path_is_percent_decoded() {
        let req = RequestDescriptor::from_uri("/my%20card.css?x=a+b");
        assert_eq!(req.path(), "/my card.css");
        assert_eq!(req.get("x").and_then(QueryValue::last), Some("a b"));

        assert_eq!(decode_path("/c%2B%2B+notes.js"), "/c++ notes.js");
        assert_eq!(decode_path("/%2e%2e/secret"), "/../secret");
    }

    #[test]
    fn test_no_query() {
        let req = RequestDescriptor::from_uri("/");
        assert_eq!(req.path(), "/");
        assert!(req.query().is_empty());
    }

    #[test]
    fn test_fragment_dropped() {
        let req = RequestDescriptor::from_uri("/a.css?x=1#frag");
        assert_eq!(req.path(), "/a.css");
        assert_eq!(req.get("x").and_then(QueryValue::last), Some("1"));
    }
}
