//! Search (query string) parameters
//!
//! Search params are an ordered map from string keys to JSON-serializable
//! values. Parsing tries JSON first so `?page=1` round-trips as a number and
//! `?q=hello` as a plain string; stringification mirrors that.
//!
//! Routes may declare *retained* search keys (see
//! [`RouteDef::retain_search`](crate::tree::RouteDef::retain_search)): the
//! resolver carries those keys forward across navigations unless the new
//! target sets them explicitly.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Validation adapter for search params: receives the parsed search object
/// and returns the (possibly transformed) result, or an error message.
pub type SearchValidator = Arc<dyn Fn(&SearchParams) -> Result<SearchParams, String> + Send + Sync>;

/// Parsed search params with deterministic key ordering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchParams {
    map: BTreeMap<String, Value>,
}

impl SearchParams {
    /// Create new empty search params
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a query string (with or without the leading `?`)
    ///
    /// # Example
    ///
    /// ```
    /// use waymark::SearchParams;
    /// use serde_json::json;
    ///
    /// let search = SearchParams::parse("?page=1&sort=name");
    /// assert_eq!(search.get("page"), Some(&json!(1)));
    /// assert_eq!(search.get("sort"), Some(&json!("name")));
    /// ```
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut map = BTreeMap::new();

        for pair in query.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(key);
            let value = decode_component(value);
            map.insert(key, parse_value(&value));
        }

        Self { map }
    }

    /// Serialize to a query string (no leading `?`; empty for no params)
    pub fn to_query_string(&self) -> String {
        let pairs: Vec<String> = self
            .map
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(&encode_value(value))
                )
            })
            .collect();
        pairs.join("&")
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    /// Insert a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.map.insert(key.into(), value.into());
    }

    /// Remove a key, returning its value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.map.remove(key)
    }

    /// Check if a key exists
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.map.iter()
    }

    /// Check if there are no params
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Get number of params
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Copy `keys` from `previous` into this map, for keys not already set.
    ///
    /// Used to implement per-route retained search keys across navigations.
    pub fn carry_retained(&mut self, previous: &SearchParams, keys: &[String]) {
        for key in keys {
            if !self.contains(key) {
                if let Some(value) = previous.get(key) {
                    self.map.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

impl FromIterator<(String, Value)> for SearchParams {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

/// Parse a decoded query value: JSON first, plain string fallback.
fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(_) => Value::String(raw.to_string()),
    }
}

/// Encode a value for the query string: strings plain, everything else JSON.
fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn decode_component(s: &str) -> String {
    urlencoding::decode(s)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

// ============================================================================
// Tests
// ============================================================================
