//! Route parameter maps and the per-route parse/stringify codec
//!
//! Raw params extracted by the matcher are decoded-but-unparsed strings.
//! Routes may register a [`ParamCodec`] to convert their own params to and
//! from typed JSON values; the default is identity (raw strings become JSON
//! strings).

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

/// Typed params after codec decoding: param name to JSON value.
pub type TypedParams = HashMap<String, Value>;

/// Route parameters extracted from path segments
///
/// # Example
///
/// ```
/// use waymark::RouteParams;
///
/// // Route pattern: /users/$id
/// // Matched path: /users/123
/// let mut params = RouteParams::new();
/// params.insert("id".to_string(), "123".to_string());
///
/// assert_eq!(params.get("id"), Some(&"123".to_string()));
/// assert_eq!(params.get_as::<i32>("id"), Some(123));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    params: HashMap<String, String>,
}

impl RouteParams {
    /// Create new empty route params
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from hashmap
    pub fn from_map(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    /// Get a parameter value as a string
    pub fn get(&self, key: &str) -> Option<&String> {
        self.params.get(key)
    }

    /// Get a parameter and parse it as a specific type
    ///
    /// Returns `None` if the parameter doesn't exist or cannot be parsed.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.params.get(key)?.parse().ok()
    }

    /// Insert a parameter
    pub fn insert(&mut self, key: String, value: String) {
        self.params.insert(key, value);
    }

    /// Check if parameter exists
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Get all parameters as a reference to the HashMap
    pub fn all(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Iterate over all parameters
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.params.iter()
    }

    /// Check if parameters are empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }
}

// ============================================================================
// Param codec
// ============================================================================

/// Parse raw string params into typed values.
pub type ParseParamsFn = Arc<dyn Fn(&RouteParams) -> Result<TypedParams, String> + Send + Sync>;

/// Stringify typed values back into raw string params.
pub type StringifyParamsFn =
    Arc<dyn Fn(&TypedParams) -> Result<RouteParams, String> + Send + Sync>;

/// Per-route parse/stringify pair for the params the route's own pattern
/// captures. Both sides default to identity.
#[derive(Clone, Default)]
pub struct ParamCodec {
    pub(crate) parse: Option<ParseParamsFn>,
    pub(crate) stringify: Option<StringifyParamsFn>,
}

impl ParamCodec {
    /// Create an identity codec
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the parse function
    pub fn parse_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&RouteParams) -> Result<TypedParams, String> + Send + Sync + 'static,
    {
        self.parse = Some(Arc::new(f));
        self
    }

    /// Set the stringify function
    pub fn stringify_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&TypedParams) -> Result<RouteParams, String> + Send + Sync + 'static,
    {
        self.stringify = Some(Arc::new(f));
        self
    }

    /// Check if a parse function is registered
    pub fn has_parse(&self) -> bool {
        self.parse.is_some()
    }

    /// Check if a stringify function is registered
    pub fn has_stringify(&self) -> bool {
        self.stringify.is_some()
    }
}

impl std::fmt::Debug for ParamCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamCodec")
            .field("parse", &self.parse.is_some())
            .field("stringify", &self.stringify.is_some())
            .finish()
    }
}

/// Policy applied when a registered `parse` function fails during matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseErrorPolicy {
    /// Propagate the failure to the caller as a route-level error
    #[default]
    Propagate,
    /// Treat the candidate route as non-matching and let the matcher
    /// backtrack to the next-ranked alternative
    SkipRoute,
}

/// Default stringification for a typed param value: strings pass through,
/// everything else is JSON-encoded.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_params_basic() {
        let mut params = RouteParams::new();
        params.insert("id".to_string(), "123".to_string());

        assert_eq!(params.get("id"), Some(&"123".to_string()));
        assert!(params.contains("id"));
        assert!(!params.contains("missing"));
    }

    #[test]
    fn test_route_params_get_as() {
        let mut params = RouteParams::new();
        params.insert("id".to_string(), "123".to_string());
        params.insert("active".to_string(), "true".to_string());

        assert_eq!(params.get_as::<i32>("id"), Some(123));
        assert_eq!(params.get_as::<bool>("active"), Some(true));
        assert_eq!(params.get_as::<i32>("missing"), None);
    }

    #[test]
    fn test_route_params_from_map() {
        let mut map = HashMap::new();
        map.insert("name".to_string(), "John".to_string());
        map.insert("age".to_string(), "30".to_string());

        let params = RouteParams::from_map(map);

        assert_eq!(params.get("name"), Some(&"John".to_string()));
        assert_eq!(params.get_as::<i32>("age"), Some(30));
    }

    #[test]
    fn test_route_params_empty() {
        let params = RouteParams::new();
        assert!(params.is_empty());
        assert_eq!(params.len(), 0);
    }

    #[test]
    fn test_codec_default_is_identity() {
        let codec = ParamCodec::new();
        assert!(!codec.has_parse());
        assert!(!codec.has_stringify());
    }

    #[test]
    fn test_codec_parse_round_trip() {
        let codec = ParamCodec::new()
            .parse_with(|raw| {
                let id: i64 = raw
                    .get("id")
                    .ok_or("missing id")?
                    .parse()
                    .map_err(|_| "id must be an integer".to_string())?;
                Ok(HashMap::from([("id".to_string(), json!(id))]))
            })
            .stringify_with(|typed| {
                let mut raw = RouteParams::new();
                if let Some(Value::Number(n)) = typed.get("id") {
                    raw.insert("id".to_string(), n.to_string());
                }
                Ok(raw)
            });

        let mut raw = RouteParams::new();
        raw.insert("id".to_string(), "42".to_string());

        let typed = (codec.parse.as_ref().unwrap())(&raw).unwrap();
        assert_eq!(typed.get("id"), Some(&json!(42)));

        let back = (codec.stringify.as_ref().unwrap())(&typed).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_codec_parse_failure() {
        let codec = ParamCodec::new().parse_with(|raw| {
            raw.get("id")
                .and_then(|v| v.parse::<i64>().ok())
                .map(|id| HashMap::from([("id".to_string(), json!(id))]))
                .ok_or_else(|| "id must be an integer".to_string())
        });

        let mut raw = RouteParams::new();
        raw.insert("id".to_string(), "abc".to_string());

        assert!((codec.parse.as_ref().unwrap())(&raw).is_err());
    }

    #[test]
    fn test_stringify_value() {
        assert_eq!(stringify_value(&json!("plain")), "plain");
        assert_eq!(stringify_value(&json!(42)), "42");
        assert_eq!(stringify_value(&json!(true)), "true");
    }
}
