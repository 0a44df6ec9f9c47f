//! Locations, navigation targets, and navigation requests
//!
//! A [`Location`] is the fully resolved destination of a navigation: an
//! absolute normalized pathname, parsed search params, an optional hash, and
//! an opaque history-state payload the core never interprets.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::search::SearchParams;

/// A resolved navigation destination
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Absolute normalized pathname (single leading slash, no `.`/`..`)
    pub pathname: String,
    /// Parsed search params
    pub search: SearchParams,
    /// Optional fragment (without the `#`)
    pub hash: Option<String>,
    /// Opaque history-state payload, not interpreted by the core
    pub state: Option<Value>,
}

impl Location {
    /// Create a location from a pathname with empty search
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: normalize_pathname(&pathname.into()),
            search: SearchParams::new(),
            hash: None,
            state: None,
        }
    }

    /// Parse a location from an href like `/posts/42?page=1#comments`
    pub fn parse(href: &str) -> Self {
        let (rest, hash) = match href.split_once('#') {
            Some((rest, hash)) => (rest, Some(hash.to_string())),
            None => (href, None),
        };
        let (pathname, search) = match rest.split_once('?') {
            Some((pathname, query)) => (pathname, SearchParams::parse(query)),
            None => (rest, SearchParams::new()),
        };

        Self {
            pathname: normalize_pathname(pathname),
            search,
            hash,
            state: None,
        }
    }

    /// Set the search params
    pub fn with_search(mut self, search: SearchParams) -> Self {
        self.search = search;
        self
    }

    /// Set the hash
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Set the history-state payload
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    /// The serialized search string (without the `?`; empty for no params)
    pub fn search_str(&self) -> String {
        self.search.to_query_string()
    }

    /// Full href: pathname + search + hash
    pub fn href(&self) -> String {
        let mut href = self.pathname.clone();
        let search = self.search_str();
        if !search.is_empty() {
            href.push('?');
            href.push_str(&search);
        }
        if let Some(hash) = &self.hash {
            href.push('#');
            href.push_str(hash);
        }
        href
    }
}

/// Normalize a pathname: single leading slash, collapsed duplicate slashes,
/// no trailing slash (except root), `.`/`..` resolved lexically (`..` never
/// climbs above the root).
pub(crate) fn normalize_pathname(pathname: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for part in pathname.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

// ============================================================================
// Navigation targets
// ============================================================================

/// How the target's search params relate to the current ones
#[derive(Debug, Clone, PartialEq)]
pub enum SearchAction {
    /// Replace the search object entirely with the given params
    Replace(SearchParams),
    /// Carry the current search through unchanged
    Keep,
}

impl Default for SearchAction {
    fn default() -> Self {
        Self::Replace(SearchParams::new())
    }
}

/// The caller-supplied destination of a navigation, before resolution
///
/// # Example
///
/// ```
/// use waymark::NavigationTarget;
///
/// let target = NavigationTarget::to("/posts/$postId")
///     .with_param("postId", "42");
/// assert_eq!(target.to.as_deref(), Some("/posts/$postId"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct NavigationTarget {
    /// Destination: absolute (`/posts`), relative (`../sibling`, `./child`),
    /// or `None` for "same route, new params/search"
    pub to: Option<String>,
    /// Route id to resolve relative targets from (defaults to the currently
    /// matched leaf route)
    pub from: Option<String>,
    /// Explicit path params, overriding inherited ones
    pub params: HashMap<String, Value>,
    /// Search handling
    pub search: SearchAction,
    /// Optional fragment
    pub hash: Option<String>,
    /// Opaque history-state payload
    pub state: Option<Value>,
}

impl NavigationTarget {
    /// Target a path (absolute or relative)
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            to: Some(path.into()),
            ..Self::default()
        }
    }

    /// Target the current route (new params/search only)
    pub fn stay() -> Self {
        Self::default()
    }

    /// Set the route id relative targets resolve from
    pub fn from_route(mut self, route_id: impl Into<String>) -> Self {
        self.from = Some(route_id.into());
        self
    }

    /// Set a path param
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Replace the search params entirely
    pub fn with_search(mut self, search: SearchParams) -> Self {
        self.search = SearchAction::Replace(search);
        self
    }

    /// Carry the current search through unchanged
    pub fn keep_search(mut self) -> Self {
        self.search = SearchAction::Keep;
        self
    }

    /// Set the hash
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Set the history-state payload
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }
}

/// History action accompanying a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    /// Push a new entry
    Push,
    /// Replace the current entry
    Replace,
    /// Host-driven history traversal (popstate)
    Pop,
}

/// A navigation request: target plus history action
#[derive(Debug, Clone)]
pub struct NavigationRequest {
    pub target: NavigationTarget,
    pub action: HistoryAction,
}

impl NavigationRequest {
    /// Push navigation to a target
    pub fn push(target: NavigationTarget) -> Self {
        Self {
            target,
            action: HistoryAction::Push,
        }
    }

    /// Replace navigation to a target
    pub fn replace(target: NavigationTarget) -> Self {
        Self {
            target,
            action: HistoryAction::Replace,
        }
    }

    /// Popstate navigation to a target (host-driven)
    pub fn pop(target: NavigationTarget) -> Self {
        Self {
            target,
            action: HistoryAction::Pop,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
