//! Route tree definition and indexing
//!
//! User code describes routes as a nested [`RouteDef`] tree; [`RouteIndex`]
//! flattens it into an immutable registry keyed by canonical route id,
//! built once at startup and safe to share across threads.
//!
//! Canonical ids concatenate ancestor path segments. Pathless layout routes
//! use their explicit id in the id chain but contribute nothing to the
//! matchable path; an index route gets its parent's id plus a trailing slash.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RouterError;
use crate::params::ParamCodec;
use crate::pattern::{clean_path, trim_path, RoutePattern, SegmentRank};
use crate::search::SearchValidator;
use crate::transition::{BeforeLoadFn, BeforeLoadResult, LoaderFn, LoaderFuture};
use crate::{debug_log, trace_log};

/// Canonical route identifier (e.g. `/posts/$postId`)
pub type RouteId = String;

// ============================================================================
// RouteDef
// ============================================================================

/// A node in the user-supplied nested route definition tree
///
/// # Example
///
/// ```
/// use waymark::{register_routes, RouteDef};
///
/// let index = register_routes(
///     RouteDef::root()
///         .child(RouteDef::new("posts").child(RouteDef::new("$postId"))),
/// )
/// .unwrap();
///
/// assert!(index.get("/posts/$postId").is_some());
/// ```
pub struct RouteDef {
    id: Option<String>,
    path: Option<String>,
    codec: ParamCodec,
    validate_search: Option<SearchValidator>,
    retain_search: Vec<String>,
    before_load: Option<BeforeLoadFn>,
    loader: Option<LoaderFn>,
    children: Vec<RouteDef>,
}

impl RouteDef {
    /// Create a route with the given path segment(s), relative to its parent
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            id: None,
            path: Some(path.into()),
            codec: ParamCodec::new(),
            validate_search: None,
            retain_search: Vec::new(),
            before_load: None,
            loader: None,
            children: Vec::new(),
        }
    }

    /// Create the root route (`/`)
    pub fn root() -> Self {
        Self::new("/")
    }

    /// Create an index route: matches when its parent's path is the whole
    /// remaining pathname
    pub fn index() -> Self {
        Self::new("/")
    }

    /// Create a pathless layout route that wraps children without
    /// contributing a path segment; requires an explicit id (e.g. `_auth`)
    pub fn layout(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            path: None,
            codec: ParamCodec::new(),
            validate_search: None,
            retain_search: Vec::new(),
            before_load: None,
            loader: None,
            children: Vec::new(),
        }
    }

    /// Set the param parse/stringify codec for this route's own params
    pub fn params(mut self, codec: ParamCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the search validator for this route
    pub fn validate_search<F>(mut self, f: F) -> Self
    where
        F: Fn(&crate::search::SearchParams) -> Result<crate::search::SearchParams, String>
            + Send
            + Sync
            + 'static,
    {
        self.validate_search = Some(Arc::new(f));
        self
    }

    /// Declare search keys whose values persist across navigations unless
    /// the new target sets them explicitly
    pub fn retain_search<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retain_search = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Set the before-load hook, run top-down before a transition commits
    pub fn before_load<F>(mut self, f: F) -> Self
    where
        F: Fn(&crate::transition::BeforeLoadContext<'_>) -> BeforeLoadResult
            + Send
            + Sync
            + 'static,
    {
        self.before_load = Some(Arc::new(f));
        self
    }

    /// Set the data loader hook, driven by the host after a transition begins
    pub fn loader<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::transition::LoaderContext) -> LoaderFuture + Send + Sync + 'static,
    {
        self.loader = Some(Arc::new(f));
        self
    }

    /// Add a child route
    pub fn child(mut self, child: RouteDef) -> Self {
        self.children.push(child);
        self
    }

    /// Add several child routes
    pub fn children(mut self, children: Vec<RouteDef>) -> Self {
        self.children.extend(children);
        self
    }
}

impl std::fmt::Debug for RouteDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteDef")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("children", &self.children.len())
            .finish()
    }
}

// ============================================================================
// RouteNode
// ============================================================================

/// Behavior hooks attached to a route, populated by the host
pub(crate) struct RouteBehavior {
    pub(crate) codec: ParamCodec,
    pub(crate) validate_search: Option<SearchValidator>,
    pub(crate) retain_search: Vec<String>,
    pub(crate) before_load: Option<BeforeLoadFn>,
    pub(crate) loader: Option<LoaderFn>,
}

/// An immutable node in the flattened route registry
pub struct RouteNode {
    /// Canonical id
    pub id: RouteId,
    /// This node's own path relative to its parent (`None` for layouts)
    pub path: Option<String>,
    /// Compiled pattern for this node's own path segments (`None` for
    /// layouts and index routes, which consume no segments)
    pub pattern: Option<RoutePattern>,
    /// Accumulated matchable path template (skipping layout ancestors)
    pub full_path: String,
    /// Parent node id (`None` for the root)
    pub parent: Option<RouteId>,
    /// Child ids, pre-sorted by specificity
    pub children: Vec<RouteId>,
    /// True for pathless layout routes
    pub is_layout: bool,
    /// True for explicit index routes
    pub is_index: bool,
    /// Depth in the tree (root = 0)
    pub depth: usize,
    pub(crate) full_pattern: RoutePattern,
    pub(crate) behavior: RouteBehavior,
}

impl RouteNode {
    /// The route's param codec
    pub fn codec(&self) -> &ParamCodec {
        &self.behavior.codec
    }

    /// Retained search keys declared by this route
    pub fn retained_search_keys(&self) -> &[String] {
        &self.behavior.retain_search
    }

    pub(crate) fn validator(&self) -> Option<&SearchValidator> {
        self.behavior.validate_search.as_ref()
    }

    pub(crate) fn before_load_hook(&self) -> Option<&BeforeLoadFn> {
        self.behavior.before_load.as_ref()
    }

    /// The route's loader hook, if any
    pub fn loader_hook(&self) -> Option<&LoaderFn> {
        self.behavior.loader.as_ref()
    }

    /// Param names introduced by this node's own pattern
    pub fn own_param_names(&self) -> Vec<&str> {
        self.pattern
            .as_ref()
            .map(RoutePattern::param_names)
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for RouteNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteNode")
            .field("id", &self.id)
            .field("full_path", &self.full_path)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("is_layout", &self.is_layout)
            .field("is_index", &self.is_index)
            .finish()
    }
}

// ============================================================================
// RouteIndex
// ============================================================================

/// Immutable flat registry of all routes, built once at registration
#[derive(Debug)]
pub struct RouteIndex {
    routes: HashMap<RouteId, Arc<RouteNode>>,
    by_path: HashMap<String, RouteId>,
    root: RouteId,
}

/// Build the process-wide route registry from a nested definition tree.
///
/// Fails with [`RouterError::PatternSyntax`] on a malformed path template and
/// [`RouterError::DuplicateRouteId`] when two definitions compute the same id.
pub fn register_routes(root: RouteDef) -> Result<RouteIndex, RouterError> {
    RouteIndex::build(root)
}

impl RouteIndex {
    /// Build the index from a nested definition tree. See [`register_routes`].
    pub fn build(root_def: RouteDef) -> Result<Self, RouterError> {
        let mut nodes: HashMap<RouteId, NodeBuild> = HashMap::new();
        let mut by_path: HashMap<String, RouteId> = HashMap::new();

        let root = insert_def(root_def, None, "/", 0, &mut nodes, &mut by_path)?;
        sort_children(&mut nodes);

        let routes = nodes
            .into_iter()
            .map(|(id, node)| (id, Arc::new(node.finish())))
            .collect::<HashMap<_, _>>();

        debug_log!("indexed {} routes under '{}'", routes.len(), root);

        Ok(Self {
            routes,
            by_path,
            root,
        })
    }

    /// Look up a route by canonical id
    pub fn get(&self, id: &str) -> Option<&Arc<RouteNode>> {
        self.routes.get(id)
    }

    /// The root route node
    pub fn root(&self) -> Option<&Arc<RouteNode>> {
        self.routes.get(&self.root)
    }

    /// The root route id
    pub fn root_id(&self) -> &str {
        &self.root
    }

    /// Look up a route by its full path template
    pub fn route_at_path(&self, full_path: &str) -> Option<&Arc<RouteNode>> {
        let normalized = if full_path == "/" {
            "/".to_string()
        } else {
            format!("/{}", trim_path(&clean_path(full_path)))
        };
        self.by_path.get(&normalized).and_then(|id| self.get(id))
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if the index is empty (never true for a built index)
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterate over all route ids
    pub fn ids(&self) -> impl Iterator<Item = &RouteId> {
        self.routes.keys()
    }

    /// Ancestor chain of a route, root first, including the route itself
    pub fn chain_of(&self, id: &str) -> Vec<&Arc<RouteNode>> {
        let mut chain = Vec::new();
        let mut cursor = self.get(id);
        while let Some(node) = cursor {
            chain.push(node);
            cursor = node.parent.as_deref().and_then(|p| self.get(p));
        }
        chain.reverse();
        chain
    }
}

// ============================================================================
// Build internals
// ============================================================================

struct NodeBuild {
    id: RouteId,
    path: Option<String>,
    pattern: Option<RoutePattern>,
    full_path: String,
    full_pattern: RoutePattern,
    parent: Option<RouteId>,
    children: Vec<RouteId>,
    is_layout: bool,
    is_index: bool,
    depth: usize,
    behavior: RouteBehavior,
}

impl NodeBuild {
    fn finish(self) -> RouteNode {
        RouteNode {
            id: self.id,
            path: self.path,
            pattern: self.pattern,
            full_path: self.full_path,
            full_pattern: self.full_pattern,
            parent: self.parent,
            children: self.children,
            is_layout: self.is_layout,
            is_index: self.is_index,
            depth: self.depth,
            behavior: self.behavior,
        }
    }
}

fn join_id(parent_id: &str, child: &str) -> String {
    if parent_id == "/" {
        format!("/{child}")
    } else {
        format!("{parent_id}/{child}")
    }
}

fn insert_def(
    def: RouteDef,
    parent_id: Option<&str>,
    parent_full: &str,
    depth: usize,
    nodes: &mut HashMap<RouteId, NodeBuild>,
    by_path: &mut HashMap<String, RouteId>,
) -> Result<RouteId, RouterError> {
    let RouteDef {
        id,
        path,
        codec,
        validate_search,
        retain_search,
        before_load,
        loader,
        children,
    } = def;

    let (node_id, own_path, pattern, full_path, is_layout, is_index) = match (parent_id, path) {
        (None, path) => {
            // Root route
            let path = path.unwrap_or_else(|| "/".to_string());
            if trim_path(&clean_path(&path)) != "/" && !trim_path(&clean_path(&path)).is_empty() {
                return Err(RouterError::PatternSyntax {
                    path,
                    reason: "root route path must be '/'".to_string(),
                });
            }
            (
                "/".to_string(),
                Some("/".to_string()),
                Some(RoutePattern::compile("/")?),
                "/".to_string(),
                false,
                false,
            )
        }
        (Some(pid), None) => {
            // Pathless layout
            let layout_id = id.ok_or_else(|| RouterError::PatternSyntax {
                path: "<pathless>".to_string(),
                reason: "pathless layout route requires an id".to_string(),
            })?;
            let layout_id = trim_path(&layout_id).to_string();
            (
                join_id(pid, &layout_id),
                None,
                None,
                parent_full.to_string(),
                true,
                false,
            )
        }
        (Some(pid), Some(path)) => {
            let trimmed = trim_path(&clean_path(&path)).to_string();
            if trimmed.is_empty() || trimmed == "/" {
                // Index route: parent id plus a trailing slash
                (
                    format!("{}/", pid.trim_end_matches('/')),
                    Some("/".to_string()),
                    None,
                    parent_full.to_string(),
                    false,
                    true,
                )
            } else {
                let full = if parent_full == "/" {
                    format!("/{trimmed}")
                } else {
                    format!("{parent_full}/{trimmed}")
                };
                (
                    join_id(pid, &trimmed),
                    Some(trimmed.clone()),
                    Some(RoutePattern::compile(&trimmed)?),
                    full,
                    false,
                    false,
                )
            }
        }
    };

    if nodes.contains_key(&node_id) {
        return Err(RouterError::DuplicateRouteId { id: node_id });
    }

    trace_log!("registering route '{}' at '{}'", node_id, full_path);

    let full_pattern = RoutePattern::compile(&full_path)?;
    by_path.entry(full_path.clone()).or_insert_with(|| node_id.clone());

    nodes.insert(
        node_id.clone(),
        NodeBuild {
            id: node_id.clone(),
            path: own_path,
            pattern,
            full_path: full_path.clone(),
            full_pattern,
            parent: parent_id.map(str::to_string),
            children: Vec::new(),
            is_layout,
            is_index,
            depth,
            behavior: RouteBehavior {
                codec,
                validate_search,
                retain_search,
                before_load,
                loader,
            },
        },
    );

    for child in children {
        let child_id = insert_def(child, Some(&node_id), &full_path, depth + 1, nodes, by_path)?;
        if let Some(parent) = nodes.get_mut(&node_id) {
            parent.children.push(child_id);
        }
    }

    Ok(node_id)
}

/// Sort every node's children by specificity, so the matcher tries
/// candidates in ranked order without re-sorting per lookup.
fn sort_children(nodes: &mut HashMap<RouteId, NodeBuild>) {
    let mut memo: HashMap<RouteId, Vec<SegmentRank>> = HashMap::new();
    let ids: Vec<RouteId> = nodes.keys().cloned().collect();

    for id in ids {
        let mut children = match nodes.get(&id) {
            Some(node) => node.children.clone(),
            None => continue,
        };

        children.sort_by(|a, b| {
            let (a_node, b_node) = match (nodes.get(a), nodes.get(b)) {
                (Some(a), Some(b)) => (a, b),
                _ => return std::cmp::Ordering::Equal,
            };
            // An explicit index route outranks a pathless fallthrough
            if a_node.is_index && b_node.is_layout {
                return std::cmp::Ordering::Less;
            }
            if a_node.is_layout && b_node.is_index {
                return std::cmp::Ordering::Greater;
            }
            let a_key = rank_key_of(nodes, a, &mut memo);
            let b_key = rank_key_of(nodes, b, &mut memo);
            compare_rank_keys(&a_key, &b_key)
        });

        if let Some(node) = nodes.get_mut(&id) {
            node.children = children;
        }
    }
}

fn rank_key_of(
    nodes: &HashMap<RouteId, NodeBuild>,
    id: &str,
    memo: &mut HashMap<RouteId, Vec<SegmentRank>>,
) -> Vec<SegmentRank> {
    if let Some(key) = memo.get(id) {
        return key.clone();
    }
    let key = match nodes.get(id) {
        None => Vec::new(),
        Some(node) if node.is_index => vec![SegmentRank::index()],
        Some(node) if node.is_layout => {
            // A layout is transparent for specificity: rank by its most
            // specific descendant
            node.children
                .clone()
                .iter()
                .map(|child| rank_key_of(nodes, child, memo))
                .min_by(|a, b| compare_rank_keys(a, b))
                .unwrap_or_default()
        }
        Some(node) => node
            .pattern
            .as_ref()
            .map(RoutePattern::rank_key)
            .unwrap_or_default(),
    };
    memo.insert(id.to_string(), key.clone());
    key
}

fn compare_rank_keys(a: &[SegmentRank], b: &[SegmentRank]) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    // The wildcard is the catch-all: it loses to every alternative
    let a_wild = a.last().is_some_and(|r| r.is_wildcard());
    let b_wild = b.last().is_some_and(|r| r.is_wildcard());
    match (a_wild, b_wild) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }

    for (x, y) in a.iter().zip(b.iter()) {
        match x.cmp(y) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }

    // Equal common prefix: more segments beats the shorter prefix match
    b.len().cmp(&a.len())
}

// ============================================================================
// Tests
// ============================================================================
