//! Path matching against the route tree
//!
//! The matcher walks the tree depth-first, trying each node's sibling
//! candidates in pre-sorted specificity order and backtracking whenever a
//! branch cannot consume the rest of the pathname. Optional params enumerate
//! their present branch before their absent branch, so `/items/42/edit`
//! prefers capturing `42` while `/items/edit` falls back to the absent form.
//!
//! Matching is a pure function of the index and the pathname: no interior
//! mutability, no registration-order dependence.

use serde_json::Value;

use crate::error::RouterError;
use crate::params::{ParseErrorPolicy, RouteParams, TypedParams};
use crate::pattern::{split_segments, SPLAT_PARAM};
use crate::trace_log;
use crate::tree::{RouteId, RouteIndex};

// ============================================================================
// Match results
// ============================================================================

/// A successful match: the route chain from root to leaf plus captured params
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Normalized pathname that was matched
    pub pathname: String,
    /// Matched route ids, root first
    pub matched_route_ids: Vec<RouteId>,
    /// Raw (decoded string) params merged across the chain, leaf-most wins
    pub raw_params: RouteParams,
    /// Typed params after each route's codec ran on its own captures
    pub typed_params: TypedParams,
    /// Trailing path consumed by a terminal wildcard; empty when the chain
    /// matched segment-for-segment
    pub remaining_path: String,
}

impl MatchResult {
    /// The leaf (deepest) matched route id
    pub fn leaf_id(&self) -> &str {
        self.matched_route_ids
            .last()
            .map(String::as_str)
            .unwrap_or("/")
    }

    /// Check if a route id appears anywhere in the matched chain
    pub fn contains(&self, route_id: &str) -> bool {
        self.matched_route_ids.iter().any(|id| id == route_id)
    }
}

/// Outcome of matching a pathname against the route tree
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// A route chain consumed the whole pathname
    Matched(MatchResult),
    /// No chain consumed the whole pathname
    NoMatch,
}

impl MatchOutcome {
    /// The match result, if any
    pub fn result(&self) -> Option<&MatchResult> {
        match self {
            Self::Matched(result) => Some(result),
            Self::NoMatch => None,
        }
    }

    /// Check if the outcome is a match
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Match a pathname against the route tree, propagating codec failures.
///
/// # Example
///
/// ```
/// use waymark::{match_path, register_routes, RouteDef};
///
/// let index = register_routes(
///     RouteDef::root().child(RouteDef::new("posts").child(RouteDef::new("$postId"))),
/// )
/// .unwrap();
///
/// let outcome = match_path(&index, "/posts/42").unwrap();
/// let result = outcome.result().unwrap();
/// assert_eq!(result.leaf_id(), "/posts/$postId");
/// assert_eq!(result.raw_params.get("postId"), Some(&"42".to_string()));
/// ```
pub fn match_path(index: &RouteIndex, pathname: &str) -> Result<MatchOutcome, RouterError> {
    match_path_with_policy(index, pathname, ParseErrorPolicy::Propagate)
}

/// Match a pathname with an explicit codec failure policy.
///
/// With [`ParseErrorPolicy::SkipRoute`] a failing `parse` rejects the
/// candidate chain and the walk backtracks to the next-ranked alternative;
/// with [`ParseErrorPolicy::Propagate`] the failure aborts the match as
/// [`RouterError::ParamParse`].
pub fn match_path_with_policy(
    index: &RouteIndex,
    pathname: &str,
    policy: ParseErrorPolicy,
) -> Result<MatchOutcome, RouterError> {
    let segments = split_segments(pathname);
    let input: Vec<&str> = segments.iter().map(String::as_str).collect();

    let root_id = index.root_id().to_string();
    let walker = Walker {
        index,
        input: &input,
        policy,
    };

    let mut chain = Vec::new();
    match walker.visit(&root_id, 0, &mut chain)? {
        Some(mut result) => {
            result.pathname = normalized(&segments);
            trace_log!("matched '{}' -> {:?}", pathname, result.matched_route_ids);
            Ok(MatchOutcome::Matched(result))
        }
        None => {
            trace_log!("no match for '{}'", pathname);
            Ok(MatchOutcome::NoMatch)
        }
    }
}

fn normalized(segments: &[String]) -> String {
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

// ============================================================================
// Walker
// ============================================================================

/// One chain entry while walking: a route id plus the raw params its own
/// pattern captured.
type ChainEntry = (RouteId, Vec<(String, String)>);

struct Walker<'a> {
    index: &'a RouteIndex,
    input: &'a [&'a str],
    policy: ParseErrorPolicy,
}

impl Walker<'_> {
    /// Try to match `node` (and its subtree) starting at input position `pos`.
    ///
    /// Returns `Ok(Some(..))` on the first accepted chain, `Ok(None)` when
    /// this subtree is exhausted and the caller should backtrack.
    fn visit(
        &self,
        node_id: &str,
        pos: usize,
        chain: &mut Vec<ChainEntry>,
    ) -> Result<Option<MatchResult>, RouterError> {
        let Some(node) = self.index.get(node_id) else {
            return Ok(None);
        };

        if node.is_layout {
            // Pathless fallthrough: consumes nothing, succeeds only through
            // a descendant
            chain.push((node.id.clone(), Vec::new()));
            for child_id in &node.children {
                if let Some(result) = self.visit(child_id, pos, chain)? {
                    return Ok(Some(result));
                }
            }
            chain.pop();
            return Ok(None);
        }

        if node.is_index {
            // An index route accepts only when the parent consumed the
            // whole pathname
            if pos != self.input.len() {
                return Ok(None);
            }
            chain.push((node.id.clone(), Vec::new()));
            let accepted = self.accept(chain)?;
            chain.pop();
            return Ok(accepted);
        }

        let Some(pattern) = node.pattern.as_ref() else {
            return Ok(None);
        };

        for consumption in pattern.consumptions(&self.input[pos..]) {
            let next_pos = pos + consumption.consumed;
            chain.push((node.id.clone(), consumption.params));

            // Deeper candidates first: a child that consumes more input
            // outranks accepting this node early
            let mut found = None;
            for child_id in &node.children {
                if let Some(result) = self.visit(child_id, next_pos, chain)? {
                    found = Some(result);
                    break;
                }
            }

            if found.is_none() && next_pos == self.input.len() {
                found = self.accept(chain)?;
            }

            chain.pop();

            if found.is_some() {
                return Ok(found);
            }
        }

        Ok(None)
    }

    /// Finalize a fully-consuming chain: run each route's codec over its own
    /// captures and merge the results root-to-leaf.
    fn accept(&self, chain: &[ChainEntry]) -> Result<Option<MatchResult>, RouterError> {
        let mut matched_route_ids = Vec::with_capacity(chain.len());
        let mut raw_params = RouteParams::new();
        let mut typed_params = TypedParams::new();

        for (route_id, own) in chain {
            let Some(node) = self.index.get(route_id) else {
                continue;
            };

            if let Some(parse) = node.codec().parse.as_ref() {
                let own_raw = RouteParams::from_map(own.iter().cloned().collect());
                match parse(&own_raw) {
                    Ok(typed) => typed_params.extend(typed),
                    Err(reason) => match self.policy {
                        ParseErrorPolicy::SkipRoute => {
                            trace_log!("codec rejected '{}' ({}), backtracking", route_id, reason);
                            return Ok(None);
                        }
                        ParseErrorPolicy::Propagate => {
                            return Err(RouterError::ParamParse {
                                route_id: route_id.clone(),
                                reason,
                            });
                        }
                    },
                }
            } else {
                for (key, value) in own {
                    typed_params.insert(key.clone(), Value::String(value.clone()));
                }
            }

            for (key, value) in own {
                raw_params.insert(key.clone(), value.clone());
            }
            matched_route_ids.push(route_id.clone());
        }

        let remaining_path = raw_params.get(SPLAT_PARAM).cloned().unwrap_or_default();

        Ok(Some(MatchResult {
            pathname: String::new(),
            matched_route_ids,
            raw_params,
            typed_params,
            remaining_path,
        }))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamCodec;
    use crate::pattern::SPLAT_PARAM;
    use crate::tree::{register_routes, RouteDef};
    use serde_json::json;
    use std::collections::HashMap;

    fn blog_index() -> RouteIndex {
        register_routes(
            RouteDef::root().child(
                RouteDef::new("posts")
                    .child(RouteDef::index())
                    .child(RouteDef::new("new"))
                    .child(RouteDef::new("$postId").child(RouteDef::new("edit"))),
            ),
        )
        .unwrap()
    }

    fn chain(outcome: &MatchOutcome) -> Vec<&str> {
        outcome
            .result()
            .unwrap()
            .matched_route_ids
            .iter()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn test_literal_beats_param() {
        let index = blog_index();

        let outcome = match_path(&index, "/posts/new").unwrap();
        assert_eq!(chain(&outcome), vec!["/", "/posts", "/posts/new"]);

        let outcome = match_path(&index, "/posts/42").unwrap();
        assert_eq!(chain(&outcome), vec!["/", "/posts", "/posts/$postId"]);
    }

    #[test]
    fn test_nested_chain_and_params() {
        let index = blog_index();

        let outcome = match_path(&index, "/posts/42/edit").unwrap();
        let result = outcome.result().unwrap();
        assert_eq!(
            result.matched_route_ids,
            vec!["/", "/posts", "/posts/$postId", "/posts/$postId/edit"]
        );
        assert_eq!(result.raw_params.get("postId"), Some(&"42".to_string()));
        assert_eq!(result.typed_params.get("postId"), Some(&json!("42")));
        assert_eq!(result.pathname, "/posts/42/edit");
        assert_eq!(result.remaining_path, "");
    }

    #[test]
    fn test_index_route_on_exact_parent_path() {
        let index = blog_index();

        let outcome = match_path(&index, "/posts").unwrap();
        assert_eq!(chain(&outcome), vec!["/", "/posts", "/posts/"]);
    }

    #[test]
    fn test_root_match() {
        let index = blog_index();

        let outcome = match_path(&index, "/").unwrap();
        assert_eq!(chain(&outcome), vec!["/"]);
    }

    #[test]
    fn test_no_match() {
        let index = blog_index();

        assert_eq!(
            match_path(&index, "/missing").unwrap(),
            MatchOutcome::NoMatch
        );
        assert_eq!(
            match_path(&index, "/posts/42/edit/extra").unwrap(),
            MatchOutcome::NoMatch
        );
    }

    #[test]
    fn test_optional_param_backtracks() {
        let index = register_routes(
            RouteDef::root().child(RouteDef::new("items").child(RouteDef::new("{-$id}/edit"))),
        )
        .unwrap();

        let outcome = match_path(&index, "/items/42/edit").unwrap();
        let result = outcome.result().unwrap();
        assert_eq!(result.raw_params.get("id"), Some(&"42".to_string()));

        // Absent branch: "edit" is not captured as the param
        let outcome = match_path(&index, "/items/edit").unwrap();
        let result = outcome.result().unwrap();
        assert_eq!(result.raw_params.get("id"), None);
        assert_eq!(result.leaf_id(), "/items/{-$id}/edit");
    }

    #[test]
    fn test_wildcard_captures_remainder() {
        let index = register_routes(
            RouteDef::root().child(RouteDef::new("files").child(RouteDef::new("$"))),
        )
        .unwrap();

        let outcome = match_path(&index, "/files/a/b/c").unwrap();
        let result = outcome.result().unwrap();
        assert_eq!(result.leaf_id(), "/files/$");
        assert_eq!(
            result.raw_params.get(SPLAT_PARAM),
            Some(&"a/b/c".to_string())
        );
        assert_eq!(result.remaining_path, "a/b/c");
    }

    #[test]
    fn test_wildcard_loses_to_literal_sibling() {
        let index = register_routes(
            RouteDef::root().child(
                RouteDef::new("files")
                    .child(RouteDef::new("special"))
                    .child(RouteDef::new("$")),
            ),
        )
        .unwrap();

        let outcome = match_path(&index, "/files/special").unwrap();
        assert_eq!(outcome.result().unwrap().leaf_id(), "/files/special");

        let outcome = match_path(&index, "/files/other").unwrap();
        assert_eq!(outcome.result().unwrap().leaf_id(), "/files/$");
    }

    #[test]
    fn test_layout_is_transparent() {
        let index = register_routes(
            RouteDef::root().child(RouteDef::layout("_auth").child(RouteDef::new("dashboard"))),
        )
        .unwrap();

        let outcome = match_path(&index, "/dashboard").unwrap();
        assert_eq!(chain(&outcome), vec!["/", "/_auth", "/_auth/dashboard"]);
    }

    #[test]
    fn test_layout_alone_does_not_match() {
        let index = register_routes(
            RouteDef::root().child(RouteDef::layout("_auth").child(RouteDef::new("dashboard"))),
        )
        .unwrap();

        // Nothing under the layout consumes "/other"
        assert_eq!(match_path(&index, "/other").unwrap(), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_percent_decoding_before_literal_compare() {
        let index = register_routes(RouteDef::root().child(RouteDef::new("café"))).unwrap();

        let outcome = match_path(&index, "/caf%C3%A9").unwrap();
        assert!(outcome.is_match());
    }

    #[test]
    fn test_codec_parses_typed_params() {
        let codec = ParamCodec::new().parse_with(|raw| {
            let id: i64 = raw
                .get("postId")
                .ok_or("missing postId")?
                .parse()
                .map_err(|_| "postId must be an integer".to_string())?;
            Ok(HashMap::from([("postId".to_string(), json!(id))]))
        });
        let index = register_routes(
            RouteDef::root()
                .child(RouteDef::new("posts").child(RouteDef::new("$postId").params(codec))),
        )
        .unwrap();

        let outcome = match_path(&index, "/posts/42").unwrap();
        let result = outcome.result().unwrap();
        assert_eq!(result.typed_params.get("postId"), Some(&json!(42)));
        assert_eq!(result.raw_params.get("postId"), Some(&"42".to_string()));
    }

    #[test]
    fn test_codec_failure_propagates_by_default() {
        let codec = ParamCodec::new().parse_with(|raw| {
            raw.get("postId")
                .and_then(|v| v.parse::<i64>().ok())
                .map(|id| HashMap::from([("postId".to_string(), json!(id))]))
                .ok_or_else(|| "postId must be an integer".to_string())
        });
        let index = register_routes(
            RouteDef::root()
                .child(RouteDef::new("posts").child(RouteDef::new("$postId").params(codec))),
        )
        .unwrap();

        let err = match_path(&index, "/posts/abc").unwrap_err();
        assert!(matches!(err, RouterError::ParamParse { .. }));
    }

    #[test]
    fn test_codec_failure_skips_route_with_policy() {
        let codec = ParamCodec::new().parse_with(|raw| {
            raw.get("postId")
                .and_then(|v| v.parse::<i64>().ok())
                .map(|id| HashMap::from([("postId".to_string(), json!(id))]))
                .ok_or_else(|| "postId must be an integer".to_string())
        });
        let index = register_routes(
            RouteDef::root().child(
                RouteDef::new("posts")
                    .child(RouteDef::new("$postId").params(codec))
                    .child(RouteDef::new("$slug")),
            ),
        )
        .unwrap();

        // Numeric ids take the typed route, everything else backtracks to
        // the untyped sibling
        let outcome =
            match_path_with_policy(&index, "/posts/42", ParseErrorPolicy::SkipRoute).unwrap();
        assert_eq!(outcome.result().unwrap().leaf_id(), "/posts/$postId");

        let outcome =
            match_path_with_policy(&index, "/posts/hello", ParseErrorPolicy::SkipRoute).unwrap();
        assert_eq!(outcome.result().unwrap().leaf_id(), "/posts/$slug");
    }

    #[test]
    fn test_deterministic_across_registration_order() {
        let forward = register_routes(
            RouteDef::root().child(
                RouteDef::new("posts")
                    .child(RouteDef::new("new"))
                    .child(RouteDef::new("$postId")),
            ),
        )
        .unwrap();
        let reversed = register_routes(
            RouteDef::root().child(
                RouteDef::new("posts")
                    .child(RouteDef::new("$postId"))
                    .child(RouteDef::new("new")),
            ),
        )
        .unwrap();

        let a = match_path(&forward, "/posts/new").unwrap();
        let b = match_path(&reversed, "/posts/new").unwrap();
        assert_eq!(chain(&a), chain(&b));
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let index = blog_index();

        let outcome = match_path(&index, "/posts/42/").unwrap();
        assert_eq!(outcome.result().unwrap().pathname, "/posts/42");
        assert_eq!(outcome.result().unwrap().leaf_id(), "/posts/$postId");
    }
}
