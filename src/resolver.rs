//! Navigation target resolution
//!
//! Turns a caller-supplied [`NavigationTarget`] into a concrete [`Location`]:
//! resolves relative path templates against the current route, merges
//! inherited and explicit params, interpolates the destination's full
//! pattern, and applies the search action plus per-route retained keys.

use std::collections::HashMap;

use crate::error::RouterError;
use crate::location::{Location, NavigationTarget, SearchAction};
use crate::matcher::{match_path, MatchOutcome, MatchResult};
use crate::params::stringify_value;
use crate::pattern::{clean_path, trim_path};
use crate::trace_log;
use crate::tree::{RouteId, RouteIndex};

/// Resolve a navigation target against the current location and match.
///
/// `current_match` supplies the default `from` route and the inherited
/// params; `None` means resolution starts at the root.
///
/// # Example
///
/// ```
/// use waymark::{register_routes, resolve_location, Location, NavigationTarget, RouteDef};
///
/// let index = register_routes(
///     RouteDef::root().child(RouteDef::new("posts").child(RouteDef::new("$postId"))),
/// )
/// .unwrap();
///
/// let location = resolve_location(
///     &index,
///     &Location::new("/"),
///     None,
///     &NavigationTarget::to("/posts/$postId").with_param("postId", "42"),
/// )
/// .unwrap();
/// assert_eq!(location.pathname, "/posts/42");
/// ```
pub fn resolve_location(
    index: &RouteIndex,
    current: &Location,
    current_match: Option<&MatchResult>,
    target: &NavigationTarget,
) -> Result<Location, RouterError> {
    let from_id = resolve_from_id(index, current_match, target)?;
    let (dest_id, template_params) = resolve_dest(index, &from_id, target)?;

    let params = merge_params(index, &dest_id, template_params, current_match, target)?;

    let Some(dest) = index.get(&dest_id) else {
        return Err(RouterError::UnresolvableRoute { to: dest_id });
    };
    let interpolated =
        dest.full_pattern
            .interpolate(&params)
            .map_err(|name| RouterError::MissingParam {
                name,
                route_id: dest_id.clone(),
            })?;
    let pathname = format!("/{interpolated}");

    let mut search = match &target.search {
        SearchAction::Replace(search) => {
            let mut search = search.clone();
            let retained: Vec<String> = index
                .chain_of(&dest_id)
                .iter()
                .flat_map(|node| node.retained_search_keys().iter().cloned())
                .collect();
            search.carry_retained(&current.search, &retained);
            search
        }
        SearchAction::Keep => current.search.clone(),
    };

    for node in index.chain_of(&dest_id) {
        if let Some(validator) = node.validator() {
            search = validator(&search).map_err(|reason| RouterError::SearchValidation {
                route_id: node.id.clone(),
                reason,
            })?;
        }
    }

    let location = Location {
        pathname: crate::location::normalize_pathname(&pathname),
        search,
        hash: target.hash.clone(),
        state: target.state.clone(),
    };

    trace_log!("resolved target -> '{}'", location.pathname);
    Ok(location)
}

/// The route resolution starts from: explicit `from`, else the currently
/// matched leaf, else the root.
fn resolve_from_id(
    index: &RouteIndex,
    current_match: Option<&MatchResult>,
    target: &NavigationTarget,
) -> Result<RouteId, RouterError> {
    let from_id = match &target.from {
        Some(from) => {
            if index.get(from).is_none() {
                return Err(RouterError::UnresolvableRoute { to: from.clone() });
            }
            from.clone()
        }
        None => current_match
            .map(|m| m.leaf_id().to_string())
            .unwrap_or_else(|| index.root_id().to_string()),
    };
    Ok(from_id)
}

/// The destination route after resolving the `to` template.
///
/// `to` may be a route path template (`/posts/$postId`) or a concrete href
/// (`/posts/42`); the latter falls back to matching and yields the captured
/// params alongside the leaf route.
fn resolve_dest(
    index: &RouteIndex,
    from_id: &str,
    target: &NavigationTarget,
) -> Result<(RouteId, HashMap<String, String>), RouterError> {
    let Some(to) = target.to.as_deref() else {
        // Same route, new params/search
        return Ok((from_id.to_string(), HashMap::new()));
    };

    let base = index
        .get(from_id)
        .map(|node| node.full_path.clone())
        .unwrap_or_else(|| "/".to_string());
    let template = resolve_template(&base, to);

    if let Some(node) = index.route_at_path(&template) {
        return Ok((node.id.clone(), HashMap::new()));
    }
    if let MatchOutcome::Matched(result) = match_path(index, &template)? {
        let params = result.raw_params.all().clone();
        return Ok((result.leaf_id().to_string(), params));
    }
    Err(RouterError::UnresolvableRoute { to: to.to_string() })
}

/// Resolve a possibly-relative path template against a base template.
///
/// Absolute targets short-circuit; `.` segments are ignored; `..` pops the
/// base (never above the root).
fn resolve_template(base: &str, to: &str) -> String {
    if to.starts_with('/') {
        return clean_path(to);
    }

    let cleaned = clean_path(base);
    let mut segments: Vec<&str> = trim_path(&cleaned)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    for part in to.split('/') {
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

/// Merge inherited raw params with the target's explicit params, restricted
/// to the names the destination chain actually captures. Explicit values run
/// through the owning route's stringify codec when one is registered.
fn merge_params(
    index: &RouteIndex,
    dest_id: &str,
    template_params: HashMap<String, String>,
    current_match: Option<&MatchResult>,
    target: &NavigationTarget,
) -> Result<HashMap<String, String>, RouterError> {
    let mut params: HashMap<String, String> = current_match
        .map(|m| m.raw_params.all().clone())
        .unwrap_or_default();
    params.extend(template_params);

    if target.params.is_empty() {
        return Ok(params);
    }

    for node in index.chain_of(dest_id) {
        let own = node.own_param_names();
        if own.is_empty() {
            continue;
        }
        let subset: crate::params::TypedParams = target
            .params
            .iter()
            .filter(|(key, _)| own.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if subset.is_empty() {
            continue;
        }

        if let Some(stringify) = node.codec().stringify.as_ref() {
            let raw = stringify(&subset).map_err(|reason| RouterError::ParamParse {
                route_id: node.id.clone(),
                reason,
            })?;
            for (key, value) in raw.iter() {
                params.insert(key.clone(), value.clone());
            }
        } else {
            for (key, value) in subset {
                params.insert(key, stringify_value(&value));
            }
        }
    }

    Ok(params)
}

// ============================================================================
// Tests
// ============================================================================
