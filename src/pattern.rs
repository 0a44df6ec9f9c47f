//! Route path pattern compilation
//!
//! Compiles a route's path template into a structured segment list that the
//! matcher and resolver consume. Supported segment syntax:
//!
//! - `posts` - literal segment, matched by string equality after percent-decoding
//! - `$postId` - required param capturing one path segment
//! - `prefix{$postId}suffix` - required param with literal affixes
//! - `{-$postId}` / `prefix{-$postId}suffix` - optional param (zero or one segment)
//! - `$` / `prefix{$}suffix` - trailing wildcard capturing the remainder
//!
//! The wildcard captures under the reserved param name `_splat` and its value
//! keeps `/` separators verbatim.

use std::collections::{HashMap, HashSet};

use crate::error::RouterError;

/// Reserved param name for the wildcard capture.
pub const SPLAT_PARAM: &str = "_splat";

const CLASS_LITERAL: u8 = 0;
const CLASS_INDEX: u8 = 1;
const CLASS_PARAM_BOTH_AFFIXES: u8 = 2;
const CLASS_PARAM_PREFIX: u8 = 3;
const CLASS_PARAM_SUFFIX: u8 = 4;
const CLASS_PARAM: u8 = 5;
const CLASS_OPTIONAL: u8 = 6;
const CLASS_WILDCARD: u8 = 7;

/// A single segment in a compiled route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Static text that must match exactly (stored percent-decoded)
    Literal(String),
    /// Required param capturing exactly one path segment
    Param {
        name: String,
        prefix: Option<String>,
        suffix: Option<String>,
    },
    /// Optional param capturing zero or one path segment
    OptionalParam {
        name: String,
        prefix: Option<String>,
        suffix: Option<String>,
    },
    /// Trailing wildcard capturing the remainder of the path
    Wildcard {
        prefix: Option<String>,
        suffix: Option<String>,
    },
}

impl Segment {
    /// Get the param name captured by this segment, if any.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Param { name, .. } | Segment::OptionalParam { name, .. } => Some(name),
            Segment::Wildcard { .. } => Some(SPLAT_PARAM),
        }
    }

    /// Specificity rank of this segment for candidate ordering.
    pub(crate) fn rank(&self) -> SegmentRank {
        match self {
            Segment::Literal(_) => SegmentRank::new(CLASS_LITERAL, 0),
            Segment::Param { prefix, suffix, .. } => {
                let affix_len = affix_len(prefix) + affix_len(suffix);
                let class = match (prefix.is_some(), suffix.is_some()) {
                    (true, true) => CLASS_PARAM_BOTH_AFFIXES,
                    (true, false) => CLASS_PARAM_PREFIX,
                    (false, true) => CLASS_PARAM_SUFFIX,
                    (false, false) => CLASS_PARAM,
                };
                SegmentRank::new(class, affix_len)
            }
            Segment::OptionalParam { prefix, suffix, .. } => {
                SegmentRank::new(CLASS_OPTIONAL, affix_len(prefix) + affix_len(suffix))
            }
            Segment::Wildcard { prefix, suffix } => {
                SegmentRank::new(CLASS_WILDCARD, affix_len(prefix) + affix_len(suffix))
            }
        }
    }
}

fn affix_len(affix: &Option<String>) -> usize {
    affix.as_ref().map_or(0, String::len)
}

/// Specificity rank of a segment.
///
/// Lower ranks are tried first: literals outrank affixed params, longer
/// affixes outrank shorter ones, bare params outrank optional params, and the
/// wildcard loses to everything at the same level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SegmentRank {
    class: u8,
    affix_len: usize,
}

impl SegmentRank {
    fn new(class: u8, affix_len: usize) -> Self {
        Self { class, affix_len }
    }

    /// Rank of an explicit index route: below literals, above params.
    pub(crate) fn index() -> Self {
        Self::new(CLASS_INDEX, 0)
    }

    pub(crate) fn is_wildcard(self) -> bool {
        self.class == CLASS_WILDCARD
    }
}

impl Ord for SegmentRank {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Lower class first; within a class, longer affixes first
        self.class
            .cmp(&other.class)
            .then_with(|| other.affix_len.cmp(&self.affix_len))
    }
}

impl PartialOrd for SegmentRank {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// One way a pattern can consume leading input segments.
#[derive(Debug, Clone)]
pub(crate) struct Consumption {
    /// Number of input segments consumed
    pub consumed: usize,
    /// Params captured along the way (decoded values)
    pub params: Vec<(String, String)>,
    /// Wildcard capture, if the pattern terminated at a wildcard
    pub splat: Option<String>,
}

/// Compiled representation of a route's path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compile a path template into a pattern.
    ///
    /// Fails with [`RouterError::PatternSyntax`] on unmatched braces,
    /// malformed param names, a non-final wildcard, or duplicate param names.
    pub fn compile(path: &str) -> Result<Self, RouterError> {
        let cleaned = clean_path(path);
        let trimmed = trim_path(&cleaned);

        let syntax_error = |reason: &str| RouterError::PatternSyntax {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        if !trimmed.is_empty() && trimmed != "/" {
            for part in trimmed.split('/') {
                segments.push(parse_segment(part).map_err(|reason| syntax_error(&reason))?);
            }
        }

        // Wildcard only as the final segment
        for (i, segment) in segments.iter().enumerate() {
            if matches!(segment, Segment::Wildcard { .. }) && i + 1 != segments.len() {
                return Err(syntax_error("wildcard must be the final segment"));
            }
        }

        // Param names unique within a single pattern
        let mut seen = HashSet::new();
        for segment in &segments {
            if let Some(name) = segment.param_name() {
                if !seen.insert(name.to_string()) {
                    return Err(syntax_error(&format!("duplicate param name '{name}'")));
                }
            }
        }

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    /// The original path template this pattern was compiled from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Compiled segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Check if the pattern ends with a wildcard.
    pub fn has_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard { .. }))
    }

    /// Param names captured by this pattern, in segment order.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(Segment::param_name)
            .collect()
    }

    /// Names of params that must be present when interpolating.
    pub fn required_param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Specificity rank vector used to order sibling candidates.
    pub(crate) fn rank_key(&self) -> Vec<SegmentRank> {
        self.segments.iter().map(Segment::rank).collect()
    }

    /// Enumerate the ways this pattern can consume leading `input` segments,
    /// most-preferred first (optional params greedy-present before absent).
    pub(crate) fn consumptions(&self, input: &[&str]) -> Vec<Consumption> {
        let mut out = Vec::new();
        let mut params = Vec::new();
        self.step(input, 0, 0, &mut params, &mut out);
        out
    }

    fn step(
        &self,
        input: &[&str],
        seg_idx: usize,
        input_idx: usize,
        params: &mut Vec<(String, String)>,
        out: &mut Vec<Consumption>,
    ) {
        if seg_idx == self.segments.len() {
            out.push(Consumption {
                consumed: input_idx,
                params: params.clone(),
                splat: None,
            });
            return;
        }

        match &self.segments[seg_idx] {
            Segment::Literal(value) => {
                if input_idx < input.len() && decode_segment(input[input_idx]) == *value {
                    self.step(input, seg_idx + 1, input_idx + 1, params, out);
                }
            }
            Segment::Param {
                name,
                prefix,
                suffix,
            } => {
                if input_idx < input.len() {
                    if let Some(value) = strip_affixes(input[input_idx], prefix, suffix) {
                        params.push((name.clone(), decode_segment(&value)));
                        self.step(input, seg_idx + 1, input_idx + 1, params, out);
                        params.pop();
                    }
                }
            }
            Segment::OptionalParam {
                name,
                prefix,
                suffix,
            } => {
                // Present branch first (greedy); absent branch on backtrack
                if input_idx < input.len() {
                    if let Some(value) = strip_affixes(input[input_idx], prefix, suffix) {
                        params.push((name.clone(), decode_segment(&value)));
                        self.step(input, seg_idx + 1, input_idx + 1, params, out);
                        params.pop();
                    }
                }
                self.step(input, seg_idx + 1, input_idx, params, out);
            }
            Segment::Wildcard { prefix, suffix } => {
                let remaining = &input[input_idx..];
                if remaining.is_empty() {
                    // A bare wildcard may capture nothing; affixed wildcards
                    // need at least one segment to carry the affixes.
                    if prefix.is_none() && suffix.is_none() {
                        let mut captured = params.clone();
                        captured.push((SPLAT_PARAM.to_string(), String::new()));
                        out.push(Consumption {
                            consumed: input.len(),
                            params: captured,
                            splat: Some(String::new()),
                        });
                    }
                    return;
                }

                let decoded: Vec<String> =
                    remaining.iter().map(|s| decode_segment(s)).collect();
                let mut splat = decoded.join("/");
                if let Some(prefix) = prefix {
                    match splat.strip_prefix(prefix.as_str()) {
                        Some(rest) => splat = rest.to_string(),
                        None => return,
                    }
                }
                if let Some(suffix) = suffix {
                    match splat.strip_suffix(suffix.as_str()) {
                        Some(rest) => splat = rest.to_string(),
                        None => return,
                    }
                }

                let mut captured = params.clone();
                captured.push((SPLAT_PARAM.to_string(), splat.clone()));
                out.push(Consumption {
                    consumed: input.len(),
                    params: captured,
                    splat: Some(splat),
                });
            }
        }
    }

    /// Interpolate param values back into this pattern's template.
    ///
    /// Required params must be present; optional params are omitted when
    /// absent (their affixes close up); a missing wildcard value drops the
    /// wildcard segment entirely. Values are percent-encoded, except the
    /// wildcard value which keeps its `/` separators.
    ///
    /// Returns the joined path without a leading slash, or the name of the
    /// first missing required param.
    pub fn interpolate(&self, params: &HashMap<String, String>) -> Result<String, String> {
        let mut parts = Vec::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(value) => {
                    parts.push(encode_segment(value));
                }
                Segment::Param {
                    name,
                    prefix,
                    suffix,
                } => {
                    let value = params.get(name).ok_or_else(|| name.clone())?;
                    parts.push(affixed(prefix, &encode_segment(value), suffix));
                }
                Segment::OptionalParam {
                    name,
                    prefix,
                    suffix,
                } => match params.get(name) {
                    Some(value) => {
                        parts.push(affixed(prefix, &encode_segment(value), suffix));
                    }
                    None => {
                        if prefix.is_some() || suffix.is_some() {
                            parts.push(affixed(prefix, "", suffix));
                        }
                    }
                },
                Segment::Wildcard { prefix, suffix } => match params.get(SPLAT_PARAM) {
                    Some(value) => {
                        let encoded: Vec<String> =
                            value.split('/').map(|p| encode_segment(p)).collect();
                        parts.push(affixed(prefix, &encoded.join("/"), suffix));
                    }
                    None => {
                        if prefix.is_some() || suffix.is_some() {
                            parts.push(affixed(prefix, "", suffix));
                        }
                    }
                },
            }
        }

        Ok(parts.join("/"))
    }
}

fn affixed(prefix: &Option<String>, value: &str, suffix: &Option<String>) -> String {
    format!(
        "{}{}{}",
        prefix.as_deref().unwrap_or(""),
        value,
        suffix.as_deref().unwrap_or("")
    )
}

/// Check whether a base segment carries the given affixes, returning the raw
/// captured value with affixes stripped.
fn strip_affixes(value: &str, prefix: &Option<String>, suffix: &Option<String>) -> Option<String> {
    let mut rest = value;
    if let Some(prefix) = prefix {
        rest = rest.strip_prefix(prefix.as_str())?;
    }
    if let Some(suffix) = suffix {
        rest = rest.strip_suffix(suffix.as_str())?;
    }
    Some(rest.to_string())
}

fn parse_segment(part: &str) -> Result<Segment, String> {
    if part == "$" {
        return Ok(Segment::Wildcard {
            prefix: None,
            suffix: None,
        });
    }

    if let Some(open) = part.find('{') {
        let close = part.rfind('}').ok_or("unmatched '{'")?;
        if close < open {
            return Err("unmatched '}'".to_string());
        }
        let inner = &part[open + 1..close];
        if inner.contains('{') || inner.contains('}') {
            return Err("nested braces are not allowed".to_string());
        }
        let prefix = non_empty(decode_segment(&part[..open]));
        let suffix = non_empty(decode_segment(&part[close + 1..]));

        let (optional, body) = match inner.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, inner),
        };

        if body == "$" {
            if optional {
                return Err("wildcard cannot be optional".to_string());
            }
            return Ok(Segment::Wildcard { prefix, suffix });
        }

        let name = body
            .strip_prefix('$')
            .ok_or("expected '$' inside braces")?;
        validate_param_name(name)?;

        if optional {
            return Ok(Segment::OptionalParam {
                name: name.to_string(),
                prefix,
                suffix,
            });
        }
        return Ok(Segment::Param {
            name: name.to_string(),
            prefix,
            suffix,
        });
    }

    if part.contains('}') {
        return Err("unmatched '}'".to_string());
    }

    if let Some(name) = part.strip_prefix('$') {
        validate_param_name(name)?;
        return Ok(Segment::Param {
            name: name.to_string(),
            prefix: None,
            suffix: None,
        });
    }

    Ok(Segment::Literal(decode_segment(part)))
}

fn validate_param_name(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(format!("invalid param name '{name}'"))
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

// ============================================================================
// Path string helpers
// ============================================================================

/// Remove repeated slashes from a path string.
pub fn clean_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}

/// Trim leading slashes (preserving root `/`).
pub fn trim_path_left(path: &str) -> &str {
    if path == "/" {
        path
    } else {
        path.trim_start_matches('/')
    }
}

/// Trim trailing slashes (preserving root `/`).
pub fn trim_path_right(path: &str) -> &str {
    if path == "/" {
        path
    } else {
        path.trim_end_matches('/')
    }
}

/// Trim both leading and trailing slashes.
pub fn trim_path(path: &str) -> &str {
    trim_path_right(trim_path_left(path))
}

/// Join path parts, cleaning duplicate slashes between them.
pub fn join_paths<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let joined = parts.into_iter().collect::<Vec<_>>().join("/");
    clean_path(&joined)
}

/// Split a pathname into its raw (still-encoded) segments.
pub fn split_segments(pathname: &str) -> Vec<String> {
    clean_path(pathname)
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Percent-decode a path segment, keeping the raw text on invalid encodings.
pub fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// Percent-encode a path segment.
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(path: &str) -> RoutePattern {
        RoutePattern::compile(path).unwrap()
    }

    #[test]
    fn test_literal_segments() {
        let pattern = compile("/posts/comments");
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("posts".to_string()),
                Segment::Literal("comments".to_string()),
            ]
        );
    }

    #[test]
    fn test_bare_param() {
        let pattern = compile("/posts/$postId");
        assert_eq!(
            pattern.segments()[1],
            Segment::Param {
                name: "postId".to_string(),
                prefix: None,
                suffix: None,
            }
        );
    }

    #[test]
    fn test_braced_param_with_affixes() {
        let pattern = compile("/files/doc-{$name}.pdf");
        assert_eq!(
            pattern.segments()[1],
            Segment::Param {
                name: "name".to_string(),
                prefix: Some("doc-".to_string()),
                suffix: Some(".pdf".to_string()),
            }
        );
    }

    #[test]
    fn test_optional_param() {
        let pattern = compile("/items/{-$id}/edit");
        assert_eq!(
            pattern.segments()[1],
            Segment::OptionalParam {
                name: "id".to_string(),
                prefix: None,
                suffix: None,
            }
        );
    }

    #[test]
    fn test_wildcard() {
        let pattern = compile("/files/$");
        assert!(pattern.has_wildcard());
        assert_eq!(pattern.param_names(), vec![SPLAT_PARAM]);
    }

    #[test]
    fn test_root_pattern_is_empty() {
        let pattern = compile("/");
        assert!(pattern.segments().is_empty());
    }

    #[test]
    fn test_unmatched_open_brace() {
        let err = RoutePattern::compile("/posts/{").unwrap_err();
        assert!(matches!(err, RouterError::PatternSyntax { .. }));
    }

    #[test]
    fn test_unmatched_close_brace() {
        let err = RoutePattern::compile("/posts/x}").unwrap_err();
        assert!(matches!(err, RouterError::PatternSyntax { .. }));
    }

    #[test]
    fn test_wildcard_must_be_final() {
        let err = RoutePattern::compile("/files/$/extra").unwrap_err();
        assert!(matches!(err, RouterError::PatternSyntax { .. }));
    }

    #[test]
    fn test_duplicate_param_names_rejected() {
        let err = RoutePattern::compile("/a/$id/b/$id").unwrap_err();
        assert!(matches!(err, RouterError::PatternSyntax { .. }));
    }

    #[test]
    fn test_empty_param_name_rejected() {
        assert!(RoutePattern::compile("/posts/{$}extra").is_ok()); // affixed wildcard
        assert!(RoutePattern::compile("/posts/{$1bad}").is_err());
    }

    #[test]
    fn test_consumption_literal() {
        let pattern = compile("/posts");
        let consumptions = pattern.consumptions(&["posts"]);
        assert_eq!(consumptions.len(), 1);
        assert_eq!(consumptions[0].consumed, 1);
    }

    #[test]
    fn test_consumption_param_decodes_value() {
        let pattern = compile("/users/$name");
        let consumptions = pattern.consumptions(&["users", "jo%20anne"]);
        assert_eq!(
            consumptions[0].params,
            vec![("name".to_string(), "jo anne".to_string())]
        );
    }

    #[test]
    fn test_consumption_optional_present_preferred() {
        let pattern = compile("/items/{-$id}");
        let consumptions = pattern.consumptions(&["items", "42"]);
        // Present branch first, absent branch second
        assert_eq!(consumptions.len(), 2);
        assert_eq!(consumptions[0].consumed, 2);
        assert_eq!(
            consumptions[0].params,
            vec![("id".to_string(), "42".to_string())]
        );
        assert_eq!(consumptions[1].consumed, 1);
        assert!(consumptions[1].params.is_empty());
    }

    #[test]
    fn test_consumption_optional_closes_gap() {
        let pattern = compile("/items/{-$id}/edit");
        let consumptions = pattern.consumptions(&["items", "edit"]);
        // Only the absent branch completes: present branch captures "edit"
        // as the param and then fails on the literal
        assert_eq!(consumptions.len(), 1);
        assert_eq!(consumptions[0].consumed, 2);
        assert!(consumptions[0].params.is_empty());
    }

    #[test]
    fn test_consumption_wildcard_captures_remainder() {
        let pattern = compile("/files/$");
        let consumptions = pattern.consumptions(&["files", "a", "b", "c"]);
        assert_eq!(consumptions.len(), 1);
        assert_eq!(consumptions[0].splat.as_deref(), Some("a/b/c"));
        assert_eq!(consumptions[0].consumed, 4);
    }

    #[test]
    fn test_consumption_wildcard_empty_remainder() {
        let pattern = compile("/files/$");
        let consumptions = pattern.consumptions(&["files"]);
        assert_eq!(consumptions.len(), 1);
        assert_eq!(consumptions[0].splat.as_deref(), Some(""));
    }

    #[test]
    fn test_consumption_affix_stripped_before_decode() {
        let pattern = compile("/api/v{$version}");
        let consumptions = pattern.consumptions(&["api", "v2"]);
        assert_eq!(
            consumptions[0].params,
            vec![("version".to_string(), "2".to_string())]
        );
        assert!(pattern.consumptions(&["api", "x2"]).is_empty());
    }

    #[test]
    fn test_interpolate_round_trip() {
        let pattern = compile("/posts/$postId/edit");
        let mut params = HashMap::new();
        params.insert("postId".to_string(), "42".to_string());
        assert_eq!(pattern.interpolate(&params).unwrap(), "posts/42/edit");
    }

    #[test]
    fn test_interpolate_missing_required() {
        let pattern = compile("/posts/$postId");
        let err = pattern.interpolate(&HashMap::new()).unwrap_err();
        assert_eq!(err, "postId");
    }

    #[test]
    fn test_interpolate_optional_absent() {
        let pattern = compile("/items/{-$id}/edit");
        assert_eq!(
            pattern.interpolate(&HashMap::new()).unwrap(),
            "items/edit"
        );
    }

    #[test]
    fn test_interpolate_encodes_values() {
        let pattern = compile("/users/$name");
        let mut params = HashMap::new();
        params.insert("name".to_string(), "jo anne".to_string());
        assert_eq!(pattern.interpolate(&params).unwrap(), "users/jo%20anne");
    }

    #[test]
    fn test_interpolate_splat_keeps_slashes() {
        let pattern = compile("/files/$");
        let mut params = HashMap::new();
        params.insert(SPLAT_PARAM.to_string(), "a/b/c".to_string());
        assert_eq!(pattern.interpolate(&params).unwrap(), "files/a/b/c");
    }

    #[test]
    fn test_rank_ordering() {
        let literal = compile("/posts/new").rank_key();
        let param = compile("/posts/$id").rank_key();
        let affixed = compile("/posts/post-{$id}").rank_key();
        let optional = compile("/posts/{-$id}").rank_key();
        let wildcard = compile("/posts/$").rank_key();

        assert!(literal[1] < affixed[1]);
        assert!(affixed[1] < param[1]);
        assert!(param[1] < optional[1]);
        assert!(optional[1] < wildcard[1]);
        assert!(wildcard[1].is_wildcard());
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("//a///b/"), "/a/b/");
    }

    #[test]
    fn test_split_segments() {
        assert_eq!(split_segments("/a//b/c/"), vec!["a", "b", "c"]);
        assert!(split_segments("/").is_empty());
    }

    #[test]
    fn test_percent_decoded_literal() {
        let pattern = compile("/caf%C3%A9");
        assert_eq!(pattern.segments()[0], Segment::Literal("café".to_string()));
        assert_eq!(pattern.consumptions(&["caf%C3%A9"]).len(), 1);
        assert_eq!(pattern.consumptions(&["café"]).len(), 1);
    }
}
