//! # Waymark
//!
//! A framework-agnostic routing core with support for:
//!
//! - **Path Patterns** - literals, `$param`, optional `{-$param}`, affixed
//!   `prefix{$param}suffix`, and trailing `$` wildcard segments
//! - **Nested Routing** - parent/child route trees with pathless layouts and
//!   index routes
//! - **Deterministic Matching** - specificity-ranked candidates with
//!   backtracking, independent of registration order
//! - **Typed Params** - per-route parse/stringify codecs over raw string
//!   captures
//! - **Navigation Resolution** - absolute and relative targets, param
//!   inheritance, search params with retained keys
//! - **Transitions** - two-phase begin/commit with last-request-wins
//!   cancellation, `before_load` hooks, and host-driven data loaders
//!
//! # Quick Start
//!
//! ```
//! use waymark::{match_path, register_routes, RouteDef};
//!
//! let index = register_routes(
//!     RouteDef::root().child(
//!         RouteDef::new("posts")
//!             .child(RouteDef::new("new"))
//!             .child(RouteDef::new("$postId").child(RouteDef::new("edit"))),
//!     ),
//! )
//! .unwrap();
//!
//! let outcome = match_path(&index, "/posts/42/edit").unwrap();
//! let result = outcome.result().unwrap();
//! assert_eq!(
//!     result.matched_route_ids,
//!     vec!["/", "/posts", "/posts/$postId", "/posts/$postId/edit"]
//! );
//! assert_eq!(result.raw_params.get("postId"), Some(&"42".to_string()));
//! ```
//!
//! # Navigation
//!
//! Navigation runs through a [`TransitionController`]:
//!
//! ```
//! use waymark::{
//!     register_routes, Location, NavigationRequest, NavigationTarget, RouteDef,
//!     TransitionController, TransitionState,
//! };
//! use std::sync::Arc;
//!
//! let index = Arc::new(
//!     register_routes(
//!         RouteDef::root().child(RouteDef::new("posts").child(RouteDef::new("$postId"))),
//!     )
//!     .unwrap(),
//! );
//! let mut controller = TransitionController::new(index, Location::new("/")).unwrap();
//!
//! let handle = controller
//!     .begin_transition(&NavigationRequest::push(
//!         NavigationTarget::to("/posts/$postId").with_param("postId", "42"),
//!     ))
//!     .unwrap();
//! assert_eq!(controller.commit(&handle), TransitionState::Committed);
//! assert_eq!(controller.current_location().pathname, "/posts/42");
//! ```
//!
//! # Feature Flags
//!
//! - `log` (default) - Uses the standard `log` crate for logging
//! - `tracing` - Uses the `tracing` crate for structured logging (mutually exclusive with `log`)
//! - `cache` (default) - LRU cache for repeated pathname lookups

#![doc(html_root_url = "https://docs.rs/waymark/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
// Lints are configured in Cargo.toml [lints] section

// Logging abstraction
pub mod logging;

// Cache (optional)
#[cfg(feature = "cache")]
pub mod cache;

// Core routing modules
pub mod matcher;
pub mod pattern;
pub mod tree;

// Navigation
pub mod history;
pub mod location;
pub mod resolver;
pub mod transition;

// Params and search
pub mod params;
pub mod search;

// Error handling
pub mod error;

// Re-export main types for convenient access
#[cfg(feature = "cache")]
pub use cache::{match_path_cached, CacheStats, MatchCache};
pub use error::RouterError;
pub use history::{History, NavigationDirection, NavigationEvent};
pub use location::{
    HistoryAction, Location, NavigationRequest, NavigationTarget, SearchAction,
};
pub use matcher::{match_path, match_path_with_policy, MatchOutcome, MatchResult};
pub use params::{
    stringify_value, ParamCodec, ParseErrorPolicy, ParseParamsFn, RouteParams, StringifyParamsFn,
    TypedParams,
};
pub use pattern::{RoutePattern, Segment, SPLAT_PARAM};
pub use resolver::resolve_location;
pub use search::{SearchParams, SearchValidator};
pub use transition::{
    BeforeLoadContext, BeforeLoadFn, BeforeLoadResult, LoaderContext, LoaderFn, LoaderFuture,
    MatchDiff, TransitionController, TransitionHandle, TransitionOutcome, TransitionState,
};
pub use tree::{register_routes, RouteDef, RouteId, RouteIndex, RouteNode};
