//! Error taxonomy for route registration, matching, and resolution
//!
//! Negative match results and redirect/not-found signals are *not* errors:
//! `NoMatch` is a normal value returned by the matcher, and redirect/not-found
//! outcomes are terminal transition states. Everything here is either a
//! registration-time programmer error or a recoverable per-route failure.

use thiserror::Error;

/// Errors produced by the routing core.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// Malformed route path template. Fatal at registration time.
    #[error("invalid route pattern '{path}': {reason}")]
    PatternSyntax { path: String, reason: String },

    /// Two route definitions computed the same canonical id. Fatal at
    /// registration time.
    #[error("duplicate route id '{id}'")]
    DuplicateRouteId { id: String },

    /// A registered `parse` function rejected the raw params for a route.
    ///
    /// Default policy propagates this to the caller; with
    /// [`ParseErrorPolicy::SkipRoute`](crate::params::ParseErrorPolicy) the
    /// matcher treats the candidate as non-matching and backtracks instead.
    #[error("failed to parse params for route '{route_id}': {reason}")]
    ParamParse { route_id: String, reason: String },

    /// A route's search validator rejected the target search params.
    #[error("search validation failed for route '{route_id}': {reason}")]
    SearchValidation { route_id: String, reason: String },

    /// The navigation target does not name a registered route.
    #[error("no route registered at '{to}'")]
    UnresolvableRoute { to: String },

    /// A required path param had no value after merging inherited and
    /// explicit params.
    #[error("missing required param '{name}' for route '{route_id}'")]
    MissingParam { name: String, route_id: String },
}

impl RouterError {
    /// Check whether this error is fatal at registration time.
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            RouterError::PatternSyntax { .. } | RouterError::DuplicateRouteId { .. }
        )
    }

    /// Check whether this error indicates an invalid navigation request
    /// (a programmer error in `to`/`params`, not a user-facing failure).
    pub fn is_navigation_error(&self) -> bool {
        matches!(
            self,
            RouterError::UnresolvableRoute { .. } | RouterError::MissingParam { .. }
        )
    }
}
