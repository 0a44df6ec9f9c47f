//! Transition control
//!
//! A transition runs in two phases. `begin_transition` resolves the target,
//! matches it, runs the `before_load` hooks top-down, and returns a
//! [`TransitionHandle`] describing what would change. `commit` applies the
//! handle to history and current state - unless a newer transition began in
//! the meantime, in which case the stale handle commits as
//! [`TransitionState::Cancelled`] with no side effects (last request wins).
//!
//! Data loading is host-driven: the controller hands out [`LoaderContext`]s
//! for the routes that need (re)loading and accepts results back tagged with
//! the generation they belong to, dropping stale ones.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::debug_log;
use crate::error::RouterError;
use crate::history::{History, NavigationEvent};
use crate::location::{HistoryAction, Location, NavigationRequest, NavigationTarget};
use crate::matcher::{match_path_with_policy, MatchOutcome, MatchResult};
use crate::params::{ParseErrorPolicy, RouteParams, TypedParams};
use crate::resolver::resolve_location;
use crate::tree::{RouteId, RouteIndex};

// ============================================================================
// Hooks
// ============================================================================

/// Context handed to a route's `before_load` hook
#[derive(Debug)]
pub struct BeforeLoadContext<'a> {
    /// The route whose hook is running
    pub route_id: &'a str,
    /// The resolved destination location
    pub location: &'a Location,
    /// The full match for the destination
    pub matches: &'a MatchResult,
}

/// Decision returned by a `before_load` hook
#[derive(Debug, Clone)]
pub enum BeforeLoadResult {
    /// Continue the transition
    Proceed,
    /// Continue, attaching a context value readable from the handle
    ProceedWith(Value),
    /// Abort and navigate to a different target instead
    Redirect(NavigationTarget),
    /// Abort: the destination should render as not-found
    NotFound,
}

/// Hook run top-down over the destination chain before a transition commits
pub type BeforeLoadFn =
    Arc<dyn Fn(&BeforeLoadContext<'_>) -> BeforeLoadResult + Send + Sync>;

/// Context handed to a route's data loader
#[derive(Debug, Clone)]
pub struct LoaderContext {
    /// The route whose loader is running
    pub route_id: RouteId,
    /// Generation of the transition this load belongs to
    pub generation: u64,
    /// The resolved destination location
    pub location: Location,
    /// Raw params for the whole chain
    pub raw_params: RouteParams,
    /// Typed params for the whole chain
    pub typed_params: TypedParams,
}

/// Boxed future returned by a data loader
pub type LoaderFuture = Pin<Box<dyn Future<Output = Result<Value, String>> + Send>>;

/// Host-driven data loader attached to a route
pub type LoaderFn = Arc<dyn Fn(LoaderContext) -> LoaderFuture + Send + Sync>;

// ============================================================================
// Transition state
// ============================================================================

/// Lifecycle state of the controller's most recent transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionState {
    /// No transition has run yet
    #[default]
    Idle,
    /// A transition began and has not committed
    Pending,
    /// The last transition committed and updated history
    Committed,
    /// The last transition ended in a `before_load` redirect
    Redirected,
    /// The destination did not match any route chain
    NotFound,
    /// The handle was superseded by a newer transition
    Cancelled,
}

/// What a begun transition will do when committed
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    /// Commit will update history and current state
    Ready,
    /// A `before_load` hook redirected; commit applies nothing
    Redirected(NavigationTarget),
    /// No route chain matched, or a hook declared not-found
    NotFound,
}

// ============================================================================
// Match diff
// ============================================================================

/// Per-route difference between two consecutive matches
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchDiff {
    /// Routes present in the new match only, root first
    pub entered: Vec<RouteId>,
    /// Routes present in the old match only, leaf first
    pub exited: Vec<RouteId>,
    /// Routes present in both with unchanged own params
    pub retained: Vec<RouteId>,
    /// Routes present in both whose own params changed (need reload)
    pub refreshed: Vec<RouteId>,
}

impl MatchDiff {
    /// Diff an old match (if any) against a new one.
    ///
    /// A route is `refreshed` rather than `retained` when any param its own
    /// pattern captures has a different value in the new match.
    pub fn between(index: &RouteIndex, old: Option<&MatchResult>, new: &MatchResult) -> Self {
        let mut diff = Self::default();

        let old_ids: Vec<&str> = old
            .map(|m| m.matched_route_ids.iter().map(String::as_str).collect())
            .unwrap_or_default();

        for id in &new.matched_route_ids {
            if !old_ids.contains(&id.as_str()) {
                diff.entered.push(id.clone());
                continue;
            }
            let own_changed = index.get(id).is_some_and(|node| {
                node.own_param_names().iter().any(|name| {
                    let old_value = old.and_then(|m| m.raw_params.get(name));
                    old_value != new.raw_params.get(name)
                })
            });
            if own_changed {
                diff.refreshed.push(id.clone());
            } else {
                diff.retained.push(id.clone());
            }
        }

        // Teardown order: leaf first
        for id in old_ids.iter().rev() {
            if !new.matched_route_ids.iter().any(|n| n == id) {
                diff.exited.push((*id).to_string());
            }
        }

        diff
    }
}

// ============================================================================
// Transition handle
// ============================================================================

/// A begun-but-uncommitted transition
#[derive(Debug, Clone)]
pub struct TransitionHandle {
    generation: u64,
    /// The resolved destination
    pub location: Location,
    /// The destination match (`None` when nothing matched)
    pub matches: Option<MatchResult>,
    /// Per-route diff against the current match
    pub diff: MatchDiff,
    /// What commit will do
    pub outcome: TransitionOutcome,
    /// History action requested by the caller
    pub action: HistoryAction,
    contexts: HashMap<RouteId, Value>,
}

impl TransitionHandle {
    /// Generation counter identifying this transition
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Context value attached by a route's `before_load` hook
    pub fn context(&self, route_id: &str) -> Option<&Value> {
        self.contexts.get(route_id)
    }

    /// Check if commit would update state
    pub fn is_ready(&self) -> bool {
        matches!(self.outcome, TransitionOutcome::Ready)
    }

    /// The redirect target, when a hook redirected
    pub fn redirect_target(&self) -> Option<&NavigationTarget> {
        match &self.outcome {
            TransitionOutcome::Redirected(target) => Some(target),
            _ => None,
        }
    }
}

// ============================================================================
// Transition controller
// ============================================================================

/// Serializes navigation for one routing surface.
///
/// Owns history, the current location and match, and the generation counter
/// that implements last-request-wins cancellation.
///
/// # Example
///
/// ```
/// use waymark::{
///     register_routes, Location, NavigationRequest, NavigationTarget, RouteDef,
///     TransitionController, TransitionState,
/// };
/// use std::sync::Arc;
///
/// let index = Arc::new(
///     register_routes(RouteDef::root().child(RouteDef::new("posts"))).unwrap(),
/// );
/// let mut controller = TransitionController::new(index, Location::new("/")).unwrap();
///
/// let handle = controller
///     .begin_transition(&NavigationRequest::push(NavigationTarget::to("/posts")))
///     .unwrap();
/// assert_eq!(controller.commit(&handle), TransitionState::Committed);
/// assert_eq!(controller.current_location().pathname, "/posts");
/// ```
pub struct TransitionController {
    index: Arc<RouteIndex>,
    history: History,
    current_match: Option<MatchResult>,
    state: TransitionState,
    generation: u64,
    pending: Option<u64>,
    policy: ParseErrorPolicy,
    loader_results: HashMap<RouteId, (u64, Value)>,
}

impl TransitionController {
    /// Create a controller positioned at an initial location
    pub fn new(index: Arc<RouteIndex>, initial: Location) -> Result<Self, RouterError> {
        let current_match = match match_path_with_policy(
            &index,
            &initial.pathname,
            ParseErrorPolicy::Propagate,
        )? {
            MatchOutcome::Matched(result) => Some(result),
            MatchOutcome::NoMatch => None,
        };

        Ok(Self {
            index,
            history: History::new(initial),
            current_match,
            state: TransitionState::Idle,
            generation: 0,
            pending: None,
            policy: ParseErrorPolicy::Propagate,
            loader_results: HashMap::new(),
        })
    }

    /// Set the codec failure policy used while matching
    pub fn with_policy(mut self, policy: ParseErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The current committed location
    pub fn current_location(&self) -> &Location {
        self.history.current()
    }

    /// The current committed match, if the location matched
    pub fn current_match(&self) -> Option<&MatchResult> {
        self.current_match.as_ref()
    }

    /// Lifecycle state of the most recent transition
    pub fn state(&self) -> TransitionState {
        self.state
    }

    /// The underlying history stack
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The route index this controller navigates
    pub fn index(&self) -> &Arc<RouteIndex> {
        &self.index
    }

    /// Begin a transition: resolve, match, and run `before_load` hooks.
    ///
    /// Returns a handle to pass to [`commit`](Self::commit). Beginning a new
    /// transition supersedes any still-pending handle.
    pub fn begin_transition(
        &mut self,
        request: &NavigationRequest,
    ) -> Result<TransitionHandle, RouterError> {
        let location = resolve_location(
            &self.index,
            self.current_location(),
            self.current_match.as_ref(),
            &request.target,
        )?;

        let outcome = match_path_with_policy(&self.index, &location.pathname, self.policy)?;

        self.generation += 1;
        let generation = self.generation;
        self.pending = Some(generation);
        self.state = TransitionState::Pending;

        let MatchOutcome::Matched(matches) = outcome else {
            debug_log!("transition {}: no match for '{}'", generation, location.pathname);
            return Ok(TransitionHandle {
                generation,
                location,
                matches: None,
                diff: MatchDiff::default(),
                outcome: TransitionOutcome::NotFound,
                action: request.action,
                contexts: HashMap::new(),
            });
        };

        // Hooks run top-down; the first redirect or not-found wins
        let mut contexts = HashMap::new();
        let mut outcome = TransitionOutcome::Ready;
        for route_id in &matches.matched_route_ids {
            let Some(node) = self.index.get(route_id) else {
                continue;
            };
            let Some(hook) = node.before_load_hook() else {
                continue;
            };
            let context = BeforeLoadContext {
                route_id,
                location: &location,
                matches: &matches,
            };
            match hook(&context) {
                BeforeLoadResult::Proceed => {}
                BeforeLoadResult::ProceedWith(value) => {
                    contexts.insert(route_id.clone(), value);
                }
                BeforeLoadResult::Redirect(target) => {
                    debug_log!("transition {}: redirected by '{}'", generation, route_id);
                    outcome = TransitionOutcome::Redirected(target);
                    break;
                }
                BeforeLoadResult::NotFound => {
                    debug_log!("transition {}: not-found by '{}'", generation, route_id);
                    outcome = TransitionOutcome::NotFound;
                    break;
                }
            }
        }

        let diff = MatchDiff::between(&self.index, self.current_match.as_ref(), &matches);

        Ok(TransitionHandle {
            generation,
            location,
            matches: Some(matches),
            diff,
            outcome,
            action: request.action,
            contexts,
        })
    }

    /// Check whether a handle is still the latest begun transition
    pub fn is_current(&self, handle: &TransitionHandle) -> bool {
        self.pending == Some(handle.generation)
    }

    /// Commit a begun transition.
    ///
    /// A superseded handle commits as [`TransitionState::Cancelled`] and
    /// changes nothing; otherwise history and current state update per the
    /// handle's outcome.
    pub fn commit(&mut self, handle: &TransitionHandle) -> TransitionState {
        if !self.is_current(handle) {
            debug_log!("transition {}: superseded, dropping commit", handle.generation);
            return TransitionState::Cancelled;
        }
        self.pending = None;

        match &handle.outcome {
            TransitionOutcome::Redirected(_) => {
                self.state = TransitionState::Redirected;
            }
            TransitionOutcome::NotFound => {
                self.state = TransitionState::NotFound;
            }
            TransitionOutcome::Ready => {
                match handle.action {
                    HistoryAction::Push => {
                        self.history.push(handle.location.clone());
                    }
                    HistoryAction::Replace => {
                        self.history.replace(handle.location.clone());
                    }
                    // The host already traversed its own history
                    HistoryAction::Pop => {
                        self.history.replace(handle.location.clone());
                    }
                }
                for route_id in &handle.diff.exited {
                    self.loader_results.remove(route_id);
                }
                self.current_match = handle.matches.clone();
                self.state = TransitionState::Committed;
            }
        }

        self.state
    }

    /// Loader contexts for the routes the handle enters or refreshes, in
    /// top-down order, restricted to routes that registered a loader.
    pub fn loader_contexts(&self, handle: &TransitionHandle) -> Vec<LoaderContext> {
        let Some(matches) = handle.matches.as_ref() else {
            return Vec::new();
        };

        matches
            .matched_route_ids
            .iter()
            .filter(|id| {
                handle.diff.entered.contains(id) || handle.diff.refreshed.contains(id)
            })
            .filter(|id| {
                self.index
                    .get(id)
                    .is_some_and(|node| node.loader_hook().is_some())
            })
            .map(|id| LoaderContext {
                route_id: id.clone(),
                generation: handle.generation,
                location: handle.location.clone(),
                raw_params: matches.raw_params.clone(),
                typed_params: matches.typed_params.clone(),
            })
            .collect()
    }

    /// Store a loader result, dropping it when it belongs to a superseded
    /// generation. Returns whether the result was kept.
    pub fn store_loader_result(
        &mut self,
        generation: u64,
        route_id: impl Into<RouteId>,
        value: Value,
    ) -> bool {
        if generation != self.generation {
            debug_log!("dropping stale loader result from generation {}", generation);
            return false;
        }
        self.loader_results.insert(route_id.into(), (generation, value));
        true
    }

    /// The stored loader result for a route, if any
    pub fn loader_result(&self, route_id: &str) -> Option<&Value> {
        self.loader_results.get(route_id).map(|(_, value)| value)
    }

    /// Traverse back in history and re-match the landing location
    pub fn back(&mut self) -> Result<Option<NavigationEvent>, RouterError> {
        let Some(event) = self.history.back() else {
            return Ok(None);
        };
        self.rematch_current()?;
        Ok(Some(event))
    }

    /// Traverse forward in history and re-match the landing location
    pub fn forward(&mut self) -> Result<Option<NavigationEvent>, RouterError> {
        let Some(event) = self.history.forward() else {
            return Ok(None);
        };
        self.rematch_current()?;
        Ok(Some(event))
    }

    /// Re-match after a history traversal; traversal supersedes any pending
    /// transition.
    fn rematch_current(&mut self) -> Result<(), RouterError> {
        self.generation += 1;
        self.pending = None;

        let pathname = self.history.current().pathname.clone();
        self.current_match = match match_path_with_policy(&self.index, &pathname, self.policy)? {
            MatchOutcome::Matched(result) => Some(result),
            MatchOutcome::NoMatch => None,
        };
        self.state = TransitionState::Committed;
        Ok(())
    }
}

impl std::fmt::Debug for TransitionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionController")
            .field("current_location", &self.history.current())
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("pending", &self.pending)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
