//! Logging abstraction layer
//!
//! Thin macro shims over either the `log` or the `tracing` crate, selected
//! by feature flag at compile time (the two are mutually exclusive). Only
//! the levels the crate emits are provided: trace for per-candidate matcher
//! chatter, debug for registration and transition milestones.
//!
//! ```ignore
//! use waymark::{debug_log, trace_log};
//!
//! trace_log!("trying candidate '{}'", route_id);
//! debug_log!("transition {} committed", generation);
//! ```

/// Trace-level logging
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
    };
}

/// Debug-level logging
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
    };
}
