//! Navigation history management
//!
//! An in-memory history stack over [`Location`] entries, kept by the
//! transition controller as the source of truth for back/forward traversal.
//! Pushing truncates any forward history; a configurable size limit drops the
//! oldest entries while keeping the current one reachable.

use serde::{Deserialize, Serialize};

use crate::location::Location;

/// Direction of a history operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDirection {
    /// A new entry was pushed
    Forward,
    /// The current entry was replaced in place
    Replace,
    /// Traversal to an older entry
    Back,
}

/// Navigation event emitted by history operations
#[derive(Debug, Clone)]
pub struct NavigationEvent {
    /// Previous location
    pub from: Option<Location>,
    /// New current location
    pub to: Location,
    /// Direction of the operation
    pub direction: NavigationDirection,
}

/// Navigation history stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    entries: Vec<Location>,
    /// Current position in history
    current: usize,
    /// Maximum history size (0 = unlimited)
    max_size: usize,
}

impl History {
    /// Create a new history with an initial location
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![initial],
            current: 0,
            max_size: 1000, // Default limit
        }
    }

    /// Create with custom max size
    pub fn with_max_size(initial: Location, max_size: usize) -> Self {
        Self {
            entries: vec![initial],
            current: 0,
            max_size,
        }
    }

    /// Get the current location
    pub fn current(&self) -> &Location {
        &self.entries[self.current]
    }

    /// Push a new location onto history
    ///
    /// This truncates any forward history and adds the new entry
    pub fn push(&mut self, location: Location) -> NavigationEvent {
        let from = Some(self.current().clone());

        // Remove forward history when pushing
        self.entries.truncate(self.current + 1);

        self.entries.push(location.clone());
        self.current += 1;

        self.enforce_size_limit();

        NavigationEvent {
            from,
            to: location,
            direction: NavigationDirection::Forward,
        }
    }

    /// Replace the current entry
    pub fn replace(&mut self, location: Location) -> NavigationEvent {
        let from = Some(self.current().clone());

        self.entries[self.current] = location.clone();

        NavigationEvent {
            from,
            to: location,
            direction: NavigationDirection::Replace,
        }
    }

    /// Go back in history
    pub fn back(&mut self) -> Option<NavigationEvent> {
        if !self.can_go_back() {
            return None;
        }
        let from = Some(self.current().clone());
        self.current -= 1;

        Some(NavigationEvent {
            from,
            to: self.current().clone(),
            direction: NavigationDirection::Back,
        })
    }

    /// Go forward in history
    pub fn forward(&mut self) -> Option<NavigationEvent> {
        if !self.can_go_forward() {
            return None;
        }
        let from = Some(self.current().clone());
        self.current += 1;

        Some(NavigationEvent {
            from,
            to: self.current().clone(),
            direction: NavigationDirection::Forward,
        })
    }

    /// Check if can go back
    pub fn can_go_back(&self) -> bool {
        self.current > 0
    }

    /// Check if can go forward
    pub fn can_go_forward(&self) -> bool {
        self.current < self.entries.len() - 1
    }

    /// Clear all history, restarting from the given location
    pub fn clear(&mut self, initial: Location) {
        self.entries.clear();
        self.entries.push(initial);
        self.current = 0;
    }

    /// Get history length
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if history is empty (should never be true in practice)
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get all entries (for serialization)
    pub fn entries(&self) -> &[Location] {
        &self.entries
    }

    /// Get current index
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Restore from entries (for deserialization)
    pub fn restore(&mut self, entries: Vec<Location>, current: usize) {
        if !entries.is_empty() && current < entries.len() {
            self.entries = entries;
            self.current = current;
        }
    }

    /// Enforce maximum size limit
    fn enforce_size_limit(&mut self) {
        if self.max_size > 0 && self.entries.len() > self.max_size {
            // Remove oldest entries, keeping the current location reachable
            let excess = self.entries.len() - self.max_size;
            self.entries.drain(0..excess);
            self.current = self.current.saturating_sub(excess);
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Location::new("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loc(pathname: &str) -> Location {
        Location::new(pathname)
    }

    #[test]
    fn test_history_creation() {
        let history = History::default();
        assert_eq!(history.current().pathname, "/");
        assert_eq!(history.len(), 1);
        assert!(!history.can_go_back());
        assert!(!history.can_go_forward());
    }

    #[test]
    fn test_history_push() {
        let mut history = History::default();

        history.push(loc("/users"));
        assert_eq!(history.current().pathname, "/users");
        assert_eq!(history.len(), 2);
        assert!(history.can_go_back());
        assert!(!history.can_go_forward());

        history.push(loc("/users/123"));
        assert_eq!(history.current().pathname, "/users/123");
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_history_back_forward() {
        let mut history = History::default();
        history.push(loc("/page1"));
        history.push(loc("/page2"));

        assert_eq!(history.current().pathname, "/page2");

        history.back();
        assert_eq!(history.current().pathname, "/page1");
        assert!(history.can_go_back());
        assert!(history.can_go_forward());

        history.forward();
        assert_eq!(history.current().pathname, "/page2");
        assert!(!history.can_go_forward());
    }

    #[test]
    fn test_history_truncation_on_push() {
        let mut history = History::default();
        history.push(loc("/page1"));
        history.push(loc("/page2"));
        history.back();

        assert_eq!(history.current().pathname, "/page1");
        assert_eq!(history.len(), 3);

        // Push a new page - should truncate forward history
        history.push(loc("/page3"));
        assert_eq!(history.current().pathname, "/page3");
        assert_eq!(history.len(), 3); // /, /page1, /page3
        assert!(!history.can_go_forward());
    }

    #[test]
    fn test_history_replace() {
        let mut history = History::default();
        history.push(loc("/page1"));

        history.replace(loc("/page2"));
        assert_eq!(history.current().pathname, "/page2");
        assert_eq!(history.len(), 2); // Still 2 entries

        history.back();
        assert_eq!(history.current().pathname, "/");
    }

    #[test]
    fn test_history_clear() {
        let mut history = History::default();
        history.push(loc("/page1"));
        history.push(loc("/page2"));

        history.clear(loc("/home"));
        assert_eq!(history.current().pathname, "/home");
        assert_eq!(history.len(), 1);
        assert!(!history.can_go_back());
    }

    #[test]
    fn test_history_entry_keeps_state() {
        let mut history = History::default();

        history.push(loc("/page1").with_state(json!({"scrollY": 100})));

        let entry = history.current();
        assert_eq!(entry.pathname, "/page1");
        assert_eq!(entry.state, Some(json!({"scrollY": 100})));
    }

    #[test]
    fn test_history_max_size() {
        let mut history = History::with_max_size(loc("/"), 3);

        history.push(loc("/page1"));
        history.push(loc("/page2"));
        history.push(loc("/page3")); // Should trigger limit
        history.push(loc("/page4")); // Should remove oldest

        assert_eq!(history.len(), 3);
        assert_eq!(history.current().pathname, "/page4");

        // Oldest entry "/" should be removed
        history.back();
        history.back();
        assert_eq!(history.current().pathname, "/page2");
    }

    #[test]
    fn test_history_restore() {
        let mut history = History::default();

        let entries = vec![loc("/"), loc("/page1"), loc("/page2")];
        history.restore(entries, 1);

        assert_eq!(history.len(), 3);
        assert_eq!(history.current().pathname, "/page1");
        assert!(history.can_go_back());
        assert!(history.can_go_forward());
    }

    #[test]
    fn test_navigation_event() {
        let mut history = History::default();

        let event = history.push(loc("/users"));
        assert_eq!(event.from.unwrap().pathname, "/");
        assert_eq!(event.to.pathname, "/users");
        assert_eq!(event.direction, NavigationDirection::Forward);

        let event = history.back().unwrap();
        assert_eq!(event.from.unwrap().pathname, "/users");
        assert_eq!(event.to.pathname, "/");
        assert_eq!(event.direction, NavigationDirection::Back);
    }

    #[test]
    fn test_empty_history_boundaries() {
        let mut history = History::default();

        assert!(history.back().is_none());
        assert!(history.forward().is_none());
        assert!(!history.can_go_back());
        assert!(!history.can_go_forward());
    }
}
