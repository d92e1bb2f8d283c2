// ── Runtime session configuration ──
//
// These types describe how a session behaves at runtime. They never touch
// disk -- the embedding application parses files/flags and hands a
// `SessionConfig` in.

use connwatch_bus::Category;

/// Which notification categories are forwarded to event subscribers.
///
/// The replica is patched for every category regardless; interest only
/// controls forwarding of the normalized change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyInterest {
    pub manager: bool,
    pub technology: bool,
    pub service: bool,
}

impl NotifyInterest {
    /// Forward events for every category.
    pub const fn all() -> Self {
        Self {
            manager: true,
            technology: true,
            service: true,
        }
    }

    /// Forward nothing; the replica still tracks remote state.
    pub const fn none() -> Self {
        Self {
            manager: false,
            technology: false,
            service: false,
        }
    }

    pub fn includes(&self, category: Category) -> bool {
        match category {
            Category::Manager => self.manager,
            Category::Technology => self.technology,
            Category::Service => self.service,
        }
    }
}

impl Default for NotifyInterest {
    fn default() -> Self {
        Self::all()
    }
}

/// Configuration for a single session against the remote service.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Object-path namespace the remote service roots its objects under.
    /// Notification paths arriving as bare tails are qualified against it.
    pub namespace: String,
    /// Which categories of change events are forwarded to subscribers.
    pub interest: NotifyInterest,
    /// Capacity of the inbound command queue.
    pub command_queue: usize,
    /// Capacity of the event broadcast channel. Slow subscribers that fall
    /// further behind than this lose events (best-effort forwarding).
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            namespace: "/net/connman".into(),
            interest: NotifyInterest::default(),
            command_queue: 64,
            event_capacity: 256,
        }
    }
}
