//! Priority levels and a priority-ordered list.

use serde::{Deserialize, Serialize};

/// Ordering weight used by types (sibling tie-break) and validators.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Priority(i32);

impl Priority {
    pub const MINIMUM: Priority = Priority(i32::MIN);
    pub const LOW: Priority = Priority(0);
    pub const NORMAL: Priority = Priority(20);
    pub const HIGH: Priority = Priority(100);
    pub const MAXIMUM: Priority = Priority(i32::MAX);

    pub const fn of(level: i32) -> Self {
        Priority(level)
    }

    pub const fn level(self) -> i32 {
        self.0
    }

    pub fn plus(self, amount: i32) -> Self {
        Priority(self.0.saturating_add(amount))
    }
}

/// Items kept in descending priority; equal priorities keep insertion order.
#[derive(Debug, Clone)]
pub struct PriorityList<T> {
    entries: Vec<(Priority, usize, T)>,
    inserted: usize,
}

impl<T> Default for PriorityList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            inserted: 0,
        }
    }
}

impl<T> PriorityList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, priority: Priority, item: T) {
        let seq = self.inserted;
        self.inserted += 1;
        let at = self
            .entries
            .iter()
            .position(|(p, s, _)| (*p, std::cmp::Reverse(*s)) < (priority, std::cmp::Reverse(seq)))
            .unwrap_or(self.entries.len());
        self.entries.insert(at, (priority, seq, item));
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, _, item)| item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
