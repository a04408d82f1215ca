// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session record of post ids already delivered to the sink.
//!
//! The set is thrown away and rebuilt on every query change. By default it
//! grows for as long as a session lives; with a capacity the oldest ids are
//! evicted first, which lets a very old post match again in a long session.

use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
    /// Insertion order, only tracked when bounded
    order: VecDeque<String>,
    capacity: Option<usize>,
}

impl Deduplicator {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            seen: HashSet::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Whether `id` was already delivered in this session.
    pub fn seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn mark_seen(&mut self, id: &str) {
        if !self.seen.insert(id.to_string()) {
            return;
        }

        let Some(capacity) = self.capacity else {
            return;
        };
        self.order.push_back(id.to_string());
        while self.order.len() > capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}
