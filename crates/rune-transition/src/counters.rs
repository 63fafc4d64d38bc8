//! Per-element transition counters.
//!
//! Counts are kept across every value kind. They are not used to answer
//! queries; they exist so a caller can verify that an element with no
//! counted transitions appears in no registry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::host::ElementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnimationCounts {
    pub running: u32,
    pub completed: u32,
}

impl AnimationCounts {
    pub fn is_zero(&self) -> bool {
        self.running == 0 && self.completed == 0
    }
}

#[derive(Debug, Default)]
pub struct CounterTable {
    counts: HashMap<ElementId, AnimationCounts>,
}

impl CounterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner: ElementId) -> AnimationCounts {
        self.counts.get(&owner).copied().unwrap_or_default()
    }

    pub fn inc_running(&mut self, owner: ElementId) {
        self.counts.entry(owner).or_default().running += 1;
    }

    pub fn dec_running(&mut self, owner: ElementId) {
        self.update(owner, |c| c.running = c.running.saturating_sub(1));
    }

    pub fn inc_completed(&mut self, owner: ElementId) {
        self.counts.entry(owner).or_default().completed += 1;
    }

    pub fn dec_completed(&mut self, owner: ElementId) {
        self.update(owner, |c| c.completed = c.completed.saturating_sub(1));
    }

    /// Forgets `owner` entirely.
    pub fn remove(&mut self, owner: ElementId) -> AnimationCounts {
        self.counts.remove(&owner).unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementId, AnimationCounts)> + '_ {
        self.counts.iter().map(|(id, counts)| (*id, *counts))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn update(&mut self, owner: ElementId, f: impl FnOnce(&mut AnimationCounts)) {
        if let Some(counts) = self.counts.get_mut(&owner) {
            f(counts);
            if counts.is_zero() {
                self.counts.remove(&owner);
            }
        }
    }
}
