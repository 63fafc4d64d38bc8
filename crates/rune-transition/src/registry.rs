//! Struct-of-arrays storage for running and completed transitions.
//!
//! Entries live in parallel vectors indexed by a dense row number, with a side
//! map from [`PropertyKey`] to row. Removal swaps the last row into the hole,
//! so it is O(1) and only ever moves one other entry. Any row index held
//! across an `add` or `remove` on the same registry must be looked up again.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::easing::EasingFunction;
use crate::host::ElementId;
use crate::property::StylePropertyId;

/// Identity of one animated property on one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyKey {
    pub owner: ElementId,
    pub property: StylePropertyId,
}

impl PropertyKey {
    pub fn new(owner: ElementId, property: StylePropertyId) -> Self {
        Self { owner, property }
    }
}

/// Timing state of a running transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingData {
    /// Time the active phase begins, i.e. start request time plus delay.
    pub start_time_ms: i64,
    pub duration_ms: i32,
    pub delay_ms: i32,
    pub easing: EasingFunction,
    pub eased_progress: f32,
    pub reversing_shortening_factor: f32,
    pub started: bool,
}

impl TimingData {
    pub fn end_time_ms(&self) -> i64 {
        self.start_time_ms + i64::from(self.duration_ms)
    }

    /// Time spent in the active phase at `now`, clamped to `[0, duration]`.
    pub fn active_time_ms(&self, now: i64) -> i64 {
        (now - self.start_time_ms).clamp(0, i64::from(self.duration_ms))
    }
}

/// Value state of a running transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleData<T> {
    pub start_value: T,
    pub end_value: T,
    pub reversing_adjusted_start_value: T,
    pub current_value: T,
}

/// Keys in row order plus the key -> row map, shared by both registries.
#[derive(Debug)]
struct KeyIndex {
    keys: Vec<PropertyKey>,
    rows: HashMap<PropertyKey, usize>,
}

impl KeyIndex {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            rows: HashMap::with_capacity(capacity),
        }
    }

    fn get(&self, key: &PropertyKey) -> Option<usize> {
        self.rows.get(key).copied()
    }

    fn push(&mut self, key: PropertyKey) -> usize {
        let row = self.keys.len();
        debug_assert!(!self.rows.contains_key(&key), "duplicate key {key:?}");
        self.keys.push(key);
        self.rows.insert(key, row);
        row
    }

    /// Swap-removes `row`, re-pointing the key that moved into it.
    fn swap_remove(&mut self, row: usize) -> PropertyKey {
        let key = self.keys.swap_remove(row);
        self.rows.remove(&key);
        if let Some(moved) = self.keys.get(row) {
            self.rows.insert(*moved, row);
        }
        key
    }

    fn clear(&mut self, capacity: usize) {
        self.keys.clear();
        self.keys.shrink_to(capacity);
        self.rows.clear();
        self.rows.shrink_to(capacity);
    }

    fn check(&self) -> Result<(), String> {
        if self.keys.len() != self.rows.len() {
            return Err(format!(
                "{} rows but {} index entries",
                self.keys.len(),
                self.rows.len()
            ));
        }
        for (row, key) in self.keys.iter().enumerate() {
            match self.rows.get(key) {
                Some(&indexed) if indexed == row => {}
                other => return Err(format!("{key:?} at row {row} indexed as {other:?}")),
            }
        }
        Ok(())
    }
}

/// Running transitions of one value kind.
#[derive(Debug)]
pub struct TransitionRegistry<T> {
    index: KeyIndex,
    timing: Vec<TimingData>,
    style: Vec<StyleData<T>>,
    initial_capacity: usize,
}

impl<T: Copy> TransitionRegistry<T> {
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self {
            index: KeyIndex::with_capacity(initial_capacity),
            timing: Vec::with_capacity(initial_capacity),
            style: Vec::with_capacity(initial_capacity),
            initial_capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.index.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.keys.is_empty()
    }

    pub fn index_of(&self, key: &PropertyKey) -> Option<usize> {
        self.index.get(key)
    }

    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.index.get(key).is_some()
    }

    /// Appends a new entry and returns its row.
    pub fn add(&mut self, key: PropertyKey, timing: TimingData, style: StyleData<T>) -> usize {
        self.timing.push(timing);
        self.style.push(style);
        self.index.push(key)
    }

    /// Overwrites the entry at `row` in place, keeping its key.
    pub fn replace(&mut self, row: usize, timing: TimingData, style: StyleData<T>) {
        self.timing[row] = timing;
        self.style[row] = style;
    }

    /// Removes the entry at `row`; the last entry moves into `row`.
    pub fn remove(&mut self, row: usize) -> (PropertyKey, TimingData, StyleData<T>) {
        let timing = self.timing.swap_remove(row);
        let style = self.style.swap_remove(row);
        let key = self.index.swap_remove(row);
        (key, timing, style)
    }

    /// Removes every entry of `owner`, handing each to `removed` first.
    ///
    /// Rows are visited back to front so swap-removal never moves an
    /// unvisited row.
    pub fn remove_all_for(
        &mut self,
        owner: ElementId,
        mut removed: impl FnMut(PropertyKey, &TimingData, &StyleData<T>),
    ) {
        for row in (0..self.len()).rev() {
            if self.index.keys[row].owner == owner {
                let (key, timing, style) = self.remove(row);
                removed(key, &timing, &style);
            }
        }
    }

    /// Empties the registry and releases storage down to the initial capacity.
    pub fn clear(&mut self) {
        self.index.clear(self.initial_capacity);
        self.timing.clear();
        self.timing.shrink_to(self.initial_capacity);
        self.style.clear();
        self.style.shrink_to(self.initial_capacity);
    }

    pub fn keys(&self) -> &[PropertyKey] {
        &self.index.keys
    }

    pub fn key(&self, row: usize) -> PropertyKey {
        self.index.keys[row]
    }

    pub fn timing(&self, row: usize) -> &TimingData {
        &self.timing[row]
    }

    pub fn style(&self, row: usize) -> &StyleData<T> {
        &self.style[row]
    }

    pub fn entry_mut(&mut self, row: usize) -> (PropertyKey, &mut TimingData, &mut StyleData<T>) {
        (self.index.keys[row], &mut self.timing[row], &mut self.style[row])
    }

    pub fn capacity(&self) -> usize {
        self.timing.capacity()
    }

    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        if self.timing.len() != self.len() || self.style.len() != self.len() {
            return Err(format!(
                "column lengths differ: keys {}, timing {}, style {}",
                self.len(),
                self.timing.len(),
                self.style.len()
            ));
        }
        self.index.check()
    }
}

/// Settled end values of completed transitions of one value kind.
#[derive(Debug)]
pub struct CompletedRegistry<T> {
    index: KeyIndex,
    values: Vec<T>,
    initial_capacity: usize,
}

impl<T: Copy> CompletedRegistry<T> {
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self {
            index: KeyIndex::with_capacity(initial_capacity),
            values: Vec::with_capacity(initial_capacity),
            initial_capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index_of(&self, key: &PropertyKey) -> Option<usize> {
        self.index.get(key)
    }

    pub fn add(&mut self, key: PropertyKey, value: T) -> usize {
        self.values.push(value);
        self.index.push(key)
    }

    pub fn value(&self, row: usize) -> &T {
        &self.values[row]
    }

    pub fn remove(&mut self, row: usize) -> (PropertyKey, T) {
        let value = self.values.swap_remove(row);
        (self.index.swap_remove(row), value)
    }

    pub fn remove_all_for(&mut self, owner: ElementId, mut removed: impl FnMut(PropertyKey, T)) {
        for row in (0..self.len()).rev() {
            if self.index.keys[row].owner == owner {
                let (key, value) = self.remove(row);
                removed(key, value);
            }
        }
    }

    pub fn clear(&mut self) {
        self.index.clear(self.initial_capacity);
        self.values.clear();
        self.values.shrink_to(self.initial_capacity);
    }

    pub fn keys(&self) -> &[PropertyKey] {
        &self.index.keys
    }

    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        if self.values.len() != self.index.keys.len() {
            return Err(format!(
                "{} keys but {} values",
                self.index.keys.len(),
                self.values.len()
            ));
        }
        self.index.check()
    }
}
