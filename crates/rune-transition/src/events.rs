//! Transition lifecycle events and the coalescing queue they wait in.
//!
//! Every transition produces `Run`, then `Start` once its delay has elapsed,
//! then either `End` or `Cancel`. Events raised during one update are
//! delivered at the top of the next one.
//!
//! Within one delivery batch the queue keeps a per-key delta of what is
//! pending, so a cancel that lands before the transition was ever observed
//! swallows its `Run`/`Start`:
//!
//! ```text
//! pending          push        pending after
//! -------          ----        -------------
//! Run              Cancel      Cancel
//! Run Start        Cancel      Cancel
//! Cancel           Cancel      Cancel          (idempotent)
//! Cancel           Run         Cancel Run      (retarget)
//! Cancel Run       Cancel      Cancel
//! ```

use std::collections::HashMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::host::ElementId;
use crate::property::StylePropertyId;
use crate::registry::PropertyKey;

/// Lifecycle event of a single transition.
///
/// `elapsed_time` is in seconds and excludes the delay phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransitionEvent {
    /// The transition was created (it may still be in its delay).
    Run {
        target: ElementId,
        property: StylePropertyId,
        elapsed_time: f32,
    },
    /// The delay elapsed and the value started moving.
    Start {
        target: ElementId,
        property: StylePropertyId,
        elapsed_time: f32,
    },
    /// The transition reached its end value.
    End {
        target: ElementId,
        property: StylePropertyId,
        elapsed_time: f32,
    },
    /// The transition was removed before reaching its end value.
    Cancel {
        target: ElementId,
        property: StylePropertyId,
        elapsed_time: f32,
    },
}

/// Discriminant of a [`TransitionEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionEventKind {
    Run,
    Start,
    End,
    Cancel,
}

impl TransitionEvent {
    pub fn new(kind: TransitionEventKind, key: PropertyKey, elapsed_ms: i64) -> Self {
        let (target, property) = (key.owner, key.property);
        let elapsed_time = elapsed_ms as f32 / 1000.0;
        match kind {
            TransitionEventKind::Run => Self::Run {
                target,
                property,
                elapsed_time,
            },
            TransitionEventKind::Start => Self::Start {
                target,
                property,
                elapsed_time,
            },
            TransitionEventKind::End => Self::End {
                target,
                property,
                elapsed_time,
            },
            TransitionEventKind::Cancel => Self::Cancel {
                target,
                property,
                elapsed_time,
            },
        }
    }

    pub fn kind(&self) -> TransitionEventKind {
        match self {
            Self::Run { .. } => TransitionEventKind::Run,
            Self::Start { .. } => TransitionEventKind::Start,
            Self::End { .. } => TransitionEventKind::End,
            Self::Cancel { .. } => TransitionEventKind::Cancel,
        }
    }

    /// Get the element this event is addressed to.
    pub fn target(&self) -> ElementId {
        match self {
            Self::Run { target, .. }
            | Self::Start { target, .. }
            | Self::End { target, .. }
            | Self::Cancel { target, .. } => *target,
        }
    }

    pub fn property(&self) -> StylePropertyId {
        match self {
            Self::Run { property, .. }
            | Self::Start { property, .. }
            | Self::End { property, .. }
            | Self::Cancel { property, .. } => *property,
        }
    }

    /// Elapsed active time in seconds.
    pub fn elapsed_time(&self) -> f32 {
        match self {
            Self::Run { elapsed_time, .. }
            | Self::Start { elapsed_time, .. }
            | Self::End { elapsed_time, .. }
            | Self::Cancel { elapsed_time, .. } => *elapsed_time,
        }
    }

    pub fn key(&self) -> PropertyKey {
        PropertyKey::new(self.target(), self.property())
    }
}

bitflags! {
    /// Events pending for one key in the current batch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventFlags: u8 {
        const RUN = 1 << 0;
        const START = 1 << 1;
        const END = 1 << 2;
        const CANCEL = 1 << 3;
    }
}

impl From<TransitionEventKind> for EventFlags {
    fn from(kind: TransitionEventKind) -> Self {
        match kind {
            TransitionEventKind::Run => Self::RUN,
            TransitionEventKind::Start => Self::START,
            TransitionEventKind::End => Self::END,
            TransitionEventKind::Cancel => Self::CANCEL,
        }
    }
}

/// Coalescing state of one key in the current batch.
#[derive(Debug, Default)]
struct Pending {
    flags: EventFlags,
    /// Slots of the queued `Run`/`Start` events a `Cancel` supersedes.
    cancelable: SmallVec<[usize; 2]>,
}

/// FIFO of pending lifecycle events with per-key coalescing.
///
/// Superseded events are tombstoned in place, so a `Cancel` costs the same
/// however many events are queued.
#[derive(Debug, Default)]
pub struct EventQueue {
    slots: Vec<Option<TransitionEvent>>,
    live: usize,
    pending: HashMap<PropertyKey, Pending>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an event, applying the coalescing rules.
    ///
    /// Returns false if the event was absorbed by one already pending.
    pub fn push(&mut self, event: TransitionEvent) -> bool {
        let kind = event.kind();
        let pending = self.pending.entry(event.key()).or_default();

        if kind == TransitionEventKind::Cancel {
            for slot in pending.cancelable.drain(..) {
                if self.slots[slot].take().is_some() {
                    self.live -= 1;
                }
            }
            pending.flags.remove(EventFlags::RUN | EventFlags::START);
            if pending.flags.contains(EventFlags::CANCEL) {
                return false;
            }
        }

        if matches!(kind, TransitionEventKind::Run | TransitionEventKind::Start) {
            pending.cancelable.push(self.slots.len());
        }
        pending.flags.insert(kind.into());
        self.slots.push(Some(event));
        self.live += 1;
        true
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn len(&self) -> usize {
        self.live
    }

    /// Events pending for `key` in this batch.
    pub fn pending_for(&self, key: &PropertyKey) -> EventFlags {
        self.pending
            .get(key)
            .map(|pending| pending.flags)
            .unwrap_or_default()
    }

    /// Moves every queued event to `out` in FIFO order and starts a new batch.
    pub fn drain_into(&mut self, out: &mut Vec<TransitionEvent>) {
        out.extend(self.slots.drain(..).flatten());
        self.live = 0;
        self.pending.clear();
    }

    /// Moves the queued events addressed to `target` to `out`, keeping the rest.
    pub fn drain_for_target(&mut self, target: ElementId, out: &mut Vec<TransitionEvent>) {
        self.extract_target(target, |event| out.push(event));
    }

    /// Drops queued events addressed to `target`.
    pub fn discard_for_target(&mut self, target: ElementId) {
        self.extract_target(target, |_| {});
    }

    pub fn events_for_target(&self, target: ElementId) -> impl Iterator<Item = &TransitionEvent> {
        self.iter().filter(move |event| event.target() == target)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransitionEvent> {
        self.slots.iter().flatten()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.live = 0;
        self.pending.clear();
    }

    /// Hands `target`'s events to `f` and compacts the rest, dropping
    /// tombstones and renumbering the cancelable slots.
    fn extract_target(&mut self, target: ElementId, mut f: impl FnMut(TransitionEvent)) {
        let mut kept = 0;
        for slot in 0..self.slots.len() {
            let Some(event) = self.slots[slot] else {
                continue;
            };
            if event.target() == target {
                f(event);
            } else {
                self.slots[kept] = Some(event);
                kept += 1;
            }
        }
        self.slots.truncate(kept);
        self.live = kept;

        self.pending.retain(|key, _| key.owner != target);
        for pending in self.pending.values_mut() {
            pending.cancelable.clear();
        }
        for (slot, event) in self.slots.iter().enumerate() {
            let Some(event) = event else {
                continue;
            };
            if matches!(
                event.kind(),
                TransitionEventKind::Run | TransitionEventKind::Start
            ) {
                if let Some(pending) = self.pending.get_mut(&event.key()) {
                    pending.cancelable.push(slot);
                }
            }
        }
    }
}
