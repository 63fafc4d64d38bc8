//! Collaborator contracts the transition engine is driven through.
//!
//! The engine never owns elements. It refers to them by [`ElementId`], a
//! generation-checked handle, writes interpolated values through an
//! [`ElementHost`], reads time from a [`FrameClock`], and delivers lifecycle
//! events to an [`EventSink`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use bitflags::bitflags;
use slotmap::SlotMap;

use crate::dispatcher::TransitionDispatcher;
use crate::events::TransitionEvent;
use crate::property::StylePropertyId;
use crate::value::StyleValue;

slotmap::new_key_type! {
    /// Handle to an externally owned UI element.
    ///
    /// Handles carry a generation, so one that outlives its element is
    /// detected instead of aliasing a newer element in the same slot.
    pub struct ElementId;
}

/// Monotonic millisecond time source, read once per update.
pub trait FrameClock {
    fn now_ms(&self) -> i64;
}

/// Wall clock measured from its own creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for SystemClock {
    fn now_ms(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX)
    }
}

/// A clock advanced by hand.
///
/// Clones share the same time, so a test can keep one handle while the
/// dispatcher owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ms(&self, now: i64) {
        self.now.store(now, Ordering::Relaxed);
    }

    pub fn advance_ms(&self, delta: i64) {
        self.now.fetch_add(delta, Ordering::Relaxed);
    }
}

impl FrameClock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::Relaxed)
    }
}

/// The element tree as seen by the transition engine.
pub trait ElementHost {
    /// Returns false once the element behind `owner` has been removed.
    fn contains(&self, owner: ElementId) -> bool;

    /// Writes an interpolated value into the element's resolved style and
    /// marks it for repaint (and relayout, if the property requires it).
    fn apply_interpolated_value(
        &mut self,
        owner: ElementId,
        property: StylePropertyId,
        value: &StyleValue,
    );
}

/// Access handed to event listeners while events are being delivered.
///
/// Listeners may start or cancel transitions from here; anything they queue
/// is delivered on the next update.
pub struct EventContext<'a> {
    pub transitions: &'a mut TransitionDispatcher,
    pub host: &'a mut dyn ElementHost,
}

/// Receiver of transition lifecycle events.
pub trait EventSink {
    fn send(&mut self, event: &TransitionEvent, cx: &mut EventContext<'_>);

    /// Called before a batch of events is delivered.
    fn open_gate(&mut self) {}

    /// Called after the last event of a batch; held events may be released.
    fn close_gate(&mut self) {}
}

impl EventSink for Vec<TransitionEvent> {
    fn send(&mut self, event: &TransitionEvent, _cx: &mut EventContext<'_>) {
        self.push(*event);
    }
}

bitflags! {
    /// Work an element needs after its style changed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u8 {
        const REPAINT = 1 << 0;
        const LAYOUT = 1 << 1;
    }
}

/// Resolved style of one element in an [`ElementArena`].
#[derive(Debug, Clone, Default)]
pub struct ElementStyle {
    values: HashMap<StylePropertyId, StyleValue>,
    dirty: DirtyFlags,
}

impl ElementStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, property: StylePropertyId, value: impl Into<StyleValue>) -> Self {
        self.values.insert(property, value.into());
        self
    }

    pub fn get(&self, property: StylePropertyId) -> Option<&StyleValue> {
        self.values.get(&property)
    }

    pub fn set(&mut self, property: StylePropertyId, value: StyleValue) {
        self.values.insert(property, value);
        self.dirty |= if property.affects_layout() {
            DirtyFlags::REPAINT | DirtyFlags::LAYOUT
        } else {
            DirtyFlags::REPAINT
        };
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn take_dirty(&mut self) -> DirtyFlags {
        std::mem::take(&mut self.dirty)
    }
}

/// Minimal element tree: a slot map of resolved styles.
#[derive(Debug, Default)]
pub struct ElementArena {
    elements: SlotMap<ElementId, ElementStyle>,
}

impl ElementArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, style: ElementStyle) -> ElementId {
        self.elements.insert(style)
    }

    /// Removes an element. Its transitions must be canceled by the caller
    /// (or they are purged as stale on the next update).
    pub fn remove(&mut self, id: ElementId) -> Option<ElementStyle> {
        self.elements.remove(id)
    }

    pub fn get(&self, id: ElementId) -> Option<&ElementStyle> {
        self.elements.get(id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementStyle> {
        self.elements.get_mut(id)
    }

    pub fn value(&self, id: ElementId, property: StylePropertyId) -> Option<StyleValue> {
        self.get(id).and_then(|style| style.get(property)).copied()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl ElementHost for ElementArena {
    fn contains(&self, owner: ElementId) -> bool {
        self.elements.contains_key(owner)
    }

    fn apply_interpolated_value(
        &mut self,
        owner: ElementId,
        property: StylePropertyId,
        value: &StyleValue,
    ) {
        if let Some(style) = self.elements.get_mut(owner) {
            style.set(property, *value);
        }
    }
}
