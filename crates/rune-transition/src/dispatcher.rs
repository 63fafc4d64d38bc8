//! Transition dispatcher: the public entry point of the engine.
//!
//! The dispatcher routes each `(element, property)` request to the state
//! machine of the property's value kind, creating that machine the first time
//! the kind is used, and drives all machines once per frame.
//!
//! # Usage
//!
//! ```
//! use rune_transition::{
//!     EasingFunction, ElementArena, ElementStyle, ManualClock, StylePropertyId, StyleValue,
//!     TransitionDispatcher, TransitionEvent, TransitionSpec,
//! };
//!
//! let clock = ManualClock::new();
//! let mut transitions = TransitionDispatcher::new(Box::new(clock.clone()));
//! let mut elements = ElementArena::new();
//! let button = elements.insert(ElementStyle::new().with_value(StylePropertyId::Opacity, 0.0_f32));
//! let (from, to) = (StyleValue::from(0.0_f32), StyleValue::from(1.0_f32));
//!
//! let spec = TransitionSpec::new(200).with_easing(EasingFunction::Linear);
//! transitions.start_transition(button, StylePropertyId::Opacity, from, to, &spec);
//!
//! let mut events: Vec<TransitionEvent> = Vec::new();
//! clock.set_ms(100);
//! transitions.update(&mut elements, &mut events);
//! assert_eq!(
//!     elements.value(button, StylePropertyId::Opacity),
//!     Some(StyleValue::from(0.5_f32))
//! );
//! ```
//!
//! # Event timing
//!
//! Events raised while an update runs (and by calls made between updates)
//! are delivered at the top of the following [`update`](TransitionDispatcher::update),
//! before any transition advances. Listeners receive an [`EventContext`] and
//! may start or cancel transitions from inside a delivery; those events wait
//! for the next update in turn. The single exception is
//! [`cancel_all_animations_immediate`](TransitionDispatcher::cancel_all_animations_immediate),
//! which delivers an element's cancellations on the spot. Hosts call it
//! right before moving an element to another panel, while the events still
//! belong to the old one.

use std::collections::HashMap;
use std::fmt;

use rune_config::TransitionConfig;
use smallvec::SmallVec;

use crate::counters::{AnimationCounts, CounterTable};
use crate::error::{Result, TransitionError};
use crate::events::TransitionEvent;
use crate::host::{ElementHost, ElementId, EventContext, EventSink, FrameClock};
use crate::property::StylePropertyId;
use crate::registry::{PropertyKey, TimingData};
use crate::transition::TransitionSpec;
use crate::value::{
    Background, Color, Cursor, EnumValue, FontDefinition, Length, Rotate, Scale, StyleValue,
    TextShadow, TransformOrigin, Translate, ValueKind,
};
use crate::values::{TransitionTrack, Values};

/// Routes transition requests to per-kind state machines and drives them.
pub struct TransitionDispatcher {
    clock: Box<dyn FrameClock + Send>,
    /// Every machine created so far. Never shrinks, so slots in
    /// `track_by_kind` stay valid.
    tracks: Vec<Box<dyn TransitionTrack>>,
    track_by_kind: [Option<usize>; ValueKind::COUNT],
    counters: CounterTable,
    /// Pooled delivery buffer, swapped against each machine's queue.
    dispatch_buffer: Vec<TransitionEvent>,
    current_time_ms: i64,
    config: TransitionConfig,
}

impl fmt::Debug for TransitionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionDispatcher")
            .field("tracks", &self.tracks)
            .field("counters", &self.counters)
            .field("current_time_ms", &self.current_time_ms)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TransitionDispatcher {
    pub fn new(clock: Box<dyn FrameClock + Send>) -> Self {
        Self::with_config(&TransitionConfig::default(), clock)
    }

    pub fn with_config(config: &TransitionConfig, clock: Box<dyn FrameClock + Send>) -> Self {
        let current_time_ms = clock.now_ms();
        Self {
            clock,
            tracks: Vec::new(),
            track_by_kind: [None; ValueKind::COUNT],
            counters: CounterTable::new(),
            dispatch_buffer: Vec::with_capacity(config.initial_capacity),
            current_time_ms,
            config: config.clone(),
        }
    }

    /// Time read at the top of the last update.
    pub fn current_time_ms(&self) -> i64 {
        self.current_time_ms
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    /// Starts, retargets or reverses a transition of `property` on `owner`.
    ///
    /// Returns false when nothing is animating toward `end` afterwards; the
    /// caller applies `end` directly in that case. A value of the wrong kind
    /// for `property` is logged and treated the same way.
    pub fn start_transition(
        &mut self,
        owner: ElementId,
        property: StylePropertyId,
        start: StyleValue,
        end: StyleValue,
        spec: &TransitionSpec,
    ) -> bool {
        match self.try_start_transition(owner, property, start, end, spec) {
            Ok(started) => started,
            Err(err) => {
                log::warn!("Transition rejected: {err}");
                false
            }
        }
    }

    /// Like [`start_transition`](Self::start_transition), but reports a value
    /// kind mismatch as an error.
    pub fn try_start_transition(
        &mut self,
        owner: ElementId,
        property: StylePropertyId,
        start: StyleValue,
        end: StyleValue,
        spec: &TransitionSpec,
    ) -> Result<bool> {
        let expected = property.value_kind();
        for value in [&start, &end] {
            if value.kind() != expected {
                return Err(TransitionError::ValueKindMismatch {
                    property,
                    expected,
                    found: value.kind(),
                });
            }
        }

        let now = self.clock.now_ms();
        let slot = self.track_slot(expected);
        self.tracks[slot].start_transition(
            PropertyKey::new(owner, property),
            &start,
            &end,
            spec,
            now,
            &mut self.counters,
        )
    }

    /// Cancels the transition of `property` on `owner`, leaving its end value
    /// applied. Unknown keys are ignored.
    pub fn cancel_animation(
        &mut self,
        owner: ElementId,
        property: StylePropertyId,
        host: &mut dyn ElementHost,
    ) {
        let now = self.clock.now_ms();
        if let Some(slot) = self.track_by_kind[property.value_kind().index()] {
            self.tracks[slot].cancel(
                PropertyKey::new(owner, property),
                now,
                host,
                &mut self.counters,
            );
        }
    }

    /// Cancels every transition of `owner`. Hosts call this when an element
    /// is detached from the tree.
    pub fn cancel_all_animations_for(&mut self, owner: ElementId, host: &mut dyn ElementHost) {
        let now = self.clock.now_ms();
        for track in &mut self.tracks {
            track.cancel_all_for(owner, now, host, &mut self.counters);
        }

        let counts = self.counters.get(owner);
        if !counts.is_zero() {
            let err = TransitionError::InconsistentCounters {
                owner,
                running: counts.running,
                completed: counts.completed,
            };
            log::error!("{err}");
            debug_assert!(counts.is_zero(), "{err}");
            self.counters.remove(owner);
        }
    }

    /// Cancels every transition of every element.
    pub fn cancel_all_animations(&mut self, host: &mut dyn ElementHost) {
        let now = self.clock.now_ms();
        for track in &mut self.tracks {
            track.cancel_all(now, host, &mut self.counters);
        }
        if !self.counters.is_empty() {
            log::error!(
                "{} elements still counted after canceling all transitions",
                self.counters.len()
            );
            self.counters.clear();
        }
    }

    /// Cancels every transition of `owner` and delivers the resulting events
    /// right away instead of on the next update.
    ///
    /// Only for an element about to change panels: its cancellations must be
    /// delivered while it still belongs to the old one.
    pub fn cancel_all_animations_immediate(
        &mut self,
        owner: ElementId,
        host: &mut dyn ElementHost,
        sink: &mut dyn EventSink,
    ) {
        self.cancel_all_animations_for(owner, host);

        let mut batch = std::mem::take(&mut self.dispatch_buffer);
        for track in &mut self.tracks {
            track.take_events_for(owner, &mut batch);
        }
        self.deliver(&batch, host, sink);
        batch.clear();
        self.dispatch_buffer = batch;
    }

    /// Removes every entry of `owner` without events or value writes.
    pub fn purge_element(&mut self, owner: ElementId) {
        for track in &mut self.tracks {
            track.purge_owner(owner, &mut self.counters);
        }
        self.counters.remove(owner);
    }

    pub fn has_running_animation(&self, owner: ElementId, property: StylePropertyId) -> bool {
        self.track(property.value_kind())
            .is_some_and(|track| track.has_running(&PropertyKey::new(owner, property)))
    }

    /// Properties of `owner` with a running transition.
    pub fn get_all_animations(&self, owner: ElementId) -> SmallVec<[StylePropertyId; 8]> {
        let mut properties = SmallVec::new();
        for track in &self.tracks {
            track.running_properties(owner, &mut properties);
        }
        properties
    }

    pub fn has_running_animations(&self) -> bool {
        self.tracks.iter().any(|track| track.running_len() > 0)
    }

    pub fn running_count(&self) -> usize {
        self.tracks.iter().map(|track| track.running_len()).sum()
    }

    /// Returns true if any running transition animates a layout property.
    pub fn has_layout_animations(&self) -> bool {
        self.tracks.iter().any(|track| track.has_layout_animations())
    }

    /// Timing of the running transition of `property` on `owner`.
    pub fn running_timing(
        &self,
        owner: ElementId,
        property: StylePropertyId,
    ) -> Option<TimingData> {
        self.track(property.value_kind())?
            .timing(&PropertyKey::new(owner, property))
    }

    /// Eased progress computed by the last update.
    pub fn eased_progress(&self, owner: ElementId, property: StylePropertyId) -> Option<f32> {
        self.running_timing(owner, property)
            .map(|timing| timing.eased_progress)
    }

    /// Interpolated value written by the last update.
    pub fn current_value(
        &self,
        owner: ElementId,
        property: StylePropertyId,
    ) -> Option<StyleValue> {
        self.track(property.value_kind())?
            .current_value(&PropertyKey::new(owner, property))
    }

    /// End value of the last transition of `property` that ran to completion.
    pub fn completed_value(
        &self,
        owner: ElementId,
        property: StylePropertyId,
    ) -> Option<StyleValue> {
        self.track(property.value_kind())?
            .completed_value(&PropertyKey::new(owner, property))
    }

    /// Counted running and completed transitions of `owner`.
    pub fn animation_counts(&self, owner: ElementId) -> AnimationCounts {
        self.counters.get(owner)
    }

    /// Number of per-kind machines created so far.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Advances all transitions by one frame.
    ///
    /// Reads the clock once, delivers the events queued since the previous
    /// update, then advances every machine and writes interpolated values to
    /// `host`.
    pub fn update(&mut self, host: &mut dyn ElementHost, sink: &mut dyn EventSink) {
        let now = self.clock.now_ms();
        self.current_time_ms = now;

        let mut batch = std::mem::take(&mut self.dispatch_buffer);
        for track in &mut self.tracks {
            track.take_events(&mut batch);
        }
        self.deliver(&batch, host, sink);
        batch.clear();
        self.dispatch_buffer = batch;

        for track in &mut self.tracks {
            track.update(now, host, &mut self.counters);
        }

        if self.config.check_invariants {
            if let Err(err) = self.check_invariants() {
                log::error!("Transition invariant violated: {err}");
            }
        }
    }

    /// Verifies every registry and that the per-element counters match them.
    pub fn check_invariants(&self) -> Result<()> {
        let mut tallied: HashMap<ElementId, AnimationCounts> = HashMap::new();
        for track in &self.tracks {
            track.check_consistency()?;
            track.tally(&mut tallied);
        }

        for (owner, counts) in self.counters.iter() {
            if tallied.remove(&owner).unwrap_or_default() != counts {
                return Err(TransitionError::InconsistentCounters {
                    owner,
                    running: counts.running,
                    completed: counts.completed,
                });
            }
        }
        if let Some((&owner, _)) = tallied.iter().next() {
            return Err(TransitionError::InconsistentCounters {
                owner,
                running: 0,
                completed: 0,
            });
        }
        Ok(())
    }

    fn deliver(
        &mut self,
        batch: &[TransitionEvent],
        host: &mut dyn ElementHost,
        sink: &mut dyn EventSink,
    ) {
        if batch.is_empty() {
            return;
        }

        sink.open_gate();
        for event in batch {
            if self.config.log_events {
                log::trace!("Dispatching {event:?}");
            }
            let mut cx = EventContext {
                transitions: self,
                host: &mut *host,
            };
            sink.send(event, &mut cx);
        }
        sink.close_gate();
    }

    fn track(&self, kind: ValueKind) -> Option<&dyn TransitionTrack> {
        let slot = self.track_by_kind[kind.index()]?;
        Some(self.tracks[slot].as_ref())
    }

    fn track_slot(&mut self, kind: ValueKind) -> usize {
        if let Some(slot) = self.track_by_kind[kind.index()] {
            return slot;
        }

        let capacity = self.config.initial_capacity;
        let track: Box<dyn TransitionTrack> = match kind {
            ValueKind::Float => Box::new(Values::<f32>::with_capacity(capacity)),
            ValueKind::Int => Box::new(Values::<i32>::with_capacity(capacity)),
            ValueKind::Length => Box::new(Values::<Length>::with_capacity(capacity)),
            ValueKind::Color => Box::new(Values::<Color>::with_capacity(capacity)),
            ValueKind::Enum => Box::new(Values::<EnumValue>::with_capacity(capacity)),
            ValueKind::Background => Box::new(Values::<Background>::with_capacity(capacity)),
            ValueKind::Font => Box::new(Values::<FontDefinition>::with_capacity(capacity)),
            ValueKind::Cursor => Box::new(Values::<Cursor>::with_capacity(capacity)),
            ValueKind::TextShadow => Box::new(Values::<TextShadow>::with_capacity(capacity)),
            ValueKind::Scale => Box::new(Values::<Scale>::with_capacity(capacity)),
            ValueKind::Rotate => Box::new(Values::<Rotate>::with_capacity(capacity)),
            ValueKind::Translate => Box::new(Values::<Translate>::with_capacity(capacity)),
            ValueKind::TransformOrigin => {
                Box::new(Values::<TransformOrigin>::with_capacity(capacity))
            }
        };
        debug_assert_eq!(track.kind(), kind);
        log::debug!("Created {kind:?} transition track");

        let slot = self.tracks.len();
        self.tracks.push(track);
        self.track_by_kind[kind.index()] = Some(slot);
        slot
    }
}

static_assertions::assert_impl_all!(TransitionDispatcher: Send);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::EasingFunction;
    use crate::host::{ElementArena, ElementStyle, ManualClock};

    fn setup() -> (TransitionDispatcher, ManualClock, ElementArena, ElementId) {
        let clock = ManualClock::new();
        let dispatcher = TransitionDispatcher::new(Box::new(clock.clone()));
        let mut arena = ElementArena::new();
        let id = arena.insert(ElementStyle::new());
        (dispatcher, clock, arena, id)
    }

    fn linear(duration_ms: i32) -> TransitionSpec {
        TransitionSpec::new(duration_ms).with_easing(EasingFunction::Linear)
    }

    fn fade(d: &mut TransitionDispatcher, id: ElementId, duration_ms: i32) -> bool {
        d.start_transition(
            id,
            StylePropertyId::Opacity,
            0.0_f32.into(),
            1.0_f32.into(),
            &linear(duration_ms),
        )
    }

    #[test]
    fn test_tracks_created_lazily_per_kind() {
        let (mut d, _clock, _arena, id) = setup();
        assert_eq!(d.track_count(), 0);

        fade(&mut d, id, 100);
        d.start_transition(
            id,
            StylePropertyId::FlexGrow,
            0.0_f32.into(),
            1.0_f32.into(),
            &linear(100),
        );
        assert_eq!(d.track_count(), 1);

        d.start_transition(
            id,
            StylePropertyId::Width,
            Length::px(0.0).into(),
            Length::px(10.0).into(),
            &linear(100),
        );
        assert_eq!(d.track_count(), 2);
        assert_eq!(d.running_count(), 3);
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let (mut d, _clock, _arena, id) = setup();
        let err = d
            .try_start_transition(
                id,
                StylePropertyId::Width,
                0.0_f32.into(),
                1.0_f32.into(),
                &linear(100),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TransitionError::ValueKindMismatch {
                expected: ValueKind::Length,
                found: ValueKind::Float,
                ..
            }
        ));
        assert!(!d.start_transition(
            id,
            StylePropertyId::Width,
            0.0_f32.into(),
            1.0_f32.into(),
            &linear(100)
        ));
        assert_eq!(d.track_count(), 0);
    }

    #[test]
    fn test_queries_on_unknown_keys() {
        let (mut d, _clock, mut arena, id) = setup();
        assert!(!d.has_running_animation(id, StylePropertyId::Opacity));
        assert!(d.get_all_animations(id).is_empty());
        assert_eq!(d.eased_progress(id, StylePropertyId::Opacity), None);
        d.cancel_animation(id, StylePropertyId::Rotate, &mut arena);
        d.cancel_all_animations_for(id, &mut arena);
        assert!(d.animation_counts(id).is_zero());
    }

    #[test]
    fn test_get_all_animations_lists_running_properties() {
        let (mut d, _clock, _arena, id) = setup();
        fade(&mut d, id, 100);
        d.start_transition(
            id,
            StylePropertyId::Color,
            Color::BLACK.into(),
            Color::WHITE.into(),
            &linear(100),
        );
        let mut props = d.get_all_animations(id);
        props.sort();
        assert_eq!(props.as_slice(), &[StylePropertyId::Opacity, StylePropertyId::Color]);
        assert!(!d.has_layout_animations());

        d.start_transition(
            id,
            StylePropertyId::Height,
            Length::px(0.0).into(),
            Length::px(5.0).into(),
            &linear(100),
        );
        assert!(d.has_layout_animations());
    }

    #[test]
    fn test_cancel_all_resets_counters() {
        let (mut d, clock, mut arena, id) = setup();
        let other = arena.insert(ElementStyle::new());
        fade(&mut d, id, 100);
        fade(&mut d, other, 10);
        clock.set_ms(20);
        d.update(&mut arena, &mut Vec::<TransitionEvent>::new());
        assert_eq!(d.animation_counts(other).completed, 1);

        d.cancel_all_animations(&mut arena);
        assert!(!d.has_running_animations());
        assert!(d.animation_counts(id).is_zero());
        assert!(d.animation_counts(other).is_zero());
        d.check_invariants().unwrap();
    }

    #[test]
    fn test_purge_element_drops_entries_silently() {
        let (mut d, clock, mut arena, id) = setup();
        fade(&mut d, id, 100);
        d.purge_element(id);
        assert!(!d.has_running_animations());

        let mut events: Vec<TransitionEvent> = Vec::new();
        clock.set_ms(10);
        d.update(&mut arena, &mut events);
        assert!(events.is_empty());
        d.check_invariants().unwrap();
    }

    #[test]
    fn test_check_invariants_detects_counter_drift() {
        let (mut d, _clock, _arena, id) = setup();
        fade(&mut d, id, 100);
        d.check_invariants().unwrap();

        d.counters.inc_running(id);
        assert_eq!(
            d.check_invariants(),
            Err(TransitionError::InconsistentCounters {
                owner: id,
                running: 2,
                completed: 0,
            })
        );

        d.counters.dec_running(id);
        d.counters.dec_running(id);
        assert_eq!(
            d.check_invariants(),
            Err(TransitionError::InconsistentCounters {
                owner: id,
                running: 0,
                completed: 0,
            })
        );
    }

    #[test]
    fn test_debug_output() {
        let (d, _clock, _arena, _id) = setup();
        let text = format!("{d:?}");
        assert!(text.starts_with("TransitionDispatcher"));
    }
}
