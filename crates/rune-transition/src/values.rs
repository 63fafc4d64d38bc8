//! Per-kind transition state machine.
//!
//! [`Values<T>`] owns the running and completed registries for one value
//! kind and implements the CSS Transitions start, retarget, reverse and
//! cancel rules on top of them. The dispatcher holds one instance per kind
//! behind the object-safe [`TransitionTrack`] trait.
//!
//! Per key the states are `Absent -> Running -> Completed`, with
//! `Running -> Running` on retarget and `Running -> Absent` on cancel. A key
//! is never running and completed at the same time.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;

use smallvec::SmallVec;

use crate::counters::{AnimationCounts, CounterTable};
use crate::error::{Result, TransitionError};
use crate::events::{EventQueue, TransitionEvent, TransitionEventKind};
use crate::host::{ElementHost, ElementId};
use crate::interpolate::TransitionValue;
use crate::property::StylePropertyId;
use crate::registry::{CompletedRegistry, PropertyKey, StyleData, TimingData, TransitionRegistry};
use crate::transition::TransitionSpec;
use crate::value::{StyleValue, ValueKind};

/// Running and completed transitions of one value kind.
#[derive(Debug)]
pub struct Values<T: TransitionValue> {
    running: TransitionRegistry<T>,
    completed: CompletedRegistry<T>,
    /// Events raised since the last delivery.
    events: EventQueue,
    stale: HashSet<ElementId>,
    /// Completed-registry size that triggers the next sweep for removed owners.
    completed_sweep_at: usize,
    initial_capacity: usize,
}

impl<T: TransitionValue> Values<T> {
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self {
            running: TransitionRegistry::with_capacity(initial_capacity),
            completed: CompletedRegistry::with_capacity(initial_capacity),
            events: EventQueue::new(),
            stale: HashSet::new(),
            completed_sweep_at: initial_capacity.max(1),
            initial_capacity,
        }
    }

    pub fn running(&self) -> &TransitionRegistry<T> {
        &self.running
    }

    pub fn completed(&self) -> &CompletedRegistry<T> {
        &self.completed
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Starts, retargets or reverses the transition of `key`.
    ///
    /// Returns false when no transition runs afterwards for the new target;
    /// the caller should then apply `after` directly.
    pub fn start_transition(
        &mut self,
        key: PropertyKey,
        before: T,
        after: T,
        spec: &TransitionSpec,
        now: i64,
        counters: &mut CounterTable,
    ) -> bool {
        let combined = spec.combined_duration_ms();

        if let Some(row) = self.completed.index_of(&key) {
            if *self.completed.value(row) == after {
                return false;
            }
            self.completed.remove(row);
            counters.dec_completed(key.owner);
            if combined <= 0 {
                return false;
            }
        }

        let Some(row) = self.running.index_of(&key) else {
            if combined <= 0 || before == after {
                return false;
            }
            let timing = TimingData {
                start_time_ms: now + i64::from(spec.delay_ms),
                duration_ms: spec.duration_ms.max(0),
                delay_ms: spec.delay_ms,
                easing: spec.easing,
                eased_progress: 0.0,
                reversing_shortening_factor: 1.0,
                started: false,
            };
            let style = StyleData {
                start_value: before,
                end_value: after,
                reversing_adjusted_start_value: before,
                current_value: before,
            };
            self.running.add(key, timing, style);
            self.queue(TransitionEventKind::Run, key, pre_start_elapsed_ms(&timing));
            counters.inc_running(key.owner);
            return true;
        };

        let old_timing = *self.running.timing(row);
        let old_style = *self.running.style(row);

        if old_style.end_value == after {
            return false;
        }
        if old_style.current_value == after || combined <= 0 {
            self.cancel_running_at(row, now, counters);
            return false;
        }

        let mut duration_ms = spec.duration_ms.max(0);
        let mut delay_ms = spec.delay_ms;
        let mut factor = 1.0;
        let mut adjusted_start = old_style.current_value;

        if old_style.reversing_adjusted_start_value == after {
            let remaining = 1.0 - old_timing.eased_progress;
            factor = (1.0 - remaining * old_timing.reversing_shortening_factor)
                .abs()
                .clamp(0.0, 1.0);
            duration_ms = scale_ms(duration_ms, factor);
            if delay_ms < 0 {
                delay_ms = scale_ms(delay_ms, factor);
            }
            adjusted_start = old_style.end_value;
            log::trace!("{key:?} reversed, shortening factor {factor}");
        }

        let timing = TimingData {
            start_time_ms: now + i64::from(delay_ms),
            duration_ms,
            delay_ms,
            easing: spec.easing,
            eased_progress: 0.0,
            reversing_shortening_factor: factor,
            started: false,
        };
        let style = StyleData {
            start_value: old_style.current_value,
            end_value: after,
            reversing_adjusted_start_value: adjusted_start,
            current_value: old_style.current_value,
        };
        self.running.replace(row, timing, style);
        self.queue(TransitionEventKind::Cancel, key, old_timing.active_time_ms(now));
        self.queue(TransitionEventKind::Run, key, pre_start_elapsed_ms(&timing));
        true
    }

    /// Advances every running transition to `now` and writes the
    /// interpolated values to the host.
    pub fn update(&mut self, now: i64, host: &mut dyn ElementHost, counters: &mut CounterTable) {
        self.purge_stale(host, counters);
        self.update_progress(now, host, counters);
        self.update_values(host);
    }

    fn update_progress(
        &mut self,
        now: i64,
        host: &mut dyn ElementHost,
        counters: &mut CounterTable,
    ) {
        let mut row = 0;
        while row < self.running.len() {
            let (key, timing, style) = self.running.entry_mut(row);

            if now < timing.start_time_ms {
                timing.eased_progress = 0.0;
                row += 1;
                continue;
            }

            if now >= timing.end_time_ms() {
                let started = timing.started;
                let start_elapsed = pre_start_elapsed_ms(timing);
                let duration = i64::from(timing.duration_ms);
                style.current_value = style.end_value;
                let end_value = style.end_value;

                host.apply_interpolated_value(key.owner, key.property, &end_value.to_style());
                if !started {
                    self.queue(TransitionEventKind::Start, key, start_elapsed);
                }
                self.queue(TransitionEventKind::End, key, duration);

                // The last row moves into `row`; visit it next.
                self.running.remove(row);
                self.completed.add(key, end_value);
                counters.dec_running(key.owner);
                counters.inc_completed(key.owner);
                continue;
            }

            let newly_started = !timing.started;
            timing.started = true;
            let start_elapsed = pre_start_elapsed_ms(timing);

            let t = (now - timing.start_time_ms) as f32 / timing.duration_ms as f32;
            let eased = timing.easing.evaluate(t);
            if eased.is_finite() {
                timing.eased_progress = eased;
            }

            if newly_started {
                self.queue(TransitionEventKind::Start, key, start_elapsed);
            }
            row += 1;
        }
    }

    fn update_values(&mut self, host: &mut dyn ElementHost) {
        for row in 0..self.running.len() {
            let (key, timing, style) = self.running.entry_mut(row);
            style.current_value = style
                .start_value
                .interpolate(&style.end_value, timing.eased_progress);
            host.apply_interpolated_value(key.owner, key.property, &style.current_value.to_style());
        }
    }

    /// Drops every entry whose element the host no longer has.
    ///
    /// Owners of running entries are checked every update. Completed memos
    /// are only swept once the registry has doubled since the last sweep.
    fn purge_stale(&mut self, host: &dyn ElementHost, counters: &mut CounterTable) {
        let mut stale = std::mem::take(&mut self.stale);
        let mut checked = |key: &PropertyKey| {
            if !stale.contains(&key.owner) && !host.contains(key.owner) {
                stale.insert(key.owner);
            }
        };
        self.running.keys().iter().for_each(&mut checked);
        let sweep_completed = self.completed.len() >= self.completed_sweep_at;
        if sweep_completed {
            self.completed.keys().iter().for_each(&mut checked);
        }

        for owner in stale.drain() {
            log::warn!(
                "{:?} transitions still registered for removed element {owner:?}; purging",
                T::KIND
            );
            self.purge_owner(owner, counters);
        }
        self.stale = stale;

        if sweep_completed {
            self.completed_sweep_at = (self.completed.len() * 2).max(self.initial_capacity.max(1));
        }
    }

    /// Removes every entry of `owner` without events or value writes.
    pub fn purge_owner(&mut self, owner: ElementId, counters: &mut CounterTable) {
        self.running
            .remove_all_for(owner, |key, _, _| counters.dec_running(key.owner));
        self.completed
            .remove_all_for(owner, |key, _| counters.dec_completed(key.owner));
        self.events.discard_for_target(owner);
    }

    /// Cancels the running transition of `key`, leaving its end value
    /// applied, and forgets any completed value for it.
    pub fn cancel(
        &mut self,
        key: PropertyKey,
        now: i64,
        host: &mut dyn ElementHost,
        counters: &mut CounterTable,
    ) {
        if let Some(row) = self.running.index_of(&key) {
            let style = self.cancel_running_at(row, now, counters);
            if host.contains(key.owner) {
                host.apply_interpolated_value(key.owner, key.property, &style.end_value.to_style());
            }
        }
        if let Some(row) = self.completed.index_of(&key) {
            self.completed.remove(row);
            counters.dec_completed(key.owner);
        }
    }

    pub fn cancel_all_for(
        &mut self,
        owner: ElementId,
        now: i64,
        host: &mut dyn ElementHost,
        counters: &mut CounterTable,
    ) {
        let alive = host.contains(owner);
        let events = &mut self.events;
        self.running.remove_all_for(owner, |key, timing, style| {
            if alive {
                host.apply_interpolated_value(key.owner, key.property, &style.end_value.to_style());
            }
            events.push(TransitionEvent::new(
                TransitionEventKind::Cancel,
                key,
                timing.active_time_ms(now),
            ));
            counters.dec_running(key.owner);
        });
        self.completed
            .remove_all_for(owner, |key, _| counters.dec_completed(key.owner));
    }

    pub fn cancel_all(
        &mut self,
        now: i64,
        host: &mut dyn ElementHost,
        counters: &mut CounterTable,
    ) {
        for row in 0..self.running.len() {
            let key = self.running.key(row);
            let timing = *self.running.timing(row);
            let end_value = self.running.style(row).end_value;
            if host.contains(key.owner) {
                host.apply_interpolated_value(key.owner, key.property, &end_value.to_style());
            }
            self.queue(TransitionEventKind::Cancel, key, timing.active_time_ms(now));
            counters.dec_running(key.owner);
        }
        for key in self.completed.keys() {
            counters.dec_completed(key.owner);
        }
        self.running.clear();
        self.completed.clear();
    }

    pub fn timing(&self, key: &PropertyKey) -> Option<&TimingData> {
        self.running.index_of(key).map(|row| self.running.timing(row))
    }

    pub fn style(&self, key: &PropertyKey) -> Option<&StyleData<T>> {
        self.running.index_of(key).map(|row| self.running.style(row))
    }

    pub fn completed_value(&self, key: &PropertyKey) -> Option<T> {
        self.completed.index_of(key).map(|row| *self.completed.value(row))
    }

    /// Removes the running entry at `row` and queues its `Cancel`.
    fn cancel_running_at(
        &mut self,
        row: usize,
        now: i64,
        counters: &mut CounterTable,
    ) -> StyleData<T> {
        let (key, timing, style) = self.running.remove(row);
        self.queue(TransitionEventKind::Cancel, key, timing.active_time_ms(now));
        counters.dec_running(key.owner);
        style
    }

    fn queue(&mut self, kind: TransitionEventKind, key: PropertyKey, elapsed_ms: i64) {
        self.events.push(TransitionEvent::new(kind, key, elapsed_ms));
    }
}

/// Elapsed time reported by `Run` and `Start`: the part of a negative delay
/// already consumed, capped at the duration.
fn pre_start_elapsed_ms(timing: &TimingData) -> i64 {
    (-i64::from(timing.delay_ms)).clamp(0, i64::from(timing.duration_ms))
}

/// Scales a millisecond amount, rounding half away from zero.
fn scale_ms(ms: i32, factor: f32) -> i32 {
    (ms as f32 * factor).round() as i32
}

/// Type-erased view of one [`Values<T>`], used by the dispatcher.
pub(crate) trait TransitionTrack: Debug + Send {
    fn kind(&self) -> ValueKind;

    fn start_transition(
        &mut self,
        key: PropertyKey,
        start: &StyleValue,
        end: &StyleValue,
        spec: &TransitionSpec,
        now: i64,
        counters: &mut CounterTable,
    ) -> Result<bool>;

    fn update(&mut self, now: i64, host: &mut dyn ElementHost, counters: &mut CounterTable);

    fn cancel(
        &mut self,
        key: PropertyKey,
        now: i64,
        host: &mut dyn ElementHost,
        counters: &mut CounterTable,
    );

    fn cancel_all_for(
        &mut self,
        owner: ElementId,
        now: i64,
        host: &mut dyn ElementHost,
        counters: &mut CounterTable,
    );

    fn cancel_all(&mut self, now: i64, host: &mut dyn ElementHost, counters: &mut CounterTable);

    fn purge_owner(&mut self, owner: ElementId, counters: &mut CounterTable);

    fn has_running(&self, key: &PropertyKey) -> bool;

    fn running_len(&self) -> usize;

    fn has_layout_animations(&self) -> bool;

    fn running_properties(&self, owner: ElementId, out: &mut SmallVec<[StylePropertyId; 8]>);

    fn timing(&self, key: &PropertyKey) -> Option<TimingData>;

    fn current_value(&self, key: &PropertyKey) -> Option<StyleValue>;

    fn completed_value(&self, key: &PropertyKey) -> Option<StyleValue>;

    fn take_events(&mut self, out: &mut Vec<TransitionEvent>);

    fn take_events_for(&mut self, owner: ElementId, out: &mut Vec<TransitionEvent>);

    /// Adds this track's entries to per-element counts.
    fn tally(&self, counts: &mut HashMap<ElementId, AnimationCounts>);

    fn check_consistency(&self) -> Result<()>;
}

impl<T: TransitionValue> TransitionTrack for Values<T> {
    fn kind(&self) -> ValueKind {
        T::KIND
    }

    fn start_transition(
        &mut self,
        key: PropertyKey,
        start: &StyleValue,
        end: &StyleValue,
        spec: &TransitionSpec,
        now: i64,
        counters: &mut CounterTable,
    ) -> Result<bool> {
        let mismatch = |found: &StyleValue| TransitionError::ValueKindMismatch {
            property: key.property,
            expected: T::KIND,
            found: found.kind(),
        };
        let before = T::from_style(start).ok_or_else(|| mismatch(start))?;
        let after = T::from_style(end).ok_or_else(|| mismatch(end))?;
        Ok(Values::start_transition(self, key, before, after, spec, now, counters))
    }

    fn update(&mut self, now: i64, host: &mut dyn ElementHost, counters: &mut CounterTable) {
        Values::update(self, now, host, counters);
    }

    fn cancel(
        &mut self,
        key: PropertyKey,
        now: i64,
        host: &mut dyn ElementHost,
        counters: &mut CounterTable,
    ) {
        Values::cancel(self, key, now, host, counters);
    }

    fn cancel_all_for(
        &mut self,
        owner: ElementId,
        now: i64,
        host: &mut dyn ElementHost,
        counters: &mut CounterTable,
    ) {
        Values::cancel_all_for(self, owner, now, host, counters);
    }

    fn cancel_all(&mut self, now: i64, host: &mut dyn ElementHost, counters: &mut CounterTable) {
        Values::cancel_all(self, now, host, counters);
    }

    fn purge_owner(&mut self, owner: ElementId, counters: &mut CounterTable) {
        Values::purge_owner(self, owner, counters);
    }

    fn has_running(&self, key: &PropertyKey) -> bool {
        self.running.contains(key)
    }

    fn running_len(&self) -> usize {
        self.running.len()
    }

    fn has_layout_animations(&self) -> bool {
        self.running
            .keys()
            .iter()
            .any(|key| key.property.affects_layout())
    }

    fn running_properties(&self, owner: ElementId, out: &mut SmallVec<[StylePropertyId; 8]>) {
        out.extend(
            self.running
                .keys()
                .iter()
                .filter(|key| key.owner == owner)
                .map(|key| key.property),
        );
    }

    fn timing(&self, key: &PropertyKey) -> Option<TimingData> {
        Values::timing(self, key).copied()
    }

    fn current_value(&self, key: &PropertyKey) -> Option<StyleValue> {
        self.style(key).map(|style| style.current_value.to_style())
    }

    fn completed_value(&self, key: &PropertyKey) -> Option<StyleValue> {
        Values::completed_value(self, key).map(TransitionValue::to_style)
    }

    fn take_events(&mut self, out: &mut Vec<TransitionEvent>) {
        self.events.drain_into(out);
    }

    fn take_events_for(&mut self, owner: ElementId, out: &mut Vec<TransitionEvent>) {
        self.events.drain_for_target(owner, out);
    }

    fn tally(&self, counts: &mut HashMap<ElementId, AnimationCounts>) {
        for key in self.running.keys() {
            counts.entry(key.owner).or_default().running += 1;
        }
        for key in self.completed.keys() {
            counts.entry(key.owner).or_default().completed += 1;
        }
    }

    fn check_consistency(&self) -> Result<()> {
        let corrupted = |detail: String| TransitionError::RegistryCorrupted {
            kind: T::KIND,
            detail,
        };
        self.running
            .check_consistency()
            .map_err(|detail| corrupted(format!("running: {detail}")))?;
        self.completed
            .check_consistency()
            .map_err(|detail| corrupted(format!("completed: {detail}")))?;
        if let Some(key) = self.completed.keys().iter().find(|key| self.running.contains(key)) {
            return Err(corrupted(format!("{key:?} is both running and completed")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::EasingFunction;
    use crate::host::{ElementArena, ElementStyle};
    use crate::value::Length;
    use std::cell::Cell;

    const EPSILON: f32 = 0.001;

    struct Fixture {
        arena: ElementArena,
        counters: CounterTable,
        owner: ElementId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut arena = ElementArena::new();
            let owner = arena.insert(ElementStyle::new());
            Self {
                arena,
                counters: CounterTable::new(),
                owner,
            }
        }

        fn key(&self) -> PropertyKey {
            PropertyKey::new(self.owner, StylePropertyId::Opacity)
        }
    }

    fn linear(duration_ms: i32) -> TransitionSpec {
        TransitionSpec::new(duration_ms).with_easing(EasingFunction::Linear)
    }

    fn drained<T: TransitionValue>(values: &mut Values<T>) -> Vec<TransitionEventKind> {
        let mut out = Vec::new();
        values.events.drain_into(&mut out);
        out.iter().map(TransitionEvent::kind).collect()
    }

    // ==================== Start ====================

    #[test]
    fn test_equal_values_do_not_start() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        assert!(!values.start_transition(fx.key(), 1.0, 1.0, &linear(100), 0, &mut fx.counters));
        assert!(values.running().is_empty());
        assert!(values.events().is_empty());
    }

    #[test]
    fn test_start_queues_run_and_counts() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        assert!(values.start_transition(fx.key(), 0.0, 1.0, &linear(100), 0, &mut fx.counters));
        assert_eq!(values.running().len(), 1);
        assert_eq!(fx.counters.get(fx.owner).running, 1);
        assert_eq!(drained(&mut values), vec![TransitionEventKind::Run]);
    }

    #[test]
    fn test_non_positive_combined_duration_does_not_start() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        let spec = linear(100).with_delay(-100);
        assert!(!values.start_transition(fx.key(), 0.0, 1.0, &spec, 0, &mut fx.counters));
        assert!(!values.start_transition(fx.key(), 0.0, 1.0, &linear(0), 0, &mut fx.counters));
        assert!(values.running().is_empty());
    }

    #[test]
    fn test_same_target_keeps_running_entry() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        values.start_transition(fx.key(), 0.0, 1.0, &linear(100), 0, &mut fx.counters);
        assert!(!values.start_transition(fx.key(), 0.5, 1.0, &linear(300), 10, &mut fx.counters));
        assert_eq!(values.timing(&fx.key()).unwrap().duration_ms, 100);
    }

    // ==================== Update ====================

    #[test]
    fn test_delay_pins_progress_at_start() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        let spec = linear(100).with_delay(50);
        values.start_transition(fx.key(), 0.0, 1.0, &spec, 0, &mut fx.counters);

        values.update(25, &mut fx.arena, &mut fx.counters);
        let timing = values.timing(&fx.key()).unwrap();
        assert!(!timing.started);
        assert_eq!(timing.eased_progress, 0.0);
        assert_eq!(
            fx.arena.value(fx.owner, StylePropertyId::Opacity),
            Some(StyleValue::from(0.0_f32))
        );

        values.update(100, &mut fx.arena, &mut fx.counters);
        assert!(values.timing(&fx.key()).unwrap().started);
        assert!((values.style(&fx.key()).unwrap().current_value - 0.5).abs() < EPSILON);
        assert_eq!(
            drained(&mut values),
            vec![TransitionEventKind::Run, TransitionEventKind::Start]
        );
    }

    #[test]
    fn test_jump_past_end_emits_start_then_end() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        values.start_transition(fx.key(), 0.0, 1.0, &linear(100), 0, &mut fx.counters);
        values.update(500, &mut fx.arena, &mut fx.counters);

        assert!(values.running().is_empty());
        assert_eq!(values.completed_value(&fx.key()), Some(1.0));
        assert_eq!(fx.counters.get(fx.owner).completed, 1);
        assert_eq!(
            drained(&mut values),
            vec![
                TransitionEventKind::Run,
                TransitionEventKind::Start,
                TransitionEventKind::End
            ]
        );
    }

    #[test]
    fn test_completion_swap_keeps_other_entries_updating() {
        let mut fx = Fixture::new();
        let other = fx.arena.insert(ElementStyle::new());
        let mut values = Values::<f32>::with_capacity(4);
        values.start_transition(fx.key(), 0.0, 1.0, &linear(100), 0, &mut fx.counters);
        let other_key = PropertyKey::new(other, StylePropertyId::Opacity);
        values.start_transition(other_key, 0.0, 1.0, &linear(400), 0, &mut fx.counters);

        // The first entry completes and the second is swapped into row 0.
        values.update(200, &mut fx.arena, &mut fx.counters);
        assert_eq!(values.running().len(), 1);
        let timing = values.timing(&other_key).unwrap();
        assert!(timing.started);
        assert!((timing.eased_progress - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_nan_progress_freezes_last_value() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        let broken = TransitionSpec::new(100).with_easing(EasingFunction::CubicBezier {
            x1: 0.5,
            y1: f32::NAN,
            x2: 0.5,
            y2: 1.0,
        });
        values.start_transition(fx.key(), 0.0, 1.0, &broken, 0, &mut fx.counters);
        values.update(50, &mut fx.arena, &mut fx.counters);

        let timing = values.timing(&fx.key()).unwrap();
        assert_eq!(timing.eased_progress, 0.0);
        assert_eq!(values.style(&fx.key()).unwrap().current_value, 0.0);
    }

    // ==================== Retarget / reverse ====================

    #[test]
    fn test_retarget_starts_from_current_value() {
        let mut fx = Fixture::new();
        let key = PropertyKey::new(fx.owner, StylePropertyId::Width);
        let mut values = Values::<Length>::with_capacity(4);
        let (a, b, c) = (Length::px(0.0), Length::px(100.0), Length::px(200.0));
        values.start_transition(key, a, b, &linear(100), 0, &mut fx.counters);
        values.update(50, &mut fx.arena, &mut fx.counters);
        drained(&mut values);

        assert!(values.start_transition(key, b, c, &linear(100), 50, &mut fx.counters));
        let style = values.style(&key).unwrap();
        assert_eq!(style.start_value, Length::px(50.0));
        assert_eq!(style.reversing_adjusted_start_value, Length::px(50.0));
        assert_eq!(values.timing(&key).unwrap().reversing_shortening_factor, 1.0);
        assert_eq!(
            drained(&mut values),
            vec![TransitionEventKind::Cancel, TransitionEventKind::Run]
        );
        assert_eq!(fx.counters.get(fx.owner).running, 1);
    }

    #[test]
    fn test_reverse_shortens_duration() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        values.start_transition(fx.key(), 0.0, 1.0, &linear(1000), 0, &mut fx.counters);
        values.update(250, &mut fx.arena, &mut fx.counters);

        assert!(values.start_transition(fx.key(), 1.0, 0.0, &linear(1000), 250, &mut fx.counters));
        let timing = values.timing(&fx.key()).unwrap();
        assert!((timing.reversing_shortening_factor - 0.25).abs() < EPSILON);
        assert_eq!(timing.duration_ms, 250);
        let style = values.style(&fx.key()).unwrap();
        assert!((style.start_value - 0.25).abs() < EPSILON);
        assert_eq!(style.end_value, 0.0);
        assert_eq!(style.reversing_adjusted_start_value, 1.0);
    }

    #[test]
    fn test_reverse_scales_only_negative_delay() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        values.start_transition(fx.key(), 0.0, 1.0, &linear(1000), 0, &mut fx.counters);
        values.update(500, &mut fx.arena, &mut fx.counters);

        let spec = linear(1000).with_delay(-101);
        values.start_transition(fx.key(), 1.0, 0.0, &spec, 500, &mut fx.counters);
        let timing = values.timing(&fx.key()).unwrap();
        assert_eq!(timing.duration_ms, 500);
        assert_eq!(timing.delay_ms, -51);

        // Reverse again: a positive delay is kept as declared.
        values.update(600, &mut fx.arena, &mut fx.counters);
        let spec = linear(1000).with_delay(40);
        values.start_transition(fx.key(), 0.0, 1.0, &spec, 600, &mut fx.counters);
        assert_eq!(values.timing(&fx.key()).unwrap().delay_ms, 40);
    }

    #[test]
    fn test_retarget_to_current_value_cancels() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        values.start_transition(fx.key(), 0.0, 1.0, &linear(100), 0, &mut fx.counters);
        values.update(50, &mut fx.arena, &mut fx.counters);
        let current = values.style(&fx.key()).unwrap().current_value;

        let spec = linear(100);
        assert!(!values.start_transition(fx.key(), 1.0, current, &spec, 50, &mut fx.counters));
        assert!(values.running().is_empty());
        assert!(fx.counters.get(fx.owner).is_zero());
    }

    // ==================== Completed memo ====================

    #[test]
    fn test_completed_value_suppresses_restart() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        values.start_transition(fx.key(), 0.0, 1.0, &linear(100), 0, &mut fx.counters);
        values.update(100, &mut fx.arena, &mut fx.counters);

        assert!(!values.start_transition(fx.key(), 0.0, 1.0, &linear(100), 200, &mut fx.counters));
        assert_eq!(values.completed_value(&fx.key()), Some(1.0));

        assert!(values.start_transition(fx.key(), 1.0, 0.0, &linear(100), 200, &mut fx.counters));
        assert_eq!(values.completed_value(&fx.key()), None);
        assert_eq!(
            fx.counters.get(fx.owner),
            AnimationCounts {
                running: 1,
                completed: 0
            }
        );
        values.check_consistency().unwrap();
    }

    #[test]
    fn test_zero_duration_drops_completed_value() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        values.start_transition(fx.key(), 0.0, 1.0, &linear(100), 0, &mut fx.counters);
        values.update(100, &mut fx.arena, &mut fx.counters);

        assert!(!values.start_transition(fx.key(), 1.0, 0.5, &linear(0), 200, &mut fx.counters));
        assert_eq!(values.completed_value(&fx.key()), None);
        assert!(fx.counters.get(fx.owner).is_zero());
    }

    // ==================== Cancel / purge ====================

    #[test]
    fn test_cancel_applies_end_value() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        values.start_transition(fx.key(), 0.0, 1.0, &linear(100), 0, &mut fx.counters);
        values.update(30, &mut fx.arena, &mut fx.counters);
        drained(&mut values);

        values.cancel(fx.key(), 30, &mut fx.arena, &mut fx.counters);
        values.cancel(fx.key(), 30, &mut fx.arena, &mut fx.counters);

        assert_eq!(drained(&mut values), vec![TransitionEventKind::Cancel]);
        assert_eq!(
            fx.arena.value(fx.owner, StylePropertyId::Opacity),
            Some(StyleValue::from(1.0_f32))
        );
        assert!(fx.counters.get(fx.owner).is_zero());
    }

    #[test]
    fn test_cancel_all_for_owner_leaves_others() {
        let mut fx = Fixture::new();
        let other = fx.arena.insert(ElementStyle::new());
        let mut values = Values::<f32>::with_capacity(4);
        for prop in [StylePropertyId::Opacity, StylePropertyId::FlexGrow] {
            for owner in [fx.owner, other] {
                let key = PropertyKey::new(owner, prop);
                values.start_transition(key, 0.0, 1.0, &linear(100), 0, &mut fx.counters);
            }
        }

        values.cancel_all_for(fx.owner, 10, &mut fx.arena, &mut fx.counters);
        assert_eq!(values.running().len(), 2);
        assert!(values.running().keys().iter().all(|k| k.owner == other));
        assert!(fx.counters.get(fx.owner).is_zero());
        assert_eq!(fx.counters.get(other).running, 2);
        values.check_consistency().unwrap();
    }

    #[test]
    fn test_removed_element_is_purged_without_events() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        values.start_transition(fx.key(), 0.0, 1.0, &linear(100), 0, &mut fx.counters);
        fx.arena.remove(fx.owner);

        values.update(50, &mut fx.arena, &mut fx.counters);
        assert!(values.running().is_empty());
        assert!(values.events().is_empty());
        assert!(fx.counters.is_empty());
    }

    /// Host that counts liveness checks.
    struct CountingHost {
        arena: ElementArena,
        checks: Cell<usize>,
    }

    impl ElementHost for CountingHost {
        fn contains(&self, owner: ElementId) -> bool {
            self.checks.set(self.checks.get() + 1);
            self.arena.contains(owner)
        }

        fn apply_interpolated_value(
            &mut self,
            owner: ElementId,
            property: StylePropertyId,
            value: &StyleValue,
        ) {
            self.arena.apply_interpolated_value(owner, property, value);
        }
    }

    #[test]
    fn test_idle_completed_memos_are_not_rechecked() {
        let mut fx = Fixture::new();
        let mut host = CountingHost {
            arena: std::mem::take(&mut fx.arena),
            checks: Cell::new(0),
        };
        let mut values = Values::<f32>::with_capacity(4);
        values.start_transition(fx.key(), 0.0, 1.0, &linear(100), 0, &mut fx.counters);
        values.update(100, &mut host, &mut fx.counters);
        assert_eq!(values.completed().len(), 1);

        host.checks.set(0);
        for now in [116, 132, 148] {
            values.update(now, &mut host, &mut fx.counters);
        }
        assert_eq!(host.checks.get(), 0);
    }

    #[test]
    fn test_completed_memos_of_removed_elements_are_swept() {
        let mut fx = Fixture::new();
        let removed = fx.owner;
        let others: Vec<_> = (0..3).map(|_| fx.arena.insert(ElementStyle::new())).collect();
        let mut values = Values::<f32>::with_capacity(2);
        let opacity = |owner| PropertyKey::new(owner, StylePropertyId::Opacity);

        for owner in [removed, others[0]] {
            values.start_transition(opacity(owner), 0.0, 1.0, &linear(100), 0, &mut fx.counters);
        }
        values.update(100, &mut fx.arena, &mut fx.counters);
        values.update(116, &mut fx.arena, &mut fx.counters);
        assert_eq!(values.completed().len(), 2);

        fx.arena.remove(removed);
        for &owner in &others[1..] {
            values.start_transition(opacity(owner), 0.0, 1.0, &linear(100), 116, &mut fx.counters);
        }
        values.update(216, &mut fx.arena, &mut fx.counters);
        assert_eq!(values.completed().len(), 4);

        values.update(232, &mut fx.arena, &mut fx.counters);
        assert_eq!(values.completed().len(), 3);
        assert!(values.completed_value(&opacity(removed)).is_none());
        assert!(fx.counters.get(removed).is_zero());
        values.check_consistency().unwrap();
    }

    #[test]
    fn test_consistency_check_flags_key_in_both_registries() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        values.start_transition(fx.key(), 0.0, 1.0, &linear(100), 0, &mut fx.counters);
        values.completed.add(fx.key(), 1.0);

        let err = values.check_consistency().unwrap_err();
        assert!(matches!(
            err,
            TransitionError::RegistryCorrupted {
                kind: ValueKind::Float,
                ..
            }
        ));
    }

    #[test]
    fn test_cancel_all_clears_everything() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        values.start_transition(fx.key(), 0.0, 1.0, &linear(100), 0, &mut fx.counters);
        let flex = PropertyKey::new(fx.owner, StylePropertyId::FlexGrow);
        values.start_transition(flex, 0.0, 2.0, &linear(10), 0, &mut fx.counters);
        values.update(20, &mut fx.arena, &mut fx.counters);

        values.cancel_all(20, &mut fx.arena, &mut fx.counters);
        assert!(values.running().is_empty());
        assert!(values.completed().is_empty());
        assert!(fx.counters.is_empty());
        assert_eq!(
            fx.arena.value(fx.owner, StylePropertyId::Opacity),
            Some(StyleValue::from(1.0_f32))
        );
    }

    #[test]
    fn test_erased_start_rejects_wrong_kind() {
        let mut fx = Fixture::new();
        let mut values = Values::<f32>::with_capacity(4);
        let track: &mut dyn TransitionTrack = &mut values;
        let err = track
            .start_transition(
                fx.key(),
                &StyleValue::from(0.0_f32),
                &StyleValue::from(Length::px(1.0)),
                &linear(100),
                0,
                &mut fx.counters,
            )
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::ValueKindMismatch {
                property: StylePropertyId::Opacity,
                expected: ValueKind::Float,
                found: ValueKind::Length,
            }
        );
    }
}
