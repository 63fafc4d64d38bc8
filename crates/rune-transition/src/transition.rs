//! Transition declarations.
//!
//! - `TransitionSpec`: timing of one property transition
//! - `TransitionTarget`: which property or properties a spec applies to
//! - `TransitionGroup`: the declared transitions of one element, similar to
//!   CSS `transition: opacity 300ms ease, width 1s linear`
//!
//! The style cascade looks up the spec for a changed property here and hands
//! it to [`TransitionDispatcher::start_transition`](crate::TransitionDispatcher::start_transition).

use serde::{Deserialize, Serialize};

use crate::easing::EasingFunction;
use crate::property::StylePropertyId;

/// Specifies which property or properties a transition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransitionTarget {
    Property { property: StylePropertyId },
    /// CSS `transition: all`.
    #[default]
    All,
}

/// Timing of a single property transition.
///
/// `delay_ms` may be negative: the transition then starts part-way through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    #[serde(default)]
    pub target: TransitionTarget,
    pub duration_ms: i32,
    #[serde(default)]
    pub delay_ms: i32,
    #[serde(default)]
    pub easing: EasingFunction,
}

impl Default for TransitionSpec {
    fn default() -> Self {
        Self {
            target: TransitionTarget::All,
            duration_ms: 0,
            delay_ms: 0,
            easing: EasingFunction::Ease,
        }
    }
}

impl TransitionSpec {
    /// A spec for every property with the given duration.
    pub fn new(duration_ms: i32) -> Self {
        Self {
            duration_ms,
            ..Self::default()
        }
    }

    /// A spec for one property.
    pub fn property(property: StylePropertyId, duration_ms: i32) -> Self {
        Self {
            target: TransitionTarget::Property { property },
            ..Self::new(duration_ms)
        }
    }

    pub fn with_delay(mut self, delay_ms: i32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// `max(0, duration) + delay`. Transitions with a combined duration of
    /// zero or less never animate.
    pub fn combined_duration_ms(&self) -> i64 {
        i64::from(self.duration_ms.max(0)) + i64::from(self.delay_ms)
    }

    pub fn applies_to(&self, property: StylePropertyId) -> bool {
        match self.target {
            TransitionTarget::All => true,
            TransitionTarget::Property { property: p } => p == property,
        }
    }
}

/// The declared transitions of one element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionGroup {
    pub specs: Vec<TransitionSpec>,
}

impl TransitionGroup {
    pub fn new() -> Self {
        Self { specs: Vec::new() }
    }

    pub fn with(mut self, spec: TransitionSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Find the spec that applies to `property`.
    ///
    /// A property-specific spec wins over an `all` spec.
    pub fn spec_for(&self, property: StylePropertyId) -> Option<&TransitionSpec> {
        let specific = self.specs.iter().find(|s| {
            matches!(s.target, TransitionTarget::Property { property: p } if p == property)
        });

        specific.or_else(|| {
            self.specs
                .iter()
                .find(|s| matches!(s.target, TransitionTarget::All))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
