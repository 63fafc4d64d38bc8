//! CSS-like property transitions for retained UI element trees.
//!
//! This crate provides:
//! - **Transitions**: start, retarget, reverse and cancel per `(element, property)`
//! - **Easing Functions**: standard CSS timing functions plus the common named curves
//! - **Transition Events**: `run`, `start`, `end` and `cancel`, delivered once per frame
//!
//! # Architecture
//!
//! ```text
//! TransitionDispatcher
//!   ├── Values<f32>      (running + completed registries, event queue)
//!   ├── Values<Length>
//!   ├── Values<Color>
//!   └── ...              (one per value kind, created on first use)
//!
//! ElementHost  <- interpolated values are written here
//! EventSink    <- queued events are delivered here
//! FrameClock   <- read once per update
//! ```

pub mod counters;
pub mod dispatcher;
pub mod easing;
pub mod error;
pub mod events;
pub mod host;
pub mod interpolate;
pub mod property;
pub mod registry;
pub mod transition;
pub mod value;
pub mod values;

pub use counters::AnimationCounts;
pub use dispatcher::TransitionDispatcher;
pub use easing::{EasingFunction, StepPosition};
pub use error::{Result, TransitionError};
pub use events::{EventFlags, EventQueue, TransitionEvent, TransitionEventKind};
pub use host::{
    DirtyFlags, ElementArena, ElementHost, ElementId, ElementStyle, EventContext, EventSink,
    FrameClock, ManualClock, SystemClock,
};
pub use interpolate::{Interpolate, TransitionValue};
pub use property::StylePropertyId;
pub use registry::{CompletedRegistry, PropertyKey, StyleData, TimingData, TransitionRegistry};
pub use transition::{TransitionGroup, TransitionSpec, TransitionTarget};
pub use value::{
    Angle, AngleUnit, Background, Color, Cursor, EnumValue, FontDefinition, Length, LengthUnit,
    ResourceId, Rotate, Scale, StyleValue, TextShadow, TransformOrigin, Translate, ValueKind, Vec2,
};
pub use values::Values;
