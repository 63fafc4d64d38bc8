//! Interpolation rules for every transitionable value kind.
//!
//! Continuous kinds blend linearly, discrete kinds flip to the end value at
//! the midpoint, and composite kinds blend component-wise. Progress outside
//! [0, 1] (overshooting easing curves) extrapolates continuous kinds.

use std::fmt::Debug;

use crate::value::{
    Angle, AngleUnit, Background, Color, Cursor, EnumValue, FontDefinition, Length, Rotate, Scale,
    StyleValue, TextShadow, TransformOrigin, Translate, ValueKind, Vec2,
};

/// Trait for types that can be interpolated between two values.
pub trait Interpolate: Sized {
    /// Interpolate between self and another value.
    ///
    /// When t = 0.0, returns self.
    /// When t = 1.0, returns to.
    fn interpolate(&self, to: &Self, t: f32) -> Self;
}

/// A value type one per-kind state machine is instantiated over.
pub trait TransitionValue: Interpolate + Copy + PartialEq + Debug + Send + 'static {
    const KIND: ValueKind;

    /// Extracts a value of this kind, or `None` if `value` is another kind.
    fn from_style(value: &StyleValue) -> Option<Self>;

    fn to_style(self) -> StyleValue;
}

#[inline]
fn lerp_f32(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Discrete values switch to the end value halfway through.
#[inline]
fn discrete<T: Copy>(from: T, to: T, t: f32) -> T {
    if t < 0.5 { from } else { to }
}

impl Interpolate for f32 {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        lerp_f32(*self, *to, t)
    }
}

impl Interpolate for i32 {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        lerp_f32(*self as f32, *to as f32, t).round() as i32
    }
}

impl Interpolate for Length {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        if self.unit != to.unit || self.is_keyword() {
            return discrete(*self, *to, t);
        }
        Self {
            value: lerp_f32(self.value, to.value, t),
            unit: self.unit,
        }
    }
}

impl Interpolate for Color {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        Self {
            r: lerp_f32(self.r, to.r, t),
            g: lerp_f32(self.g, to.g, t),
            b: lerp_f32(self.b, to.b, t),
            a: lerp_f32(self.a, to.a, t),
        }
    }
}

impl Interpolate for Vec2 {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        Self {
            x: lerp_f32(self.x, to.x, t),
            y: lerp_f32(self.y, to.y, t),
        }
    }
}

impl Interpolate for EnumValue {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        discrete(*self, *to, t)
    }
}

impl Interpolate for Background {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        discrete(*self, *to, t)
    }
}

impl Interpolate for FontDefinition {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        discrete(*self, *to, t)
    }
}

impl Interpolate for Cursor {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        discrete(*self, *to, t)
    }
}

impl Interpolate for TextShadow {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        Self {
            offset: self.offset.interpolate(&to.offset, t),
            blur_radius: lerp_f32(self.blur_radius, to.blur_radius, t),
            color: self.color.interpolate(&to.color, t),
        }
    }
}

impl Interpolate for Scale {
    /// A NaN component resolves to the identity scale before blending.
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        let from = if self.has_nan() { Self::IDENTITY } else { *self };
        let to = if to.has_nan() { Self::IDENTITY } else { *to };
        Self {
            x: lerp_f32(from.x, to.x, t),
            y: lerp_f32(from.y, to.y, t),
            z: lerp_f32(from.z, to.z, t),
        }
    }
}

impl Interpolate for Angle {
    /// Angles in the same unit keep it; mixed units blend in degrees.
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        if self.unit == to.unit {
            return Self {
                value: lerp_f32(self.value, to.value, t),
                unit: self.unit,
            };
        }
        Self {
            value: lerp_f32(self.to_degrees(), to.to_degrees(), t),
            unit: AngleUnit::Degree,
        }
    }
}

impl Interpolate for Rotate {
    /// A NaN angle resolves to no rotation before blending.
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        let from = if self.has_nan() { Self::IDENTITY } else { *self };
        let to = if to.has_nan() { Self::IDENTITY } else { *to };
        Self {
            angle: from.angle.interpolate(&to.angle, t),
        }
    }
}

impl Interpolate for Translate {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        Self {
            x: self.x.interpolate(&to.x, t),
            y: self.y.interpolate(&to.y, t),
            z: lerp_f32(self.z, to.z, t),
        }
    }
}

impl Interpolate for TransformOrigin {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        Self {
            x: self.x.interpolate(&to.x, t),
            y: self.y.interpolate(&to.y, t),
            z: lerp_f32(self.z, to.z, t),
        }
    }
}

/// `StyleValue` variants are named after their `ValueKind`.
macro_rules! transition_value {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl TransitionValue for $ty {
                const KIND: ValueKind = ValueKind::$kind;

                fn from_style(value: &StyleValue) -> Option<Self> {
                    match value {
                        StyleValue::$kind { value } => Some(*value),
                        _ => None,
                    }
                }

                fn to_style(self) -> StyleValue {
                    StyleValue::$kind { value: self }
                }
            }
        )*
    };
}

transition_value! {
    f32 => Float,
    i32 => Int,
    Length => Length,
    Color => Color,
    EnumValue => Enum,
    Background => Background,
    FontDefinition => Font,
    Cursor => Cursor,
    TextShadow => TextShadow,
    Scale => Scale,
    Rotate => Rotate,
    Translate => Translate,
    TransformOrigin => TransformOrigin,
}
