//! Style value types that can be transitioned.
//!
//! Each transitionable property resolves to exactly one [`ValueKind`]. The
//! concrete value types are small `Copy` structs so the registries can store
//! them inline in their parallel arrays.

use serde::{Deserialize, Serialize};

/// Value kind of a transitionable property.
///
/// The dispatcher keeps one state machine per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Float,
    Int,
    Length,
    Color,
    Enum,
    Background,
    Font,
    Cursor,
    TextShadow,
    Scale,
    Rotate,
    Translate,
    TransformOrigin,
}

impl ValueKind {
    /// Number of value kinds.
    pub const COUNT: usize = 13;

    /// Dense index, usable as an array slot.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Unit of a [`Length`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    #[default]
    Pixel,
    Percent,
    /// `auto` keyword; the numeric value is ignored.
    Auto,
    /// `none` keyword; the numeric value is ignored.
    None,
}

/// A length with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Length {
    pub value: f32,
    pub unit: LengthUnit,
}

impl Length {
    pub const fn px(value: f32) -> Self {
        Self {
            value,
            unit: LengthUnit::Pixel,
        }
    }

    pub const fn percent(value: f32) -> Self {
        Self {
            value,
            unit: LengthUnit::Percent,
        }
    }

    pub const fn auto() -> Self {
        Self {
            value: 0.0,
            unit: LengthUnit::Auto,
        }
    }

    pub const fn none() -> Self {
        Self {
            value: 0.0,
            unit: LengthUnit::None,
        }
    }

    /// Keyword lengths (`auto`, `none`) carry no numeric value.
    pub fn is_keyword(&self) -> bool {
        matches!(self.unit, LengthUnit::Auto | LengthUnit::None)
    }
}

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// 2D offset in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Handle to an image, font, or cursor texture owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

/// Keyword value of an enumerated property (display, position, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EnumValue(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Background {
    pub image: Option<ResourceId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FontDefinition {
    pub font: Option<ResourceId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cursor {
    pub texture: Option<ResourceId>,
    pub hotspot: Vec2,
    /// Host-defined system cursor, used when there is no texture.
    pub default_cursor: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextShadow {
    pub offset: Vec2,
    pub blur_radius: f32,
    pub color: Color,
}

/// Per-axis scale factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Scale {
    pub const IDENTITY: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn has_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    #[default]
    Degree,
    Gradian,
    Radian,
    Turn,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Angle {
    pub value: f32,
    pub unit: AngleUnit,
}

impl Angle {
    pub const fn degrees(value: f32) -> Self {
        Self {
            value,
            unit: AngleUnit::Degree,
        }
    }

    pub const fn turns(value: f32) -> Self {
        Self {
            value,
            unit: AngleUnit::Turn,
        }
    }

    pub const fn radians(value: f32) -> Self {
        Self {
            value,
            unit: AngleUnit::Radian,
        }
    }

    pub fn to_degrees(&self) -> f32 {
        match self.unit {
            AngleUnit::Degree => self.value,
            AngleUnit::Gradian => self.value * 0.9,
            AngleUnit::Radian => self.value.to_degrees(),
            AngleUnit::Turn => self.value * 360.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotate {
    pub angle: Angle,
}

impl Rotate {
    pub const IDENTITY: Self = Self {
        angle: Angle::degrees(0.0),
    };

    pub const fn new(angle: Angle) -> Self {
        Self { angle }
    }

    pub fn has_nan(&self) -> bool {
        self.angle.value.is_nan()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Translate {
    pub x: Length,
    pub y: Length,
    pub z: f32,
}

impl Translate {
    pub const fn new(x: Length, y: Length, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformOrigin {
    pub x: Length,
    pub y: Length,
    pub z: f32,
}

impl TransformOrigin {
    pub const CENTER: Self = Self::new(Length::percent(50.0), Length::percent(50.0), 0.0);

    pub const fn new(x: Length, y: Length, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Default for TransformOrigin {
    fn default() -> Self {
        Self::CENTER
    }
}

/// A resolved style value of any kind.
///
/// This is the currency of the public API: transitions are started with two
/// `StyleValue`s and interpolated values are handed back to the host as one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StyleValue {
    Float { value: f32 },
    Int { value: i32 },
    Length { value: Length },
    Color { value: Color },
    Enum { value: EnumValue },
    Background { value: Background },
    Font { value: FontDefinition },
    Cursor { value: Cursor },
    TextShadow { value: TextShadow },
    Scale { value: Scale },
    Rotate { value: Rotate },
    Translate { value: Translate },
    TransformOrigin { value: TransformOrigin },
}

impl StyleValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Float { .. } => ValueKind::Float,
            Self::Int { .. } => ValueKind::Int,
            Self::Length { .. } => ValueKind::Length,
            Self::Color { .. } => ValueKind::Color,
            Self::Enum { .. } => ValueKind::Enum,
            Self::Background { .. } => ValueKind::Background,
            Self::Font { .. } => ValueKind::Font,
            Self::Cursor { .. } => ValueKind::Cursor,
            Self::TextShadow { .. } => ValueKind::TextShadow,
            Self::Scale { .. } => ValueKind::Scale,
            Self::Rotate { .. } => ValueKind::Rotate,
            Self::Translate { .. } => ValueKind::Translate,
            Self::TransformOrigin { .. } => ValueKind::TransformOrigin,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_length(&self) -> Option<Length> {
        match self {
            Self::Length { value } => Some(*value),
            _ => None,
        }
    }
}

impl From<f32> for StyleValue {
    fn from(value: f32) -> Self {
        Self::Float { value }
    }
}

impl From<i32> for StyleValue {
    fn from(value: i32) -> Self {
        Self::Int { value }
    }
}

impl From<Length> for StyleValue {
    fn from(value: Length) -> Self {
        Self::Length { value }
    }
}

impl From<Color> for StyleValue {
    fn from(value: Color) -> Self {
        Self::Color { value }
    }
}

impl From<EnumValue> for StyleValue {
    fn from(value: EnumValue) -> Self {
        Self::Enum { value }
    }
}

impl From<Scale> for StyleValue {
    fn from(value: Scale) -> Self {
        Self::Scale { value }
    }
}

impl From<Rotate> for StyleValue {
    fn from(value: Rotate) -> Self {
        Self::Rotate { value }
    }
}

impl From<Translate> for StyleValue {
    fn from(value: Translate) -> Self {
        Self::Translate { value }
    }
}
