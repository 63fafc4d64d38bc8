//! Identifiers of transitionable style properties.

use serde::{Deserialize, Serialize};

use crate::value::ValueKind;

/// A transitionable style property.
///
/// The discriminant is a small integer so keys stay cheap to hash and copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum StylePropertyId {
    // Geometry
    Width,
    Height,
    MinWidth,
    MinHeight,
    MaxWidth,
    MaxHeight,
    Left,
    Top,
    Right,
    Bottom,

    // Spacing
    MarginTop,
    MarginRight,
    MarginBottom,
    MarginLeft,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,

    // Flex
    FlexGrow,
    FlexShrink,
    FlexBasis,
    FlexDirection,
    FlexWrap,
    AlignContent,
    AlignItems,
    AlignSelf,
    JustifyContent,

    // Layout keywords
    Display,
    Position,
    Overflow,
    Visibility,

    // Border
    BorderTopWidth,
    BorderRightWidth,
    BorderBottomWidth,
    BorderLeftWidth,
    BorderTopColor,
    BorderRightColor,
    BorderBottomColor,
    BorderLeftColor,
    BorderTopLeftRadius,
    BorderTopRightRadius,
    BorderBottomRightRadius,
    BorderBottomLeftRadius,

    // Visual
    Opacity,
    Color,
    BackgroundColor,
    BackgroundImage,
    BackgroundImageTintColor,
    Cursor,

    // Nine-slice
    SliceTop,
    SliceRight,
    SliceBottom,
    SliceLeft,
    SliceScale,

    // Text
    FontSize,
    FontStyle,
    FontDefinition,
    LetterSpacing,
    WordSpacing,
    ParagraphSpacing,
    TextAlign,
    TextOverflow,
    WhiteSpace,
    TextShadow,
    TextOutlineWidth,
    TextOutlineColor,

    // Transform
    Scale,
    Rotate,
    Translate,
    TransformOrigin,
}

impl StylePropertyId {
    /// Returns the value kind this property is transitioned as.
    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::Width
            | Self::Height
            | Self::MinWidth
            | Self::MinHeight
            | Self::MaxWidth
            | Self::MaxHeight
            | Self::Left
            | Self::Top
            | Self::Right
            | Self::Bottom
            | Self::MarginTop
            | Self::MarginRight
            | Self::MarginBottom
            | Self::MarginLeft
            | Self::PaddingTop
            | Self::PaddingRight
            | Self::PaddingBottom
            | Self::PaddingLeft
            | Self::FlexBasis
            | Self::BorderTopLeftRadius
            | Self::BorderTopRightRadius
            | Self::BorderBottomRightRadius
            | Self::BorderBottomLeftRadius
            | Self::FontSize
            | Self::LetterSpacing
            | Self::WordSpacing
            | Self::ParagraphSpacing => ValueKind::Length,

            Self::FlexGrow
            | Self::FlexShrink
            | Self::BorderTopWidth
            | Self::BorderRightWidth
            | Self::BorderBottomWidth
            | Self::BorderLeftWidth
            | Self::Opacity
            | Self::SliceScale
            | Self::TextOutlineWidth => ValueKind::Float,

            Self::SliceTop | Self::SliceRight | Self::SliceBottom | Self::SliceLeft => {
                ValueKind::Int
            }

            Self::Color
            | Self::BackgroundColor
            | Self::BackgroundImageTintColor
            | Self::BorderTopColor
            | Self::BorderRightColor
            | Self::BorderBottomColor
            | Self::BorderLeftColor
            | Self::TextOutlineColor => ValueKind::Color,

            Self::FlexDirection
            | Self::FlexWrap
            | Self::AlignContent
            | Self::AlignItems
            | Self::AlignSelf
            | Self::JustifyContent
            | Self::Display
            | Self::Position
            | Self::Overflow
            | Self::Visibility
            | Self::FontStyle
            | Self::TextAlign
            | Self::TextOverflow
            | Self::WhiteSpace => ValueKind::Enum,

            Self::BackgroundImage => ValueKind::Background,
            Self::FontDefinition => ValueKind::Font,
            Self::Cursor => ValueKind::Cursor,
            Self::TextShadow => ValueKind::TextShadow,
            Self::Scale => ValueKind::Scale,
            Self::Rotate => ValueKind::Rotate,
            Self::Translate => ValueKind::Translate,
            Self::TransformOrigin => ValueKind::TransformOrigin,
        }
    }

    /// Returns true if an animated value of this property requires relayout.
    pub fn affects_layout(self) -> bool {
        matches!(
            self,
            Self::Width
                | Self::Height
                | Self::MinWidth
                | Self::MinHeight
                | Self::MaxWidth
                | Self::MaxHeight
                | Self::Left
                | Self::Top
                | Self::Right
                | Self::Bottom
                | Self::MarginTop
                | Self::MarginRight
                | Self::MarginBottom
                | Self::MarginLeft
                | Self::PaddingTop
                | Self::PaddingRight
                | Self::PaddingBottom
                | Self::PaddingLeft
                | Self::FlexGrow
                | Self::FlexShrink
                | Self::FlexBasis
                | Self::FlexDirection
                | Self::FlexWrap
                | Self::AlignContent
                | Self::AlignItems
                | Self::AlignSelf
                | Self::JustifyContent
                | Self::Display
                | Self::Position
                | Self::BorderTopWidth
                | Self::BorderRightWidth
                | Self::BorderBottomWidth
                | Self::BorderLeftWidth
                | Self::FontSize
                | Self::FontDefinition
                | Self::LetterSpacing
                | Self::WordSpacing
                | Self::ParagraphSpacing
                | Self::WhiteSpace
        )
    }

    /// Returns true if this is a visual-only property (no layout impact).
    pub fn is_visual_only(self) -> bool {
        !self.affects_layout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kinds() {
        assert_eq!(StylePropertyId::Opacity.value_kind(), ValueKind::Float);
        assert_eq!(StylePropertyId::Width.value_kind(), ValueKind::Length);
        assert_eq!(StylePropertyId::BackgroundColor.value_kind(), ValueKind::Color);
        assert_eq!(StylePropertyId::Display.value_kind(), ValueKind::Enum);
        assert_eq!(StylePropertyId::SliceLeft.value_kind(), ValueKind::Int);
        assert_eq!(StylePropertyId::TextShadow.value_kind(), ValueKind::TextShadow);
        assert_eq!(StylePropertyId::Rotate.value_kind(), ValueKind::Rotate);
    }

    #[test]
    fn test_layout_classification() {
        assert!(StylePropertyId::Width.affects_layout());
        assert!(StylePropertyId::FontSize.affects_layout());
        assert!(StylePropertyId::Opacity.is_visual_only());
        assert!(StylePropertyId::Translate.is_visual_only());
    }

    #[test]
    fn test_property_serialization() {
        let json = serde_json::to_string(&StylePropertyId::BorderTopLeftRadius).unwrap();
        assert_eq!(json, "\"border_top_left_radius\"");
    }
}
