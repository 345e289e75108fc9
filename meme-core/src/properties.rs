//! Property patches and the control view of a selected element.
//!
//! The properties panel never mutates the live document. A control change
//! becomes an [`ElementPatch`], which the editor applies to produce a new
//! snapshot.

use serde::{Deserialize, Serialize};

use crate::element::{ImageFilter, TextAlign, MIN_ELEMENT_SIZE};
use crate::{Element, ElementKind};

/// Font families offered by the font picker.
pub const FONT_FAMILIES: [&str; 8] = [
    "Arial",
    "Times New Roman",
    "Courier New",
    "Georgia",
    "Verdana",
    "Comic Sans MS",
    "Impact",
    "Trebuchet MS",
];

/// Font size slider bounds, in pixels.
pub const FONT_SIZE_RANGE: (f32, f32) = (12.0, 120.0);

/// Stroke width slider bounds, in pixels.
pub const STROKE_WIDTH_RANGE: (f32, f32) = (0.0, 20.0);

/// A partial update to an element.
///
/// Fields left as `None` are unchanged. Variant-specific fields that do not
/// match the element's variant are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementPatch {
    /// New x position.
    pub x: Option<f32>,
    /// New y position.
    pub y: Option<f32>,
    /// New width.
    pub width: Option<f32>,
    /// New height.
    pub height: Option<f32>,
    /// New rotation in degrees.
    pub rotation: Option<f32>,
    /// New stacking order.
    pub z_index: Option<i32>,

    /// Text content.
    pub content: Option<String>,
    /// Font size.
    pub font_size: Option<f32>,
    /// Font family.
    pub font_family: Option<String>,
    /// Text color.
    pub color: Option<String>,
    /// Bold flag.
    pub bold: Option<bool>,
    /// Italic flag.
    pub italic: Option<bool>,
    /// Underline flag.
    pub underline: Option<bool>,
    /// Text alignment.
    pub align: Option<TextAlign>,

    /// Image opacity.
    pub opacity: Option<f32>,
    /// Image filter.
    pub filter: Option<ImageFilter>,

    /// Shape fill color.
    pub fill: Option<String>,
    /// Shape stroke color.
    pub stroke: Option<String>,
    /// Shape stroke width.
    pub stroke_width: Option<f32>,
}

impl ElementPatch {
    /// Patch moving the element to `(x, y)`.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Patch resizing the element.
    #[must_use]
    pub fn size(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Patch setting the rotation.
    #[must_use]
    pub fn rotation(degrees: f32) -> Self {
        Self {
            rotation: Some(degrees),
            ..Self::default()
        }
    }

    /// Patch replacing the text content.
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Produce a patched copy of `element`, clamping values to control ranges.
    #[must_use]
    pub fn apply(&self, element: &Element) -> Element {
        let mut next = element.clone();
        let t = &mut next.transform;

        if let Some(x) = self.x {
            t.x = x;
        }
        if let Some(y) = self.y {
            t.y = y;
        }
        if let Some(width) = self.width {
            t.width = width.max(MIN_ELEMENT_SIZE);
        }
        if let Some(height) = self.height {
            t.height = height.max(MIN_ELEMENT_SIZE);
        }
        if let Some(rotation) = self.rotation {
            t.rotation = rotation;
        }
        if let Some(z_index) = self.z_index {
            t.z_index = z_index;
        }

        match &mut next.kind {
            ElementKind::Text {
                content,
                font_size,
                font_family,
                color,
                bold,
                italic,
                underline,
                align,
            } => {
                set(content, self.content.as_ref());
                set(font_family, self.font_family.as_ref());
                set(color, self.color.as_ref());
                if let Some(size) = self.font_size {
                    *font_size = size.clamp(FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1);
                }
                set(bold, self.bold.as_ref());
                set(italic, self.italic.as_ref());
                set(underline, self.underline.as_ref());
                set(align, self.align.as_ref());
            }
            ElementKind::Image {
                opacity, filter, ..
            } => {
                if let Some(value) = self.opacity {
                    *opacity = value.clamp(0.0, 1.0);
                }
                set(filter, self.filter.as_ref());
            }
            ElementKind::Shape {
                fill,
                stroke,
                stroke_width,
                ..
            } => {
                set(fill, self.fill.as_ref());
                set(stroke, self.stroke.as_ref());
                if let Some(width) = self.stroke_width {
                    *stroke_width = width.clamp(STROKE_WIDTH_RANGE.0, STROKE_WIDTH_RANGE.1);
                }
            }
        }

        next
    }
}

fn set<T: Clone>(slot: &mut T, value: Option<&T>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}

/// Control values the properties panel shows for a selected element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyPanel {
    /// X position.
    pub x: f32,
    /// Y position.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Rotation normalized to `[0, 360)`.
    pub rotation: f32,
    /// Variant-specific controls.
    pub controls: VariantControls,
}

/// Variant-specific section of the properties panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VariantControls {
    /// Text controls.
    Text {
        /// Content textarea.
        content: String,
        /// Selected font family.
        font_family: String,
        /// Font size slider.
        font_size: f32,
        /// Color picker.
        color: String,
        /// Bold toggle.
        bold: bool,
        /// Italic toggle.
        italic: bool,
        /// Underline toggle.
        underline: bool,
        /// Alignment buttons.
        align: TextAlign,
    },
    /// Image controls.
    Image {
        /// Opacity slider shown as a whole percentage.
        opacity_percent: u8,
        /// Filter dropdown.
        filter: ImageFilter,
    },
    /// Shape controls.
    Shape {
        /// Fill color picker.
        fill: String,
        /// Stroke color picker.
        stroke: String,
        /// Stroke width slider.
        stroke_width: f32,
    },
}

impl PropertyPanel {
    /// Read the control values off an element.
    #[must_use]
    pub fn from_element(element: &Element) -> Self {
        let t = &element.transform;
        let controls = match &element.kind {
            ElementKind::Text {
                content,
                font_size,
                font_family,
                color,
                bold,
                italic,
                underline,
                align,
            } => VariantControls::Text {
                content: content.clone(),
                font_family: font_family.clone(),
                font_size: *font_size,
                color: color.clone(),
                bold: *bold,
                italic: *italic,
                underline: *underline,
                align: *align,
            },
            ElementKind::Image {
                opacity, filter, ..
            } => {
                // clamped to [0, 100] before the cast
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let opacity_percent = (opacity.clamp(0.0, 1.0) * 100.0).round() as u8;
                VariantControls::Image {
                    opacity_percent,
                    filter: *filter,
                }
            }
            ElementKind::Shape {
                fill,
                stroke,
                stroke_width,
                ..
            } => VariantControls::Shape {
                fill: fill.clone(),
                stroke: stroke.clone(),
                stroke_width: *stroke_width,
            },
        };

        Self {
            x: t.x,
            y: t.y,
            width: t.width,
            height: t.height,
            rotation: t.normalized_rotation(),
            controls,
        }
    }

    /// Patch toggling bold, as the bold button does.
    #[must_use]
    pub fn toggle_bold(&self) -> Option<ElementPatch> {
        match self.controls {
            VariantControls::Text { bold, .. } => Some(ElementPatch {
                bold: Some(!bold),
                ..ElementPatch::default()
            }),
            VariantControls::Image { .. } | VariantControls::Shape { .. } => None,
        }
    }

    /// Patch toggling italic, as the italic button does.
    #[must_use]
    pub fn toggle_italic(&self) -> Option<ElementPatch> {
        match self.controls {
            VariantControls::Text { italic, .. } => Some(ElementPatch {
                italic: Some(!italic),
                ..ElementPatch::default()
            }),
            VariantControls::Image { .. } | VariantControls::Shape { .. } => None,
        }
    }

    /// Patch toggling underline, as the underline button does.
    #[must_use]
    pub fn toggle_underline(&self) -> Option<ElementPatch> {
        match self.controls {
            VariantControls::Text { underline, .. } => Some(ElementPatch {
                underline: Some(!underline),
                ..ElementPatch::default()
            }),
            VariantControls::Image { .. } | VariantControls::Shape { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ShapeKind;

    #[test]
    fn test_empty_patch_is_identity() {
        let el = Element::text(0);
        assert!(ElementPatch::default().is_empty());
        assert_eq!(ElementPatch::default().apply(&el), el);
    }

    #[test]
    fn test_text_patch() {
        let el = Element::text(0);
        let patched = ElementPatch {
            content: Some("HELLO".into()),
            font_size: Some(500.0),
            align: Some(TextAlign::Right),
            ..ElementPatch::default()
        }
        .apply(&el);

        match patched.kind {
            ElementKind::Text {
                content,
                font_size,
                align,
                ..
            } => {
                assert_eq!(content, "HELLO");
                assert!((font_size - 120.0).abs() < f32::EPSILON);
                assert_eq!(align, TextAlign::Right);
            }
            other => panic!("expected text, got {other:?}"),
        }
        assert_eq!(patched.id, el.id);
    }

    #[test]
    fn test_mismatched_variant_fields_ignored() {
        let el = Element::shape(ShapeKind::Rectangle, 0);
        let patched = ElementPatch {
            content: Some("ignored".into()),
            opacity: Some(0.1),
            stroke_width: Some(0.0),
            ..ElementPatch::default()
        }
        .apply(&el);

        match patched.kind {
            ElementKind::Shape { stroke_width, .. } => assert!(stroke_width.abs() < f32::EPSILON),
            other => panic!("expected shape, got {other:?}"),
        }
    }

    #[test]
    fn test_geometry_clamps() {
        let el = Element::image("data:,", 0);
        let patched = ElementPatch {
            width: Some(-5.0),
            height: Some(3.0),
            rotation: Some(400.0),
            opacity: Some(1.7),
            ..ElementPatch::default()
        }
        .apply(&el);

        let t = patched.transform;
        assert!((t.width - MIN_ELEMENT_SIZE).abs() < f32::EPSILON);
        assert!((t.height - MIN_ELEMENT_SIZE).abs() < f32::EPSILON);
        assert!((t.rotation - 400.0).abs() < f32::EPSILON);
        assert!((PropertyPanel::from_element(&patched).rotation - 40.0).abs() < 1e-3);
        match patched.kind {
            ElementKind::Image { opacity, .. } => assert!((opacity - 1.0).abs() < f32::EPSILON),
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn test_panel_reads_controls() {
        let mut el = Element::image("data:,", 0);
        el = ElementPatch {
            opacity: Some(0.456),
            filter: Some(ImageFilter::Sepia),
            ..ElementPatch::default()
        }
        .apply(&el);
        el.transform.rotation = -30.0;

        let panel = PropertyPanel::from_element(&el);
        assert!((panel.rotation - 330.0).abs() < 1e-3);
        assert_eq!(
            panel.controls,
            VariantControls::Image {
                opacity_percent: 46,
                filter: ImageFilter::Sepia,
            }
        );
        assert!(panel.toggle_bold().is_none());
    }

    #[test]
    fn test_toggles_flip_current_value() {
        let el = Element::text(0);
        let panel = PropertyPanel::from_element(&el);
        let patch = panel.toggle_bold().expect("text has bold");
        let bolded = patch.apply(&el);
        let panel = PropertyPanel::from_element(&bolded);
        assert!(matches!(panel.controls, VariantControls::Text { bold: true, .. }));

        let again = panel.toggle_bold().expect("toggle").apply(&bolded);
        assert!(matches!(again.kind, ElementKind::Text { bold: false, .. }));
        assert!(PropertyPanel::from_element(&el).toggle_italic().is_some());
        assert!(PropertyPanel::from_element(&el).toggle_underline().is_some());
    }

    #[test]
    fn test_patch_deserializes_partial_json() {
        let patch: ElementPatch =
            serde_json::from_str(r##"{"stroke_width": 0, "fill": "#ff0000"}"##).expect("parse");
        assert_eq!(patch.stroke_width, Some(0.0));
        assert_eq!(patch.fill.as_deref(), Some("#ff0000"));
        assert!(patch.x.is_none());
    }
}
