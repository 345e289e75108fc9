//! Canvas elements - the building blocks of a meme.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CanvasError, CanvasResult};

/// Smallest width or height, in document pixels, an element may be resized to.
pub const MIN_ELEMENT_SIZE: f32 = 20.0;

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an element ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidId`] if the string is not a UUID.
    pub fn parse(s: &str) -> CanvasResult<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| CanvasError::InvalidId(format!("{s}: {e}")))
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Horizontal text alignment inside the element box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Anchor lines at the left edge.
    Left,
    /// Center lines horizontally.
    #[default]
    Center,
    /// Anchor lines at the right edge.
    Right,
}

/// The fixed set of image filters, serialized as CSS filter strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageFilter {
    /// No filter.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Full grayscale.
    #[serde(rename = "grayscale(100%)")]
    Grayscale,
    /// Full sepia tone.
    #[serde(rename = "sepia(100%)")]
    Sepia,
    /// Gaussian blur with a 5px standard deviation.
    #[serde(rename = "blur(5px)")]
    Blur,
    /// 150% brightness.
    #[serde(rename = "brightness(150%)")]
    Brightness,
    /// 150% contrast.
    #[serde(rename = "contrast(150%)")]
    Contrast,
}

impl ImageFilter {
    /// Every selectable filter, in menu order.
    pub const ALL: [Self; 6] = [
        Self::None,
        Self::Grayscale,
        Self::Sepia,
        Self::Blur,
        Self::Brightness,
        Self::Contrast,
    ];

    /// The CSS filter descriptor for this filter.
    #[must_use]
    pub fn css(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Grayscale => "grayscale(100%)",
            Self::Sepia => "sepia(100%)",
            Self::Blur => "blur(5px)",
            Self::Brightness => "brightness(150%)",
            Self::Contrast => "contrast(150%)",
        }
    }

    /// Parse a CSS filter descriptor from the fixed set.
    #[must_use]
    pub fn from_css(css: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.css() == css.trim())
    }

    /// Menu label shown next to the filter.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Grayscale => "Grayscale",
            Self::Sepia => "Sepia",
            Self::Blur => "Blur",
            Self::Brightness => "Bright",
            Self::Contrast => "Contrast",
        }
    }
}

/// Geometric primitive drawn by a shape element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Filled and stroked rectangle covering the box.
    Rectangle,
    /// Ellipse inscribed in the box.
    Circle,
    /// Horizontal stroke through the vertical center of the box.
    Line,
}

/// The type of content an element contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A text block.
    Text {
        /// Text content; `\n` separates lines.
        content: String,
        /// Font size in pixels.
        font_size: f32,
        /// Font family name.
        font_family: String,
        /// Text color as CSS hex.
        color: String,
        /// Bold weight.
        bold: bool,
        /// Italic style.
        italic: bool,
        /// Underline decoration.
        underline: bool,
        /// Horizontal alignment.
        align: TextAlign,
    },

    /// A raster image.
    Image {
        /// Image source: a data URI or a file path.
        src: String,
        /// Opacity in `[0, 1]`.
        opacity: f32,
        /// Filter applied when drawing.
        filter: ImageFilter,
    },

    /// A vector shape.
    Shape {
        /// Which primitive to draw.
        shape: ShapeKind,
        /// Fill color as CSS hex.
        fill: String,
        /// Stroke color as CSS hex.
        stroke: String,
        /// Stroke width in pixels; zero disables the stroke.
        stroke_width: f32,
    },
}

impl ElementKind {
    /// Short lowercase name of the variant.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Shape { .. } => "shape",
        }
    }
}

/// Position, size, rotation and stacking of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// X position of the top-left corner (pixels from left).
    pub x: f32,
    /// Y position of the top-left corner (pixels from top).
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Rotation in degrees about the box center.
    pub rotation: f32,
    /// Z-index for layering.
    pub z_index: i32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
            z_index: 0,
        }
    }
}

impl Transform {
    /// Center of the bounding box.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Rotation mapped into `[0, 360)` for display.
    #[must_use]
    pub fn normalized_rotation(&self) -> f32 {
        let r = self.rotation.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negative inputs
        if r >= 360.0 {
            0.0
        } else {
            r
        }
    }

    /// Map a document-space point into the unrotated frame centered on the box.
    #[must_use]
    pub fn to_local(&self, x: f32, y: f32) -> (f32, f32) {
        let (cx, cy) = self.center();
        let (sin, cos) = (-self.rotation.to_radians()).sin_cos();
        let (dx, dy) = (x - cx, y - cy);
        (dx * cos - dy * sin, dx * sin + dy * cos)
    }

    /// Map a point from the centered local frame back into document space.
    #[must_use]
    pub fn to_document(&self, lx: f32, ly: f32) -> (f32, f32) {
        let (cx, cy) = self.center();
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        (cx + lx * cos - ly * sin, cy + lx * sin + ly * cos)
    }
}

/// A canvas element with content and transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique identifier.
    pub id: ElementId,
    /// Element content type.
    #[serde(flatten)]
    pub kind: ElementKind,
    /// Position and size.
    pub transform: Transform,
}

impl Element {
    /// Create a new element with the given kind.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: ElementId::new(),
            kind,
            transform: Transform::default(),
        }
    }

    /// Default text element at the given stacking position.
    #[must_use]
    pub fn text(z_index: i32) -> Self {
        Self::new(ElementKind::Text {
            content: "Your Text Here".to_string(),
            font_size: 32.0,
            font_family: "Arial".to_string(),
            color: "#000000".to_string(),
            bold: false,
            italic: false,
            underline: false,
            align: TextAlign::Center,
        })
        .with_transform(Transform {
            x: 100.0,
            y: 100.0,
            width: 300.0,
            height: 100.0,
            rotation: 0.0,
            z_index,
        })
    }

    /// Default image element showing `src`.
    #[must_use]
    pub fn image(src: impl Into<String>, z_index: i32) -> Self {
        Self::new(ElementKind::Image {
            src: src.into(),
            opacity: 1.0,
            filter: ImageFilter::None,
        })
        .with_transform(Transform {
            x: 100.0,
            y: 100.0,
            width: 400.0,
            height: 400.0,
            rotation: 0.0,
            z_index,
        })
    }

    /// Default shape element. Lines start wide and short.
    #[must_use]
    pub fn shape(shape: ShapeKind, z_index: i32) -> Self {
        let (width, height) = match shape {
            ShapeKind::Line => (300.0, 20.0),
            ShapeKind::Rectangle | ShapeKind::Circle => (200.0, 200.0),
        };
        Self::new(ElementKind::Shape {
            shape,
            fill: "#3B82F6".to_string(),
            stroke: "#1E40AF".to_string(),
            stroke_width: 2.0,
        })
        .with_transform(Transform {
            x: 200.0,
            y: 200.0,
            width,
            height,
            rotation: 0.0,
            z_index,
        })
    }

    /// Set the transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Check if a point (in document coordinates) is within this element's
    /// rotated bounding box.
    #[must_use]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        let t = &self.transform;
        let (lx, ly) = t.to_local(x, y);
        lx.abs() <= t.width / 2.0 && ly.abs() <= t.height / 2.0
    }
}
