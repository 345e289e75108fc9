//! Text layout through usvg.
//!
//! Each text element becomes a small standalone SVG the size of its box.
//! Lines are `<tspan>`s with a central dominant baseline, so the middle of the
//! line block sits on the vertical center of the box. resvg draws the tree
//! with the element's own transform, offset so the SVG origin lands on the
//! box's top-left corner.

use std::fmt::Write;
use std::sync::{Arc, OnceLock};

use meme_core::{Element, ElementKind, TextAlign};
use usvg::fontdb;

use crate::error::{RenderError, RenderResult};

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.2;

static FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();

/// Shared system font database, loaded on first use.
#[must_use]
pub fn font_database() -> Arc<fontdb::Database> {
    Arc::clone(FONTS.get_or_init(|| {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        let has_arial = db
            .faces()
            .any(|face| face.families.iter().any(|(name, _)| name == "Arial"));
        if !has_arial {
            let fallback = db
                .faces()
                .find_map(|face| face.families.first().map(|(name, _)| name.clone()));
            if let Some(family) = fallback {
                tracing::debug!(%family, "Arial unavailable, using fallback sans-serif");
                db.set_sans_serif_family(family);
            }
        }
        tracing::debug!(faces = db.len(), "font database loaded");
        Arc::new(db)
    }))
}

/// Whether any font faces are available for text rendering.
#[must_use]
pub fn has_fonts() -> bool {
    !font_database().is_empty()
}

/// Build the SVG for a text element, or `None` for other variants.
#[must_use]
pub fn text_svg(element: &Element) -> Option<String> {
    let ElementKind::Text {
        content,
        font_size,
        font_family,
        color,
        bold,
        italic,
        underline,
        align,
    } = &element.kind
    else {
        return None;
    };

    let w = element.transform.width.max(1.0);
    let h = element.transform.height.max(1.0);
    let (anchor, x) = match align {
        TextAlign::Left => ("start", 0.0),
        TextAlign::Center => ("middle", w / 2.0),
        TextAlign::Right => ("end", w),
    };

    let lines: Vec<&str> = content.split('\n').collect();
    let line_height = font_size * LINE_HEIGHT;
    #[allow(clippy::cast_precision_loss)]
    let first = (lines.len() as f32 - 1.0).mul_add(-line_height / 2.0, h / 2.0);

    let mut svg = String::with_capacity(256 + content.len());
    // Writing to a String cannot fail.
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\">\
         <text font-family=\"{family}, sans-serif\" font-size=\"{font_size}\" \
         font-weight=\"{weight}\" font-style=\"{style}\" text-decoration=\"{decoration}\" \
         fill=\"{fill}\" text-anchor=\"{anchor}\" dominant-baseline=\"central\" \
         xml:space=\"preserve\">",
        family = escape_xml(font_family),
        weight = if *bold { "bold" } else { "normal" },
        style = if *italic { "italic" } else { "normal" },
        decoration = if *underline { "underline" } else { "none" },
        fill = escape_xml(color),
    );
    for (i, line) in lines.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let y = (i as f32).mul_add(line_height, first);
        // Writing to a String cannot fail.
        let _ = write!(
            svg,
            "<tspan x=\"{x}\" y=\"{y}\">{}</tspan>",
            escape_xml(line)
        );
    }
    svg.push_str("</text></svg>");
    Some(svg)
}

/// Draw a text element. `transform` maps the element's local frame (origin
/// at the box center) to pixmap pixels.
///
/// # Errors
///
/// Returns [`RenderError::Export`] if the generated SVG cannot be parsed.
pub fn draw_text(
    pixmap: &mut tiny_skia::PixmapMut<'_>,
    element: &Element,
    transform: tiny_skia::Transform,
) -> RenderResult<()> {
    let Some(svg) = text_svg(element) else {
        return Ok(());
    };

    let options = usvg::Options {
        fontdb: font_database(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(&svg, &options)
        .map_err(|e| RenderError::Export(format!("Text layout failed for {}: {e}", element.id)))?;

    let t = &element.transform;
    resvg::render(
        &tree,
        transform.pre_translate(-t.width.max(1.0) / 2.0, -t.height.max(1.0) / 2.0),
        pixmap,
    );
    Ok(())
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use meme_core::{ElementPatch, ShapeKind};

    fn text(content: &str, align: TextAlign) -> Element {
        ElementPatch {
            content: Some(content.to_string()),
            align: Some(align),
            font_size: Some(20.0),
            ..ElementPatch::default()
        }
        .apply(&Element::text(0))
    }

    #[test]
    fn test_non_text_has_no_svg() {
        assert!(text_svg(&Element::shape(ShapeKind::Circle, 0)).is_none());
    }

    #[test]
    fn test_lines_are_centred_on_box() {
        // default box is 300x100, line height 24
        let svg = text_svg(&text("a\nb\nc", TextAlign::Center)).expect("svg");
        assert_eq!(svg.matches("<tspan").count(), 3);
        assert!(svg.contains("x=\"150\" y=\"26\""));
        assert!(svg.contains("x=\"150\" y=\"50\""));
        assert!(svg.contains("x=\"150\" y=\"74\""));
        assert!(svg.contains("text-anchor=\"middle\""));
        assert!(svg.contains("dominant-baseline=\"central\""));
    }

    #[test]
    fn test_alignment_anchors() {
        let left = text_svg(&text("x", TextAlign::Left)).expect("svg");
        assert!(left.contains("text-anchor=\"start\""));
        assert!(left.contains("x=\"0\""));
        let right = text_svg(&text("x", TextAlign::Right)).expect("svg");
        assert!(right.contains("text-anchor=\"end\""));
        assert!(right.contains("x=\"300\""));
    }

    #[test]
    fn test_style_attributes() {
        let element = ElementPatch {
            bold: Some(true),
            italic: Some(true),
            underline: Some(true),
            ..ElementPatch::default()
        }
        .apply(&Element::text(0));
        let svg = text_svg(&element).expect("svg");
        assert!(svg.contains("font-weight=\"bold\""));
        assert!(svg.contains("font-style=\"italic\""));
        assert!(svg.contains("text-decoration=\"underline\""));
        assert!(svg.contains("font-family=\"Arial, sans-serif\""));
    }

    #[test]
    fn test_content_is_escaped() {
        let svg = text_svg(&text("A < B & \"C\"", TextAlign::Center)).expect("svg");
        assert!(svg.contains("A &lt; B &amp; &quot;C&quot;"));
    }

    #[test]
    fn test_generated_svg_parses() {
        let svg = text_svg(&text("TOP\nBOTTOM", TextAlign::Center)).expect("svg");
        let options = usvg::Options {
            fontdb: font_database(),
            ..usvg::Options::default()
        };
        assert!(usvg::Tree::from_str(&svg, &options).is_ok());
    }
}
