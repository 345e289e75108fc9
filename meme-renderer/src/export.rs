//! Document export to PNG and JPEG.
//!
//! The exporter replays a [`CanvasDocument`] onto a tiny-skia pixmap at an
//! integer scale. Every element is drawn with its own transform,
//! `scale(s) · translate(center) · rotate(rotation)`, in a local frame whose
//! origin is the element's center, which is the same composition the live
//! canvas uses.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use image::{ImageEncoder, RgbaImage};
use meme_core::{CanvasDocument, Element, ElementKind, ShapeKind};
use serde::{Deserialize, Serialize};
use tiny_skia::{
    FillRule, FilterQuality, IntSize, Paint, PathBuilder, Pattern, Pixmap, Rect, SpreadMode,
    Stroke, Transform,
};

use crate::color::Rgba;
use crate::error::{RenderError, RenderResult};
use crate::filter;
use crate::loader::{DefaultImageLoader, ImageLoader, TextureData};
use crate::text;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Default time allowed for loading one image.
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG image, lossless with alpha.
    #[default]
    Png,
    /// JPEG image, always opaque.
    #[serde(rename = "jpg", alias = "jpeg")]
    Jpeg,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// MIME type of the encoded bytes.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Whether the format can carry transparency.
    #[must_use]
    pub fn supports_alpha(self) -> bool {
        matches!(self, Self::Png)
    }
}

/// Output resolution multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// 1x.
    Low,
    /// 2x.
    Medium,
    /// 3x.
    #[default]
    High,
}

impl Quality {
    /// Integer scale factor.
    #[must_use]
    pub fn scale(self) -> u32 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

/// What the user asked for in the export dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Output format.
    pub format: ExportFormat,
    /// Output scale.
    pub quality: Quality,
    /// Skip the background fill. Only honoured for PNG.
    pub transparent: bool,
}

impl ExportOptions {
    /// Whether the background is left transparent for this request.
    #[must_use]
    pub fn leaves_background_transparent(&self) -> bool {
        self.transparent && self.format.supports_alpha()
    }
}

/// Exporter configuration.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// JPEG quality 1-100 (default: 95).
    pub jpeg_quality: u8,
    /// Time allowed for each image load (default: 10s).
    pub image_timeout: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            image_timeout: DEFAULT_IMAGE_TIMEOUT,
        }
    }
}

/// An encoded export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Suggested file name, `meme-<unix millis>.<ext>`.
    pub filename: String,
    /// MIME type.
    pub content_type: &'static str,
    /// Encoded image.
    pub bytes: Vec<u8>,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

impl ExportArtifact {
    /// Write the artifact into `dir` under its filename.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Io`] if the directory or file cannot be written.
    pub async fn write_to_dir(&self, dir: impl AsRef<Path>) -> RenderResult<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.filename);
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}

/// Renders documents to raster images.
///
/// One export runs at a time per exporter; a second call while one is in
/// flight fails with [`RenderError::ExportInProgress`].
pub struct Exporter {
    config: ExportConfig,
    loader: Arc<dyn ImageLoader>,
    busy: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Exporter {
    /// Create an exporter using the [`DefaultImageLoader`].
    ///
    /// # Errors
    ///
    /// Returns an error if the loader cannot be created.
    pub fn new(config: ExportConfig) -> RenderResult<Self> {
        Ok(Self::with_loader(config, Arc::new(DefaultImageLoader::new()?)))
    }

    /// Create an exporter with a custom image loader.
    #[must_use]
    pub fn with_loader(config: ExportConfig, loader: Arc<dyn ImageLoader>) -> Self {
        Self {
            config,
            loader,
            busy: tokio::sync::Mutex::new(()),
        }
    }

    /// The exporter configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Render and encode `document`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ExportInProgress`] if another export is running,
    /// [`RenderError::Timeout`] or [`RenderError::Decode`] naming the image
    /// element that failed, or [`RenderError::Export`] if encoding fails.
    pub async fn export(
        &self,
        document: &CanvasDocument,
        options: &ExportOptions,
    ) -> RenderResult<ExportArtifact> {
        let _guard = self
            .busy
            .try_lock()
            .map_err(|_| RenderError::ExportInProgress)?;
        let started = Instant::now();

        let pixmap = self
            .render(
                document,
                options.quality.scale(),
                options.leaves_background_transparent(),
            )
            .await?;

        let bytes = match options.format {
            ExportFormat::Png => pixmap
                .encode_png()
                .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?,
            ExportFormat::Jpeg => encode_jpeg(
                &pixmap,
                background(document),
                self.config.jpeg_quality,
            )?,
        };

        let artifact = ExportArtifact {
            filename: format!(
                "meme-{}.{}",
                current_timestamp_ms(),
                options.format.extension()
            ),
            content_type: options.format.content_type(),
            bytes,
            width: pixmap.width(),
            height: pixmap.height(),
        };
        tracing::info!(
            filename = %artifact.filename,
            width = artifact.width,
            height = artifact.height,
            bytes = artifact.bytes.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "export complete"
        );
        Ok(artifact)
    }

    /// Render `document` at `scale` without encoding.
    ///
    /// # Errors
    ///
    /// Same as [`Exporter::export`], minus encoding failures.
    pub async fn rasterize(
        &self,
        document: &CanvasDocument,
        scale: u32,
        transparent: bool,
    ) -> RenderResult<Pixmap> {
        let _guard = self
            .busy
            .try_lock()
            .map_err(|_| RenderError::ExportInProgress)?;
        self.render(document, scale, transparent).await
    }

    async fn render(
        &self,
        document: &CanvasDocument,
        scale: u32,
        transparent: bool,
    ) -> RenderResult<Pixmap> {
        let scale = scale.max(1);
        let (width, height) = document
            .width
            .checked_mul(scale)
            .zip(document.height.checked_mul(scale))
            .ok_or_else(|| RenderError::Export("Canvas size overflows".to_string()))?;
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| RenderError::Export(format!("Invalid canvas size {width}x{height}")))?;

        if !transparent {
            pixmap.fill(background(document).to_skia());
        }

        #[allow(clippy::cast_precision_loss)]
        let base = Transform::from_scale(scale as f32, scale as f32);

        for element in document.render_order() {
            let t = &element.transform;
            let (cx, cy) = t.center();
            let local = base.pre_translate(cx, cy).pre_rotate(t.rotation);
            tracing::trace!(element = %element.id, kind = element.kind.name(), "draw");

            match &element.kind {
                ElementKind::Text { .. } => {
                    text::draw_text(&mut pixmap.as_mut(), element, local)?;
                }
                ElementKind::Image {
                    src,
                    opacity,
                    filter,
                } => {
                    let texture = self.load_image(element, src).await?;
                    let image = texture
                        .into_rgba_image()
                        .map_err(|e| decode_error(element, &e))?;
                    let image = filter::apply(*filter, image, t.width);
                    draw_image(&mut pixmap, element, image, *opacity, local)?;
                }
                ElementKind::Shape {
                    shape,
                    fill,
                    stroke,
                    stroke_width,
                } => {
                    let style = ShapeStyle {
                        fill: Rgba::parse_or(fill, Rgba::BLACK),
                        stroke: Rgba::parse_or(stroke, Rgba::BLACK),
                        stroke_width: *stroke_width,
                    };
                    draw_shape(&mut pixmap, *shape, &style, t.width, t.height, local);
                }
            }
        }

        tracing::debug!(
            width,
            height,
            elements = document.element_count(),
            "rasterized"
        );
        Ok(pixmap)
    }

    async fn load_image(&self, element: &Element, src: &str) -> RenderResult<TextureData> {
        let after = self.config.image_timeout;
        match tokio::time::timeout(after, self.loader.load(src)).await {
            Ok(Ok(texture)) => {
                tracing::debug!(
                    element = %element.id,
                    format = ?texture.format,
                    width = texture.width,
                    height = texture.height,
                    "image loaded"
                );
                Ok(texture)
            }
            Ok(Err(e)) => {
                tracing::warn!(element = %element.id, "image load failed: {e}");
                Err(decode_error(element, &e))
            }
            Err(_) => {
                tracing::warn!(element = %element.id, ?after, "image load timed out");
                Err(RenderError::Timeout {
                    element: element.id.to_string(),
                    after,
                })
            }
        }
    }
}

fn decode_error(element: &Element, err: &RenderError) -> RenderError {
    RenderError::Decode {
        element: element.id.to_string(),
        reason: err.to_string(),
    }
}

fn background(document: &CanvasDocument) -> Rgba {
    Rgba::parse_or(&document.background_color, Rgba::WHITE)
}

fn solid_paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

struct ShapeStyle {
    fill: Rgba,
    stroke: Rgba,
    stroke_width: f32,
}

/// Draw a shape in the local frame `(-w/2, -h/2, w, h)`.
fn draw_shape(
    pixmap: &mut Pixmap,
    shape: ShapeKind,
    style: &ShapeStyle,
    w: f32,
    h: f32,
    transform: Transform,
) {
    let Some(rect) = Rect::from_xywh(-w / 2.0, -h / 2.0, w, h) else {
        tracing::warn!(w, h, "skipping shape with degenerate box");
        return;
    };
    let fill = solid_paint(style.fill);
    let stroke_paint = solid_paint(style.stroke);
    let stroke = Stroke {
        width: style.stroke_width,
        ..Stroke::default()
    };
    let stroked = style.stroke_width > 0.0;

    match shape {
        ShapeKind::Rectangle => {
            pixmap.fill_rect(rect, &fill, transform, None);
            if stroked {
                let path = PathBuilder::from_rect(rect);
                pixmap.stroke_path(&path, &stroke_paint, &stroke, transform, None);
            }
        }
        ShapeKind::Circle => {
            if let Some(path) = PathBuilder::from_oval(rect) {
                pixmap.fill_path(&path, &fill, FillRule::Winding, transform, None);
                if stroked {
                    pixmap.stroke_path(&path, &stroke_paint, &stroke, transform, None);
                }
            }
        }
        ShapeKind::Line => {
            if !stroked {
                return;
            }
            let mut pb = PathBuilder::new();
            pb.move_to(-w / 2.0, 0.0);
            pb.line_to(w / 2.0, 0.0);
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(&path, &stroke_paint, &stroke, transform, None);
            }
        }
    }
}

/// Stretch `image` over the element box with the given opacity.
fn draw_image(
    pixmap: &mut Pixmap,
    element: &Element,
    image: RgbaImage,
    opacity: f32,
    transform: Transform,
) -> RenderResult<()> {
    let (w, h) = (element.transform.width, element.transform.height);
    let Some(rect) = Rect::from_xywh(-w / 2.0, -h / 2.0, w, h) else {
        tracing::warn!(element = %element.id, "skipping image with degenerate box");
        return Ok(());
    };

    #[allow(clippy::cast_precision_loss)]
    let (iw, ih) = (image.width() as f32, image.height() as f32);
    let source = premultiplied_pixmap(image).ok_or_else(|| RenderError::Decode {
        element: element.id.to_string(),
        reason: "image has no pixels".to_string(),
    })?;

    let paint = Paint {
        shader: Pattern::new(
            source.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bilinear,
            opacity.clamp(0.0, 1.0),
            Transform::from_row(w / iw, 0.0, 0.0, h / ih, -w / 2.0, -h / 2.0),
        ),
        anti_alias: true,
        ..Paint::default()
    };
    pixmap.fill_rect(rect, &paint, transform, None);
    Ok(())
}

/// Convert straight-alpha RGBA into a premultiplied pixmap.
fn premultiplied_pixmap(image: RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let mut data = image.into_raw();
    for pixel in data.chunks_exact_mut(4) {
        let alpha = u16::from(pixel[3]);
        for c in &mut pixel[..3] {
            *c = u8::try_from((u16::from(*c) * alpha + 127) / 255).unwrap_or(u8::MAX);
        }
    }
    Pixmap::from_vec(data, size)
}

/// Encode a premultiplied pixmap as JPEG, flattening alpha onto `bg`.
fn encode_jpeg(pixmap: &Pixmap, bg: Rgba, quality: u8) -> RenderResult<Vec<u8>> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let mut rgb_data = Vec::with_capacity(pixmap.data().len() / 4 * 3);
    for pixel in pixmap.data().chunks_exact(4) {
        let inv = 1.0 - f32::from(pixel[3]) / 255.0;
        rgb_data.push(channel(f32::from(bg.r).mul_add(inv, f32::from(pixel[0]))));
        rgb_data.push(channel(f32::from(bg.g).mul_add(inv, f32::from(pixel[1]))));
        rgb_data.push(channel(f32::from(bg.b).mul_add(inv, f32::from(pixel[2]))));
    }

    let mut buf = std::io::Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .write_image(&rgb_data, width, height, image::ColorType::Rgb8.into())
        .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Get the current Unix timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_metadata() {
        assert_eq!(ExportFormat::Png.extension(), "png");
        assert_eq!(ExportFormat::Jpeg.extension(), "jpg");
        assert_eq!(ExportFormat::Png.content_type(), "image/png");
        assert_eq!(ExportFormat::Jpeg.content_type(), "image/jpeg");
        assert!(ExportFormat::Png.supports_alpha());
        assert!(!ExportFormat::Jpeg.supports_alpha());
    }

    #[test]
    fn test_quality_scales() {
        assert_eq!(Quality::Low.scale(), 1);
        assert_eq!(Quality::Medium.scale(), 2);
        assert_eq!(Quality::High.scale(), 3);
    }

    #[test]
    fn test_defaults_match_dialog() {
        let options = ExportOptions::default();
        assert_eq!(options.format, ExportFormat::Png);
        assert_eq!(options.quality, Quality::High);
        assert!(!options.transparent);

        let config = ExportConfig::default();
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.image_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_transparent_only_for_png() {
        let png = ExportOptions {
            transparent: true,
            ..ExportOptions::default()
        };
        assert!(png.leaves_background_transparent());
        let jpg = ExportOptions {
            format: ExportFormat::Jpeg,
            ..png
        };
        assert!(!jpg.leaves_background_transparent());
    }

    #[test]
    fn test_options_deserialize_from_dialog_strings() {
        let options: ExportOptions =
            serde_json::from_str(r#"{"format":"jpg","quality":"medium"}"#).expect("parse");
        assert_eq!(options.format, ExportFormat::Jpeg);
        assert_eq!(options.quality, Quality::Medium);
        assert!(!options.transparent);
    }

    #[test]
    fn test_premultiply() {
        let image = RgbaImage::from_pixel(1, 1, image::Rgba([255, 100, 0, 128]));
        let pixmap = premultiplied_pixmap(image).expect("pixmap");
        assert_eq!(pixmap.data(), &[128, 50, 0, 128]);
        assert!(premultiplied_pixmap(RgbaImage::new(0, 0)).is_none());
    }

    #[test]
    fn test_jpeg_flattens_onto_background() {
        // fully transparent pixmap flattens to the background color
        let pixmap = Pixmap::new(8, 8).expect("pixmap");
        let jpeg = encode_jpeg(&pixmap, Rgba::rgb(255, 0, 0), 95).expect("jpeg");
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&jpeg).expect("decode").to_rgb8();
        let [r, g, b] = decoded.get_pixel(4, 4).0;
        assert!(r > 240 && g < 16 && b < 16, "got {r},{g},{b}");
    }
}
