//! Image loading utilities.
//!
//! Image elements reference their pixels by `src`: a data URI, a local file
//! path (or `file://` URL), or an `http(s)` URL. Loading goes through the
//! [`ImageLoader`] trait so exports can be tested with in-memory sources.

use std::path::PathBuf;

use async_trait::async_trait;
use image::RgbaImage;
use url::Url;

use crate::error::{RenderError, RenderResult};

/// Decoded image pixels.
#[derive(Debug, Clone)]
pub struct TextureData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Straight-alpha RGBA pixel data (4 bytes per pixel).
    pub data: Vec<u8>,
    /// Format the bytes were decoded as.
    pub format: ImageFormat,
}

impl TextureData {
    /// Convert into an `image` buffer for filtering.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if the buffer size does not match the
    /// dimensions.
    pub fn into_rgba_image(self) -> RenderResult<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data)
            .ok_or_else(|| RenderError::Resource("Invalid texture data".to_string()))
    }
}

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// GIF (first frame only).
    Gif,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/webp" => Self::WebP,
            "image/gif" => Self::Gif,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        // GIF: "GIF8"
        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }

    fn decoder_format(self) -> Option<image::ImageFormat> {
        match self {
            Self::Png => Some(image::ImageFormat::Png),
            Self::Jpeg => Some(image::ImageFormat::Jpeg),
            Self::WebP => Some(image::ImageFormat::WebP),
            Self::Gif => Some(image::ImageFormat::Gif),
            Self::Unknown => None,
        }
    }
}

/// Where an image source points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Inline `data:` URI.
    DataUri(String),
    /// Remote `http`/`https` URL.
    Remote(Url),
    /// Local file.
    File(PathBuf),
}

impl ImageSource {
    /// Classify an element's `src` string.
    #[must_use]
    pub fn classify(src: &str) -> Self {
        let src = src.trim();
        if src.starts_with("data:") {
            return Self::DataUri(src.to_string());
        }
        if let Ok(url) = Url::parse(src) {
            match url.scheme() {
                "http" | "https" => return Self::Remote(url),
                "file" => {
                    if let Ok(path) = url.to_file_path() {
                        return Self::File(path);
                    }
                }
                _ => {}
            }
        }
        Self::File(PathBuf::from(src))
    }
}

/// Source of decoded image pixels.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Load and decode the image at `src`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if the source cannot be fetched or
    /// decoded.
    async fn load(&self, src: &str) -> RenderResult<TextureData>;
}

/// Loader for data URIs, local files and `http(s)` URLs.
#[derive(Debug, Clone)]
pub struct DefaultImageLoader {
    http: reqwest::Client,
}

impl DefaultImageLoader {
    /// Create a loader.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if the HTTP client fails to build.
    pub fn new() -> RenderResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("memeforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RenderError::Resource(format!("HTTP client: {e}")))?;
        Ok(Self { http })
    }

    async fn fetch(&self, url: Url) -> RenderResult<Vec<u8>> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RenderError::Resource(format!("Failed to fetch {url}: {e}")))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RenderError::Resource(format!("Failed to read {url}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageLoader for DefaultImageLoader {
    async fn load(&self, src: &str) -> RenderResult<TextureData> {
        match ImageSource::classify(src) {
            ImageSource::DataUri(uri) => load_image_from_data_uri(&uri),
            ImageSource::Remote(url) => {
                let bytes = self.fetch(url).await?;
                load_image_from_bytes(&bytes)
            }
            ImageSource::File(path) => {
                let bytes = tokio::fs::read(&path).await.map_err(|e| {
                    RenderError::Resource(format!("Failed to read {}: {e}", path.display()))
                })?;
                load_image_from_bytes(&bytes)
            }
        }
    }
}

/// Load an image from raw bytes.
///
/// # Errors
///
/// Returns an error if the image cannot be decoded.
pub fn load_image_from_bytes(data: &[u8]) -> RenderResult<TextureData> {
    decode(data, ImageFormat::Unknown)
}

/// Decode with the sniffed format, falling back to `declared` and then to
/// guessing.
fn decode(data: &[u8], declared: ImageFormat) -> RenderResult<TextureData> {
    let format = match ImageFormat::from_magic_bytes(data) {
        ImageFormat::Unknown => declared,
        sniffed => sniffed,
    };

    let img = match format.decoder_format() {
        Some(hint) => image::load_from_memory_with_format(data, hint),
        None => image::load_from_memory(data),
    }
    .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(TextureData {
        width,
        height,
        data: rgba.into_raw(),
        format,
    })
}

/// Load an image from a data URI (base64 or percent-encoded).
///
/// Supports formats like: `data:image/png;base64,iVBORw0KGgo...`. A declared
/// MIME type must be `image/*`; an empty one is accepted.
///
/// # Errors
///
/// Returns an error if the data URI is malformed, declares a non-image MIME
/// type, or the image cannot be decoded.
pub fn load_image_from_data_uri(uri: &str) -> RenderResult<TextureData> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    // Find the comma separating metadata from data
    let (metadata, encoded_data) = uri_data
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    let mime = metadata.split(';').next().unwrap_or_default().trim();
    if !mime.is_empty() && !mime.to_ascii_lowercase().starts_with("image/") {
        return Err(RenderError::Resource(format!(
            "Data URI is not an image: {mime}"
        )));
    }

    let bytes = if metadata.contains(";base64") {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(encoded_data.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(encoded_data)?
    };

    decode(&bytes, ImageFormat::from_mime(mime))
}

/// Percent-decoding of the data portion of a URI.
fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}
