//! Image loading for image elements.
//!
//! Sources are fetched through an [`ImageLoader`] (data URIs and local files by
//! default), decoded off the async runtime, and embedded into the SVG scene as
//! data URIs.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;

use crate::error::{RenderError, RenderResult};

/// Image formats recognized by their magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
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

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }

    /// MIME type for formats the rasterizer accepts as-is.
    #[must_use]
    pub const fn embeddable_mime(self) -> Option<&'static str> {
        match self {
            Self::Png => Some("image/png"),
            Self::Jpeg => Some("image/jpeg"),
            Self::WebP | Self::Unknown => None,
        }
    }
}

/// A decoded image ready to be placed in an SVG scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// `data:` URI holding PNG or JPEG bytes.
    pub href: String,
}

/// Fetches the raw bytes behind an image element's `src`.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Load the bytes for `src`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    async fn load(&self, src: &str) -> RenderResult<Vec<u8>>;
}

/// Loads `data:` URIs and local files. Relative paths resolve against
/// `base_dir` when set.
#[derive(Debug, Clone, Default)]
pub struct DefaultImageLoader {
    base_dir: Option<PathBuf>,
}

impl DefaultImageLoader {
    /// Create a loader resolving relative paths against the working directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `dir`.
    #[must_use]
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    fn resolve(&self, src: &str) -> PathBuf {
        let path = Path::new(src.strip_prefix("file://").unwrap_or(src));
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl ImageLoader for DefaultImageLoader {
    async fn load(&self, src: &str) -> RenderResult<Vec<u8>> {
        if src.starts_with("data:") {
            return decode_data_uri(src);
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            return Err(RenderError::Resource(format!(
                "remote source needs a network-capable loader: {src}"
            )));
        }

        let path = self.resolve(src);
        tokio::fs::read(&path)
            .await
            .map_err(|e| RenderError::Resource(format!("{}: {e}", path.display())))
    }
}

/// Extract the payload bytes of a data URI.
///
/// Supports formats like: `data:image/png;base64,iVBORw0KGgo...`
///
/// # Errors
///
/// Returns an error if the data URI is malformed.
pub fn decode_data_uri(uri: &str) -> RenderResult<Vec<u8>> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    let (metadata, encoded_data) = uri_data
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    if metadata.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(encoded_data.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(encoded_data)
    }
}

/// Percent-decoding for non-base64 data URIs.
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

/// Build a `data:` URI.
#[must_use]
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

/// Decode image bytes and produce an embeddable image.
///
/// PNG and JPEG bytes are embedded unchanged once they decode; other formats
/// are re-encoded as PNG.
///
/// # Errors
///
/// Returns an error if the bytes are not a decodable image.
pub fn embed_image_bytes(bytes: &[u8]) -> RenderResult<EmbeddedImage> {
    let format = ImageFormat::from_magic_bytes(bytes);
    let img = image::load_from_memory(bytes).map_err(|e| RenderError::Decode(e.to_string()))?;
    let (width, height) = (img.width(), img.height());

    let href = if let Some(mime) = format.embeddable_mime() {
        data_url(mime, bytes)
    } else {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png)
            .map_err(|e| RenderError::Decode(format!("PNG re-encoding failed: {e}")))?;
        data_url("image/png", buf.get_ref())
    };

    Ok(EmbeddedImage {
        width,
        height,
        href,
    })
}

/// Load `src` through `loader` and decode it on the blocking pool.
///
/// # Errors
///
/// Returns an error if loading or decoding fails.
pub async fn load_embedded(loader: &dyn ImageLoader, src: &str) -> RenderResult<EmbeddedImage> {
    if src.is_empty() {
        return Err(RenderError::Resource("image element has no source".to_string()));
    }
    let bytes = loader.load(src).await?;
    tokio::task::spawn_blocking(move || embed_image_bytes(&bytes)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 red pixel.
    const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_format_detection_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            ImageFormat::Jpeg
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            ImageFormat::WebP
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF"), ImageFormat::Unknown);
    }

    #[test]
    fn test_data_uri_parsing() {
        let bytes = decode_data_uri(&format!("data:image/png;base64,{PNG_BASE64}"))
            .expect("valid data uri");
        assert_eq!(ImageFormat::from_magic_bytes(&bytes), ImageFormat::Png);

        let plain = decode_data_uri("data:text/plain,a%20b").expect("percent encoded");
        assert_eq!(plain, b"a b");
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(decode_data_uri("not a data uri").is_err());
        assert!(decode_data_uri("data:image/png").is_err());
        assert!(decode_data_uri("data:text/plain,%zz").is_err());
    }

    #[test]
    fn test_embed_png_keeps_bytes() {
        let bytes = decode_data_uri(&format!("data:image/png;base64,{PNG_BASE64}")).expect("uri");
        let embedded = embed_image_bytes(&bytes).expect("decodes");
        assert_eq!((embedded.width, embedded.height), (1, 1));
        assert_eq!(embedded.href, format!("data:image/png;base64,{PNG_BASE64}"));
    }

    #[test]
    fn test_embed_garbage_fails() {
        let result = embed_image_bytes(b"\x89PNG not really");
        assert!(matches!(result, Err(RenderError::Decode(_))));
    }

    #[tokio::test]
    async fn test_default_loader_reads_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bytes = decode_data_uri(&format!("data:image/png;base64,{PNG_BASE64}")).expect("uri");
        tokio::fs::write(dir.path().join("dot.png"), &bytes)
            .await
            .expect("write");

        let loader = DefaultImageLoader::with_base_dir(dir.path());
        let embedded = load_embedded(&loader, "dot.png").await.expect("load");
        assert_eq!(embedded.width, 1);

        assert!(load_embedded(&loader, "missing.png").await.is_err());
        assert!(load_embedded(&loader, "").await.is_err());
        assert!(loader.load("https://example.com/a.png").await.is_err());
    }
}
