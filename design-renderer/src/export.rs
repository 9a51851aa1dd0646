//! Document export to image/document formats.
//!
//! Renders a [`DesignDocument`] to PNG, JPEG, SVG or PDF using an SVG
//! intermediate representation and the resvg/tiny-skia rasterization pipeline.

use std::str::FromStr;
use std::sync::Arc;

use design_core::DesignDocument;
use image::ImageEncoder;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::loader::{data_url, DefaultImageLoader, ImageLoader};
use crate::raster::{encode_png, Rasterizer};
use crate::surface::{paint_elements, ImageFailure, RenderConfig};
use crate::svg::SvgScene;

/// Surface key reported on image failures during document export.
pub const DOCUMENT_SURFACE_KEY: &str = "document";

/// Default JPEG quality on the 0..=1 scale.
pub const DEFAULT_QUALITY: f32 = 0.85;

/// Export output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG image.
    #[default]
    Png,
    /// JPEG image.
    #[serde(alias = "jpeg")]
    Jpg,
    /// PDF document with the raster embedded on one page.
    Pdf,
    /// SVG markup.
    Svg,
}

impl ExportFormat {
    /// MIME type of the encoded output.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
            Self::Pdf => "application/pdf",
            Self::Svg => "image/svg+xml",
        }
    }

    /// Conventional file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Pdf => "pdf",
            Self::Svg => "svg",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "pdf" => Ok(Self::Pdf),
            "svg" => Ok(Self::Svg),
            other => Err(RenderError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// What to export and how.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Output format.
    #[serde(default)]
    pub format: ExportFormat,
    /// JPEG quality from 0 to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f32>,
    /// Pixel ratio applied to the canvas size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    /// Background override; the document's own background otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl ExportRequest {
    /// A request for `format` with defaults otherwise.
    #[must_use]
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn jpeg_quality(&self) -> u8 {
        let q = self.quality.unwrap_or(DEFAULT_QUALITY).clamp(0.0, 1.0);
        ((q * 100.0).round() as u8).max(1)
    }

    fn scale(&self) -> f32 {
        match self.scale {
            Some(s) if s.is_finite() && s > 0.0 => s,
            _ => 1.0,
        }
    }
}

/// Encoded export result.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    /// Output format.
    pub format: ExportFormat,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// Image elements that were skipped.
    pub failures: Vec<ImageFailure>,
}

impl ExportOutput {
    /// MIME type of [`ExportOutput::bytes`].
    #[must_use]
    pub const fn mime(&self) -> &'static str {
        self.format.mime()
    }

    /// The output as a base64 `data:` URL.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        data_url(self.mime(), &self.bytes)
    }
}

/// Exports a [`DesignDocument`] to various image and document formats.
pub struct DocumentExporter {
    rasterizer: Rasterizer,
    loader: Arc<dyn ImageLoader>,
    dpi: f32,
}

impl std::fmt::Debug for DocumentExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentExporter")
            .field("rasterizer", &self.rasterizer)
            .field("dpi", &self.dpi)
            .finish_non_exhaustive()
    }
}

impl DocumentExporter {
    /// Create an exporter with the default image loader.
    #[must_use]
    pub fn new(config: &RenderConfig) -> Self {
        Self::with_loader(config, Arc::new(DefaultImageLoader::new()))
    }

    /// Create an exporter with a custom image loader.
    #[must_use]
    pub fn with_loader(config: &RenderConfig, loader: Arc<dyn ImageLoader>) -> Self {
        Self {
            rasterizer: Rasterizer::new(config.load_system_fonts),
            loader,
            dpi: 96.0,
        }
    }

    /// Export a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be rendered or encoded.
    pub async fn export(
        &self,
        doc: &DesignDocument,
        request: &ExportRequest,
    ) -> RenderResult<ExportOutput> {
        let (out_w, out_h) = output_dimensions(doc, request.scale());
        let size = doc.canvas_size();
        let background = request
            .background_color
            .as_deref()
            .unwrap_or_else(|| doc.background_color());

        let mut scene = SvgScene::new(size.width, size.height, out_w, out_h, background);
        let failures = paint_elements(
            &mut scene,
            doc.elements(),
            self.loader.as_ref(),
            DOCUMENT_SURFACE_KEY,
        )
        .await;
        let svg = scene.finish();

        let bytes = match request.format {
            ExportFormat::Svg => svg.into_bytes(),
            ExportFormat::Png => encode_png(&self.rasterizer.rasterize_blocking(svg).await?)?,
            ExportFormat::Jpg => {
                let pixmap = self.rasterizer.rasterize_blocking(svg).await?;
                let quality = request.jpeg_quality();
                tokio::task::spawn_blocking(move || encode_jpeg(&pixmap, quality)).await??
            }
            ExportFormat::Pdf => {
                let png = encode_png(&self.rasterizer.rasterize_blocking(svg).await?)?;
                self.render_pdf(&png, out_w, out_h)?
            }
        };

        tracing::info!(
            "exported {} elements as {} ({out_w}x{out_h}, {} bytes)",
            doc.element_count(),
            request.format,
            bytes.len()
        );
        Ok(ExportOutput {
            format: request.format,
            width: out_w,
            height: out_h,
            bytes,
            failures,
        })
    }

    /// Embed a PNG raster in a single-page PDF sized to it at the exporter DPI.
    #[cfg(feature = "pdf")]
    #[allow(clippy::cast_precision_loss, clippy::unused_self)]
    fn render_pdf(&self, png_data: &[u8], out_w: u32, out_h: u32) -> RenderResult<Vec<u8>> {
        // Convert pixel dimensions to mm: pixels / dpi * 25.4
        let page_width_mm = out_w as f32 / self.dpi * 25.4;
        let page_height_mm = out_h as f32 / self.dpi * 25.4;

        let (doc, page1, layer1) = printpdf::PdfDocument::new(
            "Design Export",
            printpdf::Mm(page_width_mm),
            printpdf::Mm(page_height_mm),
            "Layer 1",
        );
        let current_layer = doc.get_page(page1).get_layer(layer1);

        // Decode with printpdf's bundled image crate for compatibility
        let dynamic_image = printpdf::image_crate::load_from_memory(png_data)
            .map_err(|e| RenderError::Export(format!("Failed to decode PNG for PDF: {e}")))?;
        let pdf_image = printpdf::Image::from_dynamic_image(&dynamic_image);

        let transform = printpdf::ImageTransform {
            translate_x: Some(printpdf::Mm(0.0)),
            translate_y: Some(printpdf::Mm(0.0)),
            dpi: Some(self.dpi),
            ..Default::default()
        };
        pdf_image.add_to_layer(current_layer, transform);

        doc.save_to_bytes()
            .map_err(|e| RenderError::Export(format!("PDF save failed: {e}")))
    }

    #[cfg(not(feature = "pdf"))]
    #[allow(clippy::unused_self)]
    fn render_pdf(&self, _png_data: &[u8], _out_w: u32, _out_h: u32) -> RenderResult<Vec<u8>> {
        Err(RenderError::UnsupportedFormat(
            "pdf (built without the `pdf` feature)".to_string(),
        ))
    }
}

/// Output dimensions (width, height) in pixels.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn output_dimensions(doc: &DesignDocument, scale: f32) -> (u32, u32) {
    let size = doc.canvas_size();
    let scale = f64::from(scale);
    let out_w = (size.width.max(1.0) * scale).round() as u32;
    let out_h = (size.height.max(1.0) * scale).round() as u32;
    (out_w.max(1), out_h.max(1))
}

/// Flatten a pixmap onto white and encode it as JPEG.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn encode_jpeg(pixmap: &tiny_skia::Pixmap, quality: u8) -> RenderResult<Vec<u8>> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let mut rgb_data = Vec::with_capacity((width * height * 3) as usize);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        let alpha = f32::from(c.alpha()) / 255.0;
        let white = 255.0 * (1.0 - alpha);
        rgb_data.push(f32::from(c.red()).mul_add(alpha, white) as u8);
        rgb_data.push(f32::from(c.green()).mul_add(alpha, white) as u8);
        rgb_data.push(f32::from(c.blue()).mul_add(alpha, white) as u8);
    }

    let mut buf = std::io::Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .write_image(&rgb_data, width, height, image::ColorType::Rgb8.into())
        .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}
