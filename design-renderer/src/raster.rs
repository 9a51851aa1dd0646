//! SVG rasterization via usvg/resvg/tiny-skia.

use std::sync::Arc;

use crate::error::{RenderError, RenderResult};

/// Rasterizes SVG scenes. Cheap to clone; the font database is shared.
#[derive(Clone)]
pub struct Rasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for Rasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rasterizer")
            .field("fonts", &self.fontdb.len())
            .finish()
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Rasterizer {
    /// Create a rasterizer, optionally loading the system fonts for text.
    #[must_use]
    pub fn new(load_system_fonts: bool) -> Self {
        let mut db = usvg::fontdb::Database::new();
        if load_system_fonts {
            db.load_system_fonts();
            tracing::debug!("loaded {} system font faces", db.len());
        }
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Rasterize an SVG string to a pixmap sized by the SVG's width/height.
    ///
    /// # Errors
    ///
    /// Returns an error if the SVG cannot be parsed or the pixmap allocated.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rasterize(&self, svg: &str) -> RenderResult<tiny_skia::Pixmap> {
        let mut opt = usvg::Options::default();
        opt.fontdb = Arc::clone(&self.fontdb);

        let tree = usvg::Tree::from_str(svg, &opt)
            .map_err(|e| RenderError::Svg(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width().ceil() as u32;
        let px_h = tree.size().height().ceil() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Svg("Failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap)
    }

    /// [`Rasterizer::rasterize`] on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// See [`Rasterizer::rasterize`]; also fails if the task is cancelled.
    pub async fn rasterize_blocking(&self, svg: String) -> RenderResult<tiny_skia::Pixmap> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.rasterize(&svg)).await?
    }
}

/// Encode a pixmap as PNG.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn encode_png(pixmap: &tiny_skia::Pixmap) -> RenderResult<Vec<u8>> {
    pixmap
        .encode_png()
        .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
}

/// RGBA of the pixel at (x, y), un-premultiplied.
#[must_use]
pub fn pixel_at(pixmap: &tiny_skia::Pixmap, x: u32, y: u32) -> Option<[u8; 4]> {
    let c = pixmap.pixel(x, y)?.demultiply();
    Some([c.red(), c.green(), c.blue(), c.alpha()])
}
