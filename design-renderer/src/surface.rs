//! Multi-surface rendering.
//!
//! Renders one PNG per product surface from a caller-supplied map of
//! elements per surface. Within a surface, elements paint strictly in order,
//! and each image is loaded and decoded before the next element paints.
//! Surfaces render concurrently.

use std::sync::Arc;

use design_core::element::{Element, ElementKind};
use design_core::surface::{SurfaceDefinition, SurfaceElementMap};
use design_core::{ElementId, DEFAULT_BACKGROUND};
use futures::future::join_all;
use serde::Serialize;

use crate::error::RenderResult;
use crate::loader::{data_url, load_embedded, DefaultImageLoader, ImageLoader};
use crate::raster::{encode_png, Rasterizer};
use crate::svg::SvgScene;

/// Configuration for surface rendering.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Fill painted under every surface.
    pub background_color: String,
    /// Load system fonts so text elements render.
    pub load_system_fonts: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background_color: DEFAULT_BACKGROUND.to_string(),
            load_system_fonts: true,
        }
    }
}

/// An image element that could not be painted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFailure {
    /// Surface the element belongs to.
    pub surface_key: String,
    /// The skipped element.
    pub element_id: ElementId,
    /// Why loading or decoding failed.
    pub reason: String,
}

/// One rendered surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedSurface {
    /// Surface key.
    pub key: String,
    /// Surface display name.
    pub name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of elements supplied for the surface.
    pub element_count: usize,
    /// Image elements skipped on this surface.
    pub failures: Vec<ImageFailure>,
    /// PNG bytes.
    #[serde(skip)]
    pub png: Vec<u8>,
}

impl RenderedSurface {
    /// The PNG as a `data:image/png;base64,...` URL.
    #[must_use]
    pub fn data_url(&self) -> String {
        data_url("image/png", &self.png)
    }
}

/// Rendered surfaces in catalog order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderedSurfaces {
    /// Surfaces in the order they were requested.
    pub surfaces: Vec<RenderedSurface>,
}

impl RenderedSurfaces {
    /// Look up a surface by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RenderedSurface> {
        self.surfaces.iter().find(|s| s.key == key)
    }

    /// Every skipped image across all surfaces.
    pub fn failures(&self) -> impl Iterator<Item = &ImageFailure> {
        self.surfaces.iter().flat_map(|s| s.failures.iter())
    }

    /// Number of rendered surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Whether nothing was rendered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

/// Paint `elements` into `scene` in order, loading images as they come.
/// Images that fail are skipped and reported.
pub(crate) async fn paint_elements(
    scene: &mut SvgScene,
    elements: &[Element],
    loader: &dyn ImageLoader,
    surface_key: &str,
) -> Vec<ImageFailure> {
    let mut failures = Vec::new();
    for element in elements {
        match &element.kind {
            ElementKind::Image(props) if element.visible => {
                match load_embedded(loader, &props.src).await {
                    Ok(image) => scene.push(element, Some(&image)),
                    Err(e) => {
                        tracing::warn!(
                            "skipping image {} on {surface_key}: {e}",
                            element.id
                        );
                        failures.push(ImageFailure {
                            surface_key: surface_key.to_string(),
                            element_id: element.id.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
            _ => scene.push(element, None),
        }
    }
    failures
}

/// Renders product surfaces to PNG.
pub struct MultiSurfaceRenderer {
    config: RenderConfig,
    rasterizer: Rasterizer,
    loader: Arc<dyn ImageLoader>,
}

impl std::fmt::Debug for MultiSurfaceRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiSurfaceRenderer")
            .field("config", &self.config)
            .field("rasterizer", &self.rasterizer)
            .finish_non_exhaustive()
    }
}

impl MultiSurfaceRenderer {
    /// Create a renderer with the default image loader.
    #[must_use]
    pub fn new(config: RenderConfig) -> Self {
        Self::with_loader(config, Arc::new(DefaultImageLoader::new()))
    }

    /// Create a renderer with a custom image loader.
    #[must_use]
    pub fn with_loader(config: RenderConfig, loader: Arc<dyn ImageLoader>) -> Self {
        let rasterizer = Rasterizer::new(config.load_system_fonts);
        Self {
            config,
            rasterizer,
            loader,
        }
    }

    /// The renderer configuration.
    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render every surface. Surfaces absent from `elements` render
    /// background only; map entries for unknown surfaces are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first rasterization error. Image failures are not errors;
    /// they are reported on each surface.
    pub async fn render(
        &self,
        surfaces: &[SurfaceDefinition],
        elements: &SurfaceElementMap,
    ) -> RenderResult<RenderedSurfaces> {
        for key in elements.keys() {
            if !surfaces.iter().any(|s| &s.key == key) {
                tracing::debug!("no surface '{key}' in this coverage; its elements are ignored");
            }
        }

        let jobs = surfaces.iter().map(|surface| {
            let bucket = elements.get(&surface.key).map_or(&[][..], Vec::as_slice);
            self.render_surface(surface, bucket)
        });
        let rendered = join_all(jobs)
            .await
            .into_iter()
            .collect::<RenderResult<Vec<_>>>()?;

        tracing::info!("rendered {} surfaces", rendered.len());
        Ok(RenderedSurfaces { surfaces: rendered })
    }

    /// Render a single surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene cannot be rasterized or encoded.
    pub async fn render_surface(
        &self,
        surface: &SurfaceDefinition,
        elements: &[Element],
    ) -> RenderResult<RenderedSurface> {
        let mut scene = SvgScene::for_surface(
            surface.dimensions,
            &surface.clip,
            &self.config.background_color,
        );
        let failures =
            paint_elements(&mut scene, elements, self.loader.as_ref(), &surface.key).await;

        let pixmap = self.rasterizer.rasterize_blocking(scene.finish()).await?;
        let png = encode_png(&pixmap)?;
        tracing::debug!(
            "surface {} rendered: {} elements, {} skipped",
            surface.key,
            elements.len(),
            failures.len()
        );

        Ok(RenderedSurface {
            key: surface.key.clone(),
            name: surface.name.clone(),
            width: pixmap.width(),
            height: pixmap.height(),
            element_count: elements.len(),
            failures,
            png,
        })
    }
}
