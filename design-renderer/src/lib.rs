//! # Design Renderer
//!
//! Rasterizes design documents and product surfaces.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────────┐
//! │ Elements     │──▶│ SVG scene    │──▶│ usvg / resvg         │
//! │ + images     │   │ (clip, bg)   │   │ tiny-skia pixmap     │
//! └──────────────┘   └──────────────┘   └──────────┬───────────┘
//!                                                  ▼
//!                                     PNG / JPEG / PDF / data URL
//! ```
//!
//! [`MultiSurfaceRenderer`] renders one PNG per product surface;
//! [`DocumentExporter`] renders a whole document in a chosen format.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod loader;
pub mod raster;
pub mod surface;
pub mod svg;

pub use error::{RenderError, RenderResult};
pub use export::{DocumentExporter, ExportFormat, ExportOutput, ExportRequest};
pub use loader::{DefaultImageLoader, EmbeddedImage, ImageLoader};
pub use raster::Rasterizer;
pub use surface::{
    ImageFailure, MultiSurfaceRenderer, RenderConfig, RenderedSurface, RenderedSurfaces,
};
pub use svg::SvgScene;
