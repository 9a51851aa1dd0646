//! # Design Core
//!
//! Document model and editing engine for the print canvas editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 design-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Model           │  Editing                 │
//! │  - Elements      │  - Commands / mutations  │
//! │  - Documents     │  - Undo/redo history     │
//! │  - Validation    │  - Transform resolution  │
//! ├─────────────────────────────────────────────┤
//! │  Products: surface catalog, templates       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Everything here is synchronous and free of I/O. Rendering lives in
//! `design-renderer`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod document;
pub mod element;
pub mod error;
pub mod history;
pub mod mutation;
pub mod patch;
pub mod schema;
pub mod session;
pub mod surface;
pub mod template;
pub mod transform;

pub use document::{CanvasSize, DesignDocument, DEFAULT_BACKGROUND};
pub use element::{
    CircleProps, Element, ElementId, ElementKind, FontStyle, Height, ImageProps, LineProps,
    PolygonProps, RectProps, StarProps, TextAlign, TextDecoration, TextProps, TextWrap,
    Transform, VerticalAlign,
};
pub use error::{CanvasError, CanvasResult};
pub use history::{CoalesceKey, History, HistoryConfig};
pub use mutation::{apply, Applied, Change, Command, ZOrder};
pub use patch::ElementPatch;
pub use schema::{is_valid_canvas_data, validate_canvas_data, validate_element, ValidationError};
pub use session::{EditorSession, SessionConfig};
pub use surface::{
    catalog, catalog_for, Dimensions, ProductType, SurfaceClip, SurfaceDefinition,
    SurfaceElementMap,
};
pub use template::Template;
pub use transform::{resolve, TransformGesture, TransformPolicy};

/// Design core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
