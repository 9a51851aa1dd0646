//! Product surface catalog.
//!
//! A product is printed on one or more physical surfaces. The coverage option
//! chosen at checkout decides which of them carry a design.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CanvasError, CanvasResult, Element};

/// Width of a tent canopy panel in pixels.
pub const CANOPY_WIDTH: u32 = 1160;
/// Height of a tent canopy panel in pixels.
pub const CANOPY_HEIGHT: u32 = 1049;
/// Y of the canopy triangle's base.
pub const CANOPY_BASE_Y: f64 = 789.0;
/// Y of the bottom edge of the valence band under the canopy triangle.
pub const VALENCE_BOTTOM_Y: f64 = 1009.0;

const TENT_WALL: Dimensions = Dimensions::new(1160, 800);
const TIN_FACE: Dimensions = Dimensions::new(1000, 700);
const TIN_LID_RIM: Dimensions = Dimensions::new(3400, 120);
const TIN_SIDE_WRAP: Dimensions = Dimensions::new(3400, 300);

/// Surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Printable region of a surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum SurfaceClip {
    /// The whole rectangle is printable.
    #[default]
    Rect,
    /// Tent canopy panel: a triangle with its apex at the top plus a
    /// full-width valence band directly beneath its base.
    Canopy {
        /// X of the apex.
        #[serde(rename = "apexX")]
        apex_x: f64,
        /// Y of the triangle base and top of the valence band.
        #[serde(rename = "baseY")]
        base_y: f64,
        /// Y of the bottom of the valence band.
        #[serde(rename = "valenceBottom")]
        valence_bottom: f64,
    },
}

impl SurfaceClip {
    /// The canopy silhouette for a panel of the given width.
    #[must_use]
    pub fn canopy(width: u32) -> Self {
        Self::Canopy {
            apex_x: f64::from(width) / 2.0,
            base_y: CANOPY_BASE_Y,
            valence_bottom: VALENCE_BOTTOM_Y,
        }
    }

    /// Whether a point on a surface of `dims` lies in the printable region.
    #[must_use]
    pub fn contains_point(&self, dims: Dimensions, x: f64, y: f64) -> bool {
        let width = f64::from(dims.width);
        let height = f64::from(dims.height);
        if x < 0.0 || y < 0.0 || x > width || y > height {
            return false;
        }
        match *self {
            Self::Rect => true,
            Self::Canopy {
                apex_x,
                base_y,
                valence_bottom,
            } => {
                if y >= base_y {
                    return y <= valence_bottom;
                }
                // Half-width of the triangle grows linearly from the apex.
                let t = y / base_y;
                let left = apex_x - apex_x * t;
                let right = apex_x + (width - apex_x) * t;
                x >= left && x <= right
            }
        }
    }
}

/// One printable face of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDefinition {
    /// Stable surface key, e.g. `canopy_front`.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Pixel size.
    pub dimensions: Dimensions,
    /// Printable region.
    #[serde(default)]
    pub clip: SurfaceClip,
}

impl SurfaceDefinition {
    fn new(key: &str, name: &str, dimensions: Dimensions) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            dimensions,
            clip: SurfaceClip::Rect,
        }
    }

    fn canopy(key: &str, name: &str) -> Self {
        Self {
            clip: SurfaceClip::canopy(CANOPY_WIDTH),
            ..Self::new(key, name, Dimensions::new(CANOPY_WIDTH, CANOPY_HEIGHT))
        }
    }
}

/// Elements placed on each surface, keyed by surface key. Supplied by the
/// caller; the core never derives it.
pub type SurfaceElementMap = BTreeMap<String, Vec<Element>>;

/// Products with a surface catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    /// Printed tin.
    Tin,
    /// Pop-up tent.
    Tent,
}

impl ProductType {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tin => "tin",
            Self::Tent => "tent",
        }
    }

    /// Coverage options offered for this product.
    #[must_use]
    pub const fn coverage_options(self) -> &'static [&'static str] {
        match self {
            Self::Tin => &["front-only", "front-back", "all-surfaces"],
            Self::Tent => &["canopy-only", "canopy-backwall", "all-sides"],
        }
    }
}

impl FromStr for ProductType {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tin" => Ok(Self::Tin),
            "tent" => Ok(Self::Tent),
            _ => Err(CanvasError::UnknownProduct(s.to_string())),
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn canopy_panels() -> Vec<SurfaceDefinition> {
    vec![
        SurfaceDefinition::canopy("canopy_front", "Canopy Front"),
        SurfaceDefinition::canopy("canopy_back", "Canopy Back"),
        SurfaceDefinition::canopy("canopy_left", "Canopy Left"),
        SurfaceDefinition::canopy("canopy_right", "Canopy Right"),
    ]
}

/// Surfaces in use for a product and coverage option, in display order.
///
/// # Errors
///
/// Returns [`CanvasError::UnknownCoverage`] if the option is not offered for
/// the product.
pub fn catalog(product: ProductType, coverage: &str) -> CanvasResult<Vec<SurfaceDefinition>> {
    let front = || SurfaceDefinition::new("front", "Front", TIN_FACE);
    let back = || SurfaceDefinition::new("back", "Back", TIN_FACE);
    let backwall = || SurfaceDefinition::new("backwall", "Back Wall", TENT_WALL);

    let surfaces = match (product, coverage) {
        (ProductType::Tin, "front-only") => vec![front()],
        (ProductType::Tin, "front-back") => vec![front(), back()],
        (ProductType::Tin, "all-surfaces") => vec![
            front(),
            back(),
            SurfaceDefinition::new("lid_rim", "Lid Rim", TIN_LID_RIM),
            SurfaceDefinition::new("side_wrap", "Side Wrap", TIN_SIDE_WRAP),
        ],
        (ProductType::Tent, "canopy-only") => canopy_panels(),
        (ProductType::Tent, "canopy-backwall") => {
            let mut surfaces = canopy_panels();
            surfaces.push(backwall());
            surfaces
        }
        (ProductType::Tent, "all-sides") => {
            let mut surfaces = canopy_panels();
            surfaces.push(backwall());
            surfaces.push(SurfaceDefinition::new("sidewall_left", "Left Side Wall", TENT_WALL));
            surfaces.push(SurfaceDefinition::new("sidewall_right", "Right Side Wall", TENT_WALL));
            surfaces
        }
        _ => {
            return Err(CanvasError::UnknownCoverage {
                product: product.to_string(),
                coverage: coverage.to_string(),
            })
        }
    };
    Ok(surfaces)
}

/// [`catalog`] with the product given by name.
///
/// # Errors
///
/// Returns [`CanvasError::UnknownProduct`] or [`CanvasError::UnknownCoverage`].
pub fn catalog_for(product: &str, coverage: &str) -> CanvasResult<Vec<SurfaceDefinition>> {
    catalog(product.parse()?, coverage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(surfaces: &[SurfaceDefinition]) -> Vec<&str> {
        surfaces.iter().map(|s| s.key.as_str()).collect()
    }

    #[test]
    fn test_tin_catalog() {
        let surfaces = catalog(ProductType::Tin, "front-back").expect("catalog");
        assert_eq!(keys(&surfaces), vec!["front", "back"]);
        assert!(surfaces.iter().all(|s| s.clip == SurfaceClip::Rect));

        let all = catalog(ProductType::Tin, "all-surfaces").expect("catalog");
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_tent_catalog() {
        let surfaces = catalog_for("tent", "all-sides").expect("catalog");
        assert_eq!(
            keys(&surfaces),
            vec![
                "canopy_front",
                "canopy_back",
                "canopy_left",
                "canopy_right",
                "backwall",
                "sidewall_left",
                "sidewall_right"
            ]
        );
        let front = &surfaces[0];
        assert_eq!(front.dimensions, Dimensions::new(1160, 1049));
        assert!(matches!(front.clip, SurfaceClip::Canopy { .. }));
        assert_eq!(surfaces[4].clip, SurfaceClip::Rect);
    }

    #[test]
    fn test_unknown_product_and_coverage() {
        assert!(matches!(
            catalog_for("mug", "front-only"),
            Err(CanvasError::UnknownProduct(_))
        ));
        assert!(matches!(
            catalog(ProductType::Tent, "front-only"),
            Err(CanvasError::UnknownCoverage { .. })
        ));
    }

    #[test]
    fn test_coverage_options_all_resolve() {
        for product in [ProductType::Tin, ProductType::Tent] {
            for coverage in product.coverage_options() {
                assert!(catalog(product, coverage).is_ok(), "{product} {coverage}");
            }
        }
    }

    #[test]
    fn test_canopy_clip_region() {
        let dims = Dimensions::new(CANOPY_WIDTH, CANOPY_HEIGHT);
        let clip = SurfaceClip::canopy(CANOPY_WIDTH);

        assert!(clip.contains_point(dims, 580.0, 10.0));
        assert!(!clip.contains_point(dims, 20.0, 10.0));
        assert!(clip.contains_point(dims, 20.0, 780.0));
        assert!(clip.contains_point(dims, 5.0, 900.0));
        assert!(!clip.contains_point(dims, 580.0, 1030.0));
        assert!(SurfaceClip::Rect.contains_point(dims, 580.0, 1030.0));
    }
}
