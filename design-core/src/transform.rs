//! Resolution of finished resize/rotate gestures into element updates.
//!
//! A gesture reports the node's final position and rotation together with the
//! scale factors the editor applied on top of the unscaled box. The scale is
//! baked into width, height and radii here, and the stored scale returns to 1,
//! so the next gesture composes from a clean state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::element::{Element, ElementKind};
use crate::ElementPatch;

/// Smallest width or height a resize can produce.
pub const MIN_DIMENSION: f64 = 5.0;
/// Smallest inner radius of a resized star.
pub const MIN_STAR_INNER_RADIUS: f64 = 5.0;
/// Smallest outer radius of a resized star.
pub const MIN_STAR_OUTER_RADIUS: f64 = 10.0;

/// Final state of a resize/rotate gesture on one rendered node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformGesture {
    /// Final x position.
    pub x: f64,
    /// Final y position.
    pub y: f64,
    /// Horizontal scale applied during the gesture.
    pub scale_x: f64,
    /// Vertical scale applied during the gesture.
    pub scale_y: f64,
    /// Final rotation in degrees.
    pub rotation: f64,
    /// Unscaled node width.
    pub width: f64,
    /// Unscaled node height.
    pub height: f64,
}

impl TransformGesture {
    /// A gesture that scales `element` in place by the given factors.
    #[must_use]
    pub fn scaling(element: &Element, scale_x: f64, scale_y: f64) -> Self {
        let t = &element.transform;
        Self {
            x: t.x,
            y: t.y,
            scale_x,
            scale_y,
            rotation: t.rotation,
            width: t.width,
            height: element.resolved_height(),
        }
    }
}

/// Editor modes that change how gestures resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformPolicy {
    /// Text boxes keep `auto` height and only their width follows the gesture.
    pub text_auto_height: bool,
}

fn clamp_min(value: f64, min: f64) -> f64 {
    value.max(min)
}

/// Compute the update patch for a finished gesture on `element`.
#[must_use]
pub fn resolve(
    element: &Element,
    gesture: &TransformGesture,
    policy: TransformPolicy,
) -> ElementPatch {
    let sx = gesture.scale_x;
    let sy = gesture.scale_y;
    let uniform = sx.min(sy);

    let mut patch = ElementPatch::new()
        .set("x", gesture.x)
        .set("y", gesture.y)
        .set("rotation", gesture.rotation)
        .set("scaleX", 1.0)
        .set("scaleY", 1.0);

    let scaled_width = clamp_min(gesture.width * sx, MIN_DIMENSION);
    let scaled_height = clamp_min(gesture.height * sy, MIN_DIMENSION);

    match &element.kind {
        ElementKind::Text(_) => {
            patch.insert("width", scaled_width);
            if policy.text_auto_height {
                patch.insert("height", "auto");
            } else {
                patch.insert("height", scaled_height);
            }
        }
        ElementKind::Star(star) => {
            let inner = clamp_min(star.inner_radius * uniform, MIN_STAR_INNER_RADIUS);
            let outer = clamp_min(star.outer_radius * uniform, MIN_STAR_OUTER_RADIUS);
            patch.insert("innerRadius", inner);
            patch.insert("outerRadius", outer);
            patch.insert("width", outer * 2.0);
            patch.insert("height", outer * 2.0);
        }
        ElementKind::Circle(_) => {
            let diameter = clamp_min(gesture.width * uniform, MIN_DIMENSION);
            patch.insert("width", diameter);
            patch.insert("height", diameter);
        }
        ElementKind::Polygon(polygon) => {
            let radius = clamp_min(polygon.radius * uniform, MIN_DIMENSION);
            patch.insert("radius", radius);
            patch.insert("width", radius * 2.0);
            patch.insert("height", radius * 2.0);
        }
        ElementKind::Line(line) => {
            let points: Vec<Value> = line
                .points
                .iter()
                .enumerate()
                .map(|(i, p)| Value::from(if i % 2 == 0 { p * sx } else { p * sy }))
                .collect();
            patch.insert("points", points);
            patch.insert("width", scaled_width);
            patch.insert("height", scaled_height);
        }
        ElementKind::Image(_) | ElementKind::Rect(_) => {
            patch.insert("width", scaled_width);
            patch.insert("height", scaled_height);
        }
    }

    tracing::trace!(
        "resolved {} gesture on {}: {:?}",
        element.type_name(),
        element.id,
        patch.field_names()
    );
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Height, RectProps, StarProps, TextProps};

    fn star(inner: f64, outer: f64) -> Element {
        Element::new(ElementKind::Star(StarProps {
            inner_radius: inner,
            outer_radius: outer,
            ..StarProps::default()
        }))
    }

    fn apply(element: &Element, sx: f64, sy: f64, policy: TransformPolicy) -> Element {
        let gesture = TransformGesture::scaling(element, sx, sy);
        resolve(element, &gesture, policy)
            .apply_to(element)
            .expect("patch applies")
    }

    fn star_radii(element: &Element) -> (f64, f64) {
        match &element.kind {
            ElementKind::Star(s) => (s.inner_radius, s.outer_radius),
            other => panic!("expected star, got {other:?}"),
        }
    }

    #[test]
    fn test_star_uses_smaller_scale() {
        let updated = apply(&star(30.0, 50.0), 2.0, 1.0, TransformPolicy::default());
        assert_eq!(star_radii(&updated), (30.0, 50.0));

        let updated = apply(&star(30.0, 50.0), 2.0, 2.0, TransformPolicy::default());
        assert_eq!(star_radii(&updated), (60.0, 100.0));
        assert!((updated.transform.width - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_star_radius_minimums() {
        let updated = apply(&star(30.0, 50.0), 0.01, 0.01, TransformPolicy::default());
        assert_eq!(
            star_radii(&updated),
            (MIN_STAR_INNER_RADIUS, MIN_STAR_OUTER_RADIUS)
        );
    }

    #[test]
    fn test_text_auto_height_mode() {
        let text = Element::new(ElementKind::Text(TextProps::default())).sized(200.0, 40.0);
        let policy = TransformPolicy {
            text_auto_height: true,
        };
        let updated = apply(&text, 1.5, 3.0, policy);
        assert_eq!(updated.transform.height, Height::Auto);
        assert!((updated.transform.width - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_text_fixed_height_mode() {
        let text = Element::new(ElementKind::Text(TextProps::default())).sized(200.0, 40.0);
        let updated = apply(&text, 1.0, 0.5, TransformPolicy::default());
        assert_eq!(updated.transform.height, Height::Fixed(20.0));
    }

    #[test]
    fn test_rect_scales_independently_and_resets_scale() {
        let rect = Element::new(ElementKind::Rect(RectProps::default()))
            .sized(100.0, 50.0)
            .at(10.0, 20.0);
        let mut gesture = TransformGesture::scaling(&rect, 2.0, 0.5);
        gesture.x = 15.0;
        gesture.rotation = 45.0;

        let updated = resolve(&rect, &gesture, TransformPolicy::default())
            .apply_to(&rect)
            .expect("apply");
        let t = updated.transform;
        assert!((t.width - 200.0).abs() < f64::EPSILON);
        assert_eq!(t.height, Height::Fixed(25.0));
        assert!((t.x - 15.0).abs() < f64::EPSILON);
        assert!((t.rotation - 45.0).abs() < f64::EPSILON);
        assert!((t.scale_x - 1.0).abs() < f64::EPSILON);
        assert!((t.scale_y - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_minimum_width_clamp() {
        let rect = Element::new(ElementKind::Rect(RectProps::default())).sized(10.0, 10.0);
        let updated = apply(&rect, 0.1, 0.1, TransformPolicy::default());
        assert!((updated.transform.width - MIN_DIMENSION).abs() < f64::EPSILON);
        assert_eq!(updated.transform.height, Height::Fixed(MIN_DIMENSION));
    }

    #[test]
    fn test_circle_stays_round() {
        let circle = Element::new(ElementKind::Circle(crate::element::CircleProps::default()))
            .sized(80.0, 80.0);
        let updated = apply(&circle, 3.0, 1.5, TransformPolicy::default());
        assert!((updated.transform.width - 120.0).abs() < f64::EPSILON);
        assert_eq!(updated.transform.height, Height::Fixed(120.0));
    }

    #[test]
    fn test_polygon_scales_uniformly_by_smaller_factor() {
        let polygon = Element::new(ElementKind::Polygon(crate::element::PolygonProps::default()))
            .sized(80.0, 80.0);
        let updated = apply(&polygon, 3.0, 1.5, TransformPolicy::default());
        let ElementKind::Polygon(props) = &updated.kind else {
            panic!("expected polygon");
        };
        assert!((props.radius - 60.0).abs() < f64::EPSILON);
        assert!((updated.transform.width - 120.0).abs() < f64::EPSILON);
        assert_eq!(updated.transform.height, Height::Fixed(120.0));

        let shrunk = apply(&polygon, 0.01, 4.0, TransformPolicy::default());
        let ElementKind::Polygon(props) = &shrunk.kind else {
            panic!("expected polygon");
        };
        assert!((props.radius - MIN_DIMENSION).abs() < f64::EPSILON);
    }

    #[test]
    fn test_line_points_are_scaled() {
        let line = Element::new(ElementKind::Line(crate::element::LineProps {
            points: vec![0.0, 0.0, 10.0, 20.0],
            ..crate::element::LineProps::default()
        }))
        .sized(10.0, 20.0);
        let updated = apply(&line, 2.0, 0.5, TransformPolicy::default());
        let ElementKind::Line(props) = updated.kind else {
            panic!("expected line");
        };
        assert_eq!(props.points, vec![0.0, 0.0, 20.0, 10.0]);
    }
}
