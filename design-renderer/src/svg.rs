//! SVG scene building.
//!
//! Each element becomes a `<g>` positioned at the element origin with its
//! rotation, scale and opacity; the shape itself is drawn in local
//! coordinates. Circles, stars and polygons are centered on their radius so
//! the element box starts at the origin.

use std::f64::consts::PI;
use std::fmt::Write;

use design_core::element::{
    Element, ElementKind, LineProps, PolygonProps, StarProps, TextAlign, TextDecoration,
    TextProps, VerticalAlign,
};
use design_core::surface::{Dimensions, SurfaceClip};

use crate::loader::EmbeddedImage;

const CLIP_ID: &str = "surface-clip";

/// An SVG document under construction.
#[derive(Debug, Clone)]
pub struct SvgScene {
    svg: String,
    clipped: bool,
}

impl SvgScene {
    /// Start a scene of `view_w` x `view_h` user units rendered at
    /// `out_w` x `out_h` pixels, filled with `background`.
    #[must_use]
    pub fn new(view_w: f64, view_h: f64, out_w: u32, out_h: u32, background: &str) -> Self {
        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {view_w} {view_h}\">",
        );
        let _ = write!(
            svg,
            "<rect width=\"{view_w}\" height=\"{view_h}\" fill=\"{}\"/>",
            escape_xml(background),
        );
        Self {
            svg,
            clipped: false,
        }
    }

    /// Start a scene for a product surface: background filled edge to edge,
    /// then everything painted afterwards confined to the surface's clip.
    #[must_use]
    pub fn for_surface(dims: Dimensions, clip: &SurfaceClip, background: &str) -> Self {
        let (w, h) = (f64::from(dims.width), f64::from(dims.height));
        let mut scene = Self::new(w, h, dims.width, dims.height, background);

        if let SurfaceClip::Canopy {
            apex_x,
            base_y,
            valence_bottom,
        } = *clip
        {
            // Triangle with its base on the valence band, band included.
            let _ = write!(
                scene.svg,
                "<defs><clipPath id=\"{CLIP_ID}\"><path d=\"M{apex_x},0 L{w},{base_y} L{w},{valence_bottom} L0,{valence_bottom} L0,{base_y} Z\"/></clipPath></defs><g clip-path=\"url(#{CLIP_ID})\">",
            );
            scene.clipped = true;
        }
        scene
    }

    /// Paint an element. Image elements need their decoded `image`; without
    /// one they are skipped.
    pub fn push(&mut self, element: &Element, image: Option<&EmbeddedImage>) {
        if !element.visible {
            return;
        }
        let t = &element.transform;
        let _ = write!(
            self.svg,
            "<g transform=\"translate({},{}) rotate({}) scale({},{})\" opacity=\"{}\">",
            t.x,
            t.y,
            t.rotation,
            t.scale_x,
            t.scale_y,
            element.opacity.clamp(0.0, 1.0),
        );

        let width = t.width;
        let height = element.resolved_height();
        match &element.kind {
            ElementKind::Text(props) => self.text(props, width, height),
            ElementKind::Image(_) => {
                if let Some(image) = image {
                    let _ = write!(
                        self.svg,
                        "<image width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"/>",
                        image.href,
                    );
                }
            }
            ElementKind::Rect(props) => {
                let _ = write!(
                    self.svg,
                    "<rect width=\"{width}\" height=\"{height}\" rx=\"{}\" fill=\"{}\"{}/>",
                    props.corner_radius.max(0.0),
                    escape_xml(&props.fill),
                    stroke_attrs(props.stroke.as_deref(), props.stroke_width),
                );
            }
            ElementKind::Circle(props) => {
                let r = width / 2.0;
                let _ = write!(
                    self.svg,
                    "<circle cx=\"{r}\" cy=\"{r}\" r=\"{r}\" fill=\"{}\"{}/>",
                    escape_xml(&props.fill),
                    stroke_attrs(props.stroke.as_deref(), props.stroke_width),
                );
            }
            ElementKind::Line(props) => self.line(props),
            ElementKind::Star(props) => self.star(props),
            ElementKind::Polygon(props) => self.polygon(props),
        }

        self.svg.push_str("</g>");
        tracing::trace!("painted {} element {}", element.type_name(), element.id);
    }

    /// Close the scene and return the SVG markup.
    #[must_use]
    pub fn finish(mut self) -> String {
        if self.clipped {
            self.svg.push_str("</g>");
        }
        self.svg.push_str("</svg>");
        self.svg
    }

    #[allow(clippy::cast_precision_loss)]
    fn text(&mut self, props: &TextProps, width: f64, height: f64) {
        let (anchor, x) = match props.align {
            TextAlign::Left | TextAlign::Justify => ("start", props.padding),
            TextAlign::Center => ("middle", width / 2.0),
            TextAlign::Right => ("end", width - props.padding),
        };
        let line_advance = props.font_size * props.line_height;
        let slack = (height - props.content_height()).max(0.0);
        let top = props.padding
            + match props.vertical_align {
                VerticalAlign::Top => 0.0,
                VerticalAlign::Middle => slack / 2.0,
                VerticalAlign::Bottom => slack,
            };
        // Baseline of each line box, approximated from the font size.
        let first_baseline = top + (line_advance - props.font_size) / 2.0 + props.font_size * 0.8;

        let decoration = match props.text_decoration {
            TextDecoration::None => "",
            TextDecoration::Underline => " text-decoration=\"underline\"",
            TextDecoration::LineThrough => " text-decoration=\"line-through\"",
        };
        let _ = write!(
            self.svg,
            "<text font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" font-style=\"{}\" letter-spacing=\"{}\" text-anchor=\"{anchor}\" fill=\"{}\"{}{decoration} xml:space=\"preserve\">",
            escape_xml(&props.font_family),
            props.font_size,
            if props.font_style.is_bold() { "bold" } else { "normal" },
            if props.font_style.is_italic() { "italic" } else { "normal" },
            props.letter_spacing,
            escape_xml(&props.fill),
            stroke_attrs(props.stroke.as_deref(), props.stroke_width),
        );
        for (i, line) in props.text.split('\n').enumerate() {
            let y = first_baseline + line_advance * i as f64;
            let _ = write!(
                self.svg,
                "<tspan x=\"{x}\" y=\"{y}\">{}</tspan>",
                escape_xml(line),
            );
        }
        self.svg.push_str("</text>");
    }

    fn line(&mut self, props: &LineProps) {
        let points: Vec<String> = props.pairs().map(|(x, y)| format!("{x},{y}")).collect();
        let _ = write!(
            self.svg,
            "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>",
            points.join(" "),
            escape_xml(&props.stroke),
            props.stroke_width,
        );
    }

    fn star(&mut self, props: &StarProps) {
        let c = props.outer_radius;
        let d = polygon_path(&star_points(
            c,
            c,
            props.num_points,
            props.inner_radius,
            props.outer_radius,
        ));
        let _ = write!(
            self.svg,
            "<path d=\"{d}\" fill=\"{}\"{}/>",
            escape_xml(&props.fill),
            stroke_attrs(props.stroke.as_deref(), props.stroke_width),
        );
    }

    fn polygon(&mut self, props: &PolygonProps) {
        let c = props.radius;
        let d = polygon_path(&regular_polygon_points(c, c, props.sides, props.radius));
        let _ = write!(
            self.svg,
            "<path d=\"{d}\" fill=\"{}\"{}/>",
            escape_xml(&props.fill),
            stroke_attrs(props.stroke.as_deref(), props.stroke_width),
        );
    }
}

fn stroke_attrs(stroke: Option<&str>, width: f64) -> String {
    match stroke {
        Some(color) if width > 0.0 => format!(
            " stroke=\"{}\" stroke-width=\"{width}\"",
            escape_xml(color)
        ),
        _ => String::new(),
    }
}

/// Star vertices around (cx, cy), alternating outer and inner radius,
/// starting with a tip straight up.
#[must_use]
pub fn star_points(cx: f64, cy: f64, points: u32, inner: f64, outer: f64) -> Vec<(f64, f64)> {
    let points = points.max(2);
    (0..points * 2)
        .map(|i| {
            let angle = f64::from(i) * PI / f64::from(points) - PI / 2.0;
            let r = if i % 2 == 0 { outer } else { inner };
            (cx + r * angle.cos(), cy + r * angle.sin())
        })
        .collect()
}

/// Regular polygon vertices around (cx, cy), first vertex straight up.
#[must_use]
pub fn regular_polygon_points(cx: f64, cy: f64, sides: u32, radius: f64) -> Vec<(f64, f64)> {
    let sides = sides.max(3);
    (0..sides)
        .map(|i| {
            let angle = f64::from(i) * 2.0 * PI / f64::from(sides) - PI / 2.0;
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect()
}

fn polygon_path(points: &[(f64, f64)]) -> String {
    let mut d = String::new();
    for (i, (x, y)) in points.iter().enumerate() {
        let _ = write!(d, "{}{x:.3},{y:.3} ", if i == 0 { 'M' } else { 'L' });
    }
    d.push('Z');
    d
}

/// Escape special XML characters.
#[must_use]
pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use design_core::element::{CircleProps, Height, ImageProps, RectProps};

    fn scene_with(element: &Element) -> String {
        let mut scene = SvgScene::new(200.0, 100.0, 200, 100, "#ffffff");
        scene.push(element, None);
        scene.finish()
    }

    #[test]
    fn test_empty_scene() {
        let svg = SvgScene::new(800.0, 600.0, 800, 600, "#ffffff").finish();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("width=\"800\""));
        assert!(svg.contains("fill=\"#ffffff\""));
    }

    #[test]
    fn test_rect_with_transform() {
        let mut rect = Element::new(ElementKind::Rect(RectProps {
            stroke: Some("#000000".to_string()),
            stroke_width: 2.0,
            ..RectProps::default()
        }))
        .sized(50.0, 20.0)
        .at(10.0, 30.0);
        rect.transform.rotation = 45.0;
        rect.opacity = 0.5;

        let svg = scene_with(&rect);
        assert!(svg.contains("translate(10,30) rotate(45) scale(1,1)"));
        assert!(svg.contains("opacity=\"0.5\""));
        assert!(svg.contains("<rect width=\"50\" height=\"20\""));
        assert!(svg.contains("stroke-width=\"2\""));
    }

    #[test]
    fn test_circle_centered_on_radius() {
        let circle = Element::new(ElementKind::Circle(CircleProps::default())).sized(80.0, 80.0);
        let svg = scene_with(&circle);
        assert!(svg.contains("<circle cx=\"40\" cy=\"40\" r=\"40\""));
    }

    #[test]
    fn test_text_lines_and_escaping() {
        let mut text = Element::new(ElementKind::Text(TextProps {
            text: "A < B\n& C".to_string(),
            align: TextAlign::Center,
            ..TextProps::default()
        }))
        .sized(200.0, 60.0);
        text.transform.height = Height::Auto;

        let svg = scene_with(&text);
        assert_eq!(svg.matches("<tspan").count(), 2);
        assert!(svg.contains("A &lt; B"));
        assert!(svg.contains("&amp; C"));
        assert!(svg.contains("text-anchor=\"middle\""));
        assert!(svg.contains("x=\"100\""));
    }

    #[test]
    fn test_hidden_elements_are_skipped() {
        let mut rect = Element::new(ElementKind::Rect(RectProps::default()));
        rect.visible = false;
        let svg = scene_with(&rect);
        assert!(!svg.contains("<g"));
    }

    #[test]
    fn test_image_needs_decoded_source() {
        let image = Element::new(ElementKind::Image(ImageProps {
            src: "photo.png".to_string(),
        }))
        .sized(40.0, 30.0);
        assert!(!scene_with(&image).contains("<image"));

        let embedded = EmbeddedImage {
            width: 1,
            height: 1,
            href: "data:image/png;base64,AAAA".to_string(),
        };
        let mut scene = SvgScene::new(100.0, 100.0, 100, 100, "#ffffff");
        scene.push(&image, Some(&embedded));
        let svg = scene.finish();
        assert!(svg.contains("<image width=\"40\" height=\"30\""));
        assert!(svg.contains("xlink:href=\"data:image/png;base64,AAAA\""));
    }

    #[test]
    fn test_canopy_clip_wraps_content() {
        let dims = Dimensions::new(1160, 1049);
        let scene = SvgScene::for_surface(dims, &SurfaceClip::canopy(1160), "#ffffff");
        let svg = scene.finish();
        assert!(svg.contains("<clipPath id=\"surface-clip\">"));
        assert!(svg.contains("M580,0 L1160,789 L1160,1009 L0,1009 L0,789 Z"));
        assert!(svg.ends_with("</g></svg>"));

        let plain = SvgScene::for_surface(dims, &SurfaceClip::Rect, "#ffffff").finish();
        assert!(!plain.contains("clipPath"));
    }

    #[test]
    fn test_star_points_alternate() {
        let points = star_points(50.0, 50.0, 5, 20.0, 50.0);
        assert_eq!(points.len(), 10);
        let (x, y) = points[0];
        assert!((x - 50.0).abs() < 1e-9);
        assert!(y.abs() < 1e-9, "first tip is straight up");
        let (_, y1) = points[1];
        assert!(y1 > 0.0 && y1 < 50.0);
    }

    #[test]
    fn test_polygon_points() {
        let points = regular_polygon_points(40.0, 40.0, 6, 40.0);
        assert_eq!(points.len(), 6);
        for (x, y) in points {
            let r = ((x - 40.0).powi(2) + (y - 40.0).powi(2)).sqrt();
            assert!((r - 40.0).abs() < 1e-9);
        }
        assert_eq!(regular_polygon_points(0.0, 0.0, 1, 1.0).len(), 3);
    }
}
