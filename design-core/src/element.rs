//! Design elements - the primitives placed on a canvas.
//!
//! An [`Element`] is a value type: common geometry and appearance attributes
//! plus an [`ElementKind`] that carries only the fields relevant to its kind.
//! On the wire an element is one flat JSON object tagged by `"type"`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::schema::ValidationError;
use crate::{CanvasError, CanvasResult, ElementPatch};

/// Wire names of every recognized element kind.
pub const ELEMENT_TYPES: [&str; 7] = ["text", "image", "rect", "circle", "line", "star", "polygon"];

/// Unique identifier for an element.
///
/// Generated ids are UUID v4 strings, so an id is never handed out twice in a
/// session even after the element carrying it is deleted. Imported documents
/// may carry any non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing id string.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Element height: a number of pixels, or `auto` (text only).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Height {
    /// Height follows the text content.
    Auto,
    /// Fixed height in pixels.
    Fixed(f64),
}

impl Height {
    /// Whether this is the `auto` sentinel.
    #[must_use]
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }

    /// The fixed height, if any.
    #[must_use]
    pub const fn fixed(self) -> Option<f64> {
        match self {
            Self::Auto => None,
            Self::Fixed(h) => Some(h),
        }
    }
}

impl Serialize for Height {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Auto => serializer.serialize_str("auto"),
            Self::Fixed(h) => serializer.serialize_f64(*h),
        }
    }
}

impl<'de> Deserialize<'de> for Height {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Keyword(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(h) => Ok(Self::Fixed(h)),
            Repr::Keyword(k) if k == "auto" => Ok(Self::Auto),
            Repr::Keyword(k) => Err(serde::de::Error::custom(format!(
                "height must be a number or \"auto\", got \"{k}\""
            ))),
        }
    }
}

/// Position, size, rotation and scale of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    /// X position (pixels from left).
    pub x: f64,
    /// Y position (pixels from top).
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels, or `auto` for text.
    pub height: Height,
    /// Rotation in degrees, clockwise around the element origin.
    #[serde(default)]
    pub rotation: f64,
    /// Horizontal scale factor.
    #[serde(default = "unit_scale")]
    pub scale_x: f64,
    /// Vertical scale factor.
    #[serde(default = "unit_scale")]
    pub scale_y: f64,
}

const fn unit_scale() -> f64 {
    1.0
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: Height::Fixed(100.0),
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

/// Font weight/style combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Regular weight, upright.
    #[default]
    Normal,
    /// Bold weight.
    Bold,
    /// Italic.
    Italic,
    /// Bold and italic.
    #[serde(rename = "bold italic")]
    BoldItalic,
}

impl FontStyle {
    /// Whether the style is bold.
    #[must_use]
    pub const fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }

    /// Whether the style is italic.
    #[must_use]
    pub const fn is_italic(self) -> bool {
        matches!(self, Self::Italic | Self::BoldItalic)
    }
}

/// Text decoration line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextDecoration {
    /// No decoration.
    #[default]
    #[serde(rename = "none", alias = "")]
    None,
    /// Underline.
    #[serde(rename = "underline")]
    Underline,
    /// Strike-through.
    #[serde(rename = "line-through")]
    LineThrough,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Align to the left edge.
    #[default]
    Left,
    /// Center in the box.
    Center,
    /// Align to the right edge.
    Right,
    /// Justified (rendered as left).
    Justify,
}

/// Vertical text alignment within a fixed-height box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    /// Top of the box.
    #[default]
    Top,
    /// Vertically centered.
    Middle,
    /// Bottom of the box.
    Bottom,
}

/// Text wrapping mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextWrap {
    /// Wrap at word boundaries.
    #[default]
    Word,
    /// Wrap at any character.
    Char,
    /// No wrapping.
    None,
}

/// Attributes of a text element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextProps {
    /// Text content; `\n` starts a new line.
    pub text: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Font family name.
    pub font_family: String,
    /// Font style.
    pub font_style: FontStyle,
    /// Decoration line.
    pub text_decoration: TextDecoration,
    /// Fill color.
    pub fill: String,
    /// Outline color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    /// Outline width.
    pub stroke_width: f64,
    /// Horizontal alignment.
    pub align: TextAlign,
    /// Vertical alignment.
    pub vertical_align: VerticalAlign,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
    /// Extra spacing between letters in pixels.
    pub letter_spacing: f64,
    /// Inner padding in pixels.
    pub padding: f64,
    /// Wrapping mode.
    pub wrap: TextWrap,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: "Your text here".to_string(),
            font_size: 24.0,
            font_family: "Arial".to_string(),
            font_style: FontStyle::Normal,
            text_decoration: TextDecoration::None,
            fill: "#000000".to_string(),
            stroke: None,
            stroke_width: 0.0,
            align: TextAlign::Left,
            vertical_align: VerticalAlign::Top,
            line_height: 1.0,
            letter_spacing: 0.0,
            padding: 0.0,
            wrap: TextWrap::Word,
        }
    }
}

impl TextProps {
    /// Height of the laid-out text (explicit line breaks only, plus padding).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn content_height(&self) -> f64 {
        let lines = self.text.split('\n').count().max(1) as f64;
        lines * self.font_size * self.line_height + self.padding * 2.0
    }
}

/// Attributes of an image element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageProps {
    /// Image source: URL, file path or `data:` URI.
    pub src: String,
}

/// Attributes of a rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RectProps {
    /// Fill color.
    pub fill: String,
    /// Outline color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    /// Outline width.
    pub stroke_width: f64,
    /// Corner radius in pixels.
    pub corner_radius: f64,
}

impl Default for RectProps {
    fn default() -> Self {
        Self {
            fill: "#3b82f6".to_string(),
            stroke: None,
            stroke_width: 0.0,
            corner_radius: 0.0,
        }
    }
}

/// Attributes of a circle. The radius is `width / 2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CircleProps {
    /// Fill color.
    pub fill: String,
    /// Outline color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    /// Outline width.
    pub stroke_width: f64,
}

impl Default for CircleProps {
    fn default() -> Self {
        Self {
            fill: "#10b981".to_string(),
            stroke: None,
            stroke_width: 0.0,
        }
    }
}

/// Attributes of a polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineProps {
    /// Flat list of x,y pairs relative to the element origin.
    pub points: Vec<f64>,
    /// Stroke color.
    pub stroke: String,
    /// Stroke width.
    pub stroke_width: f64,
}

impl Default for LineProps {
    fn default() -> Self {
        Self {
            points: vec![0.0, 0.0, 100.0, 0.0],
            stroke: "#000000".to_string(),
            stroke_width: 2.0,
        }
    }
}

impl LineProps {
    /// Iterate the coordinate pairs; a trailing odd value is ignored.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.chunks_exact(2).map(|p| (p[0], p[1]))
    }
}

/// Attributes of a star.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StarProps {
    /// Radius of the inner vertices.
    pub inner_radius: f64,
    /// Radius of the point tips.
    pub outer_radius: f64,
    /// Number of points.
    pub num_points: u32,
    /// Fill color.
    pub fill: String,
    /// Outline color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    /// Outline width.
    pub stroke_width: f64,
}

impl Default for StarProps {
    fn default() -> Self {
        Self {
            inner_radius: 20.0,
            outer_radius: 40.0,
            num_points: 5,
            fill: "#f59e0b".to_string(),
            stroke: None,
            stroke_width: 0.0,
        }
    }
}

/// Attributes of a regular polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolygonProps {
    /// Number of sides.
    pub sides: u32,
    /// Circumradius in pixels.
    pub radius: f64,
    /// Fill color.
    pub fill: String,
    /// Outline color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    /// Outline width.
    pub stroke_width: f64,
}

impl Default for PolygonProps {
    fn default() -> Self {
        Self {
            sides: 6,
            radius: 40.0,
            fill: "#8b5cf6".to_string(),
            stroke: None,
            stroke_width: 0.0,
        }
    }
}

/// The kind of primitive an element is, with its kind-specific attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A block of text.
    Text(TextProps),
    /// A raster image.
    Image(ImageProps),
    /// A (rounded) rectangle.
    Rect(RectProps),
    /// A circle inscribed in the element box.
    Circle(CircleProps),
    /// A polyline.
    Line(LineProps),
    /// A star.
    Star(StarProps),
    /// A regular polygon.
    Polygon(PolygonProps),
}

impl ElementKind {
    /// Default attributes for a kind given its wire name.
    #[must_use]
    pub fn default_for(type_name: &str) -> Option<Self> {
        let kind = match type_name {
            "text" => Self::Text(TextProps::default()),
            "image" => Self::Image(ImageProps::default()),
            "rect" => Self::Rect(RectProps::default()),
            "circle" => Self::Circle(CircleProps::default()),
            "line" => Self::Line(LineProps::default()),
            "star" => Self::Star(StarProps::default()),
            "polygon" => Self::Polygon(PolygonProps::default()),
            _ => return None,
        };
        Some(kind)
    }

    /// Wire name of this kind.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Rect(_) => "rect",
            Self::Circle(_) => "circle",
            Self::Line(_) => "line",
            Self::Star(_) => "star",
            Self::Polygon(_) => "polygon",
        }
    }

    /// Initial box for a freshly created element of this kind.
    fn default_transform(&self) -> Transform {
        let (width, height) = match self {
            Self::Text(_) => (200.0, Height::Auto),
            Self::Image(_) => (200.0, Height::Fixed(200.0)),
            Self::Rect(_) => (120.0, Height::Fixed(80.0)),
            Self::Circle(_) => (80.0, Height::Fixed(80.0)),
            Self::Line(props) => {
                let width = props.pairs().map(|(x, _)| x).fold(0.0, f64::max);
                (width, Height::Fixed(props.stroke_width))
            }
            Self::Star(props) => {
                let d = props.outer_radius * 2.0;
                (d, Height::Fixed(d))
            }
            Self::Polygon(props) => {
                let d = props.radius * 2.0;
                (d, Height::Fixed(d))
            }
        };
        Transform {
            x: 50.0,
            y: 50.0,
            width,
            height,
            ..Transform::default()
        }
    }
}

const fn default_opacity() -> f64 {
    1.0
}

const fn default_true() -> bool {
    true
}

/// A design element with content, geometry and appearance flags.
///
/// Deserialization refuses `auto` height on anything but text, so every
/// typed intake path (commands, templates, placements) holds the same rule
/// as a validated import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ElementRepr")]
pub struct Element {
    /// Unique identifier.
    pub id: ElementId,
    /// Element kind and kind-specific attributes.
    #[serde(flatten)]
    pub kind: ElementKind,
    /// Position, size, rotation and scale.
    #[serde(flatten)]
    pub transform: Transform,
    /// Opacity from 0 (transparent) to 1.
    pub opacity: f64,
    /// Whether the element is painted.
    pub visible: bool,
    /// Whether the element can be dragged in the editor.
    pub draggable: bool,
    /// Whether the element can be picked in the editor.
    pub selectable: bool,
}

/// Wire shape of an element before the kind/height rule is checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElementRepr {
    #[serde(default)]
    id: ElementId,
    #[serde(flatten)]
    kind: ElementKind,
    #[serde(flatten)]
    transform: Transform,
    #[serde(default = "default_opacity")]
    opacity: f64,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default = "default_true")]
    draggable: bool,
    #[serde(default = "default_true")]
    selectable: bool,
}

impl TryFrom<ElementRepr> for Element {
    type Error = ValidationError;

    fn try_from(repr: ElementRepr) -> Result<Self, Self::Error> {
        if repr.transform.height.is_auto() && !matches!(repr.kind, ElementKind::Text(_)) {
            return Err(ValidationError::AutoHeightNotAllowed(
                repr.kind.type_name().to_string(),
            ));
        }
        Ok(Self {
            id: repr.id,
            kind: repr.kind,
            transform: repr.transform,
            opacity: repr.opacity,
            visible: repr.visible,
            draggable: repr.draggable,
            selectable: repr.selectable,
        })
    }
}

impl Element {
    /// Create a new element of the given kind with a default box.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        let transform = kind.default_transform();
        Self {
            id: ElementId::new(),
            kind,
            transform,
            opacity: 1.0,
            visible: true,
            draggable: true,
            selectable: true,
        }
    }

    /// Build an element from a raw creation request: a kind name plus initial
    /// properties laid over that kind's defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidRequest`] for an unknown kind or
    /// properties that do not fit it.
    pub fn from_request(
        type_name: &str,
        props: serde_json::Map<String, serde_json::Value>,
    ) -> CanvasResult<Self> {
        let kind = ElementKind::default_for(type_name)
            .ok_or_else(|| CanvasError::InvalidRequest(format!("unknown element type '{type_name}'")))?;
        let base = Self::new(kind);

        let mut patch = ElementPatch::from_map(props);
        patch.remove("id");
        patch
            .apply_to(&base)
            .map_err(|e| CanvasError::InvalidRequest(e.to_string()))
    }

    /// Set the transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Move the element to a position.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.transform.x = x;
        self.transform.y = y;
        self
    }

    /// Set width and a fixed height.
    #[must_use]
    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.transform.width = width;
        self.transform.height = Height::Fixed(height);
        self
    }

    /// Wire name of the element's kind.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Circle radius (`width / 2`); `None` for other kinds.
    #[must_use]
    pub fn radius(&self) -> Option<f64> {
        matches!(self.kind, ElementKind::Circle(_)).then(|| self.transform.width / 2.0)
    }

    /// Height in pixels, resolving `auto` from the text layout.
    #[must_use]
    pub fn resolved_height(&self) -> f64 {
        match (self.transform.height, &self.kind) {
            (Height::Fixed(h), _) => h,
            (Height::Auto, ElementKind::Text(props)) => props.content_height(),
            (Height::Auto, _) => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = ElementId::new();
        let b = ElementId::new();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn test_text_serializes_flat_with_auto_height() {
        let element = Element::new(ElementKind::Text(TextProps::default()));
        let value = serde_json::to_value(&element).expect("serialize");

        assert_eq!(value["type"], "text");
        assert_eq!(value["height"], "auto");
        assert_eq!(value["fontSize"], 24.0);
        assert_eq!(value["scaleX"], 1.0);
        assert!(value.get("stroke").is_none());
    }

    #[test]
    fn test_deserialize_rejects_auto_height_on_non_text() {
        let result = serde_json::from_value::<Element>(json!({
            "id": "r1",
            "type": "rect",
            "x": 0,
            "y": 0,
            "width": 30,
            "height": "auto"
        }));
        let err = result.expect_err("auto height on rect");
        assert!(err.to_string().contains("only allowed for text"));

        let text: Element = serde_json::from_value(json!({
            "type": "text",
            "text": "hi",
            "x": 0,
            "y": 0,
            "width": 30,
            "height": "auto"
        }))
        .expect("auto height on text");
        assert!(text.transform.height.is_auto());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let element: Element = serde_json::from_value(json!({
            "id": "r1",
            "type": "rect",
            "x": 10,
            "y": 20,
            "width": 30,
            "height": 40,
            "fill": "#ff0000"
        }))
        .expect("deserialize");

        assert_eq!(element.id.as_str(), "r1");
        assert_eq!(element.transform.height, Height::Fixed(40.0));
        assert!((element.opacity - 1.0).abs() < f64::EPSILON);
        assert!(element.visible);
        match element.kind {
            ElementKind::Rect(props) => {
                assert_eq!(props.fill, "#ff0000");
                assert!(props.stroke.is_none());
            }
            other => panic!("expected rect, got {other:?}"),
        }
    }

    #[test]
    fn test_height_rejects_other_strings() {
        let result: Result<Element, _> = serde_json::from_value(json!({
            "id": "t1",
            "type": "text",
            "x": 0, "y": 0, "width": 10, "height": "12"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_text_decoration_accepts_empty_string() {
        let element: Element = serde_json::from_value(json!({
            "id": "t1",
            "type": "text",
            "x": 0, "y": 0, "width": 10, "height": "auto",
            "textDecoration": "",
            "fontStyle": "bold italic"
        }))
        .expect("deserialize");
        let ElementKind::Text(props) = element.kind else {
            panic!("expected text");
        };
        assert_eq!(props.text_decoration, TextDecoration::None);
        assert!(props.font_style.is_bold());
        assert!(props.font_style.is_italic());
    }

    #[test]
    fn test_from_request_overrides_defaults() {
        let props = json!({ "x": 5, "fill": "#123456", "cornerRadius": 8 });
        let serde_json::Value::Object(map) = props else {
            unreachable!()
        };
        let element = Element::from_request("rect", map).expect("request");

        assert!((element.transform.x - 5.0).abs() < f64::EPSILON);
        let ElementKind::Rect(rect) = &element.kind else {
            panic!("expected rect");
        };
        assert_eq!(rect.fill, "#123456");
        assert!((rect.corner_radius - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_request_unknown_type() {
        let result = Element::from_request("hexagon", serde_json::Map::new());
        assert!(matches!(result, Err(CanvasError::InvalidRequest(_))));
    }

    #[test]
    fn test_circle_radius_and_auto_height() {
        let circle = Element::new(ElementKind::Circle(CircleProps::default())).sized(60.0, 60.0);
        assert_eq!(circle.radius(), Some(30.0));

        let text = Element::new(ElementKind::Text(TextProps {
            text: "one\ntwo".to_string(),
            font_size: 10.0,
            padding: 2.0,
            ..TextProps::default()
        }));
        assert!((text.resolved_height() - 24.0).abs() < f64::EPSILON);
        assert_eq!(text.radius(), None);
    }
}
