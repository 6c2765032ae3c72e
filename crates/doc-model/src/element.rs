//! Placed elements
//!
//! Every editable object on a page is an [`Element`]: common placement fields
//! plus a closed [`ElementKind`] payload. Consumers (rendering, export,
//! geometry updates) match on the kind exhaustively.

use crate::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Smallest width/height an element can be resized to.
pub const MIN_ELEMENT_SIZE: f32 = 20.0;

/// Font size bounds for text elements, in points.
pub const MIN_FONT_SIZE: f32 = 8.0;
pub const MAX_FONT_SIZE: f32 = 72.0;

/// Largest placed width/height for a freshly inserted image.
pub const MAX_IMAGE_DIMENSION: f32 = 300.0;

/// Unique element identifier.
///
/// Generated as a UUID v4 string at creation and never reused.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Seconds since the unix epoch.
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// RGBA color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };
    pub const YELLOW: Color = Color { r: 255, g: 235, b: 59, a: 255 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert to normalized RGBA values (0.0 to 1.0)
    pub fn to_normalized(&self) -> (f32, f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }

    /// `#rrggbb`, alpha dropped.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
    pub color: Color,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl TextContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_family: "Helvetica".to_owned(),
            font_size: 16.0,
            color: Color::BLACK,
            bold: false,
            italic: false,
            underline: false,
        }
    }

    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = clamp_font_size(size);
        self
    }
}

pub fn clamp_font_size(size: f32) -> f32 {
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Embedded encoded image bytes (PNG, JPEG, ...)
    pub data: Arc<[u8]>,
    pub mime_type: String,
    /// Pixel dimensions of the source, preserved at insert time
    pub intrinsic_width: u32,
    pub intrinsic_height: u32,
}

impl ImageContent {
    /// Placed size for the intrinsic dimensions, scaled down so neither side
    /// exceeds [`MAX_IMAGE_DIMENSION`] while keeping the aspect ratio.
    pub fn placed_size(&self) -> (f32, f32) {
        fit_within(self.intrinsic_width as f32, self.intrinsic_height as f32, MAX_IMAGE_DIMENSION)
    }
}

fn fit_within(width: f32, height: f32, cap: f32) -> (f32, f32) {
    if width <= cap && height <= cap {
        return (width, height);
    }
    let scale = (cap / width).min(cap / height);
    (width * scale, height * scale)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Line,
    Arrow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeContent {
    pub kind: ShapeKind,
    pub fill: Option<Color>,
    pub stroke: Color,
    pub stroke_width: f32,
}

impl ShapeContent {
    pub fn new(kind: ShapeKind) -> Self {
        Self { kind, fill: None, stroke: Color::BLACK, stroke_width: 2.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    Highlight,
    Note,
    Stamp,
    Freehand,
    Callout,
    Arrow,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StampKind {
    Approved,
    Rejected,
    Draft,
    Confidential,
    Final,
    Custom(String),
}

impl StampKind {
    pub fn label(&self) -> &str {
        match self {
            StampKind::Approved => "APPROVED",
            StampKind::Rejected => "REJECTED",
            StampKind::Draft => "DRAFT",
            StampKind::Confidential => "CONFIDENTIAL",
            StampKind::Final => "FINAL",
            StampKind::Custom(label) => label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationContent {
    pub kind: AnnotationKind,
    pub text: String,
    pub author: String,
    /// Unix timestamp in seconds
    pub created_at: i64,
    /// Unix timestamp in seconds
    pub modified_at: i64,
    pub color: Color,
    /// Freehand stroke as captured; stretched onto the element bounds when
    /// drawn, so moving or resizing the element carries the stroke along
    pub points: Option<Vec<Point>>,
    /// Pointed-at location for callouts and arrows, relative to the
    /// element's top-left corner
    pub target: Option<Point>,
    pub stamp: Option<StampKind>,
}

impl AnnotationContent {
    pub fn new(kind: AnnotationKind, author: impl Into<String>) -> Self {
        let now = unix_now();
        let color = match kind {
            AnnotationKind::Highlight | AnnotationKind::Note => Color::YELLOW,
            _ => Color::RED,
        };
        Self {
            kind,
            text: String::new(),
            author: author.into(),
            created_at: now,
            modified_at: now,
            color,
            points: None,
            target: None,
            stamp: None,
        }
    }

    /// Update the modified timestamp to now
    pub fn touch(&mut self) {
        self.modified_at = unix_now().max(self.created_at);
    }

    /// The freehand stroke mapped onto `bounds`.
    pub fn stroke_in(&self, bounds: Rect) -> Option<Vec<Point>> {
        let points = self.points.as_ref()?;
        let source = Rect::bounding(points)?;
        let scale_x = if source.width > f32::EPSILON { bounds.width / source.width } else { 1.0 };
        let scale_y = if source.height > f32::EPSILON { bounds.height / source.height } else { 1.0 };
        Some(
            points
                .iter()
                .map(|point| {
                    Point::new(
                        bounds.x + (point.x - source.x) * scale_x,
                        bounds.y + (point.y - source.y) * scale_y,
                    )
                })
                .collect(),
        )
    }

    /// The callout/arrow target in page coordinates for an element placed at
    /// `bounds`.
    pub fn target_in(&self, bounds: Rect) -> Option<Point> {
        self.target.map(|target| Point::new(bounds.x + target.x, bounds.y + target.y))
    }
}

/// Element payload. Adding a variant is a compile-time-checked change at every
/// consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementKind {
    Text(TextContent),
    Image(ImageContent),
    Shape(ShapeContent),
    Annotation(AnnotationContent),
}

/// Coarse grouping used to include or exclude element kinds on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentClass {
    Text,
    Image,
    /// Shapes and annotations; both render as vector markup.
    Shape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    /// Owning page (1-based)
    pub page: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees, clockwise
    pub rotation: f32,
    /// 0.0 = transparent, 1.0 = opaque
    pub opacity: f32,
    pub kind: ElementKind,
}

impl Element {
    /// Create an element with a freshly generated id.
    pub fn new(page: u32, bounds: Rect, kind: ElementKind) -> Self {
        Self {
            id: ElementId::generate(),
            page,
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            rotation: 0.0,
            opacity: 1.0,
            kind,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.x = bounds.x;
        self.y = bounds.y;
        self.width = bounds.width;
        self.height = bounds.height;
    }

    pub fn content_class(&self) -> ContentClass {
        match self.kind {
            ElementKind::Text(_) => ContentClass::Text,
            ElementKind::Image(_) => ContentClass::Image,
            ElementKind::Shape(_) | ElementKind::Annotation(_) => ContentClass::Shape,
        }
    }

    pub fn as_text(&self) -> Option<&TextContent> {
        match &self.kind {
            ElementKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Short lowercase name of the variant, for logs and markup class names.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ElementKind::Text(_) => "text",
            ElementKind::Image(_) => "image",
            ElementKind::Shape(_) => "shape",
            ElementKind::Annotation(_) => "annotation",
        }
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: &ElementPatch) {
        if let Some(page) = patch.page {
            self.page = page;
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(kind) = &patch.kind {
            self.kind = kind.clone();
        }
        if let ElementKind::Text(text) = &mut self.kind {
            text.font_size = clamp_font_size(text.font_size);
        }
        if let ElementKind::Annotation(annotation) = &mut self.kind {
            annotation.touch();
        }
    }
}

/// Partial element update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementPatch {
    pub page: Option<u32>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub rotation: Option<f32>,
    pub opacity: Option<f32>,
    pub kind: Option<ElementKind>,
}

impl ElementPatch {
    pub fn position(x: f32, y: f32) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    pub fn bounds(bounds: Rect) -> Self {
        Self {
            x: Some(bounds.x),
            y: Some(bounds.y),
            width: Some(bounds.width),
            height: Some(bounds.height),
            ..Default::default()
        }
    }

    pub fn rotation(degrees: f32) -> Self {
        Self { rotation: Some(degrees), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = ElementId::generate();
        let b = ElementId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn color_hex_and_normalization() {
        let color = Color::rgb(255, 128, 0);
        assert_eq!(color.to_hex(), "#ff8000");
        let (r, g, _, a) = color.to_normalized();
        assert!((r - 1.0).abs() < 0.001);
        assert!((g - 0.502).abs() < 0.01);
        assert!((a - 1.0).abs() < 0.001);
    }

    #[test]
    fn large_images_are_scaled_to_the_cap_preserving_aspect() {
        let image = ImageContent {
            data: Arc::from(Vec::new()),
            mime_type: "image/png".to_owned(),
            intrinsic_width: 1200,
            intrinsic_height: 600,
        };
        assert_eq!(image.placed_size(), (300.0, 150.0));

        let small = ImageContent { intrinsic_width: 120, intrinsic_height: 80, ..image };
        assert_eq!(small.placed_size(), (120.0, 80.0));
    }

    #[test]
    fn font_size_is_clamped() {
        assert_eq!(TextContent::new("a").with_font_size(4.0).font_size, MIN_FONT_SIZE);
        assert_eq!(TextContent::new("a").with_font_size(200.0).font_size, MAX_FONT_SIZE);
    }

    #[test]
    fn annotations_belong_to_the_shape_class() {
        let note = Element::new(
            1,
            Rect::new(0.0, 0.0, 30.0, 30.0),
            ElementKind::Annotation(AnnotationContent::new(AnnotationKind::Note, "me")),
        );
        assert_eq!(note.content_class(), ContentClass::Shape);
    }

    #[test]
    fn patch_updates_only_given_fields() {
        let mut element = Element::new(
            1,
            Rect::new(10.0, 10.0, 50.0, 40.0),
            ElementKind::Text(TextContent::new("Hi")),
        );
        element.apply(&ElementPatch { x: Some(25.0), opacity: Some(3.0), ..Default::default() });

        assert_eq!(element.x, 25.0);
        assert_eq!(element.y, 10.0);
        assert_eq!(element.width, 50.0);
        assert_eq!(element.opacity, 1.0);
    }

    #[test]
    fn stroke_follows_element_bounds() {
        let mut content = AnnotationContent::new(AnnotationKind::Freehand, "me");
        content.points = Some(vec![Point::new(10.0, 10.0), Point::new(30.0, 20.0)]);

        let mapped = content.stroke_in(Rect::new(100.0, 200.0, 40.0, 20.0)).expect("stroke");

        assert_eq!(mapped, vec![Point::new(100.0, 200.0), Point::new(140.0, 220.0)]);
    }

    #[test]
    fn patch_touches_annotation_timestamp() {
        let mut content = AnnotationContent::new(AnnotationKind::Note, "me");
        content.created_at -= 100;
        content.modified_at -= 100;
        let mut element =
            Element::new(1, Rect::new(0.0, 0.0, 30.0, 30.0), ElementKind::Annotation(content));

        element.apply(&ElementPatch::position(5.0, 5.0));

        let ElementKind::Annotation(annotation) = &element.kind else {
            panic!("expected annotation");
        };
        assert!(annotation.modified_at > annotation.created_at);
    }
}
