//! Element creation with editor defaults
//!
//! Tools never build elements by hand; they ask the [`ElementFactory`], which
//! applies the [`EditorConfig`] defaults (author, colors, sizes).

use crate::error::EditorResult;
use crate::history::HistoryConfig;
use crate::selection::Tool;
use doc_model::{
    AnnotationContent, AnnotationKind, Color, Element, ElementKind, ImageContent, Point, Rect,
    ShapeContent, ShapeKind, StampKind, TextContent,
};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::Arc;

/// In-memory editor settings. Nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Author recorded on annotations and comments
    pub author: String,
    pub font_size: f32,
    /// Size of a text box created by a click
    pub text_box: (f32, f32),
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub highlight_color: Color,
    pub highlight_opacity: f32,
    /// Hit radius of manipulation handles, in page units
    pub handle_size: f32,
    /// Drawing gestures smaller than this on both axes are discarded
    pub min_draw_size: f32,
    /// Offset applied to pasted elements before the per-element cascade
    pub paste_offset: (f32, f32),
    pub clipboard_ttl_secs: u64,
    pub history: HistoryConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            author: "Anonymous".to_owned(),
            font_size: 16.0,
            text_box: (200.0, 30.0),
            stroke_color: Color::BLACK,
            stroke_width: 2.0,
            highlight_color: Color::YELLOW,
            highlight_opacity: 0.4,
            handle_size: 6.0,
            min_draw_size: 10.0,
            paste_offset: (10.0, 10.0),
            clipboard_ttl_secs: 300,
            history: HistoryConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_stroke(mut self, color: Color, width: f32) -> Self {
        self.stroke_color = color;
        self.stroke_width = width.max(0.0);
        self
    }

    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = doc_model::clamp_font_size(size);
        self
    }

    pub fn with_history(mut self, history: HistoryConfig) -> Self {
        self.history = history;
        self
    }

    pub fn with_clipboard_ttl(mut self, secs: u64) -> Self {
        self.clipboard_ttl_secs = secs;
        self
    }
}

/// Builds elements for tool gestures
#[derive(Debug, Clone)]
pub struct ElementFactory {
    config: EditorConfig,
}

impl ElementFactory {
    pub fn new(config: EditorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Default text box with its top-left corner at `at`
    pub fn text(&self, page: u32, at: Point, content: impl Into<String>) -> Element {
        let (width, height) = self.config.text_box;
        let text = TextContent::new(content).with_font_size(self.config.font_size);
        Element::new(page, Rect::new(at.x, at.y, width, height), ElementKind::Text(text))
    }

    /// Image element from encoded bytes. The placed size is the intrinsic
    /// size, scaled down to fit the image cap.
    pub fn image(&self, page: u32, at: Point, bytes: Vec<u8>) -> EditorResult<Element> {
        let format = image::guess_format(&bytes)?;
        let (intrinsic_width, intrinsic_height) =
            image::ImageReader::with_format(Cursor::new(&bytes), format).into_dimensions()?;

        let content = ImageContent {
            data: Arc::from(bytes),
            mime_type: format.to_mime_type().to_owned(),
            intrinsic_width,
            intrinsic_height,
        };
        let (width, height) = content.placed_size();
        log::debug!("placing {intrinsic_width}x{intrinsic_height} image at {width}x{height}");
        Ok(Element::new(page, Rect::new(at.x, at.y, width, height), ElementKind::Image(content)))
    }

    /// Element for a finished box drag (shapes and box annotations).
    ///
    /// `start` and `end` are the drag endpoints; the element spans their
    /// bounding box. Returns `None` for tools that do not draw boxes.
    pub fn from_drag(&self, tool: Tool, page: u32, start: Point, end: Point) -> Option<Element> {
        let bounds = Rect::from_corners(start, end);
        let kind = match tool {
            Tool::Shape(kind) => ElementKind::Shape(self.shape(kind)),
            Tool::Annotation(AnnotationKind::Freehand) => return None,
            Tool::Annotation(kind) => {
                let mut content = AnnotationContent::new(kind, self.config.author.clone());
                match kind {
                    AnnotationKind::Stamp => content.stamp = Some(StampKind::Approved),
                    AnnotationKind::Callout | AnnotationKind::Arrow => {
                        content.target = Some(Point::new(end.x - bounds.x, end.y - bounds.y));
                    }
                    AnnotationKind::Highlight => content.color = self.config.highlight_color,
                    AnnotationKind::Note | AnnotationKind::Freehand => {}
                }
                ElementKind::Annotation(content)
            }
            Tool::Select | Tool::Text | Tool::Image | Tool::Pen | Tool::Highlighter => {
                return None;
            }
        };

        let mut element = Element::new(page, bounds, kind);
        if tool == Tool::Annotation(AnnotationKind::Highlight) {
            element.opacity = self.config.highlight_opacity;
        }
        Some(element)
    }

    /// Element for a finished freehand stroke (pen, highlighter, freehand
    /// annotation). Returns `None` for other tools or an empty stroke.
    pub fn from_stroke(&self, tool: Tool, page: u32, points: Vec<Point>) -> Option<Element> {
        let bounds = Rect::bounding(&points)?;
        let (kind, color, opacity) = match tool {
            Tool::Pen | Tool::Annotation(AnnotationKind::Freehand) => {
                (AnnotationKind::Freehand, self.config.stroke_color, 1.0)
            }
            Tool::Highlighter => {
                (AnnotationKind::Highlight, self.config.highlight_color, self.config.highlight_opacity)
            }
            _ => return None,
        };

        let mut content = AnnotationContent::new(kind, self.config.author.clone());
        content.color = color;
        content.points = Some(points);

        let mut element = Element::new(page, bounds, ElementKind::Annotation(content));
        element.opacity = opacity;
        Some(element)
    }

    fn shape(&self, kind: ShapeKind) -> ShapeContent {
        ShapeContent {
            kind,
            fill: None,
            stroke: self.config.stroke_color,
            stroke_width: self.config.stroke_width,
        }
    }
}

impl Default for ElementFactory {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, image::ImageFormat::Png).expect("encode png");
        bytes.into_inner()
    }

    #[test]
    fn test_text_uses_configured_defaults() {
        let factory = ElementFactory::new(EditorConfig::default().with_font_size(100.0));
        let element = factory.text(1, Point::new(100.0, 100.0), "Hello");

        assert_eq!((element.x, element.y), (100.0, 100.0));
        let text = element.as_text().expect("text element");
        assert_eq!(text.text, "Hello");
        assert_eq!(text.font_size, 72.0);
    }

    #[test]
    fn test_image_keeps_intrinsic_size_and_caps_placement() {
        let factory = ElementFactory::default();
        let element =
            factory.image(1, Point::new(0.0, 0.0), png_bytes(600, 150)).expect("decode image");

        let ElementKind::Image(content) = &element.kind else {
            panic!("expected image");
        };
        assert_eq!((content.intrinsic_width, content.intrinsic_height), (600, 150));
        assert_eq!(content.mime_type, "image/png");
        assert_eq!((element.width, element.height), (300.0, 75.0));
    }

    #[test]
    fn test_image_rejects_garbage() {
        let factory = ElementFactory::default();
        assert!(factory.image(1, Point::new(0.0, 0.0), b"not an image".to_vec()).is_err());
    }

    #[test]
    fn test_drag_normalizes_bounds() {
        let factory = ElementFactory::default();
        let element = factory
            .from_drag(
                Tool::Shape(ShapeKind::Rectangle),
                1,
                Point::new(80.0, 90.0),
                Point::new(20.0, 30.0),
            )
            .expect("shape");

        assert_eq!(element.bounds(), Rect::new(20.0, 30.0, 60.0, 60.0));
    }

    #[test]
    fn test_callout_target_is_relative_to_bounds() {
        let factory = ElementFactory::default();
        let element = factory
            .from_drag(
                Tool::Annotation(AnnotationKind::Callout),
                1,
                Point::new(10.0, 10.0),
                Point::new(60.0, 40.0),
            )
            .expect("callout");

        let ElementKind::Annotation(content) = &element.kind else {
            panic!("expected annotation");
        };
        assert_eq!(content.target, Some(Point::new(50.0, 30.0)));
    }

    #[test]
    fn test_highlighter_stroke_is_translucent() {
        let factory = ElementFactory::default();
        let element = factory
            .from_stroke(
                Tool::Highlighter,
                1,
                vec![Point::new(0.0, 0.0), Point::new(40.0, 5.0), Point::new(80.0, 12.0)],
            )
            .expect("stroke");

        assert_eq!(element.bounds(), Rect::new(0.0, 0.0, 80.0, 12.0));
        assert!(element.opacity < 1.0);
        assert!(factory.from_stroke(Tool::Pen, 1, Vec::new()).is_none());
    }
}
