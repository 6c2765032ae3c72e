//! The walk shared by every export format.
//!
//! Elements are lowered to a handful of drawing marks in page coordinates.
//! Rotation and opacity stay on the [`SceneItem`] so each backend can apply
//! them the way its output format prefers.

use crate::{ExportOptions, ExportResult, PageRange};
use doc_model::{
    AnnotationKind, Color, Document, Element, ElementKind, ImageContent, Page, PageBackground,
    Point, Rect, ShapeKind, TextContent,
};

/// Stroke width of freehand pen strokes
pub const FREEHAND_WIDTH: f32 = 2.0;
/// Stroke width of highlighter strokes
pub const HIGHLIGHTER_WIDTH: f32 = 12.0;
/// Font size used for note, stamp and callout labels
pub const LABEL_FONT_SIZE: f32 = 12.0;

const ARROW_HEAD_SIZE: f32 = 10.0;

pub struct PageScene<'a> {
    pub page: &'a Page,
    /// Only set when the page has a raster and it was asked for
    pub background: Option<&'a PageBackground>,
    pub items: Vec<SceneItem<'a>>,
}

pub struct SceneItem<'a> {
    pub element: &'a Element,
    pub marks: Vec<Mark<'a>>,
}

impl SceneItem<'_> {
    /// Clockwise degrees around [`SceneItem::pivot`]
    pub fn rotation(&self) -> f32 {
        self.element.rotation
    }

    pub fn pivot(&self) -> Point {
        self.element.bounds().center()
    }

    pub fn opacity(&self) -> f32 {
        self.element.opacity.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mark<'a> {
    Text {
        bounds: Rect,
        content: &'a TextContent,
    },
    Image {
        bounds: Rect,
        content: &'a ImageContent,
    },
    Rect {
        bounds: Rect,
        fill: Option<Color>,
        stroke: Option<Color>,
        width: f32,
    },
    Ellipse {
        bounds: Rect,
        fill: Option<Color>,
        stroke: Option<Color>,
        width: f32,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
        width: f32,
        arrow: bool,
    },
    Polyline {
        points: Vec<Point>,
        color: Color,
        width: f32,
    },
    /// Boxed caption: sticky notes, stamps and callout bodies
    Label {
        bounds: Rect,
        fill: Option<Color>,
        border: Color,
        text: &'a str,
        text_color: Color,
    },
}

/// Scene for every page in `range`.
pub fn build<'a>(
    document: &'a Document,
    range: PageRange,
    options: &ExportOptions,
) -> ExportResult<Vec<PageScene<'a>>> {
    let pages = range.resolve(document.page_count())?;
    let mut scenes = Vec::new();

    for number in pages {
        let Some(page) = document.page(number) else {
            continue;
        };
        let items = document
            .elements
            .iter()
            .filter(|element| element.page == number)
            .filter(|element| options.includes(element.content_class()))
            .filter(|element| document.layers.is_element_visible(&element.id))
            .map(|element| SceneItem { element, marks: marks(element) })
            .collect();

        scenes.push(PageScene {
            page,
            background: page.background.as_ref().filter(|_| options.include_background),
            items,
        });
    }
    Ok(scenes)
}

/// Lower one element to its drawing marks.
pub fn marks(element: &Element) -> Vec<Mark<'_>> {
    let bounds = element.bounds();
    let top_left = Point::new(bounds.x, bounds.y);
    let bottom_right = Point::new(bounds.right(), bounds.bottom());

    match &element.kind {
        ElementKind::Text(content) => vec![Mark::Text { bounds, content }],
        ElementKind::Image(content) => vec![Mark::Image { bounds, content }],
        ElementKind::Shape(shape) => {
            let stroke = Some(shape.stroke);
            match shape.kind {
                ShapeKind::Rectangle => {
                    vec![Mark::Rect { bounds, fill: shape.fill, stroke, width: shape.stroke_width }]
                }
                ShapeKind::Circle => {
                    vec![Mark::Ellipse { bounds, fill: shape.fill, stroke, width: shape.stroke_width }]
                }
                ShapeKind::Line | ShapeKind::Arrow => vec![Mark::Line {
                    from: top_left,
                    to: bottom_right,
                    color: shape.stroke,
                    width: shape.stroke_width,
                    arrow: shape.kind == ShapeKind::Arrow,
                }],
            }
        }
        ElementKind::Annotation(annotation) => match annotation.kind {
            AnnotationKind::Highlight => match annotation.stroke_in(bounds) {
                Some(points) => {
                    vec![Mark::Polyline { points, color: annotation.color, width: HIGHLIGHTER_WIDTH }]
                }
                None => vec![Mark::Rect { bounds, fill: Some(annotation.color), stroke: None, width: 0.0 }],
            },
            AnnotationKind::Freehand => annotation
                .stroke_in(bounds)
                .map(|points| Mark::Polyline { points, color: annotation.color, width: FREEHAND_WIDTH })
                .into_iter()
                .collect(),
            AnnotationKind::Note => vec![Mark::Label {
                bounds,
                fill: Some(annotation.color),
                border: annotation.color,
                text: &annotation.text,
                text_color: Color::BLACK,
            }],
            AnnotationKind::Stamp => vec![Mark::Label {
                bounds,
                fill: None,
                border: annotation.color,
                text: annotation.stamp.as_ref().map(|stamp| stamp.label()).unwrap_or("STAMP"),
                text_color: annotation.color,
            }],
            AnnotationKind::Callout => {
                let mut marks = Vec::with_capacity(2);
                if let Some(target) = annotation.target_in(bounds) {
                    marks.push(Mark::Line {
                        from: bounds.center(),
                        to: target,
                        color: annotation.color,
                        width: FREEHAND_WIDTH,
                        arrow: false,
                    });
                }
                marks.push(Mark::Label {
                    bounds,
                    fill: Some(Color::WHITE),
                    border: annotation.color,
                    text: &annotation.text,
                    text_color: Color::BLACK,
                });
                marks
            }
            AnnotationKind::Arrow => {
                let (from, to) = match annotation.target_in(bounds) {
                    // The tail sits in the corner opposite the target
                    Some(target) => {
                        let center = bounds.center();
                        (Point::new(2.0 * center.x - target.x, 2.0 * center.y - target.y), target)
                    }
                    None => (top_left, bottom_right),
                };
                vec![Mark::Line { from, to, color: annotation.color, width: FREEHAND_WIDTH, arrow: true }]
            }
        },
    }
}

/// Tip and the two barb ends of an arrow head pointing from `from` to `to`.
pub fn arrow_head(from: Point, to: Point) -> [Point; 3] {
    let angle = (to.y - from.y).atan2(to.x - from.x);
    let spread = std::f32::consts::PI / 6.0;
    let barb = |offset: f32| {
        Point::new(
            to.x - ARROW_HEAD_SIZE * (angle + offset).cos(),
            to.y - ARROW_HEAD_SIZE * (angle + offset).sin(),
        )
    };
    [to, barb(-spread), barb(spread)]
}
