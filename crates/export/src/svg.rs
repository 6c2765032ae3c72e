//! Vector markup output. All pages are stacked vertically in one SVG
//! document, in page units.

use crate::scene::{arrow_head, Mark, PageScene, SceneItem, LABEL_FONT_SIZE};
use crate::{ExportError, ExportOptions, ExportResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use doc_model::{Color, ImageContent, PageBackground, Point, Rect, TextContent};
use image::{ImageBuffer, ImageFormat, Rgba};
use std::fmt::{self, Write};
use std::io::Cursor;

/// Vertical space between stacked pages
pub const PAGE_GAP: f32 = 20.0;

const LINE_HEIGHT: f32 = 1.2;
const LABEL_PADDING: f32 = 4.0;

pub(crate) fn document(pages: &[PageScene<'_>], options: &ExportOptions) -> ExportResult<String> {
    let width = pages.iter().map(|scene| scene.page.width).fold(0.0, f32::max);
    let height = pages.iter().map(|scene| scene.page.height).sum::<f32>()
        + PAGE_GAP * pages.len().saturating_sub(1) as f32;

    let mut out = String::new();
    write_document(&mut out, pages, options, width, height)?;
    Ok(out)
}

fn write_document(
    out: &mut String,
    pages: &[PageScene<'_>],
    options: &ExportOptions,
    width: f32,
    height: f32,
) -> ExportResult<()> {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#).map_err(format_error)?;
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = num(width),
        h = num(height)
    )
    .map_err(format_error)?;

    let mut offset = 0.0;
    for scene in pages {
        let page = scene.page;
        writeln!(
            out,
            r#"<g class="page" data-page="{}" transform="translate(0 {})">"#,
            page.number,
            num(offset)
        )
        .map_err(format_error)?;
        if let Some(color) = options.background {
            writeln!(
                out,
                r#"<rect width="{}" height="{}" {}/>"#,
                num(page.width),
                num(page.height),
                paint_attr("fill", color)
            )
            .map_err(format_error)?;
        }
        if let Some(background) = scene.background {
            writeln!(
                out,
                r#"<image href="{}" width="{}" height="{}" preserveAspectRatio="none"/>"#,
                background_href(background)?,
                num(page.width),
                num(page.height)
            )
            .map_err(format_error)?;
        }
        for item in &scene.items {
            write_item(out, item).map_err(format_error)?;
        }
        writeln!(out, "</g>").map_err(format_error)?;
        offset += page.height + PAGE_GAP;
    }

    writeln!(out, "</svg>").map_err(format_error)?;
    Ok(())
}

fn write_item(out: &mut String, item: &SceneItem<'_>) -> fmt::Result {
    let pivot = item.pivot();
    write!(out, r#"<g class="{}" data-id="{}""#, item.element.kind_name(), escape(item.element.id.as_str()))?;
    if item.rotation() != 0.0 {
        write!(out, r#" transform="rotate({} {} {})""#, num(item.rotation()), num(pivot.x), num(pivot.y))?;
    }
    if item.opacity() < 1.0 {
        write!(out, r#" opacity="{}""#, num(item.opacity()))?;
    }
    writeln!(out, ">")?;
    write_marks(out, &item.marks)?;
    writeln!(out, "</g>")
}

/// Marks in page coordinates. Also used for inline SVG in HTML output.
pub(crate) fn write_marks(out: &mut String, marks: &[Mark<'_>]) -> fmt::Result {
    for mark in marks {
        match mark {
            Mark::Text { bounds, content } => write_text(out, bounds, content)?,
            Mark::Image { bounds, content } => writeln!(
                out,
                r#"<image href="{}" x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="none"/>"#,
                image_href(content),
                num(bounds.x),
                num(bounds.y),
                num(bounds.width),
                num(bounds.height)
            )?,
            Mark::Rect { bounds, fill, stroke, width } => writeln!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}" {} {}/>"#,
                num(bounds.x),
                num(bounds.y),
                num(bounds.width),
                num(bounds.height),
                fill_attr(*fill),
                stroke_attr(*stroke, *width)
            )?,
            Mark::Ellipse { bounds, fill, stroke, width } => {
                let center = bounds.center();
                writeln!(
                    out,
                    r#"<ellipse cx="{}" cy="{}" rx="{}" ry="{}" {} {}/>"#,
                    num(center.x),
                    num(center.y),
                    num(bounds.width / 2.0),
                    num(bounds.height / 2.0),
                    fill_attr(*fill),
                    stroke_attr(*stroke, *width)
                )?
            }
            Mark::Line { from, to, color, width, arrow } => {
                writeln!(
                    out,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" {}/>"#,
                    num(from.x),
                    num(from.y),
                    num(to.x),
                    num(to.y),
                    stroke_attr(Some(*color), *width)
                )?;
                if *arrow {
                    writeln!(
                        out,
                        r#"<polygon points="{}" {}/>"#,
                        points(&arrow_head(*from, *to)),
                        paint_attr("fill", *color)
                    )?;
                }
            }
            Mark::Polyline { points: stroke, color, width } => writeln!(
                out,
                r#"<polyline points="{}" fill="none" {} stroke-linecap="round" stroke-linejoin="round"/>"#,
                points(stroke),
                stroke_attr(Some(*color), *width)
            )?,
            Mark::Label { bounds, fill, border, text, text_color } => {
                writeln!(
                    out,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" {} {}/>"#,
                    num(bounds.x),
                    num(bounds.y),
                    num(bounds.width),
                    num(bounds.height),
                    fill_attr(*fill),
                    stroke_attr(Some(*border), 1.0)
                )?;
                let origin = Point::new(bounds.x + LABEL_PADDING, bounds.y + LABEL_PADDING);
                write_lines(out, origin, text, LABEL_FONT_SIZE, &paint_attr("fill", *text_color))?;
            }
        }
    }
    Ok(())
}

fn write_text(out: &mut String, bounds: &Rect, content: &TextContent) -> fmt::Result {
    let mut style = format!(
        r#"font-family="{}" {}"#,
        escape(&content.font_family),
        paint_attr("fill", content.color)
    );
    if content.bold {
        style.push_str(r#" font-weight="bold""#);
    }
    if content.italic {
        style.push_str(r#" font-style="italic""#);
    }
    if content.underline {
        style.push_str(r#" text-decoration="underline""#);
    }
    write_lines(out, Point::new(bounds.x, bounds.y), &content.text, content.font_size, &style)
}

/// One `<text>` run per line, baseline one font size below the line top.
fn write_lines(out: &mut String, origin: Point, text: &str, font_size: f32, attrs: &str) -> fmt::Result {
    for (index, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let baseline = origin.y + font_size + index as f32 * font_size * LINE_HEIGHT;
        writeln!(
            out,
            r#"<text x="{}" y="{}" font-size="{}" {} xml:space="preserve">{}</text>"#,
            num(origin.x),
            num(baseline),
            num(font_size),
            attrs,
            escape(line)
        )?;
    }
    Ok(())
}

pub(crate) fn image_href(content: &ImageContent) -> String {
    format!("data:{};base64,{}", content.mime_type, BASE64.encode(&content.data))
}

/// Page rasters are re-encoded as PNG data URIs.
pub(crate) fn background_href(background: &PageBackground) -> ExportResult<String> {
    let image = ImageBuffer::<Rgba<u8>, _>::from_raw(
        background.width_px,
        background.height_px,
        background.rgba.to_vec(),
    )
    .ok_or_else(|| ExportError::Encode("page background size mismatch".to_owned()))?;
    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png)?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(png.into_inner())))
}

fn fill_attr(fill: Option<Color>) -> String {
    match fill {
        Some(color) => paint_attr("fill", color),
        None => r#"fill="none""#.to_owned(),
    }
}

fn stroke_attr(stroke: Option<Color>, width: f32) -> String {
    match stroke {
        Some(color) if width > 0.0 => {
            format!(r#"{} stroke-width="{}""#, paint_attr("stroke", color), num(width))
        }
        _ => r#"stroke="none""#.to_owned(),
    }
}

fn paint_attr(name: &str, color: Color) -> String {
    if color.a == 255 {
        format!(r#"{name}="{}""#, color.to_hex())
    } else {
        format!(r#"{name}="{}" {name}-opacity="{}""#, color.to_hex(), num(color.a as f32 / 255.0))
    }
}

fn points(points: &[Point]) -> String {
    points
        .iter()
        .map(|point| format!("{},{}", num(point.x), num(point.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Up to two decimals, trailing zeros dropped.
pub(crate) fn num(value: f32) -> String {
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-0" => "0".to_owned(),
        other => other.to_owned(),
    }
}

pub(crate) fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn format_error(err: fmt::Error) -> ExportError {
    ExportError::Encode(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene;
    use crate::PageRange;
    use doc_model::{Document, Element, ElementKind, Page, ShapeContent, ShapeKind};

    fn render(document: &Document) -> String {
        let options = ExportOptions::default();
        let scenes = scene::build(document, PageRange::all(), &options).expect("scene");
        self::document(&scenes, &options).expect("svg")
    }

    #[test]
    fn numbers_are_compact() {
        assert_eq!(num(10.0), "10");
        assert_eq!(num(0.5), "0.5");
        assert_eq!(num(1.256), "1.26");
        assert_eq!(num(-0.001), "0");
    }

    #[test]
    fn pages_are_stacked_with_a_gap() {
        let pages = vec![Page::new(1, 100.0, 200.0), Page::new(2, 150.0, 100.0)];
        let document = Document::new("stack.pdf", pages, Default::default());

        let svg = render(&document);

        assert!(svg.contains(r#"width="150" height="320""#));
        assert!(svg.contains(r#"data-page="2" transform="translate(0 220)""#));
    }

    #[test]
    fn text_is_escaped_and_rotation_applied() {
        let mut document = Document::blank("t.pdf", 612.0, 792.0);
        let mut element = Element::new(
            1,
            Rect::new(100.0, 100.0, 200.0, 30.0),
            ElementKind::Text(TextContent::new("a < b & c")),
        );
        element.rotation = 90.0;
        document.elements.push(element);

        let svg = render(&document);

        assert!(svg.contains("a &lt; b &amp; c"));
        assert!(svg.contains(r#"transform="rotate(90 200 115)""#));
        assert!(svg.contains(r#"y="116""#));
    }

    #[test]
    fn shapes_become_vector_primitives() {
        let mut document = Document::blank("s.pdf", 612.0, 792.0);
        let mut circle = ShapeContent::new(ShapeKind::Circle);
        circle.fill = Some(Color::rgb(0, 255, 0));
        document.elements.push(Element::new(1, Rect::new(0.0, 0.0, 40.0, 20.0), ElementKind::Shape(circle)));
        document.elements.push(Element::new(
            1,
            Rect::new(0.0, 0.0, 50.0, 50.0),
            ElementKind::Shape(ShapeContent::new(ShapeKind::Arrow)),
        ));

        let svg = render(&document);

        assert!(svg.contains(r##"<ellipse cx="20" cy="10" rx="20" ry="10" fill="#00ff00""##));
        assert!(svg.contains("<line"));
        assert!(svg.contains("<polygon"));
    }
}
