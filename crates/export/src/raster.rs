//! PNG/JPEG output through tiny-skia.
//!
//! Only the first page of the range is rendered. There is no font engine, so
//! text runs are drawn as one filled block per glyph.

use crate::scene::{arrow_head, Mark, PageScene, SceneItem, LABEL_FONT_SIZE};
use crate::{ExportError, ExportOptions, ExportResult};
use doc_model::{Color, PageBackground, Point, Rect};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, ImageFormat, Rgb, Rgba};
use std::io::Cursor;
use tiny_skia::{
    ColorU8, FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};

const GLYPH_ADVANCE: f32 = 0.5;
const GLYPH_HEIGHT: f32 = 0.7;
const LINE_HEIGHT: f32 = 1.2;
const LABEL_PADDING: f32 = 4.0;

pub(crate) fn encode_png(pages: &[PageScene<'_>], options: &ExportOptions) -> ExportResult<Vec<u8>> {
    let pixmap = render_first(pages, options)?;
    let rgba: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let color = pixel.demultiply();
            [color.red(), color.green(), color.blue(), color.alpha()]
        })
        .collect();
    let image = ImageBuffer::<Rgba<u8>, _>::from_raw(pixmap.width(), pixmap.height(), rgba)
        .ok_or_else(|| ExportError::Encode("pixel buffer size mismatch".to_owned()))?;

    let mut output = Cursor::new(Vec::new());
    image.write_to(&mut output, ImageFormat::Png)?;
    Ok(output.into_inner())
}

/// JPEG has no alpha channel, so the page is flattened over white first.
pub(crate) fn encode_jpeg(pages: &[PageScene<'_>], options: &ExportOptions) -> ExportResult<Vec<u8>> {
    let pixmap = render_first(pages, options)?;
    let rgb: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            // Premultiplied source over opaque white
            let backdrop = 255 - pixel.alpha();
            [
                pixel.red().saturating_add(backdrop),
                pixel.green().saturating_add(backdrop),
                pixel.blue().saturating_add(backdrop),
            ]
        })
        .collect();
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(pixmap.width(), pixmap.height(), rgb)
        .ok_or_else(|| ExportError::Encode("pixel buffer size mismatch".to_owned()))?;

    let mut output = Vec::new();
    image.write_with_encoder(JpegEncoder::new_with_quality(&mut output, options.quality))?;
    Ok(output)
}

fn render_first(pages: &[PageScene<'_>], options: &ExportOptions) -> ExportResult<Pixmap> {
    let first = pages
        .first()
        .ok_or_else(|| ExportError::Encode("no page to rasterize".to_owned()))?;
    if pages.len() > 1 {
        log::debug!("raster export renders page {} only", first.page.number);
    }
    render_page(first, options)
}

pub(crate) fn render_page(scene: &PageScene<'_>, options: &ExportOptions) -> ExportResult<Pixmap> {
    let scale = options.scale();
    let width = (scene.page.width * scale).ceil().max(1.0) as u32;
    let height = (scene.page.height * scale).ceil().max(1.0) as u32;
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| ExportError::Encode(format!("cannot allocate a {width}x{height} canvas")))?;

    if let Some(color) = options.background {
        pixmap.fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a));
    }

    if let Some(background) = scene.background {
        draw_background(&mut pixmap, background);
    }

    let base = Transform::from_scale(scale, scale);
    for item in &scene.items {
        draw_item(&mut pixmap, base, item)?;
    }
    Ok(pixmap)
}

fn draw_background(pixmap: &mut Pixmap, background: &PageBackground) {
    let Some(raster) = straight_to_pixmap(background.width_px, background.height_px, &background.rgba)
    else {
        log::warn!("page background has an unexpected size, skipped");
        return;
    };
    let transform = Transform::from_scale(
        pixmap.width() as f32 / background.width_px as f32,
        pixmap.height() as f32 / background.height_px as f32,
    );
    pixmap.draw_pixmap(0, 0, raster.as_ref(), &PixmapPaint::default(), transform, None);
}

fn draw_item(pixmap: &mut Pixmap, base: Transform, item: &SceneItem<'_>) -> ExportResult<()> {
    let pivot = item.pivot();
    let transform = base.pre_concat(Transform::from_rotate_at(item.rotation(), pivot.x, pivot.y));
    let opacity = item.opacity();

    for mark in &item.marks {
        match mark {
            Mark::Text { bounds, content } => {
                glyph_blocks(
                    pixmap,
                    transform,
                    bounds,
                    &content.text,
                    content.font_size,
                    content.color,
                    opacity,
                );
                if content.underline {
                    let y = bounds.y + content.font_size;
                    let line = line_path(Point::new(bounds.x, y), Point::new(bounds.right(), y));
                    stroke(pixmap, transform, line.as_ref(), content.color, 1.0, opacity);
                }
            }
            Mark::Image { bounds, content } => {
                let decoded = image::load_from_memory(&content.data)?.to_rgba8();
                let Some(raster) = straight_to_pixmap(decoded.width(), decoded.height(), decoded.as_raw())
                else {
                    continue;
                };
                let placement = transform.pre_translate(bounds.x, bounds.y).pre_scale(
                    bounds.width / decoded.width().max(1) as f32,
                    bounds.height / decoded.height().max(1) as f32,
                );
                let paint = PixmapPaint { opacity, ..PixmapPaint::default() };
                pixmap.draw_pixmap(0, 0, raster.as_ref(), &paint, placement, None);
            }
            Mark::Rect { bounds, fill: interior, stroke: outline, width } => {
                let path = rect_path(bounds);
                if let Some(interior) = interior {
                    fill(pixmap, transform, path.as_ref(), *interior, opacity);
                }
                if let Some(outline) = outline {
                    stroke(pixmap, transform, path.as_ref(), *outline, *width, opacity);
                }
            }
            Mark::Ellipse { bounds, fill: interior, stroke: outline, width } => {
                let path = tiny_skia::Rect::from_xywh(bounds.x, bounds.y, bounds.width, bounds.height)
                    .and_then(PathBuilder::from_oval);
                if let Some(interior) = interior {
                    fill(pixmap, transform, path.as_ref(), *interior, opacity);
                }
                if let Some(outline) = outline {
                    stroke(pixmap, transform, path.as_ref(), *outline, *width, opacity);
                }
            }
            Mark::Line { from, to, color, width, arrow } => {
                stroke(pixmap, transform, line_path(*from, *to).as_ref(), *color, *width, opacity);
                if *arrow {
                    let head = polygon_path(&arrow_head(*from, *to));
                    fill(pixmap, transform, head.as_ref(), *color, opacity);
                }
            }
            Mark::Polyline { points, color, width } => {
                let path = polyline_path(points);
                stroke(pixmap, transform, path.as_ref(), *color, *width, opacity);
            }
            Mark::Label { bounds, fill: background, border, text, text_color } => {
                let path = rect_path(bounds);
                if let Some(background) = background {
                    fill(pixmap, transform, path.as_ref(), *background, opacity);
                }
                stroke(pixmap, transform, path.as_ref(), *border, 1.0, opacity);
                let inner = Rect::new(
                    bounds.x + LABEL_PADDING,
                    bounds.y + LABEL_PADDING,
                    (bounds.width - 2.0 * LABEL_PADDING).max(0.0),
                    (bounds.height - 2.0 * LABEL_PADDING).max(0.0),
                );
                glyph_blocks(pixmap, transform, &inner, text, LABEL_FONT_SIZE, *text_color, opacity);
            }
        }
    }
    Ok(())
}

/// One block per visible glyph, clipped to the box width. Lines past the box
/// height are still drawn, like overflowing text in the editor.
fn glyph_blocks(
    pixmap: &mut Pixmap,
    transform: Transform,
    bounds: &Rect,
    text: &str,
    font_size: f32,
    color: Color,
    opacity: f32,
) {
    let advance = font_size * GLYPH_ADVANCE;
    let mut builder = PathBuilder::new();
    for (line_index, line) in text.lines().enumerate() {
        let top = bounds.y + line_index as f32 * font_size * LINE_HEIGHT + font_size * (1.0 - GLYPH_HEIGHT);
        for (column, glyph) in line.chars().enumerate() {
            let left = bounds.x + column as f32 * advance;
            if left + advance > bounds.right() {
                break;
            }
            if glyph.is_whitespace() {
                continue;
            }
            if let Some(block) =
                tiny_skia::Rect::from_xywh(left, top, advance * 0.8, font_size * GLYPH_HEIGHT)
            {
                builder.push_rect(block);
            }
        }
    }
    fill(pixmap, transform, builder.finish().as_ref(), color, opacity);
}

fn paint(color: Color, opacity: f32) -> Paint<'static> {
    let alpha = (color.a as f32 * opacity).round().clamp(0.0, 255.0) as u8;
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, alpha);
    paint.anti_alias = true;
    paint
}

fn fill(pixmap: &mut Pixmap, transform: Transform, path: Option<&Path>, color: Color, opacity: f32) {
    if let Some(path) = path {
        pixmap.fill_path(path, &paint(color, opacity), FillRule::Winding, transform, None);
    }
}

fn stroke(
    pixmap: &mut Pixmap,
    transform: Transform,
    path: Option<&Path>,
    color: Color,
    width: f32,
    opacity: f32,
) {
    let Some(path) = path else {
        return;
    };
    if width <= 0.0 {
        return;
    }
    let stroke = Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(path, &paint(color, opacity), &stroke, transform, None);
}

fn rect_path(bounds: &Rect) -> Option<Path> {
    tiny_skia::Rect::from_xywh(bounds.x, bounds.y, bounds.width, bounds.height)
        .map(PathBuilder::from_rect)
}

fn line_path(from: Point, to: Point) -> Option<Path> {
    let mut builder = PathBuilder::new();
    builder.move_to(from.x, from.y);
    builder.line_to(to.x, to.y);
    builder.finish()
}

fn polyline_path(points: &[Point]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut builder = PathBuilder::new();
    builder.move_to(first.x, first.y);
    for point in rest {
        builder.line_to(point.x, point.y);
    }
    builder.finish()
}

fn polygon_path(points: &[Point]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut builder = PathBuilder::new();
    builder.move_to(first.x, first.y);
    for point in rest {
        builder.line_to(point.x, point.y);
    }
    builder.close();
    builder.finish()
}

/// Straight RGBA8 into a premultiplied pixmap.
fn straight_to_pixmap(width: u32, height: u32, rgba: &[u8]) -> Option<Pixmap> {
    if rgba.len() != width as usize * height as usize * 4 {
        return None;
    }
    let mut pixmap = Pixmap::new(width, height)?;
    for (pixel, source) in pixmap.pixels_mut().iter_mut().zip(rgba.chunks_exact(4)) {
        *pixel = ColorU8::from_rgba(source[0], source[1], source[2], source[3]).premultiply();
    }
    Some(pixmap)
}
