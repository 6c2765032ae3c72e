//! Composes pages and their elements into export formats.
//!
//! Every format shares the same walk (see [`scene`]): pages in the requested
//! range, the page background when present and wanted, then the page's
//! elements in document order with excluded content classes skipped.

mod html;
mod pdf;
mod raster;
pub mod scene;
mod svg;
mod text;

use doc_model::{Color, ContentClass, Document};
use pdf_engine::{PageEncoder, PdfEngineError};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub use pdf::native_annotation;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("page range {from}-{to} selects nothing in a {page_count}-page document")]
    EmptyRange { from: u32, to: u32, page_count: u32 },
    #[error("encoding failed: {0}")]
    Encode(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("page encoder error: {0}")]
    Engine(#[from] PdfEngineError),
}

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    Pdf,
    Png,
    Jpeg,
    Svg,
    Html,
    Text,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Svg => "svg",
            ExportFormat::Html => "html",
            ExportFormat::Text => "txt",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Svg => "image/svg+xml",
            ExportFormat::Html => "text/html",
            ExportFormat::Text => "text/plain",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(ExportFormat::Pdf),
            "png" => Some(ExportFormat::Png),
            "jpg" | "jpeg" => Some(ExportFormat::Jpeg),
            "svg" => Some(ExportFormat::Svg),
            "html" | "htm" => Some(ExportFormat::Html),
            "txt" | "text" => Some(ExportFormat::Text),
            _ => None,
        }
    }

    /// Raster formats only ever export one page.
    pub fn is_raster(self) -> bool {
        matches!(self, ExportFormat::Png | ExportFormat::Jpeg)
    }
}

/// 1-based inclusive page range. Out-of-bounds ends are clamped to the
/// document when the range is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub from: u32,
    pub to: u32,
}

impl PageRange {
    pub fn new(from: u32, to: u32) -> Self {
        Self { from, to }
    }

    pub fn all() -> Self {
        Self { from: 1, to: u32::MAX }
    }

    pub fn single(page: u32) -> Self {
        Self { from: page, to: page }
    }

    pub fn resolve(&self, page_count: u32) -> ExportResult<RangeInclusive<u32>> {
        let from = self.from.max(1);
        let to = self.to.min(page_count);
        if page_count == 0 || from > to {
            return Err(ExportError::EmptyRange { from: self.from, to: self.to, page_count });
        }
        Ok(from..=to)
    }
}

impl Default for PageRange {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// JPEG quality, 1 to 100
    pub quality: u8,
    pub dpi: f32,
    /// Canvas fill behind everything; `None` is transparent
    pub background: Option<Color>,
    /// Composite the decoded page raster when the page has one
    pub include_background: bool,
    pub include_text: bool,
    pub include_images: bool,
    pub include_shapes: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            quality: 90,
            dpi: 150.0,
            background: Some(Color::WHITE),
            include_background: true,
            include_text: true,
            include_images: true,
            include_shapes: true,
        }
    }
}

impl ExportOptions {
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn with_dpi(mut self, dpi: f32) -> Self {
        if dpi > 0.0 {
            self.dpi = dpi;
        }
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_transparent_background(mut self) -> Self {
        self.background = None;
        self
    }

    pub fn with_page_background(mut self, include: bool) -> Self {
        self.include_background = include;
        self
    }

    pub fn with_content(mut self, class: ContentClass, include: bool) -> Self {
        match class {
            ContentClass::Text => self.include_text = include,
            ContentClass::Image => self.include_images = include,
            ContentClass::Shape => self.include_shapes = include,
        }
        self
    }

    pub fn includes(&self, class: ContentClass) -> bool {
        match class {
            ContentClass::Text => self.include_text,
            ContentClass::Image => self.include_images,
            ContentClass::Shape => self.include_shapes,
        }
    }

    /// Pixels per page unit
    pub fn scale(&self) -> f32 {
        self.dpi / 72.0
    }
}

/// Export pages of `document` in `format`. PDF output goes through the
/// default lopdf encoder.
pub fn export(
    document: &Document,
    format: ExportFormat,
    range: PageRange,
    options: &ExportOptions,
) -> ExportResult<Vec<u8>> {
    export_with_encoder(document, format, range, options, &pdf_engine::default_encoder())
}

pub fn export_with_encoder(
    document: &Document,
    format: ExportFormat,
    range: PageRange,
    options: &ExportOptions,
    encoder: &dyn PageEncoder,
) -> ExportResult<Vec<u8>> {
    let pages = scene::build(document, range, options)?;
    log::info!(
        "exporting {} page(s) of {:?} as {format:?}",
        pages.len(),
        document.file_name
    );

    match format {
        ExportFormat::Pdf => pdf::encode(document, &pages, encoder),
        ExportFormat::Png => raster::encode_png(&pages, options),
        ExportFormat::Jpeg => raster::encode_jpeg(&pages, options),
        ExportFormat::Svg => Ok(svg::document(&pages, options)?.into_bytes()),
        ExportFormat::Html => Ok(html::document(&document.file_name, &pages, options)?.into_bytes()),
        ExportFormat::Text => Ok(text::document(&pages).into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_clamped_to_the_document() {
        assert_eq!(PageRange::new(0, 10).resolve(3).expect("range"), 1..=3);
        assert_eq!(PageRange::all().resolve(5).expect("range"), 1..=5);
        assert_eq!(PageRange::single(2).resolve(5).expect("range"), 2..=2);
    }

    #[test]
    fn inverted_or_out_of_bounds_range_is_empty() {
        assert!(matches!(PageRange::new(3, 2).resolve(5), Err(ExportError::EmptyRange { .. })));
        assert!(matches!(PageRange::new(6, 9).resolve(5), Err(ExportError::EmptyRange { .. })));
        assert!(matches!(PageRange::all().resolve(0), Err(ExportError::EmptyRange { .. })));
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(ExportOptions::default().with_quality(0).quality, 1);
        assert_eq!(ExportOptions::default().with_quality(250).quality, 100);
    }

    #[test]
    fn content_flags_toggle_by_class() {
        let options = ExportOptions::default().with_content(ContentClass::Image, false);
        assert!(options.includes(ContentClass::Text));
        assert!(!options.includes(ContentClass::Image));
    }

    #[test]
    fn formats_round_trip_through_extensions() {
        for format in [
            ExportFormat::Pdf,
            ExportFormat::Png,
            ExportFormat::Jpeg,
            ExportFormat::Svg,
            ExportFormat::Html,
            ExportFormat::Text,
        ] {
            assert_eq!(ExportFormat::from_extension(format.extension()), Some(format));
        }
        assert_eq!(ExportFormat::from_extension("JPEG"), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_extension("docx"), None);
    }
}
