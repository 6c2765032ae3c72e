//! Page decoding and encoding at the editor's boundary.
//!
//! The editor core never parses or writes the page-description format
//! itself; it talks to a [`PageDecoder`] and a [`PageEncoder`]. The default
//! implementations are backed by lopdf.

mod decoder;
mod encoder;

pub use decoder::LopdfDecoder;
pub use encoder::LopdfEncoder;

use doc_model::{
    Color, Document, DocumentMetadata, Page, PageBackground, PageRotation, Point, Rect,
};

/// Fallback page size (US Letter) when a page carries no usable MediaBox
pub const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

#[derive(Debug, thiserror::Error)]
pub enum PdfEngineError {
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encrypted PDFs are not supported in the default backend")]
    EncryptedUnsupported,
    #[error("document has no pages")]
    NoPages,
    #[error("backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPage {
    pub width_pt: f32,
    pub height_pt: f32,
    pub rotation: PageRotation,
    pub background: Option<PageBackground>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDocument {
    pub pages: Vec<DecodedPage>,
    pub metadata: DocumentMetadata,
}

impl DecodedDocument {
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Build an editable document with no elements.
    pub fn into_document(self, file_name: impl Into<String>) -> Document {
        let pages = self
            .pages
            .into_iter()
            .enumerate()
            .map(|(index, decoded)| {
                let mut page = Page::new(index as u32 + 1, decoded.width_pt, decoded.height_pt);
                page.rotation = decoded.rotation;
                page.background = decoded.background;
                page
            })
            .collect();
        Document::new(file_name, pages, self.metadata)
    }
}

pub trait PageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedDocument, PdfEngineError>;
}

/// Native annotation kinds the encoder can write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationSubtype {
    FreeText,
    Square,
    Circle,
    Line,
    Highlight,
    Text,
    Stamp,
    Ink,
}

impl AnnotationSubtype {
    pub fn name(self) -> &'static str {
        match self {
            AnnotationSubtype::FreeText => "FreeText",
            AnnotationSubtype::Square => "Square",
            AnnotationSubtype::Circle => "Circle",
            AnnotationSubtype::Line => "Line",
            AnnotationSubtype::Highlight => "Highlight",
            AnnotationSubtype::Text => "Text",
            AnnotationSubtype::Stamp => "Stamp",
            AnnotationSubtype::Ink => "Ink",
        }
    }
}

/// One element written as a native annotation. Geometry is page-local with
/// a top-left origin; the encoder flips it into the target's bottom-up space.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeAnnotation {
    pub subtype: AnnotationSubtype,
    pub rect: Rect,
    pub color: Option<Color>,
    pub interior: Option<Color>,
    pub border_width: f32,
    pub opacity: f32,
    pub contents: Option<String>,
    pub author: Option<String>,
    pub font_size: Option<f32>,
    /// Endpoints for `Line`
    pub line: Option<(Point, Point)>,
    /// Stroke points for `Ink`
    pub ink: Option<Vec<Point>>,
    /// Stamp label for `Stamp`
    pub stamp_name: Option<String>,
    /// Clockwise degrees
    pub rotation: f32,
}

impl NativeAnnotation {
    pub fn new(subtype: AnnotationSubtype, rect: Rect) -> Self {
        Self {
            subtype,
            rect,
            color: None,
            interior: None,
            border_width: 1.0,
            opacity: 1.0,
            contents: None,
            author: None,
            font_size: None,
            line: None,
            ink: None,
            stamp_name: None,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodePage {
    pub width_pt: f32,
    pub height_pt: f32,
    pub rotation: PageRotation,
    pub annotations: Vec<NativeAnnotation>,
}

impl EncodePage {
    pub fn new(width_pt: f32, height_pt: f32) -> Self {
        Self { width_pt, height_pt, rotation: PageRotation::None, annotations: Vec::new() }
    }
}

pub trait PageEncoder {
    fn encode(
        &self,
        pages: &[EncodePage],
        metadata: &DocumentMetadata,
    ) -> Result<Vec<u8>, PdfEngineError>;
}

pub fn default_decoder() -> LopdfDecoder {
    LopdfDecoder::new()
}

pub fn default_encoder() -> LopdfEncoder {
    LopdfEncoder::new()
}
