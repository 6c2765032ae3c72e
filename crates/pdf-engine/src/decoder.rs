use crate::{DecodedDocument, DecodedPage, PageDecoder, PdfEngineError, DEFAULT_PAGE_SIZE};
use doc_model::{DocumentMetadata, PageBackground, PageRotation};
use image::{Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object};
use std::sync::Arc;

/// lopdf-backed decoder.
///
/// lopdf does not rasterize page content, so every page gets a blank white
/// background at `background_scale` pixels per point.
#[derive(Debug, Clone)]
pub struct LopdfDecoder {
    background_scale: f32,
    render_backgrounds: bool,
}

impl Default for LopdfDecoder {
    fn default() -> Self {
        Self { background_scale: 1.0, render_backgrounds: true }
    }
}

impl LopdfDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background_scale(mut self, scale: f32) -> Self {
        if scale > 0.0 {
            self.background_scale = scale;
        }
        self
    }

    pub fn without_backgrounds(mut self) -> Self {
        self.render_backgrounds = false;
        self
    }

    fn background(&self, width_pt: f32, height_pt: f32) -> Option<PageBackground> {
        if !self.render_backgrounds {
            return None;
        }
        let width = (width_pt * self.background_scale).round().max(1.0) as u32;
        let height = (height_pt * self.background_scale).round().max(1.0) as u32;
        let image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        Some(PageBackground { width_px: width, height_px: height, rgba: Arc::from(image.into_raw()) })
    }
}

impl PageDecoder for LopdfDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedDocument, PdfEngineError> {
        if bytes.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(PdfEngineError::EncryptedUnsupported);
        }

        let doc = Document::load_mem(bytes)?;
        let pages = doc.get_pages();
        let mut decoded = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            let dict = doc.get_dictionary(object_id)?;
            let (width_pt, height_pt) = media_box(dict).unwrap_or(DEFAULT_PAGE_SIZE);
            let rotation = dict
                .get(b"Rotate")
                .ok()
                .and_then(|obj| obj.as_i64().ok())
                .map(PageRotation::from_degrees)
                .unwrap_or_default();

            decoded.push(DecodedPage {
                width_pt,
                height_pt,
                rotation,
                background: self.background(width_pt, height_pt),
            });
        }

        if decoded.is_empty() {
            return Err(PdfEngineError::NoPages);
        }

        let metadata = read_metadata(&doc);
        log::info!("decoded {} page(s), title {:?}", decoded.len(), metadata.title);
        Ok(DecodedDocument { pages: decoded, metadata })
    }
}

fn media_box(dict: &Dictionary) -> Option<(f32, f32)> {
    let array = dict.get(b"MediaBox").ok()?.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let x0 = array[0].as_float().ok()?;
    let y0 = array[1].as_float().ok()?;
    let x1 = array[2].as_float().ok()?;
    let y1 = array[3].as_float().ok()?;
    Some(((x1 - x0).abs(), (y1 - y0).abs()))
}

fn read_metadata(doc: &Document) -> DocumentMetadata {
    let info = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).ok(),
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };
    let Some(info) = info else {
        return DocumentMetadata::default();
    };

    let text = |key: &[u8]| -> Option<String> {
        match info.get(key).ok()? {
            Object::String(bytes, _) => Some(decode_text(bytes)),
            _ => None,
        }
    };

    DocumentMetadata {
        title: text(b"Title"),
        author: text(b"Author"),
        subject: text(b"Subject"),
        keywords: text(b"Keywords"),
        creator: text(b"Creator"),
        producer: text(b"Producer"),
        created_at: text(b"CreationDate"),
        modified_at: text(b"ModDate"),
    }
}

/// Text strings are either UTF-16BE with a byte order mark or a single-byte
/// encoding; the latter is read as Latin-1.
fn decode_text(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> =
            utf16.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]])).collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&byte| byte as char).collect()
}
