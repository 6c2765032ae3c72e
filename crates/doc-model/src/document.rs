use crate::comment::CommentThreads;
use crate::element::{Element, ElementId};
use crate::error::{ModelError, ModelResult};
use crate::layer::LayerSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageRotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl PageRotation {
    /// Normalizes any multiple of 90 degrees; other angles round down to the
    /// previous quarter turn.
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) / 90 {
            1 => PageRotation::Clockwise90,
            2 => PageRotation::Clockwise180,
            3 => PageRotation::Clockwise270,
            _ => PageRotation::None,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            PageRotation::None => 0,
            PageRotation::Clockwise90 => 90,
            PageRotation::Clockwise180 => 180,
            PageRotation::Clockwise270 => 270,
        }
    }
}

/// Rasterized page content handed over by the page decoder. The editor never
/// looks inside it; exporters composite it under the elements.
#[derive(Debug, Clone, PartialEq)]
pub struct PageBackground {
    pub width_px: u32,
    pub height_px: u32,
    /// Straight (non-premultiplied) RGBA8, row-major
    pub rgba: Arc<[u8]>,
}

impl PageBackground {
    pub fn solid(width_px: u32, height_px: u32, rgba: [u8; 4]) -> Self {
        let pixels = width_px as usize * height_px as usize;
        let data: Vec<u8> = rgba.iter().copied().cycle().take(pixels * 4).collect();
        Self { width_px, height_px, rgba: Arc::from(data) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    /// 1-based, equal to the page's position in the document plus one
    pub number: u32,
    pub width: f32,
    pub height: f32,
    pub rotation: PageRotation,
    #[serde(skip)]
    pub background: Option<PageBackground>,
}

impl Page {
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            id: PageId(number as u64),
            number,
            width,
            height,
            rotation: PageRotation::None,
            background: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub created_at: Option<String>,
    pub modified_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub file_name: String,
    pages: Vec<Page>,
    pub metadata: DocumentMetadata,
    /// Insertion order
    pub elements: Vec<Element>,
    pub layers: LayerSet,
    pub comments: CommentThreads,
}

impl Document {
    /// Build a document from decoded pages. Page numbers are reassigned to
    /// stay dense.
    pub fn new(file_name: impl Into<String>, pages: Vec<Page>, metadata: DocumentMetadata) -> Self {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(index, mut page)| {
                page.number = index as u32 + 1;
                page
            })
            .collect();

        Self {
            id: DocumentId::generate(),
            file_name: file_name.into(),
            pages,
            metadata,
            elements: Vec::new(),
            layers: LayerSet::new(),
            comments: CommentThreads::new(),
        }
    }

    /// A single empty page of the given size.
    pub fn blank(file_name: impl Into<String>, width: f32, height: f32) -> Self {
        Self::new(file_name, vec![Page::new(1, width, height)], DocumentMetadata::default())
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn page(&self, number: u32) -> Option<&Page> {
        let index = number.checked_sub(1)?;
        self.pages.get(index as usize)
    }

    pub fn ensure_page(&self, number: u32) -> ModelResult<&Page> {
        self.page(number)
            .ok_or(ModelError::PageNotFound { page: number, page_count: self.page_count() })
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|element| &element.id == id)
    }

    pub fn element_ids(&self) -> Vec<ElementId> {
        self.elements.iter().map(|element| element.id.clone()).collect()
    }

    /// Debug snapshot. Page backgrounds are not included.
    pub fn to_json(&self) -> ModelResult<String> {
        serde_json::to_string_pretty(self).map_err(|err| ModelError::Snapshot(err.to_string()))
    }

    pub fn from_json(json: &str) -> ModelResult<Self> {
        serde_json::from_str(json).map_err(|err| ModelError::Snapshot(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementKind, TextContent};
    use crate::geometry::Rect;

    #[test]
    fn blank_document_has_one_letter_page() {
        let doc = Document::blank("untitled.pdf", 612.0, 792.0);
        assert_eq!(doc.page_count(), 1);
        let page = doc.page(1).expect("page 1 expected");
        assert_eq!((page.width, page.height), (612.0, 792.0));
        assert!(doc.page(0).is_none());
        assert!(doc.page(2).is_none());
    }

    #[test]
    fn page_numbers_are_made_dense() {
        let doc = Document::new(
            "scan.pdf",
            vec![Page::new(7, 100.0, 100.0), Page::new(3, 200.0, 100.0)],
            DocumentMetadata::default(),
        );
        let numbers: Vec<u32> = doc.pages().iter().map(|page| page.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn rotation_is_normalized_to_quarter_turns() {
        assert_eq!(PageRotation::from_degrees(-90), PageRotation::Clockwise270);
        assert_eq!(PageRotation::from_degrees(450), PageRotation::Clockwise90);
        assert_eq!(PageRotation::Clockwise180.degrees(), 180);
    }

    #[test]
    fn missing_page_reports_page_count() {
        let doc = Document::blank("a.pdf", 10.0, 10.0);
        assert_eq!(
            doc.ensure_page(3).map(|page| page.number),
            Err(ModelError::PageNotFound { page: 3, page_count: 1 })
        );
    }

    #[test]
    fn json_snapshot_round_trips_elements() {
        let mut doc = Document::blank("a.pdf", 612.0, 792.0);
        doc.elements.push(Element::new(
            1,
            Rect::new(100.0, 100.0, 200.0, 30.0),
            ElementKind::Text(TextContent::new("Hello")),
        ));

        let json = doc.to_json().expect("serialize");
        let restored = Document::from_json(&json).expect("deserialize");

        assert_eq!(restored.elements, doc.elements);
        assert_eq!(restored.page_count(), 1);
    }

    #[test]
    fn solid_background_fills_every_pixel() {
        let background = PageBackground::solid(2, 3, [255, 255, 255, 255]);
        assert_eq!(background.rgba.len(), 2 * 3 * 4);
        assert!(background.rgba.iter().all(|byte| *byte == 255));
    }
}
