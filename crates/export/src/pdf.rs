//! Binary output is delegated to a [`PageEncoder`]; elements travel as
//! native annotations. Image elements have no annotation counterpart and
//! are left out.

use crate::scene::{self, Mark, PageScene, HIGHLIGHTER_WIDTH};
use crate::ExportResult;
use doc_model::{AnnotationKind, Document, Element, ElementKind, ShapeKind};
use pdf_engine::{AnnotationSubtype, EncodePage, NativeAnnotation, PageEncoder};

pub(crate) fn encode(
    document: &Document,
    pages: &[PageScene<'_>],
    encoder: &dyn PageEncoder,
) -> ExportResult<Vec<u8>> {
    let mut skipped = 0;
    let encode_pages: Vec<EncodePage> = pages
        .iter()
        .map(|scene| {
            let mut page = EncodePage::new(scene.page.width, scene.page.height);
            page.rotation = scene.page.rotation;
            for item in &scene.items {
                match native_annotation(item.element) {
                    Some(annotation) => page.annotations.push(annotation),
                    None => skipped += 1,
                }
            }
            page
        })
        .collect();

    if skipped > 0 {
        log::warn!("{skipped} image element(s) are not embedded in PDF output");
    }
    Ok(encoder.encode(&encode_pages, &document.metadata)?)
}

/// Native annotation for an element, or `None` for images.
pub fn native_annotation(element: &Element) -> Option<NativeAnnotation> {
    let bounds = element.bounds();
    let mut annotation = match &element.kind {
        ElementKind::Image(_) => return None,
        ElementKind::Text(text) => {
            let mut annotation = NativeAnnotation::new(AnnotationSubtype::FreeText, bounds);
            annotation.contents = Some(text.text.clone());
            annotation.font_size = Some(text.font_size);
            annotation.color = Some(text.color);
            annotation.border_width = 0.0;
            annotation
        }
        ElementKind::Shape(shape) => {
            let subtype = match shape.kind {
                ShapeKind::Rectangle => AnnotationSubtype::Square,
                ShapeKind::Circle => AnnotationSubtype::Circle,
                ShapeKind::Line | ShapeKind::Arrow => AnnotationSubtype::Line,
            };
            let mut annotation = NativeAnnotation::new(subtype, bounds);
            annotation.color = Some(shape.stroke);
            annotation.interior = shape.fill;
            annotation.border_width = shape.stroke_width;
            annotation.line = line_of(element);
            annotation
        }
        ElementKind::Annotation(content) => {
            let subtype = match content.kind {
                AnnotationKind::Highlight if content.points.is_some() => AnnotationSubtype::Ink,
                AnnotationKind::Highlight => AnnotationSubtype::Highlight,
                AnnotationKind::Note => AnnotationSubtype::Text,
                AnnotationKind::Stamp => AnnotationSubtype::Stamp,
                AnnotationKind::Freehand => AnnotationSubtype::Ink,
                AnnotationKind::Callout => AnnotationSubtype::FreeText,
                AnnotationKind::Arrow => AnnotationSubtype::Line,
            };
            let mut annotation = NativeAnnotation::new(subtype, bounds);
            annotation.color = Some(content.color);
            annotation.author = Some(content.author.clone());
            if !content.text.is_empty() {
                annotation.contents = Some(content.text.clone());
            }
            match subtype {
                AnnotationSubtype::Ink => {
                    annotation.ink = content.stroke_in(bounds);
                    if content.kind == AnnotationKind::Highlight {
                        annotation.border_width = HIGHLIGHTER_WIDTH;
                    }
                }
                AnnotationSubtype::Line => annotation.line = line_of(element),
                AnnotationSubtype::Stamp => {
                    let label = content.stamp.as_ref().map(|stamp| stamp.label()).unwrap_or("DRAFT");
                    annotation.stamp_name = Some(label.to_owned());
                }
                _ => {}
            }
            annotation
        }
    };

    annotation.opacity = element.opacity;
    annotation.rotation = element.rotation;
    Some(annotation)
}

fn line_of(element: &Element) -> Option<(doc_model::Point, doc_model::Point)> {
    scene::marks(element).into_iter().find_map(|mark| match mark {
        Mark::Line { from, to, .. } => Some((from, to)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{export_with_encoder, ExportFormat, ExportOptions, PageRange};
    use doc_model::{
        AnnotationContent, DocumentMetadata, ImageContent, Point, Rect, ShapeContent, TextContent,
    };
    use pdf_engine::PdfEngineError;
    use std::cell::RefCell;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingEncoder {
        pages: RefCell<Vec<EncodePage>>,
    }

    impl PageEncoder for RecordingEncoder {
        fn encode(
            &self,
            pages: &[EncodePage],
            _metadata: &DocumentMetadata,
        ) -> Result<Vec<u8>, PdfEngineError> {
            *self.pages.borrow_mut() = pages.to_vec();
            Ok(b"%PDF-recorded".to_vec())
        }
    }

    #[test]
    fn elements_become_native_annotations() {
        let mut document = Document::blank("p.pdf", 612.0, 792.0);
        document.elements.push(Element::new(
            1,
            Rect::new(10.0, 10.0, 100.0, 20.0),
            ElementKind::Text(TextContent::new("Hello")),
        ));
        document.elements.push(Element::new(
            1,
            Rect::new(0.0, 0.0, 50.0, 50.0),
            ElementKind::Shape(ShapeContent::new(ShapeKind::Arrow)),
        ));
        document.elements.push(Element::new(
            1,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            ElementKind::Image(ImageContent {
                data: Arc::from(Vec::new()),
                mime_type: "image/png".to_owned(),
                intrinsic_width: 1,
                intrinsic_height: 1,
            }),
        ));
        let encoder = RecordingEncoder::default();

        let bytes = export_with_encoder(
            &document,
            ExportFormat::Pdf,
            PageRange::all(),
            &ExportOptions::default(),
            &encoder,
        )
        .expect("export");

        assert_eq!(bytes, b"%PDF-recorded");
        let pages = encoder.pages.borrow();
        let subtypes: Vec<AnnotationSubtype> =
            pages[0].annotations.iter().map(|annotation| annotation.subtype).collect();
        assert_eq!(subtypes, vec![AnnotationSubtype::FreeText, AnnotationSubtype::Line]);
        assert_eq!(pages[0].annotations[0].contents.as_deref(), Some("Hello"));
        assert_eq!(
            pages[0].annotations[1].line,
            Some((Point::new(0.0, 0.0), Point::new(50.0, 50.0)))
        );
    }

    #[test]
    fn freehand_carries_its_stroke() {
        let mut content = AnnotationContent::new(AnnotationKind::Freehand, "tester");
        content.points = Some(vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)]);
        let element =
            Element::new(1, Rect::new(100.0, 100.0, 20.0, 20.0), ElementKind::Annotation(content));

        let annotation = native_annotation(&element).expect("annotation");

        assert_eq!(annotation.subtype, AnnotationSubtype::Ink);
        assert_eq!(
            annotation.ink,
            Some(vec![Point::new(100.0, 100.0), Point::new(120.0, 120.0)])
        );
        assert_eq!(annotation.author.as_deref(), Some("tester"));
    }

    #[test]
    fn lopdf_output_parses_back() {
        let mut document = Document::blank("p.pdf", 612.0, 792.0);
        document.metadata.title = Some("Export".to_owned());
        document.elements.push(Element::new(
            1,
            Rect::new(10.0, 10.0, 100.0, 20.0),
            ElementKind::Text(TextContent::new("Hello")),
        ));

        let bytes = crate::export(&document, ExportFormat::Pdf, PageRange::all(), &ExportOptions::default())
            .expect("export");

        let decoded = pdf_engine::PageDecoder::decode(&pdf_engine::default_decoder(), &bytes)
            .expect("decode");
        assert_eq!(decoded.page_count(), 1);
        assert_eq!(decoded.metadata.title.as_deref(), Some("Export"));
    }
}
