use crate::{AnnotationSubtype, EncodePage, NativeAnnotation, PageEncoder, PdfEngineError};
use doc_model::{Color, DocumentMetadata, Point};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

const PDF_VERSION: &str = "1.7";
const DEFAULT_PRODUCER: &str = "ButterPaper";

/// lopdf-backed encoder writing one page per [`EncodePage`] with its
/// annotations attached natively.
#[derive(Debug, Clone, Default)]
pub struct LopdfEncoder {
    compress: bool,
}

impl LopdfEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

impl PageEncoder for LopdfEncoder {
    fn encode(
        &self,
        pages: &[EncodePage],
        metadata: &DocumentMetadata,
    ) -> Result<Vec<u8>, PdfEngineError> {
        if pages.is_empty() {
            return Err(PdfEngineError::NoPages);
        }

        let mut doc = Document::with_version(PDF_VERSION);
        let pages_id = doc.new_object_id();

        let mut kids = Vec::with_capacity(pages.len());
        let mut annotation_count = 0;
        for page in pages {
            let annots: Vec<Object> = page
                .annotations
                .iter()
                .map(|annotation| {
                    Object::Reference(doc.add_object(annotation_dict(annotation, page.height_pt)))
                })
                .collect();
            annotation_count += annots.len();

            let mut page_dict = Dictionary::new();
            page_dict.set("Type", name("Page"));
            page_dict.set("Parent", Object::Reference(pages_id));
            page_dict.set(
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(page.width_pt),
                    Object::Real(page.height_pt),
                ]),
            );
            if page.rotation.degrees() != 0 {
                page_dict.set("Rotate", Object::Integer(page.rotation.degrees() as i64));
            }
            if !annots.is_empty() {
                page_dict.set("Annots", Object::Array(annots));
            }
            kids.push(Object::Reference(doc.add_object(page_dict)));
        }

        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", name("Pages"));
        pages_dict.set("Count", Object::Integer(kids.len() as i64));
        pages_dict.set("Kids", Object::Array(kids));
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let mut catalog = Dictionary::new();
        catalog.set("Type", name("Catalog"));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let info_id = info_dict(&mut doc, metadata);
        doc.trailer.set("Info", Object::Reference(info_id));

        if self.compress {
            doc.compress();
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        log::info!(
            "encoded {} page(s) with {annotation_count} annotation(s), {} bytes",
            pages.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

fn info_dict(doc: &mut Document, metadata: &DocumentMetadata) -> ObjectId {
    let mut info = Dictionary::new();
    let fields = [
        ("Title", &metadata.title),
        ("Author", &metadata.author),
        ("Subject", &metadata.subject),
        ("Keywords", &metadata.keywords),
        ("Creator", &metadata.creator),
        ("CreationDate", &metadata.created_at),
        ("ModDate", &metadata.modified_at),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            info.set(key, text(value));
        }
    }
    let producer = metadata.producer.as_deref().unwrap_or(DEFAULT_PRODUCER);
    info.set("Producer", text(producer));
    doc.add_object(info)
}

fn annotation_dict(annotation: &NativeAnnotation, page_height: f32) -> Dictionary {
    let rect = annotation.rect;
    let x0 = rect.x;
    let x1 = rect.right();
    // Bottom-up target space
    let y_top = page_height - rect.y;
    let y_bottom = page_height - rect.bottom();

    let mut dict = Dictionary::new();
    dict.set("Type", name("Annot"));
    dict.set("Subtype", name(annotation.subtype.name()));
    dict.set("Rect", reals(&[x0, y_bottom, x1, y_top]));
    dict.set("F", Object::Integer(4));

    if let Some(color) = annotation.color {
        dict.set("C", color_array(color));
    }
    if let Some(interior) = annotation.interior {
        dict.set("IC", color_array(interior));
    }
    if annotation.opacity < 1.0 {
        dict.set("CA", Object::Real(annotation.opacity.clamp(0.0, 1.0)));
    }
    if let Some(contents) = &annotation.contents {
        dict.set("Contents", text(contents));
    }
    if let Some(author) = &annotation.author {
        dict.set("T", text(author));
    }

    let mut border = Dictionary::new();
    border.set("W", Object::Real(annotation.border_width.max(0.0)));
    dict.set("BS", Object::Dictionary(border));

    match annotation.subtype {
        AnnotationSubtype::Highlight => {
            dict.set(
                "QuadPoints",
                reals(&[x0, y_top, x1, y_top, x0, y_bottom, x1, y_bottom]),
            );
        }
        AnnotationSubtype::Line => {
            let (start, end) =
                annotation.line.unwrap_or((Point::new(x0, rect.y), Point::new(x1, rect.bottom())));
            dict.set(
                "L",
                reals(&[start.x, page_height - start.y, end.x, page_height - end.y]),
            );
        }
        AnnotationSubtype::Ink => {
            let stroke: Vec<f32> = annotation
                .ink
                .iter()
                .flatten()
                .flat_map(|point| [point.x, page_height - point.y])
                .collect();
            dict.set("InkList", Object::Array(vec![reals(&stroke)]));
        }
        AnnotationSubtype::Stamp => {
            if let Some(label) = &annotation.stamp_name {
                dict.set("Name", name(&stamp_name(label)));
            }
        }
        AnnotationSubtype::FreeText => {
            let size = annotation.font_size.unwrap_or(12.0);
            let (r, g, b, _) = annotation.color.unwrap_or(Color::BLACK).to_normalized();
            let appearance = format!("/Helv {size} Tf {r:.3} {g:.3} {b:.3} rg");
            dict.set("DA", Object::String(appearance.into_bytes(), StringFormat::Literal));
            if annotation.rotation != 0.0 {
                dict.set("Rotate", Object::Integer(annotation.rotation.round() as i64));
            }
        }
        AnnotationSubtype::Square | AnnotationSubtype::Circle | AnnotationSubtype::Text => {}
    }

    dict
}

/// Standard stamp names are title case ("APPROVED" becomes `/Approved`);
/// anything else keeps its letters and digits only.
fn stamp_name(label: &str) -> String {
    let cleaned: String = label.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    let mut chars = cleaned.chars();
    match chars.next() {
        Some(first) => {
            first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
        }
        None => "Draft".to_owned(),
    }
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

fn reals(values: &[f32]) -> Object {
    Object::Array(values.iter().map(|value| Object::Real(*value)).collect())
}

fn color_array(color: Color) -> Object {
    let (r, g, b, _) = color.to_normalized();
    reals(&[r, g, b])
}

/// ASCII goes out as a literal string, anything else as UTF-16BE with a
/// byte order mark.
fn text(value: &str) -> Object {
    if value.is_ascii() {
        return Object::String(value.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::Rect;

    fn annotations_of(bytes: &[u8]) -> Vec<Dictionary> {
        let doc = Document::load_mem(bytes).expect("output should parse");
        let mut found = Vec::new();
        for (_, page_id) in doc.get_pages() {
            let page = doc.get_dictionary(page_id).expect("page dict");
            let Ok(annots) = page.get(b"Annots").and_then(Object::as_array) else {
                continue;
            };
            for annot in annots {
                let id = annot.as_reference().expect("annotation reference");
                found.push(doc.get_dictionary(id).expect("annotation dict").clone());
            }
        }
        found
    }

    fn subtype(dict: &Dictionary) -> String {
        let name = dict.get(b"Subtype").and_then(Object::as_name).expect("subtype");
        String::from_utf8_lossy(name).into_owned()
    }

    fn floats(dict: &Dictionary, key: &[u8]) -> Vec<f32> {
        dict.get(key)
            .and_then(Object::as_array)
            .expect("array")
            .iter()
            .map(|value| value.as_float().expect("number"))
            .collect()
    }

    #[test]
    fn empty_page_list_is_rejected() {
        let err = LopdfEncoder::new()
            .encode(&[], &DocumentMetadata::default())
            .expect_err("should fail");
        assert!(matches!(err, PdfEngineError::NoPages));
    }

    #[test]
    fn annotations_are_attached_per_page() {
        let mut first = EncodePage::new(612.0, 792.0);
        first.annotations.push(NativeAnnotation::new(
            AnnotationSubtype::Square,
            Rect::new(10.0, 10.0, 50.0, 50.0),
        ));
        first.annotations.push(NativeAnnotation::new(
            AnnotationSubtype::Circle,
            Rect::new(100.0, 100.0, 30.0, 30.0),
        ));
        let mut second = EncodePage::new(612.0, 792.0);
        second.annotations.push(NativeAnnotation::new(
            AnnotationSubtype::Text,
            Rect::new(20.0, 20.0, 24.0, 24.0),
        ));

        let bytes = LopdfEncoder::new()
            .encode(&[first, second], &DocumentMetadata::default())
            .expect("encode");

        let subtypes: Vec<String> = annotations_of(&bytes).iter().map(subtype).collect();
        assert_eq!(subtypes, vec!["Square", "Circle", "Text"]);
    }

    #[test]
    fn rect_is_flipped_to_bottom_up() {
        let mut page = EncodePage::new(612.0, 792.0);
        let mut highlight =
            NativeAnnotation::new(AnnotationSubtype::Highlight, Rect::new(100.0, 100.0, 200.0, 20.0));
        highlight.color = Some(Color::YELLOW);
        highlight.opacity = 0.4;
        page.annotations.push(highlight);

        let bytes =
            LopdfEncoder::new().encode(&[page], &DocumentMetadata::default()).expect("encode");
        let annots = annotations_of(&bytes);
        let dict = &annots[0];

        assert_eq!(floats(dict, b"Rect"), vec![100.0, 672.0, 300.0, 692.0]);
        assert_eq!(
            floats(dict, b"QuadPoints"),
            vec![100.0, 692.0, 300.0, 692.0, 100.0, 672.0, 300.0, 672.0]
        );
        let opacity = dict.get(b"CA").and_then(Object::as_float).expect("opacity");
        assert!((opacity - 0.4).abs() < 1e-6);
    }

    #[test]
    fn ink_and_line_geometry_are_written() {
        let mut page = EncodePage::new(100.0, 100.0);
        let mut ink = NativeAnnotation::new(AnnotationSubtype::Ink, Rect::new(0.0, 0.0, 10.0, 10.0));
        ink.ink = Some(vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)]);
        let mut line =
            NativeAnnotation::new(AnnotationSubtype::Line, Rect::new(0.0, 0.0, 50.0, 50.0));
        line.line = Some((Point::new(0.0, 50.0), Point::new(50.0, 0.0)));
        page.annotations.extend([ink, line]);

        let bytes =
            LopdfEncoder::new().encode(&[page], &DocumentMetadata::default()).expect("encode");
        let annots = annotations_of(&bytes);

        let strokes = annots[0].get(b"InkList").and_then(Object::as_array).expect("ink list");
        let stroke: Vec<f32> = strokes[0]
            .as_array()
            .expect("stroke")
            .iter()
            .map(|value| value.as_float().expect("number"))
            .collect();
        assert_eq!(stroke, vec![0.0, 100.0, 10.0, 90.0]);
        assert_eq!(floats(&annots[1], b"L"), vec![0.0, 50.0, 50.0, 100.0]);
    }

    #[test]
    fn stamp_names_are_title_case() {
        assert_eq!(stamp_name("APPROVED"), "Approved");
        assert_eq!(stamp_name("for review!"), "Forreview");
        assert_eq!(stamp_name("***"), "Draft");
    }

    #[test]
    fn non_ascii_text_is_utf16() {
        let Object::String(bytes, _) = text("Größe") else {
            panic!("expected a string object");
        };
        assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
        assert_eq!(bytes.len(), 2 + 5 * 2);
    }
}
