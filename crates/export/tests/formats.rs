use doc_model::{
    AnnotationContent, AnnotationKind, Color, ContentClass, Document, DocumentMetadata, Element,
    ElementKind, Page, Point, Rect, ShapeContent, ShapeKind, TextContent,
};
use editor_export::{export, ExportError, ExportFormat, ExportOptions, PageRange};
use pdf_engine::PageDecoder;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn add(document: &mut Document, element: Element) {
    document.layers.assign_default(element.id.clone());
    document.elements.push(element);
}

fn sample() -> Document {
    let pages = vec![Page::new(1, 200.0, 100.0), Page::new(2, 200.0, 100.0)];
    let mut document = Document::new("sample.pdf", pages, DocumentMetadata::default());

    add(
        &mut document,
        Element::new(1, Rect::new(10.0, 10.0, 120.0, 20.0), ElementKind::Text(TextContent::new("first page"))),
    );
    let mut square = ShapeContent::new(ShapeKind::Rectangle);
    square.fill = Some(Color::BLUE);
    add(&mut document, Element::new(1, Rect::new(150.0, 50.0, 30.0, 30.0), ElementKind::Shape(square)));

    let mut ink = AnnotationContent::new(AnnotationKind::Freehand, "tester");
    ink.points = Some(vec![Point::new(0.0, 0.0), Point::new(10.0, 5.0), Point::new(20.0, 0.0)]);
    add(&mut document, Element::new(2, Rect::new(20.0, 20.0, 20.0, 5.0), ElementKind::Annotation(ink)));
    add(
        &mut document,
        Element::new(2, Rect::new(10.0, 60.0, 120.0, 20.0), ElementKind::Text(TextContent::new("second page"))),
    );
    document
}

fn text_export(document: &Document, options: &ExportOptions) -> String {
    let bytes = export(document, ExportFormat::Text, PageRange::all(), options).expect("text export");
    String::from_utf8(bytes).expect("utf-8")
}

#[test]
fn every_format_exports_the_sample() {
    init_logging();
    let document = sample();
    let options = ExportOptions::default();

    for format in [
        ExportFormat::Pdf,
        ExportFormat::Png,
        ExportFormat::Jpeg,
        ExportFormat::Svg,
        ExportFormat::Html,
        ExportFormat::Text,
    ] {
        let bytes = export(&document, format, PageRange::all(), &options)
            .unwrap_or_else(|err| panic!("{format:?} export failed: {err}"));
        assert!(!bytes.is_empty(), "{format:?} produced nothing");
    }
}

#[test]
fn png_is_page_size_at_the_requested_dpi() {
    init_logging();
    let options = ExportOptions::default().with_dpi(144.0);

    let bytes = export(&sample(), ExportFormat::Png, PageRange::single(2), &options).expect("png");
    let image = image::load_from_memory(&bytes).expect("decodable png");

    assert_eq!((image.width(), image.height()), (400, 200));
}

#[test]
fn pdf_output_keeps_the_page_count() {
    init_logging();
    let bytes = export(&sample(), ExportFormat::Pdf, PageRange::all(), &ExportOptions::default())
        .expect("pdf");

    let decoded = pdf_engine::default_decoder().decode(&bytes).expect("decodable pdf");
    assert_eq!(decoded.page_count(), 2);
}

#[test]
fn text_export_honours_range_and_content_flags() {
    init_logging();
    let document = sample();

    let all = text_export(&document, &ExportOptions::default());
    assert!(all.contains("--- Page 1 ---\nfirst page\n"));
    assert!(all.contains("--- Page 2 ---\nsecond page\n"));

    let without_text = ExportOptions::default().with_content(ContentClass::Text, false);
    assert!(!text_export(&document, &without_text).contains("first page"));

    let second = export(&document, ExportFormat::Text, PageRange::new(2, 40), &ExportOptions::default())
        .expect("clamped range");
    let second = String::from_utf8(second).expect("utf-8");
    assert!(!second.contains("--- Page 1 ---"));
    assert!(second.contains("second page"));
}

#[test]
fn hidden_layers_are_left_out() {
    init_logging();
    let mut document = sample();
    let hidden = document.layers.add("hidden");
    let first = document.elements[0].id.clone();
    document.layers.assign(first, hidden).expect("assign to layer");
    document.layers.set_visible(hidden, false).expect("hide layer");

    let text = text_export(&document, &ExportOptions::default());

    assert!(!text.contains("first page"));
    assert!(text.contains("second page"));
}

#[test]
fn range_past_the_end_is_an_error() {
    init_logging();
    let result = export(&sample(), ExportFormat::Svg, PageRange::new(3, 5), &ExportOptions::default());

    assert!(matches!(result, Err(ExportError::EmptyRange { from: 3, to: 5, page_count: 2 })));
}
