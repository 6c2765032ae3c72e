//! HTML output: one absolutely positioned `div.page` per page, one
//! `div.element` per element.

use crate::scene::{Mark, PageScene, SceneItem};
use crate::svg::{background_href, escape, image_href, num, write_marks};
use crate::{ExportError, ExportOptions, ExportResult};
use doc_model::TextContent;
use std::fmt::{self, Write};

const STYLE: &str = "\
body { margin: 0; padding: 16px; background: #e5e5e5; }
.page { position: relative; margin: 0 auto 16px; overflow: hidden; box-shadow: 0 1px 4px rgba(0, 0, 0, 0.3); }
.page > .background { position: absolute; left: 0; top: 0; width: 100%; height: 100%; }
.element { position: absolute; transform-origin: center center; }
.element > img { display: block; width: 100%; height: 100%; }
.element > svg { position: absolute; left: 0; top: 0; overflow: visible; }
.element.text { white-space: pre-wrap; line-height: 1.2; }
";

pub(crate) fn document(
    title: &str,
    pages: &[PageScene<'_>],
    options: &ExportOptions,
) -> ExportResult<String> {
    let mut out = String::new();
    let format_error = |err: fmt::Error| ExportError::Encode(err.to_string());

    writeln!(out, "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">")
        .map_err(format_error)?;
    writeln!(out, "<title>{}</title>\n<style>\n{STYLE}</style>\n</head>\n<body>", escape(title))
        .map_err(format_error)?;

    for scene in pages {
        let page = scene.page;
        let fill = options.background.map(|color| color.to_hex()).unwrap_or_else(|| "transparent".to_owned());
        writeln!(
            out,
            r#"<div class="page" data-page="{}" style="width:{}px;height:{}px;background:{}">"#,
            page.number,
            num(page.width),
            num(page.height),
            fill
        )
        .map_err(format_error)?;
        if let Some(background) = scene.background {
            writeln!(out, r#"<img class="background" src="{}" alt="">"#, background_href(background)?)
                .map_err(format_error)?;
        }
        for item in &scene.items {
            write_element(&mut out, item).map_err(format_error)?;
        }
        writeln!(out, "</div>").map_err(format_error)?;
    }

    writeln!(out, "</body>\n</html>").map_err(format_error)?;
    Ok(out)
}

fn write_element(out: &mut String, item: &SceneItem<'_>) -> fmt::Result {
    let element = item.element;
    let mut style = format!(
        "left:{}px;top:{}px;width:{}px;height:{}px",
        num(element.x),
        num(element.y),
        num(element.width),
        num(element.height)
    );
    if item.rotation() != 0.0 {
        write!(style, ";transform:rotate({}deg)", num(item.rotation()))?;
    }
    if item.opacity() < 1.0 {
        write!(style, ";opacity:{}", num(item.opacity()))?;
    }

    match item.marks.as_slice() {
        [Mark::Text { content, .. }] => {
            writeln!(
                out,
                r#"<div class="element text" style="{style};{}">{}</div>"#,
                text_style(content),
                escape(&content.text)
            )
        }
        [Mark::Image { content, .. }] => writeln!(
            out,
            r#"<div class="element image" style="{style}"><img src="{}" alt=""></div>"#,
            image_href(content)
        ),
        marks => {
            // Vector marks keep page coordinates; the view box maps them
            // onto the element box.
            writeln!(
                out,
                r#"<div class="element {}" style="{style}"><svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="{} {} {w} {h}">"#,
                element.kind_name(),
                num(element.x),
                num(element.y),
                w = num(element.width),
                h = num(element.height)
            )?;
            write_marks(out, marks)?;
            writeln!(out, "</svg></div>")
        }
    }
}

fn text_style(content: &TextContent) -> String {
    let mut style = format!(
        "font-family:{};font-size:{}px;color:{}",
        escape(&content.font_family),
        num(content.font_size),
        content.color.to_hex()
    );
    if content.bold {
        style.push_str(";font-weight:bold");
    }
    if content.italic {
        style.push_str(";font-style:italic");
    }
    if content.underline {
        style.push_str(";text-decoration:underline");
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene;
    use crate::PageRange;
    use doc_model::{
        AnnotationContent, AnnotationKind, Document, Element, ElementKind, Page, PageBackground,
        Rect,
    };

    fn render(document: &Document, options: &ExportOptions) -> String {
        let scenes = scene::build(document, PageRange::all(), options).expect("scene");
        self::document(&document.file_name, &scenes, options).expect("html")
    }

    #[test]
    fn one_div_per_page() {
        let pages = vec![Page::new(1, 612.0, 792.0), Page::new(2, 612.0, 792.0)];
        let document = Document::new("two <pages>.pdf", pages, Default::default());

        let html = render(&document, &ExportOptions::default());

        assert_eq!(html.matches(r#"<div class="page""#).count(), 2);
        assert!(html.contains("<title>two &lt;pages&gt;.pdf</title>"));
        assert!(html.contains("width:612px;height:792px;background:#ffffff"));
    }

    #[test]
    fn text_element_is_positioned() {
        let mut document = Document::blank("t.pdf", 612.0, 792.0);
        let mut element = Element::new(
            1,
            Rect::new(100.0, 120.0, 200.0, 30.0),
            ElementKind::Text(TextContent::new("Hello")),
        );
        element.opacity = 0.5;
        document.elements.push(element);

        let html = render(&document, &ExportOptions::default());

        assert!(html.contains("left:100px;top:120px;width:200px;height:30px;opacity:0.5"));
        assert!(html.contains("font-size:16px"));
        assert!(html.contains(">Hello</div>"));
    }

    #[test]
    fn annotations_use_inline_svg() {
        let mut document = Document::blank("a.pdf", 612.0, 792.0);
        let mut note = AnnotationContent::new(AnnotationKind::Note, "tester");
        note.text = "check".to_owned();
        document.elements.push(Element::new(
            1,
            Rect::new(10.0, 10.0, 100.0, 50.0),
            ElementKind::Annotation(note),
        ));

        let html = render(&document, &ExportOptions::default());

        assert!(html.contains(r#"viewBox="10 10 100 50""#));
        assert!(html.contains(">check</text>"));
    }

    #[test]
    fn page_raster_is_embedded_when_wanted() {
        let mut page = Page::new(1, 20.0, 20.0);
        page.background = Some(PageBackground::solid(2, 2, [255, 255, 255, 255]));
        let document = Document::new("bg.pdf", vec![page], Default::default());

        let with = render(&document, &ExportOptions::default());
        let without = render(
            &document,
            &ExportOptions::default().with_page_background(false).with_transparent_background(),
        );

        assert!(with.contains(r#"<img class="background" src="data:image/png;base64,"#));
        assert!(!without.contains("class=\"background\""));
        assert!(without.contains("background:transparent"));
    }
}
