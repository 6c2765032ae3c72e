use crate::scene::PageScene;
use doc_model::Element;

/// Plain text: a `--- Page N ---` marker, then the page's text elements from
/// top to bottom (left to right on ties).
pub(crate) fn document(pages: &[PageScene<'_>]) -> String {
    let mut out = String::new();
    for (index, scene) in pages.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&format!("--- Page {} ---\n", scene.page.number));

        let mut texts: Vec<&Element> = scene
            .items
            .iter()
            .map(|item| item.element)
            .filter(|element| element.as_text().is_some())
            .collect();
        texts.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

        for element in texts {
            if let Some(content) = element.as_text() {
                out.push_str(&content.text);
                out.push('\n');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{scene, ExportOptions, PageRange};
    use doc_model::{Document, ElementKind, Page, Rect, TextContent};

    fn text(page: u32, x: f32, y: f32, content: &str) -> Element {
        Element::new(page, Rect::new(x, y, 100.0, 20.0), ElementKind::Text(TextContent::new(content)))
    }

    #[test]
    fn pages_are_marked_and_sorted_top_down() {
        let pages = vec![Page::new(1, 612.0, 792.0), Page::new(2, 612.0, 792.0)];
        let mut document = Document::new("t.pdf", pages, Default::default());
        document.elements = vec![
            text(1, 10.0, 300.0, "bottom"),
            text(2, 10.0, 10.0, "second page"),
            text(1, 200.0, 50.0, "top right"),
            text(1, 10.0, 50.0, "top left"),
        ];
        let scenes = scene::build(&document, PageRange::all(), &ExportOptions::default())
            .expect("scene");

        let output = self::document(&scenes);

        assert_eq!(
            output,
            "--- Page 1 ---\ntop left\ntop right\nbottom\n\n--- Page 2 ---\nsecond page\n"
        );
    }

    #[test]
    fn range_limits_the_pages() {
        let pages = vec![Page::new(1, 612.0, 792.0), Page::new(2, 612.0, 792.0)];
        let mut document = Document::new("t.pdf", pages, Default::default());
        document.elements = vec![text(1, 0.0, 0.0, "one"), text(2, 0.0, 0.0, "two")];
        let scenes = scene::build(&document, PageRange::single(2), &ExportOptions::default())
            .expect("scene");

        assert_eq!(self::document(&scenes), "--- Page 2 ---\ntwo\n");
    }
}
