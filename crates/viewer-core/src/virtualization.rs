use doc_model::{Boundary, Element, Rect};
use std::ops::RangeInclusive;

/// Indices of the items whose extent intersects the scrolled viewport,
/// padded by `overscan` items on each side and clamped to the list.
///
/// Returns `None` when there is nothing to show.
pub fn visible_range(
    count: usize,
    container_extent: f32,
    scroll_offset: f32,
    item_extent: f32,
    overscan: usize,
) -> Option<RangeInclusive<usize>> {
    if count == 0 || item_extent <= 0.0 || !item_extent.is_finite() {
        return None;
    }
    let last = count - 1;
    let scroll = scroll_offset.max(0.0);
    let first_visible = (scroll / item_extent).floor() as usize;
    let end_visible =
        (((scroll + container_extent.max(0.0)) / item_extent).ceil() as usize).saturating_sub(1);
    let end_visible = end_visible.max(first_visible);

    let start = first_visible.saturating_sub(overscan).min(last);
    let end = end_visible.saturating_add(overscan).min(last);
    Some(start..=end)
}

/// Elements whose bounds, scaled by `zoom_percent / 100`, intersect the
/// viewport. With [`Boundary::Inclusive`] an element that only touches the
/// viewport edge is kept.
pub fn cull<'a>(
    elements: &'a [Element],
    viewport: &Rect,
    zoom_percent: f32,
    boundary: Boundary,
) -> Vec<&'a Element> {
    let factor = zoom_percent / 100.0;
    elements
        .iter()
        .filter(|element| element.bounds().scaled(factor).intersects(viewport, boundary))
        .collect()
}

/// Neighbouring page indices to prefetch, nearest first, alternating below
/// and above the current page.
pub fn prefetch_page_indices(current_page_index: u32, page_count: u32, radius: u32) -> Vec<u32> {
    if page_count == 0 {
        return Vec::new();
    }

    let max = page_count.saturating_sub(1);
    let mut pages = Vec::new();

    for offset in 1..=radius {
        if let Some(lower) = current_page_index.checked_sub(offset) {
            if lower <= max {
                pages.push(lower);
            }
        }

        let upper = current_page_index.saturating_add(offset);
        if upper <= max {
            pages.push(upper);
        }
    }

    pages
}
