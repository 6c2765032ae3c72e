//! In-process element clipboard.
//!
//! Copied elements lose their ids; every paste hands out fresh ones. Data
//! older than the configured time-to-live is stale and is evicted lazily by
//! the next paste attempt.

use doc_model::{Element, ElementId, ElementKind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default time-to-live of clipboard contents
pub const CLIPBOARD_TTL: Duration = Duration::from_secs(5 * 60);

/// Extra offset per pasted element so multi-element pastes cascade
pub const PASTE_CASCADE_STEP: f32 = 5.0;

/// Error type for clipboard operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard is empty")]
    Empty,
    #[error("clipboard contents expired after {0:?}")]
    Stale(Duration),
}

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Time since the unix epoch
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// An element with its identity stripped
#[derive(Debug, Clone, PartialEq)]
pub struct CopiedElement {
    pub page: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub opacity: f32,
    pub kind: ElementKind,
}

impl CopiedElement {
    fn from_element(element: &Element) -> Self {
        Self {
            page: element.page,
            x: element.x,
            y: element.y,
            width: element.width,
            height: element.height,
            rotation: element.rotation,
            opacity: element.opacity,
            kind: element.kind.clone(),
        }
    }

    fn into_element(self, id: ElementId) -> Element {
        Element {
            id,
            page: self.page,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
            opacity: self.opacity,
            kind: self.kind,
        }
    }
}

#[derive(Debug, Clone)]
struct ClipboardData {
    elements: Vec<CopiedElement>,
    captured_at: Duration,
}

/// Element clipboard for one editor session
pub struct Clipboard {
    data: Option<ClipboardData>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { data: None, clock, ttl: CLIPBOARD_TTL }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Copy elements. An empty slice leaves the clipboard untouched.
    pub fn copy(&mut self, elements: &[&Element]) {
        if elements.is_empty() {
            return;
        }
        self.data = Some(ClipboardData {
            elements: elements.iter().map(|element| CopiedElement::from_element(element)).collect(),
            captured_at: self.clock.now(),
        });
        log::debug!("copied {} element(s)", elements.len());
    }

    /// Non-empty and not stale
    pub fn has_data(&self) -> bool {
        match &self.data {
            Some(data) => !data.elements.is_empty() && !self.is_stale(data),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.data = None;
    }

    /// Paste with fresh ids. Empty or stale clipboards yield nothing; stale
    /// data is cleared.
    pub fn paste(&mut self, target_page: Option<u32>, offset_x: f32, offset_y: f32) -> Vec<Element> {
        match self.try_paste(target_page, offset_x, offset_y) {
            Ok(elements) => elements,
            Err(err) => {
                log::debug!("paste produced nothing: {err}");
                Vec::new()
            }
        }
    }

    /// Like [`Clipboard::paste`], but reports why nothing was pasted.
    ///
    /// The i-th element is offset by `(offset_x + 5i, offset_y + 5i)` and
    /// moved to `target_page` when one is given.
    pub fn try_paste(
        &mut self,
        target_page: Option<u32>,
        offset_x: f32,
        offset_y: f32,
    ) -> Result<Vec<Element>, ClipboardError> {
        let data = self.data.as_ref().ok_or(ClipboardError::Empty)?;
        if data.elements.is_empty() {
            return Err(ClipboardError::Empty);
        }
        if self.is_stale(data) {
            self.data = None;
            return Err(ClipboardError::Stale(self.ttl));
        }

        let pasted = data
            .elements
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, mut copied)| {
                let cascade = index as f32 * PASTE_CASCADE_STEP;
                copied.x += offset_x + cascade;
                copied.y += offset_y + cascade;
                if let Some(page) = target_page {
                    copied.page = page;
                }
                copied.into_element(ElementId::generate())
            })
            .collect();
        Ok(pasted)
    }

    fn is_stale(&self, data: &ClipboardData) -> bool {
        self.clock.now().saturating_sub(data.captured_at) > self.ttl
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Clipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clipboard")
            .field("elements", &self.data.as_ref().map(|data| data.elements.len()))
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Rect, TextContent};
    use std::collections::HashSet;

    fn elements(count: usize) -> Vec<Element> {
        (0..count)
            .map(|i| {
                Element::new(
                    1,
                    Rect::new(10.0 * i as f32, 20.0, 50.0, 20.0),
                    ElementKind::Text(TextContent::new(format!("item {i}"))),
                )
            })
            .collect()
    }

    fn clipboard() -> (Clipboard, ManualClock) {
        let clock = ManualClock::new();
        (Clipboard::with_clock(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_round_trip_offsets_and_fresh_ids() {
        let (mut clipboard, _clock) = clipboard();
        let originals = elements(3);
        let refs: Vec<&Element> = originals.iter().collect();
        clipboard.copy(&refs);

        let pasted = clipboard.paste(None, 10.0, 10.0);

        assert_eq!(pasted.len(), 3);
        let original_ids: HashSet<&ElementId> = originals.iter().map(|e| &e.id).collect();
        let pasted_ids: HashSet<&ElementId> = pasted.iter().map(|e| &e.id).collect();
        assert_eq!(pasted_ids.len(), 3);
        assert!(pasted_ids.is_disjoint(&original_ids));

        for (i, (original, copy)) in originals.iter().zip(&pasted).enumerate() {
            let expected = 10.0 + 5.0 * i as f32;
            assert_eq!(copy.x, original.x + expected);
            assert_eq!(copy.y, original.y + expected);
            assert_eq!(copy.kind, original.kind);
        }
    }

    #[test]
    fn test_paste_reassigns_page() {
        let (mut clipboard, _clock) = clipboard();
        let originals = elements(1);
        clipboard.copy(&[&originals[0]]);

        let pasted = clipboard.paste(Some(3), 10.0, 10.0);
        assert_eq!(pasted[0].page, 3);
    }

    #[test]
    fn test_empty_copy_is_a_noop() {
        let (mut clipboard, _clock) = clipboard();
        let originals = elements(1);
        clipboard.copy(&[&originals[0]]);

        clipboard.copy(&[]);

        assert!(clipboard.has_data());
    }

    #[test]
    fn test_empty_clipboard() {
        let (mut clipboard, _clock) = clipboard();
        assert!(!clipboard.has_data());
        assert_eq!(clipboard.try_paste(None, 10.0, 10.0), Err(ClipboardError::Empty));
    }

    #[test]
    fn test_stale_after_five_minutes() {
        let (mut clipboard, clock) = clipboard();
        let originals = elements(2);
        clipboard.copy(&[&originals[0], &originals[1]]);

        clock.advance(Duration::from_secs(300));
        assert!(clipboard.has_data());

        clock.advance(Duration::from_secs(1));
        assert!(!clipboard.has_data());
        assert!(clipboard.paste(None, 10.0, 10.0).is_empty());
        assert_eq!(clipboard.try_paste(None, 10.0, 10.0), Err(ClipboardError::Empty));
    }

    #[test]
    fn test_repeated_pastes_get_new_ids() {
        let (mut clipboard, _clock) = clipboard();
        let originals = elements(1);
        clipboard.copy(&[&originals[0]]);

        let first = clipboard.paste(None, 10.0, 10.0);
        let second = clipboard.paste(None, 10.0, 10.0);

        assert_ne!(first[0].id, second[0].id);
    }
}
