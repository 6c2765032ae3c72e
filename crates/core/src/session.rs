//! Editor session
//!
//! [`Editor`] ties the store, the interaction controller, the clipboard and
//! the render governor together and talks to the host application through
//! [`HostShell`]. The core never touches the filesystem; the host hands it
//! bytes and receives bytes back.

use crate::clipboard::Clipboard;
use crate::error::{EditorError, EditorResult};
use crate::factory::{EditorConfig, ElementFactory};
use crate::interaction::{GestureOutcome, InteractionController, PointerEvent};
use crate::search::{search, SearchOptions, SearchResults};
use crate::selection::Tool;
use crate::store::DocumentStore;
use doc_model::{Document, Element, ElementId, Point, Rect};
use editor_export::{ExportFormat, ExportOptions, PageRange};
use pdf_engine::{PageDecoder, PageEncoder};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use viewer_core::{Governor, RenderKey, TickReport};

/// US Letter, in points
pub const NEW_DOCUMENT_SIZE: (f32, f32) = (612.0, 792.0);
pub const UNTITLED: &str = "Untitled.pdf";

/// Governor caching encoded page renders
pub type RenderGovernor = Governor<Arc<[u8]>>;

/// File dialogs and persistence, provided by the host application.
pub trait HostShell {
    /// Ask the user for a document. `None` means the dialog was cancelled.
    fn open_document(&mut self) -> Option<Vec<u8>>;

    /// Store `bytes`. `Ok(None)` means the dialog was cancelled.
    fn save_document(
        &mut self,
        bytes: &[u8],
        suggested_name: &str,
    ) -> Result<Option<PathBuf>, String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    New,
    Open,
    Save,
    SaveAs,
    Undo,
    Redo,
    Copy,
    Paste,
    Delete,
}

/// Proof that a load was started. Only the newest ticket can finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Load,
    Save,
    Export,
}

/// Dismissible message for the user about a failed operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

pub struct Editor {
    store: DocumentStore,
    interaction: InteractionController,
    clipboard: Clipboard,
    governor: RenderGovernor,
    decoder: Box<dyn PageDecoder>,
    encoder: Box<dyn PageEncoder>,
    export_options: ExportOptions,
    load_generation: u64,
    saved_path: Option<PathBuf>,
    notice: Option<Notice>,
}

impl Editor {
    /// Blank session with the lopdf decoder and encoder.
    pub fn new(config: EditorConfig, governor: RenderGovernor) -> Self {
        let (width, height) = NEW_DOCUMENT_SIZE;
        let store =
            DocumentStore::with_config(Document::blank(UNTITLED, width, height), config.history.clone());
        let clipboard = Clipboard::new().with_ttl(Duration::from_secs(config.clipboard_ttl_secs));

        Self {
            store,
            interaction: InteractionController::new(ElementFactory::new(config)),
            clipboard,
            governor,
            decoder: Box::new(pdf_engine::default_decoder()),
            encoder: Box::new(pdf_engine::default_encoder()),
            export_options: ExportOptions::default(),
            load_generation: 0,
            saved_path: None,
            notice: None,
        }
    }

    pub fn with_decoder(mut self, decoder: Box<dyn PageDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_encoder(mut self, encoder: Box<dyn PageEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_clipboard(mut self, clipboard: Clipboard) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Options used when saving and rendering pages
    pub fn with_export_options(mut self, options: ExportOptions) -> Self {
        self.export_options = options;
        self
    }

    pub fn document(&self) -> &Document {
        self.store.document()
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn governor(&self) -> &RenderGovernor {
        &self.governor
    }

    pub fn config(&self) -> &EditorConfig {
        self.interaction.factory().config()
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    /// Where the host last saved the document, if anywhere
    pub fn saved_path(&self) -> Option<&PathBuf> {
        self.saved_path.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Apply an arbitrary edit to the store. Cached renders are dropped
    /// afterwards.
    pub fn edit<R>(&mut self, edit: impl FnOnce(&mut DocumentStore) -> R) -> R {
        let result = edit(&mut self.store);
        self.interaction.selection_mut().retain_existing(&self.store);
        self.governor.clear_cache();
        result
    }

    pub fn handle_menu_action(
        &mut self,
        action: MenuAction,
        host: &mut dyn HostShell,
    ) -> EditorResult<()> {
        log::debug!("menu action {action:?}");
        match action {
            MenuAction::New => {
                self.new_document();
                Ok(())
            }
            MenuAction::Open => {
                let Some(bytes) = host.open_document() else {
                    log::debug!("open cancelled");
                    return Ok(());
                };
                let ticket = self.begin_load();
                self.finish_load(ticket, UNTITLED, &bytes)
            }
            MenuAction::Save | MenuAction::SaveAs => self.save(host),
            MenuAction::Undo => {
                self.undo();
                Ok(())
            }
            MenuAction::Redo => {
                self.redo();
                Ok(())
            }
            MenuAction::Copy => {
                self.copy_selection();
                Ok(())
            }
            MenuAction::Paste => self.paste(None).map(|_| ()),
            MenuAction::Delete => {
                self.delete_selection();
                Ok(())
            }
        }
    }

    /// Replace the document with a blank page. Loads still in flight are
    /// superseded.
    pub fn new_document(&mut self) {
        self.load_generation += 1;
        let (width, height) = NEW_DOCUMENT_SIZE;
        self.install(Document::blank(UNTITLED, width, height));
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        LoadTicket { generation: self.load_generation }
    }

    /// Decode `bytes` and make the result the current document.
    ///
    /// A ticket older than the latest [`Editor::begin_load`] is dropped with
    /// [`EditorError::StaleLoad`]. A decode failure leaves the current
    /// document in place and raises a notice.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        file_name: &str,
        bytes: &[u8],
    ) -> EditorResult<()> {
        if ticket.generation != self.load_generation {
            log::debug!(
                "dropping load {} in favour of load {}",
                ticket.generation,
                self.load_generation
            );
            return Err(EditorError::StaleLoad {
                ticket: ticket.generation,
                latest: self.load_generation,
            });
        }

        match self.decoder.decode(bytes) {
            Ok(decoded) => {
                self.install(decoded.into_document(file_name));
                Ok(())
            }
            Err(err) => {
                let err = EditorError::from(err);
                self.raise(NoticeKind::Load, &err);
                Err(err)
            }
        }
    }

    /// Encode the document and hand it to the host. The document stays dirty
    /// unless the host reports a saved path.
    pub fn save(&mut self, host: &mut dyn HostShell) -> EditorResult<()> {
        let options = self.export_options.clone();
        let bytes = self.export(ExportFormat::Pdf, PageRange::all(), &options)?;
        let suggested = self.document().file_name.clone();

        match host.save_document(&bytes, &suggested) {
            Ok(Some(path)) => {
                log::info!("saved {} byte(s) to {}", bytes.len(), path.display());
                self.store.mark_clean();
                self.saved_path = Some(path);
                Ok(())
            }
            Ok(None) => {
                log::debug!("save cancelled");
                Ok(())
            }
            Err(message) => {
                let err = EditorError::Save(message);
                self.raise(NoticeKind::Save, &err);
                Err(err)
            }
        }
    }

    /// Export a snapshot of the document. Failures raise a notice.
    pub fn export(
        &mut self,
        format: ExportFormat,
        range: PageRange,
        options: &ExportOptions,
    ) -> EditorResult<Vec<u8>> {
        let snapshot = self.store.snapshot();
        editor_export::export_with_encoder(&snapshot, format, range, options, self.encoder.as_ref())
            .map_err(|err| {
                let err = EditorError::from(err);
                self.raise(NoticeKind::Export, &err);
                err
            })
    }

    /// PNG of one page at `zoom_percent`, served from the render cache when
    /// possible.
    pub fn render_page(&mut self, page: u32, zoom_percent: u16) -> EditorResult<Arc<[u8]>> {
        let key = RenderKey::new(page.saturating_sub(1), zoom_percent);
        if let Some(render) = self.governor.cached(&key) {
            return Ok(render.clone());
        }

        let options = self.export_options.clone().with_dpi(72.0 * f32::from(zoom_percent) / 100.0);
        let png = editor_export::export(
            self.store.document(),
            ExportFormat::Png,
            PageRange::single(page),
            &options,
        )?;
        let png: Arc<[u8]> = Arc::from(png);
        self.governor.store(key, png.clone());
        Ok(png)
    }

    /// Elements on `page` that intersect `viewport` at `zoom_percent`
    pub fn visible_elements(&mut self, page: u32, viewport: &Rect, zoom_percent: f32) -> Vec<&Element> {
        self.governor
            .cull(self.store.elements(), viewport, zoom_percent)
            .into_iter()
            .filter(|element| element.page == page)
            .collect()
    }

    pub fn tick(&mut self, now: Instant) -> TickReport {
        self.governor.tick(now)
    }

    pub fn search(&self, query: &str, options: &SearchOptions) -> SearchResults {
        search(self.store.elements(), query, options)
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.interaction.set_tool(tool);
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.interaction.set_zoom(zoom);
    }

    pub fn select(&mut self, id: ElementId, additive: bool) {
        if self.store.contains(&id) {
            self.interaction.selection_mut().select(id, additive);
        }
    }

    pub fn pointer_down(&mut self, event: PointerEvent) -> GestureOutcome {
        let outcome = self.interaction.pointer_down(&mut self.store, event);
        self.after_gesture(&outcome);
        outcome
    }

    pub fn pointer_move(&mut self, event: PointerEvent) {
        self.interaction.pointer_move(event);
    }

    pub fn pointer_up(&mut self, event: PointerEvent) -> GestureOutcome {
        let outcome = self.interaction.pointer_up(&mut self.store, event);
        self.after_gesture(&outcome);
        outcome
    }

    /// Escape
    pub fn cancel_gesture(&mut self) -> bool {
        self.interaction.cancel()
    }

    /// Text element with the configured defaults at `at`
    pub fn add_text(&mut self, page: u32, at: Point, content: &str) -> EditorResult<ElementId> {
        let element = self.interaction.factory().text(page, at, content);
        Ok(self.edit(|store| store.add_element(element))?)
    }

    pub fn insert_image(&mut self, page: u32, at: Point, bytes: Vec<u8>) -> EditorResult<ElementId> {
        let element = self.interaction.factory().image(page, at, bytes)?;
        Ok(self.edit(|store| store.add_element(element))?)
    }

    pub fn undo(&mut self) -> bool {
        self.edit(DocumentStore::undo)
    }

    pub fn redo(&mut self) -> bool {
        self.edit(DocumentStore::redo)
    }

    pub fn copy_selection(&mut self) -> usize {
        let ids = self.interaction.selection().ids();
        let elements = self.store.elements_by_ids(&ids);
        self.clipboard.copy(&elements);
        elements.len()
    }

    pub fn clipboard_has_data(&self) -> bool {
        self.clipboard.has_data()
    }

    /// Paste the clipboard with the configured offset and select the result.
    pub fn paste(&mut self, target_page: Option<u32>) -> EditorResult<Vec<ElementId>> {
        let (offset_x, offset_y) = self.config().paste_offset;
        let pasted = self.clipboard.paste(target_page, offset_x, offset_y);
        if pasted.is_empty() {
            return Ok(Vec::new());
        }

        let ids = self.edit(|store| store.add_elements(pasted))?;
        self.interaction.selection_mut().select_all(ids.iter().cloned());
        Ok(ids)
    }

    pub fn delete_selection(&mut self) -> usize {
        let removed = self.interaction.delete_selection(&mut self.store);
        if removed > 0 {
            self.governor.clear_cache();
        }
        removed
    }

    fn install(&mut self, document: Document) {
        self.store.replace_document(document);
        self.interaction.selection_mut().clear();
        self.interaction.cancel();
        self.governor.clear_cache();
        self.saved_path = None;
        self.notice = None;
    }

    fn after_gesture(&mut self, outcome: &GestureOutcome) {
        if matches!(outcome, GestureOutcome::Updated(_) | GestureOutcome::Created(_)) {
            self.governor.clear_cache();
        }
    }

    fn raise(&mut self, kind: NoticeKind, err: &EditorError) {
        log::warn!("{kind:?} failed: {err}");
        self.notice = Some(Notice { kind, message: err.to_string() });
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("document", &self.store.document().file_name)
            .field("dirty", &self.store.is_dirty())
            .field("load_generation", &self.load_generation)
            .field("notice", &self.notice)
            .finish()
    }
}
