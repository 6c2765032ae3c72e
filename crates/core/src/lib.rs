//! Editor core
//!
//! Document store with undo/redo, selection and direct manipulation, element
//! creation, clipboard, search, and the editor session that ties them to the
//! host application.

pub mod clipboard;
pub mod error;
pub mod factory;
pub mod history;
pub mod interaction;
pub mod manipulation;
pub mod search;
pub mod selection;
pub mod session;
pub mod store;

pub use clipboard::{Clipboard, ClipboardError, Clock, ManualClock, SystemClock};
pub use error::{EditorError, EditorResult};
pub use factory::{EditorConfig, ElementFactory};
pub use history::{History, HistoryConfig};
pub use interaction::{GestureOutcome, GestureState, InteractionController, PointerEvent};
pub use manipulation::{generate_handles, HandleType, ManipulationHandle};
pub use search::{search, SearchError, SearchMatch, SearchOptions, SearchResults};
pub use selection::{Selection, Tool};
pub use session::{
    Editor, HostShell, LoadTicket, MenuAction, Notice, NoticeKind, RenderGovernor,
};
pub use store::{DocumentStore, Snapshot};
