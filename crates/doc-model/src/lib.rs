pub mod comment;
pub mod document;
pub mod element;
pub mod error;
pub mod geometry;
pub mod layer;

pub use comment::{Comment, CommentId, CommentThreads};
pub use document::{
    Document, DocumentId, DocumentMetadata, Page, PageBackground, PageId, PageRotation,
};
pub use element::{
    clamp_font_size, unix_now, AnnotationContent, AnnotationKind, Color, ContentClass, Element,
    ElementId, ElementKind, ElementPatch, ImageContent, ShapeContent, ShapeKind, StampKind,
    TextContent, MAX_FONT_SIZE, MAX_IMAGE_DIMENSION, MIN_ELEMENT_SIZE, MIN_FONT_SIZE,
};
pub use error::{ModelError, ModelResult};
pub use geometry::{rotate_around, Boundary, Point, Rect};
pub use layer::{Layer, LayerId, LayerSet};
