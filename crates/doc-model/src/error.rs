use crate::comment::CommentId;
use crate::element::ElementId;
use crate::layer::LayerId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("page {page} does not exist (page_count={page_count})")]
    PageNotFound { page: u32, page_count: u32 },
    #[error("element {0} already exists")]
    DuplicateElement(ElementId),
    #[error("element {0} not found")]
    ElementNotFound(ElementId),
    #[error("the last remaining layer cannot be removed")]
    LastLayer,
    #[error("layer {0} not found")]
    LayerNotFound(LayerId),
    #[error("layer {0} is locked")]
    LayerLocked(LayerId),
    #[error("comment {0} not found")]
    CommentNotFound(CommentId),
    #[error("reply parent {0} not found")]
    ParentNotFound(CommentId),
    #[error("comment {0} is a reply and cannot be replied to")]
    NotATopLevelComment(CommentId),
    #[error("document snapshot error: {0}")]
    Snapshot(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
