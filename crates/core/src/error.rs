use doc_model::ModelError;
use editor_export::ExportError;
use pdf_engine::PdfEngineError;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("failed to load document: {0}")]
    Load(#[from] PdfEngineError),
    #[error("failed to save document: {0}")]
    Save(String),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("load {ticket} was superseded by load {latest}")]
    StaleLoad { ticket: u64, latest: u64 },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("unsupported image: {0}")]
    Image(#[from] image::ImageError),
}

pub type EditorResult<T> = Result<T, EditorError>;
