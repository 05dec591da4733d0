//! Background ingestion for paged documents: loads a document, extracts its
//! pages in paced batches, and serves searches over the resulting index.

pub mod config;
pub mod controller;
pub mod error;
pub mod scheduler;
pub mod source;
pub mod text;

pub use config::{IngestConfig, TuningArgs};
pub use controller::{
    Command, IngestSummary, JobController, JobKind, JobState, JobStatus, Outcome, SearchResponse,
};
pub use error::{ExtractError, JobError, LoadError};
pub use scheduler::{IngestRequest, LoadedPage, Progress};
pub use source::{DocumentLoader, DocumentSource, PageTextExtractor, PagedDocument};
pub use text::{TextDocument, TextDocumentLoader, TextPageExtractor};

/// Controller over plain-text paged documents, as used by the binaries.
pub type TextController = JobController<TextDocumentLoader, TextPageExtractor>;

impl TextController {
    pub fn for_text(config: IngestConfig) -> Self {
        JobController::new(TextDocumentLoader, TextPageExtractor, config)
    }
}
