use crate::controller::JobKind;
use pagedex_core::PageNumber;
use std::time::Duration;

/// The whole document could not be opened. Fatal for the job.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse document: {0}")]
    Parse(String),

    #[error("document load timed out after {0:?}")]
    Timeout(Duration),
}

/// A single page could not be extracted. The page is skipped.
#[derive(Debug, thiserror::Error)]
#[error("failed to extract page {page_number}: {reason}")]
pub struct ExtractError {
    pub page_number: PageNumber,
    pub reason: String,
}

impl ExtractError {
    pub fn new(page_number: PageNumber, reason: impl Into<String>) -> Self {
        Self { page_number, reason: reason.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("another job is already running ({0})")]
    ConcurrentJob(JobKind),

    #[error("no document has been indexed yet")]
    NoIndex,

    #[error(transparent)]
    Load(#[from] LoadError),
}

pub type Result<T, E = JobError> = std::result::Result<T, E>;
