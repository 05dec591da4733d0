//! Capabilities the engine consumes but does not implement: opening a raw
//! document and pulling the text of one page out of it.

use crate::error::{ExtractError, LoadError};
use async_trait::async_trait;
use pagedex_core::PageNumber;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the raw document blob comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    /// Read from the local filesystem.
    Path(PathBuf),
    /// Carried inline with the command.
    Inline(String),
}

impl std::fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentSource::Path(p) => write!(f, "{}", p.display()),
            DocumentSource::Inline(s) => write!(f, "<inline, {} bytes>", s.len()),
        }
    }
}

/// A parsed, page-addressable document. Lives for one job only.
pub trait PagedDocument: Send + Sync {
    fn total_pages(&self) -> u32;
}

#[async_trait]
pub trait DocumentLoader: Send + Sync {
    type Document: PagedDocument;

    async fn load(&self, source: &DocumentSource) -> Result<Self::Document, LoadError>;
}

#[async_trait]
pub trait PageTextExtractor<D: PagedDocument>: Send + Sync {
    /// Plain text of a 1-based page.
    async fn extract(&self, document: &D, page_number: PageNumber) -> Result<String, ExtractError>;
}
