//! Plain-text paged documents: UTF-8 text with pages separated by form feeds,
//! as written by most PDF-to-text converters.

use crate::error::{ExtractError, LoadError};
use crate::source::{DocumentLoader, DocumentSource, PageTextExtractor, PagedDocument};
use async_trait::async_trait;
use pagedex_core::PageNumber;

pub const PAGE_BREAK: char = '\x0c';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pages: Vec<String>,
}

impl TextDocument {
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self { pages: Vec::new() };
        }
        let body = text.strip_suffix(PAGE_BREAK).unwrap_or(text);
        Self { pages: body.split(PAGE_BREAK).map(str::to_string).collect() }
    }

    pub fn page(&self, page_number: PageNumber) -> Option<&str> {
        let idx = (page_number as usize).checked_sub(1)?;
        self.pages.get(idx).map(String::as_str)
    }
}

impl PagedDocument for TextDocument {
    fn total_pages(&self) -> u32 {
        self.pages.len() as u32
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextDocumentLoader;

#[async_trait]
impl DocumentLoader for TextDocumentLoader {
    type Document = TextDocument;

    async fn load(&self, source: &DocumentSource) -> Result<TextDocument, LoadError> {
        let text = match source {
            DocumentSource::Path(path) => {
                let bytes = tokio::fs::read(path).await?;
                String::from_utf8(bytes).map_err(|e| LoadError::Parse(e.to_string()))?
            }
            DocumentSource::Inline(text) => text.clone(),
        };
        let document = TextDocument::parse(&text);
        tracing::debug!(%source, total_pages = document.total_pages(), "document loaded");
        Ok(document)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextPageExtractor;

#[async_trait]
impl PageTextExtractor<TextDocument> for TextPageExtractor {
    async fn extract(
        &self,
        document: &TextDocument,
        page_number: PageNumber,
    ) -> Result<String, ExtractError> {
        document
            .page(page_number)
            .map(|p| p.trim().to_string())
            .ok_or_else(|| ExtractError::new(page_number, "page out of range"))
    }
}
