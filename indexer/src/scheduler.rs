//! Drives the loader and extractor over a page range in small sub-batches,
//! pausing between them so a long document never monopolizes the runtime.

use crate::config::IngestConfig;
use crate::error::LoadError;
use crate::source::{DocumentLoader, DocumentSource, PageTextExtractor, PagedDocument};
use pagedex_core::tokenizer::word_count;
use pagedex_core::{InvertedIndex, PageNumber};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub source: DocumentSource,
    #[serde(default = "default_start_page")]
    pub start_page: PageNumber,
    #[serde(default)]
    pub end_page: Option<PageNumber>,
    #[serde(default)]
    pub batch_size: Option<u32>,
}
fn default_start_page() -> PageNumber { 1 }

impl IngestRequest {
    pub fn new(source: DocumentSource) -> Self {
        Self { source, start_page: 1, end_page: None, batch_size: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub page_number: PageNumber,
    pub total_pages: u32,
    pub processed_count: u32,
    pub total_to_process: u32,
    pub percentage: u32,
}

impl Progress {
    fn new(
        page_number: PageNumber,
        total_pages: u32,
        processed_count: u32,
        total_to_process: u32,
    ) -> Self {
        let percentage = (processed_count as f64 / total_to_process as f64 * 100.0).round() as u32;
        Self { page_number, total_pages, processed_count, total_to_process, percentage }
    }
}

/// A finished Ingest: the freshly built index plus counters.
#[derive(Debug)]
pub struct IngestRun {
    pub index: InvertedIndex,
    pub processed_pages: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedPage {
    pub page_number: PageNumber,
    pub content: String,
    pub word_count: usize,
}

pub struct BatchScheduler<'a, L, X> {
    loader: &'a L,
    extractor: &'a X,
    config: &'a IngestConfig,
}

impl<'a, L, X> BatchScheduler<'a, L, X>
where
    L: DocumentLoader,
    X: PageTextExtractor<L::Document>,
{
    pub fn new(loader: &'a L, extractor: &'a X, config: &'a IngestConfig) -> Self {
        Self { loader, extractor, config }
    }

    /// Index at most `batch_size` pages starting at `start_page` into a new index.
    ///
    /// Pages that fail to extract are skipped; only a document load failure
    /// aborts the run.
    pub async fn ingest<F>(
        &self,
        request: &IngestRequest,
        mut on_progress: F,
    ) -> Result<IngestRun, LoadError>
    where
        F: FnMut(Progress) + Send,
    {
        let document = self.load(&request.source, self.config.ingest_load_timeout).await?;
        let total_pages = document.total_pages();

        let start = request.start_page.max(1);
        let batch_size = request.batch_size.unwrap_or(self.config.default_batch_size);
        let effective_end = request.end_page.unwrap_or(total_pages).min(total_pages);
        let span = i64::from(effective_end) - i64::from(start) + 1;
        let to_process = span.min(i64::from(batch_size)).max(0) as u32;

        let mut index = InvertedIndex::new();
        if to_process == 0 {
            info!(start, effective_end, total_pages, "nothing to ingest");
            return Ok(IngestRun { index, processed_pages: 0, total_pages });
        }

        let pages: Vec<PageNumber> = (start..=start + (to_process - 1)).collect();
        info!(start, to_process, total_pages, "ingesting pages");

        let mut processed = 0u32;
        for batch in pages.chunks(self.sub_batch_size(batch_size)) {
            debug!(first = batch[0], len = batch.len(), "processing batch");
            for &page_number in batch {
                let Some(text) = self.extract(&document, page_number).await else {
                    continue;
                };
                index.append(page_number, text);
                processed += 1;
                let progress = Progress::new(page_number, total_pages, processed, to_process);
                debug!(page_number, percentage = progress.percentage, "page processed");
                on_progress(progress);
            }
            self.pause().await;
        }

        info!(processed, to_process, terms = index.stats().indexed_terms, "ingest finished");
        Ok(IngestRun { index, processed_pages: processed, total_pages })
    }

    /// Fetch the raw text of specific pages without touching any index.
    ///
    /// Page numbers outside the document are dropped; the caller's order is kept.
    pub async fn load_pages(
        &self,
        source: &DocumentSource,
        page_numbers: &[PageNumber],
    ) -> Result<Vec<LoadedPage>, LoadError> {
        let document = self.load(source, self.config.page_load_timeout).await?;
        let total_pages = document.total_pages();
        let wanted: Vec<PageNumber> = page_numbers
            .iter()
            .copied()
            .filter(|n| (1..=total_pages).contains(n))
            .collect();
        if wanted.len() < page_numbers.len() {
            let requested = page_numbers.len();
            debug!(requested, kept = wanted.len(), total_pages, "dropped out-of-range pages");
        }

        let mut loaded = Vec::with_capacity(wanted.len());
        for batch in wanted.chunks(self.config.max_pages_per_batch.max(1) as usize) {
            for &page_number in batch {
                if let Some(content) = self.extract(&document, page_number).await {
                    let word_count = word_count(&content);
                    loaded.push(LoadedPage { page_number, content, word_count });
                }
            }
            self.pause().await;
        }
        Ok(loaded)
    }

    async fn load(
        &self,
        source: &DocumentSource,
        limit: Duration,
    ) -> Result<L::Document, LoadError> {
        match tokio::time::timeout(limit, self.loader.load(source)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%source, ?limit, "document load timed out");
                Err(LoadError::Timeout(limit))
            }
        }
    }

    async fn extract(&self, document: &L::Document, page_number: PageNumber) -> Option<String> {
        match self.extractor.extract(document, page_number).await {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(page_number, error = %err, "skipping page");
                None
            }
        }
    }

    fn sub_batch_size(&self, batch_size: u32) -> usize {
        self.config.max_pages_per_batch.min(batch_size).max(1) as usize
    }

    async fn pause(&self) {
        if self.config.batch_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.config.batch_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(Progress::new(1, 9, 1, 3).percentage, 33);
        assert_eq!(Progress::new(2, 9, 2, 3).percentage, 67);
        assert_eq!(Progress::new(3, 9, 3, 3).percentage, 100);
    }

    #[test]
    fn request_defaults_when_deserialized() {
        let req: IngestRequest = serde_json::from_str(r#"{"source":{"inline":"x"}}"#).unwrap();
        assert_eq!(req, IngestRequest::new(DocumentSource::Inline("x".into())));
    }
}
