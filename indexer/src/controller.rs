//! Owns the current document's index and admits one ingestion job at a time.

use crate::config::IngestConfig;
use crate::error::{JobError, Result};
use crate::scheduler::{BatchScheduler, IngestRequest, LoadedPage, Progress};
use crate::source::{DocumentLoader, DocumentSource, PageTextExtractor};
use pagedex_core::{search, IndexStats, InvertedIndex, PageNumber, SearchResult};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Ingest,
    PageLoad,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            JobKind::Ingest => "ingest",
            JobKind::PageLoad => "page load",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy)]
struct Job {
    kind: JobKind,
    started_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub status: JobState,
    pub kind: Option<JobKind>,
    pub started_at: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Command {
    Ingest(IngestRequest),
    LoadPages { source: DocumentSource, page_numbers: Vec<PageNumber> },
    Search { query: String },
    Stats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub processed_pages: u32,
    pub total_pages: u32,
    pub stats: IndexStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Ingested(IngestSummary),
    Pages { pages: Vec<LoadedPage> },
    Search(SearchResponse),
    Stats { stats: IndexStats },
}

/// Marks the single job slot busy; frees it when dropped, on every exit path.
struct JobGuard<'a> {
    slot: &'a Mutex<Option<Job>>,
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        if let Some(job) = self.slot.lock().take() {
            info!(kind = %job.kind, "job slot released");
        }
    }
}

pub struct JobController<L, X> {
    loader: L,
    extractor: X,
    config: IngestConfig,
    job: Mutex<Option<Job>>,
    current: RwLock<Option<Arc<InvertedIndex>>>,
    progress: broadcast::Sender<Progress>,
}

impl<L, X> JobController<L, X>
where
    L: DocumentLoader,
    X: PageTextExtractor<L::Document>,
{
    pub fn new(loader: L, extractor: X, config: IngestConfig) -> Self {
        let (progress, _) = broadcast::channel(config.progress_capacity.max(1));
        Self {
            loader,
            extractor,
            config,
            job: Mutex::new(None),
            current: RwLock::new(None),
            progress,
        }
    }

    pub fn config(&self) -> &IngestConfig { &self.config }

    /// Receive progress notifications for jobs started after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Progress> {
        self.progress.subscribe()
    }

    pub fn job_status(&self) -> JobStatus {
        match *self.job.lock() {
            Some(job) => JobStatus {
                status: JobState::Running,
                kind: Some(job.kind),
                started_at: job.started_at.format(&Rfc3339).ok(),
            },
            None => JobStatus { status: JobState::Idle, kind: None, started_at: None },
        }
    }

    pub fn is_busy(&self) -> bool {
        self.job.lock().is_some()
    }

    pub async fn submit(&self, command: Command) -> Result<Outcome> {
        match command {
            Command::Ingest(request) => self.ingest(request).await.map(Outcome::Ingested),
            Command::LoadPages { source, page_numbers } => self
                .load_pages(source, page_numbers)
                .await
                .map(|pages| Outcome::Pages { pages }),
            Command::Search { query } => self.search(&query).map(Outcome::Search),
            Command::Stats => self.stats().map(|stats| Outcome::Stats { stats }),
        }
    }

    /// Build a fresh index over the requested pages and make it current.
    ///
    /// The previous index stays visible to searches until the new one is complete,
    /// and stays in place if the job fails.
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestSummary> {
        let _guard = self.admit(JobKind::Ingest)?;
        info!(source = %request.source, start_page = request.start_page, "ingest accepted");

        let scheduler = BatchScheduler::new(&self.loader, &self.extractor, &self.config);
        let progress = &self.progress;
        let run = scheduler
            .ingest(&request, |p| {
                // no subscribers is fine
                let _ = progress.send(p);
            })
            .await
            .inspect_err(|err| warn!(error = %err, "ingest failed"))?;

        let stats = run.index.stats();
        *self.current.write() = Some(Arc::new(run.index));
        info!(processed = run.processed_pages, total_pages = run.total_pages, "index installed");
        Ok(IngestSummary {
            processed_pages: run.processed_pages,
            total_pages: run.total_pages,
            stats,
        })
    }

    pub async fn load_pages(
        &self,
        source: DocumentSource,
        page_numbers: Vec<PageNumber>,
    ) -> Result<Vec<LoadedPage>> {
        let _guard = self.admit(JobKind::PageLoad)?;
        info!(%source, requested = page_numbers.len(), "page load accepted");

        let scheduler = BatchScheduler::new(&self.loader, &self.extractor, &self.config);
        let pages = scheduler
            .load_pages(&source, &page_numbers)
            .await
            .inspect_err(|err| warn!(error = %err, "page load failed"))?;
        Ok(pages)
    }

    pub fn search(&self, query: &str) -> Result<SearchResponse> {
        let index = self.current_index()?;
        let results = search(&index, query);
        tracing::debug!(query, hits = results.len(), "search");
        Ok(SearchResponse { query: query.to_string(), results })
    }

    pub fn stats(&self) -> Result<IndexStats> {
        Ok(self.current_index()?.stats())
    }

    /// Snapshot of the current index; later ingests do not affect it.
    pub fn current_index(&self) -> Result<Arc<InvertedIndex>> {
        self.current.read().clone().ok_or(JobError::NoIndex)
    }

    fn admit(&self, kind: JobKind) -> Result<JobGuard<'_>> {
        let mut slot = self.job.lock();
        if let Some(running) = *slot {
            warn!(requested = %kind, running = %running.kind, "rejecting concurrent job");
            return Err(JobError::ConcurrentJob(running.kind));
        }
        *slot = Some(Job { kind, started_at: OffsetDateTime::now_utc() });
        Ok(JobGuard { slot: &self.job })
    }
}
