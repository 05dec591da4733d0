use std::time::Duration;

pub const DEFAULT_BATCH_SIZE: u32 = 5;
pub const MAX_PAGES_PER_BATCH: u32 = 2;
pub const BATCH_DELAY: Duration = Duration::from_millis(10);
pub const INGEST_LOAD_TIMEOUT: Duration = Duration::from_secs(30);
pub const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(15);
pub const PROGRESS_CAPACITY: usize = 256;

/// Pacing and timeout knobs for ingestion jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Pages processed by an Ingest that does not name its own batch size.
    pub default_batch_size: u32,
    /// Pages handled between two yields.
    pub max_pages_per_batch: u32,
    pub batch_delay: Duration,
    pub ingest_load_timeout: Duration,
    pub page_load_timeout: Duration,
    /// Buffered progress notifications per subscriber.
    pub progress_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            default_batch_size: DEFAULT_BATCH_SIZE,
            max_pages_per_batch: MAX_PAGES_PER_BATCH,
            batch_delay: BATCH_DELAY,
            ingest_load_timeout: INGEST_LOAD_TIMEOUT,
            page_load_timeout: PAGE_LOAD_TIMEOUT,
            progress_capacity: PROGRESS_CAPACITY,
        }
    }
}

/// Command-line overrides for [`IngestConfig`], shared by the binaries.
#[derive(clap::Args, Debug, Clone)]
pub struct TuningArgs {
    /// Pages per Ingest when the request does not set a batch size
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub default_batch_size: u32,
    /// Pages processed between cooperative yields
    #[arg(long, default_value_t = MAX_PAGES_PER_BATCH)]
    pub max_pages_per_batch: u32,
    /// Pause between sub-batches, in milliseconds
    #[arg(long, default_value_t = BATCH_DELAY.as_millis() as u64)]
    pub batch_delay_ms: u64,
    /// Document load timeout for Ingest, in seconds
    #[arg(long, default_value_t = INGEST_LOAD_TIMEOUT.as_secs())]
    pub ingest_timeout_secs: u64,
    /// Document load timeout for page loads, in seconds
    #[arg(long, default_value_t = PAGE_LOAD_TIMEOUT.as_secs())]
    pub page_load_timeout_secs: u64,
}

impl From<TuningArgs> for IngestConfig {
    fn from(args: TuningArgs) -> Self {
        Self {
            default_batch_size: args.default_batch_size,
            max_pages_per_batch: args.max_pages_per_batch.max(1),
            batch_delay: Duration::from_millis(args.batch_delay_ms),
            ingest_load_timeout: Duration::from_secs(args.ingest_timeout_secs),
            page_load_timeout: Duration::from_secs(args.page_load_timeout_secs),
            ..Self::default()
        }
    }
}
