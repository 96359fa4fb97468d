use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span};
use url::Url;

use crate::cagr::errors::PipelineError;
use crate::cagr::models::{Campus, Page, Semester};
use crate::cagr::parse::{RowPolicy, parse_page};
use crate::cagr::session::{FetchOptions, PageFetcher};
use crate::cagr::transport::Transport;
use crate::data::offerings::Partition;

/// Settings shared by every pipeline of a run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub endpoint: Url,
    pub fetch: FetchOptions,
    pub row_policy: RowPolicy,
    /// Pages the fetcher may run ahead of the parser.
    pub queue_capacity: usize,
    /// Cancel every other pipeline as soon as this one fails.
    pub fail_fast: bool,
}

/// The (semester, campus) partition a pipeline owns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineKey {
    pub semester: Semester,
    pub campus: Campus,
}

impl fmt::Display for PipelineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.campus, self.semester)
    }
}

/// Everything a finished pipeline hands back, including partial data on failure.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub key: PipelineKey,
    pub partition: Partition,
    pub pages: u32,
    pub rows: usize,
    pub duration: Duration,
    pub result: Result<(), PipelineError>,
}

impl PipelineOutcome {
    pub(crate) fn failed(key: PipelineKey, error: PipelineError) -> Self {
        Self {
            key,
            partition: Partition::new(),
            pages: 0,
            rows: 0,
            duration: Duration::ZERO,
            result: Err(error),
        }
    }
}

struct ParseSummary {
    partition: Partition,
    pages: u32,
    rows: usize,
    result: Result<(), PipelineError>,
}

/// Crawl one (semester, campus) partition.
///
/// The fetcher and the parser run concurrently on this task, connected by a
/// bounded channel. Pages reach the parser in fetch order. Whatever was parsed
/// before a failure is kept in the outcome.
pub async fn run_pipeline<T: Transport>(
    key: PipelineKey,
    transport: T,
    settings: Arc<PipelineSettings>,
    cancel: CancellationToken,
) -> PipelineOutcome {
    let span = info_span!("pipeline", campus = %key.campus, semester = %key.semester);

    async move {
        let start = Instant::now();
        let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));

        let fetcher = PageFetcher::new(
            transport,
            settings.endpoint.clone(),
            settings.fetch,
            cancel.child_token(),
        );

        let (fetched, parsed) = tokio::join!(
            fetcher.fetch(key.campus, &key.semester, tx),
            parse_pages(rx, settings.row_policy),
        );

        // A parse failure is what stops the fetcher early, so it is reported first.
        let result = parsed.result.and(fetched.map(|summary| {
            debug!(
                pages = summary.pages,
                requests = summary.requests,
                "Fetcher finished"
            );
        }));

        if let Err(error) = &result
            && settings.fail_fast
            && !matches!(error, PipelineError::Cancelled)
        {
            debug!("Escalating failure to the remaining pipelines");
            cancel.cancel();
        }

        PipelineOutcome {
            key,
            partition: parsed.partition,
            pages: parsed.pages,
            rows: parsed.rows,
            duration: start.elapsed(),
            result,
        }
    }
    .instrument(span)
    .await
}

/// Consumer half: parse pages until the fetcher closes the channel.
async fn parse_pages(mut pages: mpsc::Receiver<Page>, policy: RowPolicy) -> ParseSummary {
    let mut summary = ParseSummary {
        partition: Partition::new(),
        pages: 0,
        rows: 0,
        result: Ok(()),
    };

    while let Some(page) = pages.recv().await {
        match parse_page(&page, policy) {
            Ok(offerings) => {
                summary.rows += summary.partition.merge_page(offerings);
                summary.pages += 1;
            }
            Err(error) => {
                // Closing the receiver makes the fetcher's next send fail.
                pages.close();
                summary.result = Err(error);
                break;
            }
        }
    }

    debug!(
        pages = summary.pages,
        rows = summary.rows,
        "Parser finished"
    );
    summary
}
