use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cagr::errors::PipelineError;
use crate::cagr::models::{Campus, Semester};
use crate::cagr::transport::Connector;
use crate::crawler::pipeline::{PipelineKey, PipelineOutcome, PipelineSettings, run_pipeline};
use crate::data::offerings::Offerings;
use crate::utils::fmt_duration;

/// A pipeline taking longer than this is worth a warning.
const SLOW_PIPELINE_THRESHOLD: Duration = Duration::from_secs(5 * 60);

/// How one partition of the run went.
#[derive(Debug)]
pub struct PipelineStatus {
    pub key: PipelineKey,
    pub pages: u32,
    pub rows: usize,
    pub duration: Duration,
    pub error: Option<PipelineError>,
}

/// The merged result of a run plus the status of every partition.
///
/// A failed partition keeps whatever was parsed before it failed, so its data
/// in [`CrawlReport::offerings`] is partial or missing.
#[derive(Debug)]
pub struct CrawlReport {
    pub offerings: Offerings,
    pub statuses: Vec<PipelineStatus>,
}

impl CrawlReport {
    pub fn failures(&self) -> impl Iterator<Item = &PipelineStatus> {
        self.statuses.iter().filter(|status| status.error.is_some())
    }

    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Fans out one pipeline per (campus, semester) pair and gathers the results.
pub struct Orchestrator<C> {
    connector: Arc<C>,
    settings: Arc<PipelineSettings>,
    cancel: CancellationToken,
}

impl<C: Connector> Orchestrator<C> {
    pub fn new(connector: C, settings: PipelineSettings) -> Self {
        Self {
            connector: Arc::new(connector),
            settings: Arc::new(settings),
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops every pipeline of this orchestrator when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Crawl every campus in every semester and wait for all pipelines to end.
    ///
    /// A failing pipeline never affects the others unless fail-fast is enabled.
    pub async fn run(&self, campuses: &[Campus], semesters: &[Semester]) -> CrawlReport {
        let start = Instant::now();
        info!(
            campuses = campuses.len(),
            semesters = semesters.len(),
            "Starting pipelines"
        );

        let mut outcomes = Vec::with_capacity(campuses.len() * semesters.len());
        let mut handles: Vec<(PipelineKey, JoinHandle<PipelineOutcome>)> = Vec::new();

        for semester in semesters {
            for &campus in campuses {
                let key = PipelineKey {
                    semester: semester.clone(),
                    campus,
                };

                // Every pipeline gets a session of its own.
                let transport = match self.connector.connect() {
                    Ok(transport) => transport,
                    Err(e) => {
                        error!(pipeline = %key, error = ?e, "Failed to open session");
                        outcomes.push(PipelineOutcome::failed(key, e.into()));
                        continue;
                    }
                };

                debug!(pipeline = %key, "Spawning pipeline");
                let handle = tokio::spawn(run_pipeline(
                    key.clone(),
                    transport,
                    self.settings.clone(),
                    self.cancel.clone(),
                ));
                handles.push((key, handle));
            }
        }

        for (key, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(pipeline = %key, error = %e, "Pipeline task did not finish");
                    outcomes.push(PipelineOutcome::failed(
                        key,
                        PipelineError::Aborted(e.to_string()),
                    ));
                }
            }
        }

        outcomes.sort_by(|a, b| a.key.cmp(&b.key));

        let mut offerings = Offerings::new();
        let mut statuses = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            Self::log_outcome(&outcome);
            // A failed pipeline with nothing parsed leaves its partition absent.
            if outcome.result.is_ok() || !outcome.partition.is_empty() {
                offerings.insert_partition(
                    outcome.key.semester.clone(),
                    outcome.key.campus,
                    outcome.partition,
                );
            }
            statuses.push(PipelineStatus {
                key: outcome.key,
                pages: outcome.pages,
                rows: outcome.rows,
                duration: outcome.duration,
                error: outcome.result.err(),
            });
        }

        let report = CrawlReport {
            offerings,
            statuses,
        };
        info!(
            duration = fmt_duration(start.elapsed()),
            pipelines = report.statuses.len(),
            failed = report.failures().count(),
            classes = report.offerings.class_count(),
            "All pipelines finished"
        );
        report
    }

    fn log_outcome(outcome: &PipelineOutcome) {
        if outcome.duration > SLOW_PIPELINE_THRESHOLD {
            warn!(
                pipeline = %outcome.key,
                duration = fmt_duration(outcome.duration),
                "Slow pipeline detected"
            );
        }

        match &outcome.result {
            Ok(()) => info!(
                pipeline = %outcome.key,
                pages = outcome.pages,
                rows = outcome.rows,
                duration = fmt_duration(outcome.duration),
                "Pipeline completed"
            ),
            Err(e) => error!(
                pipeline = %outcome.key,
                kind = e.kind(),
                pages = outcome.pages,
                rows = outcome.rows,
                duration = fmt_duration(outcome.duration),
                error = %e,
                "Pipeline failed, partition data is partial or missing"
            ),
        }
    }
}
