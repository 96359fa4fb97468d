//! Concurrent crawl pipelines: one fetcher and one parser per (campus, semester).

pub mod orchestrator;
pub mod pipeline;

pub use orchestrator::{CrawlReport, Orchestrator, PipelineStatus};
pub use pipeline::{PipelineKey, PipelineOutcome, PipelineSettings, run_pipeline};
