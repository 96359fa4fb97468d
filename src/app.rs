use crate::cagr::transport::Connector;
use crate::cagr::{HttpConnector, Semester, SemesterCatalog};
use crate::cli::Args;
use crate::config::Config;
use crate::crawler::{CrawlReport, Orchestrator};
use crate::data::Offerings;
use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::process::ExitCode;
use tracing::{info, warn};

/// One crawl run: resolve semesters, run the pipelines, write the document.
pub struct App {
    args: Args,
    config: Config,
}

impl App {
    pub fn new(args: Args, config: Config) -> Self {
        Self { args, config }
    }

    /// Run the crawl and decide the process exit status.
    pub async fn run(self) -> Result<ExitCode, anyhow::Error> {
        let connector = self.config.connector();
        let semesters = self.resolve_semesters(&connector).await?;
        let campuses = self.args.campuses();

        info!(
            semesters = ?semesters.iter().map(Semester::as_str).collect::<Vec<_>>(),
            campuses = ?campuses.iter().map(|c| c.tag()).collect::<Vec<_>>(),
            pagination = ?self.config.pagination,
            row_policy = ?self.config.row_policy,
            "Crawl configuration resolved"
        );

        let orchestrator = Orchestrator::new(connector, self.config.pipeline_settings());

        // Ctrl-C stops every pipeline at its next request; parsed data is still written.
        let cancel = orchestrator.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling pipelines");
                cancel.cancel();
            }
        });

        let report = orchestrator.run(&campuses, &semesters).await;
        self.write_output(&report.offerings)?;
        Ok(self.exit_code(&report))
    }

    /// Semesters given on the command line, or the most recent ones the site lists.
    async fn resolve_semesters(
        &self,
        connector: &HttpConnector,
    ) -> Result<Vec<Semester>, anyhow::Error> {
        if !self.args.semester.is_empty() {
            let mut semesters = Vec::with_capacity(self.args.semester.len());
            for semester in &self.args.semester {
                if !semesters.contains(semester) {
                    semesters.push(semester.clone());
                }
            }
            return Ok(semesters);
        }

        let transport = connector.connect()?;
        let catalog = SemesterCatalog::new(&transport, &self.config.base_url);
        let mut semesters = catalog
            .list_semesters()
            .await
            .context("Failed to list available semesters")?;
        semesters.truncate(self.args.semesters);

        if semesters.is_empty() {
            anyhow::bail!("No semesters to crawl");
        }
        Ok(semesters)
    }

    fn write_output(&self, offerings: &Offerings) -> Result<(), anyhow::Error> {
        let path = &self.args.output;
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        let written = if self.args.pretty {
            serde_json::to_writer_pretty(&mut writer, offerings)
        } else {
            serde_json::to_writer(&mut writer, offerings)
        };
        written.with_context(|| format!("Failed to write {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", path.display()))?;

        info!(
            path = %path.display(),
            partitions = offerings.partition_count(),
            classes = offerings.class_count(),
            "Offerings written"
        );
        Ok(())
    }

    fn exit_code(&self, report: &CrawlReport) -> ExitCode {
        if report.is_complete() {
            return ExitCode::SUCCESS;
        }

        let failed: Vec<String> = report
            .failures()
            .map(|status| status.key.to_string())
            .collect();
        warn!(
            failed = ?failed,
            "Some partitions are missing or partial in the output"
        );

        if self.args.strict {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}
