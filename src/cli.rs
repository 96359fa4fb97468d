use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::cagr::{Campus, Semester};

/// Crawl class offerings and enrollment from UFSC's CAGR into a JSON file
#[derive(Parser, Debug)]
#[command(name = "cagr", version, long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT_SHORT"), ")"))]
pub struct Args {
    /// Where to write the JSON document
    pub output: PathBuf,

    /// Number of most recent semesters to crawl
    #[arg(long, default_value_t = 2, conflicts_with = "semester")]
    pub semesters: usize,

    /// Crawl this semester instead of asking the site (repeatable)
    #[arg(long = "semester", value_name = "ID")]
    pub semester: Vec<Semester>,

    /// Only crawl this campus (repeatable, default: all)
    #[arg(long = "campus", value_name = "TAG")]
    pub campus: Vec<Campus>,

    /// Exit with a failure status if any campus/semester pipeline failed
    #[arg(long)]
    pub strict: bool,

    /// Pretty-print the JSON document
    #[arg(long)]
    pub pretty: bool,

    /// Configuration file (default: ./cagr.toml, if present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = default_tracing_format())]
    pub tracing: TracingFormat,
}

impl Args {
    /// Campuses to crawl, in table order and without duplicates.
    pub fn campuses(&self) -> Vec<Campus> {
        if self.campus.is_empty() {
            return Campus::ALL.to_vec();
        }
        Campus::ALL
            .into_iter()
            .filter(|campus| self.campus.contains(campus))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    /// Human readable, coloured
    Pretty,
    /// One JSON object per line
    Json,
}

fn default_tracing_format() -> TracingFormat {
    if cfg!(debug_assertions) {
        TracingFormat::Pretty
    } else {
        TracingFormat::Json
    }
}
