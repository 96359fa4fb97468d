//! Error types for the CAGR client and the crawl pipelines.

/// The site answered, but not in the shape the crawler relies on.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("received {actual} instead of {expected} for page {page}")]
    UnexpectedUrl {
        page: u32,
        expected: String,
        actual: String,
    },
    #[error("element `{0}` is missing from the response")]
    MissingElement(&'static str),
    #[error("result count marker is missing from the priming page")]
    MissingResultCount,
    #[error("result count {0:?} is out of range")]
    InvalidResultCount(String),
}

/// A result row does not fit the fixed row schema.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected} cells, found {found}")]
    Arity { expected: usize, found: usize },
    #[error("field `{field}` is not an integer: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("field `{0}` is empty")]
    MissingField(&'static str),
}

/// A [`ParseError`] located at a row of a page.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("row {row}: {source}")]
pub struct RowError {
    pub row: usize,
    #[source]
    pub source: ParseError,
}

/// Everything that can end a single (campus, semester) pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("page {page}: {source}")]
    Parse {
        page: u32,
        #[source]
        source: RowError,
    },
    #[error("request failed: {0:#}")]
    Transport(#[from] anyhow::Error),
    #[error("pipeline cancelled")]
    Cancelled,
    #[error("pipeline task aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    /// Short machine-friendly label, used in structured logs and the run summary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Protocol(_) => "protocol",
            Self::Parse { .. } => "parse",
            Self::Transport(_) => "transport",
            Self::Cancelled => "cancelled",
            Self::Aborted(_) => "aborted",
        }
    }
}
