//! Paginated search session for one (campus, semester) pair.
//!
//! The search page is a JSF form. Pages are requested by replaying the form
//! with a different `formBusca:dataScroller1` value; the server keeps the
//! query in the session established by a plain visit to the landing page.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::cagr::errors::{PipelineError, ProtocolError};
use crate::cagr::models::{Campus, Page, Semester};
use crate::cagr::transport::{FormFields, Transport};

/// Rows the site renders per result page.
pub const RESULTS_PER_PAGE: u32 = 50;

/// Index requested to learn the result count. Page 1 is skipped: the scroller
/// only renders the count once it has been asked for a later page.
pub const PRIMING_PAGE: u32 = 2;

const SCROLLER_FIELD: &str = "formBusca:dataScroller1";

/// The server never validates this view state for the search form.
const PLACEHOLDER_VIEW_STATE: &str = "j_id1";

static RESULT_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)</span> resultados foram encontrados").unwrap());

/// How a fetcher decides where pagination ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaginationMode {
    /// Learn the page count from the priming page. No count marker means no results.
    #[default]
    Counted,
    /// Like `Counted`, but a missing count marker fails the pipeline.
    CountedStrict,
    /// Keep requesting pages until the server repeats one.
    UntilRepeat,
}

/// Number of result pages needed for `results` rows.
pub fn page_count(results: u32) -> u32 {
    results.div_ceil(RESULTS_PER_PAGE)
}

/// Total result count announced on a result page, if present.
pub fn parse_result_count(body: &str) -> Result<Option<u32>, ProtocolError> {
    let Some(caps) = RESULT_COUNT_RE.captures(body) else {
        return Ok(None);
    };
    caps[1]
        .parse()
        .map(Some)
        .map_err(|_| ProtocolError::InvalidResultCount(caps[1].to_string()))
}

/// Form fields for page `page` of the search for `campus` in `semester`.
pub fn search_form(campus: Campus, semester: &Semester, page: u32) -> FormFields {
    vec![
        ("formBusca", "formBusca".to_string()),
        ("javax.faces.ViewState", PLACEHOLDER_VIEW_STATE.to_string()),
        ("formBusca:selectSemestre", semester.to_string()),
        ("formBusca:selectCampus", campus.code().to_string()),
        (SCROLLER_FIELD, page.to_string()),
    ]
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    pub mode: PaginationMode,
    /// Pause before every form post.
    pub request_delay: Duration,
}

/// What a finished fetch produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub pages: u32,
    pub requests: u32,
}

/// Producer half of a pipeline: drives one session and hands pages to a channel.
pub struct PageFetcher<T> {
    transport: T,
    endpoint: Url,
    options: FetchOptions,
    cancel: CancellationToken,
    requests: u32,
}

impl<T: Transport> PageFetcher<T> {
    pub fn new(
        transport: T,
        endpoint: Url,
        options: FetchOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            endpoint,
            options,
            cancel,
            requests: 0,
        }
    }

    /// Fetch every page of the search and send it to `sink`.
    ///
    /// The fetcher consumes itself; `sink` is dropped on return, which is the
    /// consumer's end-of-stream signal whether the fetch succeeded or not.
    pub async fn fetch(
        mut self,
        campus: Campus,
        semester: &Semester,
        sink: mpsc::Sender<Page>,
    ) -> Result<FetchSummary, PipelineError> {
        info!("Starting fetcher");

        debug!("Requesting landing page to establish session");
        self.ensure_not_cancelled()?;
        tokio::select! {
            _ = self.cancel.cancelled() => return Err(PipelineError::Cancelled),
            response = self.transport.get(&self.endpoint) => {
                response?;
            }
        }
        self.requests += 1;

        let last_page = match self.options.mode {
            PaginationMode::UntilRepeat => None,
            PaginationMode::Counted | PaginationMode::CountedStrict => {
                Some(self.discover_page_count(campus, semester).await?)
            }
        };

        let mut previous: Option<String> = None;
        let mut pages = 0;

        for index in 1u32.. {
            if last_page.is_some_and(|last| index > last) {
                break;
            }

            let body = self.request_page(campus, semester, index).await?;

            if previous.as_deref() == Some(body.as_str()) {
                debug!(page = index, "Received repeated page");
                break;
            }
            previous = Some(body.clone());

            debug!(page = index, "Handing page to parser");
            if sink.send(Page { index, body }).await.is_err() {
                debug!(page = index, "Parser stopped, ending fetch");
                break;
            }
            pages += 1;
        }

        info!(pages, requests = self.requests, "Stopping fetcher");
        Ok(FetchSummary {
            pages,
            requests: self.requests,
        })
    }

    /// Request the priming page and turn its result count into a page count.
    async fn discover_page_count(
        &mut self,
        campus: Campus,
        semester: &Semester,
    ) -> Result<u32, PipelineError> {
        let body = self.request_page(campus, semester, PRIMING_PAGE).await?;

        match parse_result_count(&body)? {
            Some(results) => {
                let pages = page_count(results);
                debug!(results, pages, "Discovered result count");
                Ok(pages)
            }
            None if self.options.mode == PaginationMode::CountedStrict => {
                Err(ProtocolError::MissingResultCount.into())
            }
            None => {
                warn!("No result count on priming page, treating search as empty");
                Ok(0)
            }
        }
    }

    /// POST the search form for one page and check the session survived.
    async fn request_page(
        &mut self,
        campus: Campus,
        semester: &Semester,
        index: u32,
    ) -> Result<String, PipelineError> {
        self.ensure_not_cancelled()?;
        if !self.options.request_delay.is_zero() {
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(PipelineError::Cancelled),
                _ = tokio::time::sleep(self.options.request_delay) => {}
            }
        }

        debug!(page = index, "Requesting page");
        let form = search_form(campus, semester, index);
        let response = tokio::select! {
            _ = self.cancel.cancelled() => return Err(PipelineError::Cancelled),
            response = self.transport.post_form(&self.endpoint, &form) => response?,
        };
        self.requests += 1;

        // Expired sessions and server errors redirect away from the search page.
        if response.url != self.endpoint {
            return Err(ProtocolError::UnexpectedUrl {
                page: index,
                expected: self.endpoint.to_string(),
                actual: response.url.to_string(),
            }
            .into());
        }

        Ok(response.body)
    }

    fn ensure_not_cancelled(&self) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }
}
