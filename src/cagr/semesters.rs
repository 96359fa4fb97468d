//! Semester discovery from the landing page's search form.

use html_scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::cagr::errors::{PipelineError, ProtocolError};
use crate::cagr::models::Semester;
use crate::cagr::transport::Transport;

const SEMESTER_SELECT_ID: &str = "formBusca:selectSemestre";

static SEMESTER_OPTIONS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(&format!(r#"select[id="{SEMESTER_SELECT_ID}"]"#)).unwrap()
});

static OPTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("option").unwrap());

/// Lists the semesters the site currently offers.
pub struct SemesterCatalog<'a, T> {
    transport: &'a T,
    base_url: &'a Url,
}

impl<'a, T: Transport> SemesterCatalog<'a, T> {
    pub fn new(transport: &'a T, base_url: &'a Url) -> Self {
        Self {
            transport,
            base_url,
        }
    }

    /// Semesters in the order the site lists them, most recent first.
    pub async fn list_semesters(&self) -> Result<Vec<Semester>, PipelineError> {
        debug!(url = %self.base_url, "Requesting landing page for semesters");
        let response = self.transport.get(self.base_url).await?;
        let semesters = parse_semesters(&response.body)?;
        debug!(count = semesters.len(), "Found available semesters");
        Ok(semesters)
    }
}

/// Extract the `value` of every option of the semester select.
pub fn parse_semesters(body: &str) -> Result<Vec<Semester>, ProtocolError> {
    let document = Html::parse_document(body);
    let select = document
        .select(&SEMESTER_OPTIONS)
        .next()
        .ok_or(ProtocolError::MissingElement(SEMESTER_SELECT_ID))?;

    Ok(select
        .select(&OPTION)
        .filter_map(|option| option.attr("value"))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(Semester::from)
        .collect())
}
