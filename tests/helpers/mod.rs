//! Scripted in-memory stand-in for the CAGR site.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use cagr::cagr::BASE_URL;
use cagr::cagr::transport::{Connector, FormFields, Response, Transport};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub fn endpoint() -> Url {
    Url::parse(BASE_URL).unwrap()
}

/// Build one 14-cell result row.
pub fn row(course_id: &str, class_id: &str, name: &str, enrolled: &str) -> String {
    format!(
        "<tr><td>1</td><td></td><td>x</td><td>{course_id}</td><td>{class_id}</td>\
         <td>{name}<br/>[PRESENCIAL]</td><td>72</td><td>40</td><td>{enrolled}</td><td></td>\
         <td>0</td><td></td><td>2.0730-2 / CTC-AB1</td><td>Fulano de Tal</td></tr>"
    )
}

/// A full result page, with the result count marker when `total` is given.
pub fn results_page(total: Option<u32>, rows: &[String]) -> String {
    let marker = total
        .map(|n| format!("<span id=\"formBusca:dataTable:j_id11\">{n}</span> resultados foram encontrados"))
        .unwrap_or_default();
    format!(
        "<html><body><form id=\"formBusca\">{marker}<table id=\"formBusca:dataTable\">\
         <tbody id=\"formBusca:dataTable:tb\">{}</tbody></table></form></body></html>",
        rows.concat()
    )
}

pub fn landing_page(semesters: &[&str]) -> String {
    let options: String = semesters
        .iter()
        .map(|s| format!("<option value=\"{s}\">{s}</option>"))
        .collect();
    format!(
        "<html><body><select id=\"formBusca:selectSemestre\">{options}</select></body></html>"
    )
}

/// How the site answers the searches of one (campus, semester) pair.
#[derive(Debug, Clone, Default)]
pub struct PartitionScript {
    /// Bodies for scroller indices 1, 2, ...; later indices repeat the last one.
    pub pages: Vec<String>,
    /// Scroller index answered with a redirect to an error page.
    pub redirect_on: Option<u32>,
    /// Scroller index whose request fails at the network level.
    pub fail_on: Option<u32>,
    /// Delay before every answer.
    pub latency: Duration,
}

impl PartitionScript {
    pub fn pages(pages: Vec<String>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    fn body(&self, index: u32) -> String {
        let position = usize::try_from(index).unwrap_or(usize::MAX).saturating_sub(1);
        self.pages
            .get(position)
            .or(self.pages.last())
            .cloned()
            .unwrap_or_else(|| results_page(None, &[]))
    }
}

/// A form post the site received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posted {
    pub session: usize,
    pub campus: String,
    pub semester: String,
    pub page: u32,
}

#[derive(Debug, Default)]
pub struct FakeSite {
    pub landing: String,
    /// Delay before the landing page is answered.
    pub landing_latency: Duration,
    partitions: HashMap<(String, String), PartitionScript>,
    posts: Mutex<Vec<Posted>>,
    landing_visits: AtomicUsize,
    sessions: AtomicUsize,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_landing(mut self, landing: String) -> Self {
        self.landing = landing;
        self
    }

    /// `campus_code` is the wire code, e.g. `1` for FLO.
    pub fn with_partition(mut self, campus_code: u8, semester: &str, script: PartitionScript) -> Self {
        self.partitions
            .insert((campus_code.to_string(), semester.to_string()), script);
        self
    }

    pub fn with_landing_latency(mut self, latency: Duration) -> Self {
        self.landing_latency = latency;
        self
    }

    pub fn posts(&self) -> Vec<Posted> {
        self.posts.lock().unwrap().clone()
    }

    /// Scroller indices requested for one partition, in order.
    pub fn pages_requested(&self, campus_code: u8, semester: &str) -> Vec<u32> {
        self.posts()
            .into_iter()
            .filter(|p| p.campus == campus_code.to_string() && p.semester == semester)
            .map(|p| p.page)
            .collect()
    }

    pub fn landing_visits(&self) -> usize {
        self.landing_visits.load(Ordering::SeqCst)
    }

    pub fn sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

pub struct FakeSession {
    site: Arc<FakeSite>,
    id: usize,
}

impl FakeSession {
    pub fn new(site: Arc<FakeSite>) -> Self {
        let id = site.sessions.fetch_add(1, Ordering::SeqCst);
        Self { site, id }
    }
}

fn field(form: &FormFields, name: &str) -> String {
    form.iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.clone())
        .unwrap_or_default()
}

#[async_trait]
impl Transport for FakeSession {
    async fn get(&self, url: &Url) -> Result<Response> {
        self.site.landing_visits.fetch_add(1, Ordering::SeqCst);
        if !self.site.landing_latency.is_zero() {
            tokio::time::sleep(self.site.landing_latency).await;
        }
        Ok(Response {
            url: url.clone(),
            body: self.site.landing.clone(),
        })
    }

    async fn post_form(&self, url: &Url, form: &FormFields) -> Result<Response> {
        let page: u32 = field(form, "formBusca:dataScroller1").parse()?;
        let campus = field(form, "formBusca:selectCampus");
        let semester = field(form, "formBusca:selectSemestre");

        self.site.posts.lock().unwrap().push(Posted {
            session: self.id,
            campus: campus.clone(),
            semester: semester.clone(),
            page,
        });

        let Some(script) = self.site.partitions.get(&(campus, semester)) else {
            return Ok(Response {
                url: url.clone(),
                body: results_page(None, &[]),
            });
        };

        if !script.latency.is_zero() {
            tokio::time::sleep(script.latency).await;
        }
        if script.fail_on == Some(page) {
            anyhow::bail!("connection reset by peer");
        }
        if script.redirect_on == Some(page) {
            return Ok(Response {
                url: url.join("/erro.xhtml")?,
                body: "<html><body>Sessão expirada</body></html>".to_string(),
            });
        }

        Ok(Response {
            url: url.clone(),
            body: script.body(page),
        })
    }
}

#[derive(Clone)]
pub struct FakeConnector {
    pub site: Arc<FakeSite>,
}

impl Connector for FakeConnector {
    type Transport = FakeSession;

    fn connect(&self) -> Result<FakeSession> {
        Ok(FakeSession::new(self.site.clone()))
    }
}
