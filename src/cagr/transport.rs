//! HTTP session abstraction.
//!
//! A [`Transport`] is one cookie-carrying session with the site. Pipelines never
//! share a transport; a [`Connector`] hands each pipeline a fresh one.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::trace;
use url::Url;

/// A fully read response: the URL the request finally resolved to and its body.
#[derive(Debug, Clone)]
pub struct Response {
    pub url: Url,
    pub body: String,
}

/// Form fields in the order they are sent.
pub type FormFields = Vec<(&'static str, String)>;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Response>;

    async fn post_form(&self, url: &Url, form: &FormFields) -> Result<Response>;
}

/// Creates one independent session per call.
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport + 'static;

    fn connect(&self) -> Result<Self::Transport>;
}

/// Production transport backed by a `reqwest` client with its own cookie jar.
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    async fn read(response: reqwest::Response) -> Result<Response> {
        let url = response.url().clone();
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Request to {url} failed ({status})");
        }
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))?;
        trace!(%url, status = status.as_u16(), bytes = body.len(), "response received");
        Ok(Response { url, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<Response> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to GET {url}"))?;
        Self::read(response).await
    }

    async fn post_form(&self, url: &Url, form: &FormFields) -> Result<Response> {
        let response = self
            .http
            .post(url.clone())
            .form(form)
            .send()
            .await
            .with_context(|| format!("Failed to POST {url}"))?;
        Self::read(response).await
    }
}

/// Builds [`HttpTransport`]s sharing a timeout and user agent but nothing else.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
    user_agent: String,
}

impl HttpConnector {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            timeout,
            user_agent: user_agent.into(),
        }
    }
}

impl Connector for HttpConnector {
    type Transport = HttpTransport;

    fn connect(&self) -> Result<HttpTransport> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpTransport { http })
    }
}
