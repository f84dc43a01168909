//! Article text acquisition from the remote content source.

use std::time::Duration;

use anyhow::{Context, anyhow};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::info;

use crate::errors::SignalError;

// Wide enough that the converter never wraps article prose, which would
// shift character offsets reported by downstream taggers.
const PLAIN_TEXT_WIDTH: usize = 20_000;

#[derive(Debug, Default, Deserialize)]
struct ArticleDocument {
    #[serde(default)]
    body: Vec<RichTextField>,
    #[serde(default)]
    field_abstract: Vec<RichTextField>,
}

#[derive(Debug, Deserialize)]
struct RichTextField {
    value: String,
}

/// Fetches the JSON rendition of an article and extracts its plain text.
///
/// Only URLs whose host matches the configured content source are
/// accepted; anything else is an [`SignalError::InvalidResource`].
#[derive(Debug, Clone)]
pub struct ArticleClient {
    client: Client,
    allowed_host: String,
}

impl ArticleClient {
    /// # Errors
    /// Returns an error when the HTTP client fails to build.
    pub fn new(
        allowed_host: impl Into<String>,
        connect_timeout: Duration,
        total_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(total_timeout)
            .build()
            .context("failed to build article HTTP client")?;

        Ok(Self {
            client,
            allowed_host: allowed_host.into(),
        })
    }

    /// Fetches and normalizes the article text behind `raw_url`.
    ///
    /// The body HTML is flattened to plain text and joined with the
    /// abstract using `". "`, matching the layout downstream taggers were
    /// tuned on.
    ///
    /// # Errors
    /// [`SignalError::InvalidResource`] for malformed or foreign URLs,
    /// [`SignalError::Upstream`] for transport or decode failures.
    pub async fn fetch_text(&self, raw_url: &str) -> Result<String, SignalError> {
        let url = Url::parse(raw_url)
            .map_err(|_| SignalError::InvalidResource(raw_url.to_string()))?;
        if url.host_str() != Some(self.allowed_host.as_str()) {
            return Err(SignalError::InvalidResource(raw_url.to_string()));
        }

        info!(url = raw_url, "fetching article text");

        let response = self
            .client
            .get(url)
            .query(&[("_format", "json")])
            .send()
            .await
            .context("article request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("content source returned error status {status}").into());
        }

        let document: ArticleDocument = response
            .json()
            .await
            .context("failed to deserialize article document")?;

        let mut sections = Vec::new();
        if let Some(body) = document.body.first() {
            let plain = html2text::from_read(body.value.as_bytes(), PLAIN_TEXT_WIDTH)
                .context("failed to extract plain text from article body")?;
            sections.push(plain.trim().to_string());
        }
        if let Some(field_abstract) = document.field_abstract.first() {
            sections.push(field_abstract.value.trim().to_string());
        }

        Ok(sections.join(". "))
    }
}
