use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EntityMention, TaggerAdapter};

#[derive(Debug, Serialize)]
struct TagRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TagResponse {
    entities: Vec<EntityMention>,
}

/// Tagger adapter over a remote span-tagging service.
#[derive(Debug, Clone)]
pub struct HttpTaggerClient {
    name: String,
    client: Client,
    base_url: Url,
}

impl HttpTaggerClient {
    /// Builds a client for one tagger endpoint.
    ///
    /// # Errors
    /// Returns an error when the base URL is invalid or the HTTP client
    /// fails to build.
    pub fn new(
        name: impl Into<String>,
        base_url: &str,
        connect_timeout: Duration,
        total_timeout: Duration,
    ) -> Result<Self> {
        let name = name.into();
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(total_timeout)
            .build()
            .with_context(|| format!("failed to build HTTP client for tagger {name}"))?;
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid base URL for tagger {name}: {base_url}"))?;

        Ok(Self {
            name,
            client,
            base_url,
        })
    }
}

#[async_trait]
impl TaggerAdapter for HttpTaggerClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn tag(&self, text: &str) -> Result<Vec<EntityMention>> {
        let url = self
            .base_url
            .join("v1/tag")
            .with_context(|| format!("failed to build tag URL for tagger {}", self.name))?;

        let response = self
            .client
            .post(url)
            .json(&TagRequest { text })
            .send()
            .await
            .with_context(|| format!("tagger {} request failed", self.name))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "tagger {} returned error status {}: {}",
                self.name,
                status,
                body
            );
        }

        let body: TagResponse = response
            .json()
            .await
            .with_context(|| format!("failed to deserialize tagger {} response", self.name))?;

        debug!(
            tagger = %self.name,
            mention_count = body.entities.len(),
            "tagged text"
        );

        Ok(body.entities)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(base_url: &str) -> HttpTaggerClient {
        HttpTaggerClient::new(
            "camembert",
            base_url,
            Duration::from_secs(3),
            Duration::from_secs(30),
        )
        .expect("client should build")
    }

    #[tokio::test]
    async fn tag_parses_positioned_and_unpositioned_mentions() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "entities": [
                { "text": "Renault", "label": "ORG", "score": 0.98, "start": 10, "end": 17 },
                { "text": "Nantes", "label": "LOC" }
            ]
        });

        Mock::given(method("POST"))
            .and(path("/v1/tag"))
            .and(body_json(serde_json::json!({ "text": "Renault à Nantes" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .mount(&server)
            .await;

        let mentions = client(&server.uri())
            .tag("Renault à Nantes")
            .await
            .expect("tag should succeed");

        assert_eq!(
            mentions,
            vec![
                EntityMention::new("Renault", "ORG")
                    .with_score(0.98)
                    .with_span(10, 17),
                EntityMention::new("Nantes", "LOC"),
            ]
        );
    }

    #[tokio::test]
    async fn tag_propagates_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/tag"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let error = client(&server.uri())
            .tag("some text")
            .await
            .expect_err("tag should fail");

        assert!(error.to_string().contains("camembert"));
    }

    #[test]
    fn new_rejects_invalid_base_url() {
        let error = HttpTaggerClient::new(
            "flair",
            "not a url",
            Duration::from_secs(3),
            Duration::from_secs(30),
        )
        .expect_err("invalid URL should fail");

        assert!(error.to_string().contains("flair"));
    }
}
