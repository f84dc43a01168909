//! Client for the zero-shot similarity service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::SignalError;

use super::taxonomy::Taxonomy;
use super::{ClassificationResult, ClassifierBackend};

#[derive(Debug, Serialize)]
struct ZestePredictRequest<'a> {
    labels: Vec<String>,
    language: &'a str,
    text: &'a str,
    explain: bool,
    highlights: bool,
}

#[derive(Debug, Deserialize)]
struct ZestePredictResponse {
    results: Vec<ZesteResult>,
}

#[derive(Debug, Deserialize)]
struct ZesteResult {
    label: String,
    score: f32,
}

/// Zero-shot backend; results are assumed pre-sorted by score descending.
pub struct ZesteClient {
    client: Client,
    base_url: Url,
    taxonomy: Arc<Taxonomy>,
    score_threshold: Option<f32>,
    top_k: Option<usize>,
}

impl ZesteClient {
    /// # Errors
    /// Returns an error when the base URL is invalid or the HTTP client
    /// fails to build.
    pub fn new(
        base_url: &str,
        taxonomy: Arc<Taxonomy>,
        score_threshold: Option<f32>,
        top_k: Option<usize>,
        connect_timeout: Duration,
        total_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(total_timeout)
            .build()
            .context("failed to build zero-shot HTTP client")?;
        let base_url = Url::parse(base_url).context("invalid zero-shot service base URL")?;

        Ok(Self {
            client,
            base_url,
            taxonomy,
            score_threshold,
            top_k,
        })
    }
}

#[async_trait]
impl ClassifierBackend for ZesteClient {
    async fn classify(&self, text: &str) -> Result<Vec<ClassificationResult>, SignalError> {
        let url = self
            .base_url
            .join("api/predict")
            .context("failed to build zero-shot predict URL")?;

        let response = self
            .client
            .post(url)
            .json(&ZestePredictRequest {
                labels: self.taxonomy.zeste_labels(),
                language: "fr",
                text,
                explain: false,
                highlights: false,
            })
            .send()
            .await
            .context("zero-shot request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(
                anyhow!("zero-shot service returned error status {status}: {body}").into(),
            );
        }

        let body: ZestePredictResponse = response
            .json()
            .await
            .context("failed to deserialize zero-shot response")?;

        let mut predictions = Vec::new();
        for (rank, result) in body.results.iter().enumerate() {
            if let Some(top_k) = self.top_k {
                if rank >= top_k {
                    break;
                }
            }
            if let Some(threshold) = self.score_threshold {
                if result.score < threshold {
                    continue;
                }
            }
            let Some(canonical) = self.taxonomy.canonical_for_zeste(&result.label) else {
                return Err(anyhow!(
                    "zero-shot service returned label outside vocabulary: {}",
                    result.label
                )
                .into());
            };
            predictions.push(ClassificationResult {
                label: canonical.to_string(),
                score: result.score,
            });
        }

        debug!(
            candidate_count = body.results.len(),
            prediction_count = predictions.len(),
            "zero-shot service classified text"
        );

        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn mounted_client(
        server: &MockServer,
        results: serde_json::Value,
        score_threshold: Option<f32>,
        top_k: Option<usize>,
    ) -> ZesteClient {
        Mock::given(method("POST"))
            .and(path("/api/predict"))
            .and(body_partial_json(
                serde_json::json!({ "language": "fr", "explain": false }),
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": results })),
            )
            .mount(server)
            .await;

        ZesteClient::new(
            &server.uri(),
            Arc::new(Taxonomy::french_business_news().expect("taxonomy")),
            score_threshold,
            top_k,
            Duration::from_secs(3),
            Duration::from_secs(30),
        )
        .expect("client builds")
    }

    #[tokio::test]
    async fn classify_translates_ranks_and_caps_results() {
        let server = MockServer::start().await;
        let client = mounted_client(
            &server,
            serde_json::json!([
                { "label": "investissement", "score": 0.42 },
                { "label": "implantation", "score": 0.30 },
                { "label": "rachat", "score": 0.25 },
                { "label": "fermeture", "score": 0.20 }
            ]),
            Some(0.11),
            Some(3),
        )
        .await;

        let predictions = client
            .classify("Renault investit à Nantes.")
            .await
            .expect("classify succeeds");

        let labels: Vec<&str> = predictions.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Investissement",
                "Nouvelle implantation",
                "Rachat / Cession"
            ]
        );
        assert!((predictions[0].score - 0.42).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn classify_skips_scores_below_threshold() {
        let server = MockServer::start().await;
        let client = mounted_client(
            &server,
            serde_json::json!([
                { "label": "investissement", "score": 0.42 },
                { "label": "implantation", "score": 0.05 },
                { "label": "rachat", "score": 0.15 }
            ]),
            Some(0.11),
            Some(3),
        )
        .await;

        let predictions = client.classify("texte").await.expect("classify succeeds");

        let labels: Vec<&str> = predictions.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Investissement", "Rachat / Cession"]);
    }

    #[tokio::test]
    async fn classify_without_limits_keeps_every_result() {
        let server = MockServer::start().await;
        let client = mounted_client(
            &server,
            serde_json::json!([
                { "label": "investissement", "score": 0.42 },
                { "label": "implantation", "score": 0.01 }
            ]),
            None,
            None,
        )
        .await;

        let predictions = client.classify("texte").await.expect("classify succeeds");

        assert_eq!(predictions.len(), 2);
    }

    #[tokio::test]
    async fn unknown_label_from_service_is_upstream_error() {
        let server = MockServer::start().await;
        let client = mounted_client(
            &server,
            serde_json::json!([{ "label": "astrologie", "score": 0.9 }]),
            None,
            None,
        )
        .await;

        let error = client.classify("texte").await.expect_err("must fail");

        assert!(matches!(error, SignalError::Upstream(_)));
    }
}
