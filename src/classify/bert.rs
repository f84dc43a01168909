//! Client for the local fine-tuned model service.
//!
//! The service runs one binary classifier per topic class and returns the
//! classes voted positive; its labels are already canonical, so no
//! vocabulary translation happens here.

use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::errors::SignalError;

use super::{ClassificationResult, ClassifierBackend};

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<ClassificationResult>,
}

pub struct BertClassifierClient {
    client: Client,
    base_url: Url,
}

impl BertClassifierClient {
    /// # Errors
    /// Returns an error when the base URL is invalid or the HTTP client
    /// fails to build.
    pub fn new(
        base_url: &str,
        connect_timeout: Duration,
        total_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(total_timeout)
            .build()
            .context("failed to build model service HTTP client")?;
        let base_url = Url::parse(base_url).context("invalid model service base URL")?;

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl ClassifierBackend for BertClassifierClient {
    async fn classify(&self, text: &str) -> Result<Vec<ClassificationResult>, SignalError> {
        let url = self
            .base_url
            .join("predict")
            .context("failed to build model service predict URL")?;

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .form(&[("text", text)])
            .send()
            .await
            .context("model service request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("model service returned error status {status}: {body}").into());
        }

        let body: PredictResponse = response
            .json()
            .await
            .context("failed to deserialize model service response")?;

        debug!(
            prediction_count = body.predictions.len(),
            "model service classified text"
        );

        Ok(body.predictions)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(base_url: &str) -> BertClassifierClient {
        BertClassifierClient::new(base_url, Duration::from_secs(3), Duration::from_secs(30))
            .expect("client builds")
    }

    #[tokio::test]
    async fn classify_parses_positive_classes() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(body_string_contains("text="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "predictions": [
                    { "label": "Investissement", "score": 1.0 },
                    { "label": "Nouvelle implantation", "score": 1.0 }
                ]
            })))
            .mount(&server)
            .await;

        let predictions = client(&server.uri())
            .classify("Renault investit à Nantes.")
            .await
            .expect("classify succeeds");

        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].label, "Investissement");
        assert!((predictions[0].score - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn classify_surfaces_error_status_as_upstream() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(503).set_body_string("models loading"))
            .mount(&server)
            .await;

        let error = client(&server.uri())
            .classify("texte")
            .await
            .expect_err("classify must fail");

        assert!(matches!(error, SignalError::Upstream(_)));
    }
}
