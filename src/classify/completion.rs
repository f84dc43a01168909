//! Completion-based classification backends.
//!
//! Prompt wording and reply parsing are implementation details of these
//! backends: nothing outside this module depends on the numbered-list
//! format or on the regex used to read the model's free-form answer.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::errors::SignalError;

use super::taxonomy::Taxonomy;
use super::{ClassificationResult, ClassifierBackend};

/// Character budgets leave headroom for the prompt scaffolding within each
/// provider's context window.
pub const CLAUDE_CHAR_BUDGET: usize = 28_000 - 500;
pub const GPT_CHAR_BUDGET: usize = 8_000 - 500;

static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static pattern"));

const HUMAN_TURN: &str = "\n\nHuman:";
const ASSISTANT_TURN: &str = "\n\nAssistant:";

/// Flattens newlines and truncates to `budget` characters.
#[must_use]
pub fn flatten_and_truncate(text: &str, budget: usize) -> String {
    let flat = text.replace('\n', " ");
    match flat.char_indices().nth(budget) {
        Some((cut, _)) => flat[..cut].to_string(),
        None => flat,
    }
}

/// Builds the numbered-list classification prompt for `text`.
#[must_use]
pub fn classification_prompt(taxonomy: &Taxonomy, text: &str, budget: usize) -> String {
    let text = flatten_and_truncate(text, budget);
    format!(
        "Texte à classifier: {text}.\n\
         Veuillez retourner jusqu'à 3 numéros de catégories séparés par une virgule, \
         parmi les options suivantes, uniquement si explicitement décrites.\n\
         {options}\n\
         Choix:",
        options = taxonomy.prompt_options()
    )
}

/// Maps integer tokens in the model's reply back to canonical labels.
///
/// Numbers are 1-indexed; out-of-range or non-numeric tokens are silently
/// discarded, and every retained label scores a fixed 1.0.
#[must_use]
pub fn parse_numbered_reply(taxonomy: &Taxonomy, reply: &str) -> Vec<ClassificationResult> {
    NUMBER_PATTERN
        .find_iter(reply)
        .filter_map(|token| token.as_str().parse::<usize>().ok())
        .filter_map(|number| taxonomy.canonical_by_number(number))
        .map(|label| ClassificationResult {
            label: label.to_string(),
            score: 1.0,
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    max_tokens_to_sample: u32,
    stop_sequences: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    completion: String,
}

/// Classification backend over the Anthropic completion API.
pub struct ClaudeCompletionClient {
    client: Client,
    base_url: Url,
    api_key: String,
    taxonomy: Arc<Taxonomy>,
}

impl ClaudeCompletionClient {
    /// # Errors
    /// Returns an error when the base URL is invalid or the HTTP client
    /// fails to build.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        taxonomy: Arc<Taxonomy>,
        connect_timeout: Duration,
        total_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(total_timeout)
            .build()
            .context("failed to build completion HTTP client")?;
        let base_url = Url::parse(base_url).context("invalid completion API base URL")?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            taxonomy,
        })
    }
}

#[async_trait]
impl ClassifierBackend for ClaudeCompletionClient {
    async fn classify(&self, text: &str) -> Result<Vec<ClassificationResult>, SignalError> {
        let body = classification_prompt(&self.taxonomy, text, CLAUDE_CHAR_BUDGET);
        let prompt = format!("{HUMAN_TURN} {body}{ASSISTANT_TURN}");

        let url = self
            .base_url
            .join("v1/complete")
            .context("failed to build completion URL")?;
        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&CompletionRequest {
                model: "claude-v1.3",
                prompt,
                max_tokens_to_sample: 8,
                stop_sequences: [HUMAN_TURN],
            })
            .send()
            .await
            .context("completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("completion API returned error status {status}: {body}").into());
        }

        let body: CompletionResponse = response
            .json()
            .await
            .context("failed to deserialize completion response")?;

        Ok(parse_numbered_reply(&self.taxonomy, &body.completion))
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Classification backend over the OpenAI chat-completion API.
pub struct GptCompletionClient {
    client: Client,
    base_url: Url,
    api_key: String,
    taxonomy: Arc<Taxonomy>,
}

impl GptCompletionClient {
    /// # Errors
    /// Returns an error when the base URL is invalid or the HTTP client
    /// fails to build.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        taxonomy: Arc<Taxonomy>,
        connect_timeout: Duration,
        total_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(total_timeout)
            .build()
            .context("failed to build chat-completion HTTP client")?;
        let base_url = Url::parse(base_url).context("invalid chat-completion API base URL")?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            taxonomy,
        })
    }
}

#[async_trait]
impl ClassifierBackend for GptCompletionClient {
    async fn classify(&self, text: &str) -> Result<Vec<ClassificationResult>, SignalError> {
        let prompt = classification_prompt(&self.taxonomy, text, GPT_CHAR_BUDGET);

        let url = self
            .base_url
            .join("v1/chat/completions")
            .context("failed to build chat-completion URL")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: "gpt-4",
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
            })
            .send()
            .await
            .context("chat-completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(
                anyhow!("chat-completion API returned error status {status}: {body}").into(),
            );
        }

        let body: ChatResponse = response
            .json()
            .await
            .context("failed to deserialize chat-completion response")?;
        let Some(choice) = body.choices.first() else {
            return Err(anyhow!("chat-completion reply contained no choices").into());
        };

        Ok(parse_numbered_reply(&self.taxonomy, &choice.message.content))
    }
}
