pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One raw mention produced by a single tagger.
///
/// `start`/`end` are character offsets into the source text. Not every
/// tagger supplies positions or scores, so both stay optional here; the
/// ensemble resolver drops scores entirely and only positioned mentions can
/// contribute offsets to the canonical output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMention {
    pub text: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

impl EntityMention {
    #[must_use]
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
            score: None,
            start: None,
            end: None,
        }
    }

    #[must_use]
    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    #[must_use]
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Capability contract over one entity-tagging backend.
///
/// Label strings are opaque to every consumer of this trait; the resolver
/// never special-cases a variant's vocabulary.
#[async_trait]
pub trait TaggerAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn tag(&self, text: &str) -> anyhow::Result<Vec<EntityMention>>;
}
