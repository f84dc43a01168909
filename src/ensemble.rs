//! Majority-vote resolution of disagreeing entity taggers.

pub mod position;
pub mod voting;

use std::sync::Arc;

use anyhow::Context;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::SignalError;
use crate::observability::metrics::Metrics;
use crate::taggers::{EntityMention, TaggerAdapter};

/// One entity retained by the ensemble. Scores are deliberately absent:
/// duplicate spans are never distinguished by tagger confidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEntity {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

/// The resolver's final artifact, handed to rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDocument {
    pub text: String,
    pub entities: Vec<CanonicalEntity>,
}

/// Runs an immutable registry of tagger adapters and merges their mentions
/// by majority vote.
pub struct EnsembleResolver {
    taggers: Vec<Arc<dyn TaggerAdapter>>,
    metrics: Arc<Metrics>,
}

impl EnsembleResolver {
    #[must_use]
    pub fn new(taggers: Vec<Arc<dyn TaggerAdapter>>, metrics: Arc<Metrics>) -> Self {
        Self { taggers, metrics }
    }

    #[must_use]
    pub fn tagger_count(&self) -> usize {
        self.taggers.len()
    }

    /// Resolves one canonical entity set for `text`.
    ///
    /// All taggers run concurrently and are joined before voting, so
    /// latency is bounded by the slowest tagger; voting itself is
    /// order-independent. Any tagger failure fails the whole call — there
    /// is no degraded quorum with N-1 taggers.
    ///
    /// # Errors
    /// Returns [`SignalError::Upstream`] when any tagger adapter fails.
    pub async fn resolve(&self, text: &str) -> Result<ResolvedDocument, SignalError> {
        self.metrics.resolver_runs.inc();
        let outputs = match self.collect_mentions(text).await {
            Ok(outputs) => outputs,
            Err(error) => {
                self.metrics.resolver_failures.inc();
                return Err(error);
            }
        };

        let winners = voting::majority_vote(&outputs);
        let entities = position::assign_positions(&winners, &outputs);
        self.metrics.entities_resolved.inc_by(entities.len() as f64);

        info!(
            tagger_count = self.taggers.len(),
            retained_texts = winners.len(),
            entity_count = entities.len(),
            "ensemble resolved"
        );

        Ok(ResolvedDocument {
            text: text.to_string(),
            entities,
        })
    }

    async fn collect_mentions(&self, text: &str) -> Result<Vec<Vec<EntityMention>>, SignalError> {
        let calls = self.taggers.iter().map(|tagger| {
            let tagger = Arc::clone(tagger);
            async move {
                tagger
                    .tag(text)
                    .await
                    .with_context(|| format!("tagger {} failed", tagger.name()))
            }
        });

        Ok(try_join_all(calls).await?)
    }
}
