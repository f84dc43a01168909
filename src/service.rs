//! Prediction service façade: the two operations the worker exposes,
//! memoized write-through.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classify::{BackendId, ClassificationResult, ClassifierDispatcher};
use crate::clients::ArticleClient;
use crate::ensemble::EnsembleResolver;
use crate::errors::SignalError;
use crate::memo::{self, Memoizer};
use crate::observability::metrics::Metrics;
use crate::render::Renderer;

/// Cached artifact of one entity extraction: the rendered markup plus the
/// resolved document it was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitiesArtifact {
    pub html: String,
    pub document: crate::ensemble::ResolvedDocument,
}

pub struct PredictionService {
    article_client: Arc<ArticleClient>,
    resolver: Arc<EnsembleResolver>,
    dispatcher: Arc<ClassifierDispatcher>,
    renderer: Arc<dyn Renderer>,
    memoizer: Memoizer,
    metrics: Arc<Metrics>,
}

impl PredictionService {
    #[must_use]
    pub fn new(
        article_client: Arc<ArticleClient>,
        resolver: Arc<EnsembleResolver>,
        dispatcher: Arc<ClassifierDispatcher>,
        renderer: Arc<dyn Renderer>,
        memoizer: Memoizer,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            article_client,
            resolver,
            dispatcher,
            renderer,
            memoizer,
            metrics,
        }
    }

    #[must_use]
    pub fn resolver(&self) -> &EnsembleResolver {
        &self.resolver
    }

    #[must_use]
    pub fn dispatcher(&self) -> &ClassifierDispatcher {
        &self.dispatcher
    }

    /// Classifies the article behind `url` with the requested backend,
    /// memoized per `(backend, url)`.
    ///
    /// # Errors
    /// Propagates [`SignalError`] from text acquisition or the backend;
    /// cache failures never fail the call.
    pub async fn classify(
        &self,
        url: &str,
        backend: BackendId,
    ) -> Result<Vec<ClassificationResult>, SignalError> {
        let key = memo::predictions_key(backend.as_str(), url);
        self.memoizer
            .get_or_compute(&key, || async {
                info!(backend = %backend, url, "prediction cache miss, querying backend");
                let text = self.fetch_text(url).await?;
                self.metrics.backend_requests.inc();
                self.dispatcher.classify(&text, backend).await
            })
            .await
    }

    /// Resolves the canonical entity set for the article behind `url`,
    /// memoized per url; the rendered markup is cached together with the
    /// document.
    ///
    /// # Errors
    /// Propagates [`SignalError`] from text acquisition or any tagger.
    pub async fn extract_entities(&self, url: &str) -> Result<EntitiesArtifact, SignalError> {
        let key = memo::entities_key(url);
        self.memoizer
            .get_or_compute(&key, || async {
                info!(url, "entities cache miss, running ensemble");
                let text = self.fetch_text(url).await?;
                let document = self.resolver.resolve(&text).await?;
                let html = self.renderer.render(&document);
                Ok(EntitiesArtifact { html, document })
            })
            .await
    }

    async fn fetch_text(&self, url: &str) -> Result<String, SignalError> {
        let key = memo::text_key(url);
        self.memoizer
            .get_or_compute(&key, || async {
                self.metrics.articles_fetched.inc();
                self.article_client.fetch_text(url).await
            })
            .await
    }
}
