use std::sync::Arc;

use anyhow::Result;
use axum::Router;

use crate::{
    api,
    classify::{
        BackendId, ClassifierDispatcher, bert::BertClassifierClient,
        completion::{ClaudeCompletionClient, GptCompletionClient},
        taxonomy::Taxonomy,
        zeste::ZesteClient,
    },
    clients::ArticleClient,
    config::Config,
    ensemble::EnsembleResolver,
    memo::{InMemoryMemoStore, MemoStore, Memoizer},
    observability::Telemetry,
    render::MarkupRenderer,
    service::PredictionService,
    taggers::{TaggerAdapter, http::HttpTaggerClient},
};

#[derive(Clone)]
pub(crate) struct AppState {
    registry: Arc<ComponentRegistry>,
}

pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
    service: Arc<PredictionService>,
}

impl AppState {
    pub(crate) fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.registry.telemetry
    }

    pub(crate) fn service(&self) -> Arc<PredictionService> {
        Arc::clone(&self.registry.service)
    }

    pub(crate) fn registered_backends(&self) -> Vec<&'static str> {
        self.registry.service.dispatcher().registered_backends()
    }
}

impl ComponentRegistry {
    /// Wires configuration and dependencies into the shared application
    /// registry.
    ///
    /// Completion backends are registered only when their API keys are
    /// configured; the zero-shot backend is always available.
    ///
    /// # Errors
    /// Returns an error when telemetry initialization, taxonomy
    /// validation, or HTTP client construction fails.
    pub fn build(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let telemetry = Telemetry::new()?;
        let metrics = telemetry.metrics_arc();

        let taxonomy = Arc::new(Taxonomy::french_business_news()?);

        let store: Arc<dyn MemoStore> = Arc::new(InMemoryMemoStore::new());
        let memoizer = Memoizer::new(store, Arc::clone(&metrics));

        let article_client = Arc::new(ArticleClient::new(
            config.article_source_host(),
            config.http_connect_timeout(),
            config.http_total_timeout(),
        )?);

        let mut taggers: Vec<Arc<dyn TaggerAdapter>> = Vec::new();
        for endpoint in config.tagger_endpoints() {
            taggers.push(Arc::new(HttpTaggerClient::new(
                endpoint.name.clone(),
                &endpoint.base_url,
                config.http_connect_timeout(),
                config.http_total_timeout(),
            )?));
        }
        let resolver = Arc::new(EnsembleResolver::new(taggers, Arc::clone(&metrics)));

        let mut dispatcher = ClassifierDispatcher::new();
        if let Some(base_url) = config.bert_api_url() {
            dispatcher.register(
                BackendId::Bert,
                Arc::new(BertClassifierClient::new(
                    base_url,
                    config.http_connect_timeout(),
                    config.http_total_timeout(),
                )?),
            );
        }
        if let Some(api_key) = config.claude_api_key() {
            dispatcher.register(
                BackendId::ClaudeV1,
                Arc::new(ClaudeCompletionClient::new(
                    config.anthropic_base_url(),
                    api_key,
                    Arc::clone(&taxonomy),
                    config.http_connect_timeout(),
                    config.http_total_timeout(),
                )?),
            );
        }
        if let Some(api_key) = config.openai_api_key() {
            dispatcher.register(
                BackendId::Gpt4,
                Arc::new(GptCompletionClient::new(
                    config.openai_base_url(),
                    api_key,
                    Arc::clone(&taxonomy),
                    config.http_connect_timeout(),
                    config.http_total_timeout(),
                )?),
            );
        }
        dispatcher.register(
            BackendId::Zeste,
            Arc::new(ZesteClient::new(
                config.zeste_base_url(),
                Arc::clone(&taxonomy),
                Some(config.zeste_score_threshold()),
                Some(config.zeste_top_k()),
                config.http_connect_timeout(),
                config.http_total_timeout(),
            )?),
        );

        let service = Arc::new(PredictionService::new(
            article_client,
            resolver,
            Arc::new(dispatcher),
            Arc::new(MarkupRenderer::new()),
            memoizer,
            metrics,
        ));

        Ok(Self {
            config,
            telemetry,
            service,
        })
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }
}

pub fn build_router(registry: ComponentRegistry) -> Router {
    let state = AppState::new(registry);
    api::router(state)
}
