//! Topic classification over interchangeable prediction backends.

pub mod bert;
pub mod completion;
pub mod taxonomy;
pub mod zeste;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::SignalError;

/// The fixed set of classification backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendId {
    Bert,
    ClaudeV1,
    Gpt4,
    Zeste,
}

impl BackendId {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bert => "bert",
            Self::ClaudeV1 => "claude-v1",
            Self::Gpt4 => "gpt-4",
            Self::Zeste => "zeste",
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendId {
    type Err = SignalError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "bert" => Ok(Self::Bert),
            "claude-v1" => Ok(Self::ClaudeV1),
            "gpt-4" => Ok(Self::Gpt4),
            "zeste" => Ok(Self::Zeste),
            _ => Err(SignalError::BackendUnimplemented(raw.to_string())),
        }
    }
}

/// One scored topic label, always drawn from the canonical taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    pub score: f32,
}

/// Capability contract over one classification backend. Implementations
/// own their vocabulary translation: labels crossing this boundary are
/// always canonical.
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Vec<ClassificationResult>, SignalError>;
}

/// Immutable registry of classification backends, built once at startup.
#[derive(Default)]
pub struct ClassifierDispatcher {
    backends: FxHashMap<BackendId, Arc<dyn ClassifierBackend>>,
}

impl ClassifierDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: BackendId, backend: Arc<dyn ClassifierBackend>) {
        self.backends.insert(id, backend);
    }

    #[must_use]
    pub fn is_registered(&self, id: BackendId) -> bool {
        self.backends.contains_key(&id)
    }

    /// Names of every registered backend, sorted for stable output.
    #[must_use]
    pub fn registered_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.backends.keys().map(|id| id.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Classifies `text` with the requested backend.
    ///
    /// # Errors
    /// Returns [`SignalError::BackendUnimplemented`] when the backend is
    /// not registered, or whatever the backend itself raises.
    pub async fn classify(
        &self,
        text: &str,
        backend: BackendId,
    ) -> Result<Vec<ClassificationResult>, SignalError> {
        let Some(handler) = self.backends.get(&backend) else {
            return Err(SignalError::BackendUnimplemented(backend.to_string()));
        };

        let predictions = handler.classify(text).await?;
        info!(
            backend = %backend,
            prediction_count = predictions.len(),
            "classification completed"
        );
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticBackend(Vec<ClassificationResult>);

    #[async_trait]
    impl ClassifierBackend for StaticBackend {
        async fn classify(&self, _text: &str) -> Result<Vec<ClassificationResult>, SignalError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn backend_ids_round_trip_through_strings() {
        for id in [
            BackendId::Bert,
            BackendId::ClaudeV1,
            BackendId::Gpt4,
            BackendId::Zeste,
        ] {
            assert_eq!(id.as_str().parse::<BackendId>().expect("parses"), id);
        }
    }

    #[test]
    fn unknown_backend_string_is_unimplemented() {
        let error = "markov-chain"
            .parse::<BackendId>()
            .expect_err("unknown backend must fail");

        assert!(matches!(error, SignalError::BackendUnimplemented(name) if name == "markov-chain"));
    }

    #[tokio::test]
    async fn dispatcher_routes_to_registered_backend() {
        let mut dispatcher = ClassifierDispatcher::new();
        dispatcher.register(
            BackendId::Bert,
            Arc::new(StaticBackend(vec![ClassificationResult {
                label: "Investissement".to_string(),
                score: 1.0,
            }])),
        );

        let predictions = dispatcher
            .classify("texte", BackendId::Bert)
            .await
            .expect("classify succeeds");

        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].label, "Investissement");
    }

    #[tokio::test]
    async fn dispatcher_rejects_unregistered_backend() {
        let dispatcher = ClassifierDispatcher::new();

        let error = dispatcher
            .classify("texte", BackendId::Gpt4)
            .await
            .expect_err("unregistered backend must fail");

        assert!(matches!(error, SignalError::BackendUnimplemented(name) if name == "gpt-4"));
    }
}
