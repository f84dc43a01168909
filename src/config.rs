use std::{env, net::SocketAddr, time::Duration};

use thiserror::Error;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

/// One remote entity-tagging service, identified by a short name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggerEndpoint {
    pub name: String,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    http_bind: SocketAddr,
    article_source_host: String,
    tagger_endpoints: Vec<TaggerEndpoint>,
    bert_api_url: Option<String>,
    claude_api_key: Option<String>,
    anthropic_base_url: String,
    openai_api_key: Option<String>,
    openai_base_url: String,
    zeste_base_url: String,
    zeste_score_threshold: f32,
    zeste_top_k: usize,
    http_connect_timeout: Duration,
    http_total_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// Loads and validates worker settings from the environment.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when `ARTICLE_SOURCE_HOST` is unset or any
    /// value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_bind = parse_socket_addr("SIGNAL_WORKER_HTTP_BIND", "0.0.0.0:9105")?;
        let article_source_host = env_var("ARTICLE_SOURCE_HOST")?;
        let tagger_endpoints = parse_tagger_endpoints("SIGNAL_TAGGER_ENDPOINTS")?;

        let bert_api_url = env::var("BERT_API_URL").ok();
        let claude_api_key = env::var("CLAUDE_API_KEY").ok();
        let anthropic_base_url = env::var("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com/".to_string());
        let openai_api_key = env::var("OPENAI_API_KEY").ok();
        let openai_base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/".to_string());
        let zeste_base_url = env::var("ZESTE_BASE_URL")
            .unwrap_or_else(|_| "https://zeste.tools.eurecom.fr/".to_string());

        let zeste_score_threshold = parse_f64("ZESTE_SCORE_THRESHOLD", 0.11)? as f32;
        let zeste_top_k = parse_usize("ZESTE_TOP_K", 3)?;

        let http_connect_timeout = parse_duration_ms("HTTP_CONNECT_TIMEOUT_MS", 3000)?;
        let http_total_timeout = parse_duration_ms("HTTP_TOTAL_TIMEOUT_MS", 30000)?;

        Ok(Self {
            http_bind,
            article_source_host,
            tagger_endpoints,
            bert_api_url,
            claude_api_key,
            anthropic_base_url,
            openai_api_key,
            openai_base_url,
            zeste_base_url,
            zeste_score_threshold,
            zeste_top_k,
            http_connect_timeout,
            http_total_timeout,
        })
    }

    #[must_use]
    pub fn http_bind(&self) -> SocketAddr {
        self.http_bind
    }

    #[must_use]
    pub fn article_source_host(&self) -> &str {
        &self.article_source_host
    }

    #[must_use]
    pub fn tagger_endpoints(&self) -> &[TaggerEndpoint] {
        &self.tagger_endpoints
    }

    #[must_use]
    pub fn bert_api_url(&self) -> Option<&str> {
        self.bert_api_url.as_deref()
    }

    #[must_use]
    pub fn claude_api_key(&self) -> Option<&str> {
        self.claude_api_key.as_deref()
    }

    #[must_use]
    pub fn anthropic_base_url(&self) -> &str {
        &self.anthropic_base_url
    }

    #[must_use]
    pub fn openai_api_key(&self) -> Option<&str> {
        self.openai_api_key.as_deref()
    }

    #[must_use]
    pub fn openai_base_url(&self) -> &str {
        &self.openai_base_url
    }

    #[must_use]
    pub fn zeste_base_url(&self) -> &str {
        &self.zeste_base_url
    }

    #[must_use]
    pub fn zeste_score_threshold(&self) -> f32 {
        self.zeste_score_threshold
    }

    #[must_use]
    pub fn zeste_top_k(&self) -> usize {
        self.zeste_top_k
    }

    #[must_use]
    pub fn http_connect_timeout(&self) -> Duration {
        self.http_connect_timeout
    }

    #[must_use]
    pub fn http_total_timeout(&self) -> Duration {
        self.http_total_timeout
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_socket_addr(name: &'static str, default: &str) -> Result<SocketAddr, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<SocketAddr>()
        .map_err(|error| ConfigError::Invalid {
            name,
            source: anyhow::Error::new(error),
        })
}

fn parse_duration_ms(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let millis = raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    Ok(Duration::from_millis(millis))
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<f64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

/// Parses `name=base_url` pairs separated by commas, e.g.
/// `camembert=http://tagger-a:9200,flair=http://tagger-b:9201`.
fn parse_tagger_endpoints(name: &'static str) -> Result<Vec<TaggerEndpoint>, ConfigError> {
    let raw = env::var(name).unwrap_or_default();
    let mut endpoints = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((tagger_name, base_url)) = entry.split_once('=') else {
            return Err(ConfigError::Invalid {
                name,
                source: anyhow::anyhow!("expected name=url, got: {entry}"),
            });
        };
        let tagger_name = tagger_name.trim();
        let base_url = base_url.trim();
        if tagger_name.is_empty() || base_url.is_empty() {
            return Err(ConfigError::Invalid {
                name,
                source: anyhow::anyhow!("expected name=url, got: {entry}"),
            });
        }
        endpoints.push(TaggerEndpoint {
            name: tagger_name.to_string(),
            base_url: base_url.to_string(),
        });
    }
    Ok(endpoints)
}
