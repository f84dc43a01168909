use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::app::AppState;
use crate::ensemble::CanonicalEntity;

use super::{ErrorBody, error_response};

#[derive(Debug, Deserialize)]
pub(crate) struct EntitiesRequest {
    url: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct EntitiesResponse {
    html: String,
    entities: Vec<CanonicalEntity>,
}

pub(crate) async fn entities(
    State(state): State<AppState>,
    Json(request): Json<EntitiesRequest>,
) -> Result<Json<EntitiesResponse>, (StatusCode, Json<ErrorBody>)> {
    let artifact = state
        .service()
        .extract_entities(&request.url)
        .await
        .map_err(|error| {
            warn!(url = %request.url, error = %error, "entity extraction failed");
            error_response(&error)
        })?;

    Ok(Json(EntitiesResponse {
        html: artifact.html,
        entities: artifact.document.entities,
    }))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::{
        app::{ComponentRegistry, build_router},
        config::{Config, ENV_MUTEX},
    };

    fn load_config(article_host: &str, tagger_endpoints: Option<&str>) -> Config {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        // SAFETY: test code adjusts deterministic environment state sequentially.
        unsafe {
            std::env::set_var("ARTICLE_SOURCE_HOST", article_host);
            std::env::remove_var("BERT_API_URL");
            std::env::remove_var("CLAUDE_API_KEY");
            std::env::remove_var("OPENAI_API_KEY");
            match tagger_endpoints {
                Some(csv) => std::env::set_var("SIGNAL_TAGGER_ENDPOINTS", csv),
                None => std::env::remove_var("SIGNAL_TAGGER_ENDPOINTS"),
            }
        }
        Config::from_env().expect("config loads")
    }

    #[tokio::test]
    async fn entities_returns_markup_and_resolved_entities() {
        let article_server = MockServer::start().await;
        let tagger_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/article/9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "body": [{ "value": "<p>Renault recrute.</p>" }]
            })))
            .mount(&article_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/tag"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "entities": [
                    { "text": "Renault", "label": "ORG", "start": 0, "end": 7 }
                ]
            })))
            .mount(&tagger_server)
            .await;

        let endpoints = format!("camembert={}", tagger_server.uri());
        let config = load_config("127.0.0.1", Some(&endpoints));
        let registry = ComponentRegistry::build(config).expect("registry builds");
        let app = build_router(registry);

        let payload = serde_json::json!({
            "url": format!("{}/article/9", article_server.uri()),
        });
        let request = Request::post("/v1/entities")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request builds");

        let response = app.oneshot(request).await.expect("request succeeds");

        assert_eq!(response.status(), StatusCode::OK);
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).expect("valid json");
        assert_eq!(body["entities"][0]["text"], "Renault");
        assert_eq!(body["entities"][0]["label"], "ORG");
        assert!(
            body["html"]
                .as_str()
                .expect("html string")
                .contains("data-label=\"ORG\"")
        );
    }

    #[tokio::test]
    async fn foreign_url_returns_bad_request() {
        let config = load_config("www.lejournaldesentreprises.com", None);
        let registry = ComponentRegistry::build(config).expect("registry builds");
        let app = build_router(registry);

        let payload = serde_json::json!({ "url": "https://evil.example.com/article/1" });
        let request = Request::post("/v1/entities")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request builds");

        let response = app.oneshot(request).await.expect("request succeeds");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
