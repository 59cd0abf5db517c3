use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};

use crag_config::{EmbeddingProviderConfig, WebSearchProviderConfig};
use crag_providers::{Error, embedding, web_search};

#[test]
fn builds_bearer_auth_header() {
	let headers =
		crag_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-org".to_string(), Value::Bool(true));

	let err = crag_providers::auth_headers("secret", &defaults).expect_err("Must reject.");

	assert!(matches!(err, Error::InvalidConfig { .. }));
}

#[tokio::test]
async fn web_search_without_api_key_fails_before_any_request() {
	let cfg = WebSearchProviderConfig {
		provider_id: "tavily".to_string(),
		api_base: "http://127.0.0.1:1".to_string(),
		path: "/search".to_string(),
		api_key: None,
		max_results: 3,
		content_max_chars: 1_000,
		timeout_ms: 1_000,
	};
	let err = web_search::search(&cfg, "screen tensioning", 3).await.expect_err("Must fail.");

	assert!(matches!(err, Error::MissingApiKey { ref provider } if provider == "tavily"));
}

#[tokio::test]
async fn empty_embedding_batch_makes_no_request() {
	// Nothing listens on this port, so any request would fail.
	let cfg = EmbeddingProviderConfig {
		provider_id: "openai".to_string(),
		api_base: "http://127.0.0.1:1".to_string(),
		api_key: "secret".to_string(),
		path: "/embeddings".to_string(),
		model: "text-embedding-3-small".to_string(),
		dimensions: 8,
		timeout_ms: 1_000,
		default_headers: Map::new(),
	};
	let vectors = embedding::embed_batch(&cfg, &[]).await.expect("Empty batch must succeed.");

	assert!(vectors.is_empty());
}
