use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
	pub title: String,
	pub url: String,
	pub content: String,
}

/// Queries the configured web search API.
///
/// A missing `api_key` is an error rather than an empty result set: callers reach this only after
/// indexed retrieval was judged insufficient and must learn that the fallback is unusable.
pub async fn search(
	cfg: &crag_config::WebSearchProviderConfig,
	query: &str,
	max_results: u32,
) -> Result<Vec<WebResult>> {
	let api_key = cfg
		.api_key
		.as_deref()
		.filter(|key| !key.trim().is_empty())
		.ok_or_else(|| Error::MissingApiKey { provider: cfg.provider_id.clone() })?;
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = crate::endpoint(&cfg.api_base, &cfg.path);
	let body = serde_json::json!({
		"query": query,
		"max_results": max_results,
		"search_depth": "basic",
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(api_key, &Map::new())?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_search_response(json, max_results as usize)
}

fn parse_search_response(json: Value, max_results: usize) -> Result<Vec<WebResult>> {
	let results = json.get("results").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse {
			message: "Web search response is missing results array.".to_string(),
		}
	})?;
	let mut out = Vec::with_capacity(results.len().min(max_results));

	for item in results.iter().take(max_results) {
		let field =
			|key: &str| item.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
		let result =
			WebResult { title: field("title"), url: field("url"), content: field("content") };

		if result.url.is_empty() && result.content.is_empty() {
			tracing::debug!("Skipping empty web search result.");

			continue;
		}

		out.push(result);
	}

	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_and_caps_results() {
		let json = serde_json::json!({
			"results": [
				{ "title": "A", "url": "https://a.example", "content": "alpha" },
				{ "title": "B", "url": "https://b.example", "content": "beta" },
				{ "title": "C", "url": "https://c.example", "content": "gamma" }
			]
		});
		let results = parse_search_response(json, 2).expect("parse failed");

		assert_eq!(results.len(), 2);
		assert_eq!(results[1].title, "B");
	}

	#[test]
	fn skips_hollow_results() {
		let json = serde_json::json!({ "results": [{ "title": "only a title" }] });

		assert!(parse_search_response(json, 3).expect("parse failed").is_empty());
	}

	#[test]
	fn missing_results_array_is_an_error() {
		let json = serde_json::json!({ "answer": "x" });

		assert!(matches!(parse_search_response(json, 3), Err(Error::InvalidResponse { .. })));
	}
}
