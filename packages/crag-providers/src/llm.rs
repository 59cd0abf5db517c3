use std::{ops::Add, time::Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
	pub input_tokens: u64,
	pub output_tokens: u64,
	pub total_tokens: u64,
}
impl TokenUsage {
	/// Sums two optional counters; the result is absent only when both sides are.
	pub fn merge(acc: Option<Self>, next: Option<Self>) -> Option<Self> {
		match (acc, next) {
			(Some(a), Some(b)) => Some(a + b),
			(a, b) => a.or(b),
		}
	}
}
impl Add for TokenUsage {
	type Output = Self;

	fn add(self, rhs: Self) -> Self {
		Self {
			input_tokens: self.input_tokens + rhs.input_tokens,
			output_tokens: self.output_tokens + rhs.output_tokens,
			total_tokens: self.total_tokens + rhs.total_tokens,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
	#[default]
	Text,
	JsonObject,
}

#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
	pub system_prompt: &'a str,
	pub user_message: &'a str,
	pub response_format: ResponseFormat,
}
impl<'a> GenerateRequest<'a> {
	pub fn text(system_prompt: &'a str, user_message: &'a str) -> Self {
		Self { system_prompt, user_message, response_format: ResponseFormat::Text }
	}

	pub fn json(system_prompt: &'a str, user_message: &'a str) -> Self {
		Self { system_prompt, user_message, response_format: ResponseFormat::JsonObject }
	}
}

#[derive(Debug, Clone)]
pub struct Generation {
	pub text: String,
	pub usage: Option<TokenUsage>,
}

pub async fn generate(
	cfg: &crag_config::LlmProviderConfig,
	request: &GenerateRequest<'_>,
) -> Result<Generation> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = crate::endpoint(&cfg.api_base, &cfg.path);
	let body = build_chat_body(cfg, request);
	let started = Instant::now();
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let generation = parse_chat_response(json)?;
	let usage = generation.usage.unwrap_or_default();

	tracing::debug!(
		model = %cfg.model,
		input_tokens = usage.input_tokens,
		output_tokens = usage.output_tokens,
		latency_ms = started.elapsed().as_millis() as u64,
		"LLM generation finished."
	);

	Ok(generation)
}

fn build_chat_body(cfg: &crag_config::LlmProviderConfig, request: &GenerateRequest<'_>) -> Value {
	let mut body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": [
			{ "role": "system", "content": request.system_prompt },
			{ "role": "user", "content": request.user_message },
		],
	});

	if request.response_format == ResponseFormat::JsonObject {
		body["response_format"] = serde_json::json!({ "type": "json_object" });
	}

	body
}

fn parse_chat_response(json: Value) -> Result<Generation> {
	let text = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Chat response is missing message content.".to_string(),
		})?
		.to_string();
	let usage = json.get("usage").and_then(parse_usage);

	Ok(Generation { text, usage })
}

fn parse_usage(usage: &Value) -> Option<TokenUsage> {
	let input_tokens = usage.get("prompt_tokens").and_then(Value::as_u64)?;
	let output_tokens = usage.get("completion_tokens").and_then(Value::as_u64)?;
	let total_tokens = usage
		.get("total_tokens")
		.and_then(Value::as_u64)
		.unwrap_or(input_tokens + output_tokens);

	Some(TokenUsage { input_tokens, output_tokens, total_tokens })
}
