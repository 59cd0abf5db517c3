use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Citation, CragService, Error, Result};
use crag_domain::{tenant::TenantContext, text};
use crag_providers::llm::TokenUsage;

pub const MAX_QUERY_CHARS: usize = 2_000;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
	pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
	pub answer: String,
	pub sources: Vec<Citation>,
	pub query: String,
	pub usage: Option<TokenUsage>,
}

impl CragService {
	/// Validates the request and runs the pipeline under the configured deadline.
	pub async fn chat(&self, tenant: &TenantContext, req: ChatRequest) -> Result<ChatResponse> {
		let query = validate_query(&req.query)?;
		let deadline_ms = self.cfg.pipeline.deadline_ms;
		let deadline = Duration::from_millis(deadline_ms);
		let outcome = match tokio::time::timeout(deadline, self.run_pipeline(query, tenant)).await {
			Ok(outcome) => outcome?,
			Err(_) => {
				tracing::warn!(
					tenant_id = %tenant.tenant_id,
					deadline_ms,
					"Pipeline deadline exceeded."
				);

				return Err(Error::DeadlineExceeded { deadline_ms });
			},
		};

		Ok(ChatResponse {
			answer: outcome.answer,
			sources: outcome.citations,
			query: query.to_string(),
			usage: outcome.usage,
		})
	}
}

fn validate_query(raw: &str) -> Result<&str> {
	let query = raw.trim();

	if query.is_empty() {
		return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
	}
	if text::char_len(query) > MAX_QUERY_CHARS {
		return Err(Error::InvalidRequest {
			message: format!("query must be at most {MAX_QUERY_CHARS} characters."),
		});
	}

	Ok(query)
}
