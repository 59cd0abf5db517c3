use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub grading: Grading,
	#[serde(default)]
	pub generation: Generation,
	#[serde(default)]
	pub pipeline: Pipeline,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	/// Dimension of the `chunks.embedding` pgvector column in every tenant schema.
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
	pub web_search: WebSearchProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct WebSearchProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub path: String,
	/// Optional at load time. A missing key only fails when the web fallback actually runs.
	pub api_key: Option<String>,
	#[serde(default = "default_web_max_results")]
	pub max_results: u32,
	#[serde(default = "default_web_content_max_chars")]
	pub content_max_chars: u32,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub top_k: u32,
	pub fetch_multiplier: u32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self { top_k: 5, fetch_multiplier: 20 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Grading {
	pub preview_max_chars: u32,
}
impl Default for Grading {
	fn default() -> Self {
		Self { preview_max_chars: 800 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Generation {
	pub context_max_chars: u32,
	pub min_partial_chars: u32,
}
impl Default for Generation {
	fn default() -> Self {
		Self { context_max_chars: 12_000, min_partial_chars: 200 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pipeline {
	pub deadline_ms: u64,
}
impl Default for Pipeline {
	fn default() -> Self {
		Self { deadline_ms: 60_000 }
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
}

fn default_web_max_results() -> u32 {
	3
}

fn default_web_content_max_chars() -> u32 {
	1_000
}
