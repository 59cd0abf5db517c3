pub mod chat;
pub mod documents;
pub mod generate;
pub mod grade;
pub mod pipeline;
pub mod retrieval;
pub mod rewrite;
pub mod tenants;
pub mod time_serde;
pub mod web;

mod error;

pub use chat::{ChatRequest, ChatResponse, MAX_QUERY_CHARS};
pub use documents::{DocumentItem, ListDocumentsRequest, ListDocumentsResponse};
pub use error::{Error, Result};
pub use generate::{Answer, Citation};
pub use pipeline::{AnswerPath, PipelineOutcome, Stage};
pub use retrieval::{Passage, QueryFilters};

use std::{future::Future, pin::Pin, sync::Arc};

use sqlx::PgPool;

use crag_config::{Config, EmbeddingProviderConfig, LlmProviderConfig, WebSearchProviderConfig};
use crag_domain::tenant::{TenantContext, TenantNamespace};
use crag_providers::{
	embedding,
	llm::{self, GenerateRequest, Generation, TokenUsage},
	web_search::{self, WebResult},
};
use crag_storage::{
	db::Db,
	models::PassageRow,
	passages::{self, PassageQuery},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, crag_providers::Result<Vec<f32>>>;
}

pub trait LlmProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: GenerateRequest<'a>,
	) -> BoxFuture<'a, crag_providers::Result<Generation>>;
}

pub trait WebSearchProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a WebSearchProviderConfig,
		query: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, crag_providers::Result<Vec<WebResult>>>;
}

/// Tenant-scoped similarity search over indexed chunks.
///
/// Implementations must only read `namespace` and must honor `query.restricted_doc_types`
/// regardless of the other filters.
pub trait PassageIndex
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		namespace: &'a TenantNamespace,
		query: PassageQuery<'a>,
	) -> BoxFuture<'a, crag_storage::Result<Vec<PassageRow>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub llm: Arc<dyn LlmProvider>,
	pub web_search: Arc<dyn WebSearchProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		llm: Arc<dyn LlmProvider>,
		web_search: Arc<dyn WebSearchProvider>,
	) -> Self {
		Self { embedding, llm, web_search }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), llm: provider.clone(), web_search: provider }
	}
}

/// [`PassageIndex`] backed by the pgvector tables of each tenant schema.
pub struct PgPassageIndex {
	pool: PgPool,
}
impl PgPassageIndex {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}
}
impl PassageIndex for PgPassageIndex {
	fn search<'a>(
		&'a self,
		namespace: &'a TenantNamespace,
		query: PassageQuery<'a>,
	) -> BoxFuture<'a, crag_storage::Result<Vec<PassageRow>>> {
		Box::pin(async move { passages::search_passages(&self.pool, namespace, &query).await })
	}
}

pub struct CragService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
	pub index: Arc<dyn PassageIndex>,
}
impl CragService {
	pub fn new(cfg: Config, db: Db) -> Self {
		let index = Arc::new(PgPassageIndex::new(db.pool.clone()));

		Self { cfg, db, providers: Providers::default(), index }
	}

	pub fn with_parts(
		cfg: Config,
		db: Db,
		providers: Providers,
		index: Arc<dyn PassageIndex>,
	) -> Self {
		Self { cfg, db, providers, index }
	}

	/// Runs the corrective pipeline once for `query` under `tenant`, without a deadline.
	pub async fn run_pipeline(
		&self,
		query: &str,
		tenant: &TenantContext,
	) -> Result<PipelineOutcome> {
		let ctx = pipeline::PipelineContext {
			cfg: &self.cfg,
			providers: &self.providers,
			index: self.index.as_ref(),
			tenant,
		};

		pipeline::run(&ctx, query).await
	}
}

/// A value produced by zero or more LLM calls together with their combined usage.
#[derive(Debug, Clone)]
pub(crate) struct Metered<T> {
	pub(crate) value: T,
	pub(crate) usage: Option<TokenUsage>,
}
impl<T> Metered<T> {
	pub(crate) fn new(value: T, usage: Option<TokenUsage>) -> Self {
		Self { value, usage }
	}

	pub(crate) fn free(value: T) -> Self {
		Self { value, usage: None }
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, crag_providers::Result<Vec<f32>>> {
		Box::pin(embedding::embed(cfg, text))
	}
}
impl LlmProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: GenerateRequest<'a>,
	) -> BoxFuture<'a, crag_providers::Result<Generation>> {
		Box::pin(async move { llm::generate(cfg, &request).await })
	}
}
impl WebSearchProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a WebSearchProviderConfig,
		query: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, crag_providers::Result<Vec<WebResult>>> {
		Box::pin(web_search::search(cfg, query, max_results))
	}
}
