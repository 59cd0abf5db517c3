pub mod filters;
pub mod keywords;
pub mod rerank;

pub use filters::QueryFilters;

use serde::Serialize;
use uuid::Uuid;

use crate::{Error, Metered, Result, pipeline::PipelineContext};
use crag_providers::llm::TokenUsage;
use crag_storage::{models::PassageRow, passages::PassageQuery};

/// One indexed chunk with the citation metadata of its parent document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Passage {
	pub chunk_id: Uuid,
	pub document_id: Uuid,
	pub doc_number: Option<String>,
	pub doc_type: Option<String>,
	pub title: Option<String>,
	pub classification: Option<String>,
	pub s3_key: String,
	pub page_number: i32,
	pub heading: Option<String>,
	pub content: String,
	/// Cosine distance to the query; lower is closer.
	pub distance: f32,
}
impl Passage {
	pub fn similarity(&self) -> f32 {
		1.0 - self.distance
	}

	/// Heading followed by content, the text the lexical ranker scores.
	pub fn ranking_text(&self) -> String {
		format!("{} {}", self.heading.as_deref().unwrap_or_default(), self.content)
	}
}
impl From<PassageRow> for Passage {
	fn from(row: PassageRow) -> Self {
		Self {
			chunk_id: row.chunk_id,
			document_id: row.document_id,
			doc_number: row.doc_number,
			doc_type: row.doc_type,
			title: row.title,
			classification: row.classification,
			s3_key: row.s3_key,
			page_number: row.page_number,
			heading: row.heading,
			content: row.content,
			distance: row.distance,
		}
	}
}

/// Hybrid retrieval: filter extraction, keyword generation and query embedding run concurrently,
/// then an over-fetched vector search is re-ranked lexically down to the tenant's top k.
pub(crate) async fn retrieve(
	ctx: &PipelineContext<'_>,
	query: &str,
) -> Result<Metered<Vec<Passage>>> {
	let (extracted, generated, embedding) = tokio::try_join!(
		async { Ok::<_, Error>(filters::extract(ctx, query).await) },
		async { Ok::<_, Error>(keywords::generate(ctx, query).await) },
		embed_query(ctx, query),
	)?;
	let usage = TokenUsage::merge(extracted.usage, generated.usage);
	let k = ctx.tenant.top_k(ctx.cfg.retrieval.top_k);
	let multiplier = ctx.tenant.fetch_multiplier(ctx.cfg.retrieval.fetch_multiplier);
	let fetch_k = k.saturating_mul(multiplier);
	let filters = extracted.value;
	let search = PassageQuery {
		embedding: &embedding,
		doc_type: filters.doc_type.as_deref(),
		doc_number: filters.doc_number.as_deref(),
		classification: filters.classification.as_deref(),
		restricted_doc_types: &ctx.tenant.settings.restricted_doc_types,
		limit: fetch_k,
	};
	let rows = ctx.index.search(&ctx.tenant.namespace, search).await?;
	let candidates = enforce_restrictions(ctx, rows.into_iter().map(Passage::from).collect());

	tracing::debug!(
		tenant_id = %ctx.tenant.tenant_id,
		candidates = candidates.len(),
		fetch_k,
		?filters,
		"Vector search finished."
	);

	let passages = rerank::rank(candidates, &generated.value, k as usize);

	Ok(Metered::new(passages, usage))
}

async fn embed_query(ctx: &PipelineContext<'_>, query: &str) -> Result<Vec<f32>> {
	let embedding = ctx.providers.embedding.embed(&ctx.cfg.providers.embedding, query).await?;

	if embedding.len() != ctx.cfg.storage.postgres.vector_dim as usize {
		return Err(Error::Provider {
			message: format!(
				"Embedding vector dimension mismatch: expected {}, got {}.",
				ctx.cfg.storage.postgres.vector_dim,
				embedding.len()
			),
		});
	}

	Ok(embedding)
}

// The store already excludes restricted types; this keeps the guarantee when it does not.
fn enforce_restrictions(ctx: &PipelineContext<'_>, candidates: Vec<Passage>) -> Vec<Passage> {
	let settings = &ctx.tenant.settings;

	candidates
		.into_iter()
		.filter(|passage| {
			let restricted = settings.is_restricted(passage.doc_type.as_deref());

			if restricted {
				tracing::warn!(
					tenant_id = %ctx.tenant.tenant_id,
					chunk_id = %passage.chunk_id,
					doc_type = passage.doc_type.as_deref().unwrap_or_default(),
					"Dropped restricted passage returned by the passage index."
				);
			}

			!restricted
		})
		.collect()
}
