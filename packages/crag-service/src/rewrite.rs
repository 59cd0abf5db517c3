use crate::{Metered, Result, pipeline::PipelineContext};
use crag_domain::text;
use crag_providers::llm::GenerateRequest;

const SYSTEM_PROMPT: &str = "\
You rewrite search queries for a web search engine.
The documents indexed for this question did not answer it.
Rewrite the question into a more specific, keyword-rich search query that keeps its original intent.
Return ONLY the rewritten query on a single line, without quotes, labels or explanation.";

/// Reformulates `query` for web search. Model failures propagate.
pub(crate) async fn rewrite(ctx: &PipelineContext<'_>, query: &str) -> Result<Metered<String>> {
	let request = GenerateRequest::text(SYSTEM_PROMPT, query);
	let generation = ctx.providers.llm.generate(&ctx.cfg.providers.llm, request).await?;
	let rewritten = clean_rewrite(&generation.text);

	if rewritten.is_empty() {
		tracing::warn!(
			tenant_id = %ctx.tenant.tenant_id,
			"Query rewrite came back empty. Searching with the original query."
		);

		return Ok(Metered::new(query.to_string(), generation.usage));
	}

	tracing::info!(tenant_id = %ctx.tenant.tenant_id, rewritten, "Query rewritten.");

	Ok(Metered::new(rewritten.to_string(), generation.usage))
}

pub(crate) fn clean_rewrite(raw: &str) -> &str {
	text::strip_enclosing_quotes(raw)
}
