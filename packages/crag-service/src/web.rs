use crate::{Result, pipeline::PipelineContext};
use crag_domain::text::{self, ELLIPSIS};
use crag_providers::web_search::WebResult;

pub const NO_WEB_RESULTS: &str = "No web search results found.";

/// Searches the web for `query` and renders the hits as numbered context blocks.
///
/// A missing API key surfaces as [`crate::Error::Configuration`].
pub(crate) async fn web_search(ctx: &PipelineContext<'_>, query: &str) -> Result<String> {
	let cfg = &ctx.cfg.providers.web_search;
	let results = ctx.providers.web_search.search(cfg, query, cfg.max_results).await?;

	tracing::info!(
		tenant_id = %ctx.tenant.tenant_id,
		results = results.len(),
		"Web fallback search finished."
	);

	Ok(format_results(&results, cfg.content_max_chars as usize))
}

pub fn format_results(results: &[WebResult], content_max_chars: usize) -> String {
	if results.is_empty() {
		return NO_WEB_RESULTS.to_string();
	}

	results
		.iter()
		.enumerate()
		.map(|(i, result)| {
			format!(
				"[{}] {}\nURL: {}\n{}",
				i + 1,
				result.title,
				result.url,
				text::truncate_chars(&result.content, content_max_chars, ELLIPSIS),
			)
		})
		.collect::<Vec<_>>()
		.join("\n\n")
}
