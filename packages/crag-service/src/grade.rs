use serde::Deserialize;

use crate::{Metered, Passage, pipeline::PipelineContext};
use crag_domain::text::{self, ELLIPSIS};
use crag_providers::llm::GenerateRequest;

const SYSTEM_PROMPT: &str = "\
You grade whether retrieved document passages contain enough information to answer a question.
Return ONLY valid JSON: {\"is_relevant\": true or false, \"reasoning\": \"one short sentence\"}
Answer true when the passages, taken together, directly address the question.
Answer false when they are off-topic or only mention the subject in passing.";

#[derive(Debug, Clone, Deserialize)]
pub struct GradeDecision {
	pub is_relevant: bool,
	pub reasoning: String,
}

/// Judges whether `passages` are sufficient evidence for `query`.
///
/// No passages is always `false` and costs no model call. Call and parse failures count as
/// relevant, so a broken grader never pushes traffic onto the web fallback.
pub(crate) async fn grade(
	ctx: &PipelineContext<'_>,
	query: &str,
	passages: &[Passage],
) -> Metered<bool> {
	if passages.is_empty() {
		return Metered::free(false);
	}

	let preview = build_preview(passages, ctx.cfg.grading.preview_max_chars as usize);
	let user_message = format!("Question: {query}\n\nRetrieved passages:\n{preview}");
	let request = GenerateRequest::json(SYSTEM_PROMPT, &user_message);
	let generation = match ctx.providers.llm.generate(&ctx.cfg.providers.llm, request).await {
		Ok(generation) => generation,
		Err(err) => {
			tracing::warn!(
				tenant_id = %ctx.tenant.tenant_id,
				error = %err,
				"Relevance grading failed. Treating passages as relevant."
			);

			return Metered::free(true);
		},
	};

	match parse_decision(&generation.text) {
		Ok(decision) => {
			tracing::info!(
				tenant_id = %ctx.tenant.tenant_id,
				is_relevant = decision.is_relevant,
				reasoning = decision.reasoning.as_str(),
				"Relevance graded."
			);

			Metered::new(decision.is_relevant, generation.usage)
		},
		Err(err) => {
			tracing::warn!(
				tenant_id = %ctx.tenant.tenant_id,
				error = %err,
				"Relevance grader returned malformed output. Treating passages as relevant."
			);

			Metered::new(true, generation.usage)
		},
	}
}

pub(crate) fn parse_decision(raw: &str) -> serde_json::Result<GradeDecision> {
	serde_json::from_str(raw.trim())
}

fn build_preview(passages: &[Passage], max_chars: usize) -> String {
	passages
		.iter()
		.enumerate()
		.map(|(i, passage)| {
			format!(
				"[{}] {} | {}\n{}",
				i + 1,
				passage.doc_number.as_deref().unwrap_or("unknown"),
				passage.heading.as_deref().unwrap_or_default(),
				text::truncate_chars(&passage.content, max_chars, ELLIPSIS),
			)
		})
		.collect::<Vec<_>>()
		.join("\n\n")
}
