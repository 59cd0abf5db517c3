use serde::{Deserialize, Serialize};

use crate::{Passage, Result, pipeline::PipelineContext};
use crag_domain::{
	tenant::TenantContext,
	text::{self, ELLIPSIS},
};
use crag_providers::llm::{GenerateRequest, TokenUsage};

pub const NO_CONTEXT: &str = "No relevant documents or web results found.";

const BLOCK_SEPARATOR: &str = "\n\n";

/// A tenant document the answer may cite, numbered by its position in the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
	pub doc_number: Option<String>,
	pub title: Option<String>,
	pub page_number: i32,
	pub s3_key: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub score: Option<f32>,
}
impl From<&Passage> for Citation {
	fn from(passage: &Passage) -> Self {
		Self {
			doc_number: passage.doc_number.clone(),
			title: passage.title.clone(),
			page_number: passage.page_number,
			s3_key: passage.s3_key.clone(),
			score: Some(passage.similarity()),
		}
	}
}

#[derive(Debug, Clone)]
pub struct Answer {
	pub answer: String,
	pub citations: Vec<Citation>,
	pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Copy)]
pub struct ContextBudget {
	pub max_chars: usize,
	pub min_partial_chars: usize,
}

/// Packs passage blocks into at most `budget.max_chars` characters plus one ellipsis.
///
/// Whole blocks go in while they fit. The first block that does not fit is cut and kept only when
/// more than `budget.min_partial_chars` characters remain. Each included block yields one citation.
pub fn build_context(passages: &[Passage], budget: ContextBudget) -> (String, Vec<Citation>) {
	let separator_len = text::char_len(BLOCK_SEPARATOR);
	let mut context = String::new();
	let mut used = 0;
	let mut citations = Vec::new();

	for (i, passage) in passages.iter().enumerate() {
		let block = format_block(i + 1, passage);
		let block_len = text::char_len(&block);
		let gap = if context.is_empty() { 0 } else { separator_len };

		if used + gap + block_len <= budget.max_chars {
			if gap > 0 {
				context.push_str(BLOCK_SEPARATOR);
			}

			context.push_str(&block);
			citations.push(Citation::from(passage));

			used += gap + block_len;

			continue;
		}

		let remaining = budget.max_chars.saturating_sub(used + gap);

		if remaining > budget.min_partial_chars {
			if gap > 0 {
				context.push_str(BLOCK_SEPARATOR);
			}

			context.push_str(&text::truncate_chars(&block, remaining, ELLIPSIS));
			citations.push(Citation::from(passage));
		}

		break;
	}

	(context, citations)
}

/// Answers `query` from indexed passages when they were judged relevant, otherwise from the web
/// fallback text. Only the passage path produces citations.
pub(crate) async fn generate(
	ctx: &PipelineContext<'_>,
	query: &str,
	is_relevant: bool,
	passages: &[Passage],
	web_text: Option<&str>,
) -> Result<Answer> {
	let (context, citations) = if is_relevant && !passages.is_empty() {
		let budget = ContextBudget {
			max_chars: ctx.cfg.generation.context_max_chars as usize,
			min_partial_chars: ctx.cfg.generation.min_partial_chars as usize,
		};

		build_context(passages, budget)
	} else {
		let context = web_text
			.map(str::trim)
			.filter(|text| !text.is_empty())
			.unwrap_or(NO_CONTEXT)
			.to_string();

		(context, Vec::new())
	};
	let system_prompt = build_system_prompt(ctx.tenant);
	let user_message = format!("Context:\n{context}\n\nQuestion: {query}");
	let request = GenerateRequest::text(&system_prompt, &user_message);
	let generation = ctx.providers.llm.generate(&ctx.cfg.providers.llm, request).await?;

	Ok(Answer { answer: generation.text, citations, usage: generation.usage })
}

fn format_block(index: usize, passage: &Passage) -> String {
	let mut label = format!("[{index}] {}", passage.doc_number.as_deref().unwrap_or("Unknown"));

	if let Some(title) = passage.title.as_deref() {
		label.push_str(&format!(" - {title}"));
	}

	label.push_str(&format!(" (page {})", passage.page_number));

	match passage.heading.as_deref().filter(|heading| !heading.trim().is_empty()) {
		Some(heading) => format!("{label}\n{heading}\n{}", passage.content),
		None => format!("{label}\n{}", passage.content),
	}
}

fn build_system_prompt(tenant: &TenantContext) -> String {
	format!(
		"\
You are the document assistant for {}. Domain: {}.
Answer the question using ONLY the information in the context.
Cite supporting context blocks inline with their bracketed numbers, for example [1] or [2].
If the context does not contain enough information to answer, say so explicitly instead of guessing.",
		tenant.name,
		tenant.domain(),
	)
}
