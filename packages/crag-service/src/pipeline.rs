use std::fmt;

use serde::Serialize;

use crate::{
	Citation, Passage, PassageIndex, Providers, Result, generate, grade, retrieval, rewrite, web,
};
use crag_config::Config;
use crag_domain::tenant::TenantContext;
use crag_providers::llm::TokenUsage;

/// Pipeline states. Every run starts at `Retrieve` and ends at `Done` after one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	Retrieve,
	Grade,
	Rewrite,
	WebSearch,
	Generate,
	Done,
}
impl Stage {
	/// The state after this one. `is_relevant` only matters when leaving `Grade`.
	pub fn next(self, is_relevant: bool) -> Self {
		match self {
			Self::Retrieve => Self::Grade,
			Self::Grade if is_relevant => Self::Generate,
			Self::Grade => Self::Rewrite,
			Self::Rewrite => Self::WebSearch,
			Self::WebSearch => Self::Generate,
			Self::Generate | Self::Done => Self::Done,
		}
	}
}
impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Retrieve => "retrieve",
			Self::Grade => "grade",
			Self::Rewrite => "rewrite",
			Self::WebSearch => "web_search",
			Self::Generate => "generate",
			Self::Done => "done",
		};

		f.write_str(name)
	}
}

/// Which evidence the final answer was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerPath {
	Vector,
	Web,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
	pub answer: String,
	pub citations: Vec<Citation>,
	pub usage: Option<TokenUsage>,
	pub path: AnswerPath,
	/// The web search query, present only when the fallback ran.
	pub rewritten_query: Option<String>,
}

/// Everything one invocation needs, borrowed for its lifetime.
pub(crate) struct PipelineContext<'a> {
	pub(crate) cfg: &'a Config,
	pub(crate) providers: &'a Providers,
	pub(crate) index: &'a dyn PassageIndex,
	pub(crate) tenant: &'a TenantContext,
}

#[derive(Default)]
struct RunState {
	rewritten_query: Option<String>,
	passages: Vec<Passage>,
	is_relevant: bool,
	web_text: Option<String>,
	usage: Option<TokenUsage>,
}
impl RunState {
	fn add_usage(&mut self, usage: Option<TokenUsage>) {
		self.usage = TokenUsage::merge(self.usage, usage);
	}
}

pub(crate) async fn run(ctx: &PipelineContext<'_>, query: &str) -> Result<PipelineOutcome> {
	let mut state = RunState::default();
	let mut stage = Stage::Retrieve;

	loop {
		tracing::info!(tenant_id = %ctx.tenant.tenant_id, stage = %stage, "Pipeline stage.");

		match stage {
			Stage::Retrieve => {
				let retrieved = retrieval::retrieve(ctx, query).await?;

				state.add_usage(retrieved.usage);
				state.passages = retrieved.value;
			},
			Stage::Grade => {
				let graded = grade::grade(ctx, query, &state.passages).await;

				state.add_usage(graded.usage);
				state.is_relevant = graded.value;
			},
			Stage::Rewrite => {
				let rewritten = rewrite::rewrite(ctx, query).await?;

				state.add_usage(rewritten.usage);
				state.rewritten_query = Some(rewritten.value);
			},
			Stage::WebSearch => {
				let search_query = state.rewritten_query.as_deref().unwrap_or(query);

				state.web_text = Some(web::web_search(ctx, search_query).await?);
			},
			Stage::Generate => {
				let answer = generate::generate(
					ctx,
					query,
					state.is_relevant,
					&state.passages,
					state.web_text.as_deref(),
				)
				.await?;
				let path = if state.is_relevant && !state.passages.is_empty() {
					AnswerPath::Vector
				} else {
					AnswerPath::Web
				};

				state.add_usage(answer.usage);

				tracing::info!(
					tenant_id = %ctx.tenant.tenant_id,
					path = ?path,
					citations = answer.citations.len(),
					"Pipeline finished."
				);

				return Ok(PipelineOutcome {
					answer: answer.answer,
					citations: answer.citations,
					usage: state.usage,
					path,
					rewritten_query: state.rewritten_query,
				});
			},
			Stage::Done => unreachable!("Generate returns before reaching Done."),
		}

		stage = stage.next(state.is_relevant);
	}
}
