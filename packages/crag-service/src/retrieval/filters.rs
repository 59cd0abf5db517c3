use serde::{Deserialize, Serialize};

use crate::{Metered, pipeline::PipelineContext};
use crag_domain::tenant::TenantSettings;
use crag_providers::llm::GenerateRequest;

/// Optional metadata constraints. An absent field leaves that dimension unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryFilters {
	pub doc_type: Option<String>,
	pub doc_number: Option<String>,
	pub classification: Option<String>,
}
impl QueryFilters {
	pub fn is_empty(&self) -> bool {
		self.doc_type.is_none() && self.doc_number.is_none() && self.classification.is_none()
	}

	/// Drops blank values and maps `doc_type` onto the tenant's vocabulary.
	pub fn canonicalize(self, settings: &TenantSettings) -> Self {
		let non_blank = |value: Option<String>| {
			value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
		};
		let doc_type = non_blank(self.doc_type).and_then(|doc_type| {
			let canonical = settings.canonical_doc_type(&doc_type).map(str::to_string);

			if canonical.is_none() {
				tracing::debug!(
					doc_type = doc_type.as_str(),
					"Dropped extracted doc_type outside the tenant vocabulary."
				);
			}

			canonical
		});

		Self {
			doc_type,
			doc_number: non_blank(self.doc_number),
			classification: non_blank(self.classification),
		}
	}
}

/// Extracts metadata filters from `query`. Any call or parse failure yields empty filters.
pub(crate) async fn extract(ctx: &PipelineContext<'_>, query: &str) -> Metered<QueryFilters> {
	let settings = &ctx.tenant.settings;
	let system_prompt = build_system_prompt(settings);
	let request = GenerateRequest::json(&system_prompt, query);
	let generation = match ctx.providers.llm.generate(&ctx.cfg.providers.llm, request).await {
		Ok(generation) => generation,
		Err(err) => {
			tracing::warn!(
				tenant_id = %ctx.tenant.tenant_id,
				error = %err,
				"Filter extraction failed. Searching without filters."
			);

			return Metered::free(QueryFilters::default());
		},
	};

	match parse_filters(&generation.text) {
		Ok(filters) => Metered::new(filters.canonicalize(settings), generation.usage),
		Err(err) => {
			tracing::warn!(
				tenant_id = %ctx.tenant.tenant_id,
				error = %err,
				"Filter extraction returned malformed output. Searching without filters."
			);

			Metered::new(QueryFilters::default(), generation.usage)
		},
	}
}

pub(crate) fn parse_filters(raw: &str) -> serde_json::Result<QueryFilters> {
	serde_json::from_str(raw.trim())
}

fn build_system_prompt(settings: &TenantSettings) -> String {
	format!(
		"\
You extract metadata filters from a user query about documents.
Return ONLY valid JSON with these optional fields:
  \"doc_type\": string or null
  \"doc_number\": string or null
  \"classification\": string or null
Set a field to null if the query does not mention it.

Valid doc_types for this tenant: [{}]
Doc number pattern: {}

EXAMPLES:
  \"show me the screen installation SOP\" -> {{\"doc_type\": \"SOP\", \"doc_number\": null, \"classification\": null}}
  \"EA-ENG-DRW-7834 banana screen manual\" -> {{\"doc_type\": \"ENG-DRW\", \"doc_number\": \"EA-ENG-DRW-7834\", \"classification\": null}}
  \"what is the digital strategy?\" -> {{\"doc_type\": \"STRAT\", \"doc_number\": null, \"classification\": null}}
  \"rubber compound formulations\" -> {{\"doc_type\": \"ENG-MAT\", \"doc_number\": null, \"classification\": null}}
",
		settings.valid_doc_types.join(", "),
		settings.doc_number_pattern,
	)
}
