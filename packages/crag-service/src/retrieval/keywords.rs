use serde::Deserialize;

use crate::{Metered, pipeline::PipelineContext};
use crag_domain::tenant::TenantContext;
use crag_providers::llm::GenerateRequest;

pub const FALLBACK_KEYWORDS: usize = 5;
pub const MAX_KEYWORDS: usize = 10;

#[derive(Debug, Deserialize)]
struct RankingKeywords {
	keywords: Vec<String>,
}

/// Generates lexical ranking keywords for `query`, falling back to the query's own tokens when the
/// model call fails or its output does not hold between 1 and [`MAX_KEYWORDS`] keywords.
pub(crate) async fn generate(ctx: &PipelineContext<'_>, query: &str) -> Metered<Vec<String>> {
	let system_prompt = build_system_prompt(ctx.tenant);
	let request = GenerateRequest::json(&system_prompt, query);
	let generation = match ctx.providers.llm.generate(&ctx.cfg.providers.llm, request).await {
		Ok(generation) => generation,
		Err(err) => {
			tracing::warn!(
				tenant_id = %ctx.tenant.tenant_id,
				error = %err,
				"Keyword generation failed. Using query tokens."
			);

			return Metered::free(fallback_keywords(query));
		},
	};

	match parse_keywords(&generation.text) {
		Ok(keywords) => Metered::new(keywords, generation.usage),
		Err(reason) => {
			tracing::warn!(
				tenant_id = %ctx.tenant.tenant_id,
				reason = reason.as_str(),
				"Keyword generation returned unusable output. Using query tokens."
			);

			Metered::new(fallback_keywords(query), generation.usage)
		},
	}
}

pub(crate) fn parse_keywords(raw: &str) -> Result<Vec<String>, String> {
	let parsed: RankingKeywords = serde_json::from_str(raw.trim()).map_err(|err| err.to_string())?;
	let count = parsed.keywords.len();

	if !(1..=MAX_KEYWORDS).contains(&count) {
		return Err(format!("expected 1 to {MAX_KEYWORDS} keywords, got {count}"));
	}

	Ok(parsed.keywords)
}

/// First [`FALLBACK_KEYWORDS`] lowercased whitespace tokens of the query.
pub fn fallback_keywords(query: &str) -> Vec<String> {
	query.to_lowercase().split_whitespace().take(FALLBACK_KEYWORDS).map(str::to_string).collect()
}

fn build_system_prompt(tenant: &TenantContext) -> String {
	let hints = &tenant.settings.keyword_hints;
	let hints_section = if hints.is_empty() {
		String::new()
	} else {
		format!("Domain terminology hints: {}\n", hints.join(", "))
	};

	format!(
		"\
Generate EXACTLY 5 technical keywords for BM25 ranking of the tenant's documents.
Use exact terminology found in the documents: headings, labels and technical terms.
Document domain: {}
{hints_section}Return ONLY valid JSON: {{\"keywords\": [\"term1\", \"term2\", \"term3\", \"term4\", \"term5\"]}}

RULES:
- Return EXACTLY 5 keywords
- Use exact phrases likely to appear verbatim in the documents
- Match the query topic (installation -> installation steps, procedure, method)
- Include both specific and general terms

EXAMPLES:
  \"screen installation steps\" -> {{\"keywords\": [\"installation procedure\", \"installation steps\", \"screen panel\", \"tensioning\", \"assembly\"]}}
  \"rubber compound formulation\" -> {{\"keywords\": [\"compound formulation\", \"rubber compound\", \"formulation register\", \"material specification\", \"compound grade\"]}}
",
		tenant.domain(),
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crag_domain::tenant::{TenantNamespace, TenantSettings};

	#[test]
	fn fallback_takes_first_five_lowercased_tokens() {
		assert_eq!(
			fallback_keywords("How  do I Install the SCREEN panel today"),
			vec!["how", "do", "i", "install", "the"]
		);
		assert_eq!(fallback_keywords("Torque Specs"), vec!["torque", "specs"]);
		assert!(fallback_keywords("   ").is_empty());
	}

	#[test]
	fn parse_accepts_between_one_and_ten_keywords() {
		assert_eq!(
			parse_keywords(r#"{"keywords": ["screen panel", "tensioning"]}"#),
			Ok(vec!["screen panel".to_string(), "tensioning".to_string()])
		);
		assert!(parse_keywords(r#"{"keywords": []}"#).is_err());

		let eleven = (0..11).map(|i| format!("\"k{i}\"")).collect::<Vec<_>>().join(",");

		assert!(parse_keywords(&format!(r#"{{"keywords": [{eleven}]}}"#)).is_err());
		assert!(parse_keywords(r#"{"terms": ["a"]}"#).is_err());
	}

	#[test]
	fn system_prompt_includes_domain_and_hints() {
		let namespace = TenantNamespace::parse("tenant_acme").expect("Valid namespace.");
		let settings = TenantSettings {
			domain: Some("Mining screens".to_string()),
			keyword_hints: vec!["polyurethane".to_string(), "aperture".to_string()],
			..Default::default()
		};
		let tenant = TenantContext::new("acme", "Acme", namespace, settings);
		let prompt = build_system_prompt(&tenant);

		assert!(prompt.contains("Document domain: Mining screens"));
		assert!(prompt.contains("Domain terminology hints: polyurethane, aperture"));
	}
}
