use serde_json::json;

use crag_domain::{
	Error,
	tenant::{DEFAULT_DOC_NUMBER_PATTERN, TenantContext, TenantNamespace, TenantSettings},
	text::{self, ELLIPSIS},
};

fn context(settings: TenantSettings) -> TenantContext {
	TenantContext::new(
		"acme",
		"Acme Elastomers",
		TenantNamespace::parse("tenant_acme").expect("Valid namespace."),
		settings,
	)
}

#[test]
fn empty_settings_use_documented_defaults() {
	let loaded = TenantSettings::from_value(&json!({})).expect("Empty object must parse.");
	let settings = loaded.settings;

	assert!(loaded.ignored_keys.is_empty());

	assert_eq!(settings.valid_doc_types, vec!["SOP", "ENG-DRW", "ENG-MAT", "STRAT"]);
	assert_eq!(settings.doc_number_pattern, DEFAULT_DOC_NUMBER_PATTERN);
	assert!(settings.restricted_doc_types.is_empty());
	assert!(settings.keyword_hints.is_empty());
}

#[test]
fn null_settings_use_defaults() {
	let loaded =
		TenantSettings::from_value(&serde_json::Value::Null).expect("Null must parse.");

	assert!(loaded.settings.domain.is_none());
	assert!(loaded.settings.restricted_doc_types.is_empty());
}

#[test]
fn settings_ignore_unknown_keys() {
	let loaded = TenantSettings::from_value(&json!({
		"restricted_doc_types": ["ENG-MAT"],
		"data_sovereignty": "AU",
	}))
	.expect("Unknown keys must be ignored.");
	let settings = loaded.settings;

	assert!(loaded.ignored_keys.is_empty());
	assert!(settings.is_restricted(Some("ENG-MAT")));
	assert!(!settings.is_restricted(Some("SOP")));
	assert!(!settings.is_restricted(None));
}

#[test]
fn malformed_sibling_keys_keep_the_restriction() {
	let loaded = TenantSettings::from_value(&json!({
		"restricted_doc_types": ["ENG-MAT"],
		"top_k": "5",
		"domain": 42,
		"keyword_hints": "not-a-list",
		"fetch_multiplier": 4,
	}))
	.expect("Malformed optional keys must not reject the tenant.");

	assert!(loaded.settings.is_restricted(Some("ENG-MAT")));
	assert_eq!(loaded.ignored_keys, vec!["domain", "keyword_hints", "top_k"]);
	assert!(loaded.settings.domain.is_none());
	assert!(loaded.settings.keyword_hints.is_empty());
	assert!(loaded.settings.top_k.is_none());
	assert_eq!(loaded.settings.fetch_multiplier, Some(4));
	assert_eq!(loaded.settings.valid_doc_types, vec!["SOP", "ENG-DRW", "ENG-MAT", "STRAT"]);
}

#[test]
fn malformed_restriction_list_is_rejected() {
	for config in [
		json!({ "restricted_doc_types": "ENG-MAT" }),
		json!({ "restricted_doc_types": [1, 2] }),
		json!({ "restricted_doc_types": null }),
		json!(["ENG-MAT"]),
		json!("restricted"),
	] {
		let err = TenantSettings::from_value(&config).expect_err("Restriction must fail closed.");

		assert!(matches!(err, Error::InvalidSettings { .. }));
	}
}

#[test]
fn domain_falls_back_to_tenant_name() {
	assert_eq!(context(TenantSettings::default()).domain(), "Acme Elastomers");

	let settings = TenantSettings { domain: Some("  ".to_string()), ..Default::default() };

	assert_eq!(context(settings).domain(), "Acme Elastomers");

	let settings =
		TenantSettings { domain: Some("mining screen media".to_string()), ..Default::default() };

	assert_eq!(context(settings).domain(), "mining screen media");
}

#[test]
fn tenant_overrides_retrieval_sizes() {
	let settings =
		TenantSettings { top_k: Some(8), fetch_multiplier: Some(0), ..Default::default() };
	let ctx = context(settings);

	assert_eq!(ctx.top_k(5), 8);
	assert_eq!(ctx.fetch_multiplier(20), 20);
}

#[test]
fn namespace_qualifies_tables() {
	let namespace = TenantNamespace::parse("tenant_acme").expect("Valid namespace.");

	assert_eq!(namespace.table("chunks"), "tenant_acme.chunks");
}

#[test]
fn strips_one_layer_of_matching_quotes() {
	assert_eq!(text::strip_enclosing_quotes("\"x\""), "x");
	assert_eq!(text::strip_enclosing_quotes("'x'"), "x");
	assert_eq!(text::strip_enclosing_quotes("  \"\"nested\"\"  "), "\"nested\"");
	assert_eq!(text::strip_enclosing_quotes("\"mismatched'"), "\"mismatched'");
	assert_eq!(text::strip_enclosing_quotes("\""), "\"");
	assert_eq!(text::strip_enclosing_quotes(" plain query "), "plain query");
}

#[test]
fn truncation_marks_only_cut_text() {
	assert_eq!(text::truncate_chars("short", 10, ELLIPSIS), "short");
	assert_eq!(text::truncate_chars("abcdefgh", 3, ELLIPSIS), "abc...");
	assert_eq!(text::truncate_chars("héllo wörld", 4, ELLIPSIS), "héll...");
	assert_eq!(text::truncate_chars("exact", 5, ELLIPSIS), "exact");
}
