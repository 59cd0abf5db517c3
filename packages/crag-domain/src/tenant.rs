use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{Error, Result};

pub const DEFAULT_DOC_TYPES: [&str; 4] = ["SOP", "ENG-DRW", "ENG-MAT", "STRAT"];
pub const DEFAULT_DOC_NUMBER_PATTERN: &str = r"[A-Z]+-[A-Z0-9\-]+";

// Postgres identifiers are capped at 63 bytes.
static NAMESPACE_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[a-z][a-z0-9_]{0,62}$").expect("Namespace pattern must compile.")
});

/// Validated Postgres schema name that isolates one tenant's documents and chunks.
///
/// Storage functions only accept this type for tenant-scoped queries, so a schema name can never
/// reach SQL without passing [`TenantNamespace::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantNamespace(String);
impl TenantNamespace {
	pub fn parse(value: &str) -> Result<Self> {
		if !NAMESPACE_RE.is_match(value) {
			return Err(Error::InvalidNamespace { value: value.to_string() });
		}

		Ok(Self(value.to_string()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Schema-qualified table name, e.g. `tenant_acme.chunks`.
	pub fn table(&self, table: &str) -> String {
		format!("{}.{table}", self.0)
	}
}
impl fmt::Display for TenantNamespace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Per-tenant knobs stored as a JSON object next to the tenant record.
#[derive(Debug, Clone)]
pub struct TenantSettings {
	pub domain: Option<String>,
	pub keyword_hints: Vec<String>,
	pub valid_doc_types: Vec<String>,
	pub doc_number_pattern: String,
	pub restricted_doc_types: Vec<String>,
	pub top_k: Option<u32>,
	pub fetch_multiplier: Option<u32>,
}
impl TenantSettings {
	/// Reads a stored config object key by key.
	///
	/// `restricted_doc_types` is strict: a config that is not an object, or a restriction list that
	/// is not an array of strings, is an error. Any other malformed key keeps its default and is
	/// reported in [`LoadedSettings::ignored_keys`]. Unknown keys are skipped.
	pub fn from_value(value: &Value) -> Result<LoadedSettings> {
		let map = match value {
			Value::Null => return Ok(LoadedSettings::from(Self::default())),
			Value::Object(map) => map,
			other => {
				return Err(Error::InvalidSettings {
					message: format!("tenant config must be a JSON object, got {other}"),
				});
			},
		};
		let restricted_doc_types = match map.get("restricted_doc_types") {
			None => Vec::new(),
			Some(raw) => Vec::<String>::deserialize(raw).map_err(|err| Error::InvalidSettings {
				message: format!("restricted_doc_types must be an array of strings: {err}"),
			})?,
		};
		let defaults = Self::default();
		let mut ignored_keys = Vec::new();
		let settings = Self {
			domain: lenient::<Option<String>>(map, "domain", &mut ignored_keys).flatten(),
			keyword_hints: lenient(map, "keyword_hints", &mut ignored_keys).unwrap_or_default(),
			valid_doc_types: lenient(map, "valid_doc_types", &mut ignored_keys)
				.unwrap_or(defaults.valid_doc_types),
			doc_number_pattern: lenient(map, "doc_number_pattern", &mut ignored_keys)
				.unwrap_or(defaults.doc_number_pattern),
			restricted_doc_types,
			top_k: lenient::<Option<u32>>(map, "top_k", &mut ignored_keys).flatten(),
			fetch_multiplier: lenient::<Option<u32>>(map, "fetch_multiplier", &mut ignored_keys)
				.flatten(),
		};

		Ok(LoadedSettings { settings, ignored_keys })
	}

	/// Case-insensitive, matching the `lower()` comparison in the passage search SQL.
	pub fn is_restricted(&self, doc_type: Option<&str>) -> bool {
		let Some(doc_type) = doc_type else {
			return false;
		};
		let doc_type = doc_type.to_lowercase();

		self.restricted_doc_types.iter().any(|restricted| restricted.to_lowercase() == doc_type)
	}

	/// Returns the canonical spelling of `doc_type` from the tenant vocabulary, if present.
	pub fn canonical_doc_type(&self, doc_type: &str) -> Option<&str> {
		let needle = doc_type.trim();

		self.valid_doc_types
			.iter()
			.find(|valid| valid.eq_ignore_ascii_case(needle))
			.map(String::as_str)
	}
}
impl Default for TenantSettings {
	fn default() -> Self {
		Self {
			domain: None,
			keyword_hints: Vec::new(),
			valid_doc_types: DEFAULT_DOC_TYPES.iter().map(|ty| ty.to_string()).collect(),
			doc_number_pattern: DEFAULT_DOC_NUMBER_PATTERN.to_string(),
			restricted_doc_types: Vec::new(),
			top_k: None,
			fetch_multiplier: None,
		}
	}
}

/// Settings read from a stored config plus the keys that had to fall back to defaults.
#[derive(Debug, Clone)]
pub struct LoadedSettings {
	pub settings: TenantSettings,
	pub ignored_keys: Vec<&'static str>,
}
impl From<TenantSettings> for LoadedSettings {
	fn from(settings: TenantSettings) -> Self {
		Self { settings, ignored_keys: Vec::new() }
	}
}

#[derive(Debug, Clone)]
pub struct TenantContext {
	pub tenant_id: String,
	pub name: String,
	pub namespace: TenantNamespace,
	pub settings: TenantSettings,
}
impl TenantContext {
	pub fn new(
		tenant_id: impl Into<String>,
		name: impl Into<String>,
		namespace: TenantNamespace,
		settings: TenantSettings,
	) -> Self {
		Self { tenant_id: tenant_id.into(), name: name.into(), namespace, settings }
	}

	/// Document domain used in prompts; defaults to the tenant display name.
	pub fn domain(&self) -> &str {
		self.settings
			.domain
			.as_deref()
			.map(str::trim)
			.filter(|domain| !domain.is_empty())
			.unwrap_or(&self.name)
	}

	pub fn top_k(&self, default: u32) -> u32 {
		self.settings.top_k.filter(|k| *k > 0).unwrap_or(default)
	}

	pub fn fetch_multiplier(&self, default: u32) -> u32 {
		self.settings.fetch_multiplier.filter(|m| *m > 0).unwrap_or(default)
	}
}

fn lenient<T>(
	map: &Map<String, Value>,
	key: &'static str,
	ignored_keys: &mut Vec<&'static str>,
) -> Option<T>
where
	T: DeserializeOwned,
{
	let raw = map.get(key)?;

	match T::deserialize(raw) {
		Ok(value) => Some(value),
		Err(_) => {
			ignored_keys.push(key);

			None
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn namespace_rejects_sql_metacharacters() {
		assert!(TenantNamespace::parse("tenant_acme").is_ok());
		assert!(TenantNamespace::parse("tenant_acme; DROP TABLE x").is_err());
		assert!(TenantNamespace::parse("Tenant").is_err());
		assert!(TenantNamespace::parse("1tenant").is_err());
		assert!(TenantNamespace::parse("").is_err());
		assert!(TenantNamespace::parse(&"a".repeat(64)).is_err());
	}

	#[test]
	fn canonical_doc_type_is_case_insensitive() {
		let settings = TenantSettings::default();

		assert_eq!(settings.canonical_doc_type("eng-drw"), Some("ENG-DRW"));
		assert_eq!(settings.canonical_doc_type(" sop "), Some("SOP"));
		assert_eq!(settings.canonical_doc_type("memo"), None);
	}

	#[test]
	fn restriction_ignores_case() {
		let settings = TenantSettings {
			restricted_doc_types: vec!["ENG-MAT".to_string()],
			..Default::default()
		};

		assert!(settings.is_restricted(Some("eng-mat")));
		assert!(settings.is_restricted(Some("Eng-Mat")));
		assert!(!settings.is_restricted(Some("ENG-DRW")));
		assert!(!settings.is_restricted(None));
	}
}
