use crag_domain::tenant::TenantNamespace;

pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

/// Per-tenant DDL with the schema name and vector dimension substituted.
pub fn render_tenant_schema(namespace: &TenantNamespace, vector_dim: u32) -> String {
	expand_includes(include_str!("../../../sql/tenant_init.sql"))
		.replace("<SCHEMA>", namespace.as_str())
		.replace("<VECTOR_DIM>", &vector_dim.to_string())
}

pub fn split_statements(sql: &str) -> impl Iterator<Item = &str> {
	sql.split(';').map(str::trim).filter(|statement| !statement.is_empty())
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_tenants.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_tenants.sql")),
				"tenant/001_documents.sql" =>
					out.push_str(include_str!("../../../sql/tenant/001_documents.sql")),
				"tenant/002_chunks.sql" =>
					out.push_str(include_str!("../../../sql/tenant/002_chunks.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tenant_schema_has_no_placeholders_left() {
		let namespace = TenantNamespace::parse("tenant_acme").expect("Valid namespace.");
		let sql = render_tenant_schema(&namespace, 1_536);

		assert!(!sql.contains("<SCHEMA>"));
		assert!(!sql.contains("<VECTOR_DIM>"));
		assert!(!sql.contains("\\ir"));
		assert!(sql.contains("tenant_acme.chunks"));
		assert!(sql.contains("vector(1536)"));
	}

	#[test]
	fn public_schema_expands_includes() {
		let sql = render_schema();

		assert!(sql.contains("public.tenants"));
		assert!(split_statements(&sql).all(|statement| !statement.starts_with("\\ir")));
	}
}
