use sqlx::{PgExecutor, Postgres, QueryBuilder};

use crate::{Error, Result, documents::STATUS_COMPLETED, models::PassageRow};
use crag_domain::tenant::TenantNamespace;

/// Similarity search inputs. Every optional filter narrows the result; `restricted_doc_types` is
/// always applied and no filter can widen past it.
#[derive(Debug, Clone, Copy)]
pub struct PassageQuery<'a> {
	pub embedding: &'a [f32],
	pub doc_type: Option<&'a str>,
	pub doc_number: Option<&'a str>,
	pub classification: Option<&'a str>,
	pub restricted_doc_types: &'a [String],
	pub limit: u32,
}

pub async fn search_passages<'e, E>(
	executor: E,
	namespace: &TenantNamespace,
	query: &PassageQuery<'_>,
) -> Result<Vec<PassageRow>>
where
	E: PgExecutor<'e>,
{
	if query.embedding.is_empty() {
		return Err(Error::InvalidArgument("query embedding must be non-empty".to_string()));
	}
	if query.limit == 0 {
		return Ok(Vec::new());
	}

	let mut builder = passage_search_builder(namespace, query);
	let rows = builder.build_query_as::<PassageRow>().fetch_all(executor).await?;

	Ok(rows)
}

fn passage_search_builder<'a>(
	namespace: &TenantNamespace,
	query: &PassageQuery<'a>,
) -> QueryBuilder<'a, Postgres> {
	let mut builder = QueryBuilder::new(
		"\
SELECT
\tc.id AS chunk_id,
\tc.document_id,
\td.doc_number,
\td.doc_type,
\td.title,
\td.classification,
\td.s3_key,
\tc.page_number,
\tc.heading,
\tc.content,
\t(c.embedding <=> ",
	);

	builder.push_bind(crate::vector_to_pg(query.embedding));
	builder.push("::text::vector)::real AS distance\nFROM ");
	builder.push(namespace.table("chunks"));
	builder.push(" c\nJOIN ");
	builder.push(namespace.table("documents"));
	builder.push(" d ON d.id = c.document_id\nWHERE d.status = ");
	builder.push_bind(STATUS_COMPLETED);
	builder.push("\n\tAND c.embedding IS NOT NULL");
	// Restrictions match case-insensitively, like `TenantSettings::is_restricted`.
	builder.push("\n\tAND (d.doc_type IS NULL OR lower(d.doc_type) <> ALL(");
	builder.push_bind(
		query.restricted_doc_types.iter().map(|ty| ty.to_lowercase()).collect::<Vec<_>>(),
	);
	builder.push("))");

	if let Some(doc_type) = query.doc_type {
		builder.push("\n\tAND d.doc_type = ");
		builder.push_bind(doc_type);
	}
	if let Some(doc_number) = query.doc_number {
		builder.push("\n\tAND d.doc_number = ");
		builder.push_bind(doc_number);
	}
	if let Some(classification) = query.classification {
		builder.push("\n\tAND d.classification = ");
		builder.push_bind(classification);
	}

	builder.push("\nORDER BY distance ASC, c.id ASC\nLIMIT ");
	builder.push_bind(i64::from(query.limit));

	builder
}
