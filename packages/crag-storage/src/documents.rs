use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{Chunk, Document},
};
use crag_domain::tenant::TenantNamespace;

pub const STATUS_COMPLETED: &str = "completed";

pub async fn insert_document<'e, E>(
	executor: E,
	namespace: &TenantNamespace,
	doc: &Document,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
INSERT INTO {} (
\tid,
\tfile_hash,
\tfilename,
\ts3_key,
\tdoc_number,
\tdoc_type,
\trevision,
\ttitle,
\tclassification,
\textra_metadata,
\tpage_count,
\tstatus,
\tcreated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)",
		namespace.table("documents"),
	);

	sqlx::query(&sql)
		.bind(doc.id)
		.bind(doc.file_hash.as_str())
		.bind(doc.filename.as_str())
		.bind(doc.s3_key.as_str())
		.bind(doc.doc_number.as_deref())
		.bind(doc.doc_type.as_deref())
		.bind(doc.revision.as_deref())
		.bind(doc.title.as_deref())
		.bind(doc.classification.as_deref())
		.bind(&doc.extra_metadata)
		.bind(doc.page_count)
		.bind(doc.status.as_str())
		.bind(doc.created_at)
		.execute(executor)
		.await?;

	Ok(())
}

pub async fn set_document_status<'e, E>(
	executor: E,
	namespace: &TenantNamespace,
	doc_id: Uuid,
	status: &str,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	let sql = format!("UPDATE {} SET status = $1 WHERE id = $2", namespace.table("documents"));
	let updated = sqlx::query(&sql).bind(status).bind(doc_id).execute(executor).await?;

	if updated.rows_affected() == 0 {
		return Err(Error::NotFound(format!("document {doc_id}")));
	}

	Ok(())
}

/// Newest first. `doc_type` narrows the listing by exact match when present.
pub async fn list_documents<'e, E>(
	executor: E,
	namespace: &TenantNamespace,
	doc_type: Option<&str>,
	limit: u32,
) -> Result<Vec<Document>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT
\tid,
\tfile_hash,
\tfilename,
\ts3_key,
\tdoc_number,
\tdoc_type,
\trevision,
\ttitle,
\tclassification,
\tCOALESCE(extra_metadata, '{{}}'::jsonb) AS extra_metadata,
\tpage_count,
\tstatus,
\tcreated_at
FROM {}
WHERE ($1::text IS NULL OR doc_type = $1)
ORDER BY created_at DESC, id ASC
LIMIT $2",
		namespace.table("documents"),
	);
	let rows = sqlx::query_as::<_, Document>(&sql)
		.bind(doc_type)
		.bind(i64::from(limit))
		.fetch_all(executor)
		.await?;

	Ok(rows)
}

/// Removes one document; its chunks go with it through the foreign-key cascade.
pub async fn delete_document<'e, E>(
	executor: E,
	namespace: &TenantNamespace,
	doc_id: Uuid,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	let sql = format!("DELETE FROM {} WHERE id = $1", namespace.table("documents"));
	let deleted = sqlx::query(&sql).bind(doc_id).execute(executor).await?;

	if deleted.rows_affected() == 0 {
		return Err(Error::NotFound(format!("document {doc_id}")));
	}

	Ok(())
}

pub async fn insert_chunk<'e, E>(
	executor: E,
	namespace: &TenantNamespace,
	chunk: &Chunk,
	embedding: Option<&[f32]>,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
INSERT INTO {} (
\tid,
\tdocument_id,
\tpage_number,
\tchunk_index,
\theading,
\tcontent,
\tembedding,
\ttoken_count
)
VALUES ($1,$2,$3,$4,$5,$6,$7::text::vector,$8)",
		namespace.table("chunks"),
	);

	sqlx::query(&sql)
		.bind(chunk.id)
		.bind(chunk.document_id)
		.bind(chunk.page_number)
		.bind(chunk.chunk_index)
		.bind(chunk.heading.as_deref())
		.bind(chunk.content.as_str())
		.bind(embedding.map(crate::vector_to_pg))
		.bind(chunk.token_count)
		.execute(executor)
		.await?;

	Ok(())
}
