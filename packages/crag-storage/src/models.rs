use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Tenant {
	pub id: Uuid,
	pub tenant_id: String,
	pub name: String,
	pub api_key_hash: String,
	pub schema_name: String,
	pub s3_prefix: String,
	pub config: Value,
	pub is_active: bool,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Document {
	pub id: Uuid,
	pub file_hash: String,
	pub filename: String,
	pub s3_key: String,
	pub doc_number: Option<String>,
	pub doc_type: Option<String>,
	pub revision: Option<String>,
	pub title: Option<String>,
	pub classification: Option<String>,
	pub extra_metadata: Value,
	pub page_count: Option<i32>,
	pub status: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct Chunk {
	pub id: Uuid,
	pub document_id: Uuid,
	pub page_number: i32,
	pub chunk_index: i32,
	pub heading: Option<String>,
	pub content: String,
	pub token_count: Option<i32>,
}

/// One chunk joined with its parent document's citation metadata.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PassageRow {
	pub chunk_id: Uuid,
	pub document_id: Uuid,
	pub doc_number: Option<String>,
	pub doc_type: Option<String>,
	pub title: Option<String>,
	pub classification: Option<String>,
	pub s3_key: String,
	pub page_number: i32,
	pub heading: Option<String>,
	pub content: String,
	/// Cosine distance to the query embedding; lower is closer.
	pub distance: f32,
}
