use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{CragService, Error, Result};
use crag_domain::tenant::TenantContext;
use crag_storage::{documents, models::Document};

pub const DEFAULT_LIST_LIMIT: u32 = 50;
pub const MAX_LIST_LIMIT: u32 = 200;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListDocumentsRequest {
	pub doc_type: Option<String>,
	pub limit: Option<u32>,
}
impl ListDocumentsRequest {
	/// Missing or zero means the default; anything above the cap is clamped.
	pub fn effective_limit(&self) -> u32 {
		self.limit.filter(|limit| *limit > 0).unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentItem {
	pub id: Uuid,
	pub filename: String,
	pub doc_number: Option<String>,
	pub doc_type: Option<String>,
	pub revision: Option<String>,
	pub title: Option<String>,
	pub classification: Option<String>,
	pub page_count: Option<i32>,
	pub status: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl From<Document> for DocumentItem {
	fn from(doc: Document) -> Self {
		Self {
			id: doc.id,
			filename: doc.filename,
			doc_number: doc.doc_number,
			doc_type: doc.doc_type,
			revision: doc.revision,
			title: doc.title,
			classification: doc.classification,
			page_count: doc.page_count,
			status: doc.status,
			created_at: doc.created_at,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDocumentsResponse {
	pub items: Vec<DocumentItem>,
}

impl CragService {
	/// Lists the tenant's documents, newest first.
	pub async fn list_documents(
		&self,
		tenant: &TenantContext,
		req: ListDocumentsRequest,
	) -> Result<ListDocumentsResponse> {
		let doc_type = req.doc_type.as_deref().map(str::trim).filter(|ty| !ty.is_empty());
		let rows = documents::list_documents(
			&self.db.pool,
			&tenant.namespace,
			doc_type,
			req.effective_limit(),
		)
		.await?;

		Ok(ListDocumentsResponse { items: rows.into_iter().map(DocumentItem::from).collect() })
	}

	/// Deletes one of the tenant's documents together with its indexed chunks.
	pub async fn delete_document(&self, tenant: &TenantContext, document_id: Uuid) -> Result<()> {
		documents::delete_document(&self.db.pool, &tenant.namespace, document_id).await.map_err(
			|err| match err {
				crag_storage::Error::NotFound(_) =>
					Error::NotFound { message: format!("Document {document_id} not found.") },
				err => Error::from(err),
			},
		)?;

		tracing::info!(
			tenant_id = %tenant.tenant_id,
			document_id = %document_id,
			"Document deleted."
		);

		Ok(())
	}
}
