use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use crag_config::Postgres;
use crag_domain::tenant::TenantNamespace;
use crag_storage::{
	Error,
	db::Db,
	documents::{self, STATUS_COMPLETED},
	models::{Chunk, Document},
	passages::{self, PassageQuery},
};
use crag_testkit::TestDatabase;

const DIM: u32 = 4;

async fn setup() -> Option<(TestDatabase, Db)> {
	let base_dsn = crag_testkit::env_dsn()?;

	if !crag_testkit::pgvector_available(&base_dsn).await.expect("Failed to probe pgvector.") {
		eprintln!("Skipping; the pgvector extension is not installed on the test server.");

		return None;
	}

	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2, vector_dim: DIM };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	Some((test_db, db))
}

fn document(doc_number: &str, doc_type: &str, status: &str) -> Document {
	Document {
		id: Uuid::new_v4(),
		file_hash: format!("hash-{doc_number}"),
		filename: format!("{doc_number}.pdf"),
		s3_key: format!("docs/{doc_number}.pdf"),
		doc_number: Some(doc_number.to_string()),
		doc_type: Some(doc_type.to_string()),
		revision: Some("A".to_string()),
		title: Some(format!("{doc_number} title")),
		classification: Some("INTERNAL".to_string()),
		extra_metadata: json!({}),
		page_count: Some(1),
		status: status.to_string(),
		created_at: OffsetDateTime::now_utc(),
	}
}

async fn seed(db: &Db, namespace: &TenantNamespace, doc: &Document, content: &str, axis: usize) {
	documents::insert_document(&db.pool, namespace, doc).await.expect("Failed to insert document.");

	let chunk = Chunk {
		id: Uuid::new_v4(),
		document_id: doc.id,
		page_number: 1,
		chunk_index: 0,
		heading: Some("Overview".to_string()),
		content: content.to_string(),
		token_count: None,
	};
	let embedding = crag_testkit::axis_vector(DIM as usize, axis);

	documents::insert_chunk(&db.pool, namespace, &chunk, Some(&embedding))
		.await
		.expect("Failed to insert chunk.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set CRAG_PG_DSN to run."]
async fn restricted_doc_type_is_never_returned_even_when_filtered_for() {
	let Some((test_db, db)) = setup().await else {
		eprintln!("Skipping restricted_doc_type_is_never_returned_even_when_filtered_for.");

		return;
	};
	let namespace = TenantNamespace::parse("tenant_acme").expect("Valid namespace.");

	db.ensure_tenant_schema(&namespace, DIM).await.expect("Failed to ensure tenant schema.");
	seed(&db, &namespace, &document("ENG-MAT-001", "ENG-MAT", STATUS_COMPLETED), "Alloy spec.", 0)
		.await;
	seed(&db, &namespace, &document("ENG-MAT-002", "eng-mat", STATUS_COMPLETED), "Resin spec.", 0)
		.await;
	seed(&db, &namespace, &document("SOP-001", "SOP", STATUS_COMPLETED), "Torque steps.", 1).await;

	let restricted = vec!["ENG-MAT".to_string()];
	let embedding = crag_testkit::axis_vector(DIM as usize, 0);
	let filtered = PassageQuery {
		embedding: &embedding,
		doc_type: Some("ENG-MAT"),
		doc_number: None,
		classification: None,
		restricted_doc_types: &restricted,
		limit: 10,
	};
	let rows = passages::search_passages(&db.pool, &namespace, &filtered)
		.await
		.expect("Search failed.");

	assert!(rows.is_empty());

	let unfiltered = PassageQuery { doc_type: None, ..filtered };
	let rows = passages::search_passages(&db.pool, &namespace, &unfiltered)
		.await
		.expect("Search failed.");

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].doc_type.as_deref(), Some("SOP"));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set CRAG_PG_DSN to run."]
async fn search_is_scoped_to_one_tenant_and_ordered_by_distance() {
	let Some((test_db, db)) = setup().await else {
		eprintln!("Skipping search_is_scoped_to_one_tenant_and_ordered_by_distance.");

		return;
	};
	let acme = TenantNamespace::parse("tenant_acme").expect("Valid namespace.");
	let globex = TenantNamespace::parse("tenant_globex").expect("Valid namespace.");

	db.ensure_tenant_schema(&acme, DIM).await.expect("Failed to ensure tenant schema.");
	db.ensure_tenant_schema(&globex, DIM).await.expect("Failed to ensure tenant schema.");
	seed(&db, &acme, &document("SOP-100", "SOP", STATUS_COMPLETED), "Near.", 0).await;
	seed(&db, &acme, &document("SOP-101", "SOP", STATUS_COMPLETED), "Far.", 2).await;
	seed(&db, &acme, &document("SOP-102", "SOP", "pending"), "Unfinished.", 0).await;
	seed(&db, &globex, &document("SOP-900", "SOP", STATUS_COMPLETED), "Other tenant.", 0).await;

	let embedding = crag_testkit::axis_vector(DIM as usize, 0);
	let query = PassageQuery {
		embedding: &embedding,
		doc_type: None,
		doc_number: None,
		classification: None,
		restricted_doc_types: &[],
		limit: 10,
	};
	let rows =
		passages::search_passages(&db.pool, &acme, &query).await.expect("Search failed.");
	let numbers = rows.iter().filter_map(|row| row.doc_number.as_deref()).collect::<Vec<_>>();

	assert_eq!(numbers, vec!["SOP-100", "SOP-101"]);
	assert!(rows[0].distance < rows[1].distance);

	let listed =
		documents::list_documents(&db.pool, &globex, None, 50).await.expect("List failed.");

	assert_eq!(listed.len(), 1);
	assert_eq!(listed[0].doc_number.as_deref(), Some("SOP-900"));

	let listed = documents::list_documents(&db.pool, &acme, Some("ENG-DRW"), 50)
		.await
		.expect("List failed.");

	assert!(listed.is_empty());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set CRAG_PG_DSN to run."]
async fn deleting_a_document_removes_its_passages_within_one_tenant() {
	let Some((test_db, db)) = setup().await else {
		eprintln!("Skipping deleting_a_document_removes_its_passages_within_one_tenant.");

		return;
	};
	let acme = TenantNamespace::parse("tenant_acme").expect("Valid namespace.");
	let globex = TenantNamespace::parse("tenant_globex").expect("Valid namespace.");
	let doc = document("SOP-200", "SOP", STATUS_COMPLETED);

	db.ensure_tenant_schema(&acme, DIM).await.expect("Failed to ensure tenant schema.");
	db.ensure_tenant_schema(&globex, DIM).await.expect("Failed to ensure tenant schema.");
	seed(&db, &acme, &doc, "Belt alignment.", 0).await;

	let err = documents::delete_document(&db.pool, &globex, doc.id)
		.await
		.expect_err("Another tenant cannot delete the document.");

	assert!(matches!(err, Error::NotFound(_)));

	documents::delete_document(&db.pool, &acme, doc.id).await.expect("Delete failed.");

	let embedding = crag_testkit::axis_vector(DIM as usize, 0);
	let query = PassageQuery {
		embedding: &embedding,
		doc_type: None,
		doc_number: None,
		classification: None,
		restricted_doc_types: &[],
		limit: 10,
	};

	assert!(
		passages::search_passages(&db.pool, &acme, &query).await.expect("Search failed.").is_empty()
	);

	let err = documents::delete_document(&db.pool, &acme, doc.id)
		.await
		.expect_err("Deleting twice must report the missing document.");

	assert!(matches!(err, Error::NotFound(_)));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
