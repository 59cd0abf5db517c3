use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
	response::Response,
};
use sqlx::PgPool;
use tower::util::ServiceExt;

use crag_api::{check_bind, routes, state::AppState};
use crag_config::Config;
use crag_service::CragService;
use crag_storage::db::Db;

const SAMPLE_CONFIG_TEMPLATE_TOML: &str =
	include_str!("../../../packages/crag-config/tests/fixtures/sample_config.template.toml");

fn sample_config() -> Config {
	crag_config::parse(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse sample config.")
}

// The pool is never connected: every request below is rejected before touching storage.
fn app() -> Router {
	let config = sample_config();
	let pool = PgPool::connect_lazy(&config.storage.postgres.dsn).expect("Failed to build pool.");
	let service = CragService::new(config, Db { pool });

	routes::router(AppState::from_service(service))
}

async fn json_body(response: Response) -> serde_json::Value {
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&body).expect("Failed to parse response.")
}

#[tokio::test]
async fn health_ok() {
	let response = app()
		.oneshot(Request::builder().uri("/health").body(Body::empty()).expect("Valid request."))
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn chat_requires_an_api_key() {
	let payload = serde_json::json!({ "query": "What is the torque spec for the M8 bolts?" });
	let response = app()
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/v1/chat")
				.header("content-type", "application/json")
				.body(Body::from(payload.to_string()))
				.expect("Valid request."),
		)
		.await
		.expect("Failed to call /v1/chat.");

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

	let json = json_body(response).await;

	assert_eq!(json["error_code"], "UNAUTHORIZED");
	assert!(json["fields"].is_null());
}

#[tokio::test]
async fn blank_api_key_is_rejected_for_document_listing() {
	let response = app()
		.oneshot(
			Request::builder()
				.uri("/v1/documents?limit=10")
				.header("X-API-Key", "   ")
				.body(Body::empty())
				.expect("Valid request."),
		)
		.await
		.expect("Failed to call /v1/documents.");

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(json_body(response).await["error_code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn malformed_chat_body_is_a_client_error() {
	let response = app()
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/v1/chat")
				.header("X-API-Key", "secret")
				.header("content-type", "application/json")
				.body(Body::from("{\"query\":"))
				.expect("Valid request."),
		)
		.await
		.expect("Failed to call /v1/chat.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn document_delete_requires_an_api_key() {
	let response = app()
		.oneshot(
			Request::builder()
				.method("DELETE")
				.uri("/v1/documents/6f1c2a9e-3b7d-4c1e-9a0f-2d5b8e4c7a13")
				.body(Body::empty())
				.expect("Valid request."),
		)
		.await
		.expect("Failed to call DELETE /v1/documents/{document_id}.");

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(json_body(response).await["error_code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn document_delete_rejects_a_non_uuid_id() {
	let response = app()
		.oneshot(
			Request::builder()
				.method("DELETE")
				.uri("/v1/documents/not-a-uuid")
				.header("X-API-Key", "secret")
				.body(Body::empty())
				.expect("Valid request."),
		)
		.await
		.expect("Failed to call DELETE /v1/documents/{document_id}.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn public_bind_is_refused_when_local_only() {
	let mut config = sample_config();

	assert!(check_bind(&config).expect("Loopback bind is allowed.").ip().is_loopback());

	config.service.http_bind = "0.0.0.0:8080".to_string();

	assert!(check_bind(&config).is_err());

	config.security.bind_localhost_only = false;

	assert_eq!(check_bind(&config).expect("Public bind is allowed.").port(), 8080);
}
