use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::{delete, get, post},
};
use serde::Serialize;
use uuid::Uuid;

use crate::state::AppState;
use crag_service::{ChatRequest, ChatResponse, Error, ListDocumentsRequest, ListDocumentsResponse};

pub const API_KEY_HEADER: &str = "x-api-key";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/chat", post(chat))
		.route("/v1/documents", get(list_documents))
		.route("/v1/documents/{document_id}", delete(delete_document))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn chat(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
	let tenant = state.service.resolve_tenant(api_key(&headers)).await?;
	let response = state.service.chat(&tenant, payload).await?;

	Ok(Json(response))
}

async fn list_documents(
	State(state): State<AppState>,
	headers: HeaderMap,
	Query(params): Query<ListDocumentsRequest>,
) -> Result<Json<ListDocumentsResponse>, ApiError> {
	let tenant = state.service.resolve_tenant(api_key(&headers)).await?;
	let response = state.service.list_documents(&tenant, params).await?;

	Ok(Json(response))
}

async fn delete_document(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(document_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
	let tenant = state.service.resolve_tenant(api_key(&headers)).await?;

	state.service.delete_document(&tenant, document_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

/// Missing and non-UTF-8 headers both read as an empty key, which the service rejects.
fn api_key(headers: &HeaderMap) -> &str {
	headers.get(API_KEY_HEADER).and_then(|value| value.to_str().ok()).unwrap_or_default()
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}

	pub fn status(&self) -> StatusCode {
		self.status
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } => {
				let fields = message.starts_with("query").then(|| vec!["$.query".to_string()]);

				Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, fields)
			},
			Error::Unauthorized { message } =>
				Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message, None),
			Error::NotFound { message } =>
				Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			Error::DeadlineExceeded { deadline_ms } => Self::new(
				StatusCode::GATEWAY_TIMEOUT,
				"DEADLINE_EXCEEDED",
				format!("Query did not finish within {deadline_ms} ms."),
				None,
			),
			Error::Configuration { message } => {
				tracing::error!(error = message.as_str(), "Service is misconfigured.");

				Self::new(StatusCode::BAD_GATEWAY, "CONFIGURATION_ERROR", message, None)
			},
			Error::Provider { message } => {
				tracing::error!(error = message.as_str(), "Upstream provider failed.");

				Self::new(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message, None)
			},
			Error::Storage { message } => {
				tracing::error!(error = message.as_str(), "Storage request failed.");

				Self::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"INTERNAL_ERROR",
					"Internal error.",
					None,
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
