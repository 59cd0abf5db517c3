pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Unauthorized: {message}")]
	Unauthorized { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Configuration error: {message}")]
	Configuration { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Pipeline did not finish within {deadline_ms} ms.")]
	DeadlineExceeded { deadline_ms: u64 },
}

impl From<crag_providers::Error> for Error {
	fn from(err: crag_providers::Error) -> Self {
		match err {
			crag_providers::Error::MissingApiKey { .. } =>
				Self::Configuration { message: err.to_string() },
			err => Self::Provider { message: err.to_string() },
		}
	}
}

impl From<crag_storage::Error> for Error {
	fn from(err: crag_storage::Error) -> Self {
		match err {
			crag_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			crag_storage::Error::NotFound(message) => Self::NotFound { message },
			err => Self::Storage { message: err.to_string() },
		}
	}
}

impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
