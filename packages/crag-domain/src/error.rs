pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid tenant namespace {value:?}.")]
	InvalidNamespace { value: String },
	#[error("Invalid tenant settings: {message}")]
	InvalidSettings { message: String },
}
