pub mod db;
pub mod documents;
pub mod models;
pub mod passages;
pub mod schema;
pub mod tenants;

mod error;

pub use error::{Error, Result};

/// Renders a vector as pgvector text input, e.g. `[0.1,0.2]`.
pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8 + 2);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}
