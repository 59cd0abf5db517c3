mod error;

pub use error::{Error, Result};

use std::{env, future::Future, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

pub const DSN_ENV: &str = "CRAG_PG_DSN";

const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];

/// A uniquely named database created for one test and dropped afterwards.
pub struct TestDatabase {
	name: String,
	dsn: String,
	admin_options: PgConnectOptions,
	cleaned: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base_options: PgConnectOptions = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("Failed to parse {DSN_ENV}: {err}.")))?;
		let (admin_options, mut admin_conn) = connect_admin(&base_options).await?;
		let name = format!("crag_test_{}", Uuid::new_v4().simple());
		let create_sql = format!(r#"CREATE DATABASE "{}""#, name);

		admin_conn
			.execute(create_sql.as_str())
			.await
			.map_err(|err| Error::Message(format!("Failed to create test database: {err}.")))?;

		let dsn = base_options.clone().database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin_options, cleaned: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner().await
	}

	async fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		cleanup_database(&self.name, &self.admin_options).await?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let name = self.name.clone();
		let admin_options = self.admin_options.clone();
		// Drop may run inside a runtime, so cleanup gets its own thread and runtime.
		let cleanup_thread = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test database cleanup failed: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(cleanup_database(&name, &admin_options)) {
				eprintln!("Test database cleanup failed: {err}.");
			}
		});
		let _ = cleanup_thread.join();
	}
}

pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok().filter(|dsn| !dsn.trim().is_empty())
}

/// Reports whether the `vector` extension can be installed on the server behind `dsn`.
pub async fn pgvector_available(dsn: &str) -> Result<bool> {
	let mut conn = PgConnection::connect(dsn).await?;
	let available: bool = sqlx::query_scalar(
		"SELECT EXISTS (SELECT 1 FROM pg_available_extensions WHERE name = 'vector')",
	)
	.fetch_one(&mut conn)
	.await?;

	Ok(available)
}

/// Unit vector of `dim` components pointing along `axis`.
pub fn axis_vector(dim: usize, axis: usize) -> Vec<f32> {
	let mut vector = vec![0.0; dim];

	if let Some(slot) = vector.get_mut(axis) {
		*slot = 1.0;
	}

	vector
}

/// Normalized blend of two axes, closer to `primary` as `weight` grows.
pub fn blended_vector(dim: usize, primary: usize, secondary: usize, weight: f32) -> Vec<f32> {
	let mut vector = vec![0.0; dim];
	let weight = weight.clamp(0.0, 1.0);

	if let Some(slot) = vector.get_mut(secondary) {
		*slot += 1.0 - weight;
	}
	if let Some(slot) = vector.get_mut(primary) {
		*slot += weight;
	}

	let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();

	if norm > 0.0 {
		vector.iter_mut().for_each(|v| *v /= norm);
	}

	vector
}

pub async fn with_test_db<F, Fut, T>(base_dsn: &str, f: F) -> Result<T>
where
	F: FnOnce(&TestDatabase) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let db = TestDatabase::new(base_dsn).await?;
	let result = f(&db).await;
	let mut db = db;

	if let Err(err) = db.cleanup_inner().await {
		eprintln!("Test database cleanup warning: {err}.");

		if result.is_ok() {
			return Err(err);
		}
	}

	result
}

async fn connect_admin(
	base_options: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in ADMIN_DATABASES {
		let options = base_options.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => {
				last_err = Some(err);
			},
		}
	}

	Err(Error::Message(format!("Failed to connect to an admin database: {last_err:?}.")))
}

async fn cleanup_database(name: &str, admin_options: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(admin_options).await.map_err(|err| {
		Error::Message(format!("Failed to connect to admin database for cleanup: {err}."))
	})?;
	let drop_sql = format!(r#"DROP DATABASE IF EXISTS "{}" WITH (FORCE)"#, name);

	sqlx::query(drop_sql.as_str())
		.execute(&mut conn)
		.await
		.map_err(|err| Error::Message(format!("Failed to drop test database: {err}.")))?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn axis_vector_sets_single_component() {
		assert_eq!(axis_vector(4, 2), vec![0.0, 0.0, 1.0, 0.0]);
		assert_eq!(axis_vector(2, 9), vec![0.0, 0.0]);
	}

	#[test]
	fn blended_vector_is_normalized() {
		let vector = blended_vector(3, 0, 1, 0.75);
		let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();

		assert!((norm - 1.0).abs() < 1e-5);
		assert!(vector[0] > vector[1]);
		assert_eq!(vector[2], 0.0);
	}
}
