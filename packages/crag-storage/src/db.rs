use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Result, schema};
use crag_domain::tenant::TenantNamespace;

const SCHEMA_LOCK_ID: i64 = 7_120_115;

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &crag_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	/// Creates the shared `public` objects (extensions, tenant registry).
	pub async fn ensure_schema(&self) -> Result<()> {
		self.apply_locked(&schema::render_schema()).await
	}

	/// Creates one tenant's isolated schema with its documents and chunks tables.
	pub async fn ensure_tenant_schema(
		&self,
		namespace: &TenantNamespace,
		vector_dim: u32,
	) -> Result<()> {
		self.apply_locked(&schema::render_tenant_schema(namespace, vector_dim)).await
	}

	async fn apply_locked(&self, sql: &str) -> Result<()> {
		// Advisory locks are held per connection. Use a single transaction so the lock is scoped to
		// one connection and automatically released when the transaction ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)")
			.bind(SCHEMA_LOCK_ID)
			.execute(&mut *tx)
			.await?;

		for statement in schema::split_statements(sql) {
			sqlx::query(statement).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}
