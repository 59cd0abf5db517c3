use sqlx::PgExecutor;

use crate::{Result, models::Tenant};

pub async fn find_active_by_key_hash<'e, E>(
	executor: E,
	api_key_hash: &str,
) -> Result<Option<Tenant>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, Tenant>(
		"\
SELECT
\tid,
\ttenant_id,
\tname,
\tapi_key_hash,
\tschema_name,
\ts3_prefix,
\tconfig,
\tis_active,
\tcreated_at
FROM public.tenants
WHERE api_key_hash = $1 AND is_active
LIMIT 1",
	)
	.bind(api_key_hash)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn insert_tenant<'e, E>(executor: E, tenant: &Tenant) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO public.tenants (
\tid,
\ttenant_id,
\tname,
\tapi_key_hash,
\tschema_name,
\ts3_prefix,
\tconfig,
\tis_active,
\tcreated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)",
	)
	.bind(tenant.id)
	.bind(tenant.tenant_id.as_str())
	.bind(tenant.name.as_str())
	.bind(tenant.api_key_hash.as_str())
	.bind(tenant.schema_name.as_str())
	.bind(tenant.s3_prefix.as_str())
	.bind(&tenant.config)
	.bind(tenant.is_active)
	.bind(tenant.created_at)
	.execute(executor)
	.await?;

	Ok(())
}
