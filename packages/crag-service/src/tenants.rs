use sha2::{Digest, Sha256};

use crate::{CragService, Error, Result};
use crag_domain::tenant::{TenantContext, TenantNamespace, TenantSettings};
use crag_storage::{models::Tenant, tenants};

/// Lowercase hex SHA-256 digest stored in `tenants.api_key_hash` by tenant provisioning.
pub fn hash_api_key(api_key: &str) -> String {
	format!("{:x}", Sha256::digest(api_key.as_bytes()))
}

impl CragService {
	/// Maps an API key to its active tenant.
	pub async fn resolve_tenant(&self, api_key: &str) -> Result<TenantContext> {
		let api_key = api_key.trim();

		if api_key.is_empty() {
			return Err(Error::Unauthorized { message: "API key is required.".to_string() });
		}

		let Some(tenant) =
			tenants::find_active_by_key_hash(&self.db.pool, &hash_api_key(api_key)).await?
		else {
			return Err(Error::Unauthorized { message: "Invalid or inactive API key.".to_string() });
		};

		tenant_context(tenant)
	}
}

pub(crate) fn tenant_context(tenant: Tenant) -> Result<TenantContext> {
	let namespace = TenantNamespace::parse(&tenant.schema_name).map_err(|err| Error::Storage {
		message: format!("Tenant {} has an unusable schema name: {err}", tenant.tenant_id),
	})?;
	// Without a trustworthy restriction list the tenant cannot be served at all.
	let loaded = TenantSettings::from_value(&tenant.config).map_err(|err| {
		tracing::error!(
			tenant_id = tenant.tenant_id.as_str(),
			error = %err,
			"Tenant config is unusable. Refusing the request."
		);

		Error::Storage {
			message: format!("Tenant {} has an unusable config: {err}", tenant.tenant_id),
		}
	})?;

	if !loaded.ignored_keys.is_empty() {
		tracing::warn!(
			tenant_id = tenant.tenant_id.as_str(),
			ignored_keys = ?loaded.ignored_keys,
			"Tenant config has malformed keys. Using their defaults."
		);
	}

	Ok(TenantContext::new(tenant.tenant_id, tenant.name, namespace, loaded.settings))
}
