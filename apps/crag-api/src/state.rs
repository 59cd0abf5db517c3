use std::sync::Arc;

use crag_service::CragService;
use crag_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<CragService>,
}
impl AppState {
	pub async fn new(config: crag_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::from_service(CragService::new(config, db)))
	}

	pub fn from_service(service: CragService) -> Self {
		Self { service: Arc::new(service) }
	}
}
