use std::sync::Arc;

use derrick_retrieval::RetrievalService;
use derrick_storage::{GraphStore, QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RetrievalService>,
}
impl AppState {
	pub async fn new(config: derrick_config::Config) -> color_eyre::Result<Self> {
		let qdrant = QdrantStore::new(&config.storage.qdrant)?;
		let graph = GraphStore::connect(&config.storage.neo4j).await?;
		let service = RetrievalService::new(config, qdrant, graph);

		Ok(Self { service: Arc::new(service) })
	}

	pub fn with_service(service: Arc<RetrievalService>) -> Self {
		Self { service }
	}
}
