use std::{collections::HashMap, time::Duration};

use qdrant_client::qdrant::{
	PointId, Query, QueryPointsBuilder, ScoredPoint, Value, point_id::PointIdOptions,
	value::Kind,
};

use derrick_domain::Chunk;

use crate::Result;

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &derrick_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url)
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Nearest-neighbour chunk search by cosine similarity. Results keep the
	/// index's descending-score order; ties keep insertion order.
	pub async fn search_chunks(&self, vector: Vec<f32>, limit: u32) -> Result<Vec<Chunk>> {
		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.with_payload(true)
			.limit(limit as u64);
		let response = self.client.query(search).await?;

		Ok(response.result.iter().filter_map(chunk_from_point).collect())
	}

	pub async fn health_check(&self) -> Result<()> {
		self.client.health_check().await?;

		Ok(())
	}
}

fn chunk_from_point(point: &ScoredPoint) -> Option<Chunk> {
	let id = point.id.as_ref().map(point_id_to_string)?;
	let payload = &point.payload;
	let text =
		payload_str(payload, "text").or_else(|| payload_str(payload, "content"))?;
	let document_id = payload_str(payload, "document_id")
		.or_else(|| payload_str(payload, "doc_id"))
		.unwrap_or_default();
	let mentions = payload_str_list(payload, "entities");

	Some(Chunk { id, document_id, text, score: point.score, mentions })
}

fn point_id_to_string(point_id: &PointId) -> String {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => id.clone(),
		Some(PointIdOptions::Num(id)) => id.to_string(),
		None => String::new(),
	}
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;
	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

fn payload_str_list(payload: &HashMap<String, Value>, key: &str) -> Vec<String> {
	let Some(value) = payload.get(key) else {
		return Vec::new();
	};
	let Some(Kind::ListValue(list)) = &value.kind else {
		return Vec::new();
	};

	list.values
		.iter()
		.filter_map(|item| match &item.kind {
			Some(Kind::StringValue(text)) => Some(text.clone()),
			_ => None,
		})
		.collect()
}
