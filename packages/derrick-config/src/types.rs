use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub fusion: Fusion,
	#[serde(default)]
	pub session: SessionConfig,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
	pub neo4j: Neo4j,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
	#[serde(default = "default_store_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Neo4j {
	pub uri: String,
	pub user: String,
	pub password: String,
	#[serde(default = "default_store_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	/// Neighbours fetched from the vector index per query.
	pub vector_top_k: u32,
	/// Evidence items surviving the rerank stage.
	pub rerank_top_k: u32,
	pub max_graph_facts: u32,
	/// Entities fed into graph traversal per query.
	pub max_seed_entities: u32,
	/// Blend between the vector similarity and the LLM relevance score for
	/// chunks: final = (1 - blend) * similarity + blend * llm_score.
	pub rerank_blend: f32,
	/// Score a graph fact keeps when its scoring call fails.
	pub graph_fact_baseline: f32,
	/// Evidence items handed to the generator.
	pub context_max_items: u32,
	/// Source snippets returned to the caller are truncated to this length.
	pub snippet_chars: u32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			vector_top_k: 10,
			rerank_top_k: 10,
			max_graph_facts: 30,
			max_seed_entities: 5,
			rerank_blend: 0.6,
			graph_fact_baseline: 0.9,
			context_max_items: 15,
			snippet_chars: 200,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Fusion {
	pub intent_weight: f32,
	pub vector_weight: f32,
	pub rerank_weight: f32,
}
impl Default for Fusion {
	fn default() -> Self {
		Self { intent_weight: 0.3, vector_weight: 0.3, rerank_weight: 0.4 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
	pub ttl_seconds: u64,
	pub max_turns: u32,
	pub sweep_interval_seconds: u64,
}
impl Default for SessionConfig {
	fn default() -> Self {
		Self { ttl_seconds: 1_800, max_turns: 20, sweep_interval_seconds: 300 }
	}
}

fn default_store_timeout_ms() -> u64 {
	5_000
}
