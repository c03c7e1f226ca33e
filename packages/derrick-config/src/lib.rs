mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Fusion, LlmProviderConfig, Neo4j, Providers, Qdrant,
	Retrieval, Service, SessionConfig, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.storage.neo4j.uri.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.neo4j.uri must be non-empty.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm", &cfg.providers.llm.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if cfg.retrieval.vector_top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.vector_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.rerank_top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.rerank_top_k must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.retrieval.rerank_blend) {
		return Err(Error::Validation {
			message: "retrieval.rerank_blend must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.retrieval.graph_fact_baseline) {
		return Err(Error::Validation {
			message: "retrieval.graph_fact_baseline must be in the range 0.0-1.0.".to_string(),
		});
	}

	let mut weight_sum = 0.0f32;

	for (label, weight) in [
		("fusion.intent_weight", cfg.fusion.intent_weight),
		("fusion.vector_weight", cfg.fusion.vector_weight),
		("fusion.rerank_weight", cfg.fusion.rerank_weight),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if weight < 0.0 {
			return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
		}

		weight_sum += weight;
	}

	if weight_sum <= 0.0 {
		return Err(Error::Validation {
			message: "fusion weights must sum to a positive value.".to_string(),
		});
	}

	if cfg.session.ttl_seconds == 0 {
		return Err(Error::Validation {
			message: "session.ttl_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.session.max_turns == 0 {
		return Err(Error::Validation {
			message: "session.max_turns must be greater than zero.".to_string(),
		});
	}

	Ok(())
}
