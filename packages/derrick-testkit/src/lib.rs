//! Deterministic stand-ins for the pipeline's remote capabilities.
//!
//! Classification, scoring, and generation are stochastic in production, so
//! tests never assert on live model output; they wire these doubles through
//! the service's capability traits instead.

use std::{
	collections::VecDeque,
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use color_eyre::eyre;
use serde_json::{Map, Value};

use derrick_config::{
	Config, EmbeddingProviderConfig, Fusion, LlmProviderConfig, Neo4j, Providers, Qdrant,
	Retrieval, Service, SessionConfig, Storage,
};
use derrick_domain::{Chunk, KnownEntity, PathTemplate, Relation};
use derrick_retrieval::{
	BoxFuture, CompletionProvider, EmbeddingProvider, GraphSource, VectorIndex,
};

/// Embeds every text to the same fixed vector.
pub struct StaticEmbedding {
	pub dimensions: usize,
}

impl EmbeddingProvider for StaticEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		let vector = vec![0.1; self.dimensions];

		Box::pin(async move { Ok(vector) })
	}
}

pub struct FailingEmbedding;

impl EmbeddingProvider for FailingEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(async move { Err(eyre::eyre!("Embedding service is down.")) })
	}
}

/// A completion double routed by prompt role: classification calls get the
/// configured classification payload, scoring calls pop from the score queue
/// (falling back to the default), and text generation returns the fixed
/// answer. Any unset piece fails, which is how tests force stage failures.
pub struct ScriptedCompletion {
	classification: Option<Value>,
	scores: Mutex<VecDeque<Value>>,
	default_score: Option<Value>,
	answer: Option<String>,
	json_calls: AtomicUsize,
	text_calls: AtomicUsize,
}

impl ScriptedCompletion {
	pub fn new() -> Self {
		Self {
			classification: None,
			scores: Mutex::new(VecDeque::new()),
			default_score: Some(serde_json::json!({ "score": 0.5 })),
			answer: Some("Scripted answer.".to_string()),
			json_calls: AtomicUsize::new(0),
			text_calls: AtomicUsize::new(0),
		}
	}

	pub fn classify_as(mut self, intent: &str, confidence: f64) -> Self {
		self.classification = Some(serde_json::json!({
			"intent": intent,
			"confidence": confidence,
			"reasoning": "scripted",
		}));

		self
	}

	pub fn classify_raw(mut self, value: Value) -> Self {
		self.classification = Some(value);

		self
	}

	pub fn failing_classification(mut self) -> Self {
		self.classification = None;

		self
	}

	pub fn score_queue(self, scores: &[f64]) -> Self {
		{
			let mut queue = self.scores.lock().unwrap_or_else(|err| err.into_inner());

			for score in scores {
				queue.push_back(serde_json::json!({ "score": score }));
			}
		}

		self
	}

	pub fn default_score(mut self, score: f64) -> Self {
		self.default_score = Some(serde_json::json!({ "score": score }));

		self
	}

	pub fn failing_scores(mut self) -> Self {
		self.default_score = None;

		self
	}

	pub fn answer_with(mut self, answer: &str) -> Self {
		self.answer = Some(answer.to_string());

		self
	}

	pub fn failing_generation(mut self) -> Self {
		self.answer = None;

		self
	}

	pub fn json_call_count(&self) -> usize {
		self.json_calls.load(Ordering::SeqCst)
	}

	pub fn text_call_count(&self) -> usize {
		self.text_calls.load(Ordering::SeqCst)
	}
}

impl Default for ScriptedCompletion {
	fn default() -> Self {
		Self::new()
	}
}

fn system_content(messages: &[Value]) -> &str {
	messages
		.first()
		.and_then(|message| message.get("content"))
		.and_then(|content| content.as_str())
		.unwrap_or_default()
}

impl CompletionProvider for ScriptedCompletion {
	fn complete_json<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		self.json_calls.fetch_add(1, Ordering::SeqCst);

		let system = system_content(messages);
		let response = if system.contains("intent classifier") {
			self.classification
				.clone()
				.ok_or_else(|| eyre::eyre!("Classification service is down."))
		} else {
			let queued = {
				let mut queue = self.scores.lock().unwrap_or_else(|err| err.into_inner());

				queue.pop_front()
			};

			queued
				.or_else(|| self.default_score.clone())
				.ok_or_else(|| eyre::eyre!("Scoring service is down."))
		};

		Box::pin(async move { response })
	}

	fn complete_text<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		self.text_calls.fetch_add(1, Ordering::SeqCst);

		let answer =
			self.answer.clone().ok_or_else(|| eyre::eyre!("Generation service is down."));

		Box::pin(async move { answer })
	}
}

/// Serves a fixed chunk list in insertion order.
pub struct StaticVectorIndex {
	pub chunks: Vec<Chunk>,
}

impl VectorIndex for StaticVectorIndex {
	fn search<'a>(
		&'a self,
		_vector: Vec<f32>,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Chunk>>> {
		let chunks: Vec<Chunk> = self.chunks.iter().take(limit as usize).cloned().collect();

		Box::pin(async move { Ok(chunks) })
	}

	fn ping<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move { Ok(()) })
	}
}

pub struct FailingVectorIndex;

impl VectorIndex for FailingVectorIndex {
	fn search<'a>(
		&'a self,
		_vector: Vec<f32>,
		_limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Chunk>>> {
		Box::pin(async move { Err(eyre::eyre!("Vector index is down.")) })
	}

	fn ping<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move { Err(eyre::eyre!("Vector index is down.")) })
	}
}

/// One scripted traversal result: rows served when a template with this
/// relation sequence is walked from this seed.
#[derive(Debug, Clone)]
pub struct Route {
	pub seed: String,
	pub relations: Vec<Relation>,
	pub rows: Vec<Vec<String>>,
}

/// An in-memory graph double: fixed entity list, fixed traversal routes.
#[derive(Debug, Clone, Default)]
pub struct StaticGraph {
	pub entities: Vec<KnownEntity>,
	pub routes: Vec<Route>,
}

impl StaticGraph {
	pub fn new(entities: Vec<KnownEntity>, routes: Vec<Route>) -> Self {
		Self { entities, routes }
	}
}

impl GraphSource for StaticGraph {
	fn known_entities<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<Vec<KnownEntity>>> {
		let entities = self.entities.clone();

		Box::pin(async move { Ok(entities) })
	}

	fn traverse<'a>(
		&'a self,
		template: &'a PathTemplate,
		seed: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<String>>>> {
		let relations: Vec<Relation> =
			template.steps.iter().map(|step| step.relation).collect();
		let rows: Vec<Vec<String>> = self
			.routes
			.iter()
			.filter(|route| {
				route.relations == relations && route.seed.eq_ignore_ascii_case(seed)
			})
			.flat_map(|route| route.rows.iter().cloned())
			.take(limit as usize)
			.collect();

		Box::pin(async move { Ok(rows) })
	}

	fn ping<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move { Ok(()) })
	}
}

pub struct FailingGraph;

impl GraphSource for FailingGraph {
	fn known_entities<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<Vec<KnownEntity>>> {
		Box::pin(async move { Err(eyre::eyre!("Graph database is down.")) })
	}

	fn traverse<'a>(
		&'a self,
		_template: &'a PathTemplate,
		_seed: &'a str,
		_limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<String>>>> {
		Box::pin(async move { Err(eyre::eyre!("Graph database is down.")) })
	}

	fn ping<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move { Err(eyre::eyre!("Graph database is down.")) })
	}
}

pub fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		storage: Storage {
			qdrant: Qdrant {
				url: "http://127.0.0.1:1".to_string(),
				collection: "test_chunks".to_string(),
				vector_dim: 8,
				timeout_ms: 1_000,
			},
			neo4j: Neo4j {
				uri: "bolt://127.0.0.1:1".to_string(),
				user: "neo4j".to_string(),
				password: "test".to_string(),
				timeout_ms: 1_000,
			},
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/".to_string(),
				model: "test".to_string(),
				dimensions: 8,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			llm: LlmProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/".to_string(),
				model: "test".to_string(),
				temperature: 0.0,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		retrieval: Retrieval::default(),
		fusion: Fusion::default(),
		session: SessionConfig::default(),
	}
}

/// A chunk with the given id/text/score and no recorded mentions.
pub fn chunk(id: &str, text: &str, score: f32) -> Chunk {
	Chunk {
		id: id.to_string(),
		document_id: format!("doc-{id}"),
		text: text.to_string(),
		score,
		mentions: Vec::new(),
	}
}
