pub mod error;
pub mod expand;
pub mod fusion;
pub mod intent;
pub mod pipeline;
pub mod rerank;
pub mod session;
pub mod vector;

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use serde_json::Value;

use derrick_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use derrick_domain::{Chunk, EntityMatcher, KnownEntity, PathTemplate, SubstringMatcher};
use derrick_providers::{completion, embedding};
use derrick_storage::{GraphStore, QdrantStore};

pub use error::{Error, Result};
pub use expand::Expansion;
pub use intent::IntentOutcome;
pub use pipeline::{ChatRequest, RetrievalOutcome, RetrievalStep, SourceRef, Stage};
pub use session::{Session, SessionStore, Turn};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>>;
}

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete_json<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>>;

	fn complete_text<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

/// The vector index consumed as a capability, so tests and degradation
/// scenarios can swap the real Qdrant collection for a double.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Chunk>>>;

	fn ping<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<()>>;
}

/// The multi-view graph consumed as a capability.
pub trait GraphSource
where
	Self: Send + Sync,
{
	fn known_entities<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<Vec<KnownEntity>>>;

	fn traverse<'a>(
		&'a self,
		template: &'a PathTemplate,
		seed: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<String>>>>;

	fn ping<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub completion: Arc<dyn CompletionProvider>,
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		completion: Arc<dyn CompletionProvider>,
	) -> Self {
		Self { embedding, completion }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { embedding: provider.clone(), completion: provider }
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(embedding::embed(cfg, text))
	}
}

impl CompletionProvider for DefaultProviders {
	fn complete_json<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		Box::pin(completion::complete_json(cfg, messages))
	}

	fn complete_text<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(completion::complete_text(cfg, messages))
	}
}

/// Qdrant behind the `VectorIndex` seam, with the configured call timeout.
pub struct DefaultVectorIndex {
	store: QdrantStore,
	timeout: Duration,
}

impl DefaultVectorIndex {
	pub fn new(store: QdrantStore, cfg: &derrick_config::Qdrant) -> Self {
		Self { store, timeout: Duration::from_millis(cfg.timeout_ms) }
	}
}

impl VectorIndex for DefaultVectorIndex {
	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Chunk>>> {
		Box::pin(async move {
			let chunks =
				tokio::time::timeout(self.timeout, self.store.search_chunks(vector, limit))
					.await
					.map_err(|_| color_eyre::eyre::eyre!("Vector search timed out."))??;

			Ok(chunks)
		})
	}

	fn ping<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move {
			tokio::time::timeout(self.timeout, self.store.health_check())
				.await
				.map_err(|_| color_eyre::eyre::eyre!("Vector index ping timed out."))??;

			Ok(())
		})
	}
}

/// Neo4j behind the `GraphSource` seam, with the configured call timeout.
pub struct DefaultGraphSource {
	store: GraphStore,
	timeout: Duration,
}

impl DefaultGraphSource {
	pub fn new(store: GraphStore, cfg: &derrick_config::Neo4j) -> Self {
		Self { store, timeout: Duration::from_millis(cfg.timeout_ms) }
	}
}

impl GraphSource for DefaultGraphSource {
	fn known_entities<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<Vec<KnownEntity>>> {
		Box::pin(async move {
			let entities = tokio::time::timeout(self.timeout, self.store.known_entities())
				.await
				.map_err(|_| color_eyre::eyre::eyre!("Graph entity listing timed out."))??;

			Ok(entities)
		})
	}

	fn traverse<'a>(
		&'a self,
		template: &'a PathTemplate,
		seed: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<String>>>> {
		Box::pin(async move {
			let rows =
				tokio::time::timeout(self.timeout, self.store.traverse(template, seed, limit))
					.await
					.map_err(|_| color_eyre::eyre::eyre!("Graph traversal timed out."))??;

			Ok(rows)
		})
	}

	fn ping<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move {
			tokio::time::timeout(self.timeout, self.store.health_check())
				.await
				.map_err(|_| color_eyre::eyre::eyre!("Graph ping timed out."))??;

			Ok(())
		})
	}
}

/// The retrieval pipeline with all of its collaborators injected. The session
/// store is passed in explicitly; it lives for the process, not the crate.
pub struct RetrievalService {
	pub cfg: Config,
	pub providers: Providers,
	pub vector: Arc<dyn VectorIndex>,
	pub graph: Arc<dyn GraphSource>,
	pub matcher: Arc<dyn EntityMatcher>,
	pub sessions: Arc<SessionStore>,
}

impl RetrievalService {
	pub fn new(cfg: Config, qdrant: QdrantStore, graph: GraphStore) -> Self {
		let vector = Arc::new(DefaultVectorIndex::new(qdrant, &cfg.storage.qdrant));
		let graph = Arc::new(DefaultGraphSource::new(graph, &cfg.storage.neo4j));
		let sessions = Arc::new(SessionStore::new(&cfg.session));

		Self {
			cfg,
			providers: Providers::default(),
			vector,
			graph,
			matcher: Arc::new(SubstringMatcher),
			sessions,
		}
	}

	pub fn with_components(
		cfg: Config,
		providers: Providers,
		vector: Arc<dyn VectorIndex>,
		graph: Arc<dyn GraphSource>,
		matcher: Arc<dyn EntityMatcher>,
		sessions: Arc<SessionStore>,
	) -> Self {
		Self { cfg, providers, vector, graph, matcher, sessions }
	}
}
