use crate::pipeline::RetrievalStep;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The pipeline's failure taxonomy. Everything except `Generation` and
/// `InvalidRequest` is recovered inside the orchestrator; `Generation`
/// carries the partial trace so callers can see how far retrieval got.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Intent classification failed: {message}")]
	Classification { message: String },
	#[error("Vector index unavailable: {message}")]
	IndexUnavailable { message: String },
	#[error("Graph unavailable: {message}")]
	GraphUnavailable { message: String },
	#[error("Generation failed: {message}")]
	Generation { message: String, steps: Vec<RetrievalStep> },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
}
