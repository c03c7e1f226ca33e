#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Qdrant(#[from] Box<qdrant_client::QdrantError>),
	#[error(transparent)]
	Graph(#[from] Box<neo4rs::Error>),
	#[error("Invalid payload: {0}")]
	InvalidPayload(String),
}
impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::Qdrant(Box::new(err))
	}
}
impl From<neo4rs::Error> for Error {
	fn from(err: neo4rs::Error) -> Self {
		Self::Graph(Box::new(err))
	}
}
