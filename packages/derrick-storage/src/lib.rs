pub mod error;
pub mod graph;
pub mod qdrant;

pub use error::Error;
pub use graph::GraphStore;
pub use qdrant::QdrantStore;

pub type Result<T, E = Error> = std::result::Result<T, E>;
