use derrick_domain::Chunk;

use crate::{Error, Result, RetrievalService};

impl RetrievalService {
	/// Embed the query and fetch its nearest chunks. A fresh call re-embeds
	/// and re-queries; there is no cursor to resume.
	pub(crate) async fn vector_search(&self, query: &str) -> Result<Vec<Chunk>> {
		// E5-style models expect the query prefix at embedding time.
		let prefixed = format!("query: {query}");
		let vector = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, &prefixed)
			.await
			.map_err(|err| Error::IndexUnavailable { message: err.to_string() })?;
		let chunks = self
			.vector
			.search(vector, self.cfg.retrieval.vector_top_k)
			.await
			.map_err(|err| Error::IndexUnavailable { message: err.to_string() })?;

		Ok(chunks)
	}
}
