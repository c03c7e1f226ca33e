use crate::intent::Intent;

/// A text span retrieved from the vector index.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Chunk {
	pub id: String,
	pub document_id: String,
	pub text: String,
	/// Cosine similarity against the query embedding, in [0, 1].
	pub score: f32,
	/// Entity names the index recorded for this chunk, when present.
	#[serde(default)]
	pub mentions: Vec<String>,
}

/// A deterministic fact read out of the multi-view graph. Graph facts carry
/// no similarity score; relevance is assigned later by the reranker.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GraphFact {
	/// The rendered natural-language sentence, intermediates included.
	pub sentence: String,
	/// Node names along the matched path, seed first.
	pub path: Vec<String>,
	pub hops: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
	Graph,
	Document,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EvidenceItem {
	Chunk(Chunk),
	Fact(GraphFact),
}

/// One reranked evidence item. Citation indices exist only for document
/// evidence; graph facts are deterministic and never require one.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoredEvidence {
	pub item: EvidenceItem,
	pub score: f32,
	pub citation: Option<usize>,
}

impl ScoredEvidence {
	pub fn provenance(&self) -> Provenance {
		match &self.item {
			EvidenceItem::Chunk(_) => Provenance::Document,
			EvidenceItem::Fact(_) => Provenance::Graph,
		}
	}

	pub fn body(&self) -> &str {
		match &self.item {
			EvidenceItem::Chunk(chunk) => &chunk.text,
			EvidenceItem::Fact(fact) => &fact.sentence,
		}
	}
}

/// The fused evidence bundle handed to the generator.
///
/// `intent_confidence` and `top_vector_score` are skip connections: copies of
/// the stage-1 and stage-2 outputs, carried here untouched so the reranker
/// cannot erase the pipeline's earliest signals. `confidence` is the weighted
/// average of {intent confidence, top vector score, top rerank score} with
/// weights from `[fusion]` config.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FusedContext {
	pub evidence: Vec<ScoredEvidence>,
	pub intent: Intent,
	pub intent_confidence: f32,
	pub top_vector_score: f32,
	pub confidence: f32,
}
