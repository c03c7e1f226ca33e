use serde_json::Value;

use derrick_domain::{Chunk, EvidenceItem, GraphFact, Provenance, ScoredEvidence};

use crate::RetrievalService;

/// Characters of evidence text shown to the scoring model.
const SCORING_EXCERPT_CHARS: usize = 500;

impl RetrievalService {
	/// Score the union of chunks and graph facts against the query. Scoring
	/// failures never shrink the evidence set: a chunk keeps its similarity
	/// score and a graph fact falls back to the configured baseline.
	pub(crate) async fn rerank(
		&self,
		query: &str,
		chunks: &[Chunk],
		facts: &[GraphFact],
	) -> Vec<ScoredEvidence> {
		let blend = self.cfg.retrieval.rerank_blend;
		let mut scored = Vec::with_capacity(chunks.len() + facts.len());

		for chunk in chunks {
			let score = match self.score_relevance(query, &chunk.text).await {
				Some(llm_score) => (1.0 - blend) * chunk.score + blend * llm_score,
				None => chunk.score,
			};

			scored.push(ScoredEvidence {
				item: EvidenceItem::Chunk(chunk.clone()),
				score,
				citation: None,
			});
		}

		for fact in facts {
			let score = self
				.score_relevance(query, &fact.sentence)
				.await
				.unwrap_or(self.cfg.retrieval.graph_fact_baseline);

			scored.push(ScoredEvidence {
				item: EvidenceItem::Fact(fact.clone()),
				score,
				citation: None,
			});
		}

		order_evidence(&mut scored);
		scored.truncate(self.cfg.retrieval.rerank_top_k as usize);
		assign_citations(&mut scored);

		scored
	}

	async fn score_relevance(&self, query: &str, content: &str) -> Option<f32> {
		let excerpt: String = content.chars().take(SCORING_EXCERPT_CHARS).collect();
		let messages = scoring_messages(query, &excerpt);
		let raw = match self
			.providers
			.completion
			.complete_json(&self.cfg.providers.llm, &messages)
			.await
		{
			Ok(value) => value,
			Err(err) => {
				tracing::warn!(error = %err, "Relevance scoring failed; keeping prior score.");

				return None;
			},
		};

		parse_score(&raw)
	}
}

fn scoring_messages(query: &str, content: &str) -> Vec<Value> {
	let system_prompt = "You are a relevance scorer for maintenance documentation.

Score how relevant the given content is to answering the user's query.

Return a JSON object with:
{
  \"score\": 0.0-1.0,
  \"reasoning\": \"brief explanation\"
}

Scoring guidelines:
- 1.0: directly answers the question with specific details
- 0.7-0.9: highly relevant, contains key information
- 0.4-0.6: somewhat relevant, provides context
- 0.1-0.3: tangentially related
- 0.0: not relevant";

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": format!("Query: {query}\n\nContent: {content}") }),
	]
}

fn parse_score(raw: &Value) -> Option<f32> {
	raw.get("score")
		.and_then(|v| v.as_f64())
		.map(|v| v as f32)
		.filter(|v| (0.0..=1.0).contains(v))
}

/// Descending score; ties go graph-before-document. The sort is stable, so
/// equal (score, provenance) pairs keep their incoming order.
pub(crate) fn order_evidence(scored: &mut [ScoredEvidence]) {
	scored.sort_by(|a, b| {
		b.score
			.partial_cmp(&a.score)
			.unwrap_or(std::cmp::Ordering::Equal)
			.then_with(|| provenance_rank(a.provenance()).cmp(&provenance_rank(b.provenance())))
	});
}

/// Citation indices are 1-based and cover document evidence only.
pub(crate) fn assign_citations(scored: &mut [ScoredEvidence]) {
	let mut next = 1;

	for evidence in scored.iter_mut() {
		evidence.citation = match evidence.provenance() {
			Provenance::Document => {
				let index = next;
				next += 1;

				Some(index)
			},
			Provenance::Graph => None,
		};
	}
}

fn provenance_rank(provenance: Provenance) -> u8 {
	match provenance {
		Provenance::Graph => 0,
		Provenance::Document => 1,
	}
}
