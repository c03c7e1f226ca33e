//! Context fusion with skip connections.
//!
//! The reranker sits between the cheap early signals (intent, vector
//! similarity) and generation. Fusion re-attaches those early signals to the
//! bundle unconditionally, so a miscalibrated reranker can reorder evidence
//! but can never erase what the pipeline learned first.

use std::collections::HashSet;

use derrick_domain::{FusedContext, Intent, ScoredEvidence, intent::clamp_confidence};

use crate::rerank::{assign_citations, order_evidence};

/// Build the final evidence bundle. `intent_confidence` and
/// `top_vector_score` must be the untouched stage-1/stage-2 outputs; they are
/// stored as-is regardless of what the reranker returned.
pub fn fuse(
	cfg: &derrick_config::Fusion,
	intent: Intent,
	intent_confidence: f32,
	top_vector_score: f32,
	reranked: Vec<ScoredEvidence>,
) -> FusedContext {
	let mut seen = HashSet::new();
	let mut evidence: Vec<ScoredEvidence> = reranked
		.into_iter()
		.filter(|item| seen.insert(item.body().to_string()))
		.collect();

	order_evidence(&mut evidence);
	assign_citations(&mut evidence);

	let top_rerank_score = evidence.first().map(|item| item.score).unwrap_or(0.0);
	let confidence = if evidence.is_empty() {
		0.0
	} else {
		combine_confidence(cfg, intent_confidence, top_vector_score, top_rerank_score)
	};

	FusedContext { evidence, intent, intent_confidence, top_vector_score, confidence }
}

/// Weighted average of the three pipeline signals; the weights are
/// configuration, not constants.
fn combine_confidence(
	cfg: &derrick_config::Fusion,
	intent_confidence: f32,
	top_vector_score: f32,
	top_rerank_score: f32,
) -> f32 {
	let weight_sum = cfg.intent_weight + cfg.vector_weight + cfg.rerank_weight;

	if weight_sum <= 0.0 {
		return 0.0;
	}

	let combined = (cfg.intent_weight * intent_confidence
		+ cfg.vector_weight * top_vector_score
		+ cfg.rerank_weight * top_rerank_score)
		/ weight_sum;

	clamp_confidence(combined)
}

#[cfg(test)]
mod tests {
	use derrick_domain::{Chunk, EvidenceItem, GraphFact, Provenance};

	use super::*;

	fn chunk_evidence(id: &str, text: &str, score: f32) -> ScoredEvidence {
		ScoredEvidence {
			item: EvidenceItem::Chunk(Chunk {
				id: id.to_string(),
				document_id: "d1".to_string(),
				text: text.to_string(),
				score,
				mentions: vec![],
			}),
			score,
			citation: None,
		}
	}

	fn fact_evidence(sentence: &str, score: f32) -> ScoredEvidence {
		ScoredEvidence {
			item: EvidenceItem::Fact(GraphFact {
				sentence: sentence.to_string(),
				path: vec![],
				hops: 1,
			}),
			score,
			citation: None,
		}
	}

	fn cfg() -> derrick_config::Fusion {
		derrick_config::Fusion { intent_weight: 0.3, vector_weight: 0.3, rerank_weight: 0.4 }
	}

	#[test]
	fn skip_connections_survive_an_empty_rerank() {
		let fused = fuse(&cfg(), Intent::People, 0.92, 0.81, Vec::new());

		assert_eq!(fused.intent, Intent::People);
		assert!((fused.intent_confidence - 0.92).abs() < f32::EPSILON);
		assert!((fused.top_vector_score - 0.81).abs() < f32::EPSILON);
		assert_eq!(fused.confidence, 0.0);
	}

	#[test]
	fn skip_connections_ignore_reranker_scores() {
		let reranked = vec![chunk_evidence("c1", "low similarity chunk", 0.99)];
		let fused = fuse(&cfg(), Intent::AssetInfo, 0.4, 0.15, reranked);

		// The reranker promoted the chunk to 0.99 but the carried-forward
		// vector signal is still the original 0.15.
		assert!((fused.top_vector_score - 0.15).abs() < f32::EPSILON);
		assert!((fused.intent_confidence - 0.4).abs() < f32::EPSILON);
	}

	#[test]
	fn dedups_by_body_keeping_first() {
		let reranked = vec![
			fact_evidence("P-101 is located at Pump Room", 0.9),
			fact_evidence("P-101 is located at Pump Room", 0.5),
			chunk_evidence("c1", "pump manual text", 0.7),
		];
		let fused = fuse(&cfg(), Intent::AssetInfo, 0.8, 0.7, reranked);

		assert_eq!(fused.evidence.len(), 2);
		assert!((fused.evidence[0].score - 0.9).abs() < f32::EPSILON);
	}

	#[test]
	fn graph_precedes_documents_of_equal_score() {
		let reranked = vec![
			chunk_evidence("c1", "chunk text", 0.8),
			fact_evidence("fact sentence", 0.8),
		];
		let fused = fuse(&cfg(), Intent::People, 0.9, 0.8, reranked);

		assert_eq!(fused.evidence[0].provenance(), Provenance::Graph);
		assert_eq!(fused.evidence[0].citation, None);
		assert_eq!(fused.evidence[1].provenance(), Provenance::Document);
		assert_eq!(fused.evidence[1].citation, Some(1));
	}

	#[test]
	fn confidence_is_the_configured_weighted_average() {
		let reranked = vec![chunk_evidence("c1", "text", 0.5)];
		let fused = fuse(&cfg(), Intent::People, 1.0, 0.0, reranked);
		let expected = (0.3 * 1.0 + 0.3 * 0.0 + 0.4 * 0.5) / 1.0;

		assert!((fused.confidence - expected).abs() < 1e-6);
	}
}
