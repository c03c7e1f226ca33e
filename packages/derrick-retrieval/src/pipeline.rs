use std::time::{Duration, Instant};

use serde_json::json;
use uuid::Uuid;

use derrick_domain::{EvidenceItem, FusedContext, Intent, Provenance};

use crate::{Error, Expansion, IntentOutcome, Result, RetrievalService, Turn, fusion};

#[derive(Debug, Clone)]
pub struct ChatRequest {
	pub message: String,
	pub session_id: Option<Uuid>,
}

/// One trace record per stage transition. Purely additive observability;
/// no later stage ever reads the trace.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RetrievalStep {
	pub stage: String,
	pub duration_ms: u64,
	pub description: String,
	pub data: serde_json::Value,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SourceRef {
	pub text: String,
	pub score: f32,
	pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RetrievalOutcome {
	pub message: String,
	pub intent: Intent,
	pub confidence: f32,
	pub graph_facts: Vec<String>,
	pub sources: Vec<SourceRef>,
	pub retrieval_steps: Vec<RetrievalStep>,
	pub session_id: Uuid,
}

/// Pipeline states. `Failed` is terminal and reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	Received,
	Classified,
	Searched,
	Expanded,
	Reranked,
	Fused,
	Generated,
	Completed,
	Failed,
}

impl Stage {
	pub fn name(self) -> &'static str {
		match self {
			Self::Received => "received",
			Self::Classified => "classified",
			Self::Searched => "searched",
			Self::Expanded => "expanded",
			Self::Reranked => "reranked",
			Self::Fused => "fused",
			Self::Generated => "generated",
			Self::Completed => "completed",
			Self::Failed => "failed",
		}
	}
}

fn step(
	stage: Stage,
	elapsed: Duration,
	description: impl Into<String>,
	data: serde_json::Value,
) -> RetrievalStep {
	RetrievalStep {
		stage: stage.name().to_string(),
		duration_ms: elapsed.as_millis() as u64,
		description: description.into(),
		data,
	}
}

impl RetrievalService {
	/// Run the full pipeline for one query.
	///
	/// Classification and vector search have no data dependency on each
	/// other and run concurrently; everything downstream is ordered. Local
	/// recoveries (default intent, vector-only, graph-only, empty-context)
	/// happen here; only generation failure and invalid input surface as
	/// errors.
	pub async fn answer(&self, req: ChatRequest) -> Result<RetrievalOutcome> {
		let message = req.message.trim().to_string();

		if message.is_empty() {
			return Err(Error::InvalidRequest { message: "message must be non-empty.".to_string() });
		}

		let session_id = req.session_id.unwrap_or_else(Uuid::new_v4);
		let mut steps: Vec<RetrievalStep> = Vec::new();
		let pipeline_start = Instant::now();

		let resolved = self.sessions.resolve_references(session_id, &message).await;

		steps.push(step(
			Stage::Received,
			pipeline_start.elapsed(),
			"Received query.",
			json!({ "query": message, "resolved_query": resolved }),
		));

		let classify = async {
			let start = Instant::now();
			(self.classify_intent(&resolved).await, start.elapsed())
		};
		let search = async {
			let start = Instant::now();
			(self.vector_search(&resolved).await, start.elapsed())
		};
		let ((intent_result, intent_elapsed), (search_result, search_elapsed)) =
			tokio::join!(classify, search);

		let intent_outcome = match intent_result {
			Ok(outcome) => {
				steps.push(step(
					Stage::Classified,
					intent_elapsed,
					format!("Classified as '{}'.", outcome.intent),
					json!({
						"intent": outcome.intent,
						"confidence": outcome.confidence,
						"reasoning": outcome.reasoning,
					}),
				));

				outcome
			},
			Err(err) => {
				tracing::warn!(error = %err, "Intent classification failed; using default intent.");
				steps.push(step(
					Stage::Classified,
					intent_elapsed,
					"Classification failed; defaulting to 'asset_info'.",
					json!({
						"intent": Intent::AssetInfo,
						"confidence": 0.0,
						"error": err.to_string(),
					}),
				));

				IntentOutcome { intent: Intent::AssetInfo, confidence: 0.0, reasoning: String::new() }
			},
		};

		let (chunks, vector_degraded) = match search_result {
			Ok(chunks) => {
				let top_scores: Vec<f32> =
					chunks.iter().take(3).map(|chunk| chunk.score).collect();

				steps.push(step(
					Stage::Searched,
					search_elapsed,
					format!("Retrieved {} candidates from the vector index.", chunks.len()),
					json!({ "candidates": chunks.len(), "top_scores": top_scores }),
				));

				(chunks, false)
			},
			Err(err) => {
				tracing::warn!(error = %err, "Vector search failed; continuing graph-only.");
				steps.push(step(
					Stage::Searched,
					search_elapsed,
					"Vector index unavailable; continuing graph-only.",
					json!({ "candidates": 0, "error": err.to_string() }),
				));

				(Vec::new(), true)
			},
		};
		// Skip connection: the best similarity score survives no matter what
		// the reranker does with the chunk itself.
		let top_vector_score = chunks.first().map(|chunk| chunk.score).unwrap_or(0.0);

		let expand_start = Instant::now();
		let (expansion, graph_degraded) =
			match self.expand_graph(intent_outcome.intent, &resolved, &chunks).await {
				Ok(expansion) => {
					let sample: Vec<&str> = expansion
						.facts
						.iter()
						.take(3)
						.map(|fact| fact.sentence.as_str())
						.collect();

					steps.push(step(
						Stage::Expanded,
						expand_start.elapsed(),
						format!(
							"Expanded to {} facts from {} entities.",
							expansion.facts.len(),
							expansion.mentions.len()
						),
						json!({
							"facts_count": expansion.facts.len(),
							"entity_count": expansion.mentions.len(),
							"sample_facts": sample,
						}),
					));

					(expansion, false)
				},
				Err(err) => {
					tracing::warn!(error = %err, "Graph expansion failed; continuing vector-only.");
					steps.push(step(
						Stage::Expanded,
						expand_start.elapsed(),
						"Graph unavailable; continuing vector-only.",
						json!({ "facts_count": 0, "error": err.to_string() }),
					));

					(Expansion::default(), true)
				},
			};

		let rerank_start = Instant::now();
		let reranked = self.rerank(&resolved, &chunks, &expansion.facts).await;
		let top_scores: Vec<f32> = reranked.iter().take(3).map(|item| item.score).collect();

		steps.push(step(
			Stage::Reranked,
			rerank_start.elapsed(),
			format!("Reranked to top {} evidence items.", reranked.len()),
			json!({ "reranked_count": reranked.len(), "top_scores": top_scores }),
		));

		let fuse_start = Instant::now();
		let mut fused = fusion::fuse(
			&self.cfg.fusion,
			intent_outcome.intent,
			intent_outcome.confidence,
			top_vector_score,
			reranked,
		);
		let no_evidence = vector_degraded && graph_degraded;

		if no_evidence {
			fused.confidence = 0.0;
		}

		let from_graph =
			fused.evidence.iter().filter(|item| item.provenance() == Provenance::Graph).count();

		steps.push(step(
			Stage::Fused,
			fuse_start.elapsed(),
			format!("Fused {} evidence pieces with skip connections.", fused.evidence.len()),
			json!({
				"total_evidence": fused.evidence.len(),
				"from_graph": from_graph,
				"from_document": fused.evidence.len() - from_graph,
				"intent_confidence": fused.intent_confidence,
				"top_vector_score": fused.top_vector_score,
				"confidence": fused.confidence,
				"no_evidence": no_evidence,
			}),
		));

		let generate_start = Instant::now();
		let context_items = fused.evidence.len().min(self.cfg.retrieval.context_max_items as usize);
		let messages = generation_messages(&fused, &resolved, context_items);
		let answer = match self
			.providers
			.completion
			.complete_text(&self.cfg.providers.llm, &messages)
			.await
		{
			Ok(text) => text,
			Err(err) => {
				tracing::error!(error = %err, "Answer generation failed.");
				steps.push(step(
					Stage::Failed,
					generate_start.elapsed(),
					"Generation failed.",
					json!({ "error": err.to_string() }),
				));

				return Err(Error::Generation { message: err.to_string(), steps });
			},
		};

		steps.push(step(
			Stage::Generated,
			generate_start.elapsed(),
			"Generated answer from fused context.",
			json!({ "context_items": context_items }),
		));

		let sources = build_sources(&fused, self.cfg.retrieval.snippet_chars as usize);
		let graph_facts: Vec<String> = fused
			.evidence
			.iter()
			.filter_map(|item| match &item.item {
				EvidenceItem::Fact(fact) => Some(fact.sentence.clone()),
				EvidenceItem::Chunk(_) => None,
			})
			.collect();

		self.sessions
			.append(
				session_id,
				Turn {
					query: resolved.clone(),
					intent: intent_outcome.intent,
					entities: expansion.mentions.clone(),
				},
			)
			.await;

		steps.push(step(
			Stage::Completed,
			pipeline_start.elapsed(),
			"Pipeline completed.",
			json!({ "confidence": fused.confidence }),
		));

		Ok(RetrievalOutcome {
			message: answer,
			intent: fused.intent,
			confidence: fused.confidence,
			graph_facts,
			sources,
			retrieval_steps: steps,
			session_id,
		})
	}
}

/// Build the generation prompt. Graph facts go in uncited; document evidence
/// is numbered to match the response's source list, and the model is told to
/// cite those numbers.
fn generation_messages(
	fused: &FusedContext,
	query: &str,
	context_items: usize,
) -> Vec<serde_json::Value> {
	let mut graph_lines = Vec::new();
	let mut document_lines = Vec::new();

	for evidence in fused.evidence.iter().take(context_items) {
		match &evidence.item {
			EvidenceItem::Fact(fact) => graph_lines.push(format!("- {}", fact.sentence)),
			EvidenceItem::Chunk(chunk) => {
				let index = evidence.citation.unwrap_or(0);

				document_lines.push(format!("[{index}] {}", chunk.text));
			},
		}
	}

	let mut context = String::new();

	if !graph_lines.is_empty() {
		context.push_str("Graph facts (established records, no citation needed):\n");
		context.push_str(&graph_lines.join("\n"));
		context.push('\n');
	}
	if !document_lines.is_empty() {
		context.push_str("Documents:\n");
		context.push_str(&document_lines.join("\n\n"));
		context.push('\n');
	}
	if context.is_empty() {
		context.push_str("(no retrieved context)\n");
	}

	let system_prompt = format!(
		"You are a maintenance assistant with access to a multi-view knowledge graph.

The user's query has been classified as: {intent}

Answer based on the provided context, which includes graph facts (from
equipment, people, and maintenance records) and document chunks (from
maintenance manuals).

Guidelines:
- Match your answer's detail level to the question's complexity.
- For simple factual questions (who/what/where), answer directly and concisely.
- For how-to or troubleshooting questions, give step-by-step guidance.
- Cite document sources by number [1], [2], etc. Graph facts need no citation.
- If the context doesn't contain sufficient information, say so clearly.",
		intent = fused.intent
	);

	vec![
		json!({ "role": "system", "content": system_prompt }),
		json!({ "role": "user", "content": format!("Context:\n{context}\nQuestion: {query}") }),
	]
}

/// Document evidence becomes the caller-visible source list, in citation
/// order; graph facts are surfaced separately and never appear here.
fn build_sources(fused: &FusedContext, snippet_chars: usize) -> Vec<SourceRef> {
	fused
		.evidence
		.iter()
		.filter_map(|evidence| match &evidence.item {
			EvidenceItem::Chunk(chunk) => Some(SourceRef {
				text: truncate_chars(&chunk.text, snippet_chars),
				score: evidence.score,
				metadata: json!({
					"chunk_id": chunk.id,
					"document_id": chunk.document_id,
					"citation": evidence.citation,
				}),
			}),
			EvidenceItem::Fact(_) => None,
		})
		.collect()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
	if text.chars().count() <= max_chars {
		return text.to_string();
	}

	let truncated: String = text.chars().take(max_chars).collect();

	format!("{truncated}...")
}

#[cfg(test)]
mod tests {
	use derrick_domain::{Chunk, GraphFact, ScoredEvidence};

	use super::*;

	fn fused_with(evidence: Vec<ScoredEvidence>) -> FusedContext {
		FusedContext {
			evidence,
			intent: Intent::People,
			intent_confidence: 0.9,
			top_vector_score: 0.8,
			confidence: 0.85,
		}
	}

	fn chunk_evidence(text: &str, citation: usize) -> ScoredEvidence {
		ScoredEvidence {
			item: EvidenceItem::Chunk(Chunk {
				id: "c1".to_string(),
				document_id: "d1".to_string(),
				text: text.to_string(),
				score: 0.8,
				mentions: vec![],
			}),
			score: 0.8,
			citation: Some(citation),
		}
	}

	fn fact_evidence(sentence: &str) -> ScoredEvidence {
		ScoredEvidence {
			item: EvidenceItem::Fact(GraphFact {
				sentence: sentence.to_string(),
				path: vec![],
				hops: 2,
			}),
			score: 0.9,
			citation: None,
		}
	}

	#[test]
	fn prompt_separates_graph_facts_from_numbered_documents() {
		let fused = fused_with(vec![
			fact_evidence("John Smith (Mechanical Technician) is responsible for P-101"),
			chunk_evidence("Monthly lubrication is required.", 1),
		]);
		let messages = generation_messages(&fused, "Who maintains P-101?", 15);
		let user = messages[1]["content"].as_str().expect("Missing user content.");

		assert!(user.contains("- John Smith (Mechanical Technician) is responsible for P-101"));
		assert!(user.contains("[1] Monthly lubrication is required."));
		assert!(user.contains("Question: Who maintains P-101?"));
	}

	#[test]
	fn empty_context_is_stated_explicitly() {
		let fused = fused_with(vec![]);
		let messages = generation_messages(&fused, "Who maintains P-101?", 15);
		let user = messages[1]["content"].as_str().expect("Missing user content.");

		assert!(user.contains("(no retrieved context)"));
	}

	#[test]
	fn sources_cover_documents_only_and_truncate() {
		let long_text = "x".repeat(300);
		let fused = fused_with(vec![
			fact_evidence("a graph fact"),
			chunk_evidence(&long_text, 1),
		]);
		let sources = build_sources(&fused, 200);

		assert_eq!(sources.len(), 1);
		assert_eq!(sources[0].text.chars().count(), 203);
		assert!(sources[0].text.ends_with("..."));
		assert_eq!(sources[0].metadata["citation"], 1);
	}

	#[test]
	fn stage_names_are_stable() {
		assert_eq!(Stage::Received.name(), "received");
		assert_eq!(Stage::Failed.name(), "failed");
	}
}
