use derrick_domain::{
	Chunk, EntityMention, GraphFact, Intent, KnownEntity, NodeKind, PathTemplate,
	graph::{render_fact, traversal_plan},
};

use crate::{Error, Result, RetrievalService};

/// Paths fetched per seed per template.
const TRAVERSAL_LIMIT: u32 = 10;

/// Graph expansion output. `mentions` holds the entities recognized in the
/// query/chunks plus the ones resolved along matched paths; it becomes the
/// session turn recorded after the pipeline completes.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
	pub facts: Vec<GraphFact>,
	pub mentions: Vec<EntityMention>,
}

impl RetrievalService {
	/// Walk the intent's traversal plan from every recognized entity. An
	/// empty fact list is a valid outcome, not an error; only connectivity
	/// failures surface as `GraphUnavailable`.
	pub(crate) async fn expand_graph(
		&self,
		intent: Intent,
		query: &str,
		chunks: &[Chunk],
	) -> Result<Expansion> {
		let known = self
			.graph
			.known_entities()
			.await
			.map_err(|err| Error::GraphUnavailable { message: err.to_string() })?;
		let mentions = self.recognize_entities(query, chunks, &known);
		let plan = traversal_plan(intent);
		let max_seeds = self.cfg.retrieval.max_seed_entities as usize;
		let mut collected: Vec<(usize, usize, GraphFact)> = Vec::new();
		let mut resolved: Vec<EntityMention> = mentions.clone();

		for (template_index, template) in plan.iter().enumerate() {
			for seed in seeds_for(template, &mentions, chunks, max_seeds) {
				let rows = self
					.graph
					.traverse(template, &seed, TRAVERSAL_LIMIT)
					.await
					.map_err(|err| Error::GraphUnavailable { message: err.to_string() })?;

				for row in rows {
					let Some(sentence) = render_fact(template, &row) else {
						continue;
					};

					extend_resolved(&mut resolved, template, &row);
					collected.push((
						template.hops(),
						template_index,
						GraphFact { sentence, path: row, hops: template.hops() },
					));
				}
			}
		}

		let facts = order_facts(collected, self.cfg.retrieval.max_graph_facts as usize);

		Ok(Expansion { facts, mentions: resolved })
	}

	fn recognize_entities(
		&self,
		query: &str,
		chunks: &[Chunk],
		known: &[KnownEntity],
	) -> Vec<EntityMention> {
		let mut haystack = String::from(query);

		for chunk in chunks {
			haystack.push('\n');
			haystack.push_str(&chunk.text);

			for mention in &chunk.mentions {
				haystack.push('\n');
				haystack.push_str(mention);
			}
		}

		let mut mentions = self.matcher.matches(&haystack, known);

		mentions.truncate(self.cfg.retrieval.max_seed_entities as usize);

		mentions
	}
}

/// Seeds for one template: chunk-anchored templates walk from the retrieved
/// chunk ids, everything else from recognized entities of the seed kind.
fn seeds_for(
	template: &PathTemplate,
	mentions: &[EntityMention],
	chunks: &[Chunk],
	max_seeds: usize,
) -> Vec<String> {
	if template.seed == NodeKind::Chunk {
		return chunks.iter().take(max_seeds).map(|chunk| chunk.id.clone()).collect();
	}

	mentions
		.iter()
		.filter(|mention| mention.kind == template.seed)
		.take(max_seeds)
		.map(|mention| mention.name.clone())
		.collect()
}

/// Entities resolved along a matched path join the turn's mention list, so a
/// follow-up like "what is his role?" can refer to a person the graph
/// surfaced rather than one the user typed. Chunk nodes are ids, not
/// referents, and are skipped.
fn extend_resolved(resolved: &mut Vec<EntityMention>, template: &PathTemplate, row: &[String]) {
	let kinds = std::iter::once(template.seed).chain(template.steps.iter().map(|step| step.to));

	for (kind, name) in kinds.zip(row.iter()) {
		if kind == NodeKind::Chunk {
			continue;
		}
		if resolved.iter().any(|mention| mention.name.eq_ignore_ascii_case(name)) {
			continue;
		}

		resolved.push(EntityMention { name: name.clone(), kind });
	}
}

/// Higher-specificity paths first, then traversal plan order; duplicates
/// collapse on the rendered sentence.
fn order_facts(mut collected: Vec<(usize, usize, GraphFact)>, cap: usize) -> Vec<GraphFact> {
	collected.sort_by_key(|(hops, template_index, _)| (std::cmp::Reverse(*hops), *template_index));

	let mut seen = std::collections::HashSet::new();
	let mut out = Vec::new();

	for (_, _, fact) in collected {
		if !seen.insert(fact.sentence.clone()) {
			continue;
		}

		out.push(fact);

		if out.len() >= cap {
			break;
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use derrick_domain::graph::traversal_plan;

	use super::*;

	fn fact(sentence: &str, hops: usize) -> GraphFact {
		GraphFact { sentence: sentence.to_string(), path: vec![], hops }
	}

	#[test]
	fn chunk_templates_seed_from_chunk_ids() {
		let plan = traversal_plan(Intent::Procedure);
		let chunk_template = plan
			.iter()
			.find(|template| template.seed == NodeKind::Chunk)
			.expect("Procedure plan must include a chunk-seeded template.");
		let chunks = vec![
			Chunk {
				id: "c1".to_string(),
				document_id: "d1".to_string(),
				text: String::new(),
				score: 0.9,
				mentions: vec![],
			},
			Chunk {
				id: "c2".to_string(),
				document_id: "d1".to_string(),
				text: String::new(),
				score: 0.8,
				mentions: vec![],
			},
		];
		let seeds = seeds_for(chunk_template, &[], &chunks, 5);

		assert_eq!(seeds, vec!["c1".to_string(), "c2".to_string()]);
	}

	#[test]
	fn entity_templates_seed_from_matching_kind_only() {
		let plan = traversal_plan(Intent::People);
		let asset_template = plan
			.iter()
			.find(|template| template.seed == NodeKind::Asset)
			.expect("People plan must include an asset-seeded template.");
		let mentions = vec![
			EntityMention { name: "John Smith".to_string(), kind: NodeKind::Person },
			EntityMention { name: "P-101".to_string(), kind: NodeKind::Asset },
		];
		let seeds = seeds_for(asset_template, &mentions, &[], 5);

		assert_eq!(seeds, vec!["P-101".to_string()]);
	}

	#[test]
	fn path_entities_join_resolved_mentions() {
		let plan = traversal_plan(Intent::People);
		let asset_template = plan
			.iter()
			.find(|template| template.seed == NodeKind::Asset)
			.expect("People plan must include an asset-seeded template.");
		let mut resolved =
			vec![EntityMention { name: "P-101".to_string(), kind: NodeKind::Asset }];
		let row = vec![
			"P-101".to_string(),
			"Mechanical Technician".to_string(),
			"John Smith".to_string(),
		];

		extend_resolved(&mut resolved, asset_template, &row);

		assert_eq!(resolved.len(), 3);
		assert_eq!(resolved[2].name, "John Smith");
		assert_eq!(resolved[2].kind, NodeKind::Person);
	}

	#[test]
	fn orders_by_specificity_then_plan_order() {
		let collected = vec![
			(1, 3, fact("one-hop late", 1)),
			(2, 1, fact("two-hop", 2)),
			(1, 0, fact("one-hop early", 1)),
		];
		let ordered = order_facts(collected, 10);
		let sentences: Vec<&str> =
			ordered.iter().map(|fact| fact.sentence.as_str()).collect();

		assert_eq!(sentences, vec!["two-hop", "one-hop early", "one-hop late"]);
	}

	#[test]
	fn dedups_on_sentence_and_caps() {
		let collected = vec![
			(1, 0, fact("same", 1)),
			(1, 0, fact("same", 1)),
			(1, 1, fact("other", 1)),
			(1, 2, fact("third", 1)),
		];
		let ordered = order_facts(collected, 2);

		assert_eq!(ordered.len(), 2);
		assert_eq!(ordered[0].sentence, "same");
		assert_eq!(ordered[1].sentence, "other");
	}
}
