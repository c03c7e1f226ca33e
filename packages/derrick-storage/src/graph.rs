//! Neo4j-backed access to the multi-view graph.
//!
//! Traversal never interprets free-form Cypher from callers; every query is
//! rendered from a static `PathTemplate`, so the set of reachable patterns is
//! exactly the traversal plan table.

use neo4rs::{Graph, query};

use derrick_domain::{Direction, KnownEntity, NodeKind, PathTemplate};

use crate::Result;

/// Node kinds surfaced to the entity matcher. Chunks are seeded by id from
/// vector-search results, not by name recognition.
const MATCHABLE_KINDS: [NodeKind; 7] = [
	NodeKind::Person,
	NodeKind::Role,
	NodeKind::Team,
	NodeKind::Asset,
	NodeKind::Component,
	NodeKind::Location,
	NodeKind::Document,
];

const KNOWN_ENTITY_LIMIT: i64 = 5_000;

pub struct GraphStore {
	pub graph: Graph,
}
impl GraphStore {
	pub async fn connect(cfg: &derrick_config::Neo4j) -> Result<Self> {
		let graph = Graph::new(&cfg.uri, &cfg.user, &cfg.password).await?;

		Ok(Self { graph })
	}

	/// Names and ids of every node the matcher may recognize in query text.
	pub async fn known_entities(&self) -> Result<Vec<KnownEntity>> {
		// Labels are static identifiers from the schema vocabulary, so they
		// are rendered inline rather than passed as a parameter.
		let labels: Vec<String> =
			MATCHABLE_KINDS.iter().map(|kind| format!("'{}'", kind.label())).collect();
		let cypher = format!(
			"MATCH (n)\n\
			 WHERE any(label IN labels(n) WHERE label IN [{}])\n\
			 RETURN labels(n)[0] AS label, n.name AS name, n.id AS id\n\
			 LIMIT $limit",
			labels.join(", ")
		);
		let mut rows = self
			.graph
			.execute(query(&cypher).param("limit", KNOWN_ENTITY_LIMIT))
			.await?;
		let mut out = Vec::new();

		while let Some(row) = rows.next().await? {
			let Some(kind) =
				row.get::<String>("label").ok().as_deref().and_then(NodeKind::parse_label)
			else {
				continue;
			};
			let name = row.get::<String>("name").ok();
			let id = row.get::<String>("id").ok();

			for value in [name, id].into_iter().flatten() {
				if value.trim().is_empty() {
					continue;
				}

				out.push(KnownEntity { name: value, kind });
			}
		}

		Ok(out)
	}

	/// Walk one path template from a seed node, returning the node names
	/// along each matched path (seed first). Seeds match by name or id,
	/// case-insensitively.
	pub async fn traverse(
		&self,
		template: &PathTemplate,
		seed: &str,
		limit: u32,
	) -> Result<Vec<Vec<String>>> {
		let cypher = render_traversal_cypher(template);
		let mut rows = self
			.graph
			.execute(query(&cypher).param("seed", seed).param("limit", limit as i64))
			.await?;
		let columns = template.steps.len() + 1;
		let mut out = Vec::new();

		while let Some(row) = rows.next().await? {
			let mut names = Vec::with_capacity(columns);

			for index in 0..columns {
				match row.get::<String>(&format!("c{index}")) {
					Ok(name) => names.push(name),
					Err(_) => break,
				}
			}

			if names.len() == columns {
				out.push(names);
			}
		}

		Ok(out)
	}

	pub async fn health_check(&self) -> Result<()> {
		let mut rows = self.graph.execute(query("RETURN 1 AS ok")).await?;
		rows.next().await?;

		Ok(())
	}
}

/// Render a template into a single MATCH over the full path. Every returned
/// column falls back to the node id when a name is absent.
fn render_traversal_cypher(template: &PathTemplate) -> String {
	let mut pattern = format!("(n0:{}", template.seed.label());
	pattern.push(')');

	for (index, step) in template.steps.iter().enumerate() {
		let next = index + 1;
		let arrow = match step.direction {
			Direction::Out => format!("-[:{}]->", step.relation.as_str()),
			Direction::In => format!("<-[:{}]-", step.relation.as_str()),
		};

		pattern.push_str(&arrow);
		pattern.push_str(&format!("(n{next}:{})", step.to.label()));
	}

	let returns: Vec<String> = (0..=template.steps.len())
		.map(|index| format!("coalesce(n{index}.name, n{index}.id) AS c{index}"))
		.collect();

	format!(
		"MATCH {pattern}\n\
		 WHERE toLower(coalesce(n0.name, '')) = toLower($seed) OR n0.id = $seed\n\
		 RETURN {}\n\
		 LIMIT $limit",
		returns.join(", ")
	)
}

#[cfg(test)]
mod tests {
	use derrick_domain::{Intent, graph::traversal_plan};

	use super::*;

	#[test]
	fn renders_outbound_chain() {
		let template = traversal_plan(Intent::People)
			.iter()
			.find(|template| template.seed == NodeKind::Person && template.steps.len() == 2)
			.expect("People plan must include the two-hop person template.");
		let cypher = render_traversal_cypher(template);

		assert!(cypher.contains("(n0:Person)-[:HAS_ROLE]->(n1:Role)-[:RESPONSIBLE_FOR]->(n2:Asset)"));
		assert!(cypher.contains("coalesce(n2.name, n2.id) AS c2"));
	}

	#[test]
	fn renders_inbound_chain_from_asset_seed() {
		let template = traversal_plan(Intent::People)
			.iter()
			.find(|template| template.seed == NodeKind::Asset)
			.expect("People plan must include the asset-seeded template.");
		let cypher = render_traversal_cypher(template);

		assert!(
			cypher.contains("(n0:Asset)<-[:RESPONSIBLE_FOR]-(n1:Role)<-[:HAS_ROLE]-(n2:Person)")
		);
	}

	#[test]
	fn seed_match_covers_name_and_id() {
		let template = &traversal_plan(Intent::AssetInfo)[0];
		let cypher = render_traversal_cypher(template);

		assert!(cypher.contains("toLower(coalesce(n0.name, '')) = toLower($seed)"));
		assert!(cypher.contains("n0.id = $seed"));
	}
}
