use crate::graph::NodeKind;

/// A node name the graph knows about. `name` may be a display name or an
/// identifier; traversal matches either.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KnownEntity {
	pub name: String,
	pub kind: NodeKind,
}

/// An entity recognized in query or chunk text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EntityMention {
	pub name: String,
	pub kind: NodeKind,
}

/// Recognition of graph entities in free text. Pluggable so the matching
/// strategy can be swapped without touching pipeline logic.
pub trait EntityMatcher
where
	Self: Send + Sync,
{
	fn matches(&self, text: &str, known: &[KnownEntity]) -> Vec<EntityMention>;
}

/// Case-insensitive exact/substring matching against known node names.
/// Mentions are ordered by first occurrence in the text and deduplicated by
/// name.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringMatcher;

impl EntityMatcher for SubstringMatcher {
	fn matches(&self, text: &str, known: &[KnownEntity]) -> Vec<EntityMention> {
		let haystack = text.to_lowercase();
		let mut found: Vec<(usize, EntityMention)> = Vec::new();

		for entity in known {
			let needle = entity.name.to_lowercase();

			if needle.len() < 2 {
				continue;
			}

			let Some(position) = haystack.find(&needle) else {
				continue;
			};

			if found.iter().any(|(_, mention)| mention.name.eq_ignore_ascii_case(&entity.name)) {
				continue;
			}

			found.push((
				position,
				EntityMention { name: entity.name.clone(), kind: entity.kind },
			));
		}

		found.sort_by_key(|(position, _)| *position);

		found.into_iter().map(|(_, mention)| mention).collect()
	}
}
