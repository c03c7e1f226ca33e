//! Lightweight coreference substitution over session history.
//!
//! Pronouns and demonstrative noun phrases are rewritten against the entities
//! mentioned in earlier turns, most recent first, with a kind-compatibility
//! check: person pronouns only ever resolve to a Person, "it"/"its" only to
//! non-Person entities. This is a best-effort rewrite; with no compatible
//! antecedent the query passes through untouched.

use crate::{
	graph::NodeKind,
	matcher::EntityMention,
};

/// Rewrite `query` against `recent`, an entity list flattened from turn
/// history in most-recent-first order.
pub fn resolve_references(query: &str, recent: &[EntityMention]) -> String {
	if recent.is_empty() {
		return query.to_string();
	}

	let tokens: Vec<&str> = query.split_whitespace().collect();
	let mut out: Vec<String> = Vec::with_capacity(tokens.len());
	let mut changed = false;
	let mut index = 0;

	while index < tokens.len() {
		let raw = tokens[index];
		let (core, trailing) = split_trailing(raw);
		let lower = core.to_lowercase();

		if matches!(lower.as_str(), "that" | "this")
			&& let Some(next) = tokens.get(index + 1)
		{
			let (noun_core, noun_trailing) = split_trailing(next);

			if let Some(entity) = generic_antecedent(&noun_core.to_lowercase(), recent) {
				out.push(format!("{}{noun_trailing}", entity.name));

				changed = true;
				index += 2;

				continue;
			}
		}

		if let Some(replacement) = pronoun_antecedent(&lower, recent) {
			out.push(format!("{replacement}{trailing}"));

			changed = true;
			index += 1;

			continue;
		}

		out.push(raw.to_string());

		index += 1;
	}

	if changed { out.join(" ") } else { query.to_string() }
}

fn pronoun_antecedent(word: &str, recent: &[EntityMention]) -> Option<String> {
	match word {
		"he" | "him" | "she" => person(recent).map(|entity| entity.name.clone()),
		"his" | "her" | "hers" => person(recent).map(|entity| format!("{}'s", entity.name)),
		"it" => non_person(recent).map(|entity| entity.name.clone()),
		"its" => non_person(recent).map(|entity| format!("{}'s", entity.name)),
		_ => None,
	}
}

fn person(recent: &[EntityMention]) -> Option<&EntityMention> {
	recent.iter().find(|entity| entity.kind == NodeKind::Person)
}

fn non_person(recent: &[EntityMention]) -> Option<&EntityMention> {
	recent.iter().find(|entity| entity.kind != NodeKind::Person)
}

fn generic_antecedent<'a>(noun: &str, recent: &'a [EntityMention]) -> Option<&'a EntityMention> {
	if noun.len() < 2 {
		return None;
	}

	recent.iter().find(|entity| {
		entity.kind.noun() == noun || entity.name.to_lowercase().contains(noun)
	})
}

fn split_trailing(raw: &str) -> (&str, &str) {
	let cut = raw
		.char_indices()
		.rev()
		.take_while(|(_, ch)| !ch.is_alphanumeric())
		.last()
		.map(|(position, _)| position)
		.unwrap_or(raw.len());

	raw.split_at(cut)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn history() -> Vec<EntityMention> {
		vec![
			EntityMention { name: "John Smith".to_string(), kind: NodeKind::Person },
			EntityMention { name: "Centrifugal Pump P-101".to_string(), kind: NodeKind::Asset },
		]
	}

	#[test]
	fn resolves_person_pronoun() {
		let resolved = resolve_references("What is his role?", &history());

		assert_eq!(resolved, "What is John Smith's role?");
	}

	#[test]
	fn resolves_it_to_non_person_only() {
		let resolved = resolve_references("Where is it located?", &history());

		assert_eq!(resolved, "Where is Centrifugal Pump P-101 located?");
	}

	#[test]
	fn resolves_demonstrative_noun_phrase() {
		let resolved = resolve_references("Who maintains that pump?", &history());

		assert_eq!(resolved, "Who maintains Centrifugal Pump P-101?");
	}

	#[test]
	fn passes_through_without_antecedent() {
		let people_only =
			vec![EntityMention { name: "John Smith".to_string(), kind: NodeKind::Person }];

		assert_eq!(resolve_references("Where is it?", &people_only), "Where is it?");
		assert_eq!(resolve_references("What is his role?", &[]), "What is his role?");
	}

	#[test]
	fn prefers_most_recent_compatible_entity() {
		let recent = vec![
			EntityMention { name: "Jane Doe".to_string(), kind: NodeKind::Person },
			EntityMention { name: "John Smith".to_string(), kind: NodeKind::Person },
		];

		assert_eq!(resolve_references("Who does he report to?", &recent), "Who does Jane Doe report to?");
	}
}
