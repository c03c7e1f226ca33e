//! The multi-view graph vocabulary and the intent-keyed traversal plan.
//!
//! One graph, four overlapping views: document structure (Document, Chunk),
//! physical assets (Asset, Component, Location), people (Person, Role, Team),
//! and temporal events (MaintenanceEvent, Inspection). The plan table below
//! is the entire intent dispatch: five fixed entries, each a static list of
//! path templates, no runtime string matching.

use crate::intent::Intent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NodeKind {
	Person,
	Role,
	Team,
	Asset,
	Component,
	Location,
	Document,
	Chunk,
	MaintenanceEvent,
	Inspection,
}

impl NodeKind {
	/// The node label used in the graph schema.
	pub fn label(self) -> &'static str {
		match self {
			Self::Person => "Person",
			Self::Role => "Role",
			Self::Team => "Team",
			Self::Asset => "Asset",
			Self::Component => "Component",
			Self::Location => "Location",
			Self::Document => "Document",
			Self::Chunk => "Chunk",
			Self::MaintenanceEvent => "MaintenanceEvent",
			Self::Inspection => "Inspection",
		}
	}

	pub fn parse_label(label: &str) -> Option<Self> {
		match label {
			"Person" => Some(Self::Person),
			"Role" => Some(Self::Role),
			"Team" => Some(Self::Team),
			"Asset" => Some(Self::Asset),
			"Component" => Some(Self::Component),
			"Location" => Some(Self::Location),
			"Document" => Some(Self::Document),
			"Chunk" => Some(Self::Chunk),
			"MaintenanceEvent" => Some(Self::MaintenanceEvent),
			"Inspection" => Some(Self::Inspection),
			_ => None,
		}
	}

	/// The generic noun used for type-compatible coreference ("that asset").
	pub fn noun(self) -> &'static str {
		match self {
			Self::Person => "person",
			Self::Role => "role",
			Self::Team => "team",
			Self::Asset => "asset",
			Self::Component => "component",
			Self::Location => "location",
			Self::Document => "document",
			Self::Chunk => "chunk",
			Self::MaintenanceEvent => "event",
			Self::Inspection => "inspection",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Relation {
	HasRole,
	ResponsibleFor,
	MemberOf,
	HasComponent,
	LocatedAt,
	AppliesTo,
	Mentions,
	SafetyOversight,
}

impl Relation {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::HasRole => "HAS_ROLE",
			Self::ResponsibleFor => "RESPONSIBLE_FOR",
			Self::MemberOf => "MEMBER_OF",
			Self::HasComponent => "HAS_COMPONENT",
			Self::LocatedAt => "LOCATED_AT",
			Self::AppliesTo => "APPLIES_TO",
			Self::Mentions => "MENTIONS",
			Self::SafetyOversight => "SAFETY_OVERSIGHT",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Out,
	In,
}

/// One hop in a path template. `Out` follows the relationship from the
/// current node, `In` arrives at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStep {
	pub relation: Relation,
	pub direction: Direction,
	pub to: NodeKind,
}

/// A statically enumerable traversal pattern, anchored at a seed node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathTemplate {
	pub seed: NodeKind,
	pub steps: &'static [PathStep],
}

impl PathTemplate {
	pub fn hops(&self) -> usize {
		self.steps.len()
	}
}

const fn out(relation: Relation, to: NodeKind) -> PathStep {
	PathStep { relation, direction: Direction::Out, to }
}

const fn inbound(relation: Relation, to: NodeKind) -> PathStep {
	PathStep { relation, direction: Direction::In, to }
}

const PEOPLE_PLAN: &[PathTemplate] = &[
	// Person -> HAS_ROLE -> Role -> RESPONSIBLE_FOR -> Asset, from either end.
	PathTemplate {
		seed: NodeKind::Person,
		steps: &[
			out(Relation::HasRole, NodeKind::Role),
			out(Relation::ResponsibleFor, NodeKind::Asset),
		],
	},
	PathTemplate {
		seed: NodeKind::Asset,
		steps: &[
			inbound(Relation::ResponsibleFor, NodeKind::Role),
			inbound(Relation::HasRole, NodeKind::Person),
		],
	},
	PathTemplate {
		seed: NodeKind::Role,
		steps: &[inbound(Relation::HasRole, NodeKind::Person)],
	},
	PathTemplate { seed: NodeKind::Person, steps: &[out(Relation::MemberOf, NodeKind::Team)] },
];

const ASSET_INFO_PLAN: &[PathTemplate] = &[
	PathTemplate { seed: NodeKind::Asset, steps: &[out(Relation::HasComponent, NodeKind::Component)] },
	PathTemplate { seed: NodeKind::Asset, steps: &[out(Relation::LocatedAt, NodeKind::Location)] },
];

const PROCEDURE_PLAN: &[PathTemplate] = &[
	PathTemplate { seed: NodeKind::Asset, steps: &[inbound(Relation::AppliesTo, NodeKind::Document)] },
	PathTemplate { seed: NodeKind::Chunk, steps: &[out(Relation::Mentions, NodeKind::Component)] },
];

const SAFETY_PLAN: &[PathTemplate] = &[
	PathTemplate {
		seed: NodeKind::Person,
		steps: &[out(Relation::SafetyOversight, NodeKind::Asset)],
	},
	PathTemplate {
		seed: NodeKind::Asset,
		steps: &[inbound(Relation::SafetyOversight, NodeKind::Person)],
	},
	PathTemplate { seed: NodeKind::Asset, steps: &[out(Relation::LocatedAt, NodeKind::Location)] },
];

/// The traversal strategy for an intent. Procedure and troubleshooting share
/// a plan: both surface document/component linkage.
pub fn traversal_plan(intent: Intent) -> &'static [PathTemplate] {
	match intent {
		Intent::People => PEOPLE_PLAN,
		Intent::AssetInfo => ASSET_INFO_PLAN,
		Intent::Procedure | Intent::Troubleshooting => PROCEDURE_PLAN,
		Intent::Safety => SAFETY_PLAN,
	}
}

/// Render one matched path as a single sentence. `names` holds the node names
/// along the path, seed first; intermediates are kept so a two-hop
/// responsibility chain never loses its role context.
pub fn render_fact(template: &PathTemplate, names: &[String]) -> Option<String> {
	if names.len() != template.steps.len() + 1 {
		return None;
	}

	// The responsibility chain reads person-first in either orientation.
	match template.steps {
		[
			PathStep { relation: Relation::HasRole, direction: Direction::Out, .. },
			PathStep { relation: Relation::ResponsibleFor, direction: Direction::Out, .. },
		] => {
			return Some(format!("{} ({}) is responsible for {}", names[0], names[1], names[2]));
		},
		[
			PathStep { relation: Relation::ResponsibleFor, direction: Direction::In, .. },
			PathStep { relation: Relation::HasRole, direction: Direction::In, .. },
		] => {
			return Some(format!("{} ({}) is responsible for {}", names[2], names[1], names[0]));
		},
		_ => {},
	}

	let step = template.steps.first()?;
	let (subject, object) = match step.direction {
		Direction::Out => (names[0].as_str(), names[1].as_str()),
		Direction::In => (names[1].as_str(), names[0].as_str()),
	};

	Some(match step.relation {
		Relation::HasRole => format!("{subject} has role {object}"),
		Relation::ResponsibleFor => format!("{subject} is responsible for {object}"),
		Relation::MemberOf => format!("{subject} is a member of {object}"),
		Relation::HasComponent => format!("{subject} has component {object}"),
		Relation::LocatedAt => format!("{subject} is located at {object}"),
		Relation::AppliesTo => format!("{subject} applies to {object}"),
		Relation::Mentions =>
			if template.seed == NodeKind::Chunk {
				format!("Documentation mentions {object}")
			} else {
				format!("{subject} mentions {object}")
			},
		Relation::SafetyOversight => {
			format!("{subject} provides safety oversight for {object}")
		},
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn names(values: &[&str]) -> Vec<String> {
		values.iter().map(|value| value.to_string()).collect()
	}

	#[test]
	fn plan_is_fixed_per_intent() {
		for intent in Intent::ALL {
			assert_eq!(traversal_plan(intent), traversal_plan(intent));
			assert!(!traversal_plan(intent).is_empty());
		}
		assert_eq!(traversal_plan(Intent::Procedure), traversal_plan(Intent::Troubleshooting));
	}

	#[test]
	fn renders_responsibility_chain_person_first_from_both_ends() {
		let forward = &PEOPLE_PLAN[0];
		let reverse = &PEOPLE_PLAN[1];
		let expected = "John Smith (Mechanical Technician) is responsible for P-101";

		assert_eq!(
			render_fact(forward, &names(&["John Smith", "Mechanical Technician", "P-101"])),
			Some(expected.to_string()),
		);
		assert_eq!(
			render_fact(reverse, &names(&["P-101", "Mechanical Technician", "John Smith"])),
			Some(expected.to_string()),
		);
	}

	#[test]
	fn renders_single_hop_facts_with_direction() {
		let located = &ASSET_INFO_PLAN[1];
		let applies = &PROCEDURE_PLAN[0];

		assert_eq!(
			render_fact(located, &names(&["P-101", "Pump Room"])),
			Some("P-101 is located at Pump Room".to_string()),
		);
		// Inbound step: the document is the subject even though the asset seeds it.
		assert_eq!(
			render_fact(applies, &names(&["P-101", "Pump Overhaul SOP"])),
			Some("Pump Overhaul SOP applies to P-101".to_string()),
		);
	}

	#[test]
	fn rejects_mismatched_path_length() {
		assert_eq!(render_fact(&PEOPLE_PLAN[0], &names(&["John Smith", "P-101"])), None);
	}
}
