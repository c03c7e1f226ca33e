pub mod coref;
pub mod evidence;
pub mod graph;
pub mod intent;
pub mod matcher;

pub use evidence::{Chunk, EvidenceItem, FusedContext, GraphFact, Provenance, ScoredEvidence};
pub use graph::{Direction, NodeKind, PathStep, PathTemplate, Relation};
pub use intent::Intent;
pub use matcher::{EntityMatcher, EntityMention, KnownEntity, SubstringMatcher};
