use serde_json::Value;

use derrick_domain::Intent;

use crate::{Error, Result, RetrievalService};

/// What classification yielded. `reasoning` is the model's own explanation
/// and only ever lands in the trace.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IntentOutcome {
	pub intent: Intent,
	pub confidence: f32,
	pub reasoning: String,
}

/// Confidence used when the model answers with a valid intent but a missing
/// or malformed confidence value.
const DEFAULT_CONFIDENCE: f32 = 0.5;

impl RetrievalService {
	pub(crate) async fn classify_intent(&self, query: &str) -> Result<IntentOutcome> {
		let messages = classification_messages(query);
		let raw = self
			.providers
			.completion
			.complete_json(&self.cfg.providers.llm, &messages)
			.await
			.map_err(|err| Error::Classification { message: err.to_string() })?;

		parse_classification(&raw)
	}
}

fn classification_messages(query: &str) -> Vec<Value> {
	let system_prompt = "You are an intent classifier for a maintenance knowledge base.

Classify queries into one of these intents:

1. procedure: how-to questions, step-by-step instructions.
   Examples: \"How do I replace a bearing?\", \"What's the procedure for valve isolation?\"

2. troubleshooting: problem diagnosis, failure analysis.
   Examples: \"Pump is overheating, what's wrong?\", \"Why is the valve leaking?\"

3. safety: PPE, hazards, safety procedures.
   Examples: \"What PPE is required?\", \"Is this chemical hazardous?\"

4. asset_info: equipment specifications, asset details.
   Examples: \"What type of pump is P-101?\", \"Where is valve V-201 located?\"

5. people: responsibilities, who to contact.
   Examples: \"Who maintains pump P-101?\", \"Who is the safety officer?\"

Respond with JSON:
{
  \"intent\": \"procedure|troubleshooting|safety|asset_info|people\",
  \"confidence\": 0.0-1.0,
  \"reasoning\": \"brief explanation\"
}";

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": format!("Classify this query:\n\n{query}") }),
	]
}

fn parse_classification(raw: &Value) -> Result<IntentOutcome> {
	let label = raw.get("intent").and_then(|v| v.as_str()).ok_or_else(|| {
		Error::Classification { message: "Response is missing an intent label.".to_string() }
	})?;
	let intent = Intent::parse(label).ok_or_else(|| Error::Classification {
		message: format!("Unknown intent label {label:?}."),
	})?;
	// Taken verbatim when numeric and in range; anything else gets the fixed
	// default rather than failing the whole stage.
	let confidence = raw
		.get("confidence")
		.and_then(|v| v.as_f64())
		.map(|v| v as f32)
		.filter(|v| (0.0..=1.0).contains(v))
		.unwrap_or(DEFAULT_CONFIDENCE);
	let reasoning =
		raw.get("reasoning").and_then(|v| v.as_str()).unwrap_or_default().to_string();

	Ok(IntentOutcome { intent, confidence, reasoning })
}
