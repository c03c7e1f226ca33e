use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Run a chat completion and parse the first choice's content as JSON.
/// Every structured call in the pipeline (classification, relevance scoring)
/// goes through here; the model occasionally wraps its JSON in prose, so the
/// call retries a bounded number of times before giving up.
pub async fn complete_json(
	cfg: &derrick_config::LlmProviderConfig,
	messages: &[Value],
) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);

	for _ in 0..3 {
		let body = serde_json::json!({
			"model": cfg.model,
			"temperature": cfg.temperature,
			"messages": messages,
			"response_format": { "type": "json_object" },
		});
		let res = client
			.post(&url)
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;
		if let Ok(parsed) = parse_json_content(json) {
			return Ok(parsed);
		}
	}

	Err(eyre::eyre!("Completion response is not valid JSON."))
}

/// Run a chat completion and return the first choice's content as plain text.
/// Used by the final answer-generation stage.
pub async fn complete_text(
	cfg: &derrick_config::LlmProviderConfig,
	messages: &[Value],
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	content_of(&json)
		.map(|content| content.to_string())
		.ok_or_else(|| eyre::eyre!("Completion response is missing content."))
}

fn parse_json_content(json: Value) -> Result<Value> {
	if let Some(content) = content_of(&json) {
		let parsed: Value = serde_json::from_str(content)
			.map_err(|_| eyre::eyre!("Completion content is not valid JSON."))?;

		return Ok(parsed);
	}

	if json.is_object() {
		return Ok(json);
	}

	Err(eyre::eyre!("Completion response is missing JSON content."))
}

fn content_of(json: &Value) -> Option<&str> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content_json() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "{\"intent\": \"people\", \"confidence\": 0.9}" } }
			]
		});
		let parsed = parse_json_content(json).expect("parse failed");
		assert_eq!(parsed["intent"], "people");
	}

	#[test]
	fn extracts_plain_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "John Smith maintains P-101." } }
			]
		});
		assert_eq!(content_of(&json), Some("John Smith maintains P-101."));
	}

	#[test]
	fn rejects_non_json_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "not json" } }
			]
		});
		assert!(parse_json_content(json).is_err());
	}
}
