use reqwest::header::AUTHORIZATION;
use serde_json::Map;

#[test]
fn builds_bearer_auth_header() {
	let headers =
		derrick_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");
	assert_eq!(value, "Bearer secret");
}

#[test]
fn forwards_default_headers() {
	let mut extra = Map::new();
	extra.insert("X-Provider-Tag".to_string(), serde_json::Value::String("derrick".to_string()));
	let headers =
		derrick_providers::auth_headers("secret", &extra).expect("Failed to build headers.");

	assert_eq!(headers.get("X-Provider-Tag").expect("Missing header."), "derrick");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut extra = Map::new();
	extra.insert("X-Bad".to_string(), serde_json::Value::Bool(true));

	assert!(derrick_providers::auth_headers("secret", &extra).is_err());
}
