use std::sync::Arc;

use axum::{
	body::{self, Body},
	http::{Request, StatusCode},
};
use tower::util::ServiceExt;

use derrick_api::{routes, state::AppState};
use derrick_domain::{KnownEntity, NodeKind, Relation, SubstringMatcher};
use derrick_retrieval::{Providers, RetrievalService, SessionStore};
use derrick_testkit::{
	FailingGraph, Route, ScriptedCompletion, StaticEmbedding, StaticGraph, StaticVectorIndex,
	chunk, test_config,
};

fn people_service(completion: ScriptedCompletion) -> Arc<RetrievalService> {
	let cfg = test_config();
	let providers =
		Providers::new(Arc::new(StaticEmbedding { dimensions: 8 }), Arc::new(completion));
	let vector = Arc::new(StaticVectorIndex {
		chunks: vec![chunk("c1", "P-101 maintenance schedule and contacts.", 0.8)],
	});
	let graph = Arc::new(StaticGraph::new(
		vec![
			KnownEntity { name: "P-101".to_string(), kind: NodeKind::Asset },
			KnownEntity { name: "John Smith".to_string(), kind: NodeKind::Person },
		],
		vec![Route {
			seed: "P-101".to_string(),
			relations: vec![Relation::ResponsibleFor, Relation::HasRole],
			rows: vec![vec![
				"P-101".to_string(),
				"Mechanical Technician".to_string(),
				"John Smith".to_string(),
			]],
		}],
	));
	let sessions = Arc::new(SessionStore::new(&cfg.session));

	Arc::new(RetrievalService::with_components(
		cfg,
		providers,
		vector,
		graph,
		Arc::new(SubstringMatcher),
		sessions,
	))
}

async fn post_chat(
	app: axum::Router,
	payload: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
	let response = app
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/api/v1/chat")
				.header("content-type", "application/json")
				.body(Body::from(payload.to_string()))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /api/v1/chat.");
	let status = response.status();
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = serde_json::from_slice(&bytes).expect("Failed to parse response body.");

	(status, json)
}

#[tokio::test]
async fn health_live_needs_no_dependencies() {
	let service = people_service(ScriptedCompletion::new().classify_as("people", 0.9));
	let app = routes::router(AppState::with_service(service));
	let response = app
		.oneshot(
			Request::builder()
				.uri("/health/live")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /health/live.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn readiness_reports_per_dependency_status() {
	let cfg = test_config();
	let providers = Providers::new(
		Arc::new(StaticEmbedding { dimensions: 8 }),
		Arc::new(ScriptedCompletion::new().classify_as("people", 0.9)),
	);
	let service = Arc::new(RetrievalService::with_components(
		cfg,
		providers,
		Arc::new(StaticVectorIndex { chunks: vec![] }),
		Arc::new(FailingGraph),
		Arc::new(SubstringMatcher),
		Arc::new(SessionStore::new(&test_config().session)),
	));
	let app = routes::router(AppState::with_service(service));
	let response = app
		.oneshot(
			Request::builder()
				.uri("/health/ready")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /health/ready.");

	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json: serde_json::Value =
		serde_json::from_slice(&bytes).expect("Failed to parse response body.");

	assert_eq!(json["checks"]["qdrant"], true);
	assert_eq!(json["checks"]["neo4j"], false);
}

#[tokio::test]
async fn chat_returns_the_full_wire_shape() {
	let service = people_service(ScriptedCompletion::new().classify_as("people", 0.9));
	let app = routes::router(AppState::with_service(service));
	let (status, json) =
		post_chat(app, serde_json::json!({ "message": "Who maintains pump P-101?" })).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["intent"], "people");
	assert!(json["confidence"].as_f64().expect("confidence must be numeric.") > 0.0);
	assert!(!json["graph_facts"].as_array().expect("graph_facts must be an array.").is_empty());
	assert!(json["sources"].is_array());
	assert!(json["message"].is_string());
	assert!(json["session_id"].is_string());

	let steps = json["retrieval_steps"].as_array().expect("retrieval_steps must be an array.");

	assert!(!steps.is_empty());

	for step in steps {
		assert!(step["stage"].is_string());
		assert!(step["duration_ms"].is_number());
		assert!(step["description"].is_string());
	}
}

#[tokio::test]
async fn chat_reuses_the_caller_session() {
	let service = people_service(ScriptedCompletion::new().classify_as("people", 0.9));
	let app = routes::router(AppState::with_service(service.clone()));
	let (_, first) =
		post_chat(app, serde_json::json!({ "message": "Who maintains pump P-101?" })).await;
	let session_id = first["session_id"].as_str().expect("session_id must be a string.");

	let app = routes::router(AppState::with_service(service));
	let (status, second) = post_chat(
		app,
		serde_json::json!({ "message": "What is his role?", "session_id": session_id }),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(second["session_id"], session_id);
}

#[tokio::test]
async fn chat_rejects_empty_message() {
	let service = people_service(ScriptedCompletion::new().classify_as("people", 0.9));
	let app = routes::router(AppState::with_service(service));
	let (status, json) = post_chat(app, serde_json::json!({ "message": "  " })).await;

	assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(json["error_code"], "invalid_request");
}

#[tokio::test]
async fn generation_failure_is_a_structured_response_with_trace() {
	let service = people_service(
		ScriptedCompletion::new().classify_as("people", 0.9).failing_generation(),
	);
	let app = routes::router(AppState::with_service(service));
	let (status, json) =
		post_chat(app, serde_json::json!({ "message": "Who maintains pump P-101?" })).await;

	assert_eq!(status, StatusCode::BAD_GATEWAY);
	assert_eq!(json["error_code"], "generation_failed");

	let steps = json["retrieval_steps"].as_array().expect("retrieval_steps must be an array.");

	assert!(steps.iter().any(|step| step["stage"] == "fused"));
	assert_eq!(steps.last().map(|step| step["stage"].clone()), Some("failed".into()));
}
