use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use derrick_retrieval::{ChatRequest, Error as ServiceError, RetrievalOutcome, RetrievalStep};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health/live", get(health_live))
		.route("/health/ready", get(health_ready))
		.route("/api/v1/chat", post(chat))
		.with_state(state)
}

#[derive(Debug, Deserialize)]
struct ChatBody {
	message: String,
	session_id: Option<String>,
}

async fn chat(
	State(state): State<AppState>,
	Json(payload): Json<ChatBody>,
) -> Result<Json<RetrievalOutcome>, ApiError> {
	// A malformed session id is treated like an absent one; the response
	// carries the id actually used either way.
	let session_id = payload.session_id.as_deref().and_then(|raw| Uuid::parse_str(raw).ok());
	let outcome = state
		.service
		.answer(ChatRequest { message: payload.message, session_id })
		.await?;

	Ok(Json(outcome))
}

async fn health_live() -> Json<serde_json::Value> {
	Json(serde_json::json!({ "status": "alive" }))
}

async fn health_ready(State(state): State<AppState>) -> Response {
	let qdrant_ok = state.service.vector.ping().await.is_ok();
	let neo4j_ok = state.service.graph.ping().await.is_ok();
	let healthy = qdrant_ok && neo4j_ok;
	let body = serde_json::json!({
		"status": if healthy { "ready" } else { "unhealthy" },
		"checks": { "qdrant": qdrant_ok, "neo4j": neo4j_ok },
	});
	let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

	(status, Json(body)).into_response()
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	retrieval_steps: Option<Vec<RetrievalStep>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	retrieval_steps: Option<Vec<RetrievalStep>>,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } => Self {
				status: StatusCode::UNPROCESSABLE_ENTITY,
				error_code: "invalid_request".to_string(),
				message,
				retrieval_steps: None,
			},
			ServiceError::Generation { message, steps } => Self {
				status: StatusCode::BAD_GATEWAY,
				error_code: "generation_failed".to_string(),
				message,
				retrieval_steps: Some(steps),
			},
			// Recovered inside the pipeline under normal operation; mapped
			// here so a future caller of the stage methods still gets a
			// structured response.
			ServiceError::Classification { message }
			| ServiceError::IndexUnavailable { message }
			| ServiceError::GraphUnavailable { message } => Self {
				status: StatusCode::SERVICE_UNAVAILABLE,
				error_code: "dependency_unavailable".to_string(),
				message,
				retrieval_steps: None,
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error_code: self.error_code,
			message: self.message,
			retrieval_steps: self.retrieval_steps,
		};

		(self.status, Json(body)).into_response()
	}
}
