use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use logpage_service::{BulkPage, Error, LogPage, LogQueryRequest};

/// Non-standard status used when the caller went away before the search finished.
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/logs/query", post(query_logs))
		.route("/v1/logs/bulk", post(bulk_logs))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn query_logs(
	State(state): State<AppState>,
	payload: Result<Json<LogQueryRequest>, JsonRejection>,
) -> Result<Json<LogPage>, ApiError> {
	let Json(request) = payload?;
	let page = state.service.retrieve(&request).await?;

	Ok(Json(page))
}

async fn bulk_logs(
	State(state): State<AppState>,
	payload: Result<Json<LogQueryRequest>, JsonRejection>,
) -> Result<Json<BulkPage>, ApiError> {
	let Json(request) = payload?;
	let page = state.service.retrieve_bulk(&request).await?;

	Ok(Json(page))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: &'static str,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
		Self { status, error_code, message: message.into() }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let message = err.to_string();

		match err {
			Error::InvalidRequest { .. } =>
				Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			Error::Authentication { .. } =>
				Self::new(StatusCode::UNAUTHORIZED, "AUTHENTICATION_FAILED", message),
			Error::Permission { .. } =>
				Self::new(StatusCode::FORBIDDEN, "PERMISSION_DENIED", message),
			Error::RateLimited { .. } =>
				Self::new(StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", message),
			Error::RateLimitExceeded { .. } =>
				Self::new(StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED", message),
			Error::Timeout { .. } => Self::new(StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", message),
			Error::Cancelled => Self::new(
				StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::BAD_REQUEST),
				"CANCELLED",
				message,
			),
			Error::UpstreamServer { .. } =>
				Self::new(StatusCode::BAD_GATEWAY, "UPSTREAM_SERVER_ERROR", message),
			Error::MalformedResponse { .. } =>
				Self::new(StatusCode::BAD_GATEWAY, "MALFORMED_RESPONSE", message),
			Error::Upstream { .. } => Self::new(StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", message),
			Error::Config { .. } => {
				tracing::error!(error = %message, "Log service is misconfigured.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Internal error.")
			},
		}
	}
}
impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text())
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
