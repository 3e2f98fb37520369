//! Boundary conversion from [`Error`] to the `{ "error": string }` envelope.

// crates.io
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde_json::json;
// self
use crate::_prelude::*;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Router-facing error; owns the status mapping and the client-visible message.
#[derive(Debug)]
pub struct ApiError(pub Error);
impl ApiError {
	/// HTTP status for the wrapped error.
	pub fn status(&self) -> StatusCode {
		match &self.0 {
			Error::Validation { .. } | Error::NotConnected => StatusCode::BAD_REQUEST,
			Error::OriginNotAllowed => StatusCode::FORBIDDEN,
			Error::UpstreamAuth { grant, .. } if grant.is_user_scoped() => StatusCode::BAD_REQUEST,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Message safe to hand to a cross-origin caller.
	pub fn public_message(&self) -> String {
		match &self.0 {
			Error::Validation { message } => message.clone(),
			Error::OriginNotAllowed => "Origin not allowed".into(),
			Error::NotConnected => "Spotify account is not connected".into(),
			Error::UpstreamAuth { grant, .. } if grant.is_user_scoped() =>
				"Spotify authorization failed".into(),
			Error::UpstreamAuth { .. } => "Failed to obtain Spotify access token".into(),
			Error::Config(_) => "Server configuration error".into(),
			_ => INTERNAL_MESSAGE.into(),
		}
	}
}
impl From<Error> for ApiError {
	fn from(e: Error) -> Self {
		Self(e)
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status();

		if status.is_server_error() {
			tracing::error!(error = %self.0, source = ?self.0.source(), "request failed");
		} else {
			tracing::debug!(error = %self.0, %status, "request rejected");
		}

		(status, Json(json!({ "error": self.public_message() }))).into_response()
	}
}
