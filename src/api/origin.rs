//! Origin allow-list enforcement and the matching CORS layer.

// crates.io
use axum::{
	extract::{Request, State},
	http::{
		HeaderValue, Method,
		header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN},
	},
	middleware::Next,
	response::{IntoResponse, Response},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
// self
use crate::{_prelude::*, api::ApiError, error::ConfigError};

/// Origins used when `ALLOWED_ORIGINS` is not set.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// Exact-match list of browser origins allowed to call the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OriginAllowList(Vec<HeaderValue>);
impl OriginAllowList {
	/// Builds a list from origins such as `https://app.example`; a trailing `/` is ignored.
	pub fn new<I, S>(origins: I) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut values = Vec::new();

		for origin in origins {
			let origin = origin.as_ref().trim().trim_end_matches('/');

			if origin.is_empty() {
				continue;
			}

			let parsed = Url::parse(origin).map_err(|e| invalid_origin(origin, &e))?;

			if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
				return Err(invalid_origin(origin, &"expected an http(s) origin"));
			}

			values.push(HeaderValue::from_str(origin).map_err(|e| invalid_origin(origin, &e))?);
		}

		Ok(Self(values))
	}

	/// Parses a comma-separated list.
	pub fn parse(raw: &str) -> Result<Self, ConfigError> {
		Self::new(raw.split(','))
	}

	/// Returns true when `origin` is on the list.
	pub fn allows(&self, origin: &HeaderValue) -> bool {
		self.0.iter().any(|allowed| allowed == origin)
	}

	/// Configured origins.
	pub fn origins(&self) -> &[HeaderValue] {
		&self.0
	}

	/// CORS layer echoing allow-listed origins and answering preflights.
	pub fn cors_layer(&self) -> CorsLayer {
		CorsLayer::new()
			.allow_origin(AllowOrigin::list(self.0.iter().cloned()))
			.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
			.allow_headers([AUTHORIZATION, CONTENT_TYPE])
	}
}
impl Default for OriginAllowList {
	fn default() -> Self {
		Self(DEFAULT_ALLOWED_ORIGINS.split(',').map(HeaderValue::from_static).collect())
	}
}

/// Rejects requests whose `Origin` header is present and not allow-listed.
///
/// Requests without `Origin` are same-origin or non-browser and pass through.
pub async fn guard_origin(
	State(origins): State<Arc<OriginAllowList>>,
	request: Request,
	next: Next,
) -> Response {
	match request.headers().get(ORIGIN) {
		Some(origin) if !origins.allows(origin) => {
			tracing::warn!(origin = ?origin, path = %request.uri().path(), "rejected origin");

			ApiError::from(Error::OriginNotAllowed).into_response()
		},
		_ => next.run(request).await,
	}
}

fn invalid_origin(origin: &str, reason: &dyn Display) -> ConfigError {
	ConfigError::InvalidEnv {
		name: "ALLOWED_ORIGINS",
		reason: format!("`{origin}` is not a valid origin: {reason}"),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn list_matches_exact_origins() {
		let list = OriginAllowList::parse("https://app.example/, http://localhost:3000")
			.expect("Allow-list should parse.");

		assert!(list.allows(&HeaderValue::from_static("https://app.example")));
		assert!(list.allows(&HeaderValue::from_static("http://localhost:3000")));
		assert!(!list.allows(&HeaderValue::from_static("http://localhost:3001")));
		assert!(!list.allows(&HeaderValue::from_static("https://evil.example")));
	}

	#[test]
	fn empty_entries_are_skipped_and_bad_entries_fail() {
		let empty = OriginAllowList::parse(",,").expect("Empty list should parse.");

		assert!(empty.origins().is_empty());
		assert!(matches!(
			OriginAllowList::parse("ftp://files.example"),
			Err(ConfigError::InvalidEnv { name: "ALLOWED_ORIGINS", .. })
		));
		assert!(OriginAllowList::parse("not an origin").is_err());
	}

	#[test]
	fn default_list_covers_local_dev_servers() {
		let list = OriginAllowList::default();

		assert_eq!(list, OriginAllowList::parse(DEFAULT_ALLOWED_ORIGINS).expect("Defaults parse."));
		assert!(list.allows(&HeaderValue::from_static("http://localhost:5173")));
	}
}
