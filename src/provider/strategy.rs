//! Provider strategy hooks that classify token endpoint failures.
//!
//! Strategies see only crate-owned data (status codes, OAuth fields, a body preview), so they
//! stay decoupled from whichever HTTP client executed the request.

// self
use crate::{_prelude::*, provider::descriptor::GrantType};

/// Strategy hook that maps failed token requests into the gateway taxonomy.
pub trait ProviderStrategy
where
	Self: Send + Sync,
{
	/// Classifies a failed token request.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Provider rejected the authorization grant (bad code/refresh token).
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// Requested scopes exceed what the token covers.
	InsufficientScope,
	/// Failure is temporary; the provider or network is at fault.
	Transient,
}
impl ProviderErrorKind {
	/// Returns true when the provider refused the request on its merits.
	pub fn is_rejection(self) -> bool {
		!matches!(self, ProviderErrorKind::Transient)
	}
}

/// Context passed to provider strategies when classifying token errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// Grant type associated with the failing request.
	pub grant_type: GrantType,
	/// HTTP status code returned by the provider, when available.
	pub http_status: Option<u16>,
	/// Provider-supplied OAuth `error` field.
	pub oauth_error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Preview of the response body for non-JSON payloads.
	pub body_preview: Option<String>,
}
impl ProviderErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates a new context scoped to the provided grant type.
	pub fn new(grant_type: GrantType) -> Self {
		Self {
			grant_type,
			http_status: None,
			oauth_error: None,
			error_description: None,
			body_preview: None,
		}
	}

	/// Adds an HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code string returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds a body preview for providers that return non-JSON payloads.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}
}

/// Default strategy that applies RFC 6749 heuristics.
///
/// Structured OAuth fields (`error`, `error_description`) win, then body text hints, then the
/// HTTP status code.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("spotify-default-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		if let Some(kind) =
			classify_oauth_error(ctx.oauth_error.as_deref(), ctx.error_description.as_deref())
		{
			return kind;
		}
		if let Some(kind) = classify_body(ctx.body_preview.as_deref()) {
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

const OAUTH_ERROR_CODES: &[(&str, ProviderErrorKind)] = &[
	("invalid_grant", ProviderErrorKind::InvalidGrant),
	("invalid_request", ProviderErrorKind::InvalidGrant),
	("access_denied", ProviderErrorKind::InvalidGrant),
	("invalid_client", ProviderErrorKind::InvalidClient),
	("unauthorized_client", ProviderErrorKind::InvalidClient),
	("invalid_scope", ProviderErrorKind::InsufficientScope),
	("insufficient_scope", ProviderErrorKind::InsufficientScope),
	("temporarily_unavailable", ProviderErrorKind::Transient),
	("server_error", ProviderErrorKind::Transient),
];

fn truncate_preview(body: String) -> String {
	match body.char_indices().nth(ProviderErrorContext::BODY_PREVIEW_LIMIT) {
		Some((cut, _)) => format!("{}…", &body[..cut]),
		None => body,
	}
}

fn classify_oauth_error(
	oauth_error: Option<&str>,
	error_description: Option<&str>,
) -> Option<ProviderErrorKind> {
	oauth_error
		.and_then(exact_code)
		.or_else(|| error_description.and_then(exact_code))
		.or_else(|| classify_body(error_description))
}

fn exact_code(value: &str) -> Option<ProviderErrorKind> {
	OAUTH_ERROR_CODES
		.iter()
		.find(|(code, _)| value.trim().eq_ignore_ascii_case(code))
		.map(|(_, kind)| *kind)
}

fn classify_body(body: Option<&str>) -> Option<ProviderErrorKind> {
	let lowered = body?.to_ascii_lowercase();

	OAUTH_ERROR_CODES
		.iter()
		.filter(|(code, _)| *code != "invalid_request")
		.find(|(code, _)| lowered.contains(code))
		.map(|(_, kind)| *kind)
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(401) => ProviderErrorKind::InvalidClient,
		Some(403) => ProviderErrorKind::InsufficientScope,
		Some(429) => ProviderErrorKind::Transient,
		Some(code) if (400..500).contains(&code) => ProviderErrorKind::InvalidGrant,
		_ => ProviderErrorKind::Transient,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn classify(ctx: ProviderErrorContext) -> ProviderErrorKind {
		DefaultProviderStrategy.classify_token_error(&ctx)
	}

	#[test]
	fn oauth_error_field_wins_over_status() {
		let ctx = ProviderErrorContext::new(GrantType::RefreshToken)
			.with_oauth_error("invalid_grant")
			.with_error_description("Refresh token revoked")
			.with_http_status(503);

		assert_eq!(classify(ctx), ProviderErrorKind::InvalidGrant);
	}

	#[test]
	fn body_hints_apply_before_status() {
		let ctx = ProviderErrorContext::new(GrantType::ClientCredentials)
			.with_body_preview("{\"error\":\"invalid_client\"}")
			.with_http_status(400);

		assert_eq!(classify(ctx), ProviderErrorKind::InvalidClient);
	}

	#[test]
	fn status_fallback_separates_rejections_from_outages() {
		let ctx = |status| {
			ProviderErrorContext::new(GrantType::AuthorizationCode).with_http_status(status)
		};

		assert!(classify(ctx(400)).is_rejection());
		assert!(!classify(ctx(429)).is_rejection());
		assert!(!classify(ctx(502)).is_rejection());
	}

	#[test]
	fn previews_are_truncated() {
		let ctx =
			ProviderErrorContext::new(GrantType::RefreshToken).with_body_preview("x".repeat(400));

		assert_eq!(ctx.body_preview.map(|body| body.chars().count()), Some(257));
	}
}
