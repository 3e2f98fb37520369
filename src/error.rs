//! Gateway-level error types shared across flows, the catalog proxy, stores, and the router.

// self
use crate::{_prelude::*, provider::GrantType};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Vault or profile backend failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem, including missing provider credentials.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Caller supplied a missing, malformed, or out-of-range parameter.
	#[error("{message}")]
	Validation {
		/// Message safe to return to the caller verbatim.
		message: String,
	},
	/// Request carried an `Origin` outside the allow-list.
	#[error("Origin is not allowed.")]
	OriginNotAllowed,
	/// Provider rejected the client credentials, authorization code, or refresh token.
	#[error("Provider rejected the {grant} grant: {reason}.")]
	UpstreamAuth {
		/// Grant that was rejected.
		grant: GrantType,
		/// Provider- or gateway-supplied reason string; never forwarded to browsers.
		reason: String,
		/// HTTP status returned by the token endpoint, when known.
		status: Option<u16>,
	},
	/// User has no refresh token on file.
	#[error("User has not connected a Spotify account.")]
	NotConnected,
	/// Catalog API answered with a non-success status.
	#[error("Catalog API returned HTTP {status}: {message}.")]
	Api {
		/// HTTP status returned by the API.
		status: u16,
		/// Truncated response body.
		message: String,
	},
}
impl Error {
	/// Builds a [`Error::Validation`] from any displayable message.
	pub fn validation(message: impl Into<String>) -> Self {
		Self::Validation { message: message.into() }
	}

	/// Shorthand for the "missing required parameter" validation failure.
	pub fn missing_parameter(name: &str) -> Self {
		Self::validation(format!("Missing required parameter: {name}"))
	}
}

/// Configuration and validation failures raised by the gateway itself.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Outbound reqwest client failed to build.
	#[error("Outbound HTTP client failed to build.")]
	HttpClientBuild {
		/// Builder failure reported by the transport.
		#[source]
		source: BoxError,
	},
	/// Token request could not be assembled.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Accounts endpoint URL was rejected by the OAuth client.
	#[error("Spotify accounts endpoint URL is invalid.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Callback URL cannot be used as an OAuth redirect.
	#[error("Redirect URI `redirectUri` is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Catalog API base URL cannot carry path segments.
	#[error("API base URL `{url}` cannot be used as a base.")]
	CannotBeABase {
		/// Offending URL.
		url: String,
	},

	/// Provider client identifier or secret is not configured.
	#[error("Provider credential `{name}` is not configured.")]
	MissingCredentials {
		/// Environment variable that should carry the credential.
		name: &'static str,
	},
	/// Environment variable holds an unusable value.
	#[error("Environment variable `{name}` is invalid: {reason}.")]
	InvalidEnv {
		/// Environment variable name.
		name: &'static str,
		/// Human-readable failure reason.
		reason: String,
	},
	/// Encryption key is malformed or the cipher failed.
	#[error("Token cipher failure: {reason}.")]
	Cipher {
		/// Human-readable failure reason.
		reason: String,
	},
	/// Authorization-code grant returned no refresh token.
	#[error("Token endpoint response is missing a refresh token.")]
	MissingRefreshToken,
	/// Spotify answered without `expires_in`.
	#[error("Token response carries no expires_in.")]
	MissingExpiresIn,
	/// `expires_in` does not fit a signed duration.
	#[error("Token response expires_in is too large.")]
	ExpiresInOutOfRange,
	/// `expires_in` was zero.
	#[error("Token response expires_in must be greater than zero.")]
	NonPositiveExpiresIn,
}
impl ConfigError {
	/// Boxes a client builder failure.
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Spotify token endpoint failed in a way worth retrying later.
	#[error("Token endpoint failure: {message}.")]
	TokenEndpoint {
		/// Provider- or gateway-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Success status with a body that is not a token response.
	#[error("Token endpoint body could not be decoded.")]
	TokenResponseParse {
		/// Path-annotated decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Catalog API returned a success status with a body that is not JSON.
	#[error("Catalog API returned malformed JSON.")]
	ApiResponseParse {
		/// Underlying parsing failure.
		#[source]
		source: serde_json::Error,
	},
}

/// Failures below HTTP: DNS, connect, TLS, socket I/O.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// reqwest could not complete the exchange.
	#[error("Network error while calling Spotify.")]
	Network {
		/// Error reported by the HTTP client.
		#[source]
		source: BoxError,
	},
	/// Socket-level I/O failure.
	#[error("I/O error while calling Spotify.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Boxes an HTTP client failure.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn validation_messages_are_verbatim() {
		let err = Error::missing_parameter("redirectUri");

		assert_eq!(err.to_string(), "Missing required parameter: redirectUri");
	}

	#[test]
	fn upstream_auth_names_the_grant() {
		let err = Error::UpstreamAuth {
			grant: GrantType::RefreshToken,
			reason: "refresh token revoked".into(),
			status: Some(400),
		};

		assert_eq!(
			err.to_string(),
			"Provider rejected the refresh_token grant: refresh token revoked."
		);
	}

	#[test]
	fn missing_credentials_is_a_config_error() {
		let err: Error = ConfigError::MissingCredentials { name: "SPOTIFY_CLIENT_SECRET" }.into();

		assert!(matches!(err, Error::Config(ConfigError::MissingCredentials { .. })));
		assert!(err.to_string().contains("SPOTIFY_CLIENT_SECRET"));
	}
}
