// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, ProviderId},
	provider::{ClientAuthMethod, ProviderDescriptor, ProviderEndpoints},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// Descriptor identifier failed validation.
	#[error(transparent)]
	InvalidId(#[from] IdentifierError),
	/// Authorization endpoint is required to build authorize URLs.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint is mandatory for all flows.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Catalog API base is mandatory for the proxy.
	#[error("Missing API base URL.")]
	MissingApiBase,
	/// Endpoint could not be derived or parsed.
	#[error("The {endpoint} endpoint is invalid: {reason}.")]
	InvalidUrl {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Human-readable failure reason.
		reason: String,
	},
	/// Endpoints must use HTTP(S).
	#[error("The {endpoint} endpoint must use http or https: {url}.")]
	UnsupportedScheme {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// Authorization endpoint.
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint.
	pub token_endpoint: Option<Url>,
	/// Catalog API base.
	pub api_base: Option<Url>,
	/// Client authentication method for the token endpoint.
	pub client_auth: ClientAuthMethod,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			authorization_endpoint: None,
			token_endpoint: None,
			api_base: None,
			client_auth: ClientAuthMethod::default(),
		}
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the catalog API base.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth = method;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let authorization = self
			.authorization_endpoint
			.ok_or(ProviderDescriptorError::MissingAuthorizationEndpoint)?;
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let api = self.api_base.ok_or(ProviderDescriptorError::MissingApiBase)?;
		let descriptor = ProviderDescriptor {
			id: self.id,
			endpoints: ProviderEndpoints { authorization, token, api },
			client_auth: self.client_auth,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("api", &self.endpoints.api)
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	match url.scheme() {
		"https" | "http" => Ok(()),
		_ => Err(ProviderDescriptorError::UnsupportedScheme {
			endpoint: name,
			url: url.to_string(),
		}),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn id() -> ProviderId {
		ProviderId::new("spotify").expect("Provider id fixture should be valid.")
	}

	fn url(raw: &str) -> Url {
		Url::parse(raw).expect("URL fixture should parse.")
	}

	#[test]
	fn builder_requires_every_endpoint() {
		let err = ProviderDescriptor::builder(id())
			.authorization_endpoint(url("https://accounts.example/authorize"))
			.token_endpoint(url("https://accounts.example/api/token"))
			.build()
			.expect_err("Missing API base must be rejected.");

		assert_eq!(err, ProviderDescriptorError::MissingApiBase);
	}

	#[test]
	fn builder_rejects_non_http_schemes() {
		let err = ProviderDescriptor::builder(id())
			.authorization_endpoint(url("ftp://accounts.example/authorize"))
			.token_endpoint(url("https://accounts.example/api/token"))
			.api_base(url("https://api.example/v1"))
			.build()
			.expect_err("FTP endpoints must be rejected.");

		assert!(matches!(
			err,
			ProviderDescriptorError::UnsupportedScheme { endpoint: "authorization", .. }
		));
	}

	#[test]
	fn builder_rejects_opaque_api_base() {
		let err = ProviderDescriptor::builder(id())
			.authorization_endpoint(url("https://accounts.example/authorize"))
			.token_endpoint(url("https://accounts.example/api/token"))
			.api_base(url("data:text/plain,catalog"))
			.build()
			.expect_err("Opaque API bases must be rejected.");

		assert!(matches!(err, ProviderDescriptorError::UnsupportedScheme { endpoint: "api", .. }));
	}
}
