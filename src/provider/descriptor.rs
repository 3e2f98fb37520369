//! Provider descriptor data structures shared by all flows and the catalog proxy.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Grant identifiers used in token requests and error reporting.
pub mod grant;

pub use builder::*;
pub use grant::*;

// self
use crate::{_prelude::*, auth::ProviderId};

/// Default accounts service origin.
pub const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
/// Default catalog API base.
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

/// Preferred client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint users are redirected to.
	pub authorization: Url,
	/// Token endpoint used for every grant.
	pub token: Url,
	/// Catalog API base; request paths are appended as segments.
	pub api: Url,
}

/// Immutable provider descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Client authentication mechanism for the token endpoint.
	pub client_auth: ClientAuthMethod,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Spotify descriptor rooted at the given accounts origin and API base.
	///
	/// The authorize and token endpoints live at `/authorize` and `/api/token` under the
	/// accounts origin.
	pub fn spotify(accounts: &Url, api: Url) -> Result<Self, ProviderDescriptorError> {
		let join = |path: &str| {
			accounts.join(path).map_err(|e| ProviderDescriptorError::InvalidUrl {
				endpoint: "accounts",
				reason: e.to_string(),
			})
		};

		Self::builder(ProviderId::new("spotify")?)
			.authorization_endpoint(join("/authorize")?)
			.token_endpoint(join("/api/token")?)
			.api_base(api)
			.build()
	}
}
