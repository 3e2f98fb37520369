//! Token flows orchestrated by the [`Broker`].
//!
//! Each grant lives in its own module as an `impl Broker` block: the cached app token, the
//! authorize URL and code exchange, the refresh, and the connection status lookup.

pub mod app_token;
pub mod authorize;
pub mod common;
pub mod refresh;

pub use app_token::*;
pub use authorize::*;

// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	clock::{Clock, SystemClock},
	error::ConfigError,
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{BasicFacade, ReqwestTransportErrorMapper, TransportErrorMapper},
	provider::{ProviderDescriptor, ProviderStrategy},
	store::{ProfileStore, TokenVault},
};

/// Broker specialized for the crate's reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Default scopes requested on the authorize URL.
pub const DEFAULT_SCOPES: &str = "user-read-email user-read-private";

/// Coordinates Spotify token flows against a single provider descriptor.
///
/// The broker owns the HTTP client, vault, profile table, descriptor, strategy, and the cached
/// app token, so each flow module only carries grant-specific logic. Client credentials are
/// optional at construction; every flow that needs them fails with
/// [`ConfigError::MissingCredentials`] until they are supplied.
pub struct Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Encrypted token vault.
	pub vault: Arc<dyn TokenVault>,
	/// Client-visible profile table.
	pub profiles: Arc<dyn ProfileStore>,
	/// Provider descriptor that defines OAuth and API endpoints.
	pub descriptor: ProviderDescriptor,
	/// Strategy responsible for classifying token endpoint failures.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// Time source for expiry decisions.
	pub clock: Arc<dyn Clock>,
	/// Scopes requested on the authorize URL.
	pub scopes: ScopeSet,
	/// Whether the authorize URL forces the consent dialog.
	pub show_dialog: bool,
	client_id: Option<String>,
	client_secret: Option<String>,
	app_token: AppTokenCache,
	flow_guards: common::GuardMap,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		vault: Arc<dyn TokenVault>,
		profiles: Arc<dyn ProfileStore>,
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			vault,
			profiles,
			descriptor,
			strategy,
			clock: Arc::new(SystemClock),
			scopes: ScopeSet::from_str(DEFAULT_SCOPES).unwrap_or_default(),
			show_dialog: false,
			client_id: None,
			client_secret: None,
			app_token: AppTokenCache::default(),
			flow_guards: Default::default(),
		}
	}

	/// Sets the client identifier and secret used for every token request.
	pub fn with_credentials(
		mut self,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		self.client_id = Some(client_id.into()).filter(|id| !id.is_empty());
		self.client_secret = Some(client_secret.into()).filter(|secret| !secret.is_empty());

		self
	}

	/// Replaces the time source.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Replaces the scopes requested on the authorize URL.
	pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Toggles `show_dialog=true` on the authorize URL.
	pub fn with_show_dialog(mut self, show_dialog: bool) -> Self {
		self.show_dialog = show_dialog;

		self
	}

	/// Configured client identifier, if any.
	pub fn client_id(&self) -> Option<&str> {
		self.client_id.as_deref()
	}

	/// Returns true when both client credentials are configured.
	pub fn has_credentials(&self) -> bool {
		self.client_id.is_some() && self.client_secret.is_some()
	}

	pub(crate) fn credentials(&self) -> Result<(&str, &str), ConfigError> {
		let id = self
			.client_id
			.as_deref()
			.ok_or(ConfigError::MissingCredentials { name: "SPOTIFY_CLIENT_ID" })?;
		let secret = self
			.client_secret
			.as_deref()
			.ok_or(ConfigError::MissingCredentials { name: "SPOTIFY_CLIENT_SECRET" })?;

		Ok((id, secret))
	}

	pub(crate) fn facade(&self) -> Result<BasicFacade<C, M>> {
		let (id, secret) = self.credentials()?;

		BasicFacade::from_descriptor(
			&self.descriptor,
			id,
			secret,
			self.http_client.clone(),
			self.transport_mapper.clone(),
		)
	}
}
impl ReqwestBroker {
	/// Creates a broker with its own no-redirect reqwest transport.
	pub fn new(
		vault: Arc<dyn TokenVault>,
		profiles: Arc<dyn ProfileStore>,
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
	) -> Result<Self, ConfigError> {
		Ok(Self::with_http_client(
			vault,
			profiles,
			descriptor,
			strategy,
			ReqwestHttpClient::try_default()?,
			ReqwestTransportErrorMapper,
		))
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("scopes", &self.scopes)
			.field("show_dialog", &self.show_dialog)
			.finish()
	}
}
