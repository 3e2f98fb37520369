//! Authorization Code flow: the authorize URL, the code exchange, and connection status.
//!
//! The exchange writes the token pair to the vault first and only then marks the profile
//! connected; a vault failure therefore never leaves a profile claiming a connection that has
//! no tokens behind it.

// self
use crate::{
	_prelude::*,
	auth::{IssuedTokens, TokenPair, UserId},
	error::ConfigError,
	flows::{Broker, common},
	http::TokenHttpClient,
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind},
};

/// Client-visible connection state for a user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionStatus {
	/// Whether the user has completed the code exchange.
	pub connected: bool,
	/// Expiry of the most recent access token.
	pub expires_at: Option<OffsetDateTime>,
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds the provider authorize URL for `user`.
	///
	/// The user id is carried in `state` so the callback can be matched to the account that
	/// started the flow. Parameters are form-encoded, so `https://app/callback` appears as
	/// `https%3A%2F%2Fapp%2Fcallback`.
	pub fn authorize_url(&self, redirect_uri: &str, user: &UserId) -> Result<Url> {
		let client_id =
			self.client_id().ok_or(ConfigError::MissingCredentials { name: "SPOTIFY_CLIENT_ID" })?;

		parse_redirect(redirect_uri)?;

		let mut url = self.descriptor.endpoints.authorization.clone();

		{
			let mut pairs = url.query_pairs_mut();

			pairs.append_pair("client_id", client_id);
			pairs.append_pair("response_type", "code");
			pairs.append_pair("redirect_uri", redirect_uri);

			if !self.scopes.is_empty() {
				pairs.append_pair("scope", &self.scopes.normalized());
			}

			pairs.append_pair("state", user.as_ref());

			if self.show_dialog {
				pairs.append_pair("show_dialog", "true");
			}
		}

		Ok(url)
	}

	/// Exchanges an authorization code, stores the token pair, and marks the user connected.
	///
	/// `redirect_uri` is forwarded exactly as received; it must match the value used on the
	/// authorize URL byte-for-byte.
	pub async fn exchange_code(
		&self,
		code: &str,
		redirect_uri: &str,
		user: &UserId,
	) -> Result<IssuedTokens> {
		obs::observe(FlowKind::AuthorizationCode, "exchange_code", async move {
			let facade = self.facade()?;

			parse_redirect(redirect_uri)?;

			let guard = common::flow_guard(self, user);
			let _singleflight = guard.lock().await;
			let grant = facade
				.exchange_authorization_code(self.strategy.as_ref(), code, redirect_uri)
				.await?;
			let refresh_token = grant.refresh_token.ok_or(ConfigError::MissingRefreshToken)?;
			let expires_at = self.clock.now() + grant.expires_in;
			let pair = TokenPair { access_token: grant.access_token, refresh_token };

			self.vault.store(user, pair.clone()).await?;
			self.profiles.mark_connected(user, expires_at).await?;

			tracing::info!(user = %user, %expires_at, "connected user account");

			Ok(IssuedTokens { pair, expires_in: grant.expires_in, expires_at })
		})
		.await
	}

	/// Reads the user's connection state from the profile table.
	pub async fn connection_status(&self, user: &UserId) -> Result<ConnectionStatus> {
		let status = match self.profiles.fetch(user).await? {
			Some(profile) => ConnectionStatus {
				connected: profile.connected,
				expires_at: profile.access_token_expires_at,
			},
			None => ConnectionStatus { connected: false, expires_at: None },
		};

		Ok(status)
	}
}

fn parse_redirect(redirect_uri: &str) -> Result<Url> {
	Url::parse(redirect_uri).map_err(|_| Error::validation("Invalid redirectUri"))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	#[test]
	fn authorize_url_carries_state_and_encoded_redirect() {
		let fixture = build_reqwest_test_broker(test_descriptor("https://accounts.mock"));
		let user = UserId::new("u1").expect("User fixture should be valid.");
		let url = fixture
			.broker
			.with_show_dialog(true)
			.authorize_url("https://app/callback", &user)
			.expect("Authorize URL should build.");
		let query = url.query().expect("Authorize URL should carry a query.");

		assert!(url.as_str().starts_with("https://accounts.mock/authorize?"));
		assert!(query.contains("client_id=client-fixture"));
		assert!(query.contains("response_type=code"));
		assert!(query.contains("state=u1"));
		assert!(query.contains("redirect_uri=https%3A%2F%2Fapp%2Fcallback"));
		assert!(query.contains("scope=user-read-email+user-read-private"));
		assert!(query.contains("show_dialog=true"));
	}

	#[test]
	fn authorize_url_rejects_relative_redirects() {
		let fixture = build_reqwest_test_broker(test_descriptor("https://accounts.mock"));
		let user = UserId::new("u1").expect("User fixture should be valid.");
		let err = fixture
			.broker
			.authorize_url("/callback", &user)
			.expect_err("Relative redirects must be rejected.");

		assert_eq!(err.to_string(), "Invalid redirectUri");
	}

	#[test]
	fn authorize_url_requires_client_id() {
		let fixture = build_reqwest_test_broker(test_descriptor("https://accounts.mock"));
		let user = UserId::new("u1").expect("User fixture should be valid.");
		let err = fixture
			.broker
			.with_credentials("", "secret")
			.authorize_url("https://app/callback", &user)
			.expect_err("Missing client id must fail closed.");

		assert!(matches!(err, Error::Config(ConfigError::MissingCredentials { .. })));
	}
}
