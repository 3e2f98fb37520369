//! Refresh token flow with per-user single-flight guards.
//!
//! A refresh reads the stored pair, performs `grant_type=refresh_token`, and writes the new
//! pair back. Spotify may or may not rotate the refresh token; when the response omits one the
//! previous refresh token stays on file. Failures are surfaced as-is and never retried.

// self
use crate::{
	_prelude::*,
	auth::{IssuedTokens, TokenPair, UserId},
	flows::{Broker, common},
	http::TokenHttpClient,
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind},
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Mints a new access token for `user` from the stored refresh token.
	///
	/// Fails with [`Error::NotConnected`] when the vault holds no pair for the user.
	pub async fn refresh_user_token(&self, user: &UserId) -> Result<IssuedTokens> {
		obs::observe(FlowKind::Refresh, "refresh_user_token", async move {
			let facade = self.facade()?;

			self.vault.retrieve(user).await?.ok_or(Error::NotConnected)?;

			let guard = common::flow_guard(self, user);
			let _singleflight = guard.lock().await;
			// Re-read under the guard; a concurrent refresh may have rotated the pair.
			let current = self.vault.retrieve(user).await?.ok_or(Error::NotConnected)?;
			let grant =
				facade.refresh_token(self.strategy.as_ref(), current.refresh_token.expose()).await?;
			let rotated = grant.refresh_token.is_some();
			let pair = TokenPair {
				access_token: grant.access_token,
				refresh_token: grant.refresh_token.unwrap_or(current.refresh_token),
			};
			let expires_at = self.clock.now() + grant.expires_in;

			self.vault.store(user, pair.clone()).await?;
			self.profiles.mark_connected(user, expires_at).await?;

			tracing::info!(user = %user, rotated, %expires_at, "refreshed user token");

			Ok(IssuedTokens { pair, expires_in: grant.expires_in, expires_at })
		})
		.await
	}
}
